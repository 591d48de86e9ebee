//! Loads and validates run configuration from a TOML file, with CLI
//! overrides applied on top.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::filter::{Filter, FilterChain, PassFilter, QualFilter, RegionFilter};

/// On-disk representation of the config file; every field optional so the
/// file can specify a subset and let [`Config::from_raw`] fill in defaults.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    host_url: Option<String>,
    version: Option<String>,
    species: Option<String>,
    num_threads: Option<usize>,
    batch_size: Option<usize>,
    max_batches: Option<usize>,
    variants_per_request: Option<usize>,
    output_directory: Option<String>,
    output_filename: Option<String>,
    #[serde(default)]
    filters: Vec<RawFilter>,
}

#[derive(Debug, Deserialize)]
struct RawFilter {
    kind: String,
    min_qual: Option<f64>,
    chromosomes: Option<Vec<String>>,
}

/// Validated, fully-resolved run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host_url: String,
    pub version: String,
    pub species: String,
    pub num_threads: usize,
    pub batch_size: usize,
    pub max_batches: usize,
    pub variants_per_request: usize,
    pub output_directory: PathBuf,
    pub output_filename: Option<String>,
}

const DEFAULT_BATCH_SIZE: usize = 1000;
const DEFAULT_MAX_BATCHES: usize = 4;
const DEFAULT_VARIANTS_PER_REQUEST: usize = 200;

impl Config {
    /// Load and validate a config file from `path`.
    pub fn load(path: &Path) -> Result<(Config, FilterChain), ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<(Config, FilterChain), ConfigError> {
        let host_url = raw.host_url.ok_or(ConfigError::MissingField("host_url"))?;
        let version = raw.version.ok_or(ConfigError::MissingField("version"))?;
        let species = raw.species.ok_or(ConfigError::MissingField("species"))?;
        let output_directory = raw
            .output_directory
            .ok_or(ConfigError::MissingField("output_directory"))?;

        let num_threads = raw.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        });
        let batch_size = raw.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
        let max_batches = raw.max_batches.unwrap_or(DEFAULT_MAX_BATCHES);
        let variants_per_request = raw.variants_per_request.unwrap_or(DEFAULT_VARIANTS_PER_REQUEST);

        validate_nonzero("num_threads", num_threads)?;
        validate_nonzero("batch_size", batch_size)?;
        validate_nonzero("max_batches", max_batches)?;
        validate_nonzero("variants_per_request", variants_per_request)?;

        let mut builder = FilterChain::builder();
        for raw_filter in raw.filters {
            builder = builder.stage(build_filter(raw_filter)?);
        }

        let config = Config {
            host_url,
            version,
            species,
            num_threads,
            batch_size,
            max_batches,
            variants_per_request,
            output_directory: PathBuf::from(output_directory),
            output_filename: raw.output_filename,
        };

        Ok((config, builder.build()))
    }

    /// `"<host_url>/cellbase/rest/<version>/<species>/genomic/variant/consequence_type"`,
    /// with `/` normalization between parts.
    ///
    /// Composition fails if any part is empty. That case is caught earlier
    /// by [`Config::load`]'s `MissingField` checks, but this check stays as
    /// a boundary since `Config` can also be assembled directly.
    pub fn service_url(&self) -> Result<String, &'static str> {
        if self.host_url.is_empty() {
            return Err("host_url");
        }
        if self.version.is_empty() {
            return Err("version");
        }
        if self.species.is_empty() {
            return Err("species");
        }

        let mut url = String::new();
        join_part(&mut url, &self.host_url);
        join_part(&mut url, "cellbase/rest");
        join_part(&mut url, &self.version);
        join_part(&mut url, &self.species);
        join_part(&mut url, "genomic/variant/consequence_type");
        Ok(url)
    }
}

fn join_part(url: &mut String, part: &str) {
    if !url.is_empty() && !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(part.trim_start_matches('/'));
}

fn validate_nonzero(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn build_filter(raw: RawFilter) -> Result<Box<dyn Filter>, ConfigError> {
    match raw.kind.as_str() {
        "pass" => Ok(Box::new(PassFilter)),
        "qual" => {
            let min_qual = raw.min_qual.ok_or(ConfigError::MissingField("min_qual"))?;
            Ok(Box::new(QualFilter { min_qual }))
        }
        "region" => {
            let chromosomes = raw.chromosomes.ok_or(ConfigError::MissingField("chromosomes"))?;
            Ok(Box::new(RegionFilter { chromosomes }))
        }
        other => Err(ConfigError::UnknownFilter(other.to_string())),
    }
}

/// Create the output directory if absent, and purge any pre-existing
/// `*.txt` files inside it. The tool owns the directory for the run.
pub fn prepare_output_directory(dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateOutputDir {
        path: dir.display().to_string(),
        source,
    })?;

    let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::CreateOutputDir {
        path: dir.display().to_string(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::PurgeOutputFile {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            std::fs::remove_file(&path).map_err(|source| ConfigError::PurgeOutputFile {
                path: path.display().to_string(),
                source,
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_missing_tunables() {
        let raw = RawConfig {
            host_url: Some("https://cellbase.example.org".to_string()),
            version: Some("v4".to_string()),
            species: Some("hsapiens".to_string()),
            output_directory: Some("/tmp/out".to_string()),
            ..Default::default()
        };
        let (config, _) = Config::from_raw(raw).unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.max_batches, DEFAULT_MAX_BATCHES);
        assert_eq!(config.variants_per_request, DEFAULT_VARIANTS_PER_REQUEST);
        assert!(config.num_threads >= 1);
    }

    #[test]
    fn missing_host_url_is_rejected() {
        let raw = RawConfig {
            version: Some("v4".to_string()),
            species: Some("hsapiens".to_string()),
            output_directory: Some("/tmp/out".to_string()),
            ..Default::default()
        };
        let err = Config::from_raw(raw).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("host_url")));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let raw = RawConfig {
            host_url: Some("https://cellbase.example.org".to_string()),
            version: Some("v4".to_string()),
            species: Some("hsapiens".to_string()),
            output_directory: Some("/tmp/out".to_string()),
            batch_size: Some(0),
            ..Default::default()
        };
        let err = Config::from_raw(raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "batch_size", .. }));
    }

    #[test]
    fn service_url_normalizes_slashes() {
        let config = Config {
            host_url: "https://cellbase.example.org/".to_string(),
            version: "v4".to_string(),
            species: "hsapiens".to_string(),
            num_threads: 1,
            batch_size: 1,
            max_batches: 1,
            variants_per_request: 1,
            output_directory: PathBuf::from("/tmp/out"),
            output_filename: None,
        };
        assert_eq!(
            config.service_url().unwrap(),
            "https://cellbase.example.org/cellbase/rest/v4/hsapiens/genomic/variant/consequence_type"
        );
    }

    #[test]
    fn unknown_filter_kind_is_rejected() {
        let raw = RawConfig {
            host_url: Some("https://cellbase.example.org".to_string()),
            version: Some("v4".to_string()),
            species: Some("hsapiens".to_string()),
            output_directory: Some("/tmp/out".to_string()),
            filters: vec![RawFilter {
                kind: "nonsense".to_string(),
                min_qual: None,
                chromosomes: None,
            }],
            ..Default::default()
        };
        let err = Config::from_raw(raw).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFilter(k) if k == "nonsense"));
    }
}
