//! Command-line interface for the annotation tool.

use std::path::PathBuf;

use clap::Parser;

/// Annotate variants from a VCF file against a remote consequence-type web
/// service, demultiplexing the annotations into per-type output files.
#[derive(Debug, Parser)]
#[command(name = "effect-annotate", version, about)]
pub struct Cli {
    /// Path to the input VCF file.
    pub vcf_path: PathBuf,

    /// Path to the TOML configuration file.
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// Override the configured output directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Override the configured worker thread count.
    #[arg(long)]
    pub threads: Option<usize>,

    /// Override the configured reader batch size.
    #[arg(long)]
    pub batch_size: Option<usize>,
}

impl Cli {
    /// Apply CLI overrides onto a loaded configuration.
    pub fn apply_overrides(&self, config: &mut crate::config::Config) {
        if let Some(output_dir) = &self.output_dir {
            config.output_directory = output_dir.clone();
        }
        if let Some(threads) = self.threads {
            config.num_threads = threads;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_required_positional_and_config_flag() {
        let cli = Cli::parse_from(["effect-annotate", "input.vcf", "--config", "run.toml"]);
        assert_eq!(cli.vcf_path, PathBuf::from("input.vcf"));
        assert_eq!(cli.config, PathBuf::from("run.toml"));
        assert!(cli.output_dir.is_none());
    }

    #[test]
    fn overrides_apply_onto_loaded_config() {
        let cli = Cli::parse_from([
            "effect-annotate",
            "input.vcf",
            "--config",
            "run.toml",
            "--threads",
            "8",
            "--output-dir",
            "/tmp/custom",
        ]);
        let mut config = crate::config::Config {
            host_url: "https://example.org".to_string(),
            version: "v4".to_string(),
            species: "hsapiens".to_string(),
            num_threads: 1,
            batch_size: 1,
            max_batches: 1,
            variants_per_request: 1,
            output_directory: PathBuf::from("/tmp/default"),
            output_filename: None,
        };
        cli.apply_overrides(&mut config);
        assert_eq!(config.num_threads, 8);
        assert_eq!(config.output_directory, PathBuf::from("/tmp/custom"));
    }
}
