//! Error types for the variant effect annotator.

use thiserror::Error;

/// Errors raised while loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required config field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown filter kind: {0}")]
    UnknownFilter(String),

    #[error("could not create output directory {path}: {source}")]
    CreateOutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not purge stale output file {path}: {source}")]
    PurgeOutputFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while reading VCF records.
#[derive(Debug, Error)]
pub enum VcfReadError {
    #[error("could not open VCF file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error reading VCF records: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed VCF record at line {line}: {reason}")]
    Malformed { line: u64, reason: String },
}

/// Errors raised while dispatching a chunk to the annotation service.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("network error calling annotation service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("annotation service returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("response line buffer could not be resized for worker {worker}")]
    BufferResize { worker: usize },
}

/// Top-level error type returned from running the pipeline.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("annotation service URL is incomplete: {0}")]
    UrlComposition(&'static str),

    #[error("failed to build HTTP client: {0}")]
    HttpInit(#[from] reqwest::Error),

    #[error(transparent)]
    VcfRead(#[from] VcfReadError),

    #[error("could not open output file {path}: {source}")]
    OutputOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write output file {path}: {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
