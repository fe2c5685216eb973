use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid pattern `{name}`: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Operational failure while reading or processing scan input.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("scan task failed: {0}")]
    Task(String),
}
