use std::path::PathBuf;

use thiserror::Error;

/// Failures of a configuration refresh. None of them are fatal: the
/// controller keeps rotating through the last good list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("configuration source unreachable: {0}")]
    Unreachable(String),

    #[error("configuration payload malformed: {0}")]
    Malformed(String),

    #[error("configuration payload contains no dashboards")]
    Empty,
}

/// Outcome of a failed page load reported by the render surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("page load timed out")]
    Timeout,

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("content error: {0}")]
    ContentError(String),
}

/// Programming defects detected by the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("invalid state: {detail} (phase {phase})")]
    InvalidState { phase: String, detail: String },
}

#[derive(Error, Debug)]
pub enum PositionStoreError {
    #[error("failed to access position file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("position file {path} is not valid JSON")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode rotation position")]
    Encode(#[source] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RotatorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Internal(#[from] InternalError),

    #[error(transparent)]
    Position(#[from] PositionStoreError),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("unsupported configuration URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("rotation runtime has stopped")]
    RuntimeStopped,
}

pub type Result<T> = std::result::Result<T, RotatorError>;
