//! Errors that stop configuration loading.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Fatal configuration problem. The run never starts.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// Neither the override, the variable nor the secret file supplied a
    /// target.
    #[error(
        "no connection target configured; set CONNECTION_STRING or CONNECTION_STRING_FILE"
    )]
    MissingConnectionString,
    /// The target is not a URL.
    #[error("invalid connection string")]
    InvalidConnectionString {
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The target is a URL for some other database.
    #[error(
        "unsupported connection scheme '{scheme}'; expected postgres:// or postgresql://"
    )]
    UnsupportedScheme {
        /// Scheme that was found.
        scheme: String,
    },
    /// The connection string file could not be read.
    #[error("failed to read secret file {path}")]
    SecretFileIo {
        /// File that was named.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// A value did not parse.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value as given.
        value: String,
        /// Parser message.
        reason: String,
    },
    /// A duration that must be positive was zero.
    #[error("{key} must be greater than zero")]
    ZeroDuration {
        /// Variable name.
        key: &'static str,
    },
    /// A statement budget below the server's 1ms resolution.
    #[error("{key} must be at least 1ms, got {value:?}")]
    SubMillisecond {
        /// Variable name.
        key: &'static str,
        /// Duration as given.
        value: Duration,
    },
    /// `.env` exists but could not be loaded.
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
