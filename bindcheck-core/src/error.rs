//! Errors that can end a whole run.
//!
//! Failures of individual round trips never show up here; they are folded
//! into [`Outcome::Failed`](crate::Outcome::Failed) by the protocol.

use thiserror::Error;

/// Fatal harness error.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Writing a status or summary line failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection target could not be parsed into connect options.
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(#[source] sqlx::Error),
}

/// Result alias used across the harness.
pub type Result<T> = std::result::Result<T, HarnessError>;
