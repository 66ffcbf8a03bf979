//! Backing-store seam for the echo round trip.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::outcome::Identity;

pub mod postgres;

pub use postgres::PostgresEchoBackend;

/// Failure of one round trip. Its `Display` text is what gets reported for
/// the identity, so variants render the underlying error verbatim.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connect, transaction or statement error from the driver.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// The client gave up after waiting for the given deadline.
    #[error("statement did not complete within {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Failure raised by a backend that does not talk to a database.
    #[error("{0}")]
    Other(String),
}

/// One transactional echo of an identity.
///
/// Implementations open a fresh connection per call, begin a transaction at
/// READ COMMITTED, run the parameterized echo statement under
/// `statement_timeout`, read at most one scalar and commit. Nothing may be
/// shared with concurrent calls beyond read-only configuration.
#[async_trait]
pub trait EchoBackend: Send + Sync + 'static {
    /// Returns the scalar read back, or `None` when the statement produced no
    /// row. Errors from any step abandon the transaction.
    async fn round_trip(
        &self,
        identity: Identity,
        statement_timeout: Duration,
    ) -> Result<Option<i64>, BackendError>;
}
