//! PostgreSQL implementation of [`EchoBackend`] on top of `sqlx`.

use std::{fmt, future::Future, str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    Connection,
    postgres::{PgConnectOptions, PgConnection},
};
use tracing::trace;

use crate::{
    backend::{BackendError, EchoBackend},
    error::{HarnessError, Result},
    outcome::Identity,
    settings::CLIENT_TIMEOUT_GRACE,
};

const SET_ISOLATION: &str = "SET TRANSACTION ISOLATION LEVEL READ COMMITTED";
const SET_STATEMENT_TIMEOUT: &str =
    "SELECT set_config('statement_timeout', $1, true)";
const ECHO_STATEMENT: &str = "SELECT $1::int8 AS id";

/// PostgreSQL echo backend. Every round trip dials its own connection and
/// nothing is pooled.
#[derive(Clone)]
pub struct PostgresEchoBackend {
    options: PgConnectOptions,
}

impl PostgresEchoBackend {
    /// Parse `url` into connect options. No connection is made here.
    pub fn new(url: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(url)
            .map_err(HarnessError::InvalidConnectionString)?;
        Ok(Self { options })
    }

    /// `host:port/database`, without credentials, for logs.
    pub fn target(&self) -> String {
        format!(
            "{}:{}/{}",
            self.options.get_host(),
            self.options.get_port(),
            self.options.get_database().unwrap_or_default()
        )
    }
}

impl fmt::Debug for PostgresEchoBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresEchoBackend")
            .field("target", &self.target())
            .finish()
    }
}

#[async_trait]
impl EchoBackend for PostgresEchoBackend {
    async fn round_trip(
        &self,
        identity: Identity,
        statement_timeout: Duration,
    ) -> std::result::Result<Option<i64>, BackendError> {
        let mut conn = PgConnection::connect_with(&self.options).await?;
        let mut tx = conn.begin().await?;

        sqlx::query(SET_ISOLATION).execute(&mut *tx).await?;
        sqlx::query(SET_STATEMENT_TIMEOUT)
            .bind(statement_timeout_setting(statement_timeout))
            .execute(&mut *tx)
            .await?;

        let echo = sqlx::query_scalar::<_, i64>(ECHO_STATEMENT)
            .bind(identity.as_param())
            .fetch_optional(&mut *tx);
        let echoed = within_client_deadline(statement_timeout, echo).await?;

        tx.commit().await?;
        trace!(identity = %identity, ?echoed, "round trip committed");
        Ok(echoed)
    }
}

/// Value for `statement_timeout`, in whole milliseconds. Never `0ms`, which
/// PostgreSQL reads as "no limit".
fn statement_timeout_setting(statement_timeout: Duration) -> String {
    format!("{}ms", statement_timeout.as_millis().max(1))
}

/// Client-side backstop for the server's statement timeout. The reported
/// duration is the deadline that actually expired.
async fn within_client_deadline<T, F>(
    statement_timeout: Duration,
    statement: F,
) -> std::result::Result<T, BackendError>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let deadline = statement_timeout + CLIENT_TIMEOUT_GRACE;
    tokio::time::timeout(deadline, statement)
        .await
        .map_err(|_| BackendError::Timeout(deadline))?
        .map_err(BackendError::from)
}
