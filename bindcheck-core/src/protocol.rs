//! One query-and-verify attempt.

use std::time::Duration;

use tracing::debug;

use crate::{backend::EchoBackend, outcome::Identity, outcome::Outcome};

/// Perform one echo round trip for `identity` and classify it.
///
/// Never fails: backend errors become [`Outcome::Failed`] carrying the
/// error text. Exactly one attempt is made.
pub async fn query_and_verify<B>(
    backend: &B,
    identity: Identity,
    statement_timeout: Duration,
) -> Outcome
where
    B: EchoBackend + ?Sized,
{
    match backend.round_trip(identity, statement_timeout).await {
        Ok(observed) => {
            let outcome = Outcome::from_echo(identity, observed);
            if let Outcome::Mismatched { observed, .. } = &outcome {
                debug!(identity = %identity, ?observed, "echo returned a foreign value");
            }
            outcome
        }
        Err(err) => {
            debug!(identity = %identity, error = %err, "round trip failed");
            Outcome::Failed {
                identity,
                error: err.to_string(),
            }
        }
    }
}
