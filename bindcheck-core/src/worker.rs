//! A single spawned query-and-verify task and its completion flag.

use std::{
    any::{Any, type_name},
    fmt,
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tracing::{trace, warn};

use crate::{
    backend::EchoBackend,
    outcome::{Identity, Outcome},
    protocol::query_and_verify,
    sink::{OutcomeSink, ResultSink},
};

/// Completion record shared between one worker and the orchestrator.
#[derive(Debug)]
pub struct WorkerState {
    identity: Identity,
    completed: AtomicBool,
}

impl WorkerState {
    /// Fresh, not yet completed.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            completed: AtomicBool::new(false),
        }
    }

    /// The identity this worker echoes.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// True once the worker's outcome has been pushed.
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// Release ordering publishes the preceding push to any reader that
    /// observes `true`.
    fn mark_completed(&self) {
        let was_completed = self.completed.swap(true, Ordering::AcqRel);
        debug_assert!(!was_completed, "worker {} completed twice", self.identity);
    }
}

/// One scheduled execution of the query-and-verify protocol.
pub struct Worker<B: EchoBackend, S: OutcomeSink = ResultSink> {
    state: Arc<WorkerState>,
    backend: Arc<B>,
    sink: S,
    statement_timeout: Duration,
    permits: Option<Arc<Semaphore>>,
}

impl<B: EchoBackend, S: OutcomeSink> fmt::Debug for Worker<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("state", &self.state)
            .field("backend", &type_name::<B>())
            .field("sink", &type_name::<S>())
            .field("statement_timeout", &self.statement_timeout)
            .field("capped", &self.permits.is_some())
            .finish()
    }
}

impl<B: EchoBackend, S: OutcomeSink> Worker<B, S> {
    /// A worker that has not started; nothing happens until [`Worker::run`].
    pub fn new(
        state: Arc<WorkerState>,
        backend: Arc<B>,
        sink: S,
        statement_timeout: Duration,
    ) -> Self {
        Self {
            state,
            backend,
            sink,
            statement_timeout,
            permits: None,
        }
    }

    /// Share a concurrency limiter with the rest of the population.
    pub fn with_permits(mut self, permits: Option<Arc<Semaphore>>) -> Self {
        self.permits = permits;
        self
    }

    /// Run the protocol once, push the outcome, then flag completion.
    pub async fn run(self) {
        let identity = self.state.identity();

        // Held for the duration of the round trip only.
        let _permit = match &self.permits {
            Some(permits) => Arc::clone(permits).acquire_owned().await.ok(),
            None => None,
        };

        let attempt = query_and_verify(
            self.backend.as_ref(),
            identity,
            self.statement_timeout,
        );
        let outcome = AssertUnwindSafe(attempt)
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let error = panic_message(panic.as_ref());
                warn!(identity = %identity, %error, "round trip panicked");
                Outcome::Failed { identity, error }
            });

        trace!(identity = %identity, status = outcome.status(), "worker finished");
        self.sink.push(outcome);
        self.state.mark_completed();
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("round trip panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("round trip panicked: {msg}")
    } else {
        "round trip panicked".to_string()
    }
}
