//! Spawns the worker population and streams their outcomes to a reporter.
//!
//! A run moves through `Spawning → Polling → Draining (repeated) →
//! AllComplete → Joined`. Every poll iteration drains whatever outcomes have
//! arrived, so results are reported while workers are still running.

use std::{any::type_name, fmt, io::Write, sync::Arc, time::Instant};

use futures::future::join_all;
use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    backend::EchoBackend,
    error::Result,
    outcome::Identity,
    reporter::{Reporter, Tally},
    settings::RunSettings,
    sink::{ResultDrain, result_sink},
    worker::{Worker, WorkerState},
};

/// Drives one run of the whole worker population against a backend.
pub struct Orchestrator<B: EchoBackend> {
    backend: Arc<B>,
    settings: RunSettings,
}

impl<B: EchoBackend> fmt::Debug for Orchestrator<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("backend", &type_name::<B>())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Workers of one run, as seen by the orchestrator.
struct Population {
    states: Vec<Arc<WorkerState>>,
    handles: Vec<JoinHandle<()>>,
    drain: ResultDrain,
}

impl Population {
    fn all_completed(&self) -> bool {
        self.states.iter().all(|state| state.is_completed())
    }

    fn completed(&self) -> usize {
        self.states
            .iter()
            .filter(|state| state.is_completed())
            .count()
    }
}

impl<B: EchoBackend> Orchestrator<B> {
    /// Nothing is spawned until [`Orchestrator::run`].
    pub fn new(backend: Arc<B>, settings: RunSettings) -> Self {
        Self { backend, settings }
    }

    /// Run the whole population to completion.
    ///
    /// Individual round-trip failures never end the run; only a failure to
    /// write the report does.
    pub async fn run<W: Write>(&self, mut reporter: Reporter<W>) -> Result<Tally> {
        let started = Instant::now();
        let mut population = self.spawn();

        let mut iterations = 0u64;
        loop {
            tokio::time::sleep(self.settings.poll_interval).await;
            iterations += 1;

            // Completion is sampled before draining: every worker seen as
            // completed has its outcome in this batch or an earlier one.
            let all_completed = population.all_completed();
            let batch = population.drain.drain_all();
            debug!(
                iteration = iterations,
                drained = batch.len(),
                completed = population.completed(),
                "poll iteration"
            );
            reporter.report_batch(batch)?;

            if all_completed {
                break;
            }
        }

        for joined in join_all(population.handles).await {
            if let Err(err) = joined {
                warn!(error = %err, "worker task did not finish cleanly");
            }
        }
        reporter.report_batch(population.drain.drain_all())?;

        let tally = reporter.finish()?;
        info!(
            population = self.settings.population,
            matched = tally.matched,
            mismatched = tally.mismatched,
            failed = tally.failed,
            iterations,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run complete"
        );
        if tally.total() != u64::from(self.settings.population) {
            warn!(
                expected = self.settings.population,
                reported = tally.total(),
                "reported outcomes do not cover the population"
            );
        }
        Ok(tally)
    }

    fn spawn(&self) -> Population {
        let (sink, drain) = result_sink();
        let permits = self
            .settings
            .max_in_flight
            .map(|cap| Arc::new(Semaphore::new(cap.get())));

        let size = self.settings.population as usize;
        let mut states = Vec::with_capacity(size);
        let mut handles = Vec::with_capacity(size);
        for identity in Identity::population(self.settings.population) {
            let state = Arc::new(WorkerState::new(identity));
            let worker = Worker::new(
                Arc::clone(&state),
                Arc::clone(&self.backend),
                sink.clone(),
                self.settings.statement_timeout,
            )
            .with_permits(permits.clone());
            handles.push(tokio::spawn(worker.run()));
            states.push(state);
        }

        info!(
            population = self.settings.population,
            max_in_flight = ?self.settings.max_in_flight,
            statement_timeout_ms =
                self.settings.statement_timeout.as_millis() as u64,
            "workers spawned"
        );

        Population {
            states,
            handles,
            drain,
        }
    }
}
