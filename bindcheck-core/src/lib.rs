//! # Bindcheck Core
//!
//! Concurrency harness that checks whether a transactional round trip returns
//! the value it was asked for when thousands of callers run at once.
//!
//! ## Overview
//!
//! Every worker owns a unique [`Identity`], binds it as a query parameter and
//! expects the backend to echo it back inside a committed transaction. Any
//! layer that swaps bound values between concurrent calls shows up as a
//! [`Outcome::Mismatched`] result.
//!
//! ## Architecture
//!
//! - [`backend`]: the [`EchoBackend`] seam and its PostgreSQL implementation
//! - [`protocol`]: one query-and-verify attempt, classified into an [`Outcome`]
//! - [`worker`]: a spawned task running the protocol once for one identity
//! - [`sink`]: multi-producer, single-consumer hand-off of outcomes
//! - [`orchestrator`]: spawns the population, polls, drains and joins
//! - [`reporter`]: per-outcome status lines and the final [`Tally`]
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bindcheck_core::{
//!     Orchestrator, PostgresEchoBackend, Reporter, RunSettings,
//! };
//!
//! async fn run(url: &str) -> bindcheck_core::Result<()> {
//!     let backend = Arc::new(PostgresEchoBackend::new(url)?);
//!     let reporter = Reporter::new(std::io::stdout());
//!     let tally = Orchestrator::new(backend, RunSettings::default())
//!         .run(reporter)
//!         .await?;
//!     assert_eq!(tally.total(), 2000);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod protocol;
pub mod reporter;
pub mod settings;
pub mod sink;
pub mod worker;

pub use backend::{BackendError, EchoBackend, PostgresEchoBackend};
pub use error::{HarnessError, Result};
pub use orchestrator::Orchestrator;
pub use outcome::{Identity, Outcome};
pub use protocol::query_and_verify;
pub use reporter::{Reporter, Tally};
pub use settings::RunSettings;
pub use sink::{OutcomeSink, ResultDrain, ResultSink, result_sink};
pub use worker::{Worker, WorkerState};
