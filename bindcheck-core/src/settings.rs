//! Run parameters and their defaults.

use std::{num::NonZeroUsize, time::Duration};

/// Number of workers spawned when nothing else is configured.
pub const DEFAULT_POPULATION: u32 = 2000;

/// Sleep between completion checks of the orchestrator loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Execution budget of the echo statement. Enforced server-side through
/// `statement_timeout`.
pub const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(1);

/// Extra time the client waits past the statement budget before abandoning
/// the statement itself, so the server-side timeout normally fires first.
pub const CLIENT_TIMEOUT_GRACE: Duration = Duration::from_millis(500);

/// Knobs of a single harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Number of workers; identities are `0..population`.
    pub population: u32,
    /// Sleep between completion checks.
    pub poll_interval: Duration,
    /// Server-side budget of each echo statement.
    pub statement_timeout: Duration,
    /// Optional cap on simultaneously running round trips. `None` spawns
    /// and runs the whole population at once.
    pub max_in_flight: Option<NonZeroUsize>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            population: DEFAULT_POPULATION,
            poll_interval: DEFAULT_POLL_INTERVAL,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
            max_in_flight: None,
        }
    }
}

impl RunSettings {
    /// Replace the number of workers.
    pub fn with_population(mut self, population: u32) -> Self {
        self.population = population;
        self
    }

    /// Replace the sleep between completion checks.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Replace the per-statement budget.
    pub fn with_statement_timeout(mut self, statement_timeout: Duration) -> Self {
        self.statement_timeout = statement_timeout;
        self
    }

    /// Set or clear the cap on concurrent round trips.
    pub fn with_max_in_flight(mut self, cap: Option<NonZeroUsize>) -> Self {
        self.max_in_flight = cap;
        self
    }
}
