//! Identities and the three-way classification of an echo.

use std::fmt;

/// Unique per-worker integer, used both as the bound parameter and as the
/// value the backend is expected to echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(u32);

impl Identity {
    /// Wrap a raw identity value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Raw identity value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The value bound to the echo statement.
    pub fn as_param(self) -> i64 {
        i64::from(self.0)
    }

    /// Identities `0..population`, in spawn order.
    pub fn population(population: u32) -> impl Iterator<Item = Identity> {
        (0..population).map(Identity)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Classified result of one query-and-verify attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The backend echoed the submitted identity.
    Matched {
        /// Submitting worker.
        identity: Identity,
    },
    /// The round trip committed but the echoed value was different or absent.
    Mismatched {
        /// Submitting worker.
        identity: Identity,
        /// What came back instead; `None` when no row was returned.
        observed: Option<i64>,
    },
    /// Some step of the round trip raised an error.
    Failed {
        /// Submitting worker.
        identity: Identity,
        /// Display text of the error, reported as the status.
        error: String,
    },
}

impl Outcome {
    /// Classify a committed round trip by comparing what came back.
    pub fn from_echo(identity: Identity, observed: Option<i64>) -> Self {
        match observed {
            Some(value) if value == identity.as_param() => {
                Outcome::Matched { identity }
            }
            observed => Outcome::Mismatched { identity, observed },
        }
    }

    /// Worker this outcome belongs to.
    pub fn identity(&self) -> Identity {
        match self {
            Outcome::Matched { identity }
            | Outcome::Mismatched { identity, .. }
            | Outcome::Failed { identity, .. } => *identity,
        }
    }

    /// Status column of the stdout line.
    pub fn status(&self) -> &str {
        match self {
            Outcome::Matched { .. } => "Success",
            Outcome::Mismatched { .. } => "Wrong result",
            Outcome::Failed { error, .. } => error,
        }
    }
}

/// `<identity>\t<status>`
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.identity(), self.status())
    }
}
