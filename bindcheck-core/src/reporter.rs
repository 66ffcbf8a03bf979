//! Status lines and run totals.

use std::{fmt, io::Write};

use crate::{error::Result, outcome::Outcome};

/// Bucket totals for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// "Successful results"
    pub matched: u64,
    /// "Wrong results"
    pub mismatched: u64,
    /// "Exceptions"
    pub failed: u64,
}

impl Tally {
    /// Count `outcome` in its bucket.
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Matched { .. } => self.matched += 1,
            Outcome::Mismatched { .. } => self.mismatched += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Outcomes counted so far across all buckets.
    pub fn total(&self) -> u64 {
        self.matched + self.mismatched + self.failed
    }

    /// No wrong results and no failures.
    pub fn is_clean(&self) -> bool {
        self.mismatched == 0 && self.failed == 0
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Successful results: {}", self.matched)?;
        writeln!(f, "Wrong results: {}", self.mismatched)?;
        writeln!(f, "Exceptions: {}", self.failed)
    }
}

/// Writes one status line per outcome and the closing summary.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
    tally: Tally,
}

impl<W: Write> Reporter<W> {
    /// Start with an empty tally. Nothing is written until the first report.
    pub fn new(out: W) -> Self {
        Self {
            out,
            tally: Tally::default(),
        }
    }

    /// Write the status line of one outcome and count it. Does not flush.
    pub fn report(&mut self, outcome: &Outcome) -> Result<()> {
        writeln!(self.out, "{outcome}")?;
        self.tally.record(outcome);
        Ok(())
    }

    /// Report a drained batch in arrival order.
    pub fn report_batch(&mut self, batch: Vec<Outcome>) -> Result<()> {
        for outcome in &batch {
            self.report(outcome)?;
        }
        if !batch.is_empty() {
            self.out.flush()?;
        }
        Ok(())
    }

    /// Totals of everything reported so far.
    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Write the three summary lines and hand back the totals.
    pub fn finish(mut self) -> Result<Tally> {
        write!(self.out, "{}", self.tally)?;
        self.out.flush()?;
        Ok(self.tally)
    }

    /// Give back the writer, without printing a summary.
    pub fn into_inner(self) -> W {
        self.out
    }
}
