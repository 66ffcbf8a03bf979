//! Hand-off of outcomes from workers to the orchestrator.
//!
//! Producers hold cloned [`ResultSink`]s; the single consumer holds the only
//! [`ResultDrain`]. Delivery order across producers is unspecified, but no
//! outcome is lost or delivered twice.

use tokio::sync::mpsc::{
    UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel,
};
use tracing::warn;

use crate::outcome::Outcome;

/// Destination a worker pushes its single outcome into.
pub trait OutcomeSink: Send + Sync + 'static {
    /// Hand over an outcome without blocking.
    fn push(&self, outcome: Outcome);
}

/// Create a connected sink/drain pair.
pub fn result_sink() -> (ResultSink, ResultDrain) {
    let (tx, rx) = unbounded_channel();
    (ResultSink { tx }, ResultDrain { rx })
}

/// Producer side. Cheap to clone, one per worker.
#[derive(Debug, Clone)]
pub struct ResultSink {
    tx: UnboundedSender<Outcome>,
}

impl ResultSink {
    /// Enqueue an outcome without blocking.
    ///
    /// If the drain has already been dropped the outcome has nowhere to go;
    /// it is logged and discarded.
    pub fn push(&self, outcome: Outcome) {
        if let Err(rejected) = self.tx.send(outcome) {
            warn!(
                identity = %rejected.0.identity(),
                "result drain closed; outcome discarded"
            );
        }
    }
}

impl OutcomeSink for ResultSink {
    fn push(&self, outcome: Outcome) {
        ResultSink::push(self, outcome);
    }
}

/// Consumer side. Not `Clone`, so there is exactly one per sink.
#[derive(Debug)]
pub struct ResultDrain {
    rx: UnboundedReceiver<Outcome>,
}

impl ResultDrain {
    /// Remove and return everything queued right now. Returns an empty vec
    /// when nothing is pending.
    pub fn drain_all(&mut self) -> Vec<Outcome> {
        let mut batch = Vec::with_capacity(self.rx.len());
        loop {
            match self.rx.try_recv() {
                Ok(outcome) => batch.push(outcome),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        batch
    }

    /// Number of outcomes waiting to be drained.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::outcome::Identity;

    fn matched(id: u32) -> Outcome {
        Outcome::Matched {
            identity: Identity::new(id),
        }
    }

    #[test]
    fn drain_on_empty_sink_returns_nothing() {
        let (_sink, mut drain) = result_sink();
        assert!(drain.drain_all().is_empty());
        assert!(drain.drain_all().is_empty());
    }

    #[test]
    fn drained_outcomes_are_not_returned_again() {
        let (sink, mut drain) = result_sink();
        sink.push(matched(1));
        sink.push(matched(2));
        assert_eq!(drain.drain_all().len(), 2);
        assert!(drain.drain_all().is_empty());

        sink.push(matched(3));
        assert_eq!(drain.drain_all(), vec![matched(3)]);
    }

    #[test]
    fn push_after_drain_dropped_does_not_panic() {
        let (sink, drain) = result_sink();
        drop(drain);
        sink.push(matched(0));
    }

    #[test]
    fn remaining_outcomes_survive_producer_drop() {
        let (sink, mut drain) = result_sink();
        sink.push(matched(10));
        drop(sink);
        assert_eq!(drain.pending(), 1);
        assert_eq!(drain.drain_all(), vec![matched(10)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_producers_lose_nothing() {
        const PRODUCERS: u32 = 64;
        const PER_PRODUCER: u32 = 50;

        let (sink, mut drain) = result_sink();
        let mut handles = Vec::new();
        for producer in 0..PRODUCERS {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                for n in 0..PER_PRODUCER {
                    sink.push(matched(producer * PER_PRODUCER + n));
                    tokio::task::yield_now().await;
                }
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            handle.await.expect("producer task");
            for outcome in drain.drain_all() {
                assert!(seen.insert(outcome.identity()), "duplicate delivery");
            }
        }
        for outcome in drain.drain_all() {
            assert!(seen.insert(outcome.identity()), "duplicate delivery");
        }

        assert_eq!(seen.len() as u32, PRODUCERS * PER_PRODUCER);
    }
}
