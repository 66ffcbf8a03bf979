#![allow(dead_code)]

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use bindcheck_core::{
    BackendError, EchoBackend, Identity, Orchestrator, Reporter, RunSettings,
    Tally,
};
use rand::Rng;
use tokio::sync::Notify;

pub const CONNECTION_REFUSED: &str =
    "error communicating with database: Connection refused (os error 111)";

/// Echoes every identity back unchanged, optionally after a fixed delay.
#[derive(Debug, Default)]
pub struct Echo {
    pub delay: Duration,
}

#[async_trait]
impl EchoBackend for Echo {
    async fn round_trip(
        &self,
        identity: Identity,
        _statement_timeout: Duration,
    ) -> Result<Option<i64>, BackendError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Some(identity.as_param()))
    }
}

/// Always answers with somebody else's identity.
#[derive(Debug, Default)]
pub struct WrongId;

#[async_trait]
impl EchoBackend for WrongId {
    async fn round_trip(
        &self,
        identity: Identity,
        _statement_timeout: Duration,
    ) -> Result<Option<i64>, BackendError> {
        Ok(Some(identity.as_param() + 1))
    }
}

/// Fails every connection attempt.
#[derive(Debug, Default)]
pub struct Unreachable;

#[async_trait]
impl EchoBackend for Unreachable {
    async fn round_trip(
        &self,
        _identity: Identity,
        _statement_timeout: Duration,
    ) -> Result<Option<i64>, BackendError> {
        Err(BackendError::Other(CONNECTION_REFUSED.to_string()))
    }
}

/// Finishes in reverse identity order: the highest identity returns first.
#[derive(Debug)]
pub struct ReverseOrder {
    pub population: u32,
    pub step: Duration,
}

#[async_trait]
impl EchoBackend for ReverseOrder {
    async fn round_trip(
        &self,
        identity: Identity,
        _statement_timeout: Duration,
    ) -> Result<Option<i64>, BackendError> {
        let rank = self.population - identity.get();
        tokio::time::sleep(self.step * rank).await;
        Ok(Some(identity.as_param()))
    }
}

/// Random latency with a mix of every outcome, recording each call.
#[derive(Debug, Default)]
pub struct Chaotic {
    pub calls: Mutex<Vec<Identity>>,
}

#[async_trait]
impl EchoBackend for Chaotic {
    async fn round_trip(
        &self,
        identity: Identity,
        _statement_timeout: Duration,
    ) -> Result<Option<i64>, BackendError> {
        self.calls.lock().expect("calls lock").push(identity);
        let delay = rand::rng().random_range(0..15u64);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        match identity.get() % 10 {
            0 => Err(BackendError::Other(format!("boom {identity}"))),
            1 => Ok(None),
            2 => Ok(Some(-1)),
            _ => Ok(Some(identity.as_param())),
        }
    }
}

/// Echoes immediately, except for one identity that waits for
/// [`HoldOne::release`].
#[derive(Debug)]
pub struct HoldOne {
    pub held: Identity,
    release: Notify,
}

impl HoldOne {
    pub fn new(held: Identity) -> Self {
        Self {
            held,
            release: Notify::new(),
        }
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl EchoBackend for HoldOne {
    async fn round_trip(
        &self,
        identity: Identity,
        _statement_timeout: Duration,
    ) -> Result<Option<i64>, BackendError> {
        if identity == self.held {
            self.release.notified().await;
        }
        Ok(Some(identity.as_param()))
    }
}

/// Report writer that can be read while a run is still writing to it.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().expect("buffer lock");
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn fast_settings(population: u32) -> RunSettings {
    RunSettings::default()
        .with_population(population)
        .with_poll_interval(Duration::from_millis(5))
}

pub struct RunOutput {
    pub tally: Tally,
    pub lines: Vec<String>,
}

impl RunOutput {
    /// Per-outcome lines, without the three summary lines.
    pub fn status_lines(&self) -> &[String] {
        &self.lines[..self.lines.len() - 3]
    }

    pub fn summary(&self) -> &[String] {
        &self.lines[self.lines.len() - 3..]
    }
}

pub async fn run_with<B: EchoBackend>(
    backend: Arc<B>,
    settings: RunSettings,
) -> RunOutput {
    let mut out = Vec::new();
    let tally = Orchestrator::new(backend, settings)
        .run(Reporter::new(&mut out))
        .await
        .expect("run should complete");
    let text = String::from_utf8(out).expect("utf8 output");
    RunOutput {
        tally,
        lines: text.lines().map(str::to_string).collect(),
    }
}
