//! # bindcheck
//!
//! Spawns a large population of concurrent workers, each of which binds its
//! own identity into `SELECT $1 AS id` inside a READ COMMITTED transaction and
//! checks that the committed result echoes it back. One status line per
//! identity is written to stdout, followed by the totals. Diagnostics go to
//! stderr.

use std::{num::NonZeroUsize, process::ExitCode, sync::Arc, time::Duration};

use anyhow::Context;
use bindcheck_config::{ConfigLoad, ConfigLoader, ConfigOverrides};
use bindcheck_core::{Orchestrator, PostgresEchoBackend, Reporter};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "bindcheck", version)]
#[command(
    about = "Check that concurrent transactional round trips echo back their own bound parameter"
)]
struct Cli {
    /// PostgreSQL connection URL (overrides CONNECTION_STRING)
    #[arg(long)]
    connection_string: Option<String>,

    /// Number of concurrent workers (overrides BINDCHECK_POPULATION)
    #[arg(short = 'n', long)]
    population: Option<u32>,

    /// Sleep between completion checks, e.g. 100ms (overrides BINDCHECK_POLL_INTERVAL)
    #[arg(long, value_parser = humantime::parse_duration)]
    poll_interval: Option<Duration>,

    /// Execution budget of the echo statement, e.g. 1s (overrides BINDCHECK_STATEMENT_TIMEOUT)
    #[arg(long, value_parser = humantime::parse_duration)]
    statement_timeout: Option<Duration>,

    /// Cap on simultaneously running round trips; unbounded when omitted
    #[arg(long)]
    max_in_flight: Option<NonZeroUsize>,

    /// Do not read a .env file from the working directory
    #[arg(long, default_value_t = false)]
    no_env_file: bool,

    /// Exit non-zero when any wrong result or exception was counted
    #[arg(long, default_value_t = false)]
    strict: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            connection_string: self.connection_string.clone(),
            population: self.population,
            poll_interval: self.poll_interval,
            statement_timeout: self.statement_timeout,
            max_in_flight: self.max_in_flight,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new().with_overrides(cli.overrides());
    if cli.no_env_file {
        loader = loader.without_env_file();
    }
    let ConfigLoad { config, warnings } =
        loader.load().context("failed to load configuration")?;

    init_tracing();

    if config.env_file_loaded {
        info!("loaded .env file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    let backend = PostgresEchoBackend::new(&config.connection_string)
        .context("failed to build connection options")?;
    info!(
        target_db = %backend.target(),
        population = config.run.population,
        poll_interval_ms = config.run.poll_interval.as_millis() as u64,
        "starting run"
    );

    let tally = Orchestrator::new(Arc::new(backend), config.run)
        .run(Reporter::new(std::io::stdout()))
        .await
        .context("run aborted")?;

    if cli.strict && !tally.is_clean() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
