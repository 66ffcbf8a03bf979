//! Resolution of overrides, environment and defaults into a [`HarnessConfig`].

use std::{
    fs::read_to_string,
    num::NonZeroUsize,
    path::Path,
    str::FromStr,
    time::Duration,
};

use bindcheck_core::{
    RunSettings,
    settings::{
        DEFAULT_POLL_INTERVAL, DEFAULT_POPULATION, DEFAULT_STATEMENT_TIMEOUT,
    },
};
use tracing::debug;

use crate::{
    ConfigLoadError,
    models::HarnessConfig,
    sources::{self, EnvConfig},
    validation::{ConfigWarnings, apply_guard_rails},
};

/// Values supplied on the command line. Each one wins over its environment
/// counterpart.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Connection target; blank is treated as unset.
    pub connection_string: Option<String>,
    /// Number of workers.
    pub population: Option<u32>,
    /// Orchestrator poll interval.
    pub poll_interval: Option<Duration>,
    /// Per-statement budget.
    pub statement_timeout: Option<Duration>,
    /// Cap on concurrent round trips.
    pub max_in_flight: Option<NonZeroUsize>,
}

/// Result of a successful load: the configuration plus anything worth
/// telling the operator before the run starts.
#[derive(Debug)]
pub struct ConfigLoad {
    /// Resolved configuration.
    pub config: HarnessConfig,
    /// Non-fatal findings of the guard rails.
    pub warnings: ConfigWarnings,
}

#[derive(Debug, Clone)]
enum EnvSource {
    /// Read the process environment, optionally seeding it from `.env`.
    Process { env_file: bool },
    /// Use the given values as-is.
    Fixed(EnvConfig),
}

/// Builder that resolves a [`HarnessConfig`].
///
/// Precedence, highest first: [`ConfigOverrides`], the environment (or the
/// values passed to [`ConfigLoader::with_env`]), built-in defaults.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    source: EnvSource,
    overrides: ConfigOverrides,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Read the process environment, seeding it from `.env` first.
    pub fn new() -> Self {
        Self {
            source: EnvSource::Process { env_file: true },
            overrides: ConfigOverrides::default(),
        }
    }

    /// Skip loading `.env` from the working directory.
    pub fn without_env_file(mut self) -> Self {
        if let EnvSource::Process { env_file } = &mut self.source {
            *env_file = false;
        }
        self
    }

    /// Resolve from a fixed set of values instead of the process environment.
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.source = EnvSource::Fixed(env);
        self
    }

    /// Values that win over the environment.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Resolve every value and run the guard rails.
    pub fn load(self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env, env_file_loaded) = match self.source {
            EnvSource::Process { env_file } => {
                let loaded = env_file && load_env_file()?;
                (EnvConfig::from_env(), loaded)
            }
            EnvSource::Fixed(env) => (env, false),
        };

        let config = resolve(&env, self.overrides, env_file_loaded)?;
        let warnings = apply_guard_rails(&config)?;
        Ok(ConfigLoad { config, warnings })
    }
}

fn load_env_file() -> Result<bool, ConfigLoadError> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env file");
            Ok(true)
        }
        Err(err) if err.not_found() => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn resolve(
    env: &EnvConfig,
    overrides: ConfigOverrides,
    env_file_loaded: bool,
) -> Result<HarnessConfig, ConfigLoadError> {
    let connection_string = match overrides
        .connection_string
        .filter(|value| !value.trim().is_empty())
    {
        Some(value) => value,
        None => resolve_connection_string(env)?
            .ok_or(ConfigLoadError::MissingConnectionString)?,
    };

    let population = match overrides.population {
        Some(population) => population,
        None => parse_value(sources::POPULATION, env.population.as_deref())?
            .unwrap_or(DEFAULT_POPULATION),
    };

    let poll_interval = match overrides.poll_interval {
        Some(interval) => interval,
        None => parse_duration(
            sources::POLL_INTERVAL,
            env.poll_interval.as_deref(),
        )?
        .unwrap_or(DEFAULT_POLL_INTERVAL),
    };
    ensure_non_zero(sources::POLL_INTERVAL, poll_interval)?;

    let statement_timeout = match overrides.statement_timeout {
        Some(timeout) => timeout,
        None => parse_duration(
            sources::STATEMENT_TIMEOUT,
            env.statement_timeout.as_deref(),
        )?
        .unwrap_or(DEFAULT_STATEMENT_TIMEOUT),
    };
    // PostgreSQL reads a zero statement_timeout as "no limit", and the
    // setting is sent in whole milliseconds.
    ensure_non_zero(sources::STATEMENT_TIMEOUT, statement_timeout)?;
    ensure_whole_millisecond(sources::STATEMENT_TIMEOUT, statement_timeout)?;

    let max_in_flight = match overrides.max_in_flight {
        Some(cap) => Some(cap),
        None => parse_value::<NonZeroUsize>(
            sources::MAX_IN_FLIGHT,
            env.max_in_flight.as_deref(),
        )?,
    };

    Ok(HarnessConfig {
        connection_string,
        run: RunSettings {
            population,
            poll_interval,
            statement_timeout,
            max_in_flight,
        },
        env_file_loaded,
    })
}

fn resolve_connection_string(
    env: &EnvConfig,
) -> Result<Option<String>, ConfigLoadError> {
    if let Some(value) = env.connection_string.clone() {
        return Ok(Some(value));
    }

    if let Some(path) = env.connection_string_file.as_ref() {
        return read_secret_file(path);
    }

    Ok(None)
}

/// Read a connection target from `path`, trimmed. An empty file yields
/// `None`.
pub fn read_secret_file(path: &Path) -> Result<Option<String>, ConfigLoadError> {
    let contents = read_to_string(path).map_err(|source| {
        ConfigLoadError::SecretFileIo {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let trimmed = contents.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

fn parse_value<T>(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Option<T>, ConfigLoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|err| ConfigLoadError::InvalidValue {
            key,
            value: value.to_string(),
            reason: err.to_string(),
        })
    })
    .transpose()
}

fn parse_duration(
    key: &'static str,
    raw: Option<&str>,
) -> Result<Option<Duration>, ConfigLoadError> {
    raw.map(|value| {
        humantime::parse_duration(value).map_err(|err| {
            ConfigLoadError::InvalidValue {
                key,
                value: value.to_string(),
                reason: err.to_string(),
            }
        })
    })
    .transpose()
}

fn ensure_non_zero(
    key: &'static str,
    value: Duration,
) -> Result<(), ConfigLoadError> {
    if value.is_zero() {
        Err(ConfigLoadError::ZeroDuration { key })
    } else {
        Ok(())
    }
}

fn ensure_whole_millisecond(
    key: &'static str,
    value: Duration,
) -> Result<(), ConfigLoadError> {
    if value < Duration::from_millis(1) {
        Err(ConfigLoadError::SubMillisecond { key, value })
    } else {
        Ok(())
    }
}
