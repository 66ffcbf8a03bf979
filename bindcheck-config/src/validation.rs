//! Guard rails applied after all values are resolved.

use url::Url;

use crate::{ConfigLoadError, models::HarnessConfig};

/// A configuration that runs, but not the way a full check should.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// What is off.
    pub message: String,
    /// How to fix it, when there is something to suggest.
    pub hint: Option<String>,
}

/// Warnings collected while loading, in the order they were raised.
#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    /// Every warning raised.
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    /// Record a warning without a hint.
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    /// Record a warning with a suggested fix.
    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    /// True when nothing was raised.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Reject configurations that cannot run and collect warnings for ones that
/// run but weaken the check.
pub fn apply_guard_rails(
    config: &HarnessConfig,
) -> Result<ConfigWarnings, ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    validate_connection_string(&config.connection_string)?;

    if config.run.population == 0 {
        warnings.push("population is 0; no round trips will be made");
    }

    if let Some(cap) = config.run.max_in_flight {
        warnings.push_with_hint(
            format!("concurrency capped at {cap} in-flight round trips"),
            "Binding races only surface under load; unset BINDCHECK_MAX_IN_FLIGHT for a full-pressure run",
        );
    }

    Ok(warnings)
}

fn validate_connection_string(raw: &str) -> Result<(), ConfigLoadError> {
    let url = Url::parse(raw)
        .map_err(|source| ConfigLoadError::InvalidConnectionString { source })?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => Err(ConfigLoadError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}
