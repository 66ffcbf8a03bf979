//! The resolved configuration handed to the binary.

use std::fmt;

use bindcheck_core::RunSettings;
use url::Url;

/// Fully resolved harness configuration.
#[derive(Clone)]
pub struct HarnessConfig {
    /// Connection target of the backing store. Contains credentials; use
    /// [`HarnessConfig::redacted_target`] for anything that gets logged.
    pub connection_string: String,
    /// Parameters of the run itself.
    pub run: RunSettings,
    /// Whether a `.env` file was found and applied.
    pub env_file_loaded: bool,
}

impl HarnessConfig {
    /// Connection string with any password masked.
    pub fn redacted_target(&self) -> String {
        match Url::parse(&self.connection_string) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.to_string()
            }
            Err(_) => "<unparseable>".to_string(),
        }
    }
}

impl fmt::Debug for HarnessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessConfig")
            .field("connection_string", &self.redacted_target())
            .field("run", &self.run)
            .field("env_file_loaded", &self.env_file_loaded)
            .finish()
    }
}
