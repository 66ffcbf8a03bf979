//! Configuration for bindcheck.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file) and are overridden by command-line flags. The only required value is
//! the connection target; a missing target is a fatal [`ConfigLoadError`]
//! raised before any worker exists.

pub mod error;
pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader, ConfigOverrides};
pub use models::HarnessConfig;
pub use sources::EnvConfig;
pub use validation::{ConfigWarning, ConfigWarnings};
