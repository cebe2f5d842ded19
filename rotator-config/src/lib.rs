//! Configuration loading for the site rotator.
//!
//! Settings are layered: built-in defaults, then `rotator.toml`, then
//! environment variables (optionally seeded from a `.env` file), then
//! explicit overrides passed to the [`ConfigLoader`]. The composed
//! [`Config`] is checked against guard rails before it is handed out.

pub mod error;
pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use error::ConfigLoadError;
pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    Config, ConfigMetadata, ProbeConfig, RotationConfig, SourceConfig,
    StateConfig,
};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
