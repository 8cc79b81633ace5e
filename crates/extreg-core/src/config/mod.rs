//! Host configuration schemas.
//!
//! Deserialized through the `config` crate from an optional TOML file and
//! `EXTREG__*` environment variables.

pub mod extensions;
pub mod logging;

use std::path::Path;

use serde::{Deserialize, Serialize};

use self::extensions::ExtensionConfig;
use self::logging::LoggingConfig;

use crate::error::RegistryError;

/// Root host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Module search paths and settings.
    #[serde(default)]
    pub extensions: ExtensionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HostConfig {
    /// Load configuration.
    ///
    /// Reads `path` when given (it must exist), then overlays environment
    /// variables prefixed with `EXTREG`, e.g. `EXTREG__LOGGING__LEVEL`.
    pub fn load(path: Option<&Path>) -> Result<Self, RegistryError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("EXTREG")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| RegistryError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| RegistryError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
