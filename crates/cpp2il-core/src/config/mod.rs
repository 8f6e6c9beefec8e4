//! Application configuration schemas.
//!
//! All configuration structs are deserialized from a TOML file via the
//! `config` crate, overlaid with `CPP2IL__SECTION__KEY` environment
//! variables. Each sub-module represents a logical configuration section.

pub mod game;
pub mod logging;
pub mod packages;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use self::game::GameConfig;
use self::logging::LoggingConfig;
use self::packages::PackagesConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "CPP2IL";

/// Root host configuration.
///
/// Crates with their own sections (the importer) read them from the same
/// [`config::Config`] through [`section`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Game installation settings.
    #[serde(default)]
    pub game: GameConfig,
    /// Destination package tree settings.
    #[serde(default)]
    pub packages: PackagesConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    pub fn load(path: &str) -> Result<Self, AppError> {
        Self::from_source(&load_source(path)?)
    }

    /// Deserialize the host sections out of an already built source.
    pub fn from_source(source: &config::Config) -> Result<Self, AppError> {
        source
            .clone()
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Package name derived from the game executable.
    pub fn package_name(&self) -> String {
        self.game.executable_stem()
    }
}

/// Build the merged configuration source.
///
/// A missing file is not an error; every section has defaults.
pub fn load_source(path: &str) -> Result<config::Config, AppError> {
    config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))
}

/// Deserialize one named section, falling back to its default when absent.
pub fn section<T>(source: &config::Config, key: &str) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    match source.get::<T>(key) {
        Ok(value) => Ok(value),
        Err(config::ConfigError::NotFound(_)) => {
            tracing::debug!(section = key, "Config section absent, using defaults");
            Ok(T::default())
        }
        Err(e) => Err(AppError::configuration(format!(
            "Invalid [{key}] section: {e}"
        ))),
    }
}
