//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `MASARAT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use masarat_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Firebase project {}", config.firebase.project_id);
//! ```

mod app;
mod error;
mod firebase;
mod splash;
mod sync;

pub use app::{AppSettings, Environment};
pub use error::{ConfigError, ValidationError};
pub use firebase::FirebaseConfig;
pub use splash::SplashConfig;
pub use sync::SyncConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Environment and logging
    #[serde(default)]
    pub app: AppSettings,

    /// Firebase project (API key, project id, endpoints)
    pub firebase: FirebaseConfig,

    /// Listener polling
    #[serde(default)]
    pub sync: SyncConfig,

    /// Splash screen timing
    #[serde(default)]
    pub splash: SplashConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `MASARAT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `MASARAT__FIREBASE__API_KEY=...` -> `firebase.api_key = ...`
    /// - `MASARAT__SYNC__POLL_INTERVAL_MS=2000` -> `sync.poll_interval_ms = 2000`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MASARAT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.firebase.validate(&self.app.environment)?;
        self.sync.validate()?;
        self.splash.validate()?;
        Ok(())
    }

    /// Loads and validates in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.app.is_production()
    }
}
