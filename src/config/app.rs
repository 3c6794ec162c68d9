//! Process-wide settings: environment and logging

use serde::Deserialize;

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Environment name
    #[serde(default)]
    pub environment: Environment,

    /// Tracing filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub json_logs: bool,
}

/// Application environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl AppSettings {
    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_log_level() -> String {
    "info,masarat_core=debug,reqwest=warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_development_with_text_logs() {
        let settings = AppSettings::default();
        assert_eq!(settings.environment, Environment::Development);
        assert!(!settings.json_logs);
        assert!(settings.log_level.contains("masarat_core=debug"));
    }

    #[test]
    fn production_is_detected() {
        let settings = AppSettings {
            environment: Environment::Production,
            ..Default::default()
        };
        assert!(settings.is_production());
    }
}
