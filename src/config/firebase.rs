//! Firebase project configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::app::Environment;
use super::error::ValidationError;
use super::sync::SyncConfig;
use crate::adapters::firebase::{
    FirestoreConfig, IdentityToolkitConfig, DEFAULT_FIRESTORE_URL, DEFAULT_IDENTITY_TOOLKIT_URL,
    DEFAULT_SECURE_TOKEN_URL,
};

/// Firebase configuration (Identity Toolkit + Firestore)
#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseConfig {
    /// Web API key of the Firebase project
    pub api_key: SecretString,

    /// Firebase project id
    pub project_id: String,

    /// Auth emulator `host:port`; development only
    pub auth_emulator_host: Option<String>,

    /// Firestore emulator `host:port`; development only
    pub firestore_emulator_host: Option<String>,

    /// Overrides the Identity Toolkit base URL
    pub identity_toolkit_url: Option<String>,

    /// Overrides the secure token base URL
    pub secure_token_url: Option<String>,

    /// Overrides the Firestore base URL
    pub firestore_url: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl FirebaseConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn identity_toolkit_base_url(&self) -> String {
        match (&self.identity_toolkit_url, &self.auth_emulator_host) {
            (Some(url), _) => trim_url(url),
            (None, Some(host)) => format!("http://{}/identitytoolkit.googleapis.com/v1", host),
            (None, None) => DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
        }
    }

    pub fn secure_token_base_url(&self) -> String {
        match (&self.secure_token_url, &self.auth_emulator_host) {
            (Some(url), _) => trim_url(url),
            (None, Some(host)) => format!("http://{}/securetoken.googleapis.com/v1", host),
            (None, None) => DEFAULT_SECURE_TOKEN_URL.to_string(),
        }
    }

    pub fn firestore_base_url(&self) -> String {
        match (&self.firestore_url, &self.firestore_emulator_host) {
            (Some(url), _) => trim_url(url),
            (None, Some(host)) => format!("http://{}/v1", host),
            (None, None) => DEFAULT_FIRESTORE_URL.to_string(),
        }
    }

    /// Settings for the Identity Toolkit adapter
    pub fn identity_toolkit(&self) -> IdentityToolkitConfig {
        IdentityToolkitConfig::new(self.api_key.clone())
            .with_base_urls(self.identity_toolkit_base_url(), self.secure_token_base_url())
    }

    /// Settings for the Firestore adapter
    pub fn firestore(&self, sync: &SyncConfig) -> FirestoreConfig {
        FirestoreConfig::new(self.project_id.clone())
            .with_base_url(self.firestore_base_url())
            .with_poll_interval(sync.poll_interval())
    }

    /// Validate Firebase configuration
    ///
    /// In production, requires HTTPS endpoints and rejects emulators.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("FIREBASE__API_KEY"));
        }
        if self.project_id.is_empty() {
            return Err(ValidationError::MissingRequired("FIREBASE__PROJECT_ID"));
        }
        if !self
            .project_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::InvalidProjectId);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }

        let endpoints = [
            ("IDENTITY_TOOLKIT_URL", self.identity_toolkit_base_url()),
            ("SECURE_TOKEN_URL", self.secure_token_base_url()),
            ("FIRESTORE_URL", self.firestore_base_url()),
        ];
        for (name, url) in &endpoints {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidUrl(*name));
            }
        }

        if *environment == Environment::Production {
            if self.auth_emulator_host.is_some() || self.firestore_emulator_host.is_some() {
                return Err(ValidationError::EmulatorInProduction);
            }
            for (name, url) in &endpoints {
                if !url.starts_with("https://") {
                    return Err(ValidationError::MustBeHttps(*name));
                }
            }
        }

        Ok(())
    }
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn default_request_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FirebaseConfig {
        FirebaseConfig {
            api_key: SecretString::new("AIza-test".to_string()),
            project_id: "masarat-al-nur".to_string(),
            auth_emulator_host: None,
            firestore_emulator_host: None,
            identity_toolkit_url: None,
            secure_token_url: None,
            firestore_url: None,
            request_timeout_secs: default_request_timeout(),
        }
    }

    #[test]
    fn uses_public_endpoints_by_default() {
        let config = config();
        assert_eq!(config.identity_toolkit_base_url(), DEFAULT_IDENTITY_TOOLKIT_URL);
        assert_eq!(config.firestore_base_url(), DEFAULT_FIRESTORE_URL);
        assert!(config.validate(&Environment::Production).is_ok());
    }

    #[test]
    fn emulator_hosts_build_local_urls() {
        let config = FirebaseConfig {
            auth_emulator_host: Some("localhost:9099".to_string()),
            firestore_emulator_host: Some("localhost:8080".to_string()),
            ..config()
        };

        assert_eq!(
            config.identity_toolkit_base_url(),
            "http://localhost:9099/identitytoolkit.googleapis.com/v1"
        );
        assert_eq!(config.firestore_base_url(), "http://localhost:8080/v1");
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::EmulatorInProduction)
        );
    }

    #[test]
    fn explicit_url_wins_and_is_trimmed() {
        let config = FirebaseConfig {
            firestore_url: Some("https://proxy.example.com/v1/".to_string()),
            firestore_emulator_host: Some("localhost:8080".to_string()),
            ..config()
        };
        assert_eq!(config.firestore_base_url(), "https://proxy.example.com/v1");
    }

    #[test]
    fn production_requires_https() {
        let config = FirebaseConfig {
            firestore_url: Some("http://proxy.example.com/v1".to_string()),
            ..config()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::MustBeHttps("FIRESTORE_URL"))
        );
    }

    #[test]
    fn rejects_blank_key_and_bad_project() {
        let blank = FirebaseConfig {
            api_key: SecretString::new("  ".to_string()),
            ..config()
        };
        assert_eq!(
            blank.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("FIREBASE__API_KEY"))
        );

        let bad = FirebaseConfig {
            project_id: "Masarat Al Nur".to_string(),
            ..config()
        };
        assert_eq!(
            bad.validate(&Environment::Development),
            Err(ValidationError::InvalidProjectId)
        );
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("AIza-test"));
    }

    #[test]
    fn adapter_configs_carry_settings() {
        let sync = SyncConfig {
            poll_interval_ms: 750,
        };
        let firestore = config().firestore(&sync);
        assert_eq!(firestore.project_id, "masarat-al-nur");
        assert_eq!(firestore.poll_interval, Duration::from_millis(750));

        let identity = config().identity_toolkit();
        assert_eq!(identity.base_url, DEFAULT_IDENTITY_TOOLKIT_URL);
        assert_eq!(identity.api_key.expose_secret(), "AIza-test");
    }
}
