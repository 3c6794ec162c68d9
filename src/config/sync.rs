//! Real-time listener configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// How the REST document store emulates real-time listeners
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Listener poll interval in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(250..=600_000).contains(&self.poll_interval_ms) {
            return Err(ValidationError::InvalidPollInterval);
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interval_is_valid() {
        let config = SyncConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_intervals_out_of_range() {
        assert!(SyncConfig { poll_interval_ms: 10 }.validate().is_err());
        assert!(SyncConfig { poll_interval_ms: 3_600_000 }.validate().is_err());
    }
}
