//! Splash screen timing

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

const MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct SplashConfig {
    /// Minimum display time when nobody is signed in
    #[serde(default = "default_signed_out_delay")]
    pub signed_out_delay_ms: u64,

    /// Minimum display time when a session is restored
    #[serde(default = "default_signed_in_delay")]
    pub signed_in_delay_ms: u64,
}

impl SplashConfig {
    pub fn signed_out_delay(&self) -> Duration {
        Duration::from_millis(self.signed_out_delay_ms)
    }

    pub fn signed_in_delay(&self) -> Duration {
        Duration::from_millis(self.signed_in_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.signed_out_delay_ms > MAX_DELAY_MS || self.signed_in_delay_ms > MAX_DELAY_MS {
            return Err(ValidationError::InvalidSplashDelay);
        }
        Ok(())
    }
}

impl Default for SplashConfig {
    fn default() -> Self {
        Self {
            signed_out_delay_ms: default_signed_out_delay(),
            signed_in_delay_ms: default_signed_in_delay(),
        }
    }
}

fn default_signed_out_delay() -> u64 {
    1_500
}

fn default_signed_in_delay() -> u64 {
    500
}
