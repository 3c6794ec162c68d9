//! Launch gate deciding between the auth flow and the main screen.

use std::time::Duration;

use super::state::SplashDestination;
use crate::application::AuthRepository;

pub const DEFAULT_SIGNED_OUT_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_SIGNED_IN_DELAY: Duration = Duration::from_millis(500);

pub struct SplashGate {
    auth: AuthRepository,
    signed_out_delay: Duration,
    signed_in_delay: Duration,
}

impl SplashGate {
    pub fn new(auth: AuthRepository) -> Self {
        Self {
            auth,
            signed_out_delay: DEFAULT_SIGNED_OUT_DELAY,
            signed_in_delay: DEFAULT_SIGNED_IN_DELAY,
        }
    }

    pub fn with_delays(mut self, signed_out: Duration, signed_in: Duration) -> Self {
        self.signed_out_delay = signed_out;
        self.signed_in_delay = signed_in;
        self
    }

    /// Reads the current session, holds the splash for the matching delay,
    /// then returns where to go.
    pub async fn decide(&self) -> SplashDestination {
        let (destination, delay) = match self.auth.current_identity() {
            Some(_) => (SplashDestination::Main, self.signed_in_delay),
            None => (SplashDestination::Auth, self.signed_out_delay),
        };
        tokio::time::sleep(delay).await;
        tracing::debug!(?destination, "Splash finished");
        destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryIdentityProvider;
    use crate::domain::foundation::{Identity, UserId};
    use crate::ports::IdentityProvider;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn gate(provider: InMemoryIdentityProvider) -> SplashGate {
        SplashGate::new(AuthRepository::new(Arc::new(provider) as Arc<dyn IdentityProvider>))
    }

    #[tokio::test(start_paused = true)]
    async fn signed_out_waits_longer_and_goes_to_auth() {
        let gate = gate(InMemoryIdentityProvider::new());
        let started = Instant::now();

        let destination = gate.decide().await;

        assert_eq!(destination, SplashDestination::Auth);
        assert!(started.elapsed() >= DEFAULT_SIGNED_OUT_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn signed_in_goes_to_main_after_short_delay() {
        let provider = InMemoryIdentityProvider::new();
        provider.restore_session(Identity::new(
            UserId::new("u1").unwrap(),
            Some("omar@example.com".to_string()),
            None,
        ));
        let gate = gate(provider);
        let started = Instant::now();

        let destination = gate.decide().await;

        assert_eq!(destination, SplashDestination::Main);
        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_SIGNED_IN_DELAY);
        assert!(elapsed < DEFAULT_SIGNED_OUT_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn delays_are_configurable() {
        let gate = gate(InMemoryIdentityProvider::new())
            .with_delays(Duration::from_millis(10), Duration::from_millis(5));
        let started = Instant::now();

        gate.decide().await;

        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
