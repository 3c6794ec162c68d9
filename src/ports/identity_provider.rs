//! Identity provider port - email/password and federated sign-in.
//!
//! The provider owns the auth session entirely: it creates it on sign-in,
//! destroys it on sign-out, and tells listeners about every change. The
//! client never fabricates a session on its own.

use async_trait::async_trait;

use super::Listener;
use crate::domain::foundation::{AuthError, FederatedCredential, Identity};

/// External identity provider.
///
/// # Contract
///
/// Implementations must:
/// - Hold at most one signed-in identity at a time
/// - Sign the new user in when `create_user` succeeds
/// - Push the current identity (or `None`) to a new listener immediately,
///   then again after every sign-in and sign-out
/// - Report failures as `AuthError`, passing unknown provider messages
///   through as `AuthError::ProviderRejected`
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The identity currently signed in, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// Subscribes to auth-state changes.
    fn listen(&self) -> Listener<Option<Identity>>;

    /// Registers a new email/password account and signs it in.
    async fn create_user(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Identity, AuthError>;

    /// Exchanges a federated provider token for an identity.
    async fn sign_in_with_credential(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Identity, AuthError>;

    async fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;
}
