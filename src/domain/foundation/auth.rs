//! Authentication types for the domain layer.
//!
//! These types describe the signed-in subject and the ways signing in can
//! fail. They have **no provider dependencies** - the Firebase adapter and
//! the in-memory adapter both populate them through the `IdentityProvider`
//! port.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::UserId;

/// The identity of the signed-in user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Subject id; also the key of the user's profile document.
    pub uid: UserId,

    /// Email address, absent for some federated accounts.
    pub email: Option<String>,

    /// Display name reported by the provider, if any.
    pub display_name: Option<String>,

    /// Whether the provider has verified the email address.
    pub email_verified: bool,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(uid: UserId, email: Option<String>, display_name: Option<String>) -> Self {
        Self {
            uid,
            email,
            display_name,
            email_verified: false,
        }
    }

    /// Marks the email as verified.
    pub fn verified(mut self) -> Self {
        self.email_verified = true;
        self
    }

    /// Returns the display name, or email as fallback.
    pub fn display_name_or_email(&self) -> Option<&str> {
        self.display_name.as_deref().or(self.email.as_deref())
    }
}

/// Federated identity providers the client can exchange tokens with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FederatedProvider {
    Google,
    Other(String),
}

impl FederatedProvider {
    /// Provider id understood by the identity provider.
    pub fn provider_id(&self) -> &str {
        match self {
            FederatedProvider::Google => "google.com",
            FederatedProvider::Other(id) => id,
        }
    }
}

/// A token obtained from a federated sign-in flow (e.g. Google).
#[derive(Debug, Clone)]
pub struct FederatedCredential {
    pub provider: FederatedProvider,
    id_token: Option<SecretString>,
}

impl FederatedCredential {
    /// Creates a credential from an optional provider id token.
    pub fn new(provider: FederatedProvider, id_token: Option<String>) -> Self {
        Self {
            provider,
            id_token: id_token.map(SecretString::new),
        }
    }

    /// Convenience constructor for Google sign-in.
    pub fn google(id_token: impl Into<String>) -> Self {
        Self::new(FederatedProvider::Google, Some(id_token.into()))
    }

    /// The provider id token, or `MissingIdToken` when the flow returned none.
    pub fn id_token(&self) -> Result<&str, AuthError> {
        self.id_token
            .as_ref()
            .map(|token| token.expose_secret().as_str())
            .ok_or(AuthError::MissingIdToken)
    }
}

/// Authentication failures.
///
/// The display text is what screens show; callers are not expected to
/// branch on more than [`AuthError::is_transient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("The email or password is incorrect")]
    InvalidCredentials,

    #[error("An account already exists for this email")]
    EmailAlreadyInUse,

    #[error("The email address is badly formatted")]
    InvalidEmail,

    #[error("Weak password: {0}")]
    WeakPassword(String),

    #[error("This account has been disabled")]
    UserDisabled,

    #[error("No account exists for this email")]
    UserNotFound,

    #[error("Too many attempts, try again later")]
    TooManyAttempts,

    #[error("Federated sign-in returned no id token")]
    MissingIdToken,

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("{0}")]
    ProviderRejected(String),
}

impl AuthError {
    /// Creates a pass-through provider error with a message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::ProviderRejected(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthError::NetworkUnavailable(_) | AuthError::TooManyAttempts
        )
    }
}
