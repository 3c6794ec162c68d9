//! Authentication use cases over the `IdentityProvider` port.

use std::sync::Arc;

use futures::future::{self, ready};
use futures::stream::{self, BoxStream};
use futures::StreamExt;

use crate::domain::foundation::{AuthError, FederatedCredential, Identity};
use crate::domain::AuthResult;
use crate::ports::IdentityProvider;

/// Stream of one authentication attempt: `Loading`, then one terminal result.
pub type AuthStream = BoxStream<'static, AuthResult>;

/// Sign-up, sign-in and session observation.
///
/// Sign-in operations are exposed as short streams rather than futures so
/// screens can render the `Loading` state before the provider answers.
#[derive(Clone)]
pub struct AuthRepository {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthRepository {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    /// The identity signed in right now.
    pub fn current_identity(&self) -> Option<Identity> {
        self.provider.current_identity()
    }

    /// Current identity, re-emitted on every sign-in and sign-out.
    ///
    /// The provider listener is registered on first poll and removed when
    /// the stream is dropped. Each call returns an independent stream.
    pub fn observe_auth_state(&self) -> BoxStream<'static, Option<Identity>> {
        let provider = Arc::clone(&self.provider);
        stream::once(future::lazy(move |_| {
            tracing::debug!("Auth state listener registered");
            provider.listen()
        }))
        .flatten()
        .boxed()
    }

    pub fn sign_up_with_email_password(&self, email: &str, password: &str) -> AuthStream {
        let provider = Arc::clone(&self.provider);
        let (email, password) = (email.to_string(), password.to_string());
        attempt("sign_up", async move { provider.create_user(&email, &password).await })
    }

    pub fn sign_in_with_email_password(&self, email: &str, password: &str) -> AuthStream {
        let provider = Arc::clone(&self.provider);
        let (email, password) = (email.to_string(), password.to_string());
        attempt("sign_in", async move {
            provider.sign_in_with_password(&email, &password).await
        })
    }

    /// Signs in with a token from a federated flow such as Google.
    ///
    /// A credential without an id token fails without contacting the provider.
    pub fn sign_in_with_federated_credential(&self, credential: FederatedCredential) -> AuthStream {
        let provider = Arc::clone(&self.provider);
        attempt("federated_sign_in", async move {
            if let Err(e) = credential.id_token() {
                return Err(e);
            }
            provider.sign_in_with_credential(&credential).await
        })
    }

    pub async fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError> {
        self.provider
            .send_password_reset_email(email)
            .await
            .map_err(|e| {
                tracing::warn!("Password reset email failed: {}", e);
                e
            })
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await
    }
}

/// `Loading`, then the outcome of `operation`, then the end of the stream.
fn attempt<F>(operation: &'static str, call: F) -> AuthStream
where
    F: std::future::Future<Output = Result<Identity, AuthError>> + Send + 'static,
{
    stream::once(ready(AuthResult::Loading))
        .chain(stream::once(async move {
            match call.await {
                Ok(identity) => {
                    tracing::info!(operation, uid = %identity.uid, "Authentication succeeded");
                    AuthResult::Success(identity)
                }
                Err(e) => {
                    tracing::warn!(operation, "Authentication failed: {}", e);
                    AuthResult::Error(e)
                }
            }
        }))
        .boxed()
}
