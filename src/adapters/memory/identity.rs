//! In-process identity provider.
//!
//! Implements the `IdentityProvider` port without any external service.
//! Accounts live in memory, federated tokens are registered up front, and
//! every failure path can be forced for tests.
//!
//! # Example
//!
//! ```
//! use masarat_core::adapters::memory::InMemoryIdentityProvider;
//! use masarat_core::ports::IdentityProvider;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = InMemoryIdentityProvider::new().with_account("omar@example.com", "secret-1");
//!
//! let identity = provider.sign_in_with_password("omar@example.com", "secret-1").await.unwrap();
//! assert_eq!(provider.current_identity(), Some(identity));
//! # });
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use crate::adapters::listener_hub::ListenerHub;
use crate::domain::foundation::{AuthError, FederatedCredential, Identity, UserId};
use crate::ports::{IdentityProvider, Listener};

/// Minimum password length accepted on sign-up.
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password: String,
}

/// In-memory identity provider.
///
/// Emails are matched case-insensitively. Accounts created through
/// `create_user` are signed in immediately, like the hosted provider does.
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    federated: RwLock<HashMap<String, Identity>>,
    current: RwLock<Option<Identity>>,
    force_error: RwLock<Option<AuthError>>,
    reset_requests: RwLock<Vec<String>>,
    listeners: ListenerHub<(), Option<Identity>>,
    calls: AtomicUsize,
    sign_outs: AtomicUsize,
}

impl InMemoryIdentityProvider {
    /// Creates a provider with no accounts and nobody signed in.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            federated: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            force_error: RwLock::new(None),
            reset_requests: RwLock::new(Vec::new()),
            listeners: ListenerHub::new(),
            calls: AtomicUsize::new(0),
            sign_outs: AtomicUsize::new(0),
        }
    }

    /// Registers an email/password account.
    pub fn with_account(self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.add_account(email, password);
        self
    }

    /// Registers a federated id token that signs in as `identity`.
    pub fn with_federated_token(self, id_token: impl Into<String>, identity: Identity) -> Self {
        write(&self.federated).insert(id_token.into(), identity);
        self
    }

    /// Forces every remote operation to fail with `error`.
    pub fn with_error(self, error: AuthError) -> Self {
        *write(&self.force_error) = Some(error);
        self
    }

    /// Clears the forced error and returns to normal operation.
    pub fn clear_error(&self) {
        *write(&self.force_error) = None;
    }

    /// Registers an account at runtime and returns its identity.
    pub fn add_account(&self, email: impl Into<String>, password: impl Into<String>) -> Identity {
        let email = email.into();
        let identity = Identity::new(UserId::generate(), Some(email.clone()), None);
        write(&self.accounts).insert(
            email.to_lowercase(),
            Account {
                identity: identity.clone(),
                password: password.into(),
            },
        );
        identity
    }

    /// Signs `identity` in directly, as if a session had been restored.
    pub fn restore_session(&self, identity: Identity) {
        self.set_current(Some(identity));
    }

    /// Emails that password resets were requested for, in order.
    pub fn reset_requests(&self) -> Vec<String> {
        read(&self.reset_requests).clone()
    }

    /// Number of auth-state listeners still registered.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of remote operations attempted (sign-up, sign-in, reset, sign-out).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match read(&self.force_error).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Writes the identity and notifies listeners under the same lock that
    /// `listen` reads it with.
    fn set_current(&self, identity: Option<Identity>) {
        let mut current = write(&self.current);
        *current = identity;
        self.listeners.notify(|_| Some((*current).clone()));
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        read(&self.current).clone()
    }

    fn listen(&self) -> Listener<Option<Identity>> {
        let current = read(&self.current);
        self.listeners.register((), (*current).clone())
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.begin_call()?;
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if read(&self.accounts).contains_key(&email.to_lowercase()) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let identity = self.add_account(email, password);
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        self.begin_call()?;
        let account = read(&self.accounts).get(&email.to_lowercase()).cloned();
        match account {
            Some(account) if account.password == password => {
                self.set_current(Some(account.identity.clone()));
                Ok(account.identity)
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_in_with_credential(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Identity, AuthError> {
        self.begin_call()?;
        let token = credential.id_token()?;
        let identity = read(&self.federated)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)?;
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError> {
        self.begin_call()?;
        if !read(&self.accounts).contains_key(&email.to_lowercase()) {
            return Err(AuthError::UserNotFound);
        }
        write(&self.reset_requests).push(email.to_string());
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        self.set_current(None);
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn provider() -> InMemoryIdentityProvider {
        InMemoryIdentityProvider::new().with_account("omar@example.com", "secret-1")
    }

    #[tokio::test]
    async fn sign_in_with_correct_password_sets_current_identity() {
        let provider = provider();

        let identity = provider
            .sign_in_with_password("Omar@Example.com", "secret-1")
            .await
            .unwrap();

        assert_eq!(identity.email.as_deref(), Some("omar@example.com"));
        assert_eq!(provider.current_identity(), Some(identity));
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_fails() {
        let result = provider().sign_in_with_password("omar@example.com", "nope").await;
        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn create_user_enforces_password_policy() {
        let result = provider().create_user("new@example.com", "123").await;
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn create_user_rejects_existing_email() {
        let result = provider().create_user("omar@example.com", "secret-2").await;
        assert_eq!(result, Err(AuthError::EmailAlreadyInUse));
    }

    #[tokio::test]
    async fn create_user_signs_new_account_in() {
        let provider = provider();

        let identity = provider.create_user("new@example.com", "secret-2").await.unwrap();

        assert_eq!(provider.current_identity(), Some(identity));
    }

    #[tokio::test]
    async fn federated_sign_in_uses_registered_token() {
        let identity = Identity::new(UserId::new("g-1").unwrap(), None, Some("G".to_string()));
        let provider = InMemoryIdentityProvider::new().with_federated_token("tok", identity.clone());

        let signed_in = provider
            .sign_in_with_credential(&FederatedCredential::google("tok"))
            .await
            .unwrap();

        assert_eq!(signed_in, identity);
    }

    #[tokio::test]
    async fn listener_sees_current_state_then_changes() {
        let provider = provider();
        let mut listener = provider.listen();

        let identity = provider
            .sign_in_with_password("omar@example.com", "secret-1")
            .await
            .unwrap();
        provider.sign_out().await.unwrap();

        assert_eq!(listener.next().await, Some(None));
        assert_eq!(listener.next().await, Some(Some(identity)));
        assert_eq!(listener.next().await, Some(None));
    }

    #[test]
    fn listener_registered_during_sign_in_settles_on_current_identity() {
        use futures::FutureExt;

        let omar = Identity::new(UserId::new("omar").unwrap(), None, None);
        for _ in 0..2000 {
            let provider = InMemoryIdentityProvider::new();
            let mut listener = std::thread::scope(|scope| {
                scope.spawn(|| provider.restore_session(omar.clone()));
                scope.spawn(|| provider.listen()).join().unwrap()
            });

            let mut last = None;
            while let Some(Some(value)) = listener.next().now_or_never() {
                last = Some(value);
            }
            assert_eq!(last, Some(provider.current_identity()));
        }
    }

    #[tokio::test]
    async fn dropping_listener_deregisters() {
        let provider = provider();
        let listener = provider.listen();
        assert_eq!(provider.listener_count(), 1);

        drop(listener);

        assert_eq!(provider.listener_count(), 0);
    }

    #[tokio::test]
    async fn forced_error_applies_to_every_remote_call() {
        let provider = provider().with_error(AuthError::NetworkUnavailable("offline".to_string()));

        let result = provider.sign_in_with_password("omar@example.com", "secret-1").await;
        assert!(matches!(result, Err(AuthError::NetworkUnavailable(_))));

        provider.clear_error();
        assert!(provider
            .sign_in_with_password("omar@example.com", "secret-1")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn password_reset_is_recorded_for_known_accounts() {
        let provider = provider();

        provider.send_password_reset_email("omar@example.com").await.unwrap();
        let unknown = provider.send_password_reset_email("ghost@example.com").await;

        assert_eq!(provider.reset_requests(), vec!["omar@example.com".to_string()]);
        assert_eq!(unknown, Err(AuthError::UserNotFound));
    }
}
