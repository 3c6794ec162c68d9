//! Sign-in, sign-up, password reset and logout screens.
//!
//! Inputs are validated before the provider is contacted. Only one
//! operation runs at a time: a submission that arrives while the state is
//! `Loading` is dropped. A successful sign-in is only reported once the
//! user's profile exists; if provisioning fails the session is signed out
//! again so the user is never left half signed in.

use futures::StreamExt;
use tokio::sync::watch;

use super::state::AuthUiState;
use crate::application::{AuthRepository, AuthStream, UserRepository};
use crate::domain::foundation::{FederatedCredential, Identity};
use crate::domain::AuthResult;

/// Minimum password length accepted on sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

pub const SIGN_IN_PROFILE_FAILED: &str =
    "Login successful, but profile setup failed. Please try again.";
pub const SIGN_UP_PROFILE_FAILED: &str =
    "Account created, but profile setup failed. Please try signing in.";

const INVALID_EMAIL: &str = "Enter a valid email address";
const FIELD_REQUIRED: &str = "This field is required";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";
const PASSWORD_MISMATCH: &str = "Passwords do not match";

/// Where a successful authentication leads.
#[derive(Clone, Copy)]
enum Flow {
    SignIn,
    SignUp,
}

pub struct AuthViewModel {
    auth: AuthRepository,
    users: UserRepository,
    state: watch::Sender<AuthUiState>,
}

impl AuthViewModel {
    pub fn new(auth: AuthRepository, users: UserRepository) -> Self {
        let (state, _) = watch::channel(AuthUiState::Idle);
        Self { auth, users, state }
    }

    pub fn state(&self) -> AuthUiState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthUiState> {
        self.state.subscribe()
    }

    pub async fn sign_in(&self, email: &str, password: &str) {
        if self.is_busy() {
            return;
        }
        if let Err(invalid) = validate_email(email).and_then(|_| require("password", password)) {
            self.state.send_replace(invalid);
            return;
        }
        if !self.begin() {
            return;
        }
        let attempt = self.auth.sign_in_with_email_password(email.trim(), password);
        self.complete(Flow::SignIn, attempt).await;
    }

    pub async fn sign_in_with_federated(&self, credential: FederatedCredential) {
        if !self.begin() {
            return;
        }
        let attempt = self.auth.sign_in_with_federated_credential(credential);
        self.complete(Flow::SignIn, attempt).await;
    }

    pub async fn sign_up(&self, email: &str, password: &str, confirm_password: &str) {
        if self.is_busy() {
            return;
        }
        if let Err(invalid) = validate_sign_up(email, password, confirm_password) {
            self.state.send_replace(invalid);
            return;
        }
        if !self.begin() {
            return;
        }
        let attempt = self.auth.sign_up_with_email_password(email.trim(), password);
        self.complete(Flow::SignUp, attempt).await;
    }

    pub async fn send_password_reset_email(&self, email: &str) {
        if self.is_busy() {
            return;
        }
        if let Err(invalid) = validate_email(email) {
            self.state.send_replace(invalid);
            return;
        }
        if !self.begin() {
            return;
        }
        let next = match self.auth.send_password_reset_email(email.trim()).await {
            Ok(()) => AuthUiState::PasswordResetEmailSent,
            Err(e) => AuthUiState::Error(e.to_string()),
        };
        self.state.send_replace(next);
    }

    pub async fn logout(&self) {
        if !self.begin() {
            return;
        }
        tracing::debug!("Logout requested");
        let next = match self.auth.sign_out().await {
            Ok(()) => AuthUiState::NavigateToAuth,
            Err(e) => AuthUiState::Error(e.to_string()),
        };
        self.state.send_replace(next);
    }

    /// Returns to `Idle` after the screen has handled a message or
    /// navigation. Does nothing while an operation is running.
    pub fn reset_to_idle(&self) {
        self.state.send_if_modified(|state| match state {
            AuthUiState::Loading | AuthUiState::Idle => false,
            _ => {
                *state = AuthUiState::Idle;
                true
            }
        });
    }

    fn is_busy(&self) -> bool {
        let busy = matches!(*self.state.borrow(), AuthUiState::Loading);
        if busy {
            tracing::debug!("Ignoring submission while another operation is running");
        }
        busy
    }

    /// Moves to `Loading`; false if an operation is already running.
    fn begin(&self) -> bool {
        self.state.send_if_modified(|state| {
            if matches!(state, AuthUiState::Loading) {
                false
            } else {
                *state = AuthUiState::Loading;
                true
            }
        })
    }

    async fn complete(&self, flow: Flow, mut attempt: AuthStream) {
        let mut outcome = None;
        while let Some(result) = attempt.next().await {
            if result.is_terminal() {
                outcome = Some(result);
                break;
            }
        }

        let next = match outcome {
            Some(AuthResult::Success(identity)) => self.provision(flow, &identity).await,
            Some(AuthResult::Error(e)) => AuthUiState::Error(e.to_string()),
            _ => AuthUiState::Error("Authentication did not complete".to_string()),
        };
        self.state.send_replace(next);
    }

    async fn provision(&self, flow: Flow, identity: &Identity) -> AuthUiState {
        match self.users.ensure_profile_exists(identity).await {
            Ok(()) => match flow {
                Flow::SignIn => AuthUiState::NavigateToMain,
                Flow::SignUp => AuthUiState::NavigateToLogin,
            },
            Err(e) => {
                tracing::error!(uid = %identity.uid, "Profile setup failed: {}", e);
                if let Err(e) = self.auth.sign_out().await {
                    tracing::error!("Sign-out after failed profile setup also failed: {}", e);
                }
                tracing::warn!(uid = %identity.uid, "Signed out after failed profile setup");
                let message = match flow {
                    Flow::SignIn => SIGN_IN_PROFILE_FAILED,
                    Flow::SignUp => SIGN_UP_PROFILE_FAILED,
                };
                AuthUiState::Error(message.to_string())
            }
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), AuthUiState> {
    if value.is_empty() {
        return Err(AuthUiState::invalid(field, FIELD_REQUIRED));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AuthUiState> {
    if is_valid_email(email.trim()) {
        Ok(())
    } else {
        Err(AuthUiState::invalid("email", INVALID_EMAIL))
    }
}

fn validate_sign_up(email: &str, password: &str, confirm: &str) -> Result<(), AuthUiState> {
    validate_email(email)?;
    require("password", password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthUiState::invalid("password", PASSWORD_TOO_SHORT));
    }
    require("confirmPassword", confirm)?;
    if password != confirm {
        return Err(AuthUiState::invalid("confirmPassword", PASSWORD_MISMATCH));
    }
    Ok(())
}

/// Shape check only; the provider has the final word.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
