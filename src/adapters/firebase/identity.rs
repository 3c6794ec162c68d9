//! Firebase Authentication adapter over the Identity Toolkit REST API.
//!
//! Implements the `IdentityProvider` port with:
//!
//! 1. `accounts:signUp` / `accounts:signInWithPassword` for email accounts
//! 2. `accounts:signInWithIdp` for federated (Google) id tokens
//! 3. `accounts:sendOobCode` for password reset emails
//! 4. The secure token endpoint to refresh expired id tokens
//!
//! The session (id token, refresh token, expiry) is held in memory only and
//! handed to the Firestore adapter through [`IdTokenSource`].
//!
//! # Example
//!
//! ```ignore
//! use masarat_core::adapters::firebase::{FirebaseIdentityProvider, IdentityToolkitConfig};
//!
//! let config = IdentityToolkitConfig::new(api_key);
//! let provider = FirebaseIdentityProvider::new(config, reqwest::Client::new());
//! let identity = provider.sign_in_with_password("omar@example.com", "secret-1").await?;
//! ```

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::adapters::listener_hub::ListenerHub;
use crate::domain::foundation::{AuthError, FederatedCredential, Identity, UserId};
use crate::ports::{IdentityProvider, Listener};

/// Default Identity Toolkit endpoint.
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Default secure token endpoint.
pub const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

/// Refresh this long before the id token actually expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Configuration for the Identity Toolkit adapter.
#[derive(Debug, Clone)]
pub struct IdentityToolkitConfig {
    /// Web API key of the Firebase project.
    pub api_key: SecretString,

    /// Identity Toolkit base URL (overridden for the emulator).
    pub base_url: String,

    /// Secure token base URL.
    pub token_url: String,

    /// `requestUri` sent with federated sign-in.
    pub request_uri: String,
}

impl IdentityToolkitConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
            token_url: DEFAULT_SECURE_TOKEN_URL.to_string(),
            request_uri: "http://localhost".to_string(),
        }
    }

    /// Points both endpoints at another host, e.g. the local emulator.
    pub fn with_base_urls(mut self, base_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.token_url = token_url.into();
        self
    }

    fn accounts_url(&self, method: &str) -> String {
        format!("{}/accounts:{}", self.base_url.trim_end_matches('/'), method)
    }

    fn refresh_url(&self) -> String {
        format!("{}/token", self.token_url.trim_end_matches('/'))
    }
}

/// Supplies the bearer token for authenticated database requests.
#[async_trait]
pub trait IdTokenSource: Send + Sync {
    /// A valid id token for the signed-in user, refreshed if needed.
    async fn id_token(&self) -> Option<SecretString>;
}

/// Signed-in session state.
struct Session {
    identity: Identity,
    id_token: SecretString,
    refresh_token: SecretString,
    expires_at: Instant,
}

impl Session {
    fn needs_refresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: String,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OobRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

/// Successful sign-up/sign-in response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Identity Toolkit implementation of `IdentityProvider`.
pub struct FirebaseIdentityProvider {
    config: IdentityToolkitConfig,
    http_client: reqwest::Client,
    session: RwLock<Option<Session>>,
    listeners: ListenerHub<(), Option<Identity>>,
}

impl FirebaseIdentityProvider {
    pub fn new(config: IdentityToolkitConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
            session: RwLock::new(None),
            listeners: ListenerHub::new(),
        }
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> Result<R, AuthError>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = self.config.accounts_url(method);
        tracing::debug!("Calling Identity Toolkit {}", method);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.config.api_key.expose_secret().as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Identity Toolkit request failed: {}", e);
                AuthError::NetworkUnavailable(e.to_string())
            })?;

        read_response(response).await
    }

    fn start_session(&self, response: SignInResponse) -> Result<Identity, AuthError> {
        let uid = UserId::new(response.local_id)
            .map_err(|_| AuthError::rejected("Identity Toolkit returned a blank user id"))?;
        let mut identity = Identity::new(uid, response.email, response.display_name);
        identity.email_verified = response.email_verified.unwrap_or(false);

        let session = Session {
            identity: identity.clone(),
            id_token: SecretString::new(response.id_token),
            refresh_token: SecretString::new(response.refresh_token),
            expires_at: expiry(response.expires_in.as_deref()),
        };
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(session);
        tracing::info!(uid = %identity.uid, "Signed in");
        self.listeners.notify(|_| Some(Some(identity.clone())));
        Ok(identity)
    }

    async fn refresh(&self, refresh_token: SecretString) -> Result<SecretString, AuthError> {
        let response = self
            .http_client
            .post(self.config.refresh_url())
            .query(&[("key", self.config.api_key.expose_secret().as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret().as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::NetworkUnavailable(e.to_string()))?;
        let refreshed: RefreshResponse = read_response(response).await?;

        let id_token = SecretString::new(refreshed.id_token);
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = session.as_mut() {
            session.id_token = id_token.clone();
            session.refresh_token = SecretString::new(refreshed.refresh_token);
            session.expires_at = expiry(refreshed.expires_in.as_deref());
        }
        Ok(id_token)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| session.identity.clone())
    }

    fn listen(&self) -> Listener<Option<Identity>> {
        // Hold the session lock across registration so a concurrent sign-in
        // either lands in the initial value or is notified afterwards.
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        let current = session.as_ref().map(|session| session.identity.clone());
        self.listeners.register((), current)
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let response: SignInResponse = self
            .post(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        self.start_session(response)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let response: SignInResponse = self
            .post(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;
        self.start_session(response)
    }

    async fn sign_in_with_credential(
        &self,
        credential: &FederatedCredential,
    ) -> Result<Identity, AuthError> {
        let token = credential.id_token()?;
        let request = IdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                token,
                credential.provider.provider_id()
            ),
            request_uri: self.config.request_uri.clone(),
            return_idp_credential: true,
            return_secure_token: true,
        };
        let response: SignInResponse = self.post("signInWithIdp", &request).await?;
        self.start_session(response)
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError> {
        let _: serde_json::Value = self
            .post(
                "sendOobCode",
                &OobRequest {
                    request_type: "PASSWORD_RESET",
                    email,
                },
            )
            .await?;
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *session = None;
        tracing::info!("Signed out");
        self.listeners.notify(|_| Some(None));
        Ok(())
    }
}

#[async_trait]
impl IdTokenSource for FirebaseIdentityProvider {
    async fn id_token(&self) -> Option<SecretString> {
        let (token, refresh_token) = {
            let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
            let session = session.as_ref()?;
            if !session.needs_refresh() {
                return Some(session.id_token.clone());
            }
            (session.id_token.clone(), session.refresh_token.clone())
        };

        match self.refresh(refresh_token).await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::warn!("Id token refresh failed, using current token: {}", e);
                Some(token)
            }
        }
    }
}

async fn read_response<R: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<R, AuthError> {
    if response.status().is_success() {
        return response.json::<R>().await.map_err(|e| {
            tracing::error!("Failed to parse Identity Toolkit response: {}", e);
            AuthError::rejected(format!("Unexpected response: {}", e))
        });
    }

    let status = response.status();
    let message = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) => envelope.error.message,
        Err(_) => format!("HTTP {}", status),
    };
    tracing::warn!("Identity Toolkit rejected request: {}", message);
    Err(map_error_message(&message))
}

/// Maps an Identity Toolkit error message (e.g. `WEAK_PASSWORD : ...`) to `AuthError`.
pub(crate) fn map_error_message(message: &str) -> AuthError {
    let (code, detail) = match message.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (message.trim(), None),
    };

    match code {
        "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
        "INVALID_EMAIL" => AuthError::InvalidEmail,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_IDP_RESPONSE" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
        "USER_DISABLED" => AuthError::UserDisabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
        "WEAK_PASSWORD" => AuthError::WeakPassword(
            detail
                .unwrap_or("Password should be at least 6 characters")
                .to_string(),
        ),
        _ => AuthError::rejected(message),
    }
}

fn expiry(expires_in: Option<&str>) -> Instant {
    let seconds = expires_in
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(3600);
    Instant::now() + Duration::from_secs(seconds)
}
