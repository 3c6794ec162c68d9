//! Composition root: wires adapters into repositories and view models.

use std::sync::Arc;

use thiserror::Error;

use crate::adapters::firebase::{FirebaseIdentityProvider, FirestoreDocumentStore, IdTokenSource};
use crate::application::{AuthRepository, ContentRepository, UserRepository};
use crate::config::{AppConfig, SplashConfig, ValidationError};
use crate::domain::content::ContentEntity;
use crate::ports::{DocumentStore, IdentityProvider};
use crate::presentation::{
    AdminContentViewModel, AuthViewModel, CategoryListViewModel, LessonListViewModel,
    ProfileViewModel, SplashGate, TopicListViewModel,
};

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Repositories shared by every screen, plus factories for view models.
///
/// View model factories spawn tasks and must be called within a tokio
/// runtime.
#[derive(Clone)]
pub struct AppContainer {
    pub auth: AuthRepository,
    pub content: ContentRepository,
    pub users: UserRepository,
    splash: SplashConfig,
}

impl AppContainer {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let auth = AuthRepository::new(identity);
        let users = UserRepository::new(auth.clone(), Arc::clone(&store));
        Self {
            auth,
            content: ContentRepository::new(store),
            users,
            splash: SplashConfig::default(),
        }
    }

    /// Builds the Firebase REST adapters from validated configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ContainerError> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.firebase.request_timeout())
            .build()?;

        let identity = Arc::new(FirebaseIdentityProvider::new(
            config.firebase.identity_toolkit(),
            http_client.clone(),
        ));
        let store = Arc::new(FirestoreDocumentStore::new(
            config.firebase.firestore(&config.sync),
            http_client,
            Arc::clone(&identity) as Arc<dyn IdTokenSource>,
        ));

        tracing::info!(
            project_id = %config.firebase.project_id,
            environment = ?config.app.environment,
            "Firebase adapters ready"
        );

        Ok(Self::new(identity, store).with_splash(config.splash.clone()))
    }

    pub fn with_splash(mut self, splash: SplashConfig) -> Self {
        self.splash = splash;
        self
    }

    pub fn splash_gate(&self) -> SplashGate {
        SplashGate::new(self.auth.clone())
            .with_delays(self.splash.signed_out_delay(), self.splash.signed_in_delay())
    }

    pub fn auth_view_model(&self) -> AuthViewModel {
        AuthViewModel::new(self.auth.clone(), self.users.clone())
    }

    pub fn category_list(&self) -> CategoryListViewModel {
        CategoryListViewModel::new(&self.content)
    }

    pub fn topic_list(&self, category_id: &str) -> TopicListViewModel {
        TopicListViewModel::new(&self.content, category_id)
    }

    pub fn lesson_list(&self, topic_id: &str) -> LessonListViewModel {
        LessonListViewModel::new(&self.content, topic_id)
    }

    pub fn profile(&self) -> ProfileViewModel {
        ProfileViewModel::new(&self.users)
    }

    pub fn admin<E: ContentEntity>(&self) -> AdminContentViewModel<E> {
        AdminContentViewModel::new(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
    use crate::config::{AppSettings, Environment, FirebaseConfig, SyncConfig};
    use crate::presentation::SplashDestination;
    use secrecy::SecretString;
    use std::time::Duration;

    fn firebase() -> FirebaseConfig {
        FirebaseConfig {
            api_key: SecretString::new("AIza-test".to_string()),
            project_id: "masarat-al-nur".to_string(),
            auth_emulator_host: None,
            firestore_emulator_host: None,
            identity_toolkit_url: None,
            secure_token_url: None,
            firestore_url: None,
            request_timeout_secs: 30,
        }
    }

    #[test]
    fn from_config_rejects_invalid_configuration() {
        let config = AppConfig {
            app: AppSettings {
                environment: Environment::Production,
                ..Default::default()
            },
            firebase: FirebaseConfig {
                auth_emulator_host: Some("localhost:9099".to_string()),
                ..firebase()
            },
            sync: SyncConfig::default(),
            splash: SplashConfig::default(),
        };

        let result = AppContainer::from_config(&config);

        assert!(matches!(
            result,
            Err(ContainerError::Config(ValidationError::EmulatorInProduction))
        ));
    }

    #[test]
    fn from_config_builds_without_network_access() {
        let config = AppConfig {
            app: AppSettings::default(),
            firebase: firebase(),
            sync: SyncConfig::default(),
            splash: SplashConfig::default(),
        };

        let container = AppContainer::from_config(&config).unwrap();

        assert!(container.auth.current_identity().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn splash_uses_configured_delays() {
        let container = AppContainer::new(
            Arc::new(InMemoryIdentityProvider::new()),
            Arc::new(InMemoryDocumentStore::new()),
        )
        .with_splash(SplashConfig {
            signed_out_delay_ms: 20,
            signed_in_delay_ms: 10,
        });
        let started = tokio::time::Instant::now();

        let destination = container.splash_gate().decide().await;

        assert_eq!(destination, SplashDestination::Auth);
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
