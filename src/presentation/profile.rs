//! Profile screen: the signed-in user's profile and progress.

use futures::StreamExt;
use tokio::sync::watch;

use super::driver::StateDriver;
use super::state::ProfileState;
use crate::application::UserRepository;

pub struct ProfileViewModel {
    state: watch::Receiver<ProfileState>,
    driver: StateDriver,
}

impl ProfileViewModel {
    pub fn new(users: &UserRepository) -> Self {
        let (sink, state) = watch::channel(ProfileState::Loading);
        let states = users
            .observe_current_user()
            .map(|profile| match profile {
                Some(profile) => ProfileState::Loaded(profile),
                None => ProfileState::SignedOut,
            })
            .boxed();
        Self {
            state,
            driver: StateDriver::spawn("profile", states, sink),
        }
    }

    pub fn state(&self) -> ProfileState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.state.clone()
    }

    pub async fn shutdown(mut self) {
        self.driver.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
    use crate::application::AuthRepository;
    use crate::ports::{DocumentStore, IdentityProvider};
    use std::sync::Arc;

    #[tokio::test]
    async fn shows_signed_out_then_loaded_profile() {
        let provider = Arc::new(InMemoryIdentityProvider::new().with_account("omar@example.com", "secret-1"));
        let store = Arc::new(InMemoryDocumentStore::new());
        let auth = AuthRepository::new(Arc::clone(&provider) as Arc<dyn IdentityProvider>);
        let users = UserRepository::new(auth, Arc::clone(&store) as Arc<dyn DocumentStore>);

        let vm = ProfileViewModel::new(&users);
        let mut view = vm.subscribe();
        view.wait_for(|s| *s == ProfileState::SignedOut).await.unwrap();

        let identity = provider.sign_in_with_password("omar@example.com", "secret-1").await.unwrap();
        users.ensure_profile_exists(&identity).await.unwrap();

        let state = view
            .wait_for(|s| matches!(s, ProfileState::Loaded(_)))
            .await
            .unwrap()
            .clone();
        match state {
            ProfileState::Loaded(profile) => assert_eq!(profile.display_name.as_deref(), Some("Omar")),
            other => panic!("unexpected state {:?}", other),
        }

        vm.shutdown().await;
        assert_eq!(store.listener_count(), 0);
        assert_eq!(provider.listener_count(), 0);
    }
}
