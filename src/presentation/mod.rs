//! Presentation layer: screen states and the view models that publish them.
//!
//! View models own one background task each and publish through
//! `tokio::sync::watch`. Call `shutdown()` when the screen goes away to
//! release its store listeners.

pub mod admin;
pub mod auth;
mod driver;
pub mod lists;
pub mod profile;
pub mod reducers;
pub mod splash;
pub mod state;

pub use admin::{
    AdminCategoriesViewModel, AdminContentViewModel, AdminLessonsViewModel, AdminTopicsViewModel,
};
pub use auth::AuthViewModel;
pub use lists::{CategoryListViewModel, LessonListViewModel, ScopedListViewModel, TopicListViewModel};
pub use profile::ProfileViewModel;
pub use splash::SplashGate;
pub use state::{AuthUiState, DetailState, FormEvent, ListState, ProfileState, SplashDestination};
