//! Screen states published by the view models.

use crate::domain::user::UserProfile;

/// State of a screen showing a collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListState<T> {
    /// Nothing requested yet, e.g. no scope id.
    #[default]
    Idle,
    Loading,
    /// At least one item.
    Success(Vec<T>),
    /// The query succeeded with no items.
    Empty,
    Error(String),
}

impl<T> ListState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ListState::Loading)
    }

    /// Items currently shown; empty unless `Success`.
    pub fn items(&self) -> &[T] {
        match self {
            ListState::Success(items) => items,
            _ => &[],
        }
    }
}

/// State of a screen showing one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    NotFound,
    Error(String),
}

/// State of the sign-in / sign-up screens.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthUiState {
    #[default]
    Idle,
    Loading,
    /// Input rejected before contacting the provider.
    InvalidField { field: String, message: String },
    Error(String),
    NavigateToMain,
    NavigateToLogin,
    NavigateToAuth,
    PasswordResetEmailSent,
}

impl AuthUiState {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        AuthUiState::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Outcome of an admin save or delete.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormEvent {
    #[default]
    Idle,
    Loading,
    Saved,
    Deleted,
    Error(String),
}

/// State of the profile screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProfileState {
    #[default]
    Loading,
    SignedOut,
    Loaded(UserProfile),
}

/// Where the splash screen hands off to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplashDestination {
    Auth,
    Main,
}
