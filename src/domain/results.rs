//! Tagged-union results emitted by the application layer.

use super::foundation::{AuthError, DomainError, Identity};

/// One emission of a content subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentResult<T> {
    /// Emitted exactly once, immediately on subscription.
    Loading,
    Success(T),
    /// The addressed document does not exist. Only single-document
    /// subscriptions emit this.
    NotFound,
    Error(DomainError),
}

impl<T> ContentResult<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ContentResult::Loading)
    }

    /// Maps the success payload, keeping every other state.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ContentResult<U> {
        match self {
            ContentResult::Loading => ContentResult::Loading,
            ContentResult::Success(data) => ContentResult::Success(f(data)),
            ContentResult::NotFound => ContentResult::NotFound,
            ContentResult::Error(err) => ContentResult::Error(err),
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            ContentResult::Success(data) => Some(data),
            _ => None,
        }
    }
}

/// One emission of a sign-up / sign-in operation.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    Loading,
    Success(Identity),
    Error(AuthError),
}

impl AuthResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AuthResult::Loading)
    }
}
