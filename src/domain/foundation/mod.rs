//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, authentication types and error types
//! that form the vocabulary of the Masarat domain.

mod auth;
mod errors;
mod ids;

pub use auth::{AuthError, FederatedCredential, FederatedProvider, Identity};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{DocumentId, UserId};
