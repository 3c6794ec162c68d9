//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Key of a persisted document.
///
/// Document keys are assigned by the database on creation. A `DocumentId`
/// can only hold a non-blank key, so any operation that takes one is
/// guaranteed to address a concrete document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Parses a document key, rejecting blank input for the named field.
    pub fn parse(field: &str, id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field(field));
        }
        if trimmed.contains('/') {
            return Err(ValidationError::invalid_format(field, "must not contain '/'"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Creates a DocumentId, returning error if blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        Self::parse("id", id)
    }

    /// Generates a fresh random key, the way the database does on `add`.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// User identifier (the identity provider's subject id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("uid"));
        }
        Ok(Self(id))
    }

    /// Generates a fresh random subject id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key of this user's profile document.
    pub fn document_id(&self) -> DocumentId {
        DocumentId(self.0.clone())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
