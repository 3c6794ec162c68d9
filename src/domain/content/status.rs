//! Publishing status of content documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a content document is visible to learners.
///
/// Stored as the literal strings `"PUBLISHED"` and `"DRAFT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    #[default]
    Published,
    Draft,
}

impl ContentStatus {
    /// Wire representation used in queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Published => "PUBLISHED",
            ContentStatus::Draft => "DRAFT",
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_upper_case_literals() {
        assert_eq!(serde_json::to_string(&ContentStatus::Published).unwrap(), "\"PUBLISHED\"");
        assert_eq!(serde_json::to_string(&ContentStatus::Draft).unwrap(), "\"DRAFT\"");
    }

    #[test]
    fn rejects_unknown_literals() {
        assert!(serde_json::from_str::<ContentStatus>("\"ARCHIVED\"").is_err());
    }

    #[test]
    fn defaults_to_published() {
        assert!(ContentStatus::default().is_published());
    }
}
