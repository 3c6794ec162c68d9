//! Top-level content grouping shown on the home screen.

use serde::{Deserialize, Serialize};

use super::{ContentEntity, ContentStatus, CATEGORIES};

/// A category of topics (e.g. "Quran", "Seerah").
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    /// Document key; blank until persisted.
    #[serde(skip)]
    pub id: String,

    #[serde(rename = "title_ar")]
    pub title: String,

    #[serde(rename = "description_ar")]
    pub description: String,

    /// Display order, ascending.
    pub order: i32,

    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    pub status: ContentStatus,
}

impl Category {
    /// Creates an unsaved category.
    pub fn new(title: impl Into<String>, description: impl Into<String>, order: i32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            order,
            ..Self::default()
        }
    }
}

impl ContentEntity for Category {
    const COLLECTION: &'static str = CATEGORIES;
    const KIND: &'static str = "Category";

    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn order(&self) -> i32 {
        self.order
    }
}
