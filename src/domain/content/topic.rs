//! Topics group lessons inside a category.

use serde::{Deserialize, Serialize};

use super::{ContentEntity, ParentRef, CATEGORIES, TOPICS};

/// Field holding the parent category id.
pub const CATEGORY_ID_FIELD: &str = "categoryId";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Topic {
    #[serde(skip)]
    pub id: String,

    #[serde(rename = "categoryId")]
    pub category_id: String,

    #[serde(rename = "title_ar")]
    pub title: String,

    #[serde(rename = "description_ar")]
    pub description: String,

    pub order: i32,

    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Topic {
    /// Creates an unsaved topic under `category_id`.
    pub fn new(category_id: impl Into<String>, title: impl Into<String>, order: i32) -> Self {
        Self {
            category_id: category_id.into(),
            title: title.into(),
            order,
            ..Self::default()
        }
    }
}

impl ContentEntity for Topic {
    const COLLECTION: &'static str = TOPICS;
    const KIND: &'static str = "Topic";

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

    fn parent(&self) -> Option<ParentRef<'_>> {
        Some(ParentRef {
            field: CATEGORY_ID_FIELD,
            collection: CATEGORIES,
            id: &self.category_id,
        })
    }
}
