//! Lessons and the content blocks they are made of.

use serde::{Deserialize, Serialize};

use super::{ContentEntity, ContentStatus, ParentRef, LESSONS, TOPICS};

/// Field holding the parent topic id.
pub const TOPIC_ID_FIELD: &str = "topicId";
/// Field holding the publishing status.
pub const STATUS_FIELD: &str = "status";
/// XP granted for a lesson that does not specify one.
pub const DEFAULT_XP_AWARD: u32 = 10;

/// Kind of a content block, stored as a lowercase string under `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[default]
    Text,
    Image,
    Header,
    Quote,
    Reference,
}

/// One piece of lesson content. Blocks have no identity of their own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(rename = "value_ar")]
    pub value: String,

    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Position within the lesson, ascending.
    pub order: i32,
}

impl ContentBlock {
    pub fn new(kind: BlockKind, value: impl Into<String>, order: i32) -> Self {
        Self {
            kind,
            value: value.into(),
            image_url: None,
            order,
        }
    }

    pub fn image(url: impl Into<String>, order: i32) -> Self {
        Self {
            kind: BlockKind::Image,
            value: String::new(),
            image_url: Some(url.into()),
            order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lesson {
    #[serde(skip)]
    pub id: String,

    #[serde(rename = "topicId")]
    pub topic_id: String,

    #[serde(rename = "title_ar")]
    pub title: String,

    pub order: i32,

    #[serde(rename = "contentBlocks")]
    pub content_blocks: Vec<ContentBlock>,

    #[serde(rename = "xpAward")]
    pub xp_award: u32,

    #[serde(rename = "quizId", skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,

    pub status: ContentStatus,
}

impl Default for Lesson {
    fn default() -> Self {
        Self {
            id: String::new(),
            topic_id: String::new(),
            title: String::new(),
            order: 0,
            content_blocks: Vec::new(),
            xp_award: DEFAULT_XP_AWARD,
            quiz_id: None,
            status: ContentStatus::Published,
        }
    }
}

impl Lesson {
    /// Creates an unsaved, published lesson under `topic_id`.
    pub fn new(topic_id: impl Into<String>, title: impl Into<String>, order: i32) -> Self {
        Self {
            topic_id: topic_id.into(),
            title: title.into(),
            order,
            ..Self::default()
        }
    }

    pub fn with_blocks(mut self, blocks: Vec<ContentBlock>) -> Self {
        self.content_blocks = blocks;
        self.normalize()
    }

    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_published(&self) -> bool {
        self.status.is_published()
    }
}

impl ContentEntity for Lesson {
    const COLLECTION: &'static str = LESSONS;
    const KIND: &'static str = "Lesson";

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
            field: TOPIC_ID_FIELD,
            collection: TOPICS,
            id: &self.topic_id,
        })
    }

    /// Blocks are kept in display order.
    fn normalize(mut self) -> Self {
        self.content_blocks.sort_by_key(|block| block.order);
        self
    }
}
