//! Learning content: categories -> topics -> lessons.
//!
//! All records are owned by the remote database. The client only holds
//! read replicas obtained through subscriptions, plus the admin mutations.

mod category;
mod entity;
mod lesson;
mod status;
mod topic;

pub use category::Category;
pub use entity::{ContentEntity, ParentKey, ParentRef};
pub use lesson::{BlockKind, ContentBlock, Lesson, DEFAULT_XP_AWARD, STATUS_FIELD, TOPIC_ID_FIELD};
pub use status::ContentStatus;
pub use topic::{Topic, CATEGORY_ID_FIELD};

/// Collection holding [`Category`] documents.
pub const CATEGORIES: &str = "categories";
/// Collection holding [`Topic`] documents.
pub const TOPICS: &str = "topics";
/// Collection holding [`Lesson`] documents.
pub const LESSONS: &str = "lessons";
/// Numeric field every content collection is ordered by.
pub const ORDER_FIELD: &str = "order";
