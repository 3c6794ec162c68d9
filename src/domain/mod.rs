//! Domain layer containing the records and value types of the app.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, identity, errors)
//! - `content` - Categories, topics, lessons and content blocks
//! - `user` - Learner profiles and progress
//! - `results` - Result unions emitted by the application layer

pub mod content;
pub mod foundation;
pub mod results;
pub mod user;

pub use results::{AuthResult, ContentResult};
