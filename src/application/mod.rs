//! Application layer - use cases over the ports.
//!
//! Each repository wraps one or two ports and turns their callbacks and
//! failures into typed result streams and `Result`s:
//!
//! - `AuthRepository` - session observation, sign-up, sign-in, password reset
//! - `ContentRepository` - category/topic/lesson observables and admin mutations
//! - `UserRepository` - the signed-in user's profile, provisioning, progress

mod auth;
mod content;
pub mod stream_ext;
mod user;

pub use auth::{AuthRepository, AuthStream};
pub use content::{ContentRepository, ContentStream};
pub use user::UserRepository;
