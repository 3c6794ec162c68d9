//! User module - learner profiles and progress tracking.
//!
//! A profile document is keyed by the identity provider's uid. It is
//! provisioned on first sign-in and then only mutated by progress updates
//! (XP, streak) and display-name edits.

pub mod profile;

pub use profile::{
    default_display_name, next_streak, Role, UserProfile, FALLBACK_DISPLAY_NAME, UNKNOWN_EMAIL,
};

/// Collection holding [`UserProfile`] documents.
pub const USERS: &str = "users";
