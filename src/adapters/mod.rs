//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to the managed services:
//! - `firebase` - Identity Toolkit and Firestore over REST
//! - `memory` - In-process implementations for tests and offline use

pub mod firebase;
mod listener_hub;
pub mod memory;

pub use firebase::{FirebaseIdentityProvider, FirestoreDocumentStore};
pub use memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
