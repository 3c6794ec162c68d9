//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the two managed services it talks to. Adapters
//! implement these ports.
//!
//! - `IdentityProvider` - Sign-up, sign-in, password reset, auth-state changes
//! - `DocumentStore` - Real-time document database (queries, listeners, mutations)
//! - `Listener` / `ListenerRegistration` - Explicit subscription handles shared by both

mod document_store;
mod identity_provider;
mod listener;

pub use document_store::{
    Direction, Document, DocumentPath, DocumentSnapshot, DocumentStore, FieldFilter, Fields,
    OrderBy, Query, QuerySnapshot, StoreError,
};
pub use identity_provider::IdentityProvider;
pub use listener::{Listener, ListenerRegistration};
