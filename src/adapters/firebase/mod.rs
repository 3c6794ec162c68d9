//! Firebase adapters over the public REST APIs.
//!
//! - `FirebaseIdentityProvider` - Identity Toolkit (email/password, Google, password reset)
//! - `FirestoreDocumentStore` - Cloud Firestore documents and polling listeners

pub mod codec;
mod firestore;
mod identity;

pub use firestore::{FirestoreConfig, FirestoreDocumentStore, DEFAULT_FIRESTORE_URL};
pub use identity::{
    FirebaseIdentityProvider, IdTokenSource, IdentityToolkitConfig, DEFAULT_IDENTITY_TOOLKIT_URL,
    DEFAULT_SECURE_TOKEN_URL,
};
