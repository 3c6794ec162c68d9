//! In-memory adapters for tests and offline development.

mod identity;
mod store;

pub use identity::InMemoryIdentityProvider;
pub use store::InMemoryDocumentStore;
