//! In-memory document store.
//!
//! Implements the `DocumentStore` port over a map of collections. Query
//! and document listeners are notified synchronously, inside the mutation
//! that changed them, which makes listener behaviour deterministic in
//! tests.
//!
//! Like the hosted database, a query listener is only sent a new snapshot
//! when its result set actually changed.
//!
//! # Example
//!
//! ```
//! use masarat_core::adapters::memory::InMemoryDocumentStore;
//! use masarat_core::ports::{DocumentStore, Query};
//! use serde_json::json;
//!
//! let store = InMemoryDocumentStore::new();
//! store.seed("categories", "c1", json!({"title_ar": "العقيدة", "order": 1}));
//!
//! assert_eq!(store.count("categories"), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::adapters::listener_hub::ListenerHub;
use crate::domain::foundation::DocumentId;
use crate::ports::{
    Document, DocumentPath, DocumentSnapshot, DocumentStore, Fields, Listener, Query,
    QuerySnapshot, StoreError,
};

type Collection = BTreeMap<String, Fields>;

/// A query listener and the result it was last sent.
struct QueryWatch {
    query: Query,
    last: Option<Vec<Document>>,
}

/// In-memory `DocumentStore`.
///
/// Lock order is data first, then listener hubs.
pub struct InMemoryDocumentStore {
    collections: Mutex<HashMap<String, Collection>>,
    queries: ListenerHub<QueryWatch, QuerySnapshot>,
    documents: ListenerHub<DocumentPath, DocumentSnapshot>,
    force_error: RwLock<Option<StoreError>>,
    calls: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            queries: ListenerHub::new(),
            documents: ListenerHub::new(),
            force_error: RwLock::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    // === Test Helpers ===

    /// Writes a document directly, notifying listeners.
    ///
    /// Non-object values are stored as empty documents.
    pub fn seed(&self, collection: &str, id: &str, body: Value) {
        let fields = match body {
            Value::Object(fields) => fields,
            _ => Fields::new(),
        };
        let mut data = self.data();
        data.entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        self.notify(&data, collection, id);
    }

    /// Reads a document's fields directly.
    pub fn fields(&self, collection: &str, id: &str) -> Option<Fields> {
        self.data()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.data().get(collection).map_or(0, BTreeMap::len)
    }

    /// Makes every subsequent read and mutation fail with `error`.
    pub fn fail_with(&self, error: StoreError) {
        *self
            .force_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    pub fn clear_error(&self) {
        *self
            .force_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Pushes `error` to every listener on `collection`.
    ///
    /// Listeners stay registered; a later change delivers a fresh snapshot.
    pub fn push_listener_error(&self, collection: &str, error: StoreError) {
        let _data = self.data();
        self.queries.notify(|watch| {
            if watch.query.collection != collection {
                return None;
            }
            watch.last = None;
            Some(Err(error.clone()))
        });
        self.documents
            .notify(|path| (path.collection == collection).then(|| Err(error.clone())));
    }

    /// Number of query and document listeners still registered.
    pub fn listener_count(&self) -> usize {
        self.queries.len() + self.documents.len()
    }

    /// Number of reads and mutations that reached the store.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn data(&self) -> MutexGuard<'_, HashMap<String, Collection>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_call(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self
            .force_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Sends fresh snapshots to listeners affected by a change to `collection/id`.
    fn notify(&self, data: &HashMap<String, Collection>, collection: &str, id: &str) {
        let docs = data.get(collection);

        self.queries.notify(|watch| {
            if watch.query.collection != collection {
                return None;
            }
            let result = run_query(docs, &watch.query);
            if watch.last.as_ref() == Some(&result) {
                return None;
            }
            watch.last = Some(result.clone());
            Some(Ok(result))
        });

        let current = docs
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone()));
        self.documents.notify(|path| {
            (path.collection == collection && path.id.as_str() == id)
                .then(|| Ok(current.clone()))
        });
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn run_query(docs: Option<&Collection>, query: &Query) -> Vec<Document> {
    let all: Vec<Document> = docs
        .into_iter()
        .flat_map(|docs| docs.iter())
        .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
        .collect();
    query.apply(&all)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.begin_call()?;
        Ok(self
            .fields(&path.collection, path.id.as_str())
            .map(|fields| Document::new(path.id.as_str(), fields)))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError> {
        self.begin_call()?;
        let id = DocumentId::generate();
        let mut data = self.data();
        data.entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        self.notify(&data, collection, id.as_str());
        Ok(id)
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.begin_call()?;
        let mut data = self.data();
        data.entry(path.collection.clone())
            .or_default()
            .insert(path.id.to_string(), fields);
        self.notify(&data, &path.collection, path.id.as_str());
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError> {
        self.begin_call()?;
        let mut data = self.data();
        let existing = data
            .get_mut(&path.collection)
            .and_then(|docs| docs.get_mut(path.id.as_str()))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        existing.extend(fields);
        self.notify(&data, &path.collection, path.id.as_str());
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.begin_call()?;
        let mut data = self.data();
        let removed = data
            .get_mut(&path.collection)
            .and_then(|docs| docs.remove(path.id.as_str()));
        if removed.is_some() {
            self.notify(&data, &path.collection, path.id.as_str());
        }
        Ok(())
    }

    fn listen_query(&self, query: Query) -> Listener<QuerySnapshot> {
        let data = self.data();
        let result = run_query(data.get(&query.collection), &query);
        let watch = QueryWatch {
            query,
            last: Some(result.clone()),
        };
        self.queries.register(watch, Ok(result))
    }

    fn listen_document(&self, path: DocumentPath) -> Listener<DocumentSnapshot> {
        let data = self.data();
        let current = data
            .get(&path.collection)
            .and_then(|docs| docs.get(path.id.as_str()))
            .map(|fields| Document::new(path.id.as_str(), fields.clone()));
        self.documents.register(path, Ok(current))
    }
}
