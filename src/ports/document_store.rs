//! Document store port - the real-time document database.
//!
//! Schemaless documents live in top-level collections and are addressed by
//! `collection/id`. Queries support equality filters and ordering on one
//! field; listeners push a fresh snapshot on every change.
//!
//! Consistency and ordering of listener updates are whatever the backing
//! service provides. Callers must not assume more than "eventually the
//! latest snapshot arrives".

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::Listener;
use crate::domain::foundation::{DocumentId, DomainError, ErrorCode};

/// Body of a document.
pub type Fields = Map<String, Value>;

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Address of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    pub collection: String,
    pub id: DocumentId,
}

impl DocumentPath {
    pub fn new(collection: impl Into<String>, id: DocumentId) -> Self {
        Self {
            collection: collection.into(),
            id,
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Sort direction of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Equality filter on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query.
///
/// ```
/// use masarat_core::ports::{Direction, Query};
///
/// let query = Query::collection("topics")
///     .where_eq("categoryId", "cat-1")
///     .order_by("order", Direction::Ascending);
/// assert_eq!(query.filters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// Matches every document of a collection.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// True when the document satisfies every filter.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters
            .iter()
            .all(|filter| document.get(&filter.field) == Some(&filter.value))
    }

    /// Sorts documents by the query's ordering; ties keep id order.
    pub fn sort(&self, documents: &mut [Document]) {
        documents.sort_by(|a, b| {
            let by_field = match &self.order_by {
                Some(order) => {
                    let cmp = compare_values(a.get(&order.field), b.get(&order.field));
                    match order.direction {
                        Direction::Ascending => cmp,
                        Direction::Descending => cmp.reverse(),
                    }
                }
                None => Ordering::Equal,
            };
            by_field.then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Filters and sorts an unordered set of documents.
    pub fn apply<'a>(&self, documents: impl IntoIterator<Item = &'a Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = documents
            .into_iter()
            .filter(|doc| self.matches(doc))
            .cloned()
            .collect();
        self.sort(&mut matched);
        matched
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Orders field values the way the database does: by type, then by value.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Failures reported by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal store error: {0}")]
    Internal(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::NotFound(_) => ErrorCode::DocumentNotFound,
            StoreError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            StoreError::Unavailable(_) => ErrorCode::ServiceUnavailable,
            StoreError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            StoreError::Internal(_) => ErrorCode::InternalError,
        };
        DomainError::new(code, err.to_string())
    }
}

/// Snapshot pushed to a query listener.
pub type QuerySnapshot = Result<Vec<Document>, StoreError>;

/// Snapshot pushed to a document listener; `Ok(None)` means absent.
pub type DocumentSnapshot = Result<Option<Document>, StoreError>;

/// Real-time document database.
///
/// # Contract
///
/// Implementations must:
/// - Assign a fresh, non-blank key on `add`
/// - Fail `update` with `StoreError::NotFound` when the document is absent
/// - Push the current snapshot to a new listener immediately, then again
///   after every change affecting it
/// - Keep a listener registered until its [`Listener`] is dropped, pushing
///   errors as items rather than closing the stream
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document; `Ok(None)` when absent.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Creates a document with a server-generated key and returns the key.
    async fn add(&self, collection: &str, fields: Fields) -> Result<DocumentId, StoreError>;

    /// Creates or replaces a document.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Merges fields into an existing document.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), StoreError>;

    /// Deletes a document. Deleting an absent document succeeds.
    async fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// Subscribes to the results of a query.
    fn listen_query(&self, query: Query) -> Listener<QuerySnapshot>;

    /// Subscribes to one document.
    fn listen_document(&self, path: DocumentPath) -> Listener<DocumentSnapshot>;
}
