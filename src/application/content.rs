//! Content use cases: observing and editing categories, topics and lessons.
//!
//! Every observable returned here follows the same shape:
//!
//! 1. `Loading` is emitted on the first poll, before anything else
//! 2. The store listener is registered on the next poll, not before
//! 3. Each snapshot becomes `Success`, or `Error` if it cannot be read
//! 4. Listener errors become `Error` items; the stream keeps going
//! 5. Dropping the stream removes the store listener
//!
//! Scoped observables given a blank scope id emit `Loading`, then `Error`,
//! and end without registering anything.

use std::sync::Arc;

use futures::future::{self, ready};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde_json::Value;

use crate::domain::content::{
    Category, ContentEntity, ContentStatus, Lesson, ParentKey, Topic, CATEGORIES,
    CATEGORY_ID_FIELD, LESSONS, ORDER_FIELD, STATUS_FIELD, TOPICS, TOPIC_ID_FIELD,
};
use crate::domain::foundation::{DocumentId, DomainError, ErrorCode, ValidationError};
use crate::domain::ContentResult;
use crate::ports::{Direction, Document, DocumentPath, DocumentStore, Fields, Query};

/// Stream of results for one content observable.
pub type ContentStream<T> = BoxStream<'static, ContentResult<T>>;

/// Read and write access to the learning content collections.
#[derive(Clone)]
pub struct ContentRepository {
    store: Arc<dyn DocumentStore>,
}

impl ContentRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // === Observables ===

    /// All categories, ordered by `order`.
    pub fn observe_categories(&self) -> ContentStream<Vec<Category>> {
        self.observe_list(ordered(CATEGORIES))
    }

    /// Topics of one category, ordered by `order`.
    pub fn observe_topics_for_category(&self, category_id: &str) -> ContentStream<Vec<Topic>> {
        match DocumentId::parse(CATEGORY_ID_FIELD, category_id) {
            Ok(id) => self.observe_list(ordered(TOPICS).where_eq(CATEGORY_ID_FIELD, id.as_str())),
            Err(e) => invalid_scope(e),
        }
    }

    /// Every topic regardless of category, for the admin screens.
    pub fn observe_all_topics(&self) -> ContentStream<Vec<Topic>> {
        self.observe_list(ordered(TOPICS))
    }

    /// Published lessons of one topic, ordered by `order`.
    pub fn observe_lessons_for_topic(&self, topic_id: &str) -> ContentStream<Vec<Lesson>> {
        match DocumentId::parse(TOPIC_ID_FIELD, topic_id) {
            Ok(id) => self.observe_list(
                ordered(LESSONS)
                    .where_eq(TOPIC_ID_FIELD, id.as_str())
                    .where_eq(STATUS_FIELD, ContentStatus::Published.as_str()),
            ),
            Err(e) => invalid_scope(e),
        }
    }

    /// Every lesson in any status, for the admin screens.
    pub fn observe_all_lessons(&self) -> ContentStream<Vec<Lesson>> {
        self.observe_list(ordered(LESSONS))
    }

    /// Every record of `E`'s collection, ordered by `order`.
    pub fn observe_all<E: ContentEntity>(&self) -> ContentStream<Vec<E>> {
        self.observe_list(ordered(E::COLLECTION))
    }

    pub fn observe_category(&self, id: &str) -> ContentStream<Category> {
        self.observe_one(id)
    }

    pub fn observe_topic(&self, id: &str) -> ContentStream<Topic> {
        self.observe_one(id)
    }

    pub fn observe_lesson(&self, id: &str) -> ContentStream<Lesson> {
        self.observe_one(id)
    }

    /// Observes the results of a query over `E`'s collection.
    pub fn observe_list<E: ContentEntity>(&self, query: Query) -> ContentStream<Vec<E>> {
        let store = Arc::clone(&self.store);
        let listener = stream::once(future::lazy(move |_| {
            tracing::debug!(collection = %query.collection, "Content listener registered");
            store.listen_query(query)
        }))
        .flatten();

        stream::once(ready(ContentResult::Loading))
            .chain(listener.map(|snapshot| match snapshot {
                Ok(documents) => match decode_all::<E>(documents) {
                    Ok(items) => ContentResult::Success(items),
                    Err(e) => ContentResult::Error(e),
                },
                Err(e) => {
                    tracing::warn!(collection = E::COLLECTION, "Content listener failed: {}", e);
                    ContentResult::Error(e.into())
                }
            }))
            .boxed()
    }

    /// Observes one document of `E`'s collection; absence is `NotFound`.
    pub fn observe_one<E: ContentEntity>(&self, id: &str) -> ContentStream<E> {
        let id = match DocumentId::new(id) {
            Ok(id) => id,
            Err(e) => return invalid_scope(e),
        };
        let store = Arc::clone(&self.store);
        let path = DocumentPath::new(E::COLLECTION, id);
        let listener = stream::once(future::lazy(move |_| {
            tracing::debug!(%path, "Content listener registered");
            store.listen_document(path)
        }))
        .flatten();

        stream::once(ready(ContentResult::Loading))
            .chain(listener.map(|snapshot| match snapshot {
                Ok(Some(document)) => match decode::<E>(document) {
                    Ok(entity) => ContentResult::Success(entity),
                    Err(e) => ContentResult::Error(e),
                },
                Ok(None) => ContentResult::NotFound,
                Err(e) => {
                    tracing::warn!(collection = E::COLLECTION, "Content listener failed: {}", e);
                    ContentResult::Error(e.into())
                }
            }))
            .boxed()
    }

    // === Mutations ===

    /// Creates `entity` and returns its server-generated id.
    ///
    /// The entity's id must be blank. For topics and lessons the parent
    /// document must exist.
    pub async fn add<E: ContentEntity>(&self, entity: &E) -> Result<DocumentId, DomainError> {
        let parent = entity.validate_for_create()?;
        if let Some(parent) = parent {
            self.require_parent(&parent).await?;
        }

        let id = self.store.add(E::COLLECTION, encode(entity)?).await?;
        tracing::info!(collection = E::COLLECTION, %id, "{} created", E::KIND);
        Ok(id)
    }

    /// Replaces the stored document with `entity`.
    pub async fn update<E: ContentEntity>(&self, entity: &E) -> Result<(), DomainError> {
        let (id, parent) = entity.validate_for_update()?;
        if let Some(parent) = parent {
            self.require_parent(&parent).await?;
        }

        let path = DocumentPath::new(E::COLLECTION, id);
        self.store.set(&path, encode(entity)?).await?;
        tracing::info!(%path, "{} updated", E::KIND);
        Ok(())
    }

    /// Deletes the document with `id`. Blank ids fail before any store call.
    pub async fn delete<E: ContentEntity>(&self, id: &str) -> Result<(), DomainError> {
        let path = DocumentPath::new(E::COLLECTION, DocumentId::new(id)?);
        self.store.delete(&path).await?;
        tracing::info!(%path, "{} deleted", E::KIND);
        Ok(())
    }

    /// Adds `entity` when its id is blank, otherwise updates it.
    pub async fn save<E: ContentEntity>(&self, entity: &E) -> Result<DocumentId, DomainError> {
        if entity.id().trim().is_empty() {
            self.add(entity).await
        } else {
            self.update(entity).await?;
            Ok(DocumentId::new(entity.id())?)
        }
    }

    pub async fn add_category(&self, category: &Category) -> Result<DocumentId, DomainError> {
        self.add(category).await
    }

    pub async fn update_category(&self, category: &Category) -> Result<(), DomainError> {
        self.update(category).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), DomainError> {
        self.delete::<Category>(id).await
    }

    pub async fn add_topic(&self, topic: &Topic) -> Result<DocumentId, DomainError> {
        self.add(topic).await
    }

    pub async fn update_topic(&self, topic: &Topic) -> Result<(), DomainError> {
        self.update(topic).await
    }

    pub async fn delete_topic(&self, id: &str) -> Result<(), DomainError> {
        self.delete::<Topic>(id).await
    }

    pub async fn add_lesson(&self, lesson: &Lesson) -> Result<DocumentId, DomainError> {
        self.add(lesson).await
    }

    pub async fn update_lesson(&self, lesson: &Lesson) -> Result<(), DomainError> {
        self.update(lesson).await
    }

    pub async fn delete_lesson(&self, id: &str) -> Result<(), DomainError> {
        self.delete::<Lesson>(id).await
    }

    async fn require_parent(&self, parent: &ParentKey) -> Result<(), DomainError> {
        let path = DocumentPath::new(parent.collection, parent.id.clone());
        match self.store.get(&path).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::new(
                ErrorCode::ParentNotFound,
                format!("Parent document {} does not exist", path),
            )
            .with_detail("collection", parent.collection)
            .with_detail("id", parent.id.as_str())),
        }
    }
}

fn ordered(collection: &str) -> Query {
    Query::collection(collection).order_by(ORDER_FIELD, Direction::Ascending)
}

/// `Loading`, the validation error, then the end of the stream.
fn invalid_scope<T: Send + 'static>(error: ValidationError) -> ContentStream<T> {
    tracing::warn!("Refusing to observe content: {}", error);
    stream::iter([ContentResult::Loading, ContentResult::Error(error.into())]).boxed()
}

fn decode<E: ContentEntity>(document: Document) -> Result<E, DomainError> {
    let Document { id, fields } = document;
    serde_json::from_value::<E>(Value::Object(fields))
        .map(|entity| entity.with_id(&id).normalize())
        .map_err(|e| {
            tracing::warn!(collection = E::COLLECTION, %id, "Failed to decode {}: {}", E::KIND, e);
            DomainError::new(
                ErrorCode::DeserializationFailed,
                format!("Failed to read {} {}: {}", E::KIND, id, e),
            )
        })
}

fn decode_all<E: ContentEntity>(documents: Vec<Document>) -> Result<Vec<E>, DomainError> {
    documents.into_iter().map(decode::<E>).collect()
}

fn encode<E: ContentEntity>(entity: &E) -> Result<Fields, DomainError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("{} did not serialize to a document", E::KIND),
        )),
        Err(e) => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Failed to serialize {}: {}", E::KIND, e),
        )),
    }
}
