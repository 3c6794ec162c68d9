//! Behaviour shared by every content record stored in the database.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::foundation::{DocumentId, ValidationError};

/// Reference from a child record to the document that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRef<'a> {
    /// Field holding the parent id in the child document (e.g. `categoryId`).
    pub field: &'static str,
    /// Collection the parent lives in.
    pub collection: &'static str,
    /// Raw parent id as held by the child.
    pub id: &'a str,
}

/// Validated parent key, ready to be looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentKey {
    pub collection: &'static str,
    pub id: DocumentId,
}

/// A record persisted as one document in one top-level collection.
///
/// The document key is not part of the stored body: implementors skip `id`
/// during serialization and receive it back through [`ContentEntity::with_id`].
/// A blank `id` means the record has not been persisted yet.
pub trait ContentEntity:
    Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static
{
    /// Collection holding this kind of record.
    const COLLECTION: &'static str;

    /// Human-readable kind, used in messages ("Category", "Lesson").
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Returns the record with its document key filled in.
    fn with_id(self, id: &str) -> Self;

    fn title(&self) -> &str;

    fn order(&self) -> i32;

    /// Parent reference for records nested under another collection.
    fn parent(&self) -> Option<ParentRef<'_>> {
        None
    }

    /// Normalizes a freshly decoded record.
    fn normalize(self) -> Self {
        self
    }

    /// Checks a record about to be created.
    ///
    /// The key is assigned by the database, so a caller-supplied `id` is
    /// rejected. Returns the parent key that must exist, if any.
    fn validate_for_create(&self) -> Result<Option<ParentKey>, ValidationError> {
        if !self.id().trim().is_empty() {
            return Err(ValidationError::unexpected_value(
                "id",
                "assigned by the server on creation",
            ));
        }
        validate_common(self)
    }

    /// Checks a record about to be updated and returns its key.
    fn validate_for_update(&self) -> Result<(DocumentId, Option<ParentKey>), ValidationError> {
        let id = DocumentId::new(self.id())?;
        let parent = validate_common(self)?;
        Ok((id, parent))
    }
}

fn validate_common<E: ContentEntity>(
    entity: &E,
) -> Result<Option<ParentKey>, ValidationError> {
    if entity.title().trim().is_empty() {
        return Err(ValidationError::empty_field("title"));
    }
    entity
        .parent()
        .map(|parent| {
            DocumentId::parse(parent.field, parent.id).map(|id| ParentKey {
                collection: parent.collection,
                id,
            })
        })
        .transpose()
}
