//! Profile use cases: the signed-in user's profile document and progress.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::ready;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde_json::{json, Value};

use super::auth::AuthRepository;
use super::stream_ext::SwitchStreamExt;
use crate::domain::foundation::{DomainError, ErrorCode, Identity, UserId, ValidationError};
use crate::domain::user::{UserProfile, USERS};
use crate::ports::{Document, DocumentPath, DocumentSnapshot, DocumentStore, Fields};

/// Access to `users/{uid}` profile documents.
#[derive(Clone)]
pub struct UserRepository {
    auth: AuthRepository,
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(auth: AuthRepository, store: Arc<dyn DocumentStore>) -> Self {
        Self { auth, store }
    }

    /// Profile of whoever is signed in, or `None`.
    ///
    /// Follows the auth state: each new identity replaces the previous
    /// profile subscription, which is removed before the next one starts.
    /// A missing or unreadable profile, or a listener failure, reads as
    /// `None`. Consecutive duplicates are suppressed.
    pub fn observe_current_user(&self) -> BoxStream<'static, Option<UserProfile>> {
        let store = Arc::clone(&self.store);
        self.auth
            .observe_auth_state()
            .switch_map(move |identity| match identity {
                Some(identity) => profile_updates(&store, &identity.uid),
                None => stream::once(ready(None)).boxed(),
            })
            .distinct_until_changed()
            .boxed()
    }

    /// Creates the profile for `identity` unless it already exists.
    ///
    /// Any failure is reported as `ProfileSetupFailed`, with the underlying
    /// code kept in the `cause` detail.
    pub async fn ensure_profile_exists(&self, identity: &Identity) -> Result<(), DomainError> {
        self.create_profile_if_missing(identity).await.map_err(|e| {
            let cause = e.code.to_string();
            DomainError::new(ErrorCode::ProfileSetupFailed, e.message).with_detail("cause", cause)
        })
    }

    async fn create_profile_if_missing(&self, identity: &Identity) -> Result<(), DomainError> {
        let path = profile_path(&identity.uid);
        if self.store.get(&path).await?.is_some() {
            tracing::debug!(uid = %identity.uid, "Profile already exists");
            return Ok(());
        }

        let profile = UserProfile::default_for(identity);
        self.store.set(&path, encode(&profile)?).await?;
        tracing::info!(uid = %identity.uid, "Profile created");
        Ok(())
    }

    /// Merges `fields` into the user's profile document.
    pub async fn update_user_data(&self, uid: &UserId, fields: Fields) -> Result<(), DomainError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.store.update(&profile_path(uid), fields).await?;
        Ok(())
    }

    pub async fn update_display_name(&self, uid: &UserId, name: &str) -> Result<(), DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::empty_field("displayName").into());
        }
        self.update_user_data(uid, fields(json!({ "displayName": name })))
            .await
    }

    /// Credits a completed lesson: adds `xp_award` and advances the streak.
    ///
    /// Returns the profile as written. The read and the write are separate
    /// calls, so two devices completing lessons at the same moment can race.
    pub async fn record_lesson_completion(
        &self,
        uid: &UserId,
        xp_award: u32,
        today: NaiveDate,
    ) -> Result<UserProfile, DomainError> {
        let path = profile_path(uid);
        let document = self.store.get(&path).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::DocumentNotFound, format!("No profile at {}", path))
        })?;
        let mut profile = decode(document).map_err(|e| {
            DomainError::new(ErrorCode::DeserializationFailed, format!("Unreadable profile: {}", e))
        })?;

        profile.record_completion(xp_award, today);
        let update = fields(json!({
            "totalXP": profile.total_xp,
            "currentStreak": profile.current_streak,
            "lastActivityDate": profile.last_activity_date,
        }));
        self.store.update(&path, update).await?;

        tracing::info!(
            uid = %uid,
            total_xp = profile.total_xp,
            streak = profile.current_streak,
            "Lesson completion recorded"
        );
        Ok(profile)
    }
}

fn profile_path(uid: &UserId) -> DocumentPath {
    DocumentPath::new(USERS, uid.document_id())
}

fn profile_updates(
    store: &Arc<dyn DocumentStore>,
    uid: &UserId,
) -> BoxStream<'static, Option<UserProfile>> {
    let uid = uid.clone();
    tracing::debug!(%uid, "Profile listener registered");
    store
        .listen_document(profile_path(&uid))
        .map(move |snapshot: DocumentSnapshot| match snapshot {
            Ok(Some(document)) => match decode(document) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!(%uid, "Unreadable profile document: {}", e);
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(%uid, "Profile document absent");
                None
            }
            Err(e) => {
                tracing::warn!(%uid, "Profile listener failed: {}", e);
                None
            }
        })
        .boxed()
}

fn decode(document: Document) -> Result<UserProfile, serde_json::Error> {
    serde_json::from_value(Value::Object(document.fields))
}

fn encode(profile: &UserProfile) -> Result<Fields, DomainError> {
    match serde_json::to_value(profile) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(DomainError::new(
            ErrorCode::InternalError,
            "Profile did not serialize to a document",
        )),
        Err(e) => Err(DomainError::new(
            ErrorCode::InternalError,
            format!("Failed to serialize profile: {}", e),
        )),
    }
}

fn fields(body: Value) -> Fields {
    match body {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}
