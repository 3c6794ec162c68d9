//! End-to-end content browsing and editing.
//!
//! Covers the learner path (home -> topics -> lessons) and the admin
//! screens against the in-memory document store, including listener
//! cleanup when screens go away or are re-scoped.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use tokio::sync::watch;

use masarat_core::adapters::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
use masarat_core::domain::content::{Category, ContentEntity, Lesson, Topic};
use masarat_core::domain::foundation::ErrorCode;
use masarat_core::domain::ContentResult;
use masarat_core::presentation::{DetailState, FormEvent, ListState};
use masarat_core::AppContainer;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app() -> (Arc<InMemoryDocumentStore>, AppContainer) {
    let store = Arc::new(InMemoryDocumentStore::new());
    let app = AppContainer::new(Arc::new(InMemoryIdentityProvider::new()), store.clone());
    (store, app)
}

async fn settle<T: Clone>(
    view: &mut watch::Receiver<ListState<T>>,
    done: impl Fn(&ListState<T>) -> bool,
) -> ListState<T> {
    loop {
        let current = view.borrow_and_update().clone();
        if done(&current) {
            return current;
        }
        view.changed().await.expect("view model stopped");
    }
}

fn seed_library(store: &InMemoryDocumentStore) {
    store.seed("categories", "quran", json!({"title_ar": "القرآن", "order": 2}));
    store.seed("categories", "seerah", json!({"title_ar": "السيرة", "order": 1}));
    store.seed("topics", "makkah", json!({"categoryId": "seerah", "title_ar": "مكة", "order": 1}));
    store.seed("topics", "madinah", json!({"categoryId": "seerah", "title_ar": "المدينة", "order": 2}));
    store.seed(
        "lessons",
        "birth",
        json!({"topicId": "makkah", "title_ar": "المولد", "order": 1, "status": "PUBLISHED", "xpAward": 10}),
    );
    store.seed(
        "lessons",
        "draft",
        json!({"topicId": "makkah", "title_ar": "مسودة", "order": 2, "status": "DRAFT"}),
    );
    store.seed(
        "lessons",
        "hijrah",
        json!({"topicId": "madinah", "title_ar": "الهجرة", "order": 1, "status": "PUBLISHED"}),
    );
}

// =============================================================================
// Learner path
// =============================================================================

#[tokio::test]
async fn home_topics_and_lessons_are_ordered_and_filtered() {
    let (store, app) = app();
    seed_library(&store);

    let home = app.category_list();
    let mut view = home.subscribe();
    let categories = settle(&mut view, |s| !s.items().is_empty()).await;
    let ids: Vec<_> = categories.items().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["seerah", "quran"]);

    let topics = app.topic_list("seerah");
    let mut view = topics.subscribe();
    let state = settle(&mut view, |s| !s.items().is_empty()).await;
    let ids: Vec<_> = state.items().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["makkah", "madinah"]);

    let lessons = app.lesson_list("makkah");
    let mut view = lessons.subscribe();
    let state = settle(&mut view, |s| !s.items().is_empty()).await;
    let ids: Vec<_> = state.items().iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["birth"]);

    home.shutdown().await;
    topics.shutdown().await;
    lessons.shutdown().await;
    assert_eq!(store.listener_count(), 0);
}

#[tokio::test]
async fn subscription_starts_with_exactly_one_loading() {
    let (store, app) = app();
    seed_library(&store);

    let results: Vec<_> = app.content.observe_categories().take(2).collect().await;

    assert!(matches!(results[0], ContentResult::Loading));
    assert!(matches!(results[1], ContentResult::Success(ref items) if items.len() == 2));
}

#[tokio::test]
async fn empty_topic_is_empty_not_loading() {
    let (store, app) = app();
    seed_library(&store);
    store.seed("topics", "empty", json!({"categoryId": "quran", "title_ar": "فارغ", "order": 1}));

    let lessons = app.lesson_list("empty");
    let mut view = lessons.subscribe();

    assert_eq!(settle(&mut view, |s| !s.is_loading()).await, ListState::Empty);
}

#[tokio::test]
async fn rescoped_lessons_ignore_the_old_topic() {
    let (store, app) = app();
    seed_library(&store);
    let lessons = app.lesson_list("makkah");
    let mut view = lessons.subscribe();
    settle(&mut view, |s| !s.items().is_empty()).await;

    lessons.set_topic_id("madinah");
    settle(&mut view, |s| s.items().iter().any(|l| l.id == "hijrah")).await;
    store.seed(
        "lessons",
        "cave",
        json!({"topicId": "makkah", "title_ar": "الغار", "order": 3, "status": "PUBLISHED"}),
    );
    tokio::task::yield_now().await;

    assert!(lessons.state().items().iter().all(|l| l.topic_id == "madinah"));
    assert_eq!(store.listener_count(), 1);
}

#[tokio::test]
async fn absent_lesson_is_not_found() {
    let (_store, app) = app();

    let results: Vec<_> = app.content.observe_lesson("missing").take(2).collect().await;

    assert!(matches!(results[1], ContentResult::NotFound));
}

// =============================================================================
// Admin editing
// =============================================================================

#[tokio::test]
async fn add_assigns_ids_and_blank_update_fails_locally() {
    let (store, app) = app();

    let id = app
        .content
        .add_category(&Category::new("الفقه", "أحكام", 3))
        .await
        .unwrap();
    assert!(!id.as_str().is_empty());
    assert!(store.fields("categories", id.as_str()).is_some());

    let calls = store.call_count();
    let err = app
        .content
        .update_category(&Category::new("الفقه", "أحكام", 3))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
    assert!(app.content.delete_lesson("  ").await.is_err());
    assert_eq!(store.call_count(), calls);
}

#[tokio::test]
async fn admin_edits_reach_the_right_document() {
    let (store, app) = app();
    seed_library(&store);
    let admin = app.admin::<Lesson>();

    admin.load_details("draft").await;
    let mut detail = admin.subscribe_detail();
    let lesson = match detail
        .wait_for(|s| matches!(s, DetailState::Success(_)))
        .await
        .unwrap()
        .clone()
    {
        DetailState::Success(lesson) => lesson,
        other => panic!("unexpected state {:?}", other),
    };

    let published = Lesson {
        title: "مسودة منشورة".to_string(),
        ..lesson
    }
    .with_status(masarat_core::domain::content::ContentStatus::Published);
    admin.save(published).await;
    assert_eq!(admin.form_event(), FormEvent::Saved);
    assert_eq!(store.fields("lessons", "draft").unwrap()["status"], "PUBLISHED");
    assert_eq!(store.fields("lessons", "birth").unwrap()["title_ar"], "المولد");

    admin.delete("hijrah").await;
    assert_eq!(admin.form_event(), FormEvent::Deleted);
    assert_eq!(admin.detail_state(), DetailState::Idle);
    assert!(store.fields("lessons", "hijrah").is_none());
    assert_eq!(store.count("lessons"), 2);

    admin.shutdown().await;
    assert_eq!(store.listener_count(), 0);
}

#[tokio::test]
async fn topics_require_an_existing_category() {
    let (store, app) = app();
    seed_library(&store);

    let orphan = app.content.add_topic(&Topic::new("nope", "يتيم", 1)).await.unwrap_err();
    assert_eq!(orphan.code, ErrorCode::ParentNotFound);

    let id = app.content.add_topic(&Topic::new("quran", "التجويد", 1)).await.unwrap();
    let stored = store.fields("topics", id.as_str()).unwrap();
    assert_eq!(stored["categoryId"], "quran");
    assert_eq!(Topic::COLLECTION, "topics");
}
