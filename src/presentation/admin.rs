//! Content management screens for categories, topics and lessons.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{watch, Mutex};

use super::driver::StateDriver;
use super::reducers::{to_detail_state, to_list_state};
use super::state::{DetailState, FormEvent, ListState};
use crate::application::ContentRepository;
use crate::domain::content::{Category, ContentEntity, Lesson, Topic};

/// Admin list, detail and edit form for one kind of record.
///
/// The list follows every record of the collection. At most one detail
/// subscription runs at a time; loading another record or deleting one
/// stops it first.
pub struct AdminContentViewModel<E: ContentEntity> {
    content: ContentRepository,
    list: watch::Receiver<ListState<E>>,
    list_driver: StateDriver,
    detail: Arc<watch::Sender<DetailState<E>>>,
    detail_job: Mutex<Option<StateDriver>>,
    form: watch::Sender<FormEvent>,
}

pub type AdminCategoriesViewModel = AdminContentViewModel<Category>;
pub type AdminTopicsViewModel = AdminContentViewModel<Topic>;
pub type AdminLessonsViewModel = AdminContentViewModel<Lesson>;

impl<E: ContentEntity> AdminContentViewModel<E> {
    /// Starts the list subscription. Must be called within a tokio runtime.
    pub fn new(content: &ContentRepository) -> Self {
        let (sink, list) = watch::channel(ListState::Loading);
        let states = content.observe_all::<E>().map(to_list_state).boxed();
        let (detail, _) = watch::channel(DetailState::Idle);
        let (form, _) = watch::channel(FormEvent::Idle);

        Self {
            content: content.clone(),
            list,
            list_driver: StateDriver::spawn(E::COLLECTION, states, sink),
            detail: Arc::new(detail),
            detail_job: Mutex::new(None),
            form,
        }
    }

    pub fn list_state(&self) -> ListState<E> {
        self.list.borrow().clone()
    }

    pub fn subscribe_list(&self) -> watch::Receiver<ListState<E>> {
        self.list.clone()
    }

    pub fn detail_state(&self) -> DetailState<E> {
        self.detail.borrow().clone()
    }

    pub fn subscribe_detail(&self) -> watch::Receiver<DetailState<E>> {
        self.detail.subscribe()
    }

    pub fn form_event(&self) -> FormEvent {
        self.form.borrow().clone()
    }

    pub fn subscribe_form(&self) -> watch::Receiver<FormEvent> {
        self.form.subscribe()
    }

    /// Follows the record with `id`, replacing any previous detail job.
    pub async fn load_details(&self, id: &str) {
        let mut job = self.detail_job.lock().await;
        stop(&mut job).await;

        if id.trim().is_empty() {
            self.detail
                .send_replace(DetailState::Error(format!("Invalid {} ID", E::KIND)));
            return;
        }

        let sink = Arc::clone(&self.detail);
        let states = self.content.observe_one::<E>(id).map(to_detail_state).boxed();
        *job = Some(StateDriver::spawn_with("admin-detail", states, move |state| {
            sink.send_replace(state);
        }));
    }

    /// Creates the record when its id is blank, otherwise replaces it.
    pub async fn save(&self, entity: E) {
        self.form.send_replace(FormEvent::Loading);
        let event = match self.content.save(&entity).await {
            Ok(id) => {
                tracing::debug!(collection = E::COLLECTION, %id, "{} saved", E::KIND);
                FormEvent::Saved
            }
            Err(e) => FormEvent::Error(e.message().to_string()),
        };
        self.form.send_replace(event);
    }

    pub async fn delete(&self, id: &str) {
        {
            let mut job = self.detail_job.lock().await;
            stop(&mut job).await;
            self.detail.send_replace(DetailState::Idle);
        }

        self.form.send_replace(FormEvent::Loading);
        let event = match self.content.delete::<E>(id).await {
            Ok(()) => FormEvent::Deleted,
            Err(e) => FormEvent::Error(e.message().to_string()),
        };
        self.form.send_replace(event);
    }

    /// Acknowledges the last form event.
    pub fn reset_form_event(&self) {
        self.form.send_replace(FormEvent::Idle);
    }

    pub async fn shutdown(mut self) {
        stop(self.detail_job.get_mut()).await;
        self.list_driver.shutdown().await;
    }
}

async fn stop(job: &mut Option<StateDriver>) {
    if let Some(mut previous) = job.take() {
        previous.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryDocumentStore;
    use crate::ports::{DocumentStore, StoreError};
    use serde_json::json;

    fn setup() -> (Arc<InMemoryDocumentStore>, ContentRepository) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let repo = ContentRepository::new(Arc::clone(&store) as Arc<dyn DocumentStore>);
        (store, repo)
    }

    async fn wait_detail<E: ContentEntity>(
        vm: &AdminContentViewModel<E>,
        done: impl Fn(&DetailState<E>) -> bool,
    ) -> DetailState<E> {
        let mut view = vm.subscribe_detail();
        let state = view.wait_for(|s| done(s)).await.unwrap().clone();
        state
    }

    #[tokio::test]
    async fn lists_every_lesson_regardless_of_status() {
        let (store, repo) = setup();
        store.seed("lessons", "a", json!({"topicId": "T1", "title_ar": "draft", "order": 2, "status": "DRAFT"}));
        store.seed("lessons", "b", json!({"topicId": "T1", "title_ar": "live", "order": 1, "status": "PUBLISHED"}));

        let vm = AdminLessonsViewModel::new(&repo);
        let mut view = vm.subscribe_list();
        let state = view.wait_for(|s| s.items().len() == 2).await.unwrap().clone();

        let titles: Vec<_> = state.items().iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["live", "draft"]);
        vm.shutdown().await;
    }

    #[tokio::test]
    async fn blank_detail_id_is_an_error() {
        let (store, repo) = setup();
        let vm = AdminTopicsViewModel::new(&repo);

        vm.load_details("  ").await;

        assert_eq!(vm.detail_state(), DetailState::Error("Invalid Topic ID".to_string()));
        vm.shutdown().await;
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn loading_another_record_replaces_the_detail_job() {
        let (store, repo) = setup();
        store.seed("categories", "c1", json!({"title_ar": "first", "order": 1}));
        store.seed("categories", "c2", json!({"title_ar": "second", "order": 2}));
        let vm = AdminCategoriesViewModel::new(&repo);

        vm.load_details("c1").await;
        wait_detail(&vm, |s| matches!(s, DetailState::Success(c) if c.title == "first")).await;
        vm.load_details("c2").await;
        wait_detail(&vm, |s| matches!(s, DetailState::Success(c) if c.title == "second")).await;

        // list + one detail
        assert_eq!(store.listener_count(), 2);

        store.seed("categories", "c1", json!({"title_ar": "renamed", "order": 1}));
        tokio::task::yield_now().await;
        assert!(matches!(vm.detail_state(), DetailState::Success(c) if c.id == "c2"));
        vm.shutdown().await;
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let (_store, repo) = setup();
        let vm = AdminCategoriesViewModel::new(&repo);

        vm.load_details("ghost").await;

        let state = wait_detail(&vm, |s| !matches!(s, DetailState::Idle | DetailState::Loading)).await;
        assert_eq!(state, DetailState::NotFound);
    }

    #[tokio::test]
    async fn save_creates_new_records() {
        let (store, repo) = setup();
        let vm = AdminCategoriesViewModel::new(&repo);

        vm.save(Category::new("Seerah", "Life of the Prophet", 1)).await;

        assert_eq!(vm.form_event(), FormEvent::Saved);
        assert_eq!(store.count("categories"), 1);
    }

    #[tokio::test]
    async fn save_reports_missing_parent() {
        let (store, repo) = setup();
        let vm = AdminTopicsViewModel::new(&repo);

        vm.save(Topic::new("no-such-category", "Orphan", 1)).await;

        assert!(matches!(vm.form_event(), FormEvent::Error(_)));
        assert_eq!(store.count("topics"), 0);
    }

    #[tokio::test]
    async fn delete_stops_detail_job_first() {
        let (store, repo) = setup();
        store.seed("categories", "c1", json!({"title_ar": "first", "order": 1}));
        let vm = AdminCategoriesViewModel::new(&repo);
        vm.load_details("c1").await;
        wait_detail(&vm, |s| matches!(s, DetailState::Success(_))).await;

        vm.delete("c1").await;

        assert_eq!(vm.form_event(), FormEvent::Deleted);
        assert_eq!(vm.detail_state(), DetailState::Idle);
        assert_eq!(store.count("categories"), 0);
        assert_eq!(store.listener_count(), 1);
    }

    #[tokio::test]
    async fn failed_delete_reports_error() {
        let (store, repo) = setup();
        store.fail_with(StoreError::PermissionDenied("admins only".to_string()));
        let vm = AdminCategoriesViewModel::new(&repo);

        vm.delete("c1").await;

        assert!(matches!(vm.form_event(), FormEvent::Error(_)));
        vm.reset_form_event();
        assert_eq!(vm.form_event(), FormEvent::Idle);
    }
}
