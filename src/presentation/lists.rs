//! Browsing screens: home (categories), topics of a category, lessons of a topic.

use futures::channel::mpsc;
use futures::StreamExt;
use tokio::sync::watch;

use super::driver::StateDriver;
use super::reducers::{scoped_list_states, to_list_state};
use super::state::ListState;
use crate::application::ContentRepository;
use crate::domain::content::{Category, Lesson, Topic};

/// Home screen: every category.
pub struct CategoryListViewModel {
    state: watch::Receiver<ListState<Category>>,
    driver: StateDriver,
}

impl CategoryListViewModel {
    /// Starts observing categories. Must be called within a tokio runtime.
    pub fn new(content: &ContentRepository) -> Self {
        let (sink, state) = watch::channel(ListState::Loading);
        let states = content.observe_categories().map(to_list_state).boxed();
        Self {
            state,
            driver: StateDriver::spawn("categories", states, sink),
        }
    }

    pub fn state(&self) -> ListState<Category> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<Category>> {
        self.state.clone()
    }

    /// Stops observing and releases the listener.
    pub async fn shutdown(mut self) {
        self.driver.shutdown().await;
    }
}

/// A list screen scoped by a parent id supplied by navigation.
///
/// The state stays `Idle` until a non-blank scope id arrives. Setting a new
/// id replaces the previous subscription.
pub struct ScopedListViewModel<T> {
    state: watch::Receiver<ListState<T>>,
    scopes: mpsc::UnboundedSender<String>,
    driver: StateDriver,
}

/// Topics of one category.
pub type TopicListViewModel = ScopedListViewModel<Topic>;

/// Published lessons of one topic.
pub type LessonListViewModel = ScopedListViewModel<Lesson>;

impl<T> ScopedListViewModel<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn start<F>(name: &'static str, scope_id: &str, query: F) -> Self
    where
        F: FnMut(&str) -> crate::application::ContentStream<Vec<T>> + Send + Unpin + 'static,
    {
        let (scopes, scope_rx) = mpsc::unbounded();
        let (sink, state) = watch::channel(ListState::Idle);
        let _ = scopes.unbounded_send(scope_id.to_string());

        let states = scoped_list_states(scope_rx, query);
        Self {
            state,
            scopes,
            driver: StateDriver::spawn(name, states, sink),
        }
    }

    /// Switches to another scope id. Blank ids are ignored.
    pub fn set_scope(&self, scope_id: &str) {
        if self.scopes.unbounded_send(scope_id.to_string()).is_err() {
            tracing::debug!("Scope change after shutdown ignored");
        }
    }

    pub fn state(&self) -> ListState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<T>> {
        self.state.clone()
    }

    pub async fn shutdown(mut self) {
        self.driver.shutdown().await;
    }
}

impl ScopedListViewModel<Topic> {
    pub fn new(content: &ContentRepository, category_id: &str) -> Self {
        let content = content.clone();
        Self::start("topics", category_id, move |id| {
            content.observe_topics_for_category(id)
        })
    }

    pub fn set_category_id(&self, category_id: &str) {
        self.set_scope(category_id);
    }
}

impl ScopedListViewModel<Lesson> {
    pub fn new(content: &ContentRepository, topic_id: &str) -> Self {
        let content = content.clone();
        Self::start("lessons", topic_id, move |id| {
            content.observe_lessons_for_topic(id)
        })
    }

    pub fn set_topic_id(&self, topic_id: &str) {
        self.set_scope(topic_id);
    }
}
