//! Pure mappings from repository results to screen states.

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};

use super::state::{DetailState, ListState};
use crate::application::stream_ext::SwitchStreamExt;
use crate::application::ContentStream;
use crate::domain::ContentResult;

/// Maps a collection result to a list state; no items is `Empty`.
pub fn to_list_state<T>(result: ContentResult<Vec<T>>) -> ListState<T> {
    match result {
        ContentResult::Loading => ListState::Loading,
        ContentResult::Success(items) if items.is_empty() => ListState::Empty,
        ContentResult::Success(items) => ListState::Success(items),
        ContentResult::NotFound => ListState::Empty,
        ContentResult::Error(e) => ListState::Error(e.message().to_string()),
    }
}

pub fn to_detail_state<T>(result: ContentResult<T>) -> DetailState<T> {
    match result {
        ContentResult::Loading => DetailState::Loading,
        ContentResult::Success(item) => DetailState::Success(item),
        ContentResult::NotFound => DetailState::NotFound,
        ContentResult::Error(e) => DetailState::Error(e.message().to_string()),
    }
}

/// List states for a screen whose scope id can change over time.
///
/// Blank scope ids are skipped rather than queried. Each non-blank id
/// replaces the previous subscription, which is dropped first.
pub fn scoped_list_states<S, T, F>(scopes: S, mut query: F) -> BoxStream<'static, ListState<T>>
where
    S: Stream<Item = String> + Send + Unpin + 'static,
    T: Send + 'static,
    F: FnMut(&str) -> ContentStream<Vec<T>> + Send + Unpin + 'static,
{
    scopes
        .filter(|id| futures::future::ready(!id.trim().is_empty()))
        .switch_map(move |id| query(&id).map(to_list_state))
        .boxed()
}
