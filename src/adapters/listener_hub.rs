//! Registry of live listeners shared by the adapters.
//!
//! Each entry pairs a subscription key (a query, a document path, or `()`
//! for auth state) with the channel feeding its [`Listener`]. Removing a
//! listener drops its entry under the hub lock, so once the removal call
//! returns no further value can be queued for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;

use crate::ports::{Listener, ListenerRegistration};

struct Entry<K, T> {
    key: K,
    sender: mpsc::UnboundedSender<T>,
}

struct HubState<K, T> {
    next_id: u64,
    entries: HashMap<u64, Entry<K, T>>,
}

/// Fan-out of values to registered listeners.
pub(crate) struct ListenerHub<K, T> {
    state: Arc<Mutex<HubState<K, T>>>,
}

impl<K, T> ListenerHub<K, T>
where
    K: Send + 'static,
    T: Send + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                next_id: 0,
                entries: HashMap::new(),
            })),
        }
    }

    /// Registers a listener, queueing `initial` as its first value.
    pub(crate) fn register(&self, key: K, initial: T) -> Listener<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let _ = sender.send(initial);

        let id = {
            let mut state = lock(&self.state);
            let id = state.next_id;
            state.next_id += 1;
            state.entries.insert(id, Entry { key, sender });
            id
        };

        let weak: Weak<Mutex<HubState<K, T>>> = Arc::downgrade(&self.state);
        let registration = ListenerRegistration::new(move || {
            if let Some(state) = weak.upgrade() {
                lock(&state).entries.remove(&id);
            }
        });
        Listener::new(receiver, registration)
    }

    /// Offers a value to every listener; `compute` returns `None` to skip one.
    ///
    /// The key is passed mutably so a listener can remember what it was last
    /// sent.
    pub(crate) fn notify(&self, mut compute: impl FnMut(&mut K) -> Option<T>) {
        let mut state = lock(&self.state);
        state.entries.retain(|_, entry| match compute(&mut entry.key) {
            Some(value) => entry.sender.send(value).is_ok(),
            None => !entry.sender.is_closed(),
        });
    }

    /// Number of listeners still registered.
    pub(crate) fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }
}

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
