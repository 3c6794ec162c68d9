//! Listener port - explicit subscription handles for real-time sources.
//!
//! Identity providers and document databases push changes through
//! callbacks. Ports expose those callbacks as a [`Listener`]: a stream of
//! values paired with the [`ListenerRegistration`] that keeps the remote
//! listener alive. Dropping the listener removes the remote registration
//! synchronously, so a cancelled subscription can never leak a live
//! connection.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

/// Handle to a registered remote listener.
///
/// The removal callback runs exactly once: on [`ListenerRegistration::remove`]
/// or on drop, whichever comes first.
pub struct ListenerRegistration {
    remove: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerRegistration {
    /// Wraps the callback that deregisters the remote listener.
    pub fn new(remove: impl FnOnce() + Send + 'static) -> Self {
        Self {
            remove: Some(Box::new(remove)),
        }
    }

    /// A registration with nothing to remove.
    pub fn noop() -> Self {
        Self { remove: None }
    }

    /// Deregisters the remote listener now.
    pub fn remove(mut self) {
        self.run_remove();
    }

    fn run_remove(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.run_remove();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("active", &self.remove.is_some())
            .finish()
    }
}

/// Stream of values pushed by a remote listener.
///
/// The stream ends only when the source closes it; it never ends because
/// of an error item.
pub struct Listener<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    registration: ListenerRegistration,
}

impl<T> Listener<T> {
    pub fn new(receiver: mpsc::UnboundedReceiver<T>, registration: ListenerRegistration) -> Self {
        Self {
            receiver,
            registration,
        }
    }

    /// A listener that yields one value and ends, with nothing registered.
    ///
    /// Adapters use this when a subscription cannot be started at all.
    pub fn once(value: T) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let _ = sender.send(value);
        Self::new(receiver, ListenerRegistration::noop())
    }

    /// Removes the remote registration and discards pending values.
    pub fn remove(self) {
        let Listener {
            receiver,
            registration,
        } = self;
        registration.remove();
        drop(receiver);
    }
}

impl<T> Stream for Listener<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.receiver.poll_recv(cx)
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("registration", &self.registration)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_registration(counter: &Arc<AtomicUsize>) -> ListenerRegistration {
        let counter = Arc::clone(counter);
        ListenerRegistration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn drop_runs_removal_once() {
        let removed = Arc::new(AtomicUsize::new(0));
        let registration = counting_registration(&removed);

        drop(registration);

        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_remove_does_not_run_again_on_drop() {
        let removed = Arc::new(AtomicUsize::new(0));
        counting_registration(&removed).remove();

        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn listener_yields_pushed_values() {
        let removed = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut listener = Listener::new(receiver, counting_registration(&removed));

        sender.send(1).unwrap();
        sender.send(2).unwrap();

        assert_eq!(listener.next().await, Some(1));
        assert_eq!(listener.next().await, Some(2));
        assert_eq!(removed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropping_listener_deregisters_before_returning() {
        let removed = Arc::new(AtomicUsize::new(0));
        let (_sender, receiver) = mpsc::unbounded_channel::<u8>();
        let listener = Listener::new(receiver, counting_registration(&removed));

        drop(listener);

        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_deregisters_and_closes_the_channel() {
        let removed = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = mpsc::unbounded_channel();
        let listener = Listener::new(receiver, counting_registration(&removed));
        sender.send(1).unwrap();

        listener.remove();

        assert_eq!(removed.load(Ordering::SeqCst), 1);
        assert!(sender.send(2).is_err());
    }

    #[tokio::test]
    async fn once_yields_single_value_then_ends() {
        let mut listener = Listener::once("boom");
        assert_eq!(listener.next().await, Some("boom"));
        assert_eq!(listener.next().await, None);
    }
}
