//! Background task that feeds a state stream into a watch channel.
//!
//! Each view model owns one driver. The task runs until the stream ends or
//! a shutdown signal arrives; on shutdown the stream, and with it every
//! listener it holds, is dropped before [`StateDriver::shutdown`] returns.
//!
//! Dropping a driver without calling `shutdown` aborts the task, but the
//! stream is only released once the runtime gets to the cancelled task.
//! View models call `shutdown` when their listeners must be gone on return.

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub(crate) struct StateDriver {
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl StateDriver {
    /// Spawns the task. Must be called from within a tokio runtime.
    pub(crate) fn spawn<T>(
        name: &'static str,
        states: BoxStream<'static, T>,
        sink: watch::Sender<T>,
    ) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self::spawn_with(name, states, move |state| {
            sink.send_replace(state);
        })
    }

    /// Like [`StateDriver::spawn`], handing each state to `publish`.
    pub(crate) fn spawn_with<T, P>(
        name: &'static str,
        mut states: BoxStream<'static, T>,
        mut publish: P,
    ) -> Self
    where
        T: Send + 'static,
        P: FnMut(T) + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            tracing::debug!(view_model = name, "State driver started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    next = states.next() => match next {
                        Some(state) => publish(state),
                        None => break,
                    },
                }
            }
            drop(states);
            tracing::debug!(view_model = name, "State driver stopped");
        });

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    /// Stops the task and waits until its subscriptions are released.
    pub(crate) async fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("State driver ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for StateDriver {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
