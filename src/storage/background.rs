use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::StateStorage;
use super::error::{StorageError, StorageResult};
use crate::store::ChatState;

/// Fire-and-forget wrapper: `save` queues the snapshot and returns, a Tokio
/// task writes it to the inner storage.
///
/// Bursts are coalesced, so only the most recent queued snapshot is written.
/// Call [`BackgroundStorage::shutdown`] to flush before the process exits.
pub struct BackgroundStorage {
    inner: Arc<Mutex<Box<dyn StateStorage + Send>>>,
    sender: mpsc::UnboundedSender<ChatState>,
    worker: JoinHandle<()>,
}

impl BackgroundStorage {
    /// Starts the writer task. Must be called from inside a Tokio runtime.
    pub fn spawn<S>(inner: S) -> Self
    where
        S: StateStorage + Send + 'static,
    {
        let inner: Arc<Mutex<Box<dyn StateStorage + Send>>> =
            Arc::new(Mutex::new(Box::new(inner)));
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_writer(Arc::clone(&inner), receiver));

        Self {
            inner,
            sender,
            worker,
        }
    }

    /// Closes the queue and waits until every queued snapshot is written.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(err) = self.worker.await {
            log::error!("Snapshot writer terminated unexpectedly: {err}");
        }
    }
}

impl StateStorage for BackgroundStorage {
    fn load(&self) -> StorageResult<Option<ChatState>> {
        let inner = self.inner.lock().map_err(|_| StorageError::Poisoned)?;
        inner.load()
    }

    fn save(&self, state: &ChatState) -> StorageResult<()> {
        self.sender
            .send(state.clone())
            .map_err(|_| StorageError::WriterClosed)
    }
}

async fn run_writer(
    inner: Arc<Mutex<Box<dyn StateStorage + Send>>>,
    mut receiver: mpsc::UnboundedReceiver<ChatState>,
) {
    log::debug!("Snapshot writer started");

    while let Some(mut snapshot) = receiver.recv().await {
        let mut skipped = 0usize;
        while let Ok(newer) = receiver.try_recv() {
            snapshot = newer;
            skipped += 1;
        }
        if skipped > 0 {
            log::debug!("Coalesced {skipped} queued snapshots");
        }

        let inner = Arc::clone(&inner);
        let result = tokio::task::spawn_blocking(move || {
            let storage = inner.lock().map_err(|_| StorageError::Poisoned)?;
            storage.save(&snapshot)
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => log::warn!("Failed to persist chat state: {err}"),
            Err(err) => log::error!("Snapshot write task panicked: {err}"),
        }
    }

    log::debug!("Snapshot writer stopped");
}
