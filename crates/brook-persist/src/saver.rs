use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::gateway::{PersistenceGateway, SessionSnapshot};

/// Depth of the opportunistic save queue. Once full, further writes are
/// dropped: a later snapshot carries the superseding full state anyway.
pub const DEFAULT_QUEUE_DEPTH: usize = 3;

/// Non-blocking, bounded write path in front of a [`PersistenceGateway`].
///
/// Snapshots enqueued with [`try_save`](Self::try_save) are written by a
/// single background task, serialized per session. [`shutdown`](Self::shutdown)
/// drains the queue and performs one final awaited write, so the terminal
/// state is durable even when intermediate writes were dropped.
pub struct SessionSaver {
    gateway: Arc<dyn PersistenceGateway>,
    session_id: String,
    tx: mpsc::Sender<SessionSnapshot>,
    writer: JoinHandle<()>,
}

impl SessionSaver {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, session_id: impl Into<String>) -> Self {
        Self::with_queue_depth(gateway, session_id, DEFAULT_QUEUE_DEPTH)
    }

    pub fn with_queue_depth(
        gateway: Arc<dyn PersistenceGateway>,
        session_id: impl Into<String>,
        depth: usize,
    ) -> Self {
        let session_id = session_id.into();
        let (tx, mut rx) = mpsc::channel::<SessionSnapshot>(depth.max(1));

        let writer = {
            let gateway = Arc::clone(&gateway);
            let session_id = session_id.clone();
            tokio::spawn(async move {
                while let Some(snapshot) = rx.recv().await {
                    if let Err(e) = gateway.save(&session_id, snapshot).await {
                        tracing::warn!(session_id = %session_id, error = %e, "background save failed");
                    }
                }
            })
        };

        Self {
            gateway,
            session_id,
            tx,
            writer,
        }
    }

    /// Enqueue a snapshot without blocking. Dropped when the queue is full.
    pub fn try_save(&self, snapshot: SessionSnapshot) {
        match self.tx.try_send(snapshot) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::debug!(session_id = %self.session_id, "save queue full, dropping snapshot");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(session_id = %self.session_id, "save queue closed, dropping snapshot");
            }
        }
    }

    /// Drain the queue, then write `final_snapshot` synchronously.
    ///
    /// This is the only blocking operation on the save path; the error from
    /// the final write is returned so callers can log it with context.
    pub async fn shutdown(self, final_snapshot: SessionSnapshot) -> Result<()> {
        let Self {
            gateway,
            session_id,
            tx,
            writer,
        } = self;

        drop(tx);
        if let Err(e) = writer.await {
            tracing::warn!(session_id = %session_id, error = %e, "save writer task aborted");
        }

        gateway.save(&session_id, final_snapshot).await
    }
}
