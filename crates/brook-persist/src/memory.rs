use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{PersistError, Result};
use crate::gateway::{PersistenceGateway, SessionSnapshot};

/// In-memory gateway that records every save, with optional failure
/// injection and pausing for queue tests.
#[derive(Default)]
pub struct MemoryGateway {
    saves: Mutex<Vec<(String, SessionSnapshot)>>,
    fail: AtomicBool,
    paused: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every save returns a storage error
    pub fn failing() -> Self {
        let gateway = Self::default();
        gateway.fail.store(true, Ordering::SeqCst);
        gateway
    }

    /// Saves stall until [`resume`](Self::resume) is called
    pub fn paused() -> Self {
        let gateway = Self::default();
        gateway.paused.store(true, Ordering::SeqCst);
        gateway
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn saves(&self) -> Vec<(String, SessionSnapshot)> {
        self.saves.lock().unwrap().clone()
    }

    pub fn last_snapshot(&self) -> Option<SessionSnapshot> {
        self.saves.lock().unwrap().last().map(|(_, s)| s.clone())
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn save(&self, session_id: &str, snapshot: SessionSnapshot) -> Result<()> {
        while self.paused.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistError::Storage("injected failure".to_string()));
        }

        self.saves
            .lock()
            .unwrap()
            .push((session_id.to_string(), snapshot));
        Ok(())
    }
}
