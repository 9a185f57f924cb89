use shuttle_core::TripId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per trip. Waiters are served in arrival order; different
/// trips never contend.
#[derive(Default)]
pub struct TripLocks {
    locks: Mutex<HashMap<TripId, Arc<AsyncMutex<()>>>>,
}

impl TripLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, trip_id: &TripId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(trip_id.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
