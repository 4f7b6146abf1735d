//! Per-sender mutual exclusion for the get-advance-persist sequence.
//!
//! The platform may deliver webhooks concurrently for the same sender.
//! Without serialization, two handlers can both read the same state and
//! both persist the next one (lost update). Each sender gets its own
//! async mutex; distinct senders never block each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed async mutexes, one per in-flight sender.
#[derive(Default)]
pub struct SenderLocks {
    inner: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `sender_id`, waiting if another handler holds it.
    pub async fn acquire(&self, sender_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().expect("sender lock map poisoned");
            Arc::clone(
                map.entry(sender_id.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Drop the map entry once nobody holds or awaits the lock.
    ///
    /// Callers invoke this after releasing their guard; the entry is kept
    /// if any other handler still references it.
    pub fn release(&self, sender_id: &str) {
        let mut map = self.inner.lock().expect("sender lock map poisoned");
        if let Some(lock) = map.get(sender_id) {
            if Arc::strong_count(lock) == 1 {
                map.remove(sender_id);
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().expect("sender lock map poisoned").len()
    }
}
