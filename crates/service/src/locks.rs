//! Per-key async locks
//!
//! Serializes read-modify-write cycles on the same cart inside this process.
//! Waiting is bounded; callers get `ServiceError::Busy` instead of hanging.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::timeout;

use crate::errors::ServiceError;

const PRUNE_THRESHOLD: usize = 1024;

pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
    wait: Duration,
}

impl KeyedLocks {
    pub fn new(wait: Duration) -> Self {
        Self { locks: DashMap::new(), wait }
    }

    /// Acquire the lock for `key`, waiting at most the configured duration.
    pub async fn acquire(&self, key: &str) -> Result<OwnedMutexGuard<()>, ServiceError> {
        self.prune();
        let lock = {
            let entry = self
                .locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };
        timeout(self.wait, lock.lock_owned())
            .await
            .map_err(|_| ServiceError::Busy(format!("cart `{key}` is locked by another request")))
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    // Entries nobody holds or waits on have a strong count of one.
    fn prune(&self) {
        if self.locks.len() < PRUNE_THRESHOLD {
            return;
        }
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
