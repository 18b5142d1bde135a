//! Fetch locks that keep concurrent misses from stampeding the store.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use creature_core::types::CreatureId;

use crate::config::LockMode;

/// Hands out the lock a caller must hold while fetching a key from the store.
///
/// Per-key slots are created on demand and dropped again once the last
/// holder or waiter lets go, so the map only ever contains keys with a fetch
/// in progress.
#[derive(Debug)]
pub(crate) struct FetchLocks {
    mode: LockMode,
    global: Arc<Mutex<()>>,
    per_key: DashMap<CreatureId, Arc<Mutex<()>>>,
}

impl FetchLocks {
    pub(crate) fn new(mode: LockMode) -> Self {
        Self {
            mode,
            global: Arc::new(Mutex::new(())),
            per_key: DashMap::new(),
        }
    }

    /// Waits for exclusive fetch rights on `id`.
    pub(crate) async fn acquire(&self, id: CreatureId) -> FetchGuard<'_> {
        let slot = match self.mode {
            LockMode::Global => self.global.clone(),
            LockMode::PerKey => self.per_key.entry(id).or_default().clone(),
        };
        let guard = slot.lock_owned().await;

        FetchGuard {
            locks: self,
            id,
            guard: Some(guard),
        }
    }

    /// Number of keys that currently have a lock slot.
    pub(crate) fn active_slots(&self) -> usize {
        self.per_key.len()
    }

    fn release(&self, id: CreatureId) {
        if self.mode == LockMode::PerKey {
            // The map's own reference is the only one left once nobody waits.
            self.per_key
                .remove_if(&id, |_, slot| Arc::strong_count(slot) == 1);
        }
    }
}

/// Exclusive fetch rights on one key; released on drop.
pub(crate) struct FetchGuard<'a> {
    locks: &'a FetchLocks,
    id: CreatureId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_slot_released_after_use() {
        let locks = FetchLocks::new(LockMode::PerKey);
        {
            let _guard = locks.acquire(1).await;
            assert_eq!(locks.active_slots(), 1);
        }
        assert_eq!(locks.active_slots(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = FetchLocks::new(LockMode::PerKey);
        let _one = locks.acquire(1).await;
        let two = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(two.is_ok());
    }

    #[tokio::test]
    async fn test_same_key_blocks() {
        let locks = FetchLocks::new(LockMode::PerKey);
        let _one = locks.acquire(1).await;
        let again = tokio::time::timeout(Duration::from_millis(50), locks.acquire(1)).await;
        assert!(again.is_err());
    }

    #[tokio::test]
    async fn test_global_mode_blocks_every_key() {
        let locks = FetchLocks::new(LockMode::Global);
        let _one = locks.acquire(1).await;
        let two = tokio::time::timeout(Duration::from_millis(50), locks.acquire(2)).await;
        assert!(two.is_err());
        assert_eq!(locks.active_slots(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiter_keeps_slot_alive() {
        let locks = Arc::new(FetchLocks::new(LockMode::PerKey));
        let first = locks.acquire(7).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(7).await;
            })
        };
        // Let the waiter clone the slot before the holder lets go
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(first);

        waiter.await.unwrap();
        assert_eq!(locks.active_slots(), 0);
    }
}
