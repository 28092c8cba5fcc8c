//! # Resource Lock Registry
//!
//! This module defines the [`ResourceLockRegistry`], a table of mutual-exclusion locks keyed
//! by resource identity (for the bookshop, a book id).
//!
//! ## Reference Counting
//!
//! Locks are created lazily on the first `acquire` for a key. Every caller that holds *or is
//! waiting for* a key's lock counts as a user of that entry:
//!
//! 1. `acquire` bumps the use count **before** it starts waiting.
//! 2. Dropping the [`LockHandle`] releases the mutex and then gives the count back.
//! 3. When the count reaches zero the entry is removed from the table.
//!
//! Because the count is raised before waiting, an entry can never be removed while another
//! task is about to lock it. Two callers for the same key therefore always contend on the
//! same mutex, and the table only holds keys that are currently in use.
//!
//! ```rust
//! use order_engine::ResourceLockRegistry;
//!
//! #[tokio::main]
//! async fn main() {
//!     let locks = ResourceLockRegistry::<u32>::new();
//!
//!     let handle = locks.acquire(7).await;
//!     assert_eq!(locks.len(), 1);
//!
//!     drop(handle);
//!     assert!(locks.is_empty());
//! }
//! ```

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as ResourceMutex, OwnedMutexGuard};
use tracing::trace;

struct Slot {
    lock: Arc<ResourceMutex<()>>,
    users: usize,
}

type Slots<K> = Mutex<HashMap<K, Slot>>;

/// Table of per-key locks shared by every task of an engine instance.
///
/// Cloning is cheap and all clones share the same table.
pub struct ResourceLockRegistry<K> {
    slots: Arc<Slots<K>>,
}

impl<K> Clone for ResourceLockRegistry<K> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K> Default for ResourceLockRegistry<K>
where
    K: Eq + Hash + Clone + Display + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ResourceLockRegistry<K>
where
    K: Eq + Hash + Clone + Display + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Waits for exclusive access to `key`.
    ///
    /// Callers with different keys never wait on each other. The returned handle releases
    /// the lock when dropped, on every exit path.
    pub async fn acquire(&self, key: K) -> LockHandle<K> {
        let lock = {
            let mut slots = lock_slots(&self.slots);
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                lock: Arc::new(ResourceMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            Arc::clone(&slot.lock)
        };

        // Give the count back if this future is dropped before the lock is granted.
        let lease = Lease {
            key,
            slots: Arc::clone(&self.slots),
        };
        let guard = lock.lock_owned().await;
        trace!(key = %lease.key, "Lock acquired");

        LockHandle {
            _guard: guard,
            lease,
        }
    }

    /// Forgets the lock for `key` if nobody holds or awaits it.
    ///
    /// Returns `true` when an entry was removed. An entry in use is left alone, so calling
    /// this can never let two holders of the same key run unsynchronized.
    pub fn evict(&self, key: &K) -> bool {
        let mut slots = lock_slots(&self.slots);
        match slots.get(key) {
            Some(slot) if slot.users == 0 => {
                slots.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        lock_slots(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Debug> Debug for ResourceLockRegistry<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = lock_slots(&self.slots);
        f.debug_struct("ResourceLockRegistry")
            .field("keys", &slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn lock_slots<K>(slots: &Slots<K>) -> MutexGuard<'_, HashMap<K, Slot>> {
    // The table is only touched in short non-panicking sections.
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One registered use of a key. Dropping it decrements the use count.
struct Lease<K: Eq + Hash> {
    key: K,
    slots: Arc<Slots<K>>,
}

impl<K: Eq + Hash> Drop for Lease<K> {
    fn drop(&mut self) {
        let mut slots = lock_slots(&self.slots);
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Exclusive access to one resource key.
///
/// Field order matters: the mutex guard is released before the lease gives back its count.
pub struct LockHandle<K: Eq + Hash> {
    _guard: OwnedMutexGuard<()>,
    lease: Lease<K>,
}

impl<K: Eq + Hash> LockHandle<K> {
    pub fn key(&self) -> &K {
        &self.lease.key
    }
}

impl<K: Eq + Hash + Debug> Debug for LockHandle<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockHandle")
            .field("key", &self.lease.key)
            .finish()
    }
}
