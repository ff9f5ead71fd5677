//! Per-key mutual exclusion for fill sequences.
//! Locks are created on first use and removed once no holder or waiter remains.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Slot>>,
}

struct Slot {
    lock: Arc<AsyncMutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Wait until no other holder owns `key`, then own it until the guard drops.
    /// Dropping the returned future before it resolves releases the registration.
    pub async fn acquire(&self, key: &K) -> KeyGuard<'_, K> {
        let registration = self.register(key);
        let guard = Arc::clone(&registration.lock).lock_owned().await;
        KeyGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of keys with a live lock (held or awaited).
    pub fn in_flight(&self) -> usize {
        self.slots.lock().len()
    }

    fn register(&self, key: &K) -> Registration<'_, K> {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
            lock: Arc::new(AsyncMutex::new(())),
            users: 0,
        });
        slot.users += 1;
        Registration {
            owner: self,
            key: key.clone(),
            lock: Arc::clone(&slot.lock),
        }
    }
}

/// One counted user of a key's slot; the last one out removes the slot.
struct Registration<'a, K: Eq + Hash + Clone> {
    owner: &'a KeyedLocks<K>,
    key: K,
    lock: Arc<AsyncMutex<()>>,
}

impl<K: Eq + Hash + Clone> Drop for Registration<'_, K> {
    fn drop(&mut self) {
        let mut slots = self.owner.slots.lock();
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

/// Fields drop in order: the mutex is released before the slot is checked.
pub struct KeyGuard<'a, K: Eq + Hash + Clone> {
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<'a, K>,
}
