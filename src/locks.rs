//! Per-path mutual exclusion.
//!
//! The processor checks whether a derivative exists and, if not, generates
//! it. Two threads doing that for the same missing path would both generate.
//! [`PathLocks`] serializes the check-then-generate section per cache path:
//! the first thread generates, the rest wait and then see a cache hit.
//!
//! Entries are created on demand and removed when the last holder (or
//! waiter) releases, so the map only ever holds paths in flight.
//!
//! This is in-process only. Across processes the atomic save keeps readers
//! from seeing partial files.

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::collections::HashMap;
use std::sync::Arc;

type Slot = Arc<Mutex<()>>;

#[derive(Debug, Default)]
pub struct PathLocks {
    slots: Mutex<HashMap<String, Slot>>,
}

/// Held while a path is being checked or generated. Releases on drop.
pub struct PathGuard<'a> {
    locks: &'a PathLocks,
    key: String,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no other guard for `key` is alive.
    pub fn acquire(&self, key: &str) -> PathGuard<'_> {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.to_string()).or_default().clone()
        };
        PathGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(slot.lock_arc()),
        }
    }

    /// Number of paths currently held or awaited.
    pub fn in_flight(&self) -> usize {
        self.slots.lock().len()
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.locks.slots.lock();
        drop(self.guard.take());
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}
