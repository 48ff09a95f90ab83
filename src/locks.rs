//! Per-record async locks.
//!
//! An operation locks every record it is going to touch before loading it. Keys are always acquired in sorted order,
//! so two operations can't deadlock each other.
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::OwnedMutexGuard;
use tracing::trace;

const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockKey {
    Company(String),
    Customer(String),
    Item(String),
    Maintenance(String),
    /// The serial number namespace. Held by whoever introduces serials into the inventory.
    Serials,
}

impl Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockKey::Company(id) => write!(f, "company:{id}"),
            LockKey::Customer(id) => write!(f, "customer:{id}"),
            LockKey::Item(id) => write!(f, "item:{id}"),
            LockKey::Maintenance(id) => write!(f, "maintenance:{id}"),
            LockKey::Serials => write!(f, "serials"),
        }
    }
}

/// Guards of a set of keys. Everything is released on drop.
#[derive(Debug)]
pub struct LockSet {
    keys:    Vec<LockKey>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl LockSet {
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }

    pub fn covers(&self, key: &LockKey) -> bool {
        self.keys.binary_search(key).is_ok()
    }

    pub fn covers_all<'a>(&self, keys: impl IntoIterator<Item = &'a LockKey>) -> bool {
        keys.into_iter().all(|k| self.covers(k))
    }
}

#[derive(Debug, Default)]
pub struct LockTable {
    locks: parking_lot::Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until all keys are locked.
    pub async fn acquire(&self, keys: impl IntoIterator<Item = LockKey>) -> LockSet {
        let mut keys: Vec<LockKey> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> = {
            let mut locks = self.locks.lock();
            if locks.len() > PRUNE_THRESHOLD {
                // Only the table itself references idle mutexes.
                locks.retain(|_, m| Arc::strong_count(m) > 1);
            }
            keys.iter().map(|k| locks.entry(k.clone()).or_default().clone()).collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }
        trace!("locked {}", keys.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "));

        LockSet { keys, _guards: guards }
    }

    /// Number of keys the table currently tracks.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
