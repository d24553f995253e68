// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A registry of live device objects with deferred removal.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, Weak};

/// Reported deletions tolerated before [`StateObjectsRegistry::add`] purges.
pub const DELETED_OBJECTS_TO_PURGE: usize = 32;

/// Tracks device objects by key without keeping them alive.
///
/// Objects report their own destruction through [`report_deleted`](Self::report_deleted),
/// which only pushes the key onto a channel. A destructor must never lock the
/// registry: another thread may be inside [`find`](Self::find) upgrading the
/// very object being destroyed. Stale entries are removed later by
/// [`purge_stale`](Self::purge_stale), by `add` once more than
/// [`DELETED_OBJECTS_TO_PURGE`] deletions are outstanding, or lazily by `find`.
#[derive(Debug)]
pub struct StateObjectsRegistry<K, T: ?Sized> {
    name: &'static str,
    entries: Mutex<HashMap<K, Weak<T>>>,
    deleted_tx: flume::Sender<K>,
    deleted_rx: flume::Receiver<K>,
}

impl<K, T> StateObjectsRegistry<K, T>
where
    K: Hash + Eq + Clone + Send + std::fmt::Debug,
    T: ?Sized,
{
    /// Creates an empty registry. `name` is used in log messages.
    pub fn new(name: &'static str) -> Self {
        let (deleted_tx, deleted_rx) = flume::unbounded();
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
            deleted_tx,
            deleted_rx,
        }
    }

    /// Registers `object` under `key`. An existing live entry is kept.
    pub fn add(&self, key: K, object: &Arc<T>) {
        if self.pending_deletions() > DELETED_OBJECTS_TO_PURGE {
            self.purge_stale();
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(&key) {
            Some(existing) if existing.strong_count() > 0 => {
                log::warn!("{}: object {key:?} is already registered", self.name);
            }
            _ => {
                entries.insert(key, Arc::downgrade(object));
            }
        }
    }

    /// Returns the object registered under `key` if it is still alive.
    pub fn find(&self, key: &K) -> Option<Arc<T>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let found = entries.get(key).and_then(Weak::upgrade);
        if found.is_none() {
            entries.remove(key);
        }
        found
    }

    /// Notes that the object under `key` was destroyed. Never blocks.
    pub fn report_deleted(&self, key: K) {
        if let Err(e) = self.deleted_tx.send(key) {
            log::error!("{}: failed to report a deleted object: {e}", self.name);
        }
    }

    /// Number of deletions reported and not yet purged.
    pub fn pending_deletions(&self) -> usize {
        self.deleted_rx.len()
    }

    /// Removes the entries of reported deletions. Returns how many were removed.
    pub fn purge_stale(&self) -> usize {
        let keys: Vec<K> = self.deleted_rx.try_iter().collect();
        if keys.is_empty() {
            return 0;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut removed = 0;
        for key in keys {
            let is_dead = entries.get(&key).is_some_and(|w| w.strong_count() == 0);
            if is_dead {
                entries.remove(&key);
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("{}: purged {removed} stale object(s)", self.name);
        }
        removed
    }

    /// Number of registered entries, including stale ones.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
