//! Lock-guarded storage shared by a weak collection and its keys' registries.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::weak::registry::{RegistryToken, WeakCollection};

/// Token-keyed storage of a weak collection.
///
/// The realm reaches a store through the collection object; the reclamation
/// worker reaches it through the registries of reclaimed keys. Every access
/// takes the store's own lock.
pub struct WeakStore<V> {
    entries: Mutex<HashMap<RegistryToken, V>>,
}

impl<V> WeakStore<V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stores `value` under `token`, returning the previous value.
    pub fn insert(&self, token: RegistryToken, value: V) -> Option<V> {
        self.entries.lock().insert(token, value)
    }

    /// Removes and returns the value under `token`.
    pub fn remove(&self, token: RegistryToken) -> Option<V> {
        self.entries.lock().remove(&token)
    }

    /// Returns `true` if `token` has an entry.
    pub fn contains(&self, token: RegistryToken) -> bool {
        self.entries.lock().contains_key(&token)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Calls `f` on every stored value while holding the lock.
    pub fn for_each_value(&self, mut f: impl FnMut(&V)) {
        for value in self.entries.lock().values() {
            f(value);
        }
    }
}

impl<V: Clone> WeakStore<V> {
    /// Returns a copy of the value under `token`.
    pub fn get(&self, token: RegistryToken) -> Option<V> {
        self.entries.lock().get(&token).cloned()
    }
}

impl<V> Default for WeakStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Send> WeakCollection for WeakStore<V> {
    fn remove_by_token(&self, token: RegistryToken) {
        self.entries.lock().remove(&token);
    }
}
