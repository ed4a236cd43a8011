//! Per-object weak-reference registry.
//!
//! An object that is used as a key in a weak collection lazily gets a
//! [`WeakRefs`] record. The record carries a [`RegistryToken`], which is what
//! collections actually store (so they never hold the object itself), and
//! the list of collections that currently store that token. When the object
//! is reclaimed, [`WeakRefs::finalize`] tells every listed collection to drop
//! the token.
//!
//! The record is a separate allocation from the object: the collector frees
//! the object, then hands the detached record to the reclaimer, which may
//! finalize it on another thread.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Below this capacity a removal never compacts the collection list.
const COMPACT_MIN_CAPACITY: usize = 16;

/// Stable identity of one object's registry.
///
/// Tokens come from a process-wide counter and are never reused, so a token
/// left behind by a reclaimed object can never match a live key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryToken(u64);

impl RegistryToken {
    pub(crate) fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw token value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for RegistryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistryToken({})", self.0)
    }
}

/// Storage side of a weak collection, as seen by a key's registry.
///
/// `remove_by_token` may run on the reclamation worker while the owning
/// realm keeps using the collection, hence the `Send + Sync` bound.
pub trait WeakCollection: Send + Sync {
    /// Drops whatever is stored under `token`.
    fn remove_by_token(&self, token: RegistryToken);
}

/// The set of weak collections that reference one object.
pub struct WeakRefs {
    token: RegistryToken,
    colls: Vec<Arc<dyn WeakCollection>>,
}

fn same_collection(a: &Arc<dyn WeakCollection>, b: &Arc<dyn WeakCollection>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl WeakRefs {
    /// Creates an empty registry with a fresh token.
    pub fn new() -> Self {
        Self {
            token: RegistryToken::next(),
            colls: Vec::new(),
        }
    }

    /// The token collections store on this object's behalf.
    pub fn token(&self) -> RegistryToken {
        self.token
    }

    /// Number of registered collections.
    pub fn len(&self) -> usize {
        self.colls.len()
    }

    /// Returns `true` if no collection is registered.
    pub fn is_empty(&self) -> bool {
        self.colls.is_empty()
    }

    /// Returns `true` if `coll` is registered.
    pub fn contains(&self, coll: &Arc<dyn WeakCollection>) -> bool {
        self.colls.iter().any(|c| same_collection(c, coll))
    }

    /// Registers `coll`. Adding a collection twice is a no-op.
    pub fn add(&mut self, coll: &Arc<dyn WeakCollection>) {
        if self.contains(coll) {
            return;
        }
        self.colls.push(Arc::clone(coll));
        trace!(token = self.token.0, len = self.colls.len(), "weak ref registered");
    }

    /// Unregisters `coll`.
    ///
    /// A long-lived key that churns through many collections would keep a
    /// large, mostly empty list; once the capacity passes
    /// `COMPACT_MIN_CAPACITY` and exceeds four times the live count the list
    /// is rebuilt. Otherwise the entry is swap-removed.
    pub fn remove(&mut self, coll: &Arc<dyn WeakCollection>) {
        if self.colls.capacity() > COMPACT_MIN_CAPACITY
            && self.colls.capacity() / 4 > self.colls.len()
        {
            let colls: Vec<_> = self
                .colls
                .iter()
                .filter(|c| !same_collection(c, coll))
                .cloned()
                .collect();
            trace!(
                token = self.token.0,
                from = self.colls.capacity(),
                to = colls.capacity(),
                "weak ref list compacted"
            );
            self.colls = colls;
        } else if let Some(pos) = self.colls.iter().position(|c| same_collection(c, coll)) {
            self.colls.swap_remove(pos);
        }
    }

    /// Removes this object's token from every registered collection and
    /// empties the registry.
    pub fn finalize(&mut self) {
        for coll in self.colls.drain(..) {
            coll.remove_by_token(self.token);
        }
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.colls.capacity()
    }
}

impl Default for WeakRefs {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WeakRefs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRefs")
            .field("token", &self.token)
            .field("collections", &self.colls.len())
            .finish()
    }
}
