use std::cell::RefCell;
use std::rc::Rc;

use crate::gc::heap::ObjectId;

/// Registry of GC roots owned by a [`Realm`][crate::realm::Realm].
///
/// Every [`Persistent`] handle registers its object here so that the
/// collector treats it as a root for as long as the handle lives.
#[derive(Debug, Default)]
pub struct PersistentRoots {
    /// Slot `i` is `Some(id)` while the corresponding `Persistent` is live,
    /// and `None` once it has been dropped.
    roots: Vec<Option<ObjectId>>,
}

impl PersistentRoots {
    /// Create an empty root set.
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    /// Register `id` and return its slot index.
    fn register(&mut self, id: ObjectId) -> usize {
        // Reuse a freed slot when available.
        if let Some(idx) = self.roots.iter().position(|s| s.is_none()) {
            self.roots[idx] = Some(id);
            return idx;
        }
        let idx = self.roots.len();
        self.roots.push(Some(id));
        idx
    }

    /// Clear the slot at `index`, indicating the root is no longer live.
    fn unregister(&mut self, index: usize) {
        if let Some(slot) = self.roots.get_mut(index) {
            *slot = None;
        }
    }

    /// Iterate all live root handles.
    pub fn iter_roots(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.roots.iter().filter_map(|s| *s)
    }
}

/// A GC root handle that keeps an object alive across collections.
///
/// While a `Persistent` is alive its object is held in [`PersistentRoots`].
/// When the `Persistent` is dropped, the root is automatically unregistered
/// and the object becomes collectable once nothing else reaches it.
pub struct Persistent {
    id: ObjectId,
    roots: Rc<RefCell<PersistentRoots>>,
    index: usize,
}

impl Persistent {
    /// Root `id` in `roots`.
    pub(crate) fn new(id: ObjectId, roots: &Rc<RefCell<PersistentRoots>>) -> Self {
        let index = roots.borrow_mut().register(id);
        Self {
            id,
            roots: Rc::clone(roots),
            index,
        }
    }

    /// Return the rooted handle.
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

impl std::fmt::Debug for Persistent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Persistent").field(&self.id).finish()
    }
}

impl Drop for Persistent {
    fn drop(&mut self) {
        self.roots.borrow_mut().unregister(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Realm;

    #[test]
    fn test_persistent_root_is_tracked() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let roots = Rc::new(RefCell::new(PersistentRoots::new()));

        let persistent = Persistent::new(obj, &roots);
        let live: Vec<_> = roots.borrow().iter_roots().collect();
        assert_eq!(live, vec![obj]);
        assert_eq!(persistent.id(), obj);

        drop(persistent);
        assert_eq!(roots.borrow().iter_roots().count(), 0);
    }

    #[test]
    fn test_persistent_roots_reuses_freed_slots() {
        let mut realm = Realm::new();
        let a = realm.new_object();
        let b = realm.new_object();
        let mut roots = PersistentRoots::new();

        let idx1 = roots.register(a);
        roots.unregister(idx1);
        let idx2 = roots.register(b);

        assert_eq!(idx1, idx2);
    }
}
