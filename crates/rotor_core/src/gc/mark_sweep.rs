//! Mark-sweep collector for the object arena.
//!
//! # Phases
//!
//! 1. **Mark** – Starting from explicit roots, a grey-stack walk marks every
//!    object reachable through [`Trace`]. Stale handles are skipped.
//!
//! 2. **Sweep** – Every live slot that was *not* marked is freed. The
//!    weak-reference registry of each freed object is detached and returned
//!    so the caller can hand it to the reclaimer; the object itself is
//!    dropped once all registries have been collected.
//!
//! The collector borrows the [`Heap`] for one cycle and is dropped when the
//! cycle ends.

use tracing::trace;

use crate::gc::heap::{Heap, ObjectId};
use crate::gc::trace::{Trace, Tracer};
use crate::weak::registry::WeakRefs;

/// What one sweep freed.
#[derive(Default)]
pub struct SweepOutcome {
    /// Number of objects freed.
    pub freed: usize,
    /// Non-empty registries of the freed objects, in slot order.
    pub registries: Vec<Box<WeakRefs>>,
}

/// Performs one mark-sweep cycle over a [`Heap`].
pub struct MarkSweep<'heap> {
    heap: &'heap mut Heap,
    /// Mark bits indexed by slot.
    marks: Vec<bool>,
}

impl<'heap> MarkSweep<'heap> {
    /// Create a collector for `heap` with every mark bit clear.
    pub fn new(heap: &'heap mut Heap) -> Self {
        let marks = vec![false; heap.slot_count()];
        Self { heap, marks }
    }

    /// Return `true` if `id` has been marked in this cycle.
    pub fn is_marked(&self, id: ObjectId) -> bool {
        self.marks.get(id.index() as usize).copied().unwrap_or(false)
    }

    /// **Mark phase**: mark every object reachable from `roots`.
    pub fn mark(&mut self, roots: impl IntoIterator<Item = ObjectId>) {
        let mut tracer = Tracer::new();
        for root in roots {
            tracer.mark(root);
        }
        while let Some(id) = tracer.pop() {
            let Some(object) = self.heap.try_get(id) else {
                continue;
            };
            let bit = &mut self.marks[id.index() as usize];
            if *bit {
                continue;
            }
            *bit = true;
            object.trace(&mut tracer);
        }
    }

    /// **Sweep phase**: free every unmarked object.
    ///
    /// Registries are detached from all dead objects before any of them is
    /// dropped.
    pub fn sweep(self) -> SweepOutcome {
        let Self { heap, marks } = self;
        let dead: Vec<ObjectId> = heap
            .ids()
            .filter(|id| !marks[id.index() as usize])
            .collect();

        let mut outcome = SweepOutcome::default();
        let mut graveyard = Vec::with_capacity(dead.len());
        for id in dead {
            let Some(mut object) = heap.free(id) else {
                continue;
            };
            if let Some(refs) = object.take_weak_refs()
                && !refs.is_empty()
            {
                outcome.registries.push(refs);
            }
            graveyard.push(object);
            outcome.freed += 1;
        }
        drop(graveyard);

        trace!(
            freed = outcome.freed,
            registries = outcome.registries.len(),
            "sweep complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gc::heap::HeapObject;
    use crate::objects::class::ObjectClass;
    use crate::objects::js_object::OrdinaryObject;
    use crate::objects::property::{Property, PropertyKey};
    use crate::objects::value::JsValue;
    use crate::weak::registry::{RegistryToken, WeakCollection};

    fn plain(heap: &mut Heap, proto: Option<ObjectId>) -> ObjectId {
        heap.allocate(HeapObject::new(Box::new(OrdinaryObject::new(
            ObjectClass::Object,
            proto,
        ))))
    }

    fn link(heap: &mut Heap, from: ObjectId, name: &str, to: ObjectId) {
        heap.get_mut(from)
            .unwrap()
            .object_mut()
            .base_mut()
            .put_own(&PropertyKey::from(name), Property::Value(JsValue::Object(to)));
    }

    struct Nop;

    impl WeakCollection for Nop {
        fn remove_by_token(&self, _token: RegistryToken) {}
    }

    // ── Mark ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_mark_follows_properties_and_prototype() {
        let mut heap = Heap::new();
        let proto = plain(&mut heap, None);
        let child = plain(&mut heap, None);
        let root = plain(&mut heap, Some(proto));
        link(&mut heap, root, "c", child);
        let orphan = plain(&mut heap, None);

        let mut gc = MarkSweep::new(&mut heap);
        gc.mark([root]);
        assert!(gc.is_marked(root));
        assert!(gc.is_marked(proto));
        assert!(gc.is_marked(child));
        assert!(!gc.is_marked(orphan));
    }

    #[test]
    fn test_mark_terminates_on_cycles() {
        let mut heap = Heap::new();
        let a = plain(&mut heap, None);
        let b = plain(&mut heap, None);
        link(&mut heap, a, "b", b);
        link(&mut heap, b, "a", a);

        let mut gc = MarkSweep::new(&mut heap);
        gc.mark([a]);
        assert!(gc.is_marked(b));
        assert_eq!(gc.sweep().freed, 0);
    }

    #[test]
    fn test_mark_skips_stale_root() {
        let mut heap = Heap::new();
        let stale = plain(&mut heap, None);
        heap.free(stale);
        let fresh = plain(&mut heap, None);

        let mut gc = MarkSweep::new(&mut heap);
        gc.mark([stale]);
        assert!(!gc.is_marked(fresh), "a stale handle must not mark the slot's new occupant");
    }

    // ── Sweep ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_sweep_frees_unmarked() {
        let mut heap = Heap::new();
        let live = plain(&mut heap, None);
        let dead = plain(&mut heap, None);

        let mut gc = MarkSweep::new(&mut heap);
        gc.mark([live]);
        let outcome = gc.sweep();
        assert_eq!(outcome.freed, 1);
        assert!(outcome.registries.is_empty());
        assert!(heap.contains(live));
        assert!(!heap.contains(dead));
    }

    #[test]
    fn test_sweep_with_no_roots_frees_everything() {
        let mut heap = Heap::new();
        for _ in 0..5 {
            plain(&mut heap, None);
        }
        let outcome = MarkSweep::new(&mut heap).sweep();
        assert_eq!(outcome.freed, 5);
        assert_eq!(heap.live_count(), 0);
    }

    #[test]
    fn test_sweep_returns_non_empty_registries() {
        let mut heap = Heap::new();
        let key = plain(&mut heap, None);
        let bare = plain(&mut heap, None);
        let coll: Arc<dyn WeakCollection> = Arc::new(Nop);
        heap.get_mut(key).unwrap().weak_refs_mut().add(&coll);
        heap.get_mut(bare).unwrap().weak_refs_mut();

        let outcome = MarkSweep::new(&mut heap).sweep();
        assert_eq!(outcome.freed, 2);
        assert_eq!(outcome.registries.len(), 1, "empty registries are not reported");
        assert!(outcome.registries[0].contains(&coll));
    }
}
