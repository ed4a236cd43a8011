//! The object arena.
//!
//! Every object lives in a slot of the [`Heap`] and is addressed by an
//! [`ObjectId`]: the slot index plus the slot's generation at allocation
//! time. Freeing a slot bumps its generation, so a handle that outlived its
//! object is detected ([`RotorError::InvalidHandle`]) instead of silently
//! aliasing whatever object reuses the slot.

use std::fmt;

use crate::error::{RotorError, RotorResult};

pub use crate::objects::heap_object::HeapObject;

/// A handle to an object in a [`Heap`].
///
/// `ObjectId` is `Copy` and does not keep the object alive; liveness is
/// decided by the collector from the realm's roots.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    /// Returns the slot index.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the slot generation this handle was issued for.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}v{})", self.index, self.generation)
    }
}

/// One arena slot.
struct Slot {
    generation: u32,
    object: Option<HeapObject>,
}

/// Arena of heap objects with a free list of reusable slots.
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Heap {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty heap with room for `capacity` objects before the slot
    /// table reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Moves `object` into the heap and returns its handle.
    ///
    /// Freed slots are reused before the slot table grows.
    pub fn allocate(&mut self, object: HeapObject) -> ObjectId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectId {
            index,
            generation: 0,
        }
    }

    /// Returns the object behind `id`, or `None` if it has been freed.
    pub fn try_get(&self, id: ObjectId) -> Option<&HeapObject> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    /// Mutable variant of [`try_get`][Self::try_get].
    pub fn try_get_mut(&mut self, id: ObjectId) -> Option<&mut HeapObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    /// Returns the object behind `id`.
    ///
    /// # Errors
    /// [`RotorError::InvalidHandle`] if the object has been freed.
    pub fn get(&self, id: ObjectId) -> RotorResult<&HeapObject> {
        self.try_get(id).ok_or(RotorError::InvalidHandle)
    }

    /// Mutable variant of [`get`][Self::get].
    pub fn get_mut(&mut self, id: ObjectId) -> RotorResult<&mut HeapObject> {
        self.try_get_mut(id).ok_or(RotorError::InvalidHandle)
    }

    /// Returns `true` if `id` refers to a live object.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.try_get(id).is_some()
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of slots, live or free. Mark bitmaps are sized by this.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterates the handles of all live objects in slot order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.object.as_ref().map(|_| ObjectId {
                index: i as u32,
                generation: slot.generation,
            })
        })
    }

    /// Removes the object behind `id` and retires the handle.
    ///
    /// Returns the object so the caller decides when it is dropped; `None`
    /// if `id` was already stale.
    pub(crate) fn free(&mut self, id: ObjectId) -> Option<HeapObject> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(object)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
