//! Realm configuration.

/// How registries of reclaimed objects are finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReclaimMode {
    /// Finalize synchronously at the end of each collection.
    #[default]
    Inline,
    /// Hand registries to a dedicated reclamation worker thread.
    Worker,
}

/// Options controlling a [`Realm`][crate::realm::Realm].
#[derive(Debug, Clone)]
pub struct RealmOptions {
    /// Where weak-reference registries are finalized.
    pub reclaim_mode: ReclaimMode,
    /// Number of heap slots reserved up front.
    pub initial_heap_capacity: usize,
}

/// Slots reserved by [`RealmOptions::default`]; enough for the intrinsics plus
/// a handful of user objects.
pub const DEFAULT_HEAP_CAPACITY: usize = 64;

impl RealmOptions {
    /// Returns a copy with the given reclamation mode.
    pub fn with_reclaim_mode(mut self, mode: ReclaimMode) -> Self {
        self.reclaim_mode = mode;
        self
    }

    /// Returns a copy with the given initial heap capacity.
    pub fn with_initial_heap_capacity(mut self, capacity: usize) -> Self {
        self.initial_heap_capacity = capacity;
        self
    }
}

impl Default for RealmOptions {
    fn default() -> Self {
        Self {
            reclaim_mode: ReclaimMode::default(),
            initial_heap_capacity: DEFAULT_HEAP_CAPACITY,
        }
    }
}
