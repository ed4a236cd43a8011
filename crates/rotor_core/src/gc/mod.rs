/// Persistent roots that keep objects alive across collections.
pub mod handle;
/// Generational object arena.
pub mod heap;
/// Mark-sweep collector over the arena.
pub mod mark_sweep;
/// Finalization of reclaimed objects' weak-reference registries.
pub mod reclaim;
/// Mark-and-trace infrastructure for garbage collection.
pub mod trace;
