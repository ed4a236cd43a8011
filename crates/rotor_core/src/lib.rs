//! `rotor_core`: the object model of the Rotor JavaScript engine.
//!
//! # Crate layout
//!
//! - [`objects`]: values, properties, the per-kind object contract and the
//!   property protocol (get / put / define / delete / enumerate).
//! - [`weak`]: weak-reference registries and the `WeakMap` / `WeakSet`
//!   kinds built on them.
//! - [`gc`]: the object arena, root handles, the mark-sweep collector and
//!   the registry reclaimer.
//! - [`realm`]: the runtime instance tying everything together.
//!
//! ```
//! use rotor_core::{JsValue, PropertyKey, Realm};
//!
//! let mut realm = Realm::new();
//! let obj = realm.new_object();
//! realm.put(obj, &PropertyKey::from("x"), JsValue::Smi(1), true)?;
//! assert_eq!(realm.get(obj, &PropertyKey::from("x"))?, Some(JsValue::Smi(1)));
//! # Ok::<(), rotor_core::RotorError>(())
//! ```

/// Realm configuration.
pub mod config;
/// Error types.
pub mod error;
/// Object arena, roots, collection and reclamation.
pub mod gc;
/// JavaScript values and object kinds.
pub mod objects;
/// The runtime instance.
pub mod realm;
/// Weak-reference registries and weak collections.
pub mod weak;

pub use config::{RealmOptions, ReclaimMode};
pub use error::{RotorError, RotorResult};
pub use gc::handle::Persistent;
pub use gc::heap::ObjectId;
pub use objects::enumerate::{PropIterItem, PropertyIter};
pub use objects::property::{PropertyAttributes, PropertyDescriptor, PropertyKey};
pub use objects::protocol::PrimitiveHint;
pub use objects::value::{JsValue, Symbol};
pub use realm::{GcStats, Intrinsics, Realm};
pub use weak::weak_map::WeakMap;
pub use weak::weak_set::WeakSet;
