//! Weak collections and the per-object registry that lets them forget keys
//! once the key object is reclaimed.
//!
//! - [`registry`] – [`RegistryToken`](registry::RegistryToken) and the
//!   per-object [`WeakRefs`](registry::WeakRefs) list.
//! - [`store`] – [`WeakStore`](store::WeakStore), the lock-guarded storage a
//!   collection shares with its keys' registries.
//! - [`weak_map`] / [`weak_set`] – the `WeakMap` and `WeakSet` object kinds.

/// Per-object weak-reference registry.
pub mod registry;
/// Token-keyed storage shared with the reclamation worker.
pub mod store;
/// The `WeakMap` object kind and its built-ins.
pub mod weak_map;
/// The `WeakSet` object kind and its built-ins.
pub mod weak_set;

use crate::error::{RotorError, RotorResult};
use crate::gc::heap::ObjectId;
use crate::objects::property::PropertyKey;
use crate::objects::value::JsValue;
use crate::realm::Realm;

/// The objects a collection installs into the realm at startup.
pub(crate) struct CollectionIntrinsics {
    pub(crate) prototype: ObjectId,
    pub(crate) constructor: ObjectId,
    /// The original `set` / `add`, compared against to pick the bulk
    /// construction fast path.
    pub(crate) adder: ObjectId,
}

/// Returns `value` as an object key, or the collection's key error.
pub(crate) fn require_key(value: &JsValue, collection: &str) -> RotorResult<ObjectId> {
    match value {
        JsValue::Object(id) => Ok(*id),
        _ => Err(RotorError::TypeError(format!(
            "Invalid value used as {collection} key"
        ))),
    }
}

/// An array-like iterable whose `length` has been read.
pub(crate) struct ArrayLike {
    list: ObjectId,
    len: usize,
}

/// Validates `iterable` and reads its `length` once.
pub(crate) fn array_like(realm: &mut Realm, iterable: &JsValue) -> RotorResult<ArrayLike> {
    let list = realm.to_object(iterable)?;
    let Some(length) = realm.get(list, &PropertyKey::from("length"))? else {
        return Err(RotorError::TypeError(format!(
            "{} is not iterable",
            realm.describe(iterable)
        )));
    };
    let length = realm.to_number(&length)?;
    let len = if length.is_finite() && length > 0.0 {
        length as usize
    } else {
        0
    };
    Ok(ArrayLike { list, len })
}

impl ArrayLike {
    /// Visits the items in index order.
    ///
    /// Each index is read just before `f` runs for it, so effects of earlier
    /// items are visible to later reads.
    pub(crate) fn for_each(
        self,
        realm: &mut Realm,
        mut f: impl FnMut(&mut Realm, JsValue) -> RotorResult<()>,
    ) -> RotorResult<()> {
        for i in 0..self.len {
            let item = realm.get_value(self.list, &PropertyKey::from(i.to_string()))?;
            f(realm, item)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_key() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        assert_eq!(require_key(&JsValue::Object(obj), "weak map").unwrap(), obj);
        let err = require_key(&JsValue::Smi(1), "weak map").unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Invalid value used as weak map key");
    }

    #[test]
    fn test_array_like_reads_in_order() {
        let mut realm = Realm::new();
        let list = realm.new_array_like(&[JsValue::Smi(1), JsValue::Smi(2), JsValue::Smi(3)]);
        let mut seen = Vec::new();
        array_like(&mut realm, &JsValue::Object(list))
            .unwrap()
            .for_each(&mut realm, |_, item| {
                seen.push(item);
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![JsValue::Smi(1), JsValue::Smi(2), JsValue::Smi(3)]);
    }

    #[test]
    fn test_array_like_stops_at_first_error() {
        let mut realm = Realm::new();
        let list = realm.new_array_like(&[JsValue::Smi(1), JsValue::Null, JsValue::Smi(3)]);
        let mut visited = 0;
        let items = array_like(&mut realm, &JsValue::Object(list)).unwrap();
        let res = items.for_each(&mut realm, |_, item| {
            visited += 1;
            require_key(&item, "weak set").map(|_| ())
        });
        assert!(res.is_err());
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_array_like_requires_length() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let err = array_like(&mut realm, &JsValue::Object(obj)).err().unwrap();
        assert_eq!(err.to_string(), "TypeError: [object Object] is not iterable");
        assert!(array_like(&mut realm, &JsValue::Undefined).is_err());
    }
}
