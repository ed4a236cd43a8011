//! `WeakMap`: an object-keyed map that does not keep its keys alive.
//!
//! Entries are stored under the key's [`RegistryToken`], never under the key
//! itself. Setting an entry registers the map's store in the key's
//! [`WeakRefs`](crate::weak::registry::WeakRefs); reclaiming the key removes
//! the entry through that registry. Values are held strongly for as long as
//! the map itself is reachable.

use std::sync::Arc;

use crate::error::{RotorError, RotorResult};
use crate::gc::heap::ObjectId;
use crate::gc::trace::{Trace, Tracer};
use crate::objects::class::ObjectClass;
use crate::objects::heap_object::ObjectImpl;
use crate::objects::js_function::arg;
use crate::objects::js_object::BaseObject;
use crate::objects::property::PropertyKey;
use crate::objects::value::JsValue;
use crate::realm::Realm;
use crate::weak::registry::{RegistryToken, WeakCollection};
use crate::weak::store::WeakStore;
use crate::weak::{CollectionIntrinsics, array_like, require_key};

/// The heap representation of a `WeakMap`.
pub struct WeakMapObject {
    base: BaseObject,
    store: Arc<WeakStore<JsValue>>,
}

impl WeakMapObject {
    /// An empty map with the given prototype.
    pub fn new(prototype: Option<ObjectId>) -> Self {
        Self {
            base: BaseObject::new(ObjectClass::WeakMap, prototype),
            store: Arc::new(WeakStore::new()),
        }
    }

    /// The entry storage.
    pub fn store(&self) -> &Arc<WeakStore<JsValue>> {
        &self.store
    }
}

impl Drop for WeakMapObject {
    fn drop(&mut self) {
        self.store.clear();
    }
}

impl ObjectImpl for WeakMapObject {
    fn base(&self) -> &BaseObject {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseObject {
        &mut self.base
    }

    fn trace(&self, tracer: &mut Tracer) {
        self.base.trace(tracer);
        self.store.for_each_value(|value| value.trace(tracer));
    }
}

fn key_token(realm: &Realm, key: ObjectId) -> Option<RegistryToken> {
    realm.heap().try_get(key)?.weak_refs().map(|refs| refs.token())
}

/// A handle to a live `WeakMap` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeakMap(ObjectId);

impl WeakMap {
    /// Allocates an empty map inheriting from `WeakMap.prototype`.
    pub fn new(realm: &mut Realm) -> Self {
        let proto = realm.intrinsics().weak_map_prototype;
        Self(realm.alloc_object(Box::new(WeakMapObject::new(Some(proto)))))
    }

    /// Returns a handle if `obj` is a live `WeakMap`.
    pub fn from_object(realm: &Realm, obj: ObjectId) -> Option<Self> {
        realm
            .heap()
            .try_get(obj)?
            .is::<WeakMapObject>()
            .then_some(Self(obj))
    }

    /// Resolves the receiver of a `WeakMap.prototype` method.
    fn from_receiver(realm: &Realm, this: &JsValue, method: &'static str) -> RotorResult<Self> {
        this.as_object()
            .and_then(|id| Self::from_object(realm, id))
            .ok_or_else(|| RotorError::IncompatibleReceiver {
                method,
                receiver: realm.describe(this),
            })
    }

    /// The underlying object.
    pub fn id(self) -> ObjectId {
        self.0
    }

    fn store(self, realm: &Realm) -> RotorResult<Arc<WeakStore<JsValue>>> {
        realm
            .heap()
            .get(self.0)?
            .downcast_ref::<WeakMapObject>()
            .map(|map| Arc::clone(&map.store))
            .ok_or(RotorError::InvalidHandle)
    }

    /// Maps `key` to `value`, replacing any previous value.
    pub fn set(self, realm: &mut Realm, key: ObjectId, value: JsValue) -> RotorResult<()> {
        let store = self.store(realm)?;
        let refs = realm.heap_mut().get_mut(key)?.weak_refs_mut();
        store.insert(refs.token(), value);
        let coll: Arc<dyn WeakCollection> = store;
        refs.add(&coll);
        Ok(())
    }

    /// The value for `key`, or `None` if there is no entry.
    pub fn get(self, realm: &Realm, key: ObjectId) -> RotorResult<Option<JsValue>> {
        let store = self.store(realm)?;
        Ok(key_token(realm, key).and_then(|token| store.get(token)))
    }

    /// Returns `true` if `key` has an entry.
    pub fn has(self, realm: &Realm, key: ObjectId) -> RotorResult<bool> {
        let store = self.store(realm)?;
        Ok(key_token(realm, key).is_some_and(|token| store.contains(token)))
    }

    /// Removes the entry for `key`. The map leaves the key's registry only
    /// if an entry existed.
    pub fn delete(self, realm: &mut Realm, key: ObjectId) -> RotorResult<bool> {
        let store = self.store(realm)?;
        let Some(obj) = realm.heap_mut().try_get_mut(key) else {
            return Ok(false);
        };
        if obj.weak_refs().is_none() {
            return Ok(false);
        }
        let refs = obj.weak_refs_mut();
        if store.remove(refs.token()).is_none() {
            return Ok(false);
        }
        let coll: Arc<dyn WeakCollection> = store;
        refs.remove(&coll);
        Ok(true)
    }

    /// Number of entries whose keys have not been reclaimed.
    pub fn len(self, realm: &Realm) -> RotorResult<usize> {
        Ok(self.store(realm)?.len())
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(self, realm: &Realm) -> RotorResult<bool> {
        Ok(self.store(realm)?.is_empty())
    }

    /// `new WeakMap(iterable)`.
    pub fn construct(realm: &mut Realm, iterable: Option<&JsValue>) -> RotorResult<Self> {
        let proto = realm.intrinsics().weak_map_prototype;
        Self::construct_with_prototype(realm, proto, iterable)
    }

    /// `new WeakMap(iterable)` for a subclass whose instances inherit from
    /// `prototype`.
    ///
    /// Each item of the array-like `iterable` is an entry object whose `"0"`
    /// and `"1"` properties are the key and value. When `set` resolves to the
    /// built-in adder, entries are stored directly; otherwise the resolved
    /// `set` is called once per entry. Entries stay committed if a later one
    /// fails.
    pub fn construct_with_prototype(
        realm: &mut Realm,
        prototype: ObjectId,
        iterable: Option<&JsValue>,
    ) -> RotorResult<Self> {
        let map = Self(realm.alloc_object(Box::new(WeakMapObject::new(Some(prototype)))));
        let Some(iterable) = iterable.filter(|v| !v.is_nullish()) else {
            return Ok(map);
        };

        let items = array_like(realm, iterable)?;
        let adder = realm.get_value(map.0, &PropertyKey::from("set"))?;
        let fast = adder == JsValue::Object(realm.intrinsics().weak_map_adder);
        if !fast && !realm.is_callable(&adder) {
            return Err(RotorError::TypeError(
                "WeakMap.prototype.set is not a function".to_string(),
            ));
        }
        let this = JsValue::Object(map.0);

        items.for_each(realm, |realm, item| {
            let entry = realm.to_object(&item)?;
            let key = realm.get_value(entry, &PropertyKey::from("0"))?;
            let value = realm.get_value(entry, &PropertyKey::from("1"))?;
            if fast {
                let key = require_key(&key, "weak map")?;
                map.set(realm, key, value)
            } else {
                realm.call(&adder, &this, &[key, value]).map(|_| ())
            }
        })?;
        Ok(map)
    }
}

/// Installs `WeakMap.prototype` and the `WeakMap` constructor.
pub(crate) fn install(realm: &mut Realm) -> CollectionIntrinsics {
    let proto = realm.new_object();

    let adder = realm.install_method(proto, "set", 2, |realm, this, args| {
        let map = WeakMap::from_receiver(realm, this, "WeakMap.prototype.set")?;
        let key = require_key(&arg(args, 0), "weak map")?;
        map.set(realm, key, arg(args, 1))?;
        Ok(this.clone())
    });
    realm.install_method(proto, "delete", 1, |realm, this, args| {
        let map = WeakMap::from_receiver(realm, this, "WeakMap.prototype.delete")?;
        let deleted = match arg(args, 0) {
            JsValue::Object(key) => map.delete(realm, key)?,
            _ => false,
        };
        Ok(JsValue::Boolean(deleted))
    });
    realm.install_method(proto, "has", 1, |realm, this, args| {
        let map = WeakMap::from_receiver(realm, this, "WeakMap.prototype.has")?;
        let found = match arg(args, 0) {
            JsValue::Object(key) => map.has(realm, key)?,
            _ => false,
        };
        Ok(JsValue::Boolean(found))
    });
    realm.install_method(proto, "get", 1, |realm, this, args| {
        let map = WeakMap::from_receiver(realm, this, "WeakMap.prototype.get")?;
        let value = match arg(args, 0) {
            JsValue::Object(key) => map.get(realm, key)?,
            _ => None,
        };
        Ok(value.unwrap_or_default())
    });

    let constructor = realm.new_native_constructor("WeakMap", 0, |realm, new_target, args| {
        let default = realm.intrinsics().weak_map_prototype;
        let proto = realm.get_prototype_from_constructor(new_target, default)?;
        let map = WeakMap::construct_with_prototype(realm, proto, args.first())?;
        Ok(JsValue::Object(map.id()))
    });
    realm.link_constructor(constructor, proto);
    realm.init_to_string_tag(proto, "WeakMap");

    CollectionIntrinsics {
        prototype: proto,
        constructor,
        adder,
    }
}
