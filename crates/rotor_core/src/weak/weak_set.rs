//! `WeakSet`: an object set that does not keep its members alive.

use std::sync::Arc;

use crate::error::{RotorError, RotorResult};
use crate::gc::heap::ObjectId;
use crate::objects::class::ObjectClass;
use crate::objects::heap_object::ObjectImpl;
use crate::objects::js_function::arg;
use crate::objects::js_object::BaseObject;
use crate::objects::property::PropertyKey;
use crate::objects::value::JsValue;
use crate::realm::Realm;
use crate::weak::registry::WeakCollection;
use crate::weak::store::WeakStore;
use crate::weak::{CollectionIntrinsics, array_like, require_key};

/// The heap representation of a `WeakSet`.
pub struct WeakSetObject {
    base: BaseObject,
    store: Arc<WeakStore<()>>,
}

impl WeakSetObject {
    /// An empty set with the given prototype.
    pub fn new(prototype: Option<ObjectId>) -> Self {
        Self {
            base: BaseObject::new(ObjectClass::WeakSet, prototype),
            store: Arc::new(WeakStore::new()),
        }
    }

    /// The membership storage.
    pub fn store(&self) -> &Arc<WeakStore<()>> {
        &self.store
    }
}

impl Drop for WeakSetObject {
    fn drop(&mut self) {
        self.store.clear();
    }
}

impl ObjectImpl for WeakSetObject {
    fn base(&self) -> &BaseObject {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseObject {
        &mut self.base
    }
}

/// A handle to a live `WeakSet` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeakSet(ObjectId);

impl WeakSet {
    /// Allocates an empty set inheriting from `WeakSet.prototype`.
    pub fn new(realm: &mut Realm) -> Self {
        let proto = realm.intrinsics().weak_set_prototype;
        Self(realm.alloc_object(Box::new(WeakSetObject::new(Some(proto)))))
    }

    /// Returns a handle if `obj` is a live `WeakSet`.
    pub fn from_object(realm: &Realm, obj: ObjectId) -> Option<Self> {
        realm
            .heap()
            .try_get(obj)?
            .is::<WeakSetObject>()
            .then_some(Self(obj))
    }

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

    fn store(self, realm: &Realm) -> RotorResult<Arc<WeakStore<()>>> {
        realm
            .heap()
            .get(self.0)?
            .downcast_ref::<WeakSetObject>()
            .map(|set| Arc::clone(&set.store))
            .ok_or(RotorError::InvalidHandle)
    }

    /// Adds `value` to the set.
    pub fn add(self, realm: &mut Realm, value: ObjectId) -> RotorResult<()> {
        let store = self.store(realm)?;
        let refs = realm.heap_mut().get_mut(value)?.weak_refs_mut();
        store.insert(refs.token(), ());
        let coll: Arc<dyn WeakCollection> = store;
        refs.add(&coll);
        Ok(())
    }

    /// Returns `true` if `value` is a member.
    pub fn has(self, realm: &Realm, value: ObjectId) -> RotorResult<bool> {
        let store = self.store(realm)?;
        Ok(realm
            .heap()
            .try_get(value)
            .and_then(|obj| obj.weak_refs())
            .is_some_and(|refs| store.contains(refs.token())))
    }

    /// Removes `value` from the set.
    pub fn delete(self, realm: &mut Realm, value: ObjectId) -> RotorResult<bool> {
        let store = self.store(realm)?;
        let Some(obj) = realm.heap_mut().try_get_mut(value) else {
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

    /// Number of members that have not been reclaimed.
    pub fn len(self, realm: &Realm) -> RotorResult<usize> {
        Ok(self.store(realm)?.len())
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(self, realm: &Realm) -> RotorResult<bool> {
        Ok(self.store(realm)?.is_empty())
    }

    /// `new WeakSet(iterable)`.
    pub fn construct(realm: &mut Realm, iterable: Option<&JsValue>) -> RotorResult<Self> {
        let proto = realm.intrinsics().weak_set_prototype;
        Self::construct_with_prototype(realm, proto, iterable)
    }

    /// `new WeakSet(iterable)` for a subclass whose instances inherit from
    /// `prototype`. Items of the array-like `iterable` are added in order,
    /// through the built-in adder or through an overridden `add`.
    pub fn construct_with_prototype(
        realm: &mut Realm,
        prototype: ObjectId,
        iterable: Option<&JsValue>,
    ) -> RotorResult<Self> {
        let set = Self(realm.alloc_object(Box::new(WeakSetObject::new(Some(prototype)))));
        let Some(iterable) = iterable.filter(|v| !v.is_nullish()) else {
            return Ok(set);
        };

        let items = array_like(realm, iterable)?;
        let adder = realm.get_value(set.0, &PropertyKey::from("add"))?;
        let fast = adder == JsValue::Object(realm.intrinsics().weak_set_adder);
        if !fast && !realm.is_callable(&adder) {
            return Err(RotorError::TypeError(
                "WeakSet.prototype.add is not a function".to_string(),
            ));
        }
        let this = JsValue::Object(set.0);

        items.for_each(realm, |realm, item| {
            if fast {
                let value = require_key(&item, "weak set")?;
                set.add(realm, value)
            } else {
                realm.call(&adder, &this, &[item]).map(|_| ())
            }
        })?;
        Ok(set)
    }
}

/// Installs `WeakSet.prototype` and the `WeakSet` constructor.
pub(crate) fn install(realm: &mut Realm) -> CollectionIntrinsics {
    let proto = realm.new_object();

    let adder = realm.install_method(proto, "add", 1, |realm, this, args| {
        let set = WeakSet::from_receiver(realm, this, "WeakSet.prototype.add")?;
        let value = require_key(&arg(args, 0), "weak set")?;
        set.add(realm, value)?;
        Ok(this.clone())
    });
    realm.install_method(proto, "delete", 1, |realm, this, args| {
        let set = WeakSet::from_receiver(realm, this, "WeakSet.prototype.delete")?;
        let deleted = match arg(args, 0) {
            JsValue::Object(value) => set.delete(realm, value)?,
            _ => false,
        };
        Ok(JsValue::Boolean(deleted))
    });
    realm.install_method(proto, "has", 1, |realm, this, args| {
        let set = WeakSet::from_receiver(realm, this, "WeakSet.prototype.has")?;
        let found = match arg(args, 0) {
            JsValue::Object(value) => set.has(realm, value)?,
            _ => false,
        };
        Ok(JsValue::Boolean(found))
    });

    let constructor = realm.new_native_constructor("WeakSet", 0, |realm, new_target, args| {
        let default = realm.intrinsics().weak_set_prototype;
        let proto = realm.get_prototype_from_constructor(new_target, default)?;
        let set = WeakSet::construct_with_prototype(realm, proto, args.first())?;
        Ok(JsValue::Object(set.id()))
    });
    realm.link_constructor(constructor, proto);
    realm.init_to_string_tag(proto, "WeakSet");

    CollectionIntrinsics {
        prototype: proto,
        constructor,
        adder,
    }
}
