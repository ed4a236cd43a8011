//! The [`HeapObject`] cell and the per-kind [`ObjectImpl`] contract.

use std::any::Any;

use crate::error::RotorResult;
use crate::gc::heap::ObjectId;
use crate::gc::trace::{Trace, Tracer};
use crate::objects::class::ObjectClass;
use crate::objects::js_function::NativeFn;
use crate::objects::js_object::BaseObject;
use crate::objects::property::{Property, PropertyDescriptor, PropertyKey};
use crate::objects::value::{JsValue, Symbol};
use crate::weak::registry::WeakRefs;

/// Behaviour every object kind provides.
///
/// A kind embeds a [`BaseObject`] and exposes it through `base` /
/// `base_mut`; every other method defaults to the ordinary behaviour on that
/// storage. Exotic kinds override the own-property methods, callable kinds
/// override [`call_handler`][Self::call_handler], and kinds holding handles
/// outside their properties override [`trace`][Self::trace].
pub trait ObjectImpl: Any {
    /// The embedded common storage.
    fn base(&self) -> &BaseObject;

    /// Mutable access to the embedded common storage.
    fn base_mut(&mut self) -> &mut BaseObject;

    /// Class tag.
    fn class(&self) -> ObjectClass {
        self.base().class()
    }

    /// `[[GetOwnProperty]]`.
    fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        self.base().get_own_property(key).cloned()
    }

    /// Returns `true` if `key` is an own property.
    fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.base().has_own_property(key)
    }

    /// `[[DefineOwnProperty]]`.
    fn define_own_property(
        &mut self,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> RotorResult<bool> {
        self.base_mut().define_own_property(key, desc, throw)
    }

    /// `[[Delete]]`.
    fn delete(&mut self, key: &PropertyKey, throw: bool) -> RotorResult<bool> {
        self.base_mut().delete(key, throw)
    }

    /// Own string keys in enumeration order.
    fn own_property_names(&self) -> Vec<String> {
        self.base().own_property_names()
    }

    /// Own symbol keys.
    fn own_symbols(&self) -> Vec<Symbol> {
        self.base().own_symbols()
    }

    /// `[[GetPrototypeOf]]`.
    fn prototype(&self) -> Option<ObjectId> {
        self.base().prototype()
    }

    /// `[[IsExtensible]]`.
    fn is_extensible(&self) -> bool {
        self.base().is_extensible()
    }

    /// `[[PreventExtensions]]`.
    fn prevent_extensions(&mut self) -> bool {
        self.base_mut().prevent_extensions();
        true
    }

    /// The `[[Call]]` behaviour, if this object is callable.
    fn call_handler(&self) -> Option<NativeFn> {
        None
    }

    /// The `[[Construct]]` behaviour, if this object is a constructor.
    fn construct_handler(&self) -> Option<NativeFn> {
        None
    }

    /// The wrapped primitive of a primitive wrapper object.
    fn primitive_value(&self) -> Option<&JsValue> {
        None
    }

    /// Reports every handle this object holds strongly.
    fn trace(&self, tracer: &mut Tracer) {
        self.base().trace(tracer);
    }
}

/// One object in the heap: the kind-specific implementation plus the
/// object's weak-reference registry, created on first use as a weak key.
pub struct HeapObject {
    object: Box<dyn ObjectImpl>,
    weak_refs: Option<Box<WeakRefs>>,
}

impl HeapObject {
    /// Wraps an object implementation.
    pub fn new(object: Box<dyn ObjectImpl>) -> Self {
        Self {
            object,
            weak_refs: None,
        }
    }

    /// The kind-specific implementation.
    #[inline]
    pub fn object(&self) -> &dyn ObjectImpl {
        &*self.object
    }

    /// Mutable access to the kind-specific implementation.
    #[inline]
    pub fn object_mut(&mut self) -> &mut dyn ObjectImpl {
        &mut *self.object
    }

    /// Returns the implementation as `T` if this object is of that kind.
    pub fn downcast_ref<T: ObjectImpl>(&self) -> Option<&T> {
        let any: &dyn Any = &*self.object;
        any.downcast_ref::<T>()
    }

    /// Mutable variant of [`downcast_ref`][Self::downcast_ref].
    pub fn downcast_mut<T: ObjectImpl>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = &mut *self.object;
        any.downcast_mut::<T>()
    }

    /// Returns `true` if this object is of kind `T`.
    pub fn is<T: ObjectImpl>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// The registry, if this object was ever used as a weak key.
    pub fn weak_refs(&self) -> Option<&WeakRefs> {
        self.weak_refs.as_deref()
    }

    /// The registry, created on first call.
    pub fn weak_refs_mut(&mut self) -> &mut WeakRefs {
        self.weak_refs.get_or_insert_with(Box::default)
    }

    /// Detaches the registry, leaving the object without one.
    pub(crate) fn take_weak_refs(&mut self) -> Option<Box<WeakRefs>> {
        self.weak_refs.take()
    }
}

impl Trace for HeapObject {
    fn trace(&self, tracer: &mut Tracer) {
        self.object.trace(tracer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::js_object::OrdinaryObject;
    use crate::objects::primitive::PrimitiveObject;

    fn ordinary() -> HeapObject {
        HeapObject::new(Box::new(OrdinaryObject::new(ObjectClass::Object, None)))
    }

    #[test]
    fn test_downcast_to_own_kind() {
        let mut obj = ordinary();
        assert!(obj.is::<OrdinaryObject>());
        assert!(obj.downcast_ref::<PrimitiveObject>().is_none());
        assert!(obj.downcast_mut::<OrdinaryObject>().is_some());
    }

    #[test]
    fn test_weak_refs_created_lazily() {
        let mut obj = ordinary();
        assert!(obj.weak_refs().is_none());
        let token = obj.weak_refs_mut().token();
        assert_eq!(obj.weak_refs().map(WeakRefs::token), Some(token));
        assert_eq!(obj.weak_refs_mut().token(), token, "token is stable");
        assert!(obj.take_weak_refs().is_some());
        assert!(obj.weak_refs().is_none());
    }

    #[test]
    fn test_default_methods_delegate_to_base() {
        let mut obj = ordinary();
        assert_eq!(obj.object().class(), ObjectClass::Object);
        assert!(obj.object().is_extensible());
        assert!(obj.object_mut().prevent_extensions());
        assert!(!obj.object().is_extensible());
        assert!(obj.object().call_handler().is_none());
        assert!(obj.object().primitive_value().is_none());
    }
}
