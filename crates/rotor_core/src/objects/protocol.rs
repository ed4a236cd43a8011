//! The property protocol: `[[Get]]`, `[[Set]]`, `[[HasProperty]]`,
//! `[[Delete]]`, `[[DefineOwnProperty]]`, the prototype link, and the
//! conversions that may call back into user functions.
//!
//! These live on [`Realm`] because they walk from one object to another and
//! invoke accessors. The per-object half is [`ObjectImpl`].
//!
//! `__proto__` behaves as if `Object.prototype` had an accessor of that
//! name: reading it yields the receiver's prototype and assigning an object
//! or `null` to it sets the prototype. An own `__proto__` property anywhere
//! earlier in the chain shadows it as usual.
//!
//! [`ObjectImpl`]: crate::objects::heap_object::ObjectImpl

use crate::error::{RotorError, RotorResult, reject};
use crate::gc::heap::ObjectId;
use crate::objects::primitive::PrimitiveObject;
use crate::objects::property::{Property, PropertyAttributes, PropertyDescriptor, PropertyKey};
use crate::objects::value::{JsValue, Symbol};
use crate::realm::Realm;

const PROTO_KEY: &str = "__proto__";

fn is_proto_key(key: &PropertyKey) -> bool {
    key.as_str() == Some(PROTO_KEY)
}

/// The preferred type for [`Realm::to_primitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveHint {
    /// No preference (`"default"`).
    Default,
    /// Prefer a number (`"number"`).
    Number,
    /// Prefer a string (`"string"`).
    String,
}

impl PrimitiveHint {
    fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

impl Realm {
    // ── Own properties ───────────────────────────────────────────────────────

    /// `[[GetOwnProperty]]` in storage form.
    pub fn get_own_property(&self, obj: ObjectId, key: &PropertyKey) -> RotorResult<Option<Property>> {
        Ok(self.object(obj)?.get_own_property(key))
    }

    /// Returns `true` if `key` is an own property of `obj`.
    pub fn has_own_property(&self, obj: ObjectId, key: &PropertyKey) -> RotorResult<bool> {
        Ok(self.object(obj)?.has_own_property(key))
    }

    /// `[[GetOwnProperty]]` reified as a complete descriptor. A bare stored
    /// value comes back with every attribute `true`.
    pub fn get_own_property_descriptor(
        &self,
        obj: ObjectId,
        key: &PropertyKey,
    ) -> RotorResult<Option<PropertyDescriptor>> {
        Ok(self
            .get_own_property(obj, key)?
            .map(|prop| PropertyDescriptor::from_slot(&prop.to_slot())))
    }

    /// Own string keys in insertion order.
    pub fn own_property_names(&self, obj: ObjectId) -> RotorResult<Vec<String>> {
        Ok(self.object(obj)?.own_property_names())
    }

    /// Own symbol keys, unordered.
    pub fn own_symbols(&self, obj: ObjectId) -> RotorResult<Vec<Symbol>> {
        Ok(self.object(obj)?.own_symbols())
    }

    // ── Get / Has ────────────────────────────────────────────────────────────

    /// `[[HasProperty]]`: own or inherited.
    pub fn has_property(&self, obj: ObjectId, key: &PropertyKey) -> RotorResult<bool> {
        let mut current = Some(obj);
        while let Some(id) = current {
            let o = self.object(id)?;
            if o.has_own_property(key) {
                return Ok(true);
            }
            if id == self.intrinsics().object_prototype && is_proto_key(key) {
                return Ok(true);
            }
            current = o.prototype();
        }
        Ok(false)
    }

    /// `[[Get]]` with `obj` as the receiver.
    ///
    /// Returns `None` when the property is absent from the whole chain.
    pub fn get(&mut self, obj: ObjectId, key: &PropertyKey) -> RotorResult<Option<JsValue>> {
        self.get_with_receiver(obj, key, &JsValue::Object(obj))
    }

    /// `[[Get]]` starting at `obj`; accessors run with `receiver` as `this`.
    pub fn get_with_receiver(
        &mut self,
        obj: ObjectId,
        key: &PropertyKey,
        receiver: &JsValue,
    ) -> RotorResult<Option<JsValue>> {
        let mut current = Some(obj);
        while let Some(id) = current {
            let (own, next) = {
                let o = self.object(id)?;
                (o.get_own_property(key), o.prototype())
            };
            match own {
                Some(Property::Value(v)) => return Ok(Some(v)),
                Some(Property::Slot(slot)) if !slot.accessor => return Ok(Some(slot.value)),
                Some(Property::Slot(slot)) => {
                    return match slot.getter {
                        Some(getter) => self.call(&JsValue::Object(getter), receiver, &[]).map(Some),
                        None => Ok(Some(JsValue::Undefined)),
                    };
                }
                None => {}
            }
            if id == self.intrinsics().object_prototype && is_proto_key(key) {
                let proto = self.prototype_of_value(receiver)?;
                return Ok(Some(JsValue::from(proto)));
            }
            current = next;
        }
        Ok(None)
    }

    /// `[[Get]]`, mapping an absent property to `undefined`.
    pub fn get_value(&mut self, obj: ObjectId, key: &PropertyKey) -> RotorResult<JsValue> {
        Ok(self.get(obj, key)?.unwrap_or_default())
    }

    fn prototype_of_value(&self, value: &JsValue) -> RotorResult<Option<ObjectId>> {
        match value {
            JsValue::Object(id) => self.get_prototype_of(*id),
            JsValue::Undefined | JsValue::Null => Err(RotorError::TypeError(
                "Cannot convert undefined or null to object".to_string(),
            )),
            other => Ok(Some(self.intrinsics().wrapper_prototype(other))),
        }
    }

    // ── Put ──────────────────────────────────────────────────────────────────

    /// `[[Set]]` with `obj` as the receiver.
    ///
    /// An own data property is overwritten unless read-only; an own or
    /// inherited accessor has its setter called; an inherited read-only data
    /// property blocks the assignment. Otherwise a new own property is created
    /// if `obj` is extensible. Rejections follow `throw`; errors raised by a
    /// setter or by a `__proto__` assignment always propagate.
    pub fn put(
        &mut self,
        obj: ObjectId,
        key: &PropertyKey,
        value: JsValue,
        throw: bool,
    ) -> RotorResult<bool> {
        let (own, extensible, proto) = {
            let o = self.object(obj)?;
            (o.get_own_property(key), o.is_extensible(), o.prototype())
        };

        if let Some(prop) = own {
            if prop.is_accessor() {
                return self.invoke_setter(obj, key, &prop, value, throw);
            }
            if !prop.is_writable() {
                return reject(
                    throw,
                    RotorError::ReadOnly(format!("Cannot assign to read only property '{key}'")),
                );
            }
            let desc = PropertyDescriptor::default().with_value(value);
            return self.object_mut(obj)?.define_own_property(key, &desc, throw);
        }

        if obj == self.intrinsics().object_prototype && is_proto_key(key) {
            return self.put_proto(obj, value);
        }

        let mut current = proto;
        while let Some(id) = current {
            let (inherited, next) = {
                let o = self.object(id)?;
                (o.get_own_property(key), o.prototype())
            };
            if let Some(prop) = inherited {
                if prop.is_accessor() {
                    return self.invoke_setter(obj, key, &prop, value, throw);
                }
                if !prop.is_writable() {
                    return reject(
                        throw,
                        RotorError::ReadOnly(format!(
                            "Cannot assign to read only property '{key}'"
                        )),
                    );
                }
                break;
            }
            if id == self.intrinsics().object_prototype && is_proto_key(key) {
                return self.put_proto(obj, value);
            }
            current = next;
        }

        if !extensible {
            return reject(
                throw,
                RotorError::NotExtensible(format!(
                    "Cannot add property {key}, object is not extensible"
                )),
            );
        }
        let desc = PropertyDescriptor::data(value, PropertyAttributes::all());
        self.object_mut(obj)?.define_own_property(key, &desc, throw)
    }

    /// Assignment through the `__proto__` accessor of `Object.prototype`.
    /// Values other than objects and `null` are ignored.
    fn put_proto(&mut self, obj: ObjectId, value: JsValue) -> RotorResult<bool> {
        match value {
            JsValue::Object(p) => self.set_prototype_of(obj, Some(p), true)?,
            JsValue::Null => self.set_prototype_of(obj, None, true)?,
            _ => true,
        };
        Ok(true)
    }

    fn invoke_setter(
        &mut self,
        receiver: ObjectId,
        key: &PropertyKey,
        prop: &Property,
        value: JsValue,
        throw: bool,
    ) -> RotorResult<bool> {
        let setter = match prop {
            Property::Slot(slot) => slot.setter,
            Property::Value(_) => None,
        };
        match setter {
            Some(setter) => {
                self.call(&JsValue::Object(setter), &JsValue::Object(receiver), &[value])?;
                Ok(true)
            }
            None => {
                let target = self.describe(&JsValue::Object(receiver));
                reject(
                    throw,
                    RotorError::ReadOnly(format!(
                        "Cannot set property {key} of {target} which has only a getter"
                    )),
                )
            }
        }
    }

    /// Defines an own data property with explicit attributes, raising on
    /// failure. A property with every attribute set is stored as a bare
    /// value.
    pub fn put_prop(
        &mut self,
        obj: ObjectId,
        key: &PropertyKey,
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> RotorResult<()> {
        let attrs = PropertyAttributes::from_flags(writable, enumerable, configurable);
        self.define_own_property(obj, key, &PropertyDescriptor::data(value, attrs), true)?;
        Ok(())
    }

    /// ECMAScript §7.3.5 **CreateDataProperty**.
    pub fn create_data_property(
        &mut self,
        obj: ObjectId,
        key: &PropertyKey,
        value: JsValue,
    ) -> RotorResult<bool> {
        let desc = PropertyDescriptor::data(value, PropertyAttributes::all());
        self.define_own_property(obj, key, &desc, false)
    }

    // ── Define / Delete ──────────────────────────────────────────────────────

    /// `[[DefineOwnProperty]]`.
    ///
    /// A getter or setter that is neither `undefined` nor callable is a
    /// `TypeError` regardless of `throw`.
    pub fn define_own_property(
        &mut self,
        obj: ObjectId,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> RotorResult<bool> {
        for (which, field) in [("Getter", &desc.getter), ("Setter", &desc.setter)] {
            if let Some(f) = field
                && !f.is_undefined()
                && !self.is_callable(f)
            {
                return Err(RotorError::TypeError(format!(
                    "{which} must be a function: {}",
                    self.describe(f)
                )));
            }
        }
        self.object_mut(obj)?.define_own_property(key, desc, throw)
    }

    /// `[[Delete]]`. Deleting an absent property succeeds.
    pub fn delete(&mut self, obj: ObjectId, key: &PropertyKey, throw: bool) -> RotorResult<bool> {
        self.object_mut(obj)?.delete(key, throw)
    }

    // ── Prototype link and extensibility ────────────────────────────────────

    /// `[[GetPrototypeOf]]`.
    pub fn get_prototype_of(&self, obj: ObjectId) -> RotorResult<Option<ObjectId>> {
        Ok(self.object(obj)?.prototype())
    }

    /// `[[SetPrototypeOf]]`.
    ///
    /// Setting the current prototype again always succeeds. Otherwise a
    /// non-extensible object, or a chain from `proto` that leads back to
    /// `obj`, is rejected.
    pub fn set_prototype_of(
        &mut self,
        obj: ObjectId,
        proto: Option<ObjectId>,
        throw: bool,
    ) -> RotorResult<bool> {
        let o = self.object(obj)?;
        if o.prototype() == proto {
            return Ok(true);
        }
        if !o.is_extensible() {
            let target = o.base().describe();
            return reject(
                throw,
                RotorError::NotExtensible(format!("{target} is not extensible")),
            );
        }
        let mut current = proto;
        while let Some(id) = current {
            if id == obj {
                return reject(throw, RotorError::CyclicPrototype);
            }
            current = self.object(id)?.prototype();
        }
        self.object_mut(obj)?.base_mut().set_prototype(proto);
        Ok(true)
    }

    /// `[[IsExtensible]]`.
    pub fn is_extensible(&self, obj: ObjectId) -> RotorResult<bool> {
        Ok(self.object(obj)?.is_extensible())
    }

    /// `[[PreventExtensions]]`.
    pub fn prevent_extensions(&mut self, obj: ObjectId) -> RotorResult<bool> {
        Ok(self.object_mut(obj)?.prevent_extensions())
    }

    // ── Call / Construct ────────────────────────────────────────────────────

    /// ECMAScript §7.2.3 **IsCallable**.
    pub fn is_callable(&self, value: &JsValue) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap().try_get(id))
            .is_some_and(|o| o.object().call_handler().is_some())
    }

    /// ECMAScript §7.2.4 **IsConstructor**.
    pub fn is_constructor(&self, value: &JsValue) -> bool {
        value
            .as_object()
            .and_then(|id| self.heap().try_get(id))
            .is_some_and(|o| o.object().construct_handler().is_some())
    }

    /// ECMAScript §7.3.14 **Call**.
    pub fn call(&mut self, f: &JsValue, this: &JsValue, args: &[JsValue]) -> RotorResult<JsValue> {
        let handler = match f {
            JsValue::Object(id) => self.object(*id)?.call_handler(),
            _ => None,
        };
        match handler {
            Some(handler) => handler(self, this, args),
            None => Err(RotorError::TypeError(format!(
                "{} is not a function",
                self.describe(f)
            ))),
        }
    }

    /// ECMAScript §7.3.15 **Construct** with `new.target` = `f`.
    pub fn construct(&mut self, f: &JsValue, args: &[JsValue]) -> RotorResult<JsValue> {
        self.construct_with_new_target(f, args, f)
    }

    /// ECMAScript §7.3.15 **Construct** with an explicit `new.target`.
    pub fn construct_with_new_target(
        &mut self,
        f: &JsValue,
        args: &[JsValue],
        new_target: &JsValue,
    ) -> RotorResult<JsValue> {
        let handler = match f {
            JsValue::Object(id) => self.object(*id)?.construct_handler(),
            _ => None,
        };
        match handler {
            Some(handler) => handler(self, new_target, args),
            None => Err(RotorError::TypeError(format!(
                "{} is not a constructor",
                self.describe(f)
            ))),
        }
    }

    /// ECMAScript §10.1.14 **GetPrototypeFromConstructor**: the object in
    /// `new_target.prototype`, or `default` when that is not an object.
    pub fn get_prototype_from_constructor(
        &mut self,
        new_target: &JsValue,
        default: ObjectId,
    ) -> RotorResult<ObjectId> {
        if let JsValue::Object(id) = new_target
            && let Some(JsValue::Object(proto)) = self.get(*id, &PropertyKey::from("prototype"))?
        {
            return Ok(proto);
        }
        Ok(default)
    }

    /// ECMAScript §7.3.11 **GetMethod**: `None` for `undefined` / `null`,
    /// a `TypeError` for any other non-callable value.
    pub fn get_method(&mut self, value: &JsValue, key: &PropertyKey) -> RotorResult<Option<JsValue>> {
        let start = match value {
            JsValue::Object(id) => *id,
            JsValue::Undefined | JsValue::Null => {
                return Err(RotorError::TypeError(format!(
                    "Cannot read property '{key}' of {}",
                    self.describe(value)
                )));
            }
            other => self.intrinsics().wrapper_prototype(other),
        };
        match self.get_with_receiver(start, key, value)? {
            None | Some(JsValue::Undefined) | Some(JsValue::Null) => Ok(None),
            Some(f) if self.is_callable(&f) => Ok(Some(f)),
            Some(f) => Err(RotorError::TypeError(format!(
                "{} is not a function",
                self.describe(&f)
            ))),
        }
    }

    // ── Conversions ──────────────────────────────────────────────────────────

    /// ECMAScript §7.1.1 **ToPrimitive**.
    ///
    /// `@@toPrimitive` wins if present; otherwise `valueOf` and `toString`
    /// are tried in hint order (`toString` first for [`PrimitiveHint::String`]).
    pub fn to_primitive(&mut self, value: &JsValue, hint: PrimitiveHint) -> RotorResult<JsValue> {
        let JsValue::Object(obj) = value else {
            return Ok(value.clone());
        };
        let obj = *obj;

        let exotic_key = PropertyKey::from(&self.intrinsics().to_primitive);
        if let Some(exotic) = self.get_method(value, &exotic_key)? {
            let result = self.call(&exotic, value, &[JsValue::from(hint.as_str())])?;
            if result.is_object() {
                return Err(RotorError::TypeError(
                    "Cannot convert object to primitive value".to_string(),
                ));
            }
            return Ok(result);
        }

        let order = if hint == PrimitiveHint::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for name in order {
            if let Some(method) = self.get(obj, &PropertyKey::from(name))?
                && self.is_callable(&method)
            {
                let result = self.call(&method, value, &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(RotorError::TypeError(format!(
            "Could not convert {} to primitive",
            self.describe(value)
        )))
    }

    /// ECMAScript §7.1.18 **ToObject**: primitives get a fresh wrapper.
    pub fn to_object(&mut self, value: &JsValue) -> RotorResult<ObjectId> {
        match value {
            JsValue::Object(id) => Ok(*id),
            JsValue::Undefined | JsValue::Null => Err(RotorError::TypeError(
                "Cannot convert undefined or null to object".to_string(),
            )),
            other => {
                let proto = self.intrinsics().wrapper_prototype(other);
                Ok(self.alloc_object(Box::new(PrimitiveObject::new(other.clone(), Some(proto)))))
            }
        }
    }

    /// ECMAScript §7.1.19 **ToPropertyKey**.
    pub fn to_property_key(&mut self, value: &JsValue) -> RotorResult<PropertyKey> {
        match self.to_primitive(value, PrimitiveHint::String)? {
            JsValue::Symbol(sym) => Ok(PropertyKey::Symbol(sym)),
            other => Ok(PropertyKey::String(other.to_js_string()?)),
        }
    }

    /// ECMAScript §7.1.4 **ToNumber**, going through `ToPrimitive` for
    /// objects.
    pub fn to_number(&mut self, value: &JsValue) -> RotorResult<f64> {
        self.to_primitive(value, PrimitiveHint::Number)?.to_number()
    }

    // ── instanceof ───────────────────────────────────────────────────────────

    /// ECMAScript §13.10.2 **InstanceofOperator**.
    pub fn instance_of(&mut self, value: &JsValue, ctor: &JsValue) -> RotorResult<bool> {
        if !ctor.is_object() {
            return Err(RotorError::TypeError(format!(
                "Expecting a function in instanceof check, but got {}",
                self.describe(ctor)
            )));
        }
        let key = PropertyKey::from(&self.intrinsics().has_instance);
        if let Some(method) = self.get_method(ctor, &key)? {
            return Ok(self.call(&method, ctor, &[value.clone()])?.to_boolean());
        }
        if !self.is_callable(ctor) {
            return Err(RotorError::TypeError(format!(
                "Expecting a function in instanceof check, but got {}",
                self.describe(ctor)
            )));
        }
        self.ordinary_has_instance(ctor, value)
    }

    /// ECMAScript §7.3.21 **OrdinaryHasInstance**.
    pub fn ordinary_has_instance(&mut self, ctor: &JsValue, value: &JsValue) -> RotorResult<bool> {
        let (Some(ctor_id), &JsValue::Object(mut current)) = (ctor.as_object(), value) else {
            return Ok(false);
        };
        let proto = match self.get(ctor_id, &PropertyKey::from("prototype"))? {
            Some(JsValue::Object(proto)) => proto,
            other => {
                return Err(RotorError::TypeError(format!(
                    "Function has non-object prototype '{}' in instanceof check",
                    self.describe(&other.unwrap_or_default())
                )));
            }
        };
        while let Some(next) = self.get_prototype_of(current)? {
            if next == proto {
                return Ok(true);
            }
            current = next;
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from(s)
    }

    fn frozen(value: JsValue) -> PropertyDescriptor {
        PropertyDescriptor::data(value, PropertyAttributes::empty())
    }

    /// A getter returning its receiver.
    fn this_getter(realm: &mut Realm) -> ObjectId {
        realm.new_native_function("get", 0, |_, this, _| Ok(this.clone()))
    }

    // ── Get ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_get_missing_property_is_absent() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        assert_eq!(realm.get(obj, &key("nope")).unwrap(), None);
        assert_eq!(realm.get_value(obj, &key("nope")).unwrap(), JsValue::Undefined);
    }

    #[test]
    fn test_get_traverses_prototype_chain() {
        let mut realm = Realm::new();
        let grand = realm.new_object();
        realm.put(grand, &key("x"), JsValue::Smi(1), true).unwrap();
        let parent = realm.new_object_with_prototype(Some(grand));
        let child = realm.new_object_with_prototype(Some(parent));
        assert_eq!(realm.get(child, &key("x")).unwrap(), Some(JsValue::Smi(1)));
        assert!(realm.has_property(child, &key("x")).unwrap());
        assert!(!realm.has_own_property(child, &key("x")).unwrap());
    }

    #[test]
    fn test_own_property_shadows_prototype() {
        let mut realm = Realm::new();
        let proto = realm.new_object();
        realm.put(proto, &key("x"), JsValue::Smi(1), true).unwrap();
        let child = realm.new_object_with_prototype(Some(proto));
        realm.put(child, &key("x"), JsValue::Smi(2), true).unwrap();
        assert_eq!(realm.get(child, &key("x")).unwrap(), Some(JsValue::Smi(2)));
        assert_eq!(realm.get(proto, &key("x")).unwrap(), Some(JsValue::Smi(1)));
    }

    #[test]
    fn test_inherited_getter_sees_original_receiver() {
        let mut realm = Realm::new();
        let getter = this_getter(&mut realm);
        let proto = realm.new_object();
        realm
            .define_own_property(
                proto,
                &key("me"),
                &PropertyDescriptor::accessor(Some(getter), None, PropertyAttributes::all()),
                true,
            )
            .unwrap();
        let child = realm.new_object_with_prototype(Some(proto));
        assert_eq!(
            realm.get(child, &key("me")).unwrap(),
            Some(JsValue::Object(child))
        );
    }

    #[test]
    fn test_accessor_without_getter_reads_undefined() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm
            .define_own_property(
                obj,
                &key("x"),
                &PropertyDescriptor::accessor(None, None, PropertyAttributes::CONFIGURABLE),
                true,
            )
            .unwrap();
        assert_eq!(realm.get(obj, &key("x")).unwrap(), Some(JsValue::Undefined));
    }

    // ── Put ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_put_creates_permissive_property() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        assert!(realm.put(obj, &key("x"), JsValue::Smi(1), true).unwrap());
        let desc = realm.get_own_property_descriptor(obj, &key("x")).unwrap().unwrap();
        assert_eq!(desc, PropertyDescriptor::data(JsValue::Smi(1), PropertyAttributes::all()));
    }

    #[test]
    fn test_put_readonly_own_property() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm
            .define_own_property(obj, &key("x"), &frozen(JsValue::Smi(1)), true)
            .unwrap();
        assert!(!realm.put(obj, &key("x"), JsValue::Smi(2), false).unwrap());
        let err = realm.put(obj, &key("x"), JsValue::Smi(2), true).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Cannot assign to read only property 'x'");
        assert_eq!(realm.get(obj, &key("x")).unwrap(), Some(JsValue::Smi(1)));
    }

    #[test]
    fn test_put_blocked_by_inherited_readonly() {
        let mut realm = Realm::new();
        let proto = realm.new_object();
        realm
            .define_own_property(proto, &key("x"), &frozen(JsValue::Smi(1)), true)
            .unwrap();
        let child = realm.new_object_with_prototype(Some(proto));
        assert!(!realm.put(child, &key("x"), JsValue::Smi(2), false).unwrap());
        assert!(!realm.has_own_property(child, &key("x")).unwrap());
        assert!(matches!(
            realm.put(child, &key("x"), JsValue::Smi(2), true),
            Err(RotorError::ReadOnly(_))
        ));
    }

    #[test]
    fn test_put_calls_inherited_setter_with_receiver() {
        let mut realm = Realm::new();
        let seen = Rc::new(Cell::new(None));
        let seen_in = Rc::clone(&seen);
        let setter = realm.new_native_function("set", 1, move |_, this, args| {
            seen_in.set(Some((this.as_object(), args.first().cloned())));
            Ok(JsValue::Undefined)
        });
        let proto = realm.new_object();
        realm
            .define_own_property(
                proto,
                &key("x"),
                &PropertyDescriptor::accessor(None, Some(setter), PropertyAttributes::all()),
                true,
            )
            .unwrap();
        let child = realm.new_object_with_prototype(Some(proto));
        assert!(realm.put(child, &key("x"), JsValue::Smi(5), true).unwrap());
        assert_eq!(seen.take(), Some((Some(child), Some(JsValue::Smi(5)))));
        assert!(!realm.has_own_property(child, &key("x")).unwrap());
    }

    #[test]
    fn test_put_getter_only_accessor_rejected() {
        let mut realm = Realm::new();
        let getter = this_getter(&mut realm);
        let obj = realm.new_object();
        realm
            .define_own_property(
                obj,
                &key("x"),
                &PropertyDescriptor::accessor(Some(getter), None, PropertyAttributes::all()),
                true,
            )
            .unwrap();
        assert!(!realm.put(obj, &key("x"), JsValue::Smi(1), false).unwrap());
        assert!(realm.put(obj, &key("x"), JsValue::Smi(1), true).is_err());
    }

    #[test]
    fn test_put_on_non_extensible_rejected() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm.put(obj, &key("old"), JsValue::Smi(1), true).unwrap();
        realm.prevent_extensions(obj).unwrap();
        assert!(!realm.is_extensible(obj).unwrap());
        assert!(!realm.put(obj, &key("new"), JsValue::Smi(1), false).unwrap());
        assert!(matches!(
            realm.put(obj, &key("new"), JsValue::Smi(1), true),
            Err(RotorError::NotExtensible(_))
        ));
        assert!(realm.put(obj, &key("old"), JsValue::Smi(2), true).unwrap());
        assert_eq!(realm.get(obj, &key("old")).unwrap(), Some(JsValue::Smi(2)));
    }

    #[test]
    fn test_put_existing_keeps_attributes() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm
            .put_prop(obj, &key("x"), JsValue::Smi(1), true, false, true)
            .unwrap();
        realm.put(obj, &key("x"), JsValue::Smi(2), true).unwrap();
        let desc = realm.get_own_property_descriptor(obj, &key("x")).unwrap().unwrap();
        assert_eq!(desc.value, Some(JsValue::Smi(2)));
        assert_eq!(desc.enumerable, Some(false));
    }

    #[test]
    fn test_put_symbol_key() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let sym = realm.new_symbol(Some("s"));
        realm.put(obj, &PropertyKey::from(&sym), JsValue::Smi(1), true).unwrap();
        assert_eq!(
            realm.get(obj, &PropertyKey::from(&sym)).unwrap(),
            Some(JsValue::Smi(1))
        );
        assert_eq!(realm.own_symbols(obj).unwrap(), vec![sym]);
        assert!(realm.own_property_names(obj).unwrap().is_empty());
    }

    // ── __proto__ ─────────────────────────────────────────────────────────────

    #[test]
    fn test_proto_key_reads_prototype() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let proto = realm.intrinsics().object_prototype;
        assert_eq!(
            realm.get(obj, &key("__proto__")).unwrap(),
            Some(JsValue::Object(proto))
        );
        assert!(!realm.has_own_property(obj, &key("__proto__")).unwrap());
        let bare = realm.new_object_with_prototype(None);
        assert_eq!(realm.get(bare, &key("__proto__")).unwrap(), None);
    }

    #[test]
    fn test_proto_key_write_sets_prototype() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let other = realm.new_object();
        realm.put(obj, &key("__proto__"), JsValue::Object(other), true).unwrap();
        assert_eq!(realm.get_prototype_of(obj).unwrap(), Some(other));
        assert!(!realm.has_own_property(obj, &key("__proto__")).unwrap());

        realm.put(obj, &key("__proto__"), JsValue::Smi(1), true).unwrap();
        assert_eq!(realm.get_prototype_of(obj).unwrap(), Some(other), "non-objects are ignored");
    }

    #[test]
    fn test_proto_key_write_cycle_always_raises() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let child = realm.new_object_with_prototype(Some(obj));
        let err = realm
            .put(obj, &key("__proto__"), JsValue::Object(child), false)
            .unwrap_err();
        assert!(matches!(err, RotorError::CyclicPrototype));
    }

    #[test]
    fn test_proto_key_write_on_object_prototype_creates_no_own_property() {
        let mut realm = Realm::new();
        let op = realm.intrinsics().object_prototype;
        let obj = realm.new_object();

        let err = realm
            .put(op, &key("__proto__"), JsValue::Object(obj), true)
            .unwrap_err();
        assert!(matches!(err, RotorError::CyclicPrototype));
        assert!(realm.put(op, &key("__proto__"), JsValue::Smi(1), true).unwrap());
        assert!(realm.put(op, &key("__proto__"), JsValue::Null, true).unwrap());

        assert!(!realm.has_own_property(op, &key("__proto__")).unwrap());
        assert_eq!(realm.get_prototype_of(op).unwrap(), None);
        assert_eq!(
            realm.get(obj, &key("__proto__")).unwrap(),
            Some(JsValue::Object(op))
        );
    }

    #[test]
    fn test_own_proto_data_property_shadows() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm
            .create_data_property(obj, &key("__proto__"), JsValue::Smi(3))
            .unwrap();
        assert_eq!(realm.get(obj, &key("__proto__")).unwrap(), Some(JsValue::Smi(3)));
        assert_eq!(
            realm.get_prototype_of(obj).unwrap(),
            Some(realm.intrinsics().object_prototype)
        );
    }

    // ── Define / Delete ───────────────────────────────────────────────────────

    #[test]
    fn test_define_rejects_non_callable_getter() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let not_fn = realm.new_object();
        let err = realm
            .define_own_property(
                obj,
                &key("x"),
                &PropertyDescriptor::default().with_getter(JsValue::Object(not_fn)),
                false,
            )
            .unwrap_err();
        assert!(matches!(err, RotorError::TypeError(_)));
    }

    #[test]
    fn test_define_readonly_idempotence() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm
            .define_own_property(obj, &key("x"), &frozen(JsValue::from("v")), true)
            .unwrap();
        assert!(
            realm
                .define_own_property(obj, &key("x"), &frozen(JsValue::from("v")), true)
                .unwrap()
        );
        assert!(
            !realm
                .define_own_property(obj, &key("x"), &frozen(JsValue::from("w")), false)
                .unwrap()
        );
    }

    #[test]
    fn test_delete() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm.put(obj, &key("x"), JsValue::Smi(1), true).unwrap();
        assert!(realm.delete(obj, &key("x"), true).unwrap());
        assert!(realm.delete(obj, &key("x"), true).unwrap());
        realm
            .put_prop(obj, &key("y"), JsValue::Smi(1), true, true, false)
            .unwrap();
        assert!(!realm.delete(obj, &key("y"), false).unwrap());
        assert!(matches!(
            realm.delete(obj, &key("y"), true),
            Err(RotorError::NonConfigurable(_))
        ));
    }

    #[test]
    fn test_create_data_property_on_frozen_fails_quietly() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm.prevent_extensions(obj).unwrap();
        assert!(!realm.create_data_property(obj, &key("x"), JsValue::Null).unwrap());
    }

    // ── Prototype link ────────────────────────────────────────────────────────

    #[test]
    fn test_set_prototype_to_self_is_cyclic() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        assert!(!realm.set_prototype_of(obj, Some(obj), false).unwrap());
        assert!(matches!(
            realm.set_prototype_of(obj, Some(obj), true),
            Err(RotorError::CyclicPrototype)
        ));
    }

    #[test]
    fn test_set_prototype_long_cycle_rejected() {
        let mut realm = Realm::new();
        let c = realm.new_object_with_prototype(None);
        let b = realm.new_object_with_prototype(Some(c));
        let a = realm.new_object_with_prototype(Some(b));
        assert!(matches!(
            realm.set_prototype_of(c, Some(a), true),
            Err(RotorError::CyclicPrototype)
        ));
        assert_eq!(realm.get_prototype_of(c).unwrap(), None);
    }

    #[test]
    fn test_set_same_prototype_on_non_extensible_succeeds() {
        let mut realm = Realm::new();
        let proto = realm.new_object();
        let obj = realm.new_object_with_prototype(Some(proto));
        realm.prevent_extensions(obj).unwrap();
        assert!(realm.set_prototype_of(obj, Some(proto), true).unwrap());
        let err = realm.set_prototype_of(obj, None, true).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: [object Object] is not extensible");
    }

    #[test]
    fn test_set_prototype_to_null() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        assert!(realm.set_prototype_of(obj, None, true).unwrap());
        assert_eq!(realm.get(obj, &key("toString")).unwrap(), None);
    }

    // ── Call / Construct ──────────────────────────────────────────────────────

    #[test]
    fn test_call_non_callable() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let err = realm
            .call(&JsValue::Object(obj), &JsValue::Undefined, &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "TypeError: [object Object] is not a function");
        assert!(!realm.is_callable(&JsValue::Smi(1)));
        assert!(!realm.is_constructor(&JsValue::Object(obj)));
    }

    #[test]
    fn test_get_method() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm.put(obj, &key("notfn"), JsValue::Smi(1), true).unwrap();
        let v = JsValue::Object(obj);
        assert!(realm.get_method(&v, &key("toString")).unwrap().is_some());
        assert!(realm.get_method(&v, &key("missing")).unwrap().is_none());
        assert!(realm.get_method(&v, &key("notfn")).is_err());
        assert!(realm.get_method(&JsValue::Null, &key("x")).is_err());
        assert!(realm.get_method(&JsValue::Smi(1), &key("valueOf")).unwrap().is_some());
    }

    #[test]
    fn test_prototype_from_constructor() {
        let mut realm = Realm::new();
        let fallback = realm.new_object();
        let proto = realm.new_object();
        let ctor = realm.new_native_constructor("C", 0, |_, _, _| Ok(JsValue::Undefined));
        assert_eq!(
            realm
                .get_prototype_from_constructor(&JsValue::Object(ctor), fallback)
                .unwrap(),
            fallback
        );
        realm.put(ctor, &key("prototype"), JsValue::Object(proto), true).unwrap();
        assert_eq!(
            realm
                .get_prototype_from_constructor(&JsValue::Object(ctor), fallback)
                .unwrap(),
            proto
        );
    }

    // ── Conversions ───────────────────────────────────────────────────────────

    #[test]
    fn test_to_primitive_uses_value_of_then_to_string() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let value_of = realm.new_native_function("valueOf", 0, |_, _, _| Ok(JsValue::Smi(42)));
        realm.put(obj, &key("valueOf"), JsValue::Object(value_of), true).unwrap();
        let v = JsValue::Object(obj);
        assert_eq!(realm.to_primitive(&v, PrimitiveHint::Default).unwrap(), JsValue::Smi(42));
        assert_eq!(realm.to_number(&v).unwrap(), 42.0);
        assert_eq!(
            realm.to_primitive(&v, PrimitiveHint::String).unwrap(),
            JsValue::from("[object Object]")
        );
    }

    #[test]
    fn test_to_primitive_exotic_hook() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let hook = realm.new_native_function("[Symbol.toPrimitive]", 1, |_, _, args| {
            Ok(args.first().cloned().unwrap_or_default())
        });
        let sym = realm.intrinsics().to_primitive.clone();
        realm.put(obj, &PropertyKey::from(&sym), JsValue::Object(hook), true).unwrap();
        let v = JsValue::Object(obj);
        assert_eq!(
            realm.to_primitive(&v, PrimitiveHint::Number).unwrap(),
            JsValue::from("number")
        );
        assert_eq!(
            realm.to_primitive(&v, PrimitiveHint::Default).unwrap(),
            JsValue::from("default")
        );
    }

    #[test]
    fn test_to_primitive_fails_without_methods() {
        let mut realm = Realm::new();
        let obj = realm.new_object_with_prototype(None);
        let err = realm
            .to_primitive(&JsValue::Object(obj), PrimitiveHint::Default)
            .unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Could not convert [object Object] to primitive");
    }

    #[test]
    fn test_to_object() {
        let mut realm = Realm::new();
        assert!(realm.to_object(&JsValue::Undefined).is_err());
        let wrapped = realm.to_object(&JsValue::from("ab")).unwrap();
        assert_eq!(
            realm.get_prototype_of(wrapped).unwrap(),
            Some(realm.intrinsics().string_prototype)
        );
        assert_eq!(realm.get(wrapped, &key("length")).unwrap(), Some(JsValue::Smi(2)));
        assert_eq!(realm.to_js_string(&JsValue::Object(wrapped)).unwrap(), "ab");
    }

    #[test]
    fn test_to_property_key() {
        let mut realm = Realm::new();
        assert_eq!(realm.to_property_key(&JsValue::Smi(3)).unwrap(), key("3"));
        let sym = realm.new_symbol(None);
        assert_eq!(
            realm.to_property_key(&JsValue::Symbol(sym.clone())).unwrap(),
            PropertyKey::Symbol(sym)
        );
        let obj = realm.new_object();
        assert_eq!(
            realm.to_property_key(&JsValue::Object(obj)).unwrap(),
            key("[object Object]")
        );
    }

    // ── instanceof ────────────────────────────────────────────────────────────

    #[test]
    fn test_instance_of_walks_chain() {
        let mut realm = Realm::new();
        let ctor = realm.new_native_constructor("C", 0, |_, _, _| Ok(JsValue::Undefined));
        let proto = realm.new_object();
        realm.put(ctor, &key("prototype"), JsValue::Object(proto), true).unwrap();
        let mid = realm.new_object_with_prototype(Some(proto));
        let inst = realm.new_object_with_prototype(Some(mid));
        let other = realm.new_object();
        let c = JsValue::Object(ctor);
        assert!(realm.instance_of(&JsValue::Object(inst), &c).unwrap());
        assert!(!realm.instance_of(&JsValue::Object(other), &c).unwrap());
        assert!(!realm.instance_of(&JsValue::Smi(1), &c).unwrap());
    }

    #[test]
    fn test_instance_of_has_instance_hook() {
        let mut realm = Realm::new();
        let target = realm.new_object();
        let hook = realm.new_native_function("[Symbol.hasInstance]", 1, |_, _, _| {
            Ok(JsValue::Boolean(true))
        });
        let sym = realm.intrinsics().has_instance.clone();
        realm.put(target, &PropertyKey::from(&sym), JsValue::Object(hook), true).unwrap();
        assert!(realm.instance_of(&JsValue::Smi(1), &JsValue::Object(target)).unwrap());
    }

    #[test]
    fn test_instance_of_requires_function() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let err = realm
            .instance_of(&JsValue::Undefined, &JsValue::Object(obj))
            .unwrap_err();
        assert!(err.to_string().contains("Expecting a function in instanceof check"));
        assert!(realm.instance_of(&JsValue::Undefined, &JsValue::Smi(1)).is_err());
    }

    #[test]
    fn test_instance_of_non_object_prototype() {
        let mut realm = Realm::new();
        let f = realm.new_native_function("f", 0, |_, _, _| Ok(JsValue::Undefined));
        let obj = realm.new_object();
        let err = realm
            .instance_of(&JsValue::Object(obj), &JsValue::Object(f))
            .unwrap_err();
        assert!(err.to_string().contains("non-object prototype"));
    }
}
