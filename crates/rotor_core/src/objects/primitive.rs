//! Primitive wrapper objects (`new Number(1)`, `Object("abc")`, ...).
//!
//! String wrappers are exotic: each UTF-16 code unit appears as a read-only,
//! enumerable, non-configurable index property, and `length` as a read-only,
//! non-enumerable one. These virtual properties come before the ordinary
//! ones in enumeration order.

use crate::error::{RotorError, RotorResult, reject};
use crate::gc::heap::ObjectId;
use crate::objects::class::ObjectClass;
use crate::objects::heap_object::ObjectImpl;
use crate::objects::js_object::{BaseObject, accessor_target, is_compatible};
use crate::objects::property::{
    Property, PropertyAttributes, PropertyDescriptor, PropertyKey, PropertySlot,
};
use crate::objects::value::JsValue;

/// An object wrapping a primitive value.
pub struct PrimitiveObject {
    base: BaseObject,
    value: JsValue,
    /// UTF-16 code units of a wrapped string; empty otherwise.
    units: Vec<u16>,
}

/// Class tag for the wrapper of `value`.
pub fn wrapper_class(value: &JsValue) -> ObjectClass {
    match value {
        JsValue::Boolean(_) => ObjectClass::Boolean,
        JsValue::Smi(_) | JsValue::HeapNumber(_) => ObjectClass::Number,
        JsValue::String(_) => ObjectClass::String,
        JsValue::Symbol(_) => ObjectClass::Symbol,
        JsValue::BigInt(_) => ObjectClass::BigInt,
        JsValue::Undefined | JsValue::Null | JsValue::Object(_) => ObjectClass::Object,
    }
}

impl PrimitiveObject {
    /// Wraps `value` with the given prototype.
    pub fn new(value: JsValue, prototype: Option<ObjectId>) -> Self {
        let units = match &value {
            JsValue::String(s) => s.encode_utf16().collect(),
            _ => Vec::new(),
        };
        Self {
            base: BaseObject::new(wrapper_class(&value), prototype),
            value,
            units,
        }
    }

    /// The wrapped primitive.
    pub fn value(&self) -> &JsValue {
        &self.value
    }

    fn is_string(&self) -> bool {
        matches!(self.value, JsValue::String(_))
    }

    /// Parses `name` as a canonical index into the wrapped string.
    fn string_index(&self, name: &str) -> Option<usize> {
        if !self.is_string()
            || name.is_empty()
            || !name.bytes().all(|b| b.is_ascii_digit())
            || (name.len() > 1 && name.starts_with('0'))
        {
            return None;
        }
        let idx: usize = name.parse().ok()?;
        (idx < self.units.len()).then_some(idx)
    }

    /// The virtual property for `key`, if it has one.
    fn virtual_property(&self, key: &PropertyKey) -> Option<PropertySlot> {
        let name = key.as_str()?;
        if !self.is_string() {
            return None;
        }
        if name == "length" {
            return Some(PropertySlot::data(
                JsValue::number(self.units.len() as f64),
                PropertyAttributes::empty(),
            ));
        }
        let idx = self.string_index(name)?;
        Some(PropertySlot::data(
            JsValue::String(String::from_utf16_lossy(&self.units[idx..=idx])),
            PropertyAttributes::ENUMERABLE,
        ))
    }
}

impl ObjectImpl for PrimitiveObject {
    fn base(&self) -> &BaseObject {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseObject {
        &mut self.base
    }

    fn get_own_property(&self, key: &PropertyKey) -> Option<Property> {
        match self.virtual_property(key) {
            Some(slot) => Some(Property::Slot(slot)),
            None => self.base.get_own_property(key).cloned(),
        }
    }

    fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.virtual_property(key).is_some() || self.base.has_own_property(key)
    }

    fn define_own_property(
        &mut self,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> RotorResult<bool> {
        let Some(existing) = self.virtual_property(key) else {
            return self.base.define_own_property(key, desc, throw);
        };
        let getter = accessor_target(key, "Getter", desc.getter.as_ref())?;
        let setter = accessor_target(key, "Setter", desc.setter.as_ref())?;
        if is_compatible(&existing, desc, getter, setter) {
            Ok(true)
        } else {
            reject(
                throw,
                RotorError::NonConfigurable(format!("Cannot redefine property: {key}")),
            )
        }
    }

    fn delete(&mut self, key: &PropertyKey, throw: bool) -> RotorResult<bool> {
        if self.virtual_property(key).is_some() {
            return reject(
                throw,
                RotorError::NonConfigurable(format!(
                    "Cannot delete property '{key}' of {}",
                    self.base.describe()
                )),
            );
        }
        self.base.delete(key, throw)
    }

    fn own_property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        if self.is_string() {
            names.extend((0..self.units.len()).map(|i| i.to_string()));
            names.push("length".to_string());
        }
        names.extend(self.base.own_property_names());
        names
    }

    fn primitive_value(&self) -> Option<&JsValue> {
        Some(&self.value)
    }
}
