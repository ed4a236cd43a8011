//! Property keys, stored properties and property descriptors.
//!
//! A stored [`Property`] is either a bare value, which is equivalent to a data
//! property with every attribute set, or a [`PropertySlot`] carrying explicit
//! attributes and possibly an accessor pair. [`PropertyDescriptor`] is the
//! partial form used as input to `[[DefineOwnProperty]]` and as the output of
//! `[[GetOwnProperty]]`.

use std::fmt;

use bitflags::bitflags;

use crate::gc::heap::ObjectId;
use crate::gc::trace::{Trace, Tracer};
use crate::objects::value::{JsValue, Symbol};

/// A property key: a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// A string-keyed property.
    String(String),
    /// A symbol-keyed property.
    Symbol(Symbol),
}

impl PropertyKey {
    /// Returns the string form if this is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Symbol(_) => None,
        }
    }

    /// Converts the key back into a value.
    pub fn to_value(&self) -> JsValue {
        match self {
            Self::String(s) => JsValue::String(s.clone()),
            Self::Symbol(sym) => JsValue::Symbol(sym.clone()),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Symbol> for PropertyKey {
    fn from(sym: Symbol) -> Self {
        Self::Symbol(sym)
    }
}

impl From<&Symbol> for PropertyKey {
    fn from(sym: &Symbol) -> Self {
        Self::Symbol(sym.clone())
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Symbol(sym) => sym.fmt(f),
        }
    }
}

bitflags! {
    /// ECMAScript property attribute flags (§6.1.7.1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyAttributes: u8 {
        /// `[[Writable]]`: the value may be changed by assignment.
        const WRITABLE = 1 << 0;
        /// `[[Enumerable]]`: the property shows up in enumeration.
        const ENUMERABLE = 1 << 1;
        /// `[[Configurable]]`: the property may be deleted or redefined.
        const CONFIGURABLE = 1 << 2;
    }
}

impl PropertyAttributes {
    /// Builds attributes from three booleans.
    pub fn from_flags(writable: bool, enumerable: bool, configurable: bool) -> Self {
        let mut attrs = Self::empty();
        attrs.set(Self::WRITABLE, writable);
        attrs.set(Self::ENUMERABLE, enumerable);
        attrs.set(Self::CONFIGURABLE, configurable);
        attrs
    }
}

impl Default for PropertyAttributes {
    /// Writable, enumerable and configurable: the attributes of a property
    /// created by ordinary assignment.
    fn default() -> Self {
        Self::all()
    }
}

/// A property with explicit attributes.
///
/// `accessor` is set once a getter or setter has been installed; the
/// `value` and `WRITABLE` bit are meaningless for accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySlot {
    /// Stored value of a data property.
    pub value: JsValue,
    /// Getter of an accessor property; `None` means `undefined`.
    pub getter: Option<ObjectId>,
    /// Setter of an accessor property; `None` means `undefined`.
    pub setter: Option<ObjectId>,
    /// Attribute flags.
    pub attributes: PropertyAttributes,
    /// `true` for accessor properties.
    pub accessor: bool,
}

impl PropertySlot {
    /// A data slot with the given attributes.
    pub fn data(value: JsValue, attributes: PropertyAttributes) -> Self {
        Self {
            value,
            getter: None,
            setter: None,
            attributes,
            accessor: false,
        }
    }
}

/// A stored own property.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// A writable, enumerable, configurable data property.
    Value(JsValue),
    /// A property with explicit attributes.
    Slot(PropertySlot),
}

impl Property {
    /// Normalizes to a slot, expanding a bare value to a fully permissive
    /// data slot.
    pub fn to_slot(&self) -> PropertySlot {
        match self {
            Self::Value(v) => PropertySlot::data(v.clone(), PropertyAttributes::all()),
            Self::Slot(slot) => slot.clone(),
        }
    }

    /// Returns the attribute flags.
    pub fn attributes(&self) -> PropertyAttributes {
        match self {
            Self::Value(_) => PropertyAttributes::all(),
            Self::Slot(slot) => slot.attributes,
        }
    }

    /// Returns `true` if the property is enumerable.
    pub fn is_enumerable(&self) -> bool {
        self.attributes().contains(PropertyAttributes::ENUMERABLE)
    }

    /// Returns `true` if the property is configurable.
    pub fn is_configurable(&self) -> bool {
        self.attributes().contains(PropertyAttributes::CONFIGURABLE)
    }

    /// Returns `true` for accessor properties.
    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Slot(slot) if slot.accessor)
    }

    /// Returns `true` for a data property that may be assigned.
    pub fn is_writable(&self) -> bool {
        match self {
            Self::Value(_) => true,
            Self::Slot(slot) => {
                !slot.accessor && slot.attributes.contains(PropertyAttributes::WRITABLE)
            }
        }
    }

    /// The stored data value; `undefined` for accessors.
    pub fn value(&self) -> &JsValue {
        match self {
            Self::Value(v) => v,
            Self::Slot(slot) => &slot.value,
        }
    }
}

impl Trace for Property {
    fn trace(&self, tracer: &mut Tracer) {
        match self {
            Self::Value(v) => v.trace(tracer),
            Self::Slot(slot) => {
                slot.value.trace(tracer);
                tracer.mark_opt(slot.getter);
                tracer.mark_opt(slot.setter);
            }
        }
    }
}

/// A partial property descriptor (ECMAScript §6.2.6).
///
/// Every field is optional; an absent field leaves the corresponding
/// attribute alone when the descriptor is applied. `getter` and `setter`
/// distinguish "not supplied" (`None`) from "supplied as undefined"
/// (`Some(JsValue::Undefined)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDescriptor {
    /// `[[Value]]`.
    pub value: Option<JsValue>,
    /// `[[Writable]]`.
    pub writable: Option<bool>,
    /// `[[Enumerable]]`.
    pub enumerable: Option<bool>,
    /// `[[Configurable]]`.
    pub configurable: Option<bool>,
    /// `[[Get]]`.
    pub getter: Option<JsValue>,
    /// `[[Set]]`.
    pub setter: Option<JsValue>,
}

impl PropertyDescriptor {
    /// A complete data descriptor.
    pub fn data(value: JsValue, attributes: PropertyAttributes) -> Self {
        Self {
            value: Some(value),
            writable: Some(attributes.contains(PropertyAttributes::WRITABLE)),
            enumerable: Some(attributes.contains(PropertyAttributes::ENUMERABLE)),
            configurable: Some(attributes.contains(PropertyAttributes::CONFIGURABLE)),
            getter: None,
            setter: None,
        }
    }

    /// A complete accessor descriptor. `WRITABLE` in `attributes` is ignored.
    pub fn accessor(
        getter: Option<ObjectId>,
        setter: Option<ObjectId>,
        attributes: PropertyAttributes,
    ) -> Self {
        Self {
            value: None,
            writable: None,
            enumerable: Some(attributes.contains(PropertyAttributes::ENUMERABLE)),
            configurable: Some(attributes.contains(PropertyAttributes::CONFIGURABLE)),
            getter: Some(getter.map_or(JsValue::Undefined, JsValue::Object)),
            setter: Some(setter.map_or(JsValue::Undefined, JsValue::Object)),
        }
    }

    /// Sets `[[Value]]`.
    pub fn with_value(mut self, value: JsValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets `[[Writable]]`.
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    /// Sets `[[Enumerable]]`.
    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    /// Sets `[[Configurable]]`.
    pub fn with_configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    /// Sets `[[Get]]`.
    pub fn with_getter(mut self, getter: JsValue) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Sets `[[Set]]`.
    pub fn with_setter(mut self, setter: JsValue) -> Self {
        self.setter = Some(setter);
        self
    }

    /// ECMAScript §6.2.6.1 **IsAccessorDescriptor**.
    pub fn is_accessor_descriptor(&self) -> bool {
        self.getter.is_some() || self.setter.is_some()
    }

    /// ECMAScript §6.2.6.2 **IsDataDescriptor**.
    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// ECMAScript §6.2.6.3 **IsGenericDescriptor**.
    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    /// Returns `true` for a data descriptor with a value and all three
    /// attributes explicitly `true`; such a property is stored as a bare
    /// value.
    pub fn is_plain_value(&self) -> bool {
        self.value.is_some()
            && self.writable == Some(true)
            && self.enumerable == Some(true)
            && self.configurable == Some(true)
            && !self.is_accessor_descriptor()
    }

    pub(crate) fn from_slot(slot: &PropertySlot) -> Self {
        if slot.accessor {
            Self::accessor(slot.getter, slot.setter, slot.attributes)
        } else {
            Self::data(slot.value.clone(), slot.attributes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── PropertyAttributes ──────────────────────────────────────────────────

    #[test]
    fn test_attributes_default_is_all() {
        assert_eq!(PropertyAttributes::default(), PropertyAttributes::all());
        assert_eq!(
            PropertyAttributes::from_flags(true, false, true),
            PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE
        );
    }

    // ── Property ─────────────────────────────────────────────────────────────

    #[test]
    fn test_bare_value_is_fully_permissive() {
        let p = Property::Value(JsValue::Smi(1));
        assert!(p.is_writable());
        assert!(p.is_enumerable());
        assert!(p.is_configurable());
        assert!(!p.is_accessor());
        assert_eq!(p.to_slot().attributes, PropertyAttributes::all());
    }

    #[test]
    fn test_accessor_slot_is_not_writable() {
        let slot = PropertySlot {
            accessor: true,
            ..PropertySlot::data(JsValue::Undefined, PropertyAttributes::all())
        };
        let p = Property::Slot(slot);
        assert!(p.is_accessor());
        assert!(!p.is_writable());
    }

    // ── PropertyDescriptor ───────────────────────────────────────────────────

    #[test]
    fn test_descriptor_kinds() {
        let generic = PropertyDescriptor::default().with_enumerable(false);
        assert!(generic.is_generic_descriptor());

        let data = PropertyDescriptor::default().with_writable(false);
        assert!(data.is_data_descriptor());
        assert!(!data.is_accessor_descriptor());

        let acc = PropertyDescriptor::default().with_getter(JsValue::Undefined);
        assert!(acc.is_accessor_descriptor());
        assert!(!acc.is_data_descriptor());
    }

    #[test]
    fn test_plain_value_detection() {
        let d = PropertyDescriptor::data(JsValue::Smi(1), PropertyAttributes::all());
        assert!(d.is_plain_value());
        let d = PropertyDescriptor::data(JsValue::Smi(1), PropertyAttributes::WRITABLE);
        assert!(!d.is_plain_value());
        let d = PropertyDescriptor::default().with_value(JsValue::Smi(1));
        assert!(!d.is_plain_value());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(PropertyKey::from("x").to_string(), "x");
        let sym = Symbol::new(Some("s"));
        assert_eq!(PropertyKey::from(&sym).to_string(), "Symbol(s)");
    }
}
