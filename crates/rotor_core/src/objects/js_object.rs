//! Own-property storage shared by every object kind.
//!
//! # Storage model
//!
//! A [`BaseObject`] starts life in **fast mode**: string-keyed properties sit
//! in a boxed [`SmallVec`] of `(name, property)` pairs, looked up by linear
//! scan. When the number of named properties exceeds [`MAX_FAST_PROPERTIES`]
//! the object is *normalised* into **slow (dictionary) mode**: a [`HashMap`]
//! for lookup plus a name list that keeps first-insertion order for
//! enumeration. Symbol-keyed properties live in their own map and have no
//! ordering.
//!
//! Properties created with every attribute set are stored as a bare
//! [`Property::Value`]; everything else carries a [`PropertySlot`].
//!
//! `BaseObject` implements the own-level half of the property protocol
//! (`[[GetOwnProperty]]`, `[[DefineOwnProperty]]`, `[[Delete]]`); the
//! chain-walking half lives on the [`Realm`][crate::realm::Realm] because it
//! needs to reach other objects and call accessors.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::error::{RotorError, RotorResult, reject};
use crate::gc::heap::ObjectId;
use crate::gc::trace::{Trace, Tracer};
use crate::objects::class::ObjectClass;
use crate::objects::heap_object::ObjectImpl;
use crate::objects::property::{
    Property, PropertyAttributes, PropertyDescriptor, PropertyKey, PropertySlot,
};
use crate::objects::value::{JsValue, Symbol};

/// Number of named properties stored inline before the property store
/// overflows to a [`HashMap`] (slow / dictionary mode).
pub const MAX_FAST_PROPERTIES: usize = 8;

/// Named-property backing store: fast (inline, linear scan) or slow
/// (dictionary plus insertion-order list).
enum NamedProperties {
    Fast(Box<SmallVec<[(String, Property); MAX_FAST_PROPERTIES]>>),
    Slow {
        values: HashMap<String, Property>,
        names: Vec<String>,
    },
}

/// The common storage and own-property logic embedded by every object kind.
pub struct BaseObject {
    class: ObjectClass,
    prototype: Option<ObjectId>,
    extensible: bool,
    named: NamedProperties,
    symbols: HashMap<Symbol, Property>,
}

/// Resolves the `[[Get]]` / `[[Set]]` field of a descriptor to a handle.
///
/// `None` means "not supplied", `Some(None)` means "supplied as undefined".
pub(crate) fn accessor_target(
    key: &PropertyKey,
    which: &str,
    field: Option<&JsValue>,
) -> RotorResult<Option<Option<ObjectId>>> {
    match field {
        None => Ok(None),
        Some(JsValue::Undefined) => Ok(Some(None)),
        Some(JsValue::Object(id)) => Ok(Some(Some(*id))),
        Some(_) => Err(RotorError::TypeError(format!(
            "{which} must be a function: {key}"
        ))),
    }
}

/// Checks a requested descriptor against an existing property.
///
/// Returns `false` when the request would change something a
/// non-configurable property protects.
pub(crate) fn is_compatible(
    existing: &PropertySlot,
    desc: &PropertyDescriptor,
    getter: Option<Option<ObjectId>>,
    setter: Option<Option<ObjectId>>,
) -> bool {
    if existing.attributes.contains(PropertyAttributes::CONFIGURABLE) {
        return true;
    }
    if desc.configurable == Some(true) {
        return false;
    }
    if let Some(enumerable) = desc.enumerable
        && enumerable != existing.attributes.contains(PropertyAttributes::ENUMERABLE)
    {
        return false;
    }
    if existing.accessor {
        if desc.is_data_descriptor() {
            return false;
        }
        if getter.is_some_and(|g| g != existing.getter) {
            return false;
        }
        if setter.is_some_and(|s| s != existing.setter) {
            return false;
        }
    } else {
        if desc.is_accessor_descriptor() {
            return false;
        }
        if !existing.attributes.contains(PropertyAttributes::WRITABLE) {
            if desc.writable == Some(true) {
                return false;
            }
            if let Some(value) = &desc.value
                && !value.same_value(&existing.value)
            {
                return false;
            }
        }
    }
    true
}

impl BaseObject {
    /// Creates an empty, extensible object of `class` with `prototype`.
    pub fn new(class: ObjectClass, prototype: Option<ObjectId>) -> Self {
        Self {
            class,
            prototype,
            extensible: true,
            named: NamedProperties::Fast(Box::new(SmallVec::new())),
            symbols: HashMap::new(),
        }
    }

    /// Returns the class tag.
    pub fn class(&self) -> ObjectClass {
        self.class
    }

    /// Returns the prototype link.
    pub fn prototype(&self) -> Option<ObjectId> {
        self.prototype
    }

    /// Overwrites the prototype link without any validation.
    ///
    /// [`Realm::set_prototype_of`][crate::realm::Realm::set_prototype_of]
    /// performs the extensibility and cycle checks before calling this.
    pub fn set_prototype(&mut self, prototype: Option<ObjectId>) {
        self.prototype = prototype;
    }

    /// Returns `true` if new own properties may be added.
    pub fn is_extensible(&self) -> bool {
        self.extensible
    }

    /// Clears the extensible flag. Irreversible.
    pub fn prevent_extensions(&mut self) {
        self.extensible = false;
    }

    /// Returns `true` if this object is in fast (inline) mode.
    pub fn is_fast_mode(&self) -> bool {
        matches!(self.named, NamedProperties::Fast(_))
    }

    /// Number of own properties, string and symbol keyed.
    pub fn property_count(&self) -> usize {
        let named = match &self.named {
            NamedProperties::Fast(props) => props.len(),
            NamedProperties::Slow { values, .. } => values.len(),
        };
        named + self.symbols.len()
    }

    /// `"[object Class]"`, used in error messages.
    pub fn describe(&self) -> String {
        format!("[object {}]", self.class)
    }

    // ── Raw storage ──────────────────────────────────────────────────────────

    fn normalise_to_slow(&mut self) {
        if let NamedProperties::Fast(props) = &mut self.named {
            let mut values = HashMap::with_capacity(props.len() * 2);
            let mut names = Vec::with_capacity(props.len() * 2);
            for (name, prop) in props.drain(..) {
                names.push(name.clone());
                values.insert(name, prop);
            }
            self.named = NamedProperties::Slow { values, names };
        }
    }

    fn get_named(&self, name: &str) -> Option<&Property> {
        match &self.named {
            NamedProperties::Fast(props) => {
                props.iter().find(|(n, _)| n == name).map(|(_, p)| p)
            }
            NamedProperties::Slow { values, .. } => values.get(name),
        }
    }

    /// Returns the own property stored under `key`.
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&Property> {
        match key {
            PropertyKey::String(name) => self.get_named(name),
            PropertyKey::Symbol(sym) => self.symbols.get(sym),
        }
    }

    /// Returns `true` if this object has an own property `key`.
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.get_own_property(key).is_some()
    }

    /// Stores `prop` under `key` with no validation.
    ///
    /// An existing entry is replaced in place and keeps its enumeration
    /// position; a new name is appended.
    pub fn put_own(&mut self, key: &PropertyKey, prop: Property) {
        let name = match key {
            PropertyKey::Symbol(sym) => {
                self.symbols.insert(sym.clone(), prop);
                return;
            }
            PropertyKey::String(name) => name,
        };
        if let NamedProperties::Fast(props) = &mut self.named {
            if let Some(entry) = props.iter_mut().find(|(n, _)| n == name) {
                entry.1 = prop;
                return;
            }
            if props.len() < MAX_FAST_PROPERTIES {
                props.push((name.clone(), prop));
                return;
            }
            self.normalise_to_slow();
        }
        if let NamedProperties::Slow { values, names } = &mut self.named
            && values.insert(name.clone(), prop).is_none()
        {
            names.push(name.clone());
        }
    }

    /// Removes the own property `key` with no validation.
    pub fn remove_own(&mut self, key: &PropertyKey) -> Option<Property> {
        let name = match key {
            PropertyKey::Symbol(sym) => return self.symbols.remove(sym),
            PropertyKey::String(name) => name,
        };
        match &mut self.named {
            NamedProperties::Fast(props) => {
                let pos = props.iter().position(|(n, _)| n == name)?;
                Some(props.remove(pos).1)
            }
            NamedProperties::Slow { values, names } => {
                let prop = values.remove(name.as_str())?;
                if let Some(pos) = names.iter().position(|n| n == name) {
                    names.remove(pos);
                }
                Some(prop)
            }
        }
    }

    /// Own string keys in first-insertion order.
    pub fn own_property_names(&self) -> Vec<String> {
        match &self.named {
            NamedProperties::Fast(props) => props.iter().map(|(n, _)| n.clone()).collect(),
            NamedProperties::Slow { names, .. } => names.clone(),
        }
    }

    /// Own symbol keys, in no particular order.
    pub fn own_symbols(&self) -> Vec<Symbol> {
        self.symbols.keys().cloned().collect()
    }

    // ── Own-level protocol ──────────────────────────────────────────────────

    /// ECMAScript §10.1.6 `[[DefineOwnProperty]]` for ordinary storage.
    ///
    /// A non-configurable property rejects any request that makes it
    /// configurable, flips its enumerability, switches it between data and
    /// accessor, makes a read-only value writable or changes it, or swaps
    /// its accessor functions. Attributes absent from `desc` keep their old
    /// value, or default to `false` on a new property.
    pub fn define_own_property(
        &mut self,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
        throw: bool,
    ) -> RotorResult<bool> {
        let getter = accessor_target(key, "Getter", desc.getter.as_ref())?;
        let setter = accessor_target(key, "Setter", desc.setter.as_ref())?;

        let mut slot = match self.get_own_property(key) {
            None => {
                if !self.extensible {
                    return reject(
                        throw,
                        RotorError::NotExtensible(format!(
                            "Cannot define property {key}, object is not extensible"
                        )),
                    );
                }
                PropertySlot::data(JsValue::Undefined, PropertyAttributes::empty())
            }
            Some(existing) => {
                let existing = existing.to_slot();
                if !is_compatible(&existing, desc, getter, setter) {
                    return reject(
                        throw,
                        RotorError::NonConfigurable(format!("Cannot redefine property: {key}")),
                    );
                }
                existing
            }
        };

        if desc.is_plain_value()
            && let Some(value) = &desc.value
        {
            self.put_own(key, Property::Value(value.clone()));
            return Ok(true);
        }

        if let Some(writable) = desc.writable {
            slot.attributes.set(PropertyAttributes::WRITABLE, writable);
        }
        if let Some(enumerable) = desc.enumerable {
            slot.attributes.set(PropertyAttributes::ENUMERABLE, enumerable);
        }
        if let Some(configurable) = desc.configurable {
            slot.attributes.set(PropertyAttributes::CONFIGURABLE, configurable);
        }
        if desc.is_data_descriptor() && slot.accessor {
            slot.accessor = false;
            slot.getter = None;
            slot.setter = None;
        }
        if let Some(value) = &desc.value {
            slot.value = value.clone();
        }
        if getter.is_some() || setter.is_some() {
            if !slot.accessor {
                slot.accessor = true;
                slot.value = JsValue::Undefined;
                slot.attributes.remove(PropertyAttributes::WRITABLE);
            }
            if let Some(g) = getter {
                slot.getter = g;
            }
            if let Some(s) = setter {
                slot.setter = s;
            }
        }

        let prop = if !slot.accessor && slot.attributes == PropertyAttributes::all() {
            Property::Value(slot.value)
        } else {
            Property::Slot(slot)
        };
        self.put_own(key, prop);
        Ok(true)
    }

    /// ECMAScript §10.1.10 `[[Delete]]`.
    ///
    /// Deleting an absent property succeeds. A non-configurable property is
    /// kept and the failure reported according to `throw`.
    pub fn delete(&mut self, key: &PropertyKey, throw: bool) -> RotorResult<bool> {
        match self.get_own_property(key) {
            None => Ok(true),
            Some(prop) if !prop.is_configurable() => reject(
                throw,
                RotorError::NonConfigurable(format!(
                    "Cannot delete property '{key}' of {}",
                    self.describe()
                )),
            ),
            Some(_) => {
                self.remove_own(key);
                Ok(true)
            }
        }
    }
}

impl Trace for BaseObject {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark_opt(self.prototype);
        match &self.named {
            NamedProperties::Fast(props) => {
                for (_, prop) in props.iter() {
                    prop.trace(tracer);
                }
            }
            NamedProperties::Slow { values, .. } => {
                for prop in values.values() {
                    prop.trace(tracer);
                }
            }
        }
        for prop in self.symbols.values() {
            prop.trace(tracer);
        }
    }
}

/// A plain object with no internal slots beyond its properties.
pub struct OrdinaryObject {
    base: BaseObject,
}

impl OrdinaryObject {
    /// Creates an empty ordinary object.
    pub fn new(class: ObjectClass, prototype: Option<ObjectId>) -> Self {
        Self {
            base: BaseObject::new(class, prototype),
        }
    }
}

impl ObjectImpl for OrdinaryObject {
    fn base(&self) -> &BaseObject {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseObject {
        &mut self.base
    }
}
