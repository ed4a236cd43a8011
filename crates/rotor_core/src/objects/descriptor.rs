//! Conversion between [`PropertyDescriptor`]s and plain descriptor objects
//! (`{ value, writable, get, set, enumerable, configurable }`).

use crate::error::{RotorError, RotorResult};
use crate::gc::heap::ObjectId;
use crate::objects::property::{Property, PropertyDescriptor, PropertyKey};
use crate::objects::value::JsValue;
use crate::realm::Realm;

impl Realm {
    /// ECMAScript §6.2.6.4 **FromPropertyDescriptor**: a fresh plain object
    /// holding the fields present in `desc`.
    pub fn from_property_descriptor(&mut self, desc: &PropertyDescriptor) -> ObjectId {
        let obj = self.new_object();
        let fields = [
            ("value", desc.value.clone()),
            ("writable", desc.writable.map(JsValue::Boolean)),
            ("get", desc.getter.clone()),
            ("set", desc.setter.clone()),
            ("enumerable", desc.enumerable.map(JsValue::Boolean)),
            ("configurable", desc.configurable.map(JsValue::Boolean)),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                self.init_property(obj, &PropertyKey::from(name), Property::Value(value));
            }
        }
        obj
    }

    /// ECMAScript §6.2.6.5 **ToPropertyDescriptor**.
    ///
    /// Fields are read with `[[Get]]`, so inherited fields and getters count.
    pub fn to_property_descriptor(&mut self, value: &JsValue) -> RotorResult<PropertyDescriptor> {
        let JsValue::Object(obj) = value else {
            return Err(RotorError::TypeError(format!(
                "Property description must be an object: {}",
                self.describe(value)
            )));
        };
        let obj = *obj;

        let mut desc = PropertyDescriptor::default();
        if let Some(v) = self.descriptor_field(obj, "enumerable")? {
            desc.enumerable = Some(v.to_boolean());
        }
        if let Some(v) = self.descriptor_field(obj, "configurable")? {
            desc.configurable = Some(v.to_boolean());
        }
        if let Some(v) = self.descriptor_field(obj, "value")? {
            desc.value = Some(v);
        }
        if let Some(v) = self.descriptor_field(obj, "writable")? {
            desc.writable = Some(v.to_boolean());
        }
        if let Some(v) = self.descriptor_field(obj, "get")? {
            if !v.is_undefined() && !self.is_callable(&v) {
                return Err(RotorError::TypeError(format!(
                    "Getter must be a function: {}",
                    self.describe(&v)
                )));
            }
            desc.getter = Some(v);
        }
        if let Some(v) = self.descriptor_field(obj, "set")? {
            if !v.is_undefined() && !self.is_callable(&v) {
                return Err(RotorError::TypeError(format!(
                    "Setter must be a function: {}",
                    self.describe(&v)
                )));
            }
            desc.setter = Some(v);
        }

        if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
            return Err(RotorError::TypeError(
                "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute"
                    .to_string(),
            ));
        }
        Ok(desc)
    }

    fn descriptor_field(&mut self, obj: ObjectId, name: &str) -> RotorResult<Option<JsValue>> {
        let key = PropertyKey::from(name);
        if !self.has_property(obj, &key)? {
            return Ok(None);
        }
        self.get_value(obj, &key).map(Some)
    }
}
