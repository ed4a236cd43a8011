//! Native function objects.
//!
//! The evaluator that would produce bytecode closures sits outside this
//! crate; the object model only needs host-side callables: accessor
//! functions, the built-in collection methods and constructors, and any
//! callback an embedder installs. All of them are [`FunctionObject`]s
//! wrapping a [`NativeFn`].

use std::fmt;
use std::rc::Rc;

use crate::error::{RotorError, RotorResult};
use crate::gc::heap::ObjectId;
use crate::objects::class::ObjectClass;
use crate::objects::heap_object::ObjectImpl;
use crate::objects::js_object::BaseObject;
use crate::objects::value::JsValue;
use crate::realm::Realm;

// ──────────────────────────────────────────────────────────────────────────────
// NativeFn
// ──────────────────────────────────────────────────────────────────────────────

/// A host-side (Rust) callback that implements a JavaScript function.
///
/// The callback receives the realm, the receiver and the positional
/// arguments. When used as a `[[Construct]]` behaviour the receiver is the
/// `new.target` constructor instead.
///
/// Handles captured by the closure are invisible to the collector; root them
/// with [`Realm::persist`] if they must stay alive.
pub type NativeFn = Rc<dyn Fn(&mut Realm, &JsValue, &[JsValue]) -> RotorResult<JsValue>>;

/// Returns argument `index`, or `undefined` if it was not passed.
pub fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or_default()
}

// ──────────────────────────────────────────────────────────────────────────────
// FunctionObject
// ──────────────────────────────────────────────────────────────────────────────

/// A callable object backed by a [`NativeFn`].
pub struct FunctionObject {
    base: BaseObject,
    name: String,
    length: u32,
    call: NativeFn,
    construct: Option<NativeFn>,
}

impl FunctionObject {
    /// A plain callable function.
    pub fn new(
        prototype: Option<ObjectId>,
        name: impl Into<String>,
        length: u32,
        call: NativeFn,
    ) -> Self {
        Self {
            base: BaseObject::new(ObjectClass::Function, prototype),
            name: name.into(),
            length,
            call,
            construct: None,
        }
    }

    /// A constructor that throws when called without `new`.
    pub fn new_constructor(
        prototype: Option<ObjectId>,
        name: impl Into<String>,
        length: u32,
        construct: NativeFn,
    ) -> Self {
        let name = name.into();
        let message = format!("Constructor {name} requires 'new'");
        let call: NativeFn = Rc::new(move |_, _, _| Err(RotorError::TypeError(message.clone())));
        Self {
            base: BaseObject::new(ObjectClass::Function, prototype),
            name,
            length,
            call,
            construct: Some(construct),
        }
    }

    /// The function's name, as installed in its `name` property.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared arity, as installed in its `length` property.
    pub fn length(&self) -> u32 {
        self.length
    }
}

impl fmt::Debug for FunctionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionObject")
            .field("name", &self.name)
            .field("length", &self.length)
            .field("constructor", &self.construct.is_some())
            .finish()
    }
}

impl ObjectImpl for FunctionObject {
    fn base(&self) -> &BaseObject {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseObject {
        &mut self.base
    }

    fn call_handler(&self) -> Option<NativeFn> {
        Some(Rc::clone(&self.call))
    }

    fn construct_handler(&self) -> Option<NativeFn> {
        self.construct.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::property::PropertyKey;

    #[test]
    fn test_arg_defaults_to_undefined() {
        let args = [JsValue::Smi(1)];
        assert_eq!(arg(&args, 0), JsValue::Smi(1));
        assert_eq!(arg(&args, 1), JsValue::Undefined);
    }

    #[test]
    fn test_native_function_name_and_length() {
        let mut realm = Realm::new();
        let f = realm.new_native_function("add", 2, |_, _, args| {
            let a = arg(args, 0).to_number()?;
            let b = arg(args, 1).to_number()?;
            Ok(JsValue::number(a + b))
        });
        assert_eq!(
            realm.get(f, &"name".into()).unwrap(),
            Some(JsValue::from("add"))
        );
        assert_eq!(realm.get(f, &"length".into()).unwrap(), Some(JsValue::Smi(2)));
        let desc = realm
            .get_own_property_descriptor(f, &PropertyKey::from("name"))
            .unwrap()
            .unwrap();
        assert_eq!(desc.writable, Some(false));
        assert_eq!(desc.enumerable, Some(false));
        assert_eq!(desc.configurable, Some(true));
    }

    #[test]
    fn test_native_function_call() {
        let mut realm = Realm::new();
        let f = realm.new_native_function("add", 2, |_, _, args| {
            let a = arg(args, 0).to_number()?;
            let b = arg(args, 1).to_number()?;
            Ok(JsValue::number(a + b))
        });
        let res = realm
            .call(&JsValue::Object(f), &JsValue::Undefined, &[JsValue::Smi(2), JsValue::Smi(3)])
            .unwrap();
        assert_eq!(res, JsValue::Smi(5));
    }

    #[test]
    fn test_constructor_requires_new() {
        let mut realm = Realm::new();
        let ctor = realm.new_native_constructor("Thing", 0, |realm, _, _| {
            Ok(JsValue::Object(realm.new_object()))
        });
        let err = realm
            .call(&JsValue::Object(ctor), &JsValue::Undefined, &[])
            .unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Constructor Thing requires 'new'");
        assert!(realm.is_constructor(&JsValue::Object(ctor)));
        let made = realm.construct(&JsValue::Object(ctor), &[]).unwrap();
        assert!(made.is_object());
    }
}
