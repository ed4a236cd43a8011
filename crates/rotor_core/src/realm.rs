//! The runtime instance that owns every object.
//!
//! A [`Realm`] bundles the heap, the persistent roots, the reclaimer and the
//! intrinsic objects. Every object-creating or property-touching call goes
//! through a `&mut Realm` (or `&Realm` for pure reads); there is no global
//! state. The property protocol itself is implemented on `Realm` in
//! [`objects::protocol`][crate::objects::protocol].

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::config::{ReclaimMode, RealmOptions};
use crate::error::{RotorError, RotorResult};
use crate::gc::handle::{Persistent, PersistentRoots};
use crate::gc::heap::{Heap, HeapObject, ObjectId};
use crate::gc::mark_sweep::MarkSweep;
use crate::gc::reclaim::Reclaimer;
use crate::objects::class::ObjectClass;
use crate::objects::heap_object::ObjectImpl;
use crate::objects::js_function::{FunctionObject, NativeFn, arg};
use crate::objects::js_object::OrdinaryObject;
use crate::objects::primitive::PrimitiveObject;
use crate::objects::property::{Property, PropertyAttributes, PropertyKey, PropertySlot};
use crate::objects::protocol::PrimitiveHint;
use crate::objects::value::{JsValue, Symbol};
use crate::weak::{weak_map, weak_set};

/// Objects and symbols every realm is created with.
///
/// All intrinsic objects are collector roots.
#[derive(Debug, Clone)]
pub struct Intrinsics {
    /// `Object.prototype`.
    pub object_prototype: ObjectId,
    /// `Function.prototype`.
    pub function_prototype: ObjectId,
    /// `Boolean.prototype`.
    pub boolean_prototype: ObjectId,
    /// `Number.prototype`.
    pub number_prototype: ObjectId,
    /// `String.prototype`.
    pub string_prototype: ObjectId,
    /// `Symbol.prototype`.
    pub symbol_prototype: ObjectId,
    /// `BigInt.prototype`.
    pub bigint_prototype: ObjectId,
    /// `WeakMap.prototype`.
    pub weak_map_prototype: ObjectId,
    /// The `WeakMap` constructor.
    pub weak_map_constructor: ObjectId,
    /// The original `WeakMap.prototype.set`.
    pub weak_map_adder: ObjectId,
    /// `WeakSet.prototype`.
    pub weak_set_prototype: ObjectId,
    /// The `WeakSet` constructor.
    pub weak_set_constructor: ObjectId,
    /// The original `WeakSet.prototype.add`.
    pub weak_set_adder: ObjectId,
    /// `Symbol.toPrimitive`.
    pub to_primitive: Symbol,
    /// `Symbol.toStringTag`.
    pub to_string_tag: Symbol,
    /// `Symbol.hasInstance`.
    pub has_instance: Symbol,
}

impl Intrinsics {
    /// Every slot not yet installed points at `Object.prototype`.
    fn bootstrap(object_prototype: ObjectId, function_prototype: ObjectId) -> Self {
        Self {
            object_prototype,
            function_prototype,
            boolean_prototype: object_prototype,
            number_prototype: object_prototype,
            string_prototype: object_prototype,
            symbol_prototype: object_prototype,
            bigint_prototype: object_prototype,
            weak_map_prototype: object_prototype,
            weak_map_constructor: object_prototype,
            weak_map_adder: object_prototype,
            weak_set_prototype: object_prototype,
            weak_set_constructor: object_prototype,
            weak_set_adder: object_prototype,
            to_primitive: Symbol::new(Some("Symbol.toPrimitive")),
            to_string_tag: Symbol::new(Some("Symbol.toStringTag")),
            has_instance: Symbol::new(Some("Symbol.hasInstance")),
        }
    }

    fn roots(&self) -> [ObjectId; 13] {
        [
            self.object_prototype,
            self.function_prototype,
            self.boolean_prototype,
            self.number_prototype,
            self.string_prototype,
            self.symbol_prototype,
            self.bigint_prototype,
            self.weak_map_prototype,
            self.weak_map_constructor,
            self.weak_map_adder,
            self.weak_set_prototype,
            self.weak_set_constructor,
            self.weak_set_adder,
        ]
    }

    /// The wrapper prototype for primitives of `value`'s type.
    pub fn wrapper_prototype(&self, value: &JsValue) -> ObjectId {
        match value {
            JsValue::Boolean(_) => self.boolean_prototype,
            JsValue::Smi(_) | JsValue::HeapNumber(_) => self.number_prototype,
            JsValue::String(_) => self.string_prototype,
            JsValue::Symbol(_) => self.symbol_prototype,
            JsValue::BigInt(_) => self.bigint_prototype,
            JsValue::Undefined | JsValue::Null | JsValue::Object(_) => self.object_prototype,
        }
    }
}

/// Outcome of one [`Realm::collect_garbage`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    /// Objects alive after the collection.
    pub live: usize,
    /// Objects freed by the collection.
    pub freed: usize,
    /// Weak-reference registries handed to the reclaimer.
    pub registries: usize,
}

/// A runtime instance.
pub struct Realm {
    heap: Heap,
    roots: Rc<RefCell<PersistentRoots>>,
    reclaimer: Reclaimer,
    intrinsics: Intrinsics,
    options: RealmOptions,
}

impl Realm {
    /// Creates a realm with default options.
    pub fn new() -> Self {
        Self::with_options(RealmOptions::default())
    }

    /// Creates a realm and installs its intrinsics.
    pub fn with_options(options: RealmOptions) -> Self {
        let mut heap = Heap::with_capacity(options.initial_heap_capacity);
        let object_prototype = heap.allocate(HeapObject::new(Box::new(OrdinaryObject::new(
            ObjectClass::Object,
            None,
        ))));
        let noop: NativeFn = Rc::new(|_, _, _| Ok(JsValue::Undefined));
        let function_prototype = heap.allocate(HeapObject::new(Box::new(FunctionObject::new(
            Some(object_prototype),
            "",
            0,
            noop,
        ))));

        let mut realm = Self {
            heap,
            roots: Rc::new(RefCell::new(PersistentRoots::new())),
            reclaimer: Reclaimer::new(options.reclaim_mode),
            intrinsics: Intrinsics::bootstrap(object_prototype, function_prototype),
            options,
        };
        realm.install_object_prototype();
        realm.install_wrapper_prototypes();

        let map = weak_map::install(&mut realm);
        realm.intrinsics.weak_map_prototype = map.prototype;
        realm.intrinsics.weak_map_constructor = map.constructor;
        realm.intrinsics.weak_map_adder = map.adder;

        let set = weak_set::install(&mut realm);
        realm.intrinsics.weak_set_prototype = set.prototype;
        realm.intrinsics.weak_set_constructor = set.constructor;
        realm.intrinsics.weak_set_adder = set.adder;

        debug!(
            objects = realm.heap.live_count(),
            reclaim_mode = ?realm.reclaimer.mode(),
            "realm initialized"
        );
        realm
    }

    /// The options this realm was created with.
    pub fn options(&self) -> &RealmOptions {
        &self.options
    }

    /// The reclamation mode in effect; `Inline` if the worker could not be
    /// started.
    pub fn reclaim_mode(&self) -> ReclaimMode {
        self.reclaimer.mode()
    }

    /// The object arena.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub(crate) fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// The intrinsic objects and well-known symbols.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// The implementation of object `id`.
    pub fn object(&self, id: ObjectId) -> RotorResult<&dyn ObjectImpl> {
        Ok(self.heap.get(id)?.object())
    }

    /// Mutable access to the implementation of object `id`.
    pub fn object_mut(&mut self, id: ObjectId) -> RotorResult<&mut dyn ObjectImpl> {
        Ok(self.heap.get_mut(id)?.object_mut())
    }

    // ── Object creation ──────────────────────────────────────────────────────

    /// Moves an object of any kind into the heap.
    pub fn alloc_object(&mut self, object: Box<dyn ObjectImpl>) -> ObjectId {
        self.heap.allocate(HeapObject::new(object))
    }

    /// A fresh ordinary object inheriting from `Object.prototype`.
    pub fn new_object(&mut self) -> ObjectId {
        let proto = self.intrinsics.object_prototype;
        self.new_object_with_prototype(Some(proto))
    }

    /// A fresh ordinary object with the given prototype.
    pub fn new_object_with_prototype(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.alloc_object(Box::new(OrdinaryObject::new(ObjectClass::Object, prototype)))
    }

    /// A fresh array-like object: `values` under the keys `"0"`, `"1"`, ...
    /// and a non-enumerable `length`. Weak-collection constructors accept
    /// these as their iterable argument.
    pub fn new_array_like(&mut self, values: &[JsValue]) -> ObjectId {
        let obj = self.new_object();
        for (i, value) in values.iter().enumerate() {
            self.init_property(obj, &PropertyKey::from(i.to_string()), Property::Value(value.clone()));
        }
        self.init_property(
            obj,
            &PropertyKey::from("length"),
            Property::Slot(PropertySlot::data(
                JsValue::number(values.len() as f64),
                PropertyAttributes::WRITABLE,
            )),
        );
        obj
    }

    /// A fresh symbol.
    pub fn new_symbol(&mut self, description: Option<&str>) -> Symbol {
        Symbol::new(description)
    }

    /// A callable native function with `name` and `length` properties.
    pub fn new_native_function<F>(&mut self, name: &str, length: u32, f: F) -> ObjectId
    where
        F: Fn(&mut Realm, &JsValue, &[JsValue]) -> RotorResult<JsValue> + 'static,
    {
        let proto = Some(self.intrinsics.function_prototype);
        let id = self.alloc_object(Box::new(FunctionObject::new(proto, name, length, Rc::new(f))));
        self.init_function_properties(id, name, length);
        id
    }

    /// A native constructor. Calling it without `new` throws; `f` receives
    /// `new.target` as its receiver.
    pub fn new_native_constructor<F>(&mut self, name: &str, length: u32, f: F) -> ObjectId
    where
        F: Fn(&mut Realm, &JsValue, &[JsValue]) -> RotorResult<JsValue> + 'static,
    {
        let proto = Some(self.intrinsics.function_prototype);
        let id = self.alloc_object(Box::new(FunctionObject::new_constructor(
            proto,
            name,
            length,
            Rc::new(f),
        )));
        self.init_function_properties(id, name, length);
        id
    }

    fn init_function_properties(&mut self, id: ObjectId, name: &str, length: u32) {
        let attrs = PropertyAttributes::CONFIGURABLE;
        self.init_property(
            id,
            &PropertyKey::from("length"),
            Property::Slot(PropertySlot::data(JsValue::number(f64::from(length)), attrs)),
        );
        self.init_property(
            id,
            &PropertyKey::from("name"),
            Property::Slot(PropertySlot::data(JsValue::from(name), attrs)),
        );
    }

    /// Stores a property on a freshly created object, bypassing the
    /// protocol. Used while wiring up intrinsics.
    pub(crate) fn init_property(&mut self, obj: ObjectId, key: &PropertyKey, prop: Property) {
        if let Some(o) = self.heap.try_get_mut(obj) {
            o.object_mut().base_mut().put_own(key, prop);
        }
    }

    /// Installs a non-enumerable native method on `target`.
    pub(crate) fn install_method<F>(
        &mut self,
        target: ObjectId,
        name: &str,
        length: u32,
        f: F,
    ) -> ObjectId
    where
        F: Fn(&mut Realm, &JsValue, &[JsValue]) -> RotorResult<JsValue> + 'static,
    {
        let func = self.new_native_function(name, length, f);
        self.init_property(
            target,
            &PropertyKey::from(name),
            Property::Slot(PropertySlot::data(
                JsValue::Object(func),
                PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE,
            )),
        );
        func
    }

    /// Links `constructor.prototype` and `prototype.constructor` the way
    /// built-in constructors are linked.
    pub(crate) fn link_constructor(&mut self, constructor: ObjectId, prototype: ObjectId) {
        self.init_property(
            constructor,
            &PropertyKey::from("prototype"),
            Property::Slot(PropertySlot::data(
                JsValue::Object(prototype),
                PropertyAttributes::empty(),
            )),
        );
        self.init_property(
            prototype,
            &PropertyKey::from("constructor"),
            Property::Slot(PropertySlot::data(
                JsValue::Object(constructor),
                PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE,
            )),
        );
    }

    /// Sets `@@toStringTag` on `prototype`.
    pub(crate) fn init_to_string_tag(&mut self, prototype: ObjectId, tag: &str) {
        let key = PropertyKey::from(&self.intrinsics.to_string_tag);
        self.init_property(
            prototype,
            &key,
            Property::Slot(PropertySlot::data(
                JsValue::from(tag),
                PropertyAttributes::CONFIGURABLE,
            )),
        );
    }

    // ── Intrinsics ───────────────────────────────────────────────────────────

    fn install_object_prototype(&mut self) {
        let proto = self.intrinsics.object_prototype;
        self.install_method(proto, "toString", 0, |realm, this, _| {
            let tag = match this {
                JsValue::Undefined => "Undefined".to_string(),
                JsValue::Null => "Null".to_string(),
                _ => {
                    let obj = realm.to_object(this)?;
                    let tag_key = PropertyKey::from(&realm.intrinsics.to_string_tag);
                    match realm.get(obj, &tag_key)? {
                        Some(JsValue::String(tag)) => tag,
                        _ => realm.object(obj)?.class().to_string(),
                    }
                }
            };
            Ok(JsValue::String(format!("[object {tag}]")))
        });
        self.install_method(proto, "valueOf", 0, |realm, this, _| {
            Ok(JsValue::Object(realm.to_object(this)?))
        });
        self.install_method(proto, "hasOwnProperty", 1, |realm, this, args| {
            let key = realm.to_property_key(&arg(args, 0))?;
            let obj = realm.to_object(this)?;
            Ok(JsValue::Boolean(realm.has_own_property(obj, &key)?))
        });
    }

    fn install_wrapper_prototypes(&mut self) {
        let object_prototype = Some(self.intrinsics.object_prototype);
        let wrappers: [(JsValue, ObjectClass); 3] = [
            (JsValue::Boolean(false), ObjectClass::Boolean),
            (JsValue::Smi(0), ObjectClass::Number),
            (JsValue::from(""), ObjectClass::String),
        ];
        for (value, class) in wrappers {
            let proto = self.alloc_object(Box::new(PrimitiveObject::new(value, object_prototype)));
            self.install_wrapper_methods(proto, class);
            match class {
                ObjectClass::Boolean => self.intrinsics.boolean_prototype = proto,
                ObjectClass::Number => self.intrinsics.number_prototype = proto,
                _ => self.intrinsics.string_prototype = proto,
            }
        }
        for class in [ObjectClass::Symbol, ObjectClass::BigInt] {
            let proto = self.new_object_with_prototype(object_prototype);
            self.install_wrapper_methods(proto, class);
            self.init_to_string_tag(proto, class.as_str());
            if class == ObjectClass::Symbol {
                self.intrinsics.symbol_prototype = proto;
            } else {
                self.intrinsics.bigint_prototype = proto;
            }
        }
    }

    /// `valueOf` and `toString` for the wrapper prototype of `class`.
    fn install_wrapper_methods(&mut self, proto: ObjectId, class: ObjectClass) {
        self.install_method(proto, "valueOf", 0, move |realm, this, _| {
            realm.this_primitive(this, class)
        });
        self.install_method(proto, "toString", 0, move |realm, this, _| {
            let value = realm.this_primitive(this, class)?;
            let s = match &value {
                JsValue::Symbol(sym) => sym.to_string(),
                other => other.to_js_string()?,
            };
            Ok(JsValue::String(s))
        });
    }

    /// Unwraps `this` for a method of the `class` wrapper prototype.
    fn this_primitive(&self, this: &JsValue, class: ObjectClass) -> RotorResult<JsValue> {
        let unwrapped = match this {
            JsValue::Object(id) => self.object(*id)?.primitive_value().cloned(),
            other => Some(other.clone()),
        };
        match unwrapped {
            Some(value) if crate::objects::primitive::wrapper_class(&value) == class => Ok(value),
            _ => Err(RotorError::TypeError(format!(
                "{class}.prototype.valueOf requires that 'this' be a {class}"
            ))),
        }
    }

    // ── Diagnostics ──────────────────────────────────────────────────────────

    /// A short human-readable form of `value` for error messages.
    pub fn describe(&self, value: &JsValue) -> String {
        match value {
            JsValue::Object(id) => match self.heap.try_get(*id) {
                Some(obj) => obj.object().base().describe(),
                None => "<reclaimed object>".to_string(),
            },
            JsValue::Symbol(sym) => sym.to_string(),
            JsValue::String(s) => s.clone(),
            other => other
                .to_js_string()
                .unwrap_or_else(|_| format!("{other:?}")),
        }
    }

    /// Converts `value` to a string through `ToPrimitive` with a string
    /// hint.
    pub fn to_js_string(&mut self, value: &JsValue) -> RotorResult<String> {
        self.to_primitive(value, PrimitiveHint::String)?.to_js_string()
    }

    // ── Roots and collection ─────────────────────────────────────────────────

    /// Roots `id` until the returned handle is dropped.
    pub fn persist(&self, id: ObjectId) -> Persistent {
        Persistent::new(id, &self.roots)
    }

    /// Frees every object not reachable from the intrinsics or a persistent
    /// root, and hands the registries of freed objects to the reclaimer.
    pub fn collect_garbage(&mut self) -> GcStats {
        let mut roots: Vec<ObjectId> = self.intrinsics.roots().to_vec();
        roots.extend(self.roots.borrow().iter_roots());

        let mut collector = MarkSweep::new(&mut self.heap);
        collector.mark(roots);
        let outcome = collector.sweep();

        let registries = outcome.registries.len();
        for refs in outcome.registries {
            self.reclaimer.dispatch(refs);
        }
        let stats = GcStats {
            live: self.heap.live_count(),
            freed: outcome.freed,
            registries,
        };
        debug!(
            live = stats.live,
            freed = stats.freed,
            registries = stats.registries,
            "garbage collection finished"
        );
        stats
    }

    /// Blocks until every registry dispatched so far has been finalized.
    pub fn flush_reclamation(&self) {
        self.reclaimer.flush();
    }

    /// Number of registries finalized since the realm was created.
    pub fn reclaimed_registries(&self) -> usize {
        self.reclaimer.finalized()
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}
