/// Object class tags.
pub mod class;
/// Conversion between descriptors and plain descriptor objects.
pub mod descriptor;
/// Lazy, restartable property enumeration.
pub mod enumerate;
/// The `HeapObject` cell and the `ObjectImpl` contract every kind implements.
pub mod heap_object;
/// Native function objects.
pub mod js_function;
/// Property storage and own-level define/delete shared by every kind.
pub mod js_object;
/// Primitive wrapper objects.
pub mod primitive;
/// Property keys, attributes, stored properties and descriptors.
pub mod property;
/// Chain-walking property protocol, calls and conversions on `Realm`.
pub mod protocol;
/// Top-level JavaScript value enum and ECMAScript §7.1 type conversions.
pub mod value;
