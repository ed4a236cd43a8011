//! Class tags for heap objects.

use std::fmt;

/// The kind of an object, as reported by `Object.prototype.toString` when no
/// `@@toStringTag` overrides it.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    /// An ordinary object.
    Object,
    /// A callable object.
    Function,
    /// A `Boolean` wrapper.
    Boolean,
    /// A `Number` wrapper.
    Number,
    /// A `String` wrapper.
    String,
    /// A `Symbol` wrapper.
    Symbol,
    /// A `BigInt` wrapper.
    BigInt,
    /// A `WeakMap` collection.
    WeakMap,
    /// A `WeakSet` collection.
    WeakSet,
}

impl ObjectClass {
    /// Returns the tag name, e.g. `"WeakMap"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Function => "Function",
            Self::Boolean => "Boolean",
            Self::Number => "Number",
            Self::String => "String",
            Self::Symbol => "Symbol",
            Self::BigInt => "BigInt",
            Self::WeakMap => "WeakMap",
            Self::WeakSet => "WeakSet",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_display() {
        assert_eq!(ObjectClass::WeakMap.to_string(), "WeakMap");
        assert_eq!(ObjectClass::Object.as_str(), "Object");
    }
}
