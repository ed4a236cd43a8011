//! Error types for the Rotor object model.
//!
//! Every JS-visible failure is a `TypeError` at the language level; the
//! variants below keep the reason apart so embedders can match on it without
//! parsing messages.

use thiserror::Error;

use crate::objects::value::JsValue;

/// All errors that can be produced by the Rotor object model.
#[derive(Debug, Clone, Error)]
pub enum RotorError {
    /// A new own property or a prototype change was attempted on a
    /// non-extensible object.
    #[error("TypeError: {0}")]
    NotExtensible(String),

    /// Assignment to a non-writable data property (own or inherited), or to an
    /// accessor without a setter.
    #[error("TypeError: {0}")]
    ReadOnly(String),

    /// Delete or redefinition of a non-configurable property.
    #[error("TypeError: {0}")]
    NonConfigurable(String),

    /// A prototype assignment would have created a cycle.
    #[error("TypeError: Cyclic __proto__ value")]
    CyclicPrototype,

    /// An operation expected an object, callable or method and received
    /// something else.
    #[error("TypeError: {0}")]
    TypeError(String),

    /// A collection-only method was invoked on an object of another kind.
    #[error("TypeError: Method {method} called on incompatible receiver {receiver}")]
    IncompatibleReceiver {
        /// Fully qualified method name, e.g. `WeakMap.prototype.set`.
        method: &'static str,
        /// Display form of the offending receiver.
        receiver: String,
    },

    /// A value thrown by a native callable.
    #[error("uncaught exception: {0:?}")]
    Throw(JsValue),

    /// An [`ObjectId`][crate::gc::heap::ObjectId] referred to a reclaimed slot.
    #[error("invalid object handle")]
    InvalidHandle,
}

impl RotorError {
    /// Returns `true` if the error surfaces as a JavaScript `TypeError`.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::NotExtensible(_)
                | Self::ReadOnly(_)
                | Self::NonConfigurable(_)
                | Self::CyclicPrototype
                | Self::TypeError(_)
                | Self::IncompatibleReceiver { .. }
        )
    }
}

/// Convenient `Result` alias for fallible object-model operations.
pub type RotorResult<T> = Result<T, RotorError>;

/// Reports a protocol rejection according to the caller's `throw` flag.
///
/// Strict-mode callers get the error; sloppy-mode callers get `Ok(false)`.
pub(crate) fn reject(throw: bool, error: RotorError) -> RotorResult<bool> {
    if throw { Err(error) } else { Ok(false) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_without_throw_is_false() {
        let res = reject(false, RotorError::CyclicPrototype);
        assert!(matches!(res, Ok(false)));
    }

    #[test]
    fn test_reject_with_throw_is_error() {
        let res = reject(true, RotorError::ReadOnly("x".to_string()));
        assert!(matches!(res, Err(RotorError::ReadOnly(_))));
    }

    #[test]
    fn test_type_error_classification() {
        assert!(RotorError::CyclicPrototype.is_type_error());
        assert!(
            RotorError::IncompatibleReceiver {
                method: "WeakMap.prototype.get",
                receiver: "[object Object]".to_string(),
            }
            .is_type_error()
        );
        assert!(!RotorError::InvalidHandle.is_type_error());
        assert!(!RotorError::Throw(JsValue::Undefined).is_type_error());
    }

    #[test]
    fn test_display_has_type_error_prefix() {
        let err = RotorError::NonConfigurable("Cannot redefine property: x".to_string());
        assert_eq!(err.to_string(), "TypeError: Cannot redefine property: x");
        assert_eq!(
            RotorError::CyclicPrototype.to_string(),
            "TypeError: Cyclic __proto__ value"
        );
    }
}
