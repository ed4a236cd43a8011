//! JavaScript value representation.
//!
//! This module provides [`JsValue`], the top-level enum that can hold any
//! ECMAScript value, the [`Symbol`] identity type, the SameValue comparison
//! used by `[[DefineOwnProperty]]`, and the primitive-only conversions of
//! ECMAScript §7.1: [`to_boolean`][JsValue::to_boolean] (§7.1.2),
//! [`to_number`][JsValue::to_number] (§7.1.4) and
//! [`to_js_string`][JsValue::to_js_string] (§7.1.17). Conversions that need
//! to call into objects (`ToPrimitive`, `ToObject`) live on the
//! [`Realm`][crate::realm::Realm].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{RotorError, RotorResult};
use crate::gc::heap::ObjectId;
use crate::gc::trace::{Trace, Tracer};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A unique JavaScript symbol.
///
/// Identity is the process-wide `id`; the description is informational only.
#[derive(Debug, Clone)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl Symbol {
    /// Creates a fresh symbol, distinct from every other symbol.
    pub fn new(description: Option<&str>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.map(Arc::from),
        }
    }

    /// Returns the symbol's identity.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the description passed at creation, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// Any ECMAScript value.
///
/// Primitive variants carry their data inline; `Object` holds an
/// [`ObjectId`] handle into the realm's heap. Every variant is `Send`, so
/// values can sit in weak-collection storage that a reclamation worker
/// touches from another thread.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsValue {
    /// The ECMAScript `undefined` primitive.
    #[default]
    Undefined,
    /// The ECMAScript `null` primitive.
    Null,
    /// A JavaScript boolean (`true` or `false`).
    Boolean(bool),
    /// A small (31-bit signed) integer, stored inline.
    Smi(i32),
    /// A double-precision floating-point number.
    HeapNumber(f64),
    /// A JavaScript string value.
    String(String),
    /// A unique JavaScript symbol.
    Symbol(Symbol),
    /// A handle to a heap object.
    Object(ObjectId),
    /// A JavaScript `BigInt` value (represented as a 128-bit signed integer).
    BigInt(i128),
}

// ──────────────────────────────────────────────────────────────────────────────
// Type-checking predicates
// ──────────────────────────────────────────────────────────────────────────────

impl JsValue {
    /// Returns `true` if this value is `undefined`.
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` if this value is `null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if this value is `null` or `undefined`.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// Returns `true` if this value is any numeric type (`Smi` or `HeapNumber`).
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Smi(_) | Self::HeapNumber(_))
    }

    /// Returns `true` if this value is a string.
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns `true` if this value is a symbol.
    #[inline]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }

    /// Returns `true` if this value is an object.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Returns the object handle if this value is an object.
    #[inline]
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the numeric payload of a `Smi` or `HeapNumber`.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Smi(n) => Some(f64::from(*n)),
            Self::HeapNumber(n) => Some(*n),
            _ => None,
        }
    }

    /// Builds a number value, preferring the `Smi` representation when `n` is
    /// an integer that fits and is not `-0`.
    pub fn number(n: f64) -> Self {
        let fits = n.fract() == 0.0
            && n >= f64::from(i32::MIN)
            && n <= f64::from(i32::MAX)
            && !(n == 0.0 && n.is_sign_negative());
        if fits {
            Self::Smi(n as i32)
        } else {
            Self::HeapNumber(n)
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// SameValue (ECMAScript §7.2.10)
// ──────────────────────────────────────────────────────────────────────────────

impl JsValue {
    /// ECMAScript §7.2.10 **SameValue**.
    ///
    /// Numbers compare by value across representations, `NaN` equals `NaN`
    /// and `+0` differs from `-0`. Objects and symbols compare by identity.
    pub fn same_value(&self, other: &JsValue) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                a == b && a.is_sign_negative() == b.is_sign_negative()
            }
            (None, None) => self == other,
            _ => false,
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Abstract type-conversion operations (ECMAScript §7.1)
// ──────────────────────────────────────────────────────────────────────────────

impl JsValue {
    /// ECMAScript §7.1.2 **ToBoolean**.
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Smi(n) => *n != 0,
            Self::HeapNumber(n) => !n.is_nan() && *n != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Symbol(_) | Self::Object(_) => true,
            Self::BigInt(n) => *n != 0,
        }
    }

    /// ECMAScript §7.1.4 **ToNumber** for primitives.
    ///
    /// Objects must go through
    /// [`Realm::to_primitive`][crate::realm::Realm::to_primitive] first and
    /// are rejected here.
    pub fn to_number(&self) -> RotorResult<f64> {
        match self {
            Self::Undefined => Ok(f64::NAN),
            Self::Null => Ok(0.0),
            Self::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Self::Smi(n) => Ok(f64::from(*n)),
            Self::HeapNumber(n) => Ok(*n),
            Self::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(0.0)
                } else {
                    Ok(trimmed.parse::<f64>().unwrap_or(f64::NAN))
                }
            }
            Self::Symbol(_) => Err(RotorError::TypeError(
                "Cannot convert a Symbol value to a number".to_string(),
            )),
            Self::Object(_) => Err(RotorError::TypeError(
                "Cannot convert an Object to a number without ToPrimitive".to_string(),
            )),
            Self::BigInt(_) => Err(RotorError::TypeError(
                "Cannot convert a BigInt value to a number".to_string(),
            )),
        }
    }

    /// ECMAScript §7.1.17 **ToString** for primitives.
    ///
    /// Named `to_js_string` to avoid ambiguity with [`ToString::to_string`].
    pub fn to_js_string(&self) -> RotorResult<String> {
        match self {
            Self::Undefined => Ok("undefined".to_string()),
            Self::Null => Ok("null".to_string()),
            Self::Boolean(b) => Ok(if *b { "true" } else { "false" }.to_string()),
            Self::Smi(n) => Ok(n.to_string()),
            Self::HeapNumber(n) => Ok(number_to_string(*n)),
            Self::String(s) => Ok(s.clone()),
            Self::Symbol(_) => Err(RotorError::TypeError(
                "Cannot convert a Symbol value to a string".to_string(),
            )),
            Self::Object(_) => Err(RotorError::TypeError(
                "Cannot convert an Object to a string without ToPrimitive".to_string(),
            )),
            Self::BigInt(n) => Ok(n.to_string()),
        }
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        Self::Smi(n)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<ObjectId> for JsValue {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

impl From<Symbol> for JsValue {
    fn from(sym: Symbol) -> Self {
        Self::Symbol(sym)
    }
}

impl From<Option<ObjectId>> for JsValue {
    /// `None` maps to `null`, matching how prototype links are reflected.
    fn from(id: Option<ObjectId>) -> Self {
        id.map_or(Self::Null, Self::Object)
    }
}

impl Trace for JsValue {
    fn trace(&self, tracer: &mut Tracer) {
        if let Self::Object(id) = self {
            tracer.mark(*id);
        }
    }
}

/// Formats an `f64` as a JavaScript number string (ECMAScript §7.1.12.1).
fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}
