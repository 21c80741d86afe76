use std::fmt;

// Type tags, exposed for serializers and `typeof`-style dispatch.
pub const TAG_UNDEFINED: u8 = 0;
pub const TAG_NULL: u8 = 1;
pub const TAG_FALSE: u8 = 2;
pub const TAG_TRUE: u8 = 3;
pub const TAG_NUMBER: u8 = 4;
pub const TAG_STRING: u8 = 5;
pub const TAG_CLOSURE: u8 = 6;
pub const TAG_NATIVE: u8 = 7;

/// A runtime value.
///
/// Primitives are stored inline; heap objects are referenced by a `u32`
/// handle into the matching [`Heap`](crate::Heap) arena.
#[derive(Clone, Copy, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(u32),
    Closure(u32),
    Native(u32),
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl Value {
    // --- Constructors ---

    #[inline]
    pub fn undefined() -> Self {
        Value::Undefined
    }

    #[inline]
    pub fn null() -> Self {
        Value::Null
    }

    #[inline]
    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    #[inline]
    pub fn number(n: f64) -> Self {
        Value::Number(n)
    }

    #[inline]
    pub fn string(handle: u32) -> Self {
        Value::String(handle)
    }

    #[inline]
    pub fn closure(handle: u32) -> Self {
        Value::Closure(handle)
    }

    #[inline]
    pub fn native(handle: u32) -> Self {
        Value::Native(handle)
    }

    // --- Checkers ---

    #[inline]
    pub fn type_tag(&self) -> u8 {
        match self {
            Value::Undefined => TAG_UNDEFINED,
            Value::Null => TAG_NULL,
            Value::Bool(false) => TAG_FALSE,
            Value::Bool(true) => TAG_TRUE,
            Value::Number(_) => TAG_NUMBER,
            Value::String(_) => TAG_STRING,
            Value::Closure(_) => TAG_CLOSURE,
            Value::Native(_) => TAG_NATIVE,
        }
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `undefined` or `null`.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    pub fn is_closure(&self) -> bool {
        matches!(self, Value::Closure(_))
    }

    #[inline]
    pub fn is_native(&self) -> bool {
        matches!(self, Value::Native(_))
    }

    /// Anything callable: script closures and host natives.
    #[inline]
    pub fn is_callable(&self) -> bool {
        self.is_closure() || self.is_native()
    }

    #[inline]
    pub fn is_obj(&self) -> bool {
        matches!(self, Value::String(_) | Value::Closure(_) | Value::Native(_))
    }

    // --- Accessors ---

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_handle(&self) -> Option<u32> {
        match self {
            Value::String(h) | Value::Closure(h) | Value::Native(h) => Some(*h),
            _ => None,
        }
    }

    /// JavaScript truthiness for everything that does not need the heap.
    /// Strings are truthy unless empty, which the caller resolves.
    #[inline]
    pub fn is_falsey(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => *n == 0.0 || n.is_nan(),
            _ => false,
        }
    }

    /// The `typeof` name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Closure(_) | Value::Native(_) => "function",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(h) => write!(f, "String({})", h),
            Value::Closure(h) => write!(f, "Closure({})", h),
            Value::Native(h) => write!(f, "NativeFn({})", h),
        }
    }
}

/// Render a number the way JavaScript's `Number.prototype.toString` does:
/// integral values print without a fraction, negative zero prints as `0`,
/// and magnitudes of at least `1e21` or below `1e-6` use exponent notation
/// with an explicit sign (`1e+21`, `1.5e-7`).
pub fn format_number(n: f64) -> String {
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
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let text = format!("{:e}", n);
        match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        }
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}
