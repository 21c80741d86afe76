//! Type conversions shared by the instruction handlers.

use memory::{format_number, Value};

impl super::vm::VM {
    /// Resolve a string value to its contents.
    pub fn string_value(&self, value: Value) -> Option<&str> {
        match value {
            Value::String(h) => self.heap.get_string(h).map(String::as_str),
            _ => None,
        }
    }

    pub fn is_truthy(&self, value: Value) -> bool {
        match value {
            Value::String(_) => self.string_value(value).is_some_and(|s| !s.is_empty()),
            other => !other.is_falsey(),
        }
    }

    /// JavaScript `ToNumber`.
    pub fn to_number(&self, value: Value) -> f64 {
        match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => n,
            Value::String(_) => self
                .string_value(value)
                .map_or(f64::NAN, string_to_number),
            Value::Closure(_) | Value::Native(_) => f64::NAN,
        }
    }

    /// JavaScript `ToString`, used for printing and concatenation.
    pub fn display_string(&self, value: Value) -> String {
        match value {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(n),
            Value::String(_) => self
                .string_value(value)
                .map(str::to_string)
                .unwrap_or_else(|| "<bad string>".into()),
            Value::Closure(h) => format!("function {}() {{ [bytecode] }}", self.closure_name(h)),
            Value::Native(h) => {
                let name = self
                    .natives
                    .get(h as usize)
                    .map_or("<unknown>", |n| n.name.as_str());
                format!("function {}() {{ [native code] }}", name)
            }
        }
    }

    /// `===`: same type and same value. Strings compare by contents,
    /// functions by identity, and NaN is never equal to itself.
    pub fn strict_equals(&self, lhs: Value, rhs: Value) -> bool {
        match (lhs, rhs) {
            (Value::String(_), Value::String(_)) => {
                self.string_value(lhs) == self.string_value(rhs)
            }
            // f64 `==` already treats NaN as unequal and 0 == -0
            _ => lhs == rhs,
        }
    }

    /// `==` for the supported value types.
    pub fn loose_equals(&self, lhs: Value, rhs: Value) -> bool {
        match (lhs, rhs) {
            (l, r) if l.is_nullish() && r.is_nullish() => true,
            (l, r) if l.is_nullish() || r.is_nullish() => false,
            (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                self.to_number(lhs) == self.to_number(rhs)
            }
            (Value::Number(n), Value::String(_)) | (Value::String(_), Value::Number(n)) => {
                let other = if lhs.is_string() { lhs } else { rhs };
                n == self.to_number(other)
            }
            _ => self.strict_equals(lhs, rhs),
        }
    }
}

/// JavaScript `StringToNumber`: surrounding whitespace is ignored, the empty
/// string is 0, and anything that is not a numeric literal is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    // Rust also accepts "inf" and "nan"; JavaScript does not.
    if t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        t.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}
