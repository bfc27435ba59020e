//! The driver-level value and the scalar protocol.
//!
//! [`Value`] is the dynamically typed scalar that crosses the driver
//! boundary in both directions. A field type participates in row binding by
//! implementing [`ToValue`] and [`FromValue`]; implementing them also makes
//! the type a recursion terminator for the binder, so a struct that can
//! represent itself as a single database value is scanned as one column
//! instead of being flattened.

use crate::error::{LoamError, Result};

/// A single database value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// True for the default value of the variant's Rust counterpart. Used by
    /// `save` to decide between insert and update.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Int(i) => *i == 0,
            Value::Real(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::Blob(b) => b.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }
}

/// Write side of the scalar protocol: produce a driver-level scalar.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Read side of the scalar protocol: rebuild the type from a driver value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch(expected: &str, got: &Value) -> LoamError {
    LoamError::scan(format!("expected {expected}, got {}", got.type_name()))
}

macro_rules! int_value {
    ($($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }
        }
        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Int(i) => <$t>::try_from(i).map_err(|_| {
                        LoamError::scan(format!(
                            "integer {i} out of range for {}",
                            stringify!($t)
                        ))
                    }),
                    other => Err(mismatch("integer", &other)),
                }
            }
        }
    )*};
}

int_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(i) => Ok(i != 0),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Real(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Real(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch("real", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Real(f64::from(*self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> Value {
        Value::Blob(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(b) => Ok(b),
            other => Err(mismatch("blob", &other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

#[cfg(feature = "chrono")]
mod chrono_impls {
    use super::{mismatch, FromValue, Result, ToValue, Value};
    use crate::error::LoamError;
    use chrono::NaiveDateTime;

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    impl ToValue for NaiveDateTime {
        fn to_value(&self) -> Value {
            Value::Text(self.format(FORMAT).to_string())
        }
    }

    impl FromValue for NaiveDateTime {
        fn from_value(value: Value) -> Result<Self> {
            match value {
                Value::Text(s) => NaiveDateTime::parse_from_str(&s, FORMAT)
                    .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S"))
                    .map_err(|e| LoamError::scan(format!("invalid timestamp {s:?}: {e}"))),
                other => Err(mismatch("text", &other)),
            }
        }
    }
}

/// Object-safe write target used by the binder. Blanket-implemented for
/// every scalar-protocol type, so a `&mut field` coerces to `&mut dyn Sink`.
pub trait Sink {
    fn set_value(&mut self, value: Value) -> Result<()>;
}

impl<T: FromValue> Sink for T {
    fn set_value(&mut self, value: Value) -> Result<()> {
        *self = T::from_value(value)?;
        Ok(())
    }
}
