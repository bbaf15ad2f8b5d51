//! Cached Value Model
//!
//! Tagged union of everything the cache can hold. Numeric variants keep their
//! original width so increment wraps and decrement saturates at the right bounds.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// == Value ==
/// A value stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// In-process object that can be cached but never persisted
    Opaque(Opaque),
}

impl Value {
    /// Wraps an arbitrary in-process object.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Opaque(o) => o.type_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns any integer variant widened to `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(i64::from(v)),
            Value::I16(v) => Some(i64::from(v)),
            Value::I32(v) => Some(i64::from(v)),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(i64::from(v)),
            Value::U16(v) => Some(i64::from(v)),
            Value::U32(v) => Some(i64::from(v)),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(f64::from(v)),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the type name of the first value, depth-first, that cannot be
    /// persisted.
    pub fn unencodable_type(&self) -> Option<&'static str> {
        match self {
            Value::Opaque(o) => Some(o.type_name()),
            Value::List(items) => items.iter().find_map(Value::unencodable_type),
            Value::Map(entries) => entries.values().find_map(Value::unencodable_type),
            _ => None,
        }
    }

    // == Numeric Dispatch ==
    /// Adds `delta` to an integer value, wrapping at the stored width.
    ///
    /// Returns `None` if the value is not an integer.
    pub(crate) fn wrapping_increment(&mut self, delta: i64) -> Option<i64> {
        macro_rules! bump {
            ($v:ident, $t:ty) => {{
                *$v = $v.wrapping_add(delta as $t);
                Some(*$v as i64)
            }};
        }
        match self {
            Value::I8(v) => bump!(v, i8),
            Value::I16(v) => bump!(v, i16),
            Value::I32(v) => bump!(v, i32),
            Value::I64(v) => bump!(v, i64),
            Value::U8(v) => bump!(v, u8),
            Value::U16(v) => bump!(v, u16),
            Value::U32(v) => bump!(v, u32),
            Value::U64(v) => bump!(v, u64),
            _ => None,
        }
    }

    /// Subtracts `delta` from an integer value, clamping the result to
    /// `0..=MAX` of the stored width.
    ///
    /// Returns `None` if the value is not an integer.
    pub(crate) fn saturating_decrement(&mut self, delta: i64) -> Option<i64> {
        macro_rules! drop_to_floor {
            ($v:ident, $t:ty) => {{
                let next = (i128::from(*$v) - i128::from(delta))
                    .clamp(0, i128::from(<$t>::MAX));
                *$v = next as $t;
                Some(*$v as i64)
            }};
        }
        match self {
            Value::I8(v) => drop_to_floor!(v, i8),
            Value::I16(v) => drop_to_floor!(v, i16),
            Value::I32(v) => drop_to_floor!(v, i32),
            Value::I64(v) => drop_to_floor!(v, i64),
            Value::U8(v) => drop_to_floor!(v, u8),
            Value::U16(v) => drop_to_floor!(v, u16),
            Value::U32(v) => drop_to_floor!(v, u32),
            Value::U64(v) => drop_to_floor!(v, u64),
            _ => None,
        }
    }

    /// Adds `delta` to a floating point value.
    pub(crate) fn float_increment(&mut self, delta: f64) -> Option<f64> {
        match self {
            Value::F32(v) => {
                *v += delta as f32;
                Some(f64::from(*v))
            }
            Value::F64(v) => {
                *v += delta;
                Some(*v)
            }
            _ => None,
        }
    }
}

// == Conversions ==
macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Str,
    Vec<u8> => Bytes,
    Vec<Value> => List,
    BTreeMap<String, Value> => Map,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::I64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::U64(u)
                } else {
                    n.as_f64().map_or(Value::Null, Value::F64)
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// == Opaque ==
/// A shared in-process object plus the name of its Rust type.
#[derive(Clone)]
pub struct Opaque {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

impl Serialize for Opaque {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom(format!(
            "cannot encode value of type {}",
            self.type_name
        )))
    }
}

impl<'de> Deserialize<'de> for Opaque {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(serde::de::Error::custom("opaque values cannot be decoded"))
    }
}
