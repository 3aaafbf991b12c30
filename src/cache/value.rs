//! Cache Value Module
//!
//! Tagged numeric type used by the increment family, plus a general-purpose
//! payload type for callers that do not bring their own.

use serde::{Deserialize, Serialize};

// == Number Kind ==
/// Width tag of a stored [`Number`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl NumberKind {
    /// Lowercase Rust type name, used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::U8 => "u8",
            NumberKind::U16 => "u16",
            NumberKind::U32 => "u32",
            NumberKind::U64 => "u64",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }
}

// == Number ==
/// A numeric value that remembers its exact width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Number {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(
        #[serde(serialize_with = "float_repr::write_f32", deserialize_with = "float_repr::read_f32")]
        f32,
    ),
    F64(
        #[serde(serialize_with = "float_repr::write_f64", deserialize_with = "float_repr::read_f64")]
        f64,
    ),
}

/// JSON has no literal for NaN or the infinities, so those travel as the
/// strings `"NaN"`, `"inf"` and `"-inf"`. Finite floats stay plain numbers.
mod float_repr {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Finite(f64),
        Special(String),
    }

    fn special_name(n: f64) -> &'static str {
        if n.is_nan() {
            "NaN"
        } else if n > 0.0 {
            "inf"
        } else {
            "-inf"
        }
    }

    pub(super) fn write_f32<S: Serializer>(n: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if n.is_finite() {
            serializer.serialize_f32(*n)
        } else {
            serializer.serialize_str(special_name(f64::from(*n)))
        }
    }

    pub(super) fn write_f64<S: Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if n.is_finite() {
            serializer.serialize_f64(*n)
        } else {
            serializer.serialize_str(special_name(*n))
        }
    }

    pub(super) fn read_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        read_f64(deserializer).map(|n| n as f32)
    }

    pub(super) fn read_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Finite(n) => Ok(n),
            Repr::Special(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("invalid float `{other}`"))),
            },
        }
    }
}

/// Applies a wrapping integer op to every integer width; floats yield `false`.
macro_rules! integer_op {
    ($num:expr, $delta:expr, $op:ident) => {
        match $num {
            Number::I8(n) => *n = n.$op($delta as i8),
            Number::I16(n) => *n = n.$op($delta as i16),
            Number::I32(n) => *n = n.$op($delta as i32),
            Number::I64(n) => *n = n.$op($delta),
            Number::U8(n) => *n = n.$op($delta as u8),
            Number::U16(n) => *n = n.$op($delta as u16),
            Number::U32(n) => *n = n.$op($delta as u32),
            Number::U64(n) => *n = n.$op($delta as u64),
            Number::F32(_) | Number::F64(_) => return false,
        }
    };
}

impl Number {
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::I8(_) => NumberKind::I8,
            Number::I16(_) => NumberKind::I16,
            Number::I32(_) => NumberKind::I32,
            Number::I64(_) => NumberKind::I64,
            Number::U8(_) => NumberKind::U8,
            Number::U16(_) => NumberKind::U16,
            Number::U32(_) => NumberKind::U32,
            Number::U64(_) => NumberKind::U64,
            Number::F32(_) => NumberKind::F32,
            Number::F64(_) => NumberKind::F64,
        }
    }

    /// Adds `delta` in place, truncated to the stored width, wrapping on overflow.
    ///
    /// Returns `false` without touching the value if this is a float.
    pub fn wrapping_add_int(&mut self, delta: i64) -> bool {
        integer_op!(self, delta, wrapping_add);
        true
    }

    /// Subtracts `delta` in place, truncated to the stored width, wrapping on overflow.
    ///
    /// Returns `false` without touching the value if this is a float.
    pub fn wrapping_sub_int(&mut self, delta: i64) -> bool {
        integer_op!(self, delta, wrapping_sub);
        true
    }

    /// Adds `delta` in place to a float. Returns `false` for integers.
    pub fn add_float(&mut self, delta: f64) -> bool {
        match self {
            Number::F32(n) => *n += delta as f32,
            Number::F64(n) => *n += delta,
            _ => return false,
        }
        true
    }
}

macro_rules! number_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Number {
                fn from(n: $ty) -> Self {
                    Number::$variant(n)
                }
            }

            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::$variant(n))
                }
            }
        )*
    };
}

number_from! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64,
}

// == Value ==
/// General-purpose cache payload.
///
/// Serialized with an explicit `type` tag so every variant reads back as
/// itself, e.g. a JSON array stays `Json` rather than becoming `Bytes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Number(Number),
    Text(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Json(serde_json::Value),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

// == As Number ==
/// Payload types that may hold a [`Number`] and so support the increment family.
pub trait AsNumber {
    /// Mutable access to the numeric content, or `None` for non-numeric payloads.
    fn as_number_mut(&mut self) -> Option<&mut Number>;
}

impl AsNumber for Number {
    fn as_number_mut(&mut self) -> Option<&mut Number> {
        Some(self)
    }
}

impl AsNumber for Value {
    fn as_number_mut(&mut self) -> Option<&mut Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Number::from(1u16).kind(), NumberKind::U16);
        assert_eq!(Number::from(1.5f32).kind(), NumberKind::F32);
    }

    #[test]
    fn test_int_add_keeps_width() {
        let mut n = Number::I16(10);
        assert!(n.wrapping_add_int(5));
        assert_eq!(n, Number::I16(15));
    }

    #[test]
    fn test_int_add_wraps() {
        let mut n = Number::U8(250);
        assert!(n.wrapping_add_int(10));
        assert_eq!(n, Number::U8(4));

        let mut n = Number::I8(i8::MIN);
        assert!(n.wrapping_sub_int(1));
        assert_eq!(n, Number::I8(i8::MAX));
    }

    #[test]
    fn test_negative_delta_on_unsigned() {
        let mut n = Number::U32(10);
        assert!(n.wrapping_add_int(-3));
        assert_eq!(n, Number::U32(7));
    }

    #[test]
    fn test_int_op_rejects_float() {
        let mut n = Number::F64(1.0);
        assert!(!n.wrapping_add_int(1));
        assert_eq!(n, Number::F64(1.0));
    }

    #[test]
    fn test_float_add() {
        let mut n = Number::F32(1.5);
        assert!(n.add_float(0.25));
        assert_eq!(n, Number::F32(1.75));

        let mut n = Number::I64(1);
        assert!(!n.add_float(1.0));
        assert_eq!(n, Number::I64(1));
    }

    #[test]
    fn test_value_as_number() {
        let mut v = Value::from(7i32);
        assert_eq!(v.as_number_mut().map(|n| n.kind()), Some(NumberKind::I32));

        let mut v = Value::from("text");
        assert!(v.as_number_mut().is_none());
    }

    #[test]
    fn test_value_serde() {
        let v = Value::from(42u64);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"type":"number","value":{"kind":"u64","value":42}}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);

        let text: Value = serde_json::from_str(r#"{"type":"text","value":"hello"}"#).unwrap();
        assert_eq!(text, Value::Text("hello".to_string()));
    }

    #[test]
    fn test_every_variant_reads_back_as_itself() {
        let values = vec![
            Value::from(-3i8),
            Value::from(u16::MAX),
            Value::from(i64::MIN),
            Value::from(u64::MAX),
            Value::from(1.1f32),
            Value::from(2.5f64),
            Value::from(f64::INFINITY),
            Value::from(f32::NEG_INFINITY),
            Value::from("hi"),
            Value::from(vec![1u8, 2, 3]),
            Value::from(true),
            Value::from(serde_json::json!([1, 2, 3])),
            Value::from(serde_json::json!("hi")),
            Value::from(serde_json::json!({ "kind": "u8", "value": 1 })),
            Value::from(serde_json::Value::Null),
        ];

        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value, "round trip through {json}");
        }
    }

    #[test]
    fn test_nan_survives_serde() {
        let json = serde_json::to_string(&Value::from(f64::NAN)).unwrap();
        assert_eq!(json, r#"{"type":"number","value":{"kind":"f64","value":"NaN"}}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Value::Number(Number::F64(n)) if n.is_nan()));

        let json = serde_json::to_string(&Number::F32(f32::NAN)).unwrap();
        let back: Number = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Number::F32(n) if n.is_nan()));
    }

    #[test]
    fn test_unknown_float_literal_rejected() {
        let err = serde_json::from_str::<Number>(r#"{"kind":"f64","value":"nope"}"#);
        assert!(err.is_err());
    }
}
