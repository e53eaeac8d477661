//! Raw reading values and their numeric conversions.

use alloc::string::{String, ToString};
use core::fmt;

use crate::MetricType;

/// A single raw reading as reported by a plugin.
///
/// Plugins report whatever representation is natural for their source: a
/// `u64` counter read from a kernel file, a float gauge, or a numeric string
/// scraped from a text protocol. The declared [`MetricType`] decides how the
/// value is interpreted when it is emitted.
///
/// With the `serde` feature the value (de)serializes as a bare JSON number
/// or string. Integers that fit in 32 bits come back as [`Value::U32`],
/// larger ones as [`Value::U64`], everything else numeric as [`Value::F64`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    /// Unsigned 32-bit integer.
    U32(u32),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit float.
    F64(f64),
    /// A number encoded as text, parsed according to the declared type.
    Str(String),
}

impl Value {
    /// The zero value of a representation.
    pub fn zero(ty: MetricType) -> Self {
        match ty {
            MetricType::Uint32 => Value::U32(0),
            MetricType::Uint64 => Value::U64(0),
            MetricType::Float => Value::F64(0.0),
        }
    }

    /// Lossy conversion to `u32`.
    ///
    /// Wider integers are truncated, floats are cast, and strings that do
    /// not parse yield `0`.
    pub fn to_u32(&self) -> u32 {
        match self {
            Value::U32(v) => *v,
            Value::U64(v) => *v as u32,
            Value::F64(v) => *v as u32,
            Value::Str(s) => s.parse().unwrap_or(0),
        }
    }

    /// Lossy conversion to `u64`. Unparseable strings yield `0`.
    pub fn to_u64(&self) -> u64 {
        match self {
            Value::U32(v) => u64::from(*v),
            Value::U64(v) => *v,
            Value::F64(v) => *v as u64,
            Value::Str(s) => s.parse().unwrap_or(0),
        }
    }

    /// Lossy conversion to `f64`. Unparseable strings yield `0.0`.
    pub fn to_f64(&self) -> f64 {
        match self {
            Value::U32(v) => f64::from(*v),
            Value::U64(v) => *v as f64,
            Value::F64(v) => *v,
            Value::Str(s) => s.parse().unwrap_or(0.0),
        }
    }

    /// Interpret a string reading as the declared representation.
    ///
    /// Non-string values are returned unchanged. A string that does not
    /// parse returns an error; callers fall back to [`Value::zero`].
    pub fn parse_as(&self, ty: MetricType) -> Result<Value, ParseValueError> {
        let Value::Str(s) = self else {
            return Ok(self.clone());
        };

        let parsed = match ty {
            MetricType::Uint32 => s.parse().map(Value::U32).ok(),
            MetricType::Uint64 => s.parse().map(Value::U64).ok(),
            MetricType::Float => s.parse().map(Value::F64).ok(),
        };

        parsed.ok_or_else(|| ParseValueError {
            input: s.clone(),
            ty,
        })
    }

    /// Whether the value may be persisted or emitted.
    ///
    /// Only floats can be non-finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::F64(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// A string reading that is not a valid number of the declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseValueError {
    /// The offending text.
    pub input: String,
    /// The representation it was parsed as.
    pub ty: MetricType,
}

impl fmt::Display for ParseValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse {:?} as {:?}", self.input, self.ty)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseValueError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_u32_from_every_variant() {
        assert_eq!(Value::U32(100).to_u32(), 100);
        assert_eq!(Value::U64(100).to_u32(), 100);
        assert_eq!(Value::F64(100.0).to_u32(), 100);
        assert_eq!(Value::from("100").to_u32(), 100);
    }

    #[test]
    fn to_u64_from_every_variant() {
        assert_eq!(Value::U32(100).to_u64(), 100);
        assert_eq!(Value::U64(100).to_u64(), 100);
        assert_eq!(Value::F64(100.0).to_u64(), 100);
        assert_eq!(Value::from("100").to_u64(), 100);
    }

    #[test]
    fn to_f64_from_every_variant() {
        assert_eq!(Value::U32(100).to_f64(), 100.0);
        assert_eq!(Value::U64(100).to_f64(), 100.0);
        assert_eq!(Value::F64(100.0).to_f64(), 100.0);
        assert_eq!(Value::from("100").to_f64(), 100.0);
    }

    #[test]
    fn u64_truncates_into_u32() {
        assert_eq!(Value::U64(u64::from(u32::MAX) + 2).to_u32(), 1);
    }

    #[test]
    fn unparseable_string_converts_to_zero() {
        let v = Value::from("twelve");
        assert_eq!(v.to_u32(), 0);
        assert_eq!(v.to_u64(), 0);
        assert_eq!(v.to_f64(), 0.0);
    }

    #[test]
    fn parse_as_follows_declared_type() {
        let v = Value::from("42");
        assert_eq!(v.parse_as(MetricType::Uint32), Ok(Value::U32(42)));
        assert_eq!(v.parse_as(MetricType::Uint64), Ok(Value::U64(42)));
        assert_eq!(v.parse_as(MetricType::Float), Ok(Value::F64(42.0)));
    }

    #[test]
    fn parse_as_leaves_numbers_alone() {
        assert_eq!(
            Value::F64(1.5).parse_as(MetricType::Uint64),
            Ok(Value::F64(1.5))
        );
    }

    #[test]
    fn parse_as_reports_bad_input() {
        let err = Value::from("1.5").parse_as(MetricType::Uint32).unwrap_err();
        assert_eq!(err.input, "1.5");
        assert_eq!(err.ty, MetricType::Uint32);

        // out of range for 32 bits
        assert!(Value::from("4294967296")
            .parse_as(MetricType::Uint32)
            .is_err());
    }

    #[test]
    fn zero_matches_representation() {
        assert_eq!(Value::zero(MetricType::Uint32), Value::U32(0));
        assert_eq!(Value::zero(MetricType::Uint64), Value::U64(0));
        assert_eq!(Value::zero(MetricType::Float), Value::F64(0.0));
    }

    #[test]
    fn only_floats_can_be_non_finite() {
        assert!(Value::U64(u64::MAX).is_finite());
        assert!(Value::from("NaN").is_finite());
        assert!(Value::F64(3.0).is_finite());
        assert!(!Value::F64(f64::NAN).is_finite());
        assert!(!Value::F64(f64::INFINITY).is_finite());
        assert!(!Value::F64(f64::NEG_INFINITY).is_finite());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_picks_narrowest_variant() {
        let v: Value = serde_json::from_str("500").unwrap();
        assert_eq!(v, Value::U32(500));

        let v: Value = serde_json::from_str("18446744073709551515").unwrap();
        assert_eq!(v, Value::U64(u64::MAX - 100));

        let v: Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(v, Value::F64(2.5));

        let v: Value = serde_json::from_str("\"17\"").unwrap();
        assert_eq!(v, Value::from("17"));

        assert_eq!(serde_json::to_string(&Value::U64(7)).unwrap(), "7");
        assert_eq!(serde_json::to_string(&Value::F64(3.0)).unwrap(), "3.0");
    }
}
