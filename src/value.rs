//! Value capabilities.
//!
//! Series values only need `Clone + PartialEq` for storage and compaction.
//! Numeric aggregation (mean, quantile, moving average) additionally needs
//! [`Scalar`], checked per operation rather than on the series type.

use crate::{Error, Result};

/// Numeric view of a series value.
pub trait Scalar {
    /// Numeric value, or `UnsupportedValueType` when the value has none.
    fn to_f64(&self) -> Result<f64>;

    /// Missing values are skipped by aggregations instead of failing them.
    fn is_null(&self) -> bool {
        false
    }
}

macro_rules! impl_numeric_scalar {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                fn to_f64(&self) -> Result<f64> {
                    Ok(*self as f64)
                }
            }
        )*
    };
}

impl_numeric_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Scalar for bool {
    fn to_f64(&self) -> Result<f64> {
        Ok(if *self { 1.0 } else { 0.0 })
    }
}

impl<T: Scalar> Scalar for Option<T> {
    fn to_f64(&self) -> Result<f64> {
        match self {
            Some(value) => value.to_f64(),
            None => Err(Error::UnsupportedValueType("missing value".to_string())),
        }
    }

    fn is_null(&self) -> bool {
        self.as_ref().map_or(true, Scalar::is_null)
    }
}

impl Scalar for String {
    fn to_f64(&self) -> Result<f64> {
        Err(Error::UnsupportedValueType(format!("text {self:?}")))
    }
}

impl Scalar for &str {
    fn to_f64(&self) -> Result<f64> {
        Err(Error::UnsupportedValueType(format!("text {self:?}")))
    }
}

/// Dynamically typed measurement, for loaders that produce mixed values.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
        }
    }
}

impl Scalar for Value {
    fn to_f64(&self) -> Result<f64> {
        match self {
            Value::Bool(value) => value.to_f64(),
            Value::Int(value) => value.to_f64(),
            Value::Float(value) => Ok(*value),
            Value::Null | Value::Text(_) => Err(Error::UnsupportedValueType(format!(
                "can't take numeric value of {}",
                self.type_name()
            ))),
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_convert() {
        assert_eq!(3_i32.to_f64().unwrap(), 3.0);
        assert_eq!(true.to_f64().unwrap(), 1.0);
        assert_eq!(Value::Float(2.5).to_f64().unwrap(), 2.5);
        assert_eq!(Some(4_u8).to_f64().unwrap(), 4.0);
    }

    #[test]
    fn text_is_unsupported() {
        let err = Value::from("idle").to_f64().unwrap_err();
        assert!(matches!(err, Error::UnsupportedValueType(_)));
        assert!("idle".to_f64().is_err());
    }

    #[test]
    fn nulls_are_flagged() {
        assert!(Value::Null.is_null());
        assert!(None::<i64>.is_null());
        assert!(!Some(1_i64).is_null());
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn untagged_json() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, true, 3, 1.5, "on"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Int(3),
                Value::Float(1.5),
                Value::Text("on".to_string()),
            ]
        );
    }
}
