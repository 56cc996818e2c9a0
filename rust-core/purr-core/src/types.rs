//! # Type System for Route Parameters
//!
//! Conversion of raw path captures and query values into typed values.
//! Conversion is strict: `"7.5"` is not an int and `"maybe"` is not a bool.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Supported parameter types
///
/// Declared per parameter in a handler `Signature`.
/// Default is `String`, which performs no conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamType {
    /// String type (default) - no conversion
    #[default]
    String,
    /// Integer type - parses to i64
    Int,
    /// Float type - parses to f64
    Float,
    /// Boolean type - parses "true"/"false", "1"/"0" or "yes"/"no"
    Bool,
}

impl ParamType {
    /// Get the type name for error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Converted parameter value
///
/// Serializes as the bare JSON scalar, so handlers can echo arguments back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// String value (no conversion performed)
    String(String),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// Boolean value
    Bool(bool),
}

impl ParamValue {
    /// The type this value was converted to
    #[must_use]
    pub const fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Int(_) => ParamType::Int,
            Self::Float(_) => ParamType::Float,
            Self::Bool(_) => ParamType::Bool,
        }
    }

    /// Render the value as a string
    #[must_use]
    pub fn as_string(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Borrow as &str if String variant
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as i64 if Int variant
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if Float variant
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as bool if Bool variant
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A raw value that could not be converted to its declared type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot convert '{value}' to {expected}")]
pub struct ConversionError {
    /// The raw input
    pub value: String,
    /// The type it was supposed to become
    pub expected: ParamType,
}

/// Convert raw string to typed value based on `ParamType`
///
/// All type conversion logic is centralized here.
///
/// # Errors
///
/// Returns a `ConversionError` naming the value and the target type.
pub fn convert_param(raw: &str, param_type: ParamType) -> Result<ParamValue, ConversionError> {
    let fail = || ConversionError {
        value: raw.to_string(),
        expected: param_type,
    };

    match param_type {
        ParamType::String => Ok(ParamValue::String(raw.to_string())),
        ParamType::Int => raw.parse::<i64>().map(ParamValue::Int).map_err(|_| fail()),
        ParamType::Float => raw.parse::<f64>().map(ParamValue::Float).map_err(|_| fail()),
        ParamType::Bool => match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(ParamValue::Bool(true)),
            "false" | "0" | "no" => Ok(ParamValue::Bool(false)),
            _ => Err(fail()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_string() {
        let result = convert_param("hello", ParamType::String).unwrap();
        assert_eq!(result, ParamValue::String("hello".to_string()));
    }

    #[test]
    fn test_convert_int() {
        let result = convert_param("123", ParamType::Int).unwrap();
        assert_eq!(result, ParamValue::Int(123));

        let result = convert_param("-456", ParamType::Int).unwrap();
        assert_eq!(result, ParamValue::Int(-456));
    }

    #[test]
    fn test_convert_int_invalid() {
        let err = convert_param("abc", ParamType::Int).unwrap_err();
        assert_eq!(err.to_string(), "Cannot convert 'abc' to int");
    }

    #[test]
    fn test_convert_float() {
        let result = convert_param("2.5", ParamType::Float).unwrap();
        assert_eq!(result, ParamValue::Float(2.5));
    }

    #[test]
    fn test_convert_bool() {
        assert_eq!(convert_param("true", ParamType::Bool).unwrap(), ParamValue::Bool(true));
        assert_eq!(convert_param("NO", ParamType::Bool).unwrap(), ParamValue::Bool(false));
        assert_eq!(convert_param("1", ParamType::Bool).unwrap(), ParamValue::Bool(true));
        assert_eq!(convert_param("0", ParamType::Bool).unwrap(), ParamValue::Bool(false));
        assert!(convert_param("maybe", ParamType::Bool).is_err());
    }

    #[test]
    fn test_param_value_as_string() {
        assert_eq!(ParamValue::Int(42).as_string(), "42");
        assert_eq!(ParamValue::Float(2.5).as_string(), "2.5");
        assert_eq!(ParamValue::Bool(true).as_string(), "true");
    }

    #[test]
    fn test_param_value_serializes_bare() {
        let values = vec![
            ParamValue::from("Ada"),
            ParamValue::from(7_i64),
            ParamValue::from(true),
        ];
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"["Ada",7,true]"#);
    }

    #[test]
    fn test_param_value_type() {
        assert_eq!(ParamValue::from("x").param_type(), ParamType::String);
        assert_eq!(ParamValue::from(1_i64).param_type(), ParamType::Int);
        assert_eq!(ParamValue::from(0.5).param_type(), ParamType::Float);
        assert_eq!(ParamValue::from(false).param_type(), ParamType::Bool);
    }
}
