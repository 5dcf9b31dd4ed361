//! Scalar values returned by remote queries
//!
//! Conversions out of [`Value`] are strict: a string never becomes a number and
//! a float never becomes an integer. Integer widening and lossless signedness
//! changes are allowed.

use std::fmt;

use errors::{ProbeError, Result};
use serde::{Deserialize, Serialize};

/// A single scalar read from a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    String(String),
}

impl Value {
    /// Name of the variant, used in type mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Unsigned(_) => "unsigned",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for `Value::String("")`
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Self::String(s) if s.is_empty())
    }

    fn mismatch(&self, expected: &str) -> ProbeError {
        ProbeError::type_mismatch(expected, format!("{} ({})", self.type_name(), self))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Unsigned(u) => write!(f, "{}", u),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Unsigned(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Unsigned(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl TryFrom<Value> for String {
    type Error = ProbeError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }
}

impl TryFrom<Value> for u64 {
    type Error = ProbeError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Unsigned(u) => Ok(u),
            Value::Integer(i) if i >= 0 => Ok(i as u64),
            other => Err(other.mismatch("unsigned")),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = ProbeError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            Value::Unsigned(u) if u <= i64::MAX as u64 => Ok(u as i64),
            other => Err(other.mismatch("integer")),
        }
    }
}

impl TryFrom<Value> for f64 {
    type Error = ProbeError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Integer(i) => Ok(i as f64),
            Value::Unsigned(u) => Ok(u as f64),
            other => Err(other.mismatch("float")),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = ProbeError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other.mismatch("bool")),
        }
    }
}
