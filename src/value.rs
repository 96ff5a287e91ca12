//! The generic XML-RPC value tree.

use chrono::{DateTime, FixedOffset};

/// One XML-RPC `<value>`.
///
/// Struct members keep their document order and original casing; names are
/// not required to be unique.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Double(f64),
    Str(String),
    Bool(bool),
    /// `dateTime.iso8601`, read in the local time zone.
    DateTime(DateTime<FixedOffset>),
    Binary(Vec<u8>),
    Nil,
    Struct(Vec<(String, Value)>),
    Array(Vec<Value>),
}

impl Value {
    /// The XML-RPC name of this value's kind, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Binary(_) => "base64",
            Value::Nil => "nil",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
        }
    }

    /// First struct member named exactly `name`.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(members) => members
                .iter()
                .find(|(member, _)| member == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}
