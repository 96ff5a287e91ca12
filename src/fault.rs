//! XML-RPC fault responses.
//!
//! A `<fault>` carries a struct with exactly two members, `faultCode` (int)
//! and `faultString` (string). Member names are matched case-sensitively, as
//! the wire format spells them.

use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;
use tracing::debug;

/// A fault reported by the remote side instead of a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: i64,
    pub message: String,
}

impl Fault {
    /// Translate the value of a top-level `<fault>` element.
    pub fn from_value(value: &Value) -> Result<Fault> {
        if !matches!(value, Value::Struct(_)) {
            return Err(Error::MalformedFault(format!(
                "fault value is {}, expected struct",
                value.kind()
            )));
        }

        let code = match value.member("faultCode") {
            Some(Value::Int(code)) => *code,
            Some(other) => {
                return Err(Error::MalformedFault(format!(
                    "faultCode is {}, expected int",
                    other.kind()
                )));
            }
            None => return Err(Error::MalformedFault("missing faultCode".to_string())),
        };

        let message = match value.member("faultString") {
            Some(Value::Str(message)) => message.clone(),
            Some(other) => {
                return Err(Error::MalformedFault(format!(
                    "faultString is {}, expected string",
                    other.kind()
                )));
            }
            None => return Err(Error::MalformedFault("missing faultString".to_string())),
        };

        debug!(code, "remote side reported a fault");
        Ok(Fault { code, message })
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault {}: {}", self.code, self.message)
    }
}

impl std::error::Error for Fault {}
