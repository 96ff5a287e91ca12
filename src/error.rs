use crate::fault::Fault;
use serde::de;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding an XML-RPC document.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A custom error message from serde, raised outside any field
    Message(String),

    /// The document is not well-formed XML
    Xml(String),

    /// The document declares a charset other than UTF-8 or Latin-1
    UnsupportedCharset(String),

    /// The text of a scalar element could not be parsed as its declared kind
    InvalidScalar { kind: &'static str, text: String },

    /// An element appeared where the XML-RPC grammar does not allow it
    UnexpectedElement { found: String, context: &'static str },

    /// A required element was missing
    MissingElement {
        name: &'static str,
        context: &'static str,
    },

    /// The document is a fault response without a usable code or message
    MalformedFault(String),

    /// The server answered with a fault
    Fault(Fault),

    /// The value kind does not fit the destination
    Mismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The destination rejected a value of the right kind (e.g. out of range)
    Binding { path: String, message: String },

    /// The number of params fits neither positional nor single-value binding
    Arity { params: usize, expected: usize },
}

impl Error {
    pub(crate) fn mismatch(expected: &'static str, actual: &'static str) -> Self {
        Error::Mismatch {
            path: String::new(),
            expected,
            actual,
        }
    }

    pub(crate) fn invalid_scalar(kind: &'static str, text: &str) -> Self {
        Error::InvalidScalar {
            kind,
            text: text.to_string(),
        }
    }

    /// The fault reported by the server, if this error is one.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Error::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// True for errors raised before binding started: bad XML, bad scalar text,
    /// grammar violations and malformed faults.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Error::Xml(_)
                | Error::UnsupportedCharset(_)
                | Error::InvalidScalar { .. }
                | Error::UnexpectedElement { .. }
                | Error::MissingElement { .. }
                | Error::MalformedFault(_)
        )
    }

    /// True for errors raised while projecting values onto the destination.
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            Error::Mismatch { .. } | Error::Binding { .. } | Error::Arity { .. } | Error::Message(_)
        )
    }

    /// Prefix the path of a binding error with a struct field or member name.
    pub(crate) fn at_field(self, name: &str) -> Self {
        self.with_path(|rest| match rest.chars().next() {
            None => name.to_string(),
            Some('[') => format!("{name}{rest}"),
            Some(_) => format!("{name}.{rest}"),
        })
    }

    /// Prefix the path of a binding error with a sequence index.
    pub(crate) fn at_index(self, index: usize) -> Self {
        self.with_path(|rest| match rest.chars().next() {
            None | Some('[') => format!("[{index}]{rest}"),
            Some(_) => format!("[{index}].{rest}"),
        })
    }

    fn with_path(self, prefix: impl FnOnce(&str) -> String) -> Self {
        match self {
            Error::Mismatch {
                path,
                expected,
                actual,
            } => Error::Mismatch {
                path: prefix(&path),
                expected,
                actual,
            },
            Error::Binding { path, message } => Error::Binding {
                path: prefix(&path),
                message,
            },
            Error::Message(message) => Error::Binding {
                path: prefix(""),
                message,
            },
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Message(msg) => write!(f, "{}", msg),
            Error::Xml(msg) => write!(f, "malformed XML: {}", msg),
            Error::UnsupportedCharset(label) => write!(f, "unsupported charset: {}", label),
            Error::InvalidScalar { kind, text } => {
                write!(f, "invalid <{}> text: {:?}", kind, text)
            }
            Error::UnexpectedElement { found, context } => {
                write!(f, "unexpected element <{}> in {}", found, context)
            }
            Error::MissingElement { name, context } => {
                write!(f, "missing <{}> in {}", name, context)
            }
            Error::MalformedFault(msg) => write!(f, "malformed fault: {}", msg),
            Error::Fault(fault) => write!(f, "{}", fault),
            Error::Mismatch {
                path,
                expected,
                actual,
            } if path.is_empty() => write!(f, "expected {}, found {}", expected, actual),
            Error::Mismatch {
                path,
                expected,
                actual,
            } => write!(f, "{}: expected {}, found {}", path, expected, actual),
            Error::Binding { path, message } => write!(f, "{}: {}", path, message),
            Error::Arity { params, expected } => {
                write!(f, "document has {} params, destination takes {}", params, expected)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        Error::Fault(fault)
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}
