//! # xmlrpc-serde
//!
//! A pure-Rust, type-directed decoder for XML-RPC documents, built on top of
//! the `serde` framework.
//!
//! ## Overview
//!
//! A document (`methodCall` or `methodResponse`) goes through three steps:
//!
//! 1. the [`charset`] module transcodes Latin-1 documents to UTF-8;
//! 2. the [`parse`] module builds a [`Value`] per `<param>`, or the fault value;
//! 3. the [`de`] module binds those values onto any `Deserialize` destination,
//!    or turns the fault into [`Error::Fault`].
//!
//! At the top level, a struct with exactly as many fields as the document has
//! params is filled positionally. Otherwise the single param is bound to the
//! whole destination. Below the top level, struct members bind to fields by
//! name, ignoring ASCII case.
//!
//! ## Serde type mapping
//!
//! | XML-RPC value        | Rust destination |
//! |----------------------|------------------|
//! | `<i4>`, `<int>`, `<i8>` | any integer type (range-checked), `f32`, `f64` |
//! | `<double>`           | `f32`, `f64` |
//! | `<string>`, bare text | `String`, `&str`, `char`, unit enum variant |
//! | `<boolean>`          | `bool` |
//! | `<dateTime.iso8601>` | `chrono::DateTime<FixedOffset>` / `<Local>` / `<Utc>` (local time) |
//! | `<base64>`           | `Vec<u8>`, `serde_bytes::ByteBuf` |
//! | `<nil/>`             | `Option<T>` (as `None`), `()` |
//! | `<struct>`           | struct (fields by case-insensitive name), map, `{variant: value}` enum |
//! | `<array>`            | `Vec<T>`, tuples; an empty array yields one zero-valued element |
//!
//! Struct fields without a matching member keep their zero value: `0`, `""`,
//! `false`, `None`, the Unix epoch for timestamps, an empty collection, or a
//! struct of zero values.
//!
//! ## Example
//!
//! ```rust
//! use serde::Deserialize;
//! use xmlrpc_serde::{Error, from_str};
//!
//! #[derive(Debug, PartialEq, Deserialize)]
//! struct Args {
//!     user: String,
//!     limit: u32,
//! }
//!
//! let call = "<methodCall><methodName>list</methodName><params>\
//!     <param><value><string>ada</string></value></param>\
//!     <param><value><int>10</int></value></param>\
//!     </params></methodCall>";
//! let args: Args = from_str(call).unwrap();
//! assert_eq!(args, Args { user: "ada".to_string(), limit: 10 });
//!
//! let fault = "<methodResponse><fault><value><struct>\
//!     <member><name>faultCode</name><value><int>4</int></value></member>\
//!     <member><name>faultString</name><value><string>Too many</string></value></member>\
//!     </struct></value></fault></methodResponse>";
//! let err = from_str::<Args>(fault).unwrap_err();
//! assert_eq!(err.fault().map(|f| f.code), Some(4));
//! assert!(matches!(err, Error::Fault(_)));
//! ```

pub mod charset;
pub mod de;
pub mod descriptor;
pub mod error;
pub mod fault;
pub mod parse;
pub mod value;

pub use de::{
    Deserializer, ParamsDeserializer, decode, from_message, from_slice, from_str, from_value,
};
pub use error::{Error, Result};
pub use fault::Fault;
pub use parse::{Body, Message, MessageKind, parse_message};
pub use value::Value;

pub use serde::Deserialize;
