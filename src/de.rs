//! Binding of parsed XML-RPC values onto serde destinations.
//!
//! [`ParamsDeserializer`] applies the top-level rules (positional binding of
//! params to struct fields, or a single param to the whole destination) and
//! [`Deserializer`] projects one [`Value`] onto whatever the destination asks
//! for. A deserializer without a value produces the destination's zero value;
//! that is what absent struct members and empty arrays bind to.

use crate::descriptor;
use crate::error::{Error, Result};
use crate::fault::Fault;
use crate::parse::{self, Body, Message};
use crate::value::Value;
use serde::de::{
    self, Deserialize, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess,
    SeqAccess, VariantAccess, Visitor,
};
use serde::de::Deserializer as _;
use tracing::debug;

/// Decode an XML-RPC document into a new value of type `T`.
pub fn from_slice<T: DeserializeOwned>(input: &[u8]) -> Result<T> {
    let message = parse::parse_message(input)?;
    from_message(&message)
}

/// Decode an XML-RPC document held in a string.
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    from_slice(input.as_bytes())
}

/// Decode an XML-RPC document into `destination`.
///
/// `destination` is only assigned once the whole document has been parsed and
/// bound; on any error, faults included, it keeps its previous contents.
pub fn decode<T: DeserializeOwned>(input: &[u8], destination: &mut T) -> Result<()> {
    *destination = from_slice(input)?;
    Ok(())
}

/// Bind the params of an already parsed message, or report its fault.
pub fn from_message<'de, T: Deserialize<'de>>(message: &'de Message) -> Result<T> {
    match &message.body {
        Body::Fault(value) => Err(Error::Fault(Fault::from_value(value)?)),
        Body::Params(params) => {
            debug!(
                method = ?message.method_name,
                params = params.len(),
                "binding XML-RPC params"
            );
            T::deserialize(ParamsDeserializer::new(params))
        }
    }
}

/// Bind a single value.
pub fn from_value<'de, T: Deserialize<'de>>(value: &'de Value) -> Result<T> {
    T::deserialize(Deserializer::new(value))
}

// ── ParamsDeserializer: top-level params ───────────────────────────────────

/// Deserializer over the params of a `methodCall` or `methodResponse`.
///
/// A struct (or tuple) with exactly as many fields as there are params is
/// filled positionally, field names ignored. Any other destination takes the
/// single param as a whole.
#[derive(Debug, Clone, Copy)]
pub struct ParamsDeserializer<'de> {
    params: &'de [Value],
}

impl<'de> ParamsDeserializer<'de> {
    pub fn new(params: &'de [Value]) -> Self {
        ParamsDeserializer { params }
    }

    fn single(self) -> Result<Deserializer<'de>> {
        match self.params {
            [] => Ok(Deserializer::absent()),
            [value] => Ok(Deserializer::new(value)),
            params => Err(Error::Arity {
                params: params.len(),
                expected: 1,
            }),
        }
    }

    fn positional(self) -> Vec<Option<&'de Value>> {
        self.params.iter().map(Some).collect()
    }
}

macro_rules! forward_to_single {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            de::Deserializer::$method(self.single()?, visitor)
        }
    )*};
}

impl<'de> de::Deserializer<'de> for ParamsDeserializer<'de> {
    type Error = Error;

    forward_to_single! {
        deserialize_any deserialize_bool
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64 deserialize_char
        deserialize_str deserialize_string deserialize_bytes deserialize_byte_buf
        deserialize_option deserialize_unit deserialize_seq deserialize_map
        deserialize_identifier deserialize_ignored_any
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_unit_struct(self.single()?, name, visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_newtype_struct(self.single()?, name, visitor)
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        if len == self.params.len() {
            return visitor.visit_seq(ElementAccess::new(self.positional()));
        }
        de::Deserializer::deserialize_tuple(self.single()?, len, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        if len == self.params.len() {
            return visitor.visit_seq(ElementAccess::new(self.positional()));
        }
        de::Deserializer::deserialize_tuple_struct(self.single()?, name, len, visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        if fields.len() == self.params.len() {
            debug!(name, params = self.params.len(), "binding params positionally");
            return visitor.visit_map(FieldAccess::new(fields, self.positional()));
        }
        de::Deserializer::deserialize_struct(self.single()?, name, fields, visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_enum(self.single()?, name, variants, visitor)
    }
}

// ── Deserializer: one value ────────────────────────────────────────────────

/// Deserializer over one XML-RPC value, or over nothing (the zero value).
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<'de> {
    value: Option<&'de Value>,
}

impl<'de> Deserializer<'de> {
    pub fn new(value: &'de Value) -> Self {
        Deserializer { value: Some(value) }
    }

    /// A deserializer that yields `0`, `""`, `false`, `None`, empty
    /// collections, or structs made of those.
    pub fn absent() -> Self {
        Deserializer { value: None }
    }
}

macro_rules! deserialize_integer {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            match self.value {
                None => visitor.visit_i64(0),
                Some(Value::Int(i)) => visitor.visit_i64(*i),
                Some(other) => Err(Error::mismatch("int", other.kind())),
            }
        }
    )*};
}

macro_rules! deserialize_float {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            match self.value {
                None => visitor.visit_f64(0.0),
                Some(Value::Double(d)) => visitor.visit_f64(*d),
                Some(Value::Int(i)) => visitor.visit_f64(*i as f64),
                Some(other) => Err(Error::mismatch("double", other.kind())),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for Deserializer<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let Some(value) = self.value else {
            return visitor.visit_unit();
        };
        match value {
            Value::Int(i) => visitor.visit_i64(*i),
            Value::Double(d) => visitor.visit_f64(*d),
            Value::Str(s) => visitor.visit_borrowed_str(s),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::DateTime(dt) => visitor.visit_string(dt.to_rfc3339()),
            Value::Binary(bytes) => visitor.visit_borrowed_bytes(bytes),
            Value::Nil => visitor.visit_unit(),
            Value::Struct(members) => visitor.visit_map(MemberAccess::new(members)),
            Value::Array(items) => {
                visitor.visit_seq(ElementAccess::new(items.iter().map(Some).collect()))
            }
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None => visitor.visit_bool(false),
            Some(Value::Bool(b)) => visitor.visit_bool(*b),
            Some(other) => Err(Error::mismatch("boolean", other.kind())),
        }
    }

    deserialize_integer! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
    }

    deserialize_float! {
        deserialize_f32 deserialize_f64
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None => visitor.visit_char('\0'),
            Some(Value::Str(s)) => visitor.visit_borrowed_str(s),
            Some(other) => Err(Error::mismatch("string", other.kind())),
        }
    }

    /// Time destinations (chrono) read through here, so timestamps are
    /// offered as RFC 3339 text. An absent timestamp is the Unix epoch.
    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None if expects_timestamp(&visitor) => visitor.visit_borrowed_str(ZERO_TIMESTAMP),
            None => visitor.visit_borrowed_str(""),
            Some(Value::Str(s)) => visitor.visit_borrowed_str(s),
            Some(Value::DateTime(dt)) => visitor.visit_string(dt.to_rfc3339()),
            Some(other) => Err(Error::mismatch("string", other.kind())),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None => visitor.visit_borrowed_str(""),
            Some(Value::Str(s)) => visitor.visit_borrowed_str(s),
            Some(other) => Err(Error::mismatch("string", other.kind())),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None => visitor.visit_borrowed_bytes(&[]),
            Some(Value::Binary(bytes)) => visitor.visit_borrowed_bytes(bytes),
            Some(other) => Err(Error::mismatch("base64", other.kind())),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None | Some(Value::Nil) => visitor.visit_none(),
            Some(_) => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None | Some(Value::Nil) => visitor.visit_unit(),
            Some(other) => Err(Error::mismatch("nil", other.kind())),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None => visitor.visit_seq(ElementAccess::new(Vec::new())),
            // An empty array binds as one zero-valued element, not as none.
            Some(Value::Array(items)) if items.is_empty() => {
                visitor.visit_seq(ElementAccess::new(vec![None]))
            }
            Some(Value::Array(items)) => {
                visitor.visit_seq(ElementAccess::new(items.iter().map(Some).collect()))
            }
            Some(Value::Binary(bytes)) => de::Deserializer::deserialize_any(
                de::value::SeqDeserializer::<_, Error>::new(bytes.iter().copied()),
                visitor,
            ),
            Some(other) => Err(Error::mismatch("array", other.kind())),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        match self.value {
            None => visitor.visit_seq(ElementAccess::new(vec![None; len])),
            Some(Value::Array(items)) => {
                visitor.visit_seq(ElementAccess::new(items.iter().map(Some).collect()))
            }
            Some(Value::Binary(bytes)) => de::Deserializer::deserialize_any(
                de::value::SeqDeserializer::<_, Error>::new(bytes.iter().copied()),
                visitor,
            ),
            Some(other) => Err(Error::mismatch("array", other.kind())),
        }
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            None => visitor.visit_map(MemberAccess::new(&[])),
            Some(Value::Struct(members)) => visitor.visit_map(MemberAccess::new(members)),
            Some(other) => Err(Error::mismatch("struct", other.kind())),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        let members: &'de [(String, Value)] = match self.value {
            None => &[],
            Some(Value::Struct(members)) => members.as_slice(),
            Some(other) => return Err(Error::mismatch("struct", other.kind())),
        };
        let descriptor = descriptor::struct_descriptor(fields);
        visitor.visit_map(FieldAccess::new(fields, descriptor.bind(members)))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Some(Value::Str(s)) => {
                let variant: de::value::StrDeserializer<'_, Error> = s.as_str().into_deserializer();
                visitor.visit_enum(variant)
            }
            Some(Value::Struct(members)) if members.len() == 1 => {
                let (name, value) = &members[0];
                visitor.visit_enum(VariantDeserializer { name, value })
            }
            Some(other) => Err(Error::mismatch("enum", other.kind())),
            None => Err(Error::mismatch("enum", "nothing")),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.value {
            Some(Value::Str(s)) => visitor.visit_borrowed_str(s),
            Some(other) => Err(Error::mismatch("string", other.kind())),
            None => Err(Error::mismatch("string", "nothing")),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_unit()
    }
}

/// Zero value handed to time destinations when the value is absent.
const ZERO_TIMESTAMP: &str = "1970-01-01T00:00:00+00:00";

/// Whether the visitor reads RFC 3339 timestamps (chrono's `DateTime<Tz>`).
fn expects_timestamp<'de, V: Visitor<'de>>(visitor: &V) -> bool {
    let expected = visitor as &dyn de::Expected;
    expected.to_string().contains("RFC 3339")
}

// ── FieldAccess: struct fields in declaration order ────────────────────────

struct FieldAccess<'de> {
    fields: &'static [&'static str],
    slots: Vec<Option<&'de Value>>,
    index: usize,
}

impl<'de> FieldAccess<'de> {
    fn new(fields: &'static [&'static str], slots: Vec<Option<&'de Value>>) -> Self {
        FieldAccess {
            fields,
            slots,
            index: 0,
        }
    }
}

impl<'de> MapAccess<'de> for FieldAccess<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.fields.get(self.index) {
            Some(field) => seed
                .deserialize(de::value::BorrowedStrDeserializer::<Error>::new(field))
                .map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let index = self.index;
        self.index += 1;
        let field = self.fields.get(index).copied().unwrap_or_default();
        let slot = self.slots.get(index).copied().flatten();
        seed.deserialize(Deserializer { value: slot })
            .map_err(|e| e.at_field(field))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len().saturating_sub(self.index))
    }
}

// ── MemberAccess: every struct member, for map destinations ────────────────

struct MemberAccess<'de> {
    members: std::slice::Iter<'de, (String, Value)>,
    pending: Option<&'de (String, Value)>,
}

impl<'de> MemberAccess<'de> {
    fn new(members: &'de [(String, Value)]) -> Self {
        MemberAccess {
            members: members.iter(),
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for MemberAccess<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        let Some(member) = self.members.next() else {
            return Ok(None);
        };
        self.pending = Some(member);
        seed.deserialize(de::value::BorrowedStrDeserializer::<Error>::new(&member.0))
            .map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let Some((name, value)) = self.pending.take() else {
            return Err(Error::Message("member value requested before its name".to_string()));
        };
        seed.deserialize(Deserializer::new(value))
            .map_err(|e| e.at_field(name))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.members.len())
    }
}

// ── ElementAccess: array elements (or positional params) ───────────────────

struct ElementAccess<'de> {
    elements: std::vec::IntoIter<Option<&'de Value>>,
    index: usize,
}

impl<'de> ElementAccess<'de> {
    fn new(elements: Vec<Option<&'de Value>>) -> Self {
        ElementAccess {
            elements: elements.into_iter(),
            index: 0,
        }
    }
}

impl<'de> SeqAccess<'de> for ElementAccess<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        let Some(slot) = self.elements.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(Deserializer { value: slot })
            .map(Some)
            .map_err(|e| e.at_index(index))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.elements.len())
    }
}

// ── VariantDeserializer: `{variant: value}` structs ─────────────────────────

struct VariantDeserializer<'de> {
    name: &'de str,
    value: &'de Value,
}

impl<'de> EnumAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, Self::Variant)> {
        let name = de::value::BorrowedStrDeserializer::<Error>::new(self.name);
        let variant = seed.deserialize(name)?;
        Ok((variant, self))
    }
}

impl<'de> VariantAccess<'de> for VariantDeserializer<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Nil => Ok(()),
            other => Err(Error::mismatch("nil", other.kind()).at_field(self.name)),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        seed.deserialize(Deserializer::new(self.value))
            .map_err(|e| e.at_field(self.name))
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
        de::Deserializer::deserialize_tuple(Deserializer::new(self.value), len, visitor)
            .map_err(|e| e.at_field(self.name))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        de::Deserializer::deserialize_struct(Deserializer::new(self.value), "", fields, visitor)
            .map_err(|e| e.at_field(self.name))
    }
}
