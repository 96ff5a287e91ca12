//! XML-RPC document parser.
//!
//! Turns the element tree built by [`roxmltree`] into a [`Message`]: the
//! optional method name plus either the list of params or the fault value.

use crate::charset;
use crate::error::{Error, Result};
use crate::value::Value;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Local, NaiveDateTime, TimeZone};
use roxmltree::{Document, Node};

/// Accepted `dateTime.iso8601` layouts. The compact one is what the wire
/// format mandates.
const DATETIME_FORMATS: &[&str] = &["%Y%m%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Call,
    Response,
}

/// What a document carries: params or a fault, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Params(Vec<Value>),
    Fault(Value),
}

/// A parsed `methodCall` or `methodResponse`.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub method_name: Option<String>,
    pub body: Body,
}

/// Normalize the charset of `input` and parse it into a [`Message`].
pub fn parse_message(input: &[u8]) -> Result<Message> {
    let text = charset::normalize(input)?;
    let document = Document::parse(&text).map_err(|e| Error::Xml(e.to_string()))?;
    let root = document.root_element();

    let (kind, context) = match root.tag_name().name() {
        "methodCall" => (MessageKind::Call, "methodCall"),
        "methodResponse" => (MessageKind::Response, "methodResponse"),
        other => {
            return Err(Error::UnexpectedElement {
                found: other.to_string(),
                context: "document root",
            });
        }
    };

    let mut method_name = None;
    let mut body = None;
    for child in elements(root) {
        match child.tag_name().name() {
            "methodName" if kind == MessageKind::Call && method_name.is_none() => {
                method_name = Some(text_content(child).trim().to_string());
            }
            "params" if body.is_none() => body = Some(Body::Params(parse_params(child)?)),
            "fault" if kind == MessageKind::Response && body.is_none() => {
                body = Some(Body::Fault(parse_fault(child)?));
            }
            other => return Err(unexpected(other, context)),
        }
    }

    let body = match body {
        Some(body) => body,
        None if kind == MessageKind::Call => Body::Params(Vec::new()),
        None => {
            return Err(Error::MissingElement {
                name: "params",
                context,
            });
        }
    };

    Ok(Message {
        kind,
        method_name,
        body,
    })
}

fn parse_params(node: Node<'_, '_>) -> Result<Vec<Value>> {
    elements(node)
        .map(|param| {
            expect_tag(param, "param", "params")?;
            parse_wrapped_value(param, "param")
        })
        .collect()
}

fn parse_fault(node: Node<'_, '_>) -> Result<Value> {
    parse_wrapped_value(node, "fault")
}

/// Parse the single `<value>` child of a `<param>` or `<fault>`.
fn parse_wrapped_value(node: Node<'_, '_>, context: &'static str) -> Result<Value> {
    let mut children = elements(node);
    let value = children.next().ok_or(Error::MissingElement {
        name: "value",
        context,
    })?;
    expect_tag(value, "value", context)?;
    if let Some(extra) = children.next() {
        return Err(unexpected(extra.tag_name().name(), context));
    }
    parse_value(value)
}

/// Parse a `<value>` element. Bare text is an implicit string.
fn parse_value(node: Node<'_, '_>) -> Result<Value> {
    let mut children = elements(node);
    match (children.next(), children.next()) {
        (None, _) => Ok(Value::Str(text_content(node))),
        (Some(typed), None) => parse_typed(typed),
        (Some(_), Some(extra)) => Err(unexpected(extra.tag_name().name(), "value")),
    }
}

fn parse_typed(node: Node<'_, '_>) -> Result<Value> {
    match node.tag_name().name() {
        "i4" | "int" | "i8" => {
            let text = text_content(node);
            text.trim()
                .parse()
                .map(Value::Int)
                .map_err(|_| Error::invalid_scalar("int", &text))
        }
        "double" => {
            let text = text_content(node);
            text.trim()
                .parse()
                .map(Value::Double)
                .map_err(|_| Error::invalid_scalar("double", &text))
        }
        "string" => Ok(Value::Str(text_content(node))),
        "boolean" => {
            let text = text_content(node);
            match text.trim() {
                "0" => Ok(Value::Bool(false)),
                "1" => Ok(Value::Bool(true)),
                _ => Err(Error::invalid_scalar("boolean", &text)),
            }
        }
        "dateTime.iso8601" => parse_datetime(&text_content(node)),
        "base64" => {
            let text = text_content(node);
            let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            BASE64
                .decode(compact)
                .map(Value::Binary)
                .map_err(|_| Error::invalid_scalar("base64", &text))
        }
        "nil" => Ok(Value::Nil),
        "struct" => parse_struct(node),
        "array" => parse_array(node),
        other => Err(unexpected(other, "value")),
    }
}

fn parse_datetime(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| Error::invalid_scalar("dateTime.iso8601", text))?;
    // Skipped local times (DST gaps) have no instant to map to.
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| Error::invalid_scalar("dateTime.iso8601", text))?;
    Ok(Value::DateTime(local.fixed_offset()))
}

fn parse_struct(node: Node<'_, '_>) -> Result<Value> {
    let mut members = Vec::new();
    for member in elements(node) {
        expect_tag(member, "member", "struct")?;

        let mut name = None;
        let mut value = None;
        for part in elements(member) {
            match part.tag_name().name() {
                "name" if name.is_none() => name = Some(text_content(part).trim().to_string()),
                "value" if value.is_none() => value = Some(parse_value(part)?),
                other => return Err(unexpected(other, "member")),
            }
        }

        let name = name.ok_or(Error::MissingElement {
            name: "name",
            context: "member",
        })?;
        let value = value.ok_or(Error::MissingElement {
            name: "value",
            context: "member",
        })?;
        members.push((name, value));
    }
    Ok(Value::Struct(members))
}

fn parse_array(node: Node<'_, '_>) -> Result<Value> {
    let mut children = elements(node);
    let data = children.next().ok_or(Error::MissingElement {
        name: "data",
        context: "array",
    })?;
    expect_tag(data, "data", "array")?;
    if let Some(extra) = children.next() {
        return Err(unexpected(extra.tag_name().name(), "array"));
    }

    elements(data)
        .map(|value| {
            expect_tag(value, "value", "data")?;
            parse_value(value)
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Concatenated text of the direct text children, entities already resolved.
fn text_content(node: Node<'_, '_>) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

fn expect_tag(node: Node<'_, '_>, name: &'static str, context: &'static str) -> Result<()> {
    if node.tag_name().name() == name {
        Ok(())
    } else {
        Err(unexpected(node.tag_name().name(), context))
    }
}

fn unexpected(found: &str, context: &'static str) -> Error {
    Error::UnexpectedElement {
        found: found.to_string(),
        context,
    }
}
