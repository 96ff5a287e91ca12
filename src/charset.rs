//! Charset sniffing ahead of XML parsing.
//!
//! The tree builder only reads UTF-8, so documents declaring a Latin-1
//! encoding are transcoded first. The declaration is looked up with a plain
//! substring search over the document head, which keeps documents with a
//! mangled prologue (`<?xmlversion="1.0"?>`) decodable.

use crate::error::{Error, Result};
use std::borrow::Cow;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How far into the document the `encoding=` attribute is looked for.
const SCAN_LIMIT: usize = 1024;

const UTF8_LABELS: &[&str] = &["utf-8", "utf8", "unicode-1-1-utf-8", "us-ascii", "ascii"];

const LATIN1_LABELS: &[&str] = &[
    "iso-8859-1",
    "iso8859-1",
    "iso_8859-1",
    "iso_8859-1:1987",
    "latin1",
    "latin-1",
    "l1",
    "cp819",
    "ibm819",
    "csisolatin1",
    "iso-ir-100",
];

/// Charsets the decoder accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    Latin1,
}

impl Charset {
    /// Map an `encoding=` label to a charset, ignoring ASCII case.
    pub fn from_label(label: &str) -> Option<Charset> {
        let label = label.trim();
        if UTF8_LABELS.iter().any(|known| known.eq_ignore_ascii_case(label)) {
            Some(Charset::Utf8)
        } else if LATIN1_LABELS.iter().any(|known| known.eq_ignore_ascii_case(label)) {
            Some(Charset::Latin1)
        } else {
            None
        }
    }
}

/// The value of the first `encoding="..."` attribute in the document head,
/// i.e. before the first `>`.
pub fn declared_encoding(input: &[u8]) -> Option<&str> {
    let head = &input[..input.len().min(SCAN_LIMIT)];
    let head = match head.iter().position(|&b| b == b'>') {
        Some(end) => &head[..end],
        None => head,
    };

    let start = find(head, b"encoding=")? + b"encoding=".len();
    let rest = &head[start..];
    let quote = *rest.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = rest[1..].iter().position(|&b| b == quote)?;
    std::str::from_utf8(&rest[1..1 + len]).ok()
}

/// Produce the UTF-8 text handed to the tree builder.
///
/// A leading BOM and a leading `<?xml ... ?>` declaration are dropped: the
/// returned text is always UTF-8, whatever the declaration said. Invalid UTF-8
/// in documents without a Latin-1 declaration is replaced with U+FFFD.
pub fn normalize(input: &[u8]) -> Result<Cow<'_, str>> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);

    let charset = match declared_encoding(input) {
        None => Charset::Utf8,
        Some(label) => Charset::from_label(label)
            .ok_or_else(|| Error::UnsupportedCharset(label.to_string()))?,
    };

    let body = strip_declaration(input);
    match charset {
        Charset::Utf8 => Ok(String::from_utf8_lossy(body)),
        Charset::Latin1 => {
            debug!(len = body.len(), "transcoding Latin-1 document to UTF-8");
            Ok(Cow::Owned(body.iter().map(|&b| char::from(b)).collect()))
        }
    }
}

fn strip_declaration(input: &[u8]) -> &[u8] {
    let trimmed = input.trim_ascii_start();
    if !trimmed.starts_with(b"<?xml") {
        return input;
    }
    match find(trimmed, b"?>") {
        Some(end) => &trimmed[end + 2..],
        None => input,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
