use std::borrow::Cow;

use chrono::{Local, TimeZone};
use xmlrpc_serde::charset::{self, Charset};
use xmlrpc_serde::descriptor::struct_descriptor;
use xmlrpc_serde::{Body, Error, MessageKind, Value, from_str, parse_message};

fn param(value: &str) -> Result<Value, Error> {
    let doc = format!("<methodResponse><params><param><value>{value}</value></param></params></methodResponse>");
    let message = parse_message(doc.as_bytes())?;
    match message.body {
        Body::Params(mut params) if params.len() == 1 => Ok(params.remove(0)),
        other => panic!("unexpected body {other:?}"),
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Documents
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_method_call_shape() {
    let doc = "<methodCall><methodName> system.multicall </methodName><params>\
        <param><value><int>1</int></value></param>\
        <param><value><nil/></value></param>\
        </params></methodCall>";
    let message = parse_message(doc.as_bytes()).unwrap();
    assert_eq!(message.kind, MessageKind::Call);
    assert_eq!(message.method_name.as_deref(), Some("system.multicall"));
    assert_eq!(message.body, Body::Params(vec![Value::Int(1), Value::Nil]));
}

#[test]
fn test_fault_body() {
    let doc = "<methodResponse><fault><value><struct>\
        <member><name>faultCode</name><value><i4>-32601</i4></value></member>\
        <member><name>faultString</name><value>no such method</value></member>\
        </struct></value></fault></methodResponse>";
    let message = parse_message(doc.as_bytes()).unwrap();
    assert_eq!(message.kind, MessageKind::Response);
    assert_eq!(message.method_name, None);
    assert_eq!(message.body, Body::Fault(Value::Struct(vec![
        ("faultCode".to_string(), Value::Int(-32601)),
        ("faultString".to_string(), Value::Str("no such method".to_string())),
    ])));
}

#[test]
fn test_response_needs_a_body() {
    let err = parse_message(b"<methodResponse></methodResponse>").unwrap_err();
    assert_eq!(err, Error::MissingElement { name: "params", context: "methodResponse" });
}

#[test]
fn test_params_and_fault_are_exclusive() {
    let doc = "<methodResponse><params></params><fault><value><int>1</int></value></fault></methodResponse>";
    let err = parse_message(doc.as_bytes()).unwrap_err();
    assert_eq!(err, Error::UnexpectedElement { found: "fault".to_string(), context: "methodResponse" });
}

#[test]
fn test_unknown_root() {
    let err = parse_message(b"<methodRequest/>").unwrap_err();
    assert_eq!(err, Error::UnexpectedElement { found: "methodRequest".to_string(), context: "document root" });
}

#[test]
fn test_not_xml() {
    let err = parse_message(b"<methodResponse><params>").unwrap_err();
    assert!(matches!(err, Error::Xml(_)));
    assert!(err.is_syntax());
}

#[test]
fn test_syntax_errors_leave_destination_untouched() {
    let mut kept = 7i32;
    let doc = "<methodResponse><params><param><value><int>seven</int></value></param></params></methodResponse>";
    let err = xmlrpc_serde::decode(doc.as_bytes(), &mut kept).unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(kept, 7);
}

// ══════════════════════════════════════════════════════════════════════════
// Values
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_scalars() {
    assert_eq!(param("<i4> 42 </i4>").unwrap(), Value::Int(42));
    assert_eq!(param("<i8>-9000000000</i8>").unwrap(), Value::Int(-9_000_000_000));
    assert_eq!(param("<double>-0.5</double>").unwrap(), Value::Double(-0.5));
    assert_eq!(param("<boolean>1</boolean>").unwrap(), Value::Bool(true));
    assert_eq!(param("<string></string>").unwrap(), Value::Str(String::new()));
    assert_eq!(param("").unwrap(), Value::Str(String::new()));
    assert_eq!(param("<base64>aGk=</base64>").unwrap(), Value::Binary(b"hi".to_vec()));
    assert_eq!(param("<nil/>").unwrap(), Value::Nil);
}

#[test]
fn test_datetime_is_local() {
    let expected = Local.with_ymd_and_hms(1998, 7, 17, 14, 8, 55).unwrap().fixed_offset();
    assert_eq!(param("<dateTime.iso8601>19980717T14:08:55</dateTime.iso8601>").unwrap(), Value::DateTime(expected));
    assert_eq!(param("<dateTime.iso8601>1998-07-17T14:08:55</dateTime.iso8601>").unwrap(), Value::DateTime(expected));
}

#[test]
fn test_invalid_scalar_text() {
    for (value, kind) in [
        ("<int>12a</int>", "int"),
        ("<double>one</double>", "double"),
        ("<boolean>true</boolean>", "boolean"),
        ("<dateTime.iso8601>2012-13-01</dateTime.iso8601>", "dateTime.iso8601"),
        ("<base64>!!!</base64>", "base64"),
    ] {
        let err = param(value).unwrap_err();
        assert!(matches!(&err, Error::InvalidScalar { kind: k, .. } if *k == kind), "{value}: {err:?}");
        assert!(err.is_syntax());
    }
}

#[test]
fn test_struct_keeps_member_order_and_duplicates() {
    let value = param("<struct>\
        <member><name>b</name><value><int>1</int></value></member>\
        <member><name>a</name><value><int>2</int></value></member>\
        <member><name>b</name><value><int>3</int></value></member>\
        </struct>").unwrap();
    assert_eq!(value, Value::Struct(vec![
        ("b".to_string(), Value::Int(1)),
        ("a".to_string(), Value::Int(2)),
        ("b".to_string(), Value::Int(3)),
    ]));
    assert_eq!(value.member("b"), Some(&Value::Int(1)));
    assert_eq!(value.kind(), "struct");
}

#[test]
fn test_nested_arrays() {
    let value = param("<array><data>\
        <value><array><data></data></array></value>\
        <value><array><data><value>x</value></data></array></value>\
        </data></array>").unwrap();
    assert_eq!(value, Value::Array(vec![
        Value::Array(vec![]),
        Value::Array(vec![Value::Str("x".to_string())]),
    ]));
}

#[test]
fn test_grammar_violations() {
    assert_eq!(
        param("<int>1</int><int>2</int>").unwrap_err(),
        Error::UnexpectedElement { found: "int".to_string(), context: "value" }
    );
    assert_eq!(
        param("<float>1.0</float>").unwrap_err(),
        Error::UnexpectedElement { found: "float".to_string(), context: "value" }
    );
    assert_eq!(
        param("<array></array>").unwrap_err(),
        Error::MissingElement { name: "data", context: "array" }
    );
    assert_eq!(
        param("<struct><member><value><int>1</int></value></member></struct>").unwrap_err(),
        Error::MissingElement { name: "name", context: "member" }
    );
}

// ══════════════════════════════════════════════════════════════════════════
// Charset
// ══════════════════════════════════════════════════════════════════════════

#[test]
fn test_declared_encoding() {
    assert_eq!(charset::declared_encoding(br#"<?xml version="1.0" encoding="ISO-8859-1"?><a/>"#), Some("ISO-8859-1"));
    assert_eq!(charset::declared_encoding(b"<?xml version='1.0' encoding='latin1'?><a/>"), Some("latin1"));
    assert_eq!(charset::declared_encoding(br#"<?xml version="1.0"?><a/>"#), None);
    // Only the head of the document counts.
    assert_eq!(charset::declared_encoding(br#"<a>encoding="latin1"</a>"#), None);
}

#[test]
fn test_charset_labels() {
    assert_eq!(Charset::from_label("UTF-8"), Some(Charset::Utf8));
    assert_eq!(Charset::from_label("us-ascii"), Some(Charset::Utf8));
    assert_eq!(Charset::from_label("ISO-8859-1"), Some(Charset::Latin1));
    assert_eq!(Charset::from_label("Latin1"), Some(Charset::Latin1));
    assert_eq!(Charset::from_label("Shift_JIS"), None);
}

#[test]
fn test_normalize() {
    let plain = b"<methodResponse/>";
    assert!(matches!(charset::normalize(plain).unwrap(), Cow::Borrowed("<methodResponse/>")));

    let latin = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><s>\xd6\xf1\xe4</s>";
    assert_eq!(charset::normalize(latin).unwrap(), "<s>Öñä</s>");

    let bom = b"\xEF\xBB\xBF<?xml version=\"1.0\" encoding=\"UTF-8\"?><s>\xc3\x96</s>";
    assert_eq!(charset::normalize(bom).unwrap(), "<s>Ö</s>");
}

#[test]
fn test_unsupported_charset() {
    let doc = br#"<?xml version="1.0" encoding="Shift_JIS"?><methodResponse/>"#;
    let err = parse_message(doc).unwrap_err();
    assert_eq!(err, Error::UnsupportedCharset("Shift_JIS".to_string()));
}

#[test]
fn test_broken_declaration_is_tolerated() {
    let doc = r#"<?xmlversion="1.0"?><methodResponse><params><param><value><string>ok</string></value></param></params></methodResponse>"#;
    assert_eq!(from_str::<String>(doc).unwrap(), "ok");
}

// ══════════════════════════════════════════════════════════════════════════
// Struct descriptors
// ══════════════════════════════════════════════════════════════════════════

static ARGS_FIELDS: &[&str] = &["String1", "id", "ID"];

#[test]
fn test_descriptor_lookup_ignores_case() {
    let descriptor = struct_descriptor(ARGS_FIELDS);
    assert_eq!(descriptor.fields(), ARGS_FIELDS);
    assert_eq!(descriptor.field_index("string1"), Some(0));
    assert_eq!(descriptor.field_index("STRING1"), Some(0));
    assert_eq!(descriptor.field_index("Id"), Some(1));
    assert_eq!(descriptor.field_index("string2"), None);

    let members = vec![
        ("ID".to_string(), Value::Int(1)),
        ("string1".to_string(), Value::Str("a".to_string())),
        ("id".to_string(), Value::Int(2)),
    ];
    let slots = descriptor.bind(&members);
    assert_eq!(slots, vec![Some(&members[1].1), Some(&members[0].1), None]);
}
