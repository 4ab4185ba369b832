//! CBOR bodies a replica answers with, for mock servers.

use ciborium::Value;

fn encode(value: &Value) -> Vec<u8> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).unwrap();
    bytes
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Body of `/api/v2/status`, with or without a root key.
pub(crate) fn status(root_key: Option<&[u8]>) -> Vec<u8> {
    let mut fields = vec![(text("ic_api_version"), text("0.18.0"))];
    if let Some(key) = root_key {
        fields.push((text("root_key"), Value::Bytes(key.to_vec())));
    }
    encode(&Value::Map(fields))
}

/// A successful query reply carrying `arg`.
pub(crate) fn replied(arg: &[u8]) -> Vec<u8> {
    encode(&Value::Map(vec![
        (text("status"), text("replied")),
        (
            text("reply"),
            Value::Map(vec![(text("arg"), Value::Bytes(arg.to_vec()))]),
        ),
    ]))
}

/// A rejected query.
pub(crate) fn rejected(code: u8, message: &str) -> Vec<u8> {
    encode(&Value::Map(vec![
        (text("status"), text("rejected")),
        (text("reject_code"), Value::Integer(code.into())),
        (text("reject_message"), text(message)),
    ]))
}
