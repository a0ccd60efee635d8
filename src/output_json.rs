//! Purpose: Shared JSON serializers for CLI command output.
//! Exports: `fields_json`, `url_json`, `token_json`, `resolution_json`.
//! Role: Keep output envelope shapes consistent across commands.
//! Invariants: Stable key names; optional keys are omitted rather than null.
//! Invariants: `--payload-only` output is the bare decoded payload value.

use pixpeek::api::{
    Framing, MERCHANT_ACCOUNT_TAGS, PixUrlMatch, Resolution, TlvField, TokenRecord, fields,
};
use serde_json::{Map, Value, json};

pub(crate) fn fields_json(decoded: &[TlvField], nested: bool) -> Value {
    Value::Array(
        decoded
            .iter()
            .map(|field| field_json(field, nested))
            .collect(),
    )
}

fn field_json(field: &TlvField, nested: bool) -> Value {
    let mut map = Map::new();
    map.insert("tag".to_string(), json!(field.tag));
    map.insert("length".to_string(), json!(field.length));
    map.insert("value".to_string(), json!(field.value));
    map.insert("offset".to_string(), json!(field.offset));
    match field.framing {
        Framing::Complete => {}
        Framing::Truncated => {
            map.insert("framing".to_string(), json!("truncated"));
        }
        Framing::BadLength => {
            map.insert("framing".to_string(), json!("bad_length"));
        }
    }
    if nested && is_template_tag(&field.tag) && !field.value.is_empty() {
        let inner: Vec<TlvField> = fields(&field.value).collect();
        map.insert("nested".to_string(), fields_json(&inner, false));
    }
    Value::Object(map)
}

fn is_template_tag(tag: &str) -> bool {
    tag.parse::<u8>()
        .is_ok_and(|tag| MERCHANT_ACCOUNT_TAGS.contains(&tag))
}

pub(crate) fn url_json(found: &PixUrlMatch) -> Value {
    json!({
        "tag": found.tag,
        "url": found.url,
    })
}

pub(crate) fn token_json(record: &TokenRecord, payload_only: bool) -> Value {
    if payload_only {
        return record.payload.clone();
    }
    json!({
        "header": record.header,
        "payload": record.payload,
        "signature": record.signature,
    })
}

pub(crate) fn resolution_json(resolution: &Resolution, payload_only: bool) -> Value {
    if payload_only {
        return resolution.token.payload.clone();
    }
    json!({
        "tag": resolution.tag,
        "url": resolution.url,
        "token": token_json(&resolution.token, false),
    })
}
