/*
[INPUT]:  Typed messages, raw websocket text, per-shape schema tables
[OUTPUT]: Sparse wire JSON (readable or compact keys) and decoded messages
[POS]:    Codec layer - schema-driven translation between structs and the wire
[UPDATE]: When field kinds, key modes or type detection rules change
*/

pub mod schema;

pub use schema::{
    FieldDefault, FieldKind, FieldSpec, KeyMode, MSG_TYPE_KEY, MSG_TYPE_TAG, Schema, WireMessage,
};

use serde_json::{Map, Value};

use crate::error::{Result, XenaError};
use crate::registry::{self, Message};
use crate::types::MsgType;

/// Result of decoding one websocket frame
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Message(Message),
    /// Top-level array, one entry per element in wire order
    Batch(Vec<Decoded>),
    /// Payload without a type key, passed through unchanged
    Untyped(Value),
}

impl Decoded {
    pub fn into_message(self) -> Option<Message> {
        match self {
            Decoded::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn msg_type(&self) -> Option<MsgType> {
        match self {
            Decoded::Message(message) => Some(message.msg_type()),
            _ => None,
        }
    }
}

/// Encode a message to single-line JSON
pub fn encode<M: WireMessage>(message: &M, mode: KeyMode) -> Result<String> {
    let value = to_wire_value(message, mode)?;
    Ok(serde_json::to_string(&value)?)
}

/// Encode a message to a sparse JSON object keyed per `mode`
pub fn to_wire_value<M: WireMessage>(message: &M, mode: KeyMode) -> Result<Value> {
    let value = serde_json::to_value(message)?;
    encode_value(M::SCHEMA, &value, mode).map(Value::Object)
}

/// Sparse-encode a readable-keyed serde value against `schema`
pub fn encode_value(schema: &Schema, value: &Value, mode: KeyMode) -> Result<Map<String, Value>> {
    let source = value.as_object().ok_or_else(|| {
        XenaError::Decode(format!("{}: expected an object to encode", schema.name))
    })?;
    encode_fields(schema, source, mode)
}

fn encode_fields(
    schema: &Schema,
    source: &Map<String, Value>,
    mode: KeyMode,
) -> Result<Map<String, Value>> {
    let mut out = Map::new();

    for field in schema.fields {
        let Some(value) = source.get(field.name) else {
            continue;
        };

        let encoded = match field.kind {
            FieldKind::Scalar(default) => {
                if default.matches(value) {
                    continue;
                }
                value.clone()
            }
            FieldKind::RepeatedScalar | FieldKind::Map => {
                if is_empty_container(value) {
                    continue;
                }
                value.clone()
            }
            FieldKind::Message(nested) => {
                if value.is_null() {
                    continue;
                }
                let encoded = encode_value(nested, value, mode)?;
                if encoded.is_empty() {
                    continue;
                }
                Value::Object(encoded)
            }
            FieldKind::RepeatedMessage(nested) => {
                let Some(items) = value.as_array() else {
                    continue;
                };
                if items.is_empty() {
                    continue;
                }
                let items = items
                    .iter()
                    .map(|item| encode_value(nested, item, mode).map(Value::Object))
                    .collect::<Result<Vec<_>>>()?;
                Value::Array(items)
            }
        };

        out.insert(mode.key(field).into_owned(), encoded);
    }

    Ok(out)
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Decode raw wire text, detecting the message type from the payload
pub fn decode(raw: &str) -> Result<Decoded> {
    let value: Value = serde_json::from_str(raw)?;
    decode_value(value)
}

/// Decode an already parsed payload
pub fn decode_value(value: Value) -> Result<Decoded> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(decode_value)
            .collect::<Result<Vec<_>>>()
            .map(Decoded::Batch),
        Value::Object(map) => {
            let Some(code) = message_type_code(&map)? else {
                return Ok(Decoded::Untyped(Value::Object(map)));
            };
            let msg_type = resolve(&code)?;
            let schema = msg_type
                .schema()
                .ok_or_else(|| XenaError::UnknownMessageType(code.clone()))?;
            let mut fields = decode_fields(schema, &map)?;
            fields.insert(MSG_TYPE_KEY.to_string(), Value::String(code));
            registry::instantiate(msg_type, fields).map(Decoded::Message)
        }
        other => Ok(Decoded::Untyped(other)),
    }
}

/// Decode raw wire text into a known shape, without type detection
pub fn decode_as<T: WireMessage>(raw: &str) -> Result<T> {
    let value: Value = serde_json::from_str(raw)?;
    let map = value.as_object().ok_or_else(|| {
        XenaError::Decode(format!("{}: expected a JSON object", T::SCHEMA.name))
    })?;
    let fields = decode_fields(T::SCHEMA, map)?;
    from_fields(T::SCHEMA, fields)
}

pub(crate) fn from_fields<T: WireMessage>(schema: &Schema, fields: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|err| XenaError::Decode(format!("{}: {err}", schema.name)))
}

fn resolve(code: &str) -> Result<MsgType> {
    match MsgType::from_code(code) {
        Some(MsgType::Unknown) | None => Err(XenaError::UnknownMessageType(code.to_string())),
        Some(msg_type) => Ok(msg_type),
    }
}

/// Type code under `"msgType"`, falling back to `"35"`
fn message_type_code(map: &Map<String, Value>) -> Result<Option<String>> {
    let value = [MSG_TYPE_KEY, MSG_TYPE_TAG]
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null());

    match value {
        None => Ok(None),
        Some(Value::String(code)) => Ok(Some(code.clone())),
        Some(Value::Number(code)) => Ok(Some(code.to_string())),
        Some(other) => Err(XenaError::Decode(format!(
            "message type must be a string, got {other}"
        ))),
    }
}

/// Translate a wire object (either key mode) into a readable-keyed object.
///
/// The readable name is applied first and the numeric tag second, so the
/// tag's value wins when both are present.
fn decode_fields(schema: &Schema, source: &Map<String, Value>) -> Result<Map<String, Value>> {
    let mut out = Map::new();

    for field in schema.fields {
        let tag = field.tag.to_string();
        let value = [source.get(field.name), source.get(tag.as_str())]
            .into_iter()
            .flatten()
            .filter(|value| !value.is_null())
            .last();
        let Some(value) = value else {
            continue;
        };

        let decoded = match field.kind {
            FieldKind::Scalar(_) => value.clone(),
            FieldKind::RepeatedScalar => {
                expect_array(schema, field, value)?;
                value.clone()
            }
            FieldKind::Map => {
                expect_object(schema, field, value)?;
                value.clone()
            }
            FieldKind::Message(nested) => {
                let map = expect_object(schema, field, value)?;
                Value::Object(decode_fields(nested, map)?)
            }
            FieldKind::RepeatedMessage(nested) => {
                let items = expect_array(schema, field, value)?;
                let items = items
                    .iter()
                    .map(|item| {
                        let map = expect_object(schema, field, item)?;
                        decode_fields(nested, map).map(Value::Object)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Value::Array(items)
            }
        };

        out.insert(field.name.to_string(), decoded);
    }

    Ok(out)
}

fn expect_array<'a>(schema: &Schema, field: &FieldSpec, value: &'a Value) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        XenaError::Decode(format!("{}.{}: expected an array", schema.name, field.name))
    })
}

fn expect_object<'a>(
    schema: &Schema,
    field: &FieldSpec,
    value: &'a Value,
) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        XenaError::Decode(format!("{}.{}: expected an object", schema.name, field.name))
    })
}
