//! JSON codec for protocol frames.
//!
//! Every frame is a single JSON object with a string `type` field. Encoding
//! writes top-level keys in sorted order so identical messages always produce
//! identical frames.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::message::{CLIENT_ID_FIELD, Heartbeat, Message, MessageKind, TYPE_FIELD};
use crate::error::{DecodeError, EncodeError};

/// Encode a message as UTF-8 JSON bytes.
pub fn encode(message: &Message) -> Result<Vec<u8>, EncodeError> {
    encode_text(message).map(String::into_bytes)
}

/// Encode a message as a JSON string, ready to go out as a text frame.
pub fn encode_text(message: &Message) -> Result<String, EncodeError> {
    let body = match message {
        Message::Handshake(m) => serde_json::to_value(m)?,
        Message::Heartbeat(m) => heartbeat_body(m),
        Message::ShowNotice(m) => serde_json::to_value(m)?,
    };
    let Value::Object(fields) = body else {
        return Err(EncodeError(format!(
            "{} body did not serialize to an object",
            message.kind()
        )));
    };

    // Collect into a BTreeMap so key order holds even if serde_json's
    // `preserve_order` feature gets unified in by another crate.
    let mut sorted: BTreeMap<String, Value> = fields.into_iter().collect();
    sorted.insert(
        TYPE_FIELD.to_string(),
        Value::String(message.kind().as_str().to_string()),
    );
    Ok(serde_json::to_string(&sorted)?)
}

/// Decode a frame payload.
///
/// # Errors
///
/// - [`DecodeError::Malformed`] for invalid UTF-8 or JSON, a non-object
///   payload, or fields that do not fit the message type.
/// - [`DecodeError::UnknownType`] when `type` is missing or unrecognized.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(DecodeError::malformed)?;
    decode_str(text)
}

/// Decode a text frame. See [`decode`].
pub fn decode_str(text: &str) -> Result<Message, DecodeError> {
    let value: Value = serde_json::from_str(text).map_err(DecodeError::malformed)?;
    let Value::Object(mut fields) = value else {
        return Err(DecodeError::Malformed("frame is not a JSON object".into()));
    };

    let raw_kind = match fields.remove(TYPE_FIELD) {
        Some(Value::String(kind)) => kind,
        Some(other) => return Err(DecodeError::UnknownType(Some(other.to_string()))),
        None => return Err(DecodeError::UnknownType(None)),
    };
    let Ok(kind) = raw_kind.parse::<MessageKind>() else {
        return Err(DecodeError::UnknownType(Some(raw_kind)));
    };

    let message = match kind {
        MessageKind::Handshake => Message::Handshake(
            serde_json::from_value(Value::Object(fields)).map_err(DecodeError::malformed)?,
        ),
        // The echo overwrites clientId, so the server's value may have any shape.
        MessageKind::Heartbeat => {
            let client_id = match fields.remove(CLIENT_ID_FIELD) {
                Some(Value::String(id)) => Some(id),
                _ => None,
            };
            Message::Heartbeat(Heartbeat::new(client_id, fields))
        }
        MessageKind::ShowNotice => Message::ShowNotice(
            serde_json::from_value(Value::Object(fields)).map_err(DecodeError::malformed)?,
        ),
    };
    Ok(message)
}

fn heartbeat_body(heartbeat: &Heartbeat) -> Value {
    let mut fields: Map<String, Value> = heartbeat
        .extra
        .iter()
        .filter(|(key, _)| key.as_str() != TYPE_FIELD && key.as_str() != CLIENT_ID_FIELD)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if let Some(id) = &heartbeat.client_id {
        fields.insert(CLIENT_ID_FIELD.to_string(), Value::String(id.clone()));
    }
    Value::Object(fields)
}
