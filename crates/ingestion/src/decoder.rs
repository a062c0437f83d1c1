//! MessageDecoder
//!
//! Turns one raw feed block into a [`Message`]. The block text is a small
//! key/value subset (`event`, `id`, `retry`, `data`) where `data` is a flow
//! mapping whose `value` may be the literal `NaN`.

use contracts::{Data, Message, VALUE_SENTINEL};
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::DecodeError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMessage {
    event: Option<Value>,
    id: Option<i64>,
    retry: Option<i64>,
    data: Option<RawData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawData {
    id: Option<Value>,
    state: Option<Value>,
    value: Option<Value>,
}

/// Decode one complete block (terminating blank line included or not)
///
/// A block with no fields decodes to `Message::default()`.
pub fn decode_block(block: &[u8]) -> Result<Message, DecodeError> {
    if block.trim_ascii().is_empty() {
        return Ok(Message::default());
    }

    let raw: RawMessage = serde_yaml::from_slice(block)?;
    let data = match raw.data {
        Some(data) => decode_data(data)?,
        None => Data::default(),
    };

    Ok(Message {
        event: string_field(raw.event.as_ref()),
        id: raw.id.unwrap_or_default(),
        retry: raw.retry.unwrap_or_default(),
        data,
    })
}

fn decode_data(raw: RawData) -> Result<Data, DecodeError> {
    let value = match raw.value.as_ref().and_then(value_text) {
        Some(text) => decode_reading_value(&text)?,
        None => 0.0,
    };

    Ok(Data {
        id: string_field(raw.id.as_ref()),
        state: string_field(raw.state.as_ref()),
        value,
    })
}

/// String field; empty when absent or null
fn string_field(value: Option<&Value>) -> String {
    value.and_then(value_text).unwrap_or_default()
}

/// Textual form of the `value` field, `None` when absent or null
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_nan() => Some(VALUE_SENTINEL.to_string()),
        Value::Number(n) if n.is_infinite() => n.as_f64().map(|f| f.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(format!("{other:?}")),
    }
}

/// Decode the textual `value` field
///
/// `"NaN"` is the sensor's marker for an unreadable reading and maps to `0.0`.
/// Anything else must parse as a float; other NaN spellings are rejected.
pub fn decode_reading_value(text: &str) -> Result<f64, DecodeError> {
    if text == VALUE_SENTINEL {
        return Ok(0.0);
    }

    match text.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(DecodeError::InvalidValue {
            text: text.to_string(),
        }),
    }
}
