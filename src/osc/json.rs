//! JSON message form carried in WebSocket text frames.
//!
//! ```json
//! { "address": "/sides", "args": [ { "type": "i", "value": 5 } ] }
//! ```
//!
//! An argument may omit `type`, or be a bare JSON value. A frame may also
//! hold an array of message objects.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{OscArg, OscMessage};
use crate::param::value::integral;

#[derive(Debug, Deserialize)]
struct RawMessage {
    address: String,
    #[serde(default)]
    args: Vec<RawArg>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawArg {
    Typed {
        #[serde(rename = "type")]
        tag: Option<String>,
        value: Value,
    },
    Bare(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFrame {
    One(RawMessage),
    Many(Vec<RawMessage>),
}

/// Parse a text frame into messages.
///
/// # Errors
///
/// Returns an error if the text is not a message object (or array of them),
/// an address does not start with `/`, or a typed argument does not match
/// its declared type.
pub fn decode(text: &str) -> Result<Vec<OscMessage>> {
    let frame: RawFrame = serde_json::from_str(text).context("invalid JSON message")?;
    let raw = match frame {
        RawFrame::One(message) => vec![message],
        RawFrame::Many(messages) => messages,
    };
    raw.into_iter().map(convert_message).collect()
}

fn convert_message(raw: RawMessage) -> Result<OscMessage> {
    if !raw.address.starts_with('/') {
        bail!("OSC address must start with '/': {:?}", raw.address);
    }
    let args = raw
        .args
        .into_iter()
        .map(|arg| match arg {
            RawArg::Typed { tag: Some(tag), value } => typed_arg(&tag, value),
            RawArg::Typed { tag: None, value } | RawArg::Bare(value) => Ok(untyped_arg(value)),
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("arguments of '{}'", raw.address))?;
    Ok(OscMessage { address: raw.address, args })
}

fn typed_arg(tag: &str, value: Value) -> Result<OscArg> {
    let arg = match tag {
        "i" => OscArg::Int(i32::try_from(integer(&value, 'i')?).context("'i' argument out of range")?),
        "h" => OscArg::Long(integer(&value, 'h')?),
        "f" => OscArg::Float(number(&value)? as f32),
        "d" => OscArg::Double(number(&value)?),
        "s" | "S" => match value {
            Value::String(s) => OscArg::String(s),
            other => OscArg::String(other.to_string()),
        },
        "T" => OscArg::Bool(true),
        "F" => OscArg::Bool(false),
        "N" | "I" => OscArg::Nil,
        other => bail!("unsupported OSC type tag {other:?}"),
    };
    Ok(arg)
}

/// Integers may arrive as integral floats (`5.0`).
fn integer(value: &Value, tag: char) -> Result<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().and_then(integral))
        .with_context(|| format!("'{tag}' needs an integer, got {value}"))
}

fn number(value: &Value) -> Result<f64> {
    value.as_f64().with_context(|| format!("expected a number, got {value}"))
}

/// An argument without a declared type keeps its JSON kind.
fn untyped_arg(value: Value) -> OscArg {
    match value {
        Value::Bool(b) => OscArg::Bool(b),
        Value::Null => OscArg::Nil,
        Value::String(s) => OscArg::String(s),
        other => OscArg::classify(&other),
    }
}

/// Render a message in the typed JSON form.
#[must_use]
pub fn encode(message: &OscMessage) -> String {
    let args: Vec<Value> = message
        .args
        .iter()
        .map(|arg| {
            let value = match arg {
                OscArg::Int(i) => json!(i),
                OscArg::Float(f) => json!(f64::from(*f)),
                OscArg::String(s) => json!(s),
                OscArg::Long(l) => json!(l),
                OscArg::Double(d) => json!(d),
                OscArg::Bool(b) => json!(b),
                OscArg::Nil => Value::Null,
                OscArg::Blob(bytes) => json!(bytes),
            };
            json!({ "type": arg.type_tag().to_string(), "value": value })
        })
        .collect();
    json!({ "address": message.address, "args": args }).to_string()
}
