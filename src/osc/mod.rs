//! OSC messages and their two wire encodings.
//!
//! # Modules
//!
//! - [`codec`] - OSC 1.0 binary packets (binary WebSocket frames)
//! - [`json`] - JSON message objects (text WebSocket frames)
//!
//! Outbound messages always carry exactly one argument, typed by
//! [`OscArg::classify`] or [`OscArg::from_param`].

pub mod codec;
pub mod json;

use std::fmt;

use crate::param::value::integral;
use crate::param::ParamValue;

/// A single OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    /// `i`: 32-bit integer.
    Int(i32),
    /// `f`: 32-bit float.
    Float(f32),
    /// `s`: string.
    String(String),
    /// `h`: 64-bit integer (inbound only).
    Long(i64),
    /// `d`: 64-bit float (inbound only).
    Double(f64),
    /// `T` / `F`: boolean (inbound only).
    Bool(bool),
    /// `N`: nil (inbound only).
    Nil,
    /// `b`: blob (inbound only).
    Blob(Vec<u8>),
}

impl OscArg {
    /// Classify a JSON value the way the panel always has: integral numbers
    /// are `i`, other numbers `f`, strings `s`, booleans `i` 0/1, and
    /// anything else is sent as `s` holding its JSON text.
    #[must_use]
    pub fn classify(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Self::number(f),
                None => Self::String(n.to_string()),
            },
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Bool(b) => Self::Int(i32::from(*b)),
            other => Self::String(other.to_string()),
        }
    }

    /// Classify a parameter value. Colors travel as their `#rrggbb` text.
    #[must_use]
    pub fn from_param(value: &ParamValue) -> Self {
        match value {
            ParamValue::Number(n) => Self::number(*n),
            ParamValue::Bool(b) => Self::Int(i32::from(*b)),
            ParamValue::Text(t) => Self::String(t.clone()),
            ParamValue::Color(c) => Self::String(c.to_string()),
        }
    }

    /// `i` when integral and within 32 bits, `f` otherwise.
    fn number(n: f64) -> Self {
        match integral(n).map(i32::try_from) {
            Some(Ok(i)) => Self::Int(i),
            Some(Err(_)) => {
                log::debug!("[osc] {n} is outside 32 bits, sending it as a float");
                Self::Float(n as f32)
            }
            None => Self::Float(n as f32),
        }
    }

    /// OSC type tag character.
    #[must_use]
    pub fn type_tag(&self) -> char {
        match self {
            Self::Int(_) => 'i',
            Self::Float(_) => 'f',
            Self::String(_) => 's',
            Self::Long(_) => 'h',
            Self::Double(_) => 'd',
            Self::Bool(true) => 'T',
            Self::Bool(false) => 'F',
            Self::Nil => 'N',
            Self::Blob(_) => 'b',
        }
    }

    /// The argument as a parameter value, before coercion to a node's tag.
    ///
    /// Returns `None` for nil and blobs.
    #[must_use]
    pub fn to_param(&self) -> Option<ParamValue> {
        match self {
            Self::Int(i) => Some(ParamValue::Number(f64::from(*i))),
            Self::Float(f) => Some(ParamValue::Number(f64::from(*f))),
            Self::Long(l) => Some(ParamValue::Number(*l as f64)),
            Self::Double(d) => Some(ParamValue::Number(*d)),
            Self::String(s) => Some(ParamValue::Text(s.clone())),
            Self::Bool(b) => Some(ParamValue::Bool(*b)),
            Self::Nil | Self::Blob(_) => None,
        }
    }
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Long(l) => write!(f, "{l}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nil => f.write_str("nil"),
            Self::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// An OSC message: an address pattern and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    /// Slash-delimited address, e.g. `/settings/websocket/port`.
    pub address: String,
    /// Arguments in order.
    pub args: Vec<OscArg>,
}

impl OscMessage {
    /// Message with a single argument.
    #[must_use]
    pub fn new(address: impl Into<String>, arg: OscArg) -> Self {
        Self { address: address.into(), args: vec![arg] }
    }
}

impl fmt::Display for OscMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)?;
        for arg in &self.args {
            write!(f, " {}:{arg}", arg.type_tag())?;
        }
        Ok(())
    }
}
