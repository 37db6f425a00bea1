//! One-shot send: connect, send a single message, close.
//!
//! ```bash
//! osc-panel send /sides 6
//! osc-panel send /look/tint '"#ff8800"' --port 9000
//! osc-panel send /label hello --json
//! ```

use anyhow::{Context, Result};

use crate::osc::{codec, json, OscArg, OscMessage};
use crate::ws;

/// Parse a command-line value the way a peer would type it.
///
/// JSON literals (`6`, `0.5`, `true`, `"text"`) are classified like any
/// outbound value; anything else is sent as a string.
#[must_use]
pub fn parse_value(raw: &str) -> OscArg {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => OscArg::classify(&value),
        Err(_) => OscArg::String(raw.to_string()),
    }
}

/// Send one message to `url` and close the connection.
///
/// With `as_json` the message goes out as a JSON text frame instead of a
/// binary OSC packet.
///
/// # Errors
///
/// Returns an error if the message cannot be encoded, or the connection or
/// send fails.
pub fn run(url: &str, address: &str, raw_value: &str, as_json: bool) -> Result<()> {
    let message = OscMessage::new(address, parse_value(raw_value));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    runtime.block_on(send_once(url, &message, as_json))?;
    log::info!("[send] {message} -> {url}");
    Ok(())
}

async fn send_once(url: &str, message: &OscMessage, as_json: bool) -> Result<()> {
    // Encode first so a bad address fails before connecting.
    let packet = if as_json { None } else { Some(codec::encode(message)?) };

    let (mut writer, _reader) = ws::connect(url).await?;
    match packet {
        Some(bytes) => writer.send_binary(bytes).await?,
        None => writer.send_text(&json::encode(message)).await?,
    }
    writer.close().await
}
