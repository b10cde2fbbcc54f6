use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::string::FromUtf8Error;
use thiserror::Error;

use crate::event::{DecodedLine, DEFAULT_EVENT_NAME};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Formats an untyped message as `<name>: <text>`.
///
/// Outer whitespace is trimmed once and each comma, together with the
/// whitespace touching it, collapses into a single space. Whitespace away
/// from commas is left alone.
pub fn message_text(name: Option<&str>, data: &str) -> String {
    let name = match name {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_EVENT_NAME,
    };
    let text = data
        .trim()
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ");
    format!("{name}: {text}")
}

/// Decodes standard base64. ASCII whitespace anywhere in the payload is
/// ignored, so multi-line `data:` fields decode as one value.
pub fn base64_text(data: &str) -> Result<String, DecodeError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}

pub fn message_line(name: Option<&str>, data: &str) -> DecodedLine {
    DecodedLine::plain(message_text(name, data))
}

/// Decodes a base64 event; failures degrade to an error-styled line.
pub fn base64_line(data: &str) -> DecodedLine {
    match base64_text(data) {
        Ok(text) => DecodedLine::plain(text),
        Err(err) => {
            tracing::warn!(target: "tail.stream", error = %err, "failed to decode base64 event");
            DecodedLine::error(format!("error: undecodable base64 event ({err})"))
        }
    }
}
