//! JSON encoding of channel messages.

use tracing::warn;

use super::message::{Message, Response};

/// Raw JSON longer than this is truncated in logs; payloads carry user text.
const MAX_RAW_LOG_PREVIEW: usize = 200;

/// Truncated preview of `raw` plus its full byte length.
pub fn log_preview(raw: &str) -> (&str, usize) {
    let len = raw.len();
    if len <= MAX_RAW_LOG_PREVIEW {
        return (raw, len);
    }
    let mut cut = MAX_RAW_LOG_PREVIEW;
    while !raw.is_char_boundary(cut) {
        cut -= 1;
    }
    (&raw[..cut], len)
}

pub fn parse_message(raw: &str) -> Result<Message, serde_json::Error> {
    serde_json::from_str(raw).map_err(|e| {
        let (preview, len) = log_preview(raw);
        warn!(raw_preview = %preview, raw_len = len, error = %e, "Failed to parse message");
        e
    })
}

#[derive(Debug)]
pub enum ParseResult {
    Ok(Message),
    /// Valid JSON without a `channel` field.
    MissingChannel { raw: String },
    /// A `channel` nobody listens on.
    UnknownChannel { channel: String, raw: String },
    /// Known channel, payload of the wrong shape.
    InvalidPayload {
        channel: String,
        error: String,
        raw: String,
    },
    ParseError(serde_json::Error),
}

/// Classify a raw message instead of failing on channels we do not know.
///
/// The input is parsed once into a `Value`; the `channel` tag is read from
/// it before conversion so unknown channels and bad payloads can be told
/// apart.
pub fn parse_message_graceful(raw: &str) -> ParseResult {
    let (preview, _) = log_preview(raw);

    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return ParseResult::ParseError(e),
    };

    let channel = match value.get("channel").and_then(|c| c.as_str()) {
        Some(c) => c.to_string(),
        None => {
            return ParseResult::MissingChannel {
                raw: preview.to_string(),
            }
        }
    };

    match serde_json::from_value::<Message>(value) {
        Ok(message) => ParseResult::Ok(message),
        Err(e) => {
            let error = e.to_string();
            if error.contains("unknown variant") {
                ParseResult::UnknownChannel {
                    channel,
                    raw: preview.to_string(),
                }
            } else {
                ParseResult::InvalidPayload {
                    channel,
                    error,
                    raw: preview.to_string(),
                }
            }
        }
    }
}

pub fn serialize_response(response: &Response) -> Result<String, serde_json::Error> {
    serde_json::to_string(response)
}
