//! Backend requests over stdin/stdout, one JSON object per line.
//!
//! ```bash
//! echo '{"channel":"transform:correctGrammar","text":"I has a apple"}' | grammary --stdio
//! echo '{"channel":"keys:get"}' | grammary --stdio
//! ```
//!
//! Every non-blank input line gets exactly one reply line. Lines that are
//! not backend requests get an `error` reply instead of being dropped.

use std::io::{BufRead, Write};

use anyhow::{Context as _, Result};
use tracing::warn;

use super::backend::Backend;
use super::io::{parse_message_graceful, serialize_response, ParseResult};
use super::message::Response;
use crate::logging;

fn error(message: impl Into<String>) -> Response {
    Response::Error {
        message: message.into(),
    }
}

/// Reply for one input line.
pub fn answer_line(backend: &Backend, line: &str) -> Response {
    match parse_message_graceful(line) {
        ParseResult::Ok(message) => backend
            .handle(&message)
            .unwrap_or_else(|| error(format!("{} is not a backend request", message.channel()))),
        ParseResult::MissingChannel { .. } => error("Missing channel"),
        ParseResult::UnknownChannel { channel, .. } => {
            error(format!("Unknown channel: {}", channel))
        }
        ParseResult::InvalidPayload { channel, error: e, .. } => {
            warn!(channel = %channel, error = %e, "Invalid payload");
            error(format!("Invalid payload for {}", channel))
        }
        ParseResult::ParseError(e) => error(format!("Invalid JSON: {}", e)),
    }
}

/// Answers requests until `input` ends. Returns how many lines were answered.
pub fn serve(backend: &Backend, input: impl BufRead, mut output: impl Write) -> Result<usize> {
    logging::log("STDIO", "Backend listener started");
    let mut answered = 0;
    for line in input.lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = serialize_response(&answer_line(backend, &line))?;
        writeln!(output, "{}", reply).context("Failed to write reply")?;
        output.flush().context("Failed to flush reply")?;
        answered += 1;
    }
    logging::log("STDIO", &format!("Backend listener exiting after {} request(s)", answered));
    Ok(answered)
}
