//! Typed messages between surfaces, the popup host and the backend.
//!
//! Every message is a JSON object tagged by a `channel` field:
//!
//! | channel | direction | payload |
//! |---|---|---|
//! | `window:minimize` / `window:maximize` / `window:close` | surface -> host | none |
//! | `selection:pushed` | host -> popup | `{text, editable, script}` |
//! | `transform:<kind>` | surface -> backend | `{text, params}` -> text |
//! | `keys:save` / `keys:get` | surface -> backend | key map |
//!
//! # Module Structure
//!
//! - `message`: the message enums and payload types
//! - `io`: parsing with graceful handling of unknown channels
//! - `backend`: request/response handling for `transform:*` and `keys:*`
//! - `stdio`: the backend served as JSON lines on stdin/stdout

mod backend;
mod io;
mod message;
mod stdio;

pub use backend::Backend;
pub use io::{log_preview, parse_message, parse_message_graceful, serialize_response, ParseResult};
pub use stdio::{answer_line, serve};
pub use message::*;
