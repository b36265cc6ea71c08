//! Structured JSONL logging to a file plus compact human output on stderr.
//!
//! - **JSONL to file** (`~/.grammary/logs/grammary.jsonl`)
//! - **Compact to stderr** for whoever launched the process
//!
//! ```rust,ignore
//! // Keep the guard alive for the duration of the program
//! let _guard = grammary::logging::init(false);
//! tracing::info!(event_type = "app_start", "Grammary started");
//! ```
//!
//! Credential values never go through here; log key names and lengths only.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use parking_lot::Mutex;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::context::ActionKind;

static LOG_BUFFER: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
const MAX_LOG_LINES: usize = 50;

const DEFAULT_FILTER: &str = "info,gpui=warn";
const VERBOSE_FILTER: &str = "debug,gpui=info";

/// Dropping this guard flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Install the subscriber. `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool) -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join("grammary.jsonl");
    eprintln!("[GRAMMARY] JSONL log: {}", log_path.display());

    let writer: Box<dyn Write + Send> = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => Box::new(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            Box::new(std::io::sink())
        }
    };

    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(writer);

    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .compact();

    // try_init so a second call (tests, embedding) is harmless
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".grammary").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("grammary-logs"))
}

pub fn log_path() -> PathBuf {
    get_log_dir().join("grammary.jsonl")
}

// =============================================================================
// Category log + in-memory ring buffer
// =============================================================================

/// Category-tagged info line, also kept in the recent-lines buffer.
pub fn log(category: &str, message: &str) {
    add_to_buffer(category, message);
    tracing::info!(category = category, "{}", message);
}

fn add_to_buffer(category: &str, message: &str) {
    let buffer =
        LOG_BUFFER.get_or_init(|| Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));
    let mut buf = buffer.lock();
    if buf.len() >= MAX_LOG_LINES {
        buf.pop_front();
    }
    buf.push_back(format!("[{}] {}", category, message));
}

/// The last `n` lines, newest first.
pub fn get_last_logs(n: usize) -> Vec<String> {
    LOG_BUFFER
        .get()
        .map(|buffer| buffer.lock().iter().rev().take(n).cloned().collect())
        .unwrap_or_default()
}

// =============================================================================
// Structured helpers
// =============================================================================

/// A selection was emitted by an observer.
pub fn log_selection_event(source: &str, text_len: usize, editable: bool) {
    add_to_buffer(
        "SELECTION",
        &format!("{} len={} editable={}", source, text_len, editable),
    );
    tracing::debug!(
        event_type = "selection",
        source = source,
        text_len = text_len,
        editable = editable,
        "Selection changed"
    );
}

/// A dispatch started or settled.
pub fn log_dispatch_event(kind: ActionKind, phase: &str, success: Option<bool>) {
    add_to_buffer("DISPATCH", &format!("{} {} {:?}", kind, phase, success));
    match success {
        Some(false) => tracing::warn!(
            event_type = "dispatch",
            kind = %kind,
            phase = phase,
            success = false,
            "Action {} {}", kind, phase
        ),
        _ => tracing::info!(
            event_type = "dispatch",
            kind = %kind,
            phase = phase,
            success = ?success,
            "Action {} {}", kind, phase
        ),
    }
}

/// Popup lifecycle transitions.
pub fn log_popup_event(action: &str, detail: Option<&str>) {
    let msg = match detail {
        Some(d) => format!("{} - {}", action, d),
        None => action.to_string(),
    };
    add_to_buffer("POPUP", &msg);
    tracing::info!(
        event_type = "popup",
        action = action,
        detail = detail,
        "{}", msg
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_is_under_grammary() {
        assert!(log_path().ends_with("logs/grammary.jsonl"));
    }

    #[test]
    fn buffer_is_bounded() {
        for i in 0..(MAX_LOG_LINES + 10) {
            log("TEST", &format!("line {}", i));
        }
        let all = get_last_logs(MAX_LOG_LINES + 10);
        assert!(all.len() <= MAX_LOG_LINES);
        let last = get_last_logs(1);
        assert_eq!(last.len(), 1);
    }
}
