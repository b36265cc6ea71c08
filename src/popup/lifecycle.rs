use std::fmt;

use crate::error::GrammaryError;
use crate::geometry::{Point, Rect, Size};
use crate::logging;
use crate::platform;
use crate::protocol::SelectionPayload;
use crate::selection::Selection;

/// Identifies one popup surface for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupId(pub u64);

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "popup-{}", self.0)
    }
}

/// Creates, feeds and destroys popup surfaces. The window layer implements
/// this; tests record the calls.
pub trait PopupHost {
    /// Create a frameless, always-on-top, non-resizable surface.
    fn open(&mut self, id: PopupId, bounds: Rect) -> anyhow::Result<()>;

    fn close(&mut self, id: PopupId);

    /// Deliver the captured selection. Only called after the surface
    /// reported ready.
    fn push(&mut self, id: PopupId, payload: &SelectionPayload);
}

/// The live popup.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPopup {
    pub id: PopupId,
    pub selection: Selection,
    pub bounds: Rect,
    /// The surface finished its load handshake and has the payload
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    Idle,
    /// Reading the OS selection. A popup from an earlier capture may still
    /// be up until this capture resolves. `pointer` is where the pointer was
    /// when the hotkey fired.
    Capturing {
        previous: Option<OpenPopup>,
        pointer: Option<Point>,
    },
    PopupOpen(OpenPopup),
}

/// How a capture resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// Nothing usable was selected; no surface was created.
    NoSelection,
    Opened(PopupId),
    /// The surface could not be created.
    Failed(String),
    /// No capture was pending.
    Ignored,
}

/// Hotkey to popup state machine. At most one popup exists at any time:
/// the previous surface is always closed before a new one is opened.
#[derive(Debug)]
pub struct PopupLifecycle {
    state: PopupState,
    next_id: u64,
    size: Size,
}

impl PopupLifecycle {
    /// `size` is the initial popup footprint.
    pub fn new(size: Size) -> Self {
        Self {
            state: PopupState::Idle,
            next_id: 1,
            size,
        }
    }

    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn current(&self) -> Option<&OpenPopup> {
        match &self.state {
            PopupState::PopupOpen(popup) => Some(popup),
            PopupState::Capturing { previous, .. } => previous.as_ref(),
            PopupState::Idle => None,
        }
    }

    /// The capture hotkey fired with the pointer at `pointer`. Returns false
    /// when a capture is already running.
    pub fn hotkey_pressed(&mut self, pointer: Option<Point>) -> bool {
        let previous = match std::mem::replace(&mut self.state, PopupState::Idle) {
            PopupState::Idle => None,
            PopupState::PopupOpen(popup) => Some(popup),
            capturing @ PopupState::Capturing { .. } => {
                self.state = capturing;
                return false;
            }
        };
        self.state = PopupState::Capturing { previous, pointer };
        true
    }

    /// The OS capture finished. Errors and blank text count as no selection.
    /// The popup opens at the pointer recorded by `hotkey_pressed`.
    pub fn captured(
        &mut self,
        result: anyhow::Result<String>,
        displays: &[Rect],
        host: &mut dyn PopupHost,
    ) -> CaptureOutcome {
        let (previous, pointer) = match std::mem::replace(&mut self.state, PopupState::Idle) {
            PopupState::Capturing { previous, pointer } => (previous, pointer),
            other => {
                self.state = other;
                return CaptureOutcome::Ignored;
            }
        };

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                let error = GrammaryError::Capture(format!("{:#}", e));
                tracing::info!(error = %error, "Capture failed, treating as no selection");
                String::new()
            }
        };

        // Destroy before create: never two popups
        if let Some(previous) = previous {
            host.close(previous.id);
            logging::log_popup_event("closed", Some("replaced by new capture"));
        }

        if text.trim().is_empty() {
            logging::log_selection_event("hotkey", 0, true);
            return CaptureOutcome::NoSelection;
        }

        let origin = pointer.unwrap_or_default();
        let selection = Selection::captured(text, origin);
        logging::log_selection_event("hotkey", selection.text.len(), selection.editable);

        let bounds = platform::popup_bounds(origin, self.size, displays);
        let id = PopupId(self.next_id);
        self.next_id += 1;

        if let Err(e) = host.open(id, bounds) {
            let error = GrammaryError::Window(format!("{:#}", e));
            tracing::error!(error = %error, popup = %id, "Failed to open popup");
            return CaptureOutcome::Failed(error.user_message());
        }
        logging::log_popup_event("opened", Some(&id.to_string()));

        self.state = PopupState::PopupOpen(OpenPopup {
            id,
            selection,
            bounds,
            ready: false,
        });
        CaptureOutcome::Opened(id)
    }

    /// The surface finished loading. Pushes the payload exactly once.
    pub fn ready(&mut self, id: PopupId, host: &mut dyn PopupHost) -> bool {
        match &mut self.state {
            PopupState::PopupOpen(popup) if popup.id == id && !popup.ready => {
                popup.ready = true;
                host.push(id, &SelectionPayload::from(&popup.selection));
                logging::log_popup_event("payload pushed", Some(&id.to_string()));
                true
            }
            _ => false,
        }
    }

    /// The surface lost input focus. This is the only implicit close.
    pub fn blurred(&mut self, id: PopupId, host: &mut dyn PopupHost) -> bool {
        self.close_if_current(id, host, "blur")
    }

    /// Explicit close control or `window:close`.
    pub fn close_requested(&mut self, id: PopupId, host: &mut dyn PopupHost) -> bool {
        self.close_if_current(id, host, "close")
    }

    fn close_if_current(&mut self, id: PopupId, host: &mut dyn PopupHost, reason: &str) -> bool {
        match &mut self.state {
            PopupState::PopupOpen(popup) if popup.id == id => {
                host.close(id);
                self.state = PopupState::Idle;
            }
            PopupState::Capturing { previous, .. } if previous.as_ref().map(|p| p.id) == Some(id) => {
                host.close(id);
                *previous = None;
            }
            _ => return false,
        }
        logging::log_popup_event("closed", Some(reason));
        true
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
