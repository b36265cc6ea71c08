//! Single-flight action execution for one menu instance.
//!
//! [`ActionDispatcher`] is the `Idle -> Dispatching(kind) -> Idle` state
//! machine. `begin` hands out a [`DispatchTicket`]; the result comes back
//! through `settle`, which only accepts the ticket of the current dispatch.
//! Dismissing the menu cancels the ticket's token, so a late result finds
//! nothing to settle and is dropped.
//!
//! [`spawn_dispatch`] runs the transform on a background thread and delivers
//! the [`Settlement`] over an `async_channel`, the same way the hotkey thread
//! talks to the UI loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::context::{ActionKind, Language, MenuAction, Tone, TranslateTarget};
use crate::error::GrammaryError;
use crate::logging;
use crate::transform::TextTransform;

/// One transform invocation. Immutable once dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub source_text: String,
    pub target_language: Option<Language>,
    pub tone: Option<Tone>,
}

impl ActionRequest {
    pub fn new(kind: ActionKind, source_text: impl Into<String>) -> Self {
        Self {
            kind,
            source_text: source_text.into(),
            target_language: None,
            tone: None,
        }
    }

    pub fn translate(source_text: impl Into<String>, target: Language) -> Self {
        Self {
            target_language: Some(target),
            ..Self::new(ActionKind::Translate, source_text)
        }
    }

    pub fn adjust_tone(source_text: impl Into<String>, tone: Tone) -> Self {
        Self {
            tone: Some(tone),
            ..Self::new(ActionKind::AdjustTone, source_text)
        }
    }

    /// The request a menu entry dispatches directly. `None` for entries that
    /// open a submenu (tone, language picker) instead.
    pub fn for_action(action: &MenuAction, source_text: &str) -> Option<Self> {
        match action {
            MenuAction::Translate(TranslateTarget::Fixed(lang)) => {
                Some(Self::translate(source_text, *lang))
            }
            MenuAction::Translate(TranslateTarget::Picker) | MenuAction::AdjustTone => None,
            MenuAction::Summarize => Some(Self::new(ActionKind::Summarize, source_text)),
            MenuAction::CorrectGrammar => Some(Self::new(ActionKind::CorrectGrammar, source_text)),
            MenuAction::FixWriting => Some(Self::new(ActionKind::FixWriting, source_text)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Success,
    Error,
    /// No credential: `text` is the instructive message. Shown, never applied.
    NeedsConfiguration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    pub text: String,
    pub status: ResultStatus,
    /// User-facing notice, set on `Error` and `NeedsConfiguration`
    pub message: Option<String>,
}

impl ActionResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: ResultStatus::Success,
            message: None,
        }
    }

    pub fn failure(error: &GrammaryError) -> Self {
        Self {
            text: String::new(),
            status: ResultStatus::Error,
            message: Some(error.user_message()),
        }
    }

    pub fn needs_configuration(instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        Self {
            text: instructions.clone(),
            status: ResultStatus::NeedsConfiguration,
            message: Some(instructions),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}

/// Run `request` against `transform`, converting every failure into an
/// error result. An unconfigured transform still answers (with its
/// instructions) but the result is marked `NeedsConfiguration`.
pub fn execute(transform: &dyn TextTransform, request: &ActionRequest, default_tone: Tone) -> ActionResult {
    let configured = transform.is_configured();
    let text = request.source_text.as_str();
    let tone = request.tone.unwrap_or(default_tone);
    let outcome = match request.kind {
        ActionKind::Translate => match request.target_language {
            Some(target) => transform.translate(text, target, tone),
            None => Err(GrammaryError::Application(
                "translate requires a target language".into(),
            )),
        },
        // Writing fixes go through the grammar operation
        ActionKind::CorrectGrammar | ActionKind::FixWriting => transform.correct_grammar(text),
        ActionKind::Summarize => transform.summarize(text),
        ActionKind::AdjustTone => transform.adjust_tone(text, tone),
    };

    match outcome {
        Ok(instructions) if !configured => {
            tracing::info!(kind = %request.kind, "Transform not configured");
            ActionResult::needs_configuration(instructions)
        }
        Ok(text) => ActionResult::success(text),
        Err(e) => {
            tracing::warn!(kind = %request.kind, error = %e, "Action failed");
            ActionResult::failure(&e)
        }
    }
}

/// Shared flag checked before a transform starts and before its result is
/// delivered.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Identifies one dispatch. Only the ticket of the current dispatch settles.
#[derive(Debug, Clone)]
pub struct DispatchTicket {
    pub id: Uuid,
    pub kind: ActionKind,
    pub token: CancelToken,
}

impl PartialEq for DispatchTicket {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Dispatching { kind: ActionKind, id: Uuid },
}

#[derive(Debug)]
pub struct ActionDispatcher {
    state: DispatchState,
    token: Option<CancelToken>,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self {
            state: DispatchState::Idle,
            token: None,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, DispatchState::Dispatching { .. })
    }

    pub fn busy_kind(&self) -> Option<ActionKind> {
        match self.state {
            DispatchState::Dispatching { kind, .. } => Some(kind),
            DispatchState::Idle => None,
        }
    }

    /// Enter `Dispatching`. Returns `None` (and changes nothing) when busy.
    pub fn begin(&mut self, request: &ActionRequest) -> Option<DispatchTicket> {
        if self.is_busy() {
            tracing::debug!(kind = %request.kind, "Dispatcher busy, ignoring action");
            return None;
        }
        let ticket = DispatchTicket {
            id: Uuid::new_v4(),
            kind: request.kind,
            token: CancelToken::new(),
        };
        self.state = DispatchState::Dispatching {
            kind: request.kind,
            id: ticket.id,
        };
        self.token = Some(ticket.token.clone());
        logging::log_dispatch_event(request.kind, "started", None);
        Some(ticket)
    }

    /// Back to `Idle` if `ticket` is the current dispatch. A stale or
    /// cancelled ticket returns false and leaves the state alone.
    pub fn settle(&mut self, ticket: &DispatchTicket, success: bool) -> bool {
        match self.state {
            DispatchState::Dispatching { id, .. } if id == ticket.id => {
                if ticket.token.is_cancelled() {
                    return false;
                }
                self.state = DispatchState::Idle;
                self.token = None;
                logging::log_dispatch_event(ticket.kind, "settled", Some(success));
                true
            }
            _ => {
                tracing::debug!(kind = %ticket.kind, "Dropping stale settlement");
                false
            }
        }
    }

    /// Drop any in-flight dispatch's UI follow-through.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        if let DispatchState::Dispatching { kind, .. } = self.state {
            logging::log_dispatch_event(kind, "cancelled", None);
        }
        self.state = DispatchState::Idle;
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// A finished background dispatch.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub ticket: DispatchTicket,
    pub request: ActionRequest,
    pub result: ActionResult,
}

/// Run the request on a background thread. The receiver yields at most one
/// settlement; it closes empty when the ticket was cancelled first.
pub fn spawn_dispatch(
    transform: Arc<dyn TextTransform>,
    request: ActionRequest,
    ticket: DispatchTicket,
    default_tone: Tone,
) -> async_channel::Receiver<Settlement> {
    let (tx, rx) = async_channel::bounded(1);
    std::thread::spawn(move || {
        if ticket.token.is_cancelled() {
            return;
        }
        let result = execute(transform.as_ref(), &request, default_tone);
        if ticket.token.is_cancelled() {
            tracing::debug!(kind = %request.kind, "Dispatch cancelled while in flight");
            return;
        }
        let _ = tx.send_blocking(Settlement {
            ticket,
            request,
            result,
        });
    });
    rx
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
