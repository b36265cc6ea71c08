use std::time::{Duration, Instant};

use crate::config::PopupConfig;
use crate::context::{classify_text, ActionKind, ActionSet, Language, MenuAction, Script, Tone};
use crate::dispatcher::{ActionDispatcher, ActionRequest, ResultStatus, Settlement};
use crate::geometry::Size;
use crate::menu::MenuCommand;
use crate::protocol::SelectionPayload;
use crate::selection::{FieldFont, TextMeasure, DEFAULT_LINE_HEIGHT};

use super::lifecycle::PopupId;

/// How long the copy confirmation stays up.
pub const NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

/// Header, selection preview and action row.
const CHROME_HEIGHT: f64 = 150.0;
const RESULT_HEADER_HEIGHT: f64 = 28.0;
/// Horizontal padding around the result text.
const RESULT_INSET_X: f64 = 32.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultArea {
    Hidden,
    Processing(ActionKind),
    Success { kind: ActionKind, text: String },
    Error { message: String },
    /// No API key yet; `message` says how to add one.
    NeedsConfiguration { message: String },
}

impl ResultArea {
    pub fn text(&self) -> Option<&str> {
        match self {
            ResultArea::Success { text, .. } => Some(text),
            ResultArea::Error { message } | ResultArea::NeedsConfiguration { message } => {
                Some(message)
            }
            ResultArea::Hidden | ResultArea::Processing(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Notification {
    message: String,
    until: Instant,
}

/// View-model of one popup window. The popup is not editable: results go to
/// the result area, from where they can be copied.
#[derive(Debug)]
pub struct PopupSession {
    id: PopupId,
    payload: Option<SelectionPayload>,
    actions: ActionSet,
    tone_submenu_visible: bool,
    language_picker_visible: bool,
    dispatcher: ActionDispatcher,
    result: ResultArea,
    notification: Option<Notification>,
    size: Size,
    config: PopupConfig,
}

impl PopupSession {
    pub fn new(id: PopupId, config: &PopupConfig) -> Self {
        Self {
            id,
            payload: None,
            actions: ActionSet::new(),
            tone_submenu_visible: false,
            language_picker_visible: false,
            dispatcher: ActionDispatcher::new(),
            result: ResultArea::Hidden,
            notification: None,
            size: Size::new(config.width, config.height),
            config: config.clone(),
        }
    }

    pub fn id(&self) -> PopupId {
        self.id
    }

    /// `selection:pushed` arrived.
    pub fn receive(&mut self, payload: SelectionPayload) {
        let classification = classify_text(&payload.text, payload.editable);
        self.actions = if payload.editable && classification.script == Script::RtlSemitic {
            classification.actions.with_language_picker()
        } else {
            classification.actions
        };
        self.payload = Some(payload);
    }

    pub fn payload(&self) -> Option<&SelectionPayload> {
        self.payload.as_ref()
    }

    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    pub fn tone_submenu_visible(&self) -> bool {
        self.tone_submenu_visible
    }

    pub fn language_picker_visible(&self) -> bool {
        self.language_picker_visible
    }

    pub fn result(&self) -> &ResultArea {
        &self.result
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    pub fn is_enabled(&self, kind: ActionKind) -> bool {
        !self.dispatcher.is_busy() && self.actions.contains_kind(kind)
    }

    pub fn click(&mut self, kind: ActionKind) -> MenuCommand {
        if self.dispatcher.is_busy() {
            return MenuCommand::Ignored;
        }
        let (Some(payload), Some(action)) = (self.payload.as_ref(), self.actions.get(kind).copied())
        else {
            return MenuCommand::Ignored;
        };

        if action.opens_submenu() {
            if action == MenuAction::AdjustTone {
                self.tone_submenu_visible = !self.tone_submenu_visible;
                self.language_picker_visible = false;
            } else {
                self.language_picker_visible = !self.language_picker_visible;
                self.tone_submenu_visible = false;
            }
            return MenuCommand::SubmenuToggled;
        }

        match ActionRequest::for_action(&action, &payload.text) {
            Some(request) => self.begin(request),
            None => MenuCommand::Ignored,
        }
    }

    pub fn choose_tone(&mut self, tone: Tone) -> MenuCommand {
        if self.dispatcher.is_busy() || !self.tone_submenu_visible {
            return MenuCommand::Ignored;
        }
        let Some(payload) = self.payload.as_ref() else {
            return MenuCommand::Ignored;
        };
        let request = ActionRequest::adjust_tone(payload.text.clone(), tone);
        self.tone_submenu_visible = false;
        self.begin(request)
    }

    pub fn choose_language(&mut self, language: Language) -> MenuCommand {
        if self.dispatcher.is_busy() || !self.language_picker_visible {
            return MenuCommand::Ignored;
        }
        let Some(payload) = self.payload.as_ref() else {
            return MenuCommand::Ignored;
        };
        let request = ActionRequest::translate(payload.text.clone(), language);
        self.language_picker_visible = false;
        self.begin(request)
    }

    fn begin(&mut self, request: ActionRequest) -> MenuCommand {
        match self.dispatcher.begin(&request) {
            Some(ticket) => {
                self.result = ResultArea::Processing(request.kind);
                MenuCommand::Dispatch(request, ticket)
            }
            None => MenuCommand::Ignored,
        }
    }

    /// Show a finished dispatch. Stale settlements change nothing.
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        let result = settlement.result;
        if !self.dispatcher.settle(&settlement.ticket, result.is_success()) {
            return false;
        }
        self.result = match result.status {
            ResultStatus::Success => ResultArea::Success {
                kind: settlement.request.kind,
                text: result.text,
            },
            ResultStatus::Error => ResultArea::Error {
                message: result
                    .message
                    .unwrap_or_else(|| "Action failed".to_string()),
            },
            ResultStatus::NeedsConfiguration => ResultArea::NeedsConfiguration {
                message: result.message.unwrap_or(result.text),
            },
        };
        true
    }

    /// Estimated height of the popup content with the current result laid
    /// out at the popup's width.
    pub fn estimate_content_height(&self, measure: &dyn TextMeasure) -> f64 {
        let Some(text) = self.result.text() else {
            return CHROME_HEIGHT;
        };
        let font = FieldFont::default();
        let line_height = font.line_height.unwrap_or(DEFAULT_LINE_HEIGHT);
        let wrap_width = (self.size.width - RESULT_INSET_X).max(1.0);
        let lines: f64 = text
            .lines()
            .map(|line| (measure.text_width(line, &font) / wrap_width).ceil().max(1.0))
            .sum();
        CHROME_HEIGHT + RESULT_HEADER_HEIGHT + lines.max(1.0) * line_height
    }

    /// The rendered content measured `content_height`; returns the new
    /// window size. Width never changes.
    pub fn content_measured(&mut self, content_height: f64) -> Size {
        self.size.height = self.config.grown_height(content_height);
        self.size
    }

    /// Copy the successful result with `copy` and show a confirmation.
    pub fn copy_result<F>(&mut self, copy: F, now: Instant) -> anyhow::Result<bool>
    where
        F: FnOnce(&str) -> anyhow::Result<()>,
    {
        let ResultArea::Success { text, .. } = &self.result else {
            return Ok(false);
        };
        if text.trim().is_empty() {
            return Ok(false);
        }
        copy(text)?;
        // A new notification replaces the old one
        self.notification = Some(Notification {
            message: "Copied to clipboard".to_string(),
            until: now + NOTIFICATION_DURATION,
        });
        Ok(true)
    }

    pub fn notification(&self, now: Instant) -> Option<&str> {
        self.notification
            .as_ref()
            .filter(|n| now < n.until)
            .map(|n| n.message.as_str())
    }

    /// When the notification needs to be taken down.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.notification.as_ref().map(|n| n.until)
    }

    pub fn tick(&mut self, now: Instant) {
        if self.notification.as_ref().is_some_and(|n| now >= n.until) {
            self.notification = None;
        }
    }

    /// The window is going away; drop any in-flight result.
    pub fn close(&mut self) {
        self.dispatcher.cancel();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
