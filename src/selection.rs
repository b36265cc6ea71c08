//! Selection tracking for a rendering surface.
//!
//! A surface reports raw selection snapshots ([`RawSelection`]); the
//! [`SelectionObserver`] turns them into at most one [`Observation`] per paint
//! tick. Emission is keyed on the selected *text* by value, so a selection that
//! persists across ticks is reported once. Scroll and resize only reposition.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::context::{detect_script, Script};
use crate::geometry::{Point, Rect};

/// Line height used when a form field does not report one.
pub const DEFAULT_LINE_HEIGHT: f64 = 20.0;
/// Horizontal room kept at the right end of a form field for the estimate.
const FIELD_END_INSET: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    PlainText,
    FormField,
    ContentEditable,
    /// Read from another application through the capture hotkey.
    SystemCapture,
}

/// A contiguous run of highlighted text plus where it sits on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub text: String,
    /// Viewport-space bounding box (document space is the positioner's job)
    pub anchor_rect: Rect,
    pub source_kind: SourceKind,
    pub editable: bool,
    pub script: Script,
}

impl Selection {
    /// Editability follows the source: form fields and rich surfaces are
    /// editable, plain text is not.
    pub fn new(text: impl Into<String>, anchor_rect: Rect, source_kind: SourceKind) -> Self {
        let text = text.into();
        let script = detect_script(&text);
        Selection {
            text,
            anchor_rect,
            editable: source_kind != SourceKind::PlainText,
            source_kind,
            script,
        }
    }

    /// A selection captured system-wide through the capture hotkey.
    ///
    /// Editability cannot be read across processes, so it is assumed.
    pub fn captured(text: impl Into<String>, origin: Point) -> Self {
        Selection::new(
            text,
            Rect::new(origin.x, origin.y, 0.0, DEFAULT_LINE_HEIGHT),
            SourceKind::SystemCapture,
        )
    }

    /// Non-empty text and an anchor with some extent.
    pub fn is_active(&self) -> bool {
        !self.text.is_empty() && self.anchor_rect.has_extent()
    }
}

/// Font facts needed to estimate a caret position inside a text control.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFont {
    pub family: String,
    pub size: f64,
    /// `None` when the control's line height is "normal" or unparseable
    pub line_height: Option<f64>,
}

impl Default for FieldFont {
    fn default() -> Self {
        FieldFont {
            family: "system-ui".to_string(),
            size: 14.0,
            line_height: None,
        }
    }
}

/// Off-screen text measurement with a control's computed font.
pub trait TextMeasure {
    fn text_width(&self, text: &str, font: &FieldFont) -> f64;
}

/// Fixed advance per character as a fraction of the font size.
///
/// Used where no text shaper is available.
#[derive(Debug, Clone, Copy)]
pub struct AverageAdvance {
    pub ratio: f64,
}

impl Default for AverageAdvance {
    fn default() -> Self {
        AverageAdvance { ratio: 0.55 }
    }
}

impl TextMeasure for AverageAdvance {
    fn text_width(&self, text: &str, font: &FieldFont) -> f64 {
        text.chars().count() as f64 * font.size * self.ratio
    }
}

/// What a surface reports when asked for its current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSelection {
    /// Single or multi-line text control. Offsets are in characters.
    FormField {
        value: String,
        start: usize,
        end: usize,
        field_rect: Rect,
        font: FieldFont,
    },
    /// A document range: rich (contenteditable) or plain read-only text.
    Range {
        text: String,
        bounds: Rect,
        editable: bool,
    },
}

/// Characters `start..end` of `value`, tolerant of reversed or out-of-range offsets.
pub fn char_slice(value: &str, start: usize, end: usize) -> &str {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    let byte_at = |n: usize| {
        value
            .char_indices()
            .nth(n)
            .map(|(i, _)| i)
            .unwrap_or(value.len())
    };
    &value[byte_at(start)..byte_at(end)]
}

/// Estimated anchor for a selection starting at character `start` of a field.
///
/// The x-offset is the rendered width of the text before the selection,
/// clamped inside the field; the rectangle is zero-width and one line high.
pub fn estimate_field_anchor(
    value: &str,
    start: usize,
    field_rect: Rect,
    font: &FieldFont,
    measure: &dyn TextMeasure,
) -> Rect {
    let prefix = char_slice(value, 0, start);
    let text_width = measure.text_width(prefix, font);
    let max_offset = (field_rect.width - FIELD_END_INSET).max(0.0);
    let offset = text_width.clamp(0.0, max_offset);
    let line_height = font
        .line_height
        .filter(|h| *h > 0.0)
        .unwrap_or(DEFAULT_LINE_HEIGHT);

    Rect::new(field_rect.left + offset, field_rect.top, 0.0, line_height)
}

/// Turn a raw snapshot into a `Selection`. Empty text yields `None`.
pub fn extract(raw: &RawSelection, measure: &dyn TextMeasure) -> Option<Selection> {
    match raw {
        RawSelection::FormField {
            value,
            start,
            end,
            field_rect,
            font,
        } => {
            if start == end {
                return None;
            }
            let text = char_slice(value, *start, *end);
            if text.is_empty() {
                return None;
            }
            let anchor = estimate_field_anchor(value, (*start).min(*end), *field_rect, font, measure);
            Some(Selection::new(text, anchor, SourceKind::FormField))
        }
        RawSelection::Range {
            text,
            bounds,
            editable,
        } => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            let kind = if *editable {
                SourceKind::ContentEditable
            } else {
                SourceKind::PlainText
            };
            Some(Selection::new(text, *bounds, kind))
        }
    }
}

/// Result of one observer step.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Nothing for the menu to do.
    Unchanged,
    /// New selection text: show a menu for it.
    Show(Selection),
    /// Same text after scroll/resize: move the existing menu.
    Reposition(Selection),
    /// Selection went away.
    Cleared,
}

/// Debounces selection snapshots for one surface.
///
/// Drive it with the surface's events and call [`SelectionObserver::on_frame`]
/// on every paint tick; the observer decides whether a snapshot is needed.
#[derive(Debug)]
pub struct SelectionObserver {
    last_text: String,
    dirty: bool,
    force_reposition: bool,
    scroll_deadline: Option<Instant>,
    scroll_settle: Duration,
}

impl SelectionObserver {
    pub fn new(scroll_settle: Duration) -> Self {
        SelectionObserver {
            last_text: String::new(),
            dirty: false,
            force_reposition: false,
            scroll_deadline: None,
            scroll_settle,
        }
    }

    /// The surface's selection changed; sample on the next frame.
    pub fn selection_changed(&mut self) {
        self.dirty = true;
    }

    /// Returns true when a visible menu should be hidden until scrolling settles.
    pub fn scrolled(&mut self, now: Instant, menu_visible: bool) -> bool {
        if !menu_visible {
            return false;
        }
        self.scroll_deadline = Some(now + self.scroll_settle);
        true
    }

    pub fn resized(&mut self, menu_visible: bool) {
        if menu_visible {
            self.dirty = true;
            self.force_reposition = true;
        }
    }

    /// True while a scroll settle delay is running.
    pub fn is_settling(&self) -> bool {
        self.scroll_deadline.is_some()
    }

    /// Whether `on_frame` would sample at `now`.
    pub fn wants_frame(&self, now: Instant) -> bool {
        self.dirty || self.scroll_deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Paint-tick entry point. `sample` is only called when a snapshot is due.
    pub fn on_frame<F>(&mut self, now: Instant, sample: F, measure: &dyn TextMeasure) -> Observation
    where
        F: FnOnce() -> Option<RawSelection>,
    {
        if let Some(deadline) = self.scroll_deadline {
            if now >= deadline {
                self.scroll_deadline = None;
                self.dirty = true;
                self.force_reposition = true;
            }
        }
        if !self.dirty {
            return Observation::Unchanged;
        }
        let raw = sample();
        self.observe(raw.as_ref(), measure)
    }

    /// One observation step over an explicit snapshot.
    pub fn observe(&mut self, raw: Option<&RawSelection>, measure: &dyn TextMeasure) -> Observation {
        self.dirty = false;
        let force = std::mem::take(&mut self.force_reposition);

        let Some(selection) = raw.and_then(|raw| extract(raw, measure)) else {
            // Forget the memo so re-selecting the same text fires again
            let had_selection = !self.last_text.is_empty();
            self.last_text.clear();
            return if had_selection {
                Observation::Cleared
            } else {
                Observation::Unchanged
            };
        };

        if !selection.anchor_rect.has_extent() {
            return Observation::Unchanged;
        }

        if selection.text != self.last_text {
            self.last_text.clone_from(&selection.text);
            crate::logging::log_selection_event(
                source_name(selection.source_kind),
                selection.text.chars().count(),
                selection.editable,
            );
            Observation::Show(selection)
        } else if force {
            Observation::Reposition(selection)
        } else {
            Observation::Unchanged
        }
    }

    /// The last text that produced a `Show`, empty when none.
    pub fn last_text(&self) -> &str {
        &self.last_text
    }
}

fn source_name(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::PlainText => "plain",
        SourceKind::FormField => "form-field",
        SourceKind::ContentEditable => "content-editable",
        SourceKind::SystemCapture => "system",
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
