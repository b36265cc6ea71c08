//! Keyboard and pointer editing of a [`TextField`].
//!
//! Offsets are character indices. The field's `selection_start..end` is
//! always kept ordered; [`FieldEditor`] remembers which end is the anchor so
//! Shift+Arrow and drags extend from the right side.

use crate::apply::TextField;
use crate::selection::{char_slice, FieldFont, TextMeasure};

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// One editing intent, decoded from a keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKey {
    Left,
    Right,
    Home,
    End,
    Backspace,
    Delete,
    SelectAll,
    Insert(String),
}

impl EditKey {
    /// Decode a key name (`"left"`, `"backspace"`, `"a"`...). `key_char` is
    /// the text the key would type, if any.
    pub fn parse(key: &str, platform_modifier: bool, key_char: Option<&str>) -> Option<Self> {
        let key = key.to_lowercase();
        match (key.as_str(), platform_modifier) {
            ("a", true) => Some(EditKey::SelectAll),
            ("left" | "arrowleft", false) => Some(EditKey::Left),
            ("right" | "arrowright", false) => Some(EditKey::Right),
            ("home", false) => Some(EditKey::Home),
            ("end", false) => Some(EditKey::End),
            ("backspace", false) => Some(EditKey::Backspace),
            ("delete", false) => Some(EditKey::Delete),
            (_, true) => None,
            _ => key_char
                .filter(|s| !s.is_empty() && !s.chars().all(char::is_control))
                .map(|s| EditKey::Insert(s.to_string())),
        }
    }
}

/// What an edit changed. Either flag means the observer must be told.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditEffect {
    pub text_changed: bool,
    pub selection_changed: bool,
}

impl EditEffect {
    pub fn any(self) -> bool {
        self.text_changed || self.selection_changed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldEditor {
    anchor: usize,
    caret: usize,
}

impl FieldEditor {
    /// Pick up a selection set from outside (a result was applied).
    pub fn sync(&mut self, field: &TextField) {
        if (self.anchor.min(self.caret), self.anchor.max(self.caret))
            != (field.selection_start, field.selection_end)
        {
            self.anchor = field.selection_start;
            self.caret = field.selection_end;
        }
    }

    fn commit(&self, field: &mut TextField, text_changed: bool) -> EditEffect {
        let before = (field.selection_start, field.selection_end);
        field.select(self.anchor, self.caret);
        EditEffect {
            text_changed,
            selection_changed: before != (field.selection_start, field.selection_end),
        }
    }

    fn replace_selection(&mut self, field: &mut TextField, replacement: &str) {
        let (start, end) = (field.selection_start, field.selection_end);
        let tail = char_slice(&field.value, end, usize::MAX).to_string();
        let mut value = char_slice(&field.value, 0, start).to_string();
        value.push_str(replacement);
        value.push_str(&tail);
        field.value = value;
        self.caret = start + char_len(replacement);
        self.anchor = self.caret;
    }

    pub fn apply(&mut self, field: &mut TextField, key: EditKey, extend: bool) -> EditEffect {
        self.sync(field);
        let len = char_len(&field.value);
        let has_selection = field.selection_start != field.selection_end;

        let target = match key {
            EditKey::SelectAll => {
                self.anchor = 0;
                self.caret = len;
                return self.commit(field, false);
            }
            EditKey::Left if has_selection && !extend => field.selection_start,
            EditKey::Right if has_selection && !extend => field.selection_end,
            EditKey::Left => self.caret.saturating_sub(1),
            EditKey::Right => self.caret + 1,
            EditKey::Home => 0,
            EditKey::End => len,
            EditKey::Backspace | EditKey::Delete if has_selection => {
                self.replace_selection(field, "");
                return self.commit(field, true);
            }
            EditKey::Backspace => {
                if self.caret == 0 {
                    return EditEffect::default();
                }
                field.selection_start = self.caret - 1;
                field.selection_end = self.caret;
                self.replace_selection(field, "");
                return self.commit(field, true);
            }
            EditKey::Delete => {
                if self.caret >= len {
                    return EditEffect::default();
                }
                field.selection_start = self.caret;
                field.selection_end = self.caret + 1;
                self.replace_selection(field, "");
                return self.commit(field, true);
            }
            EditKey::Insert(text) => {
                self.replace_selection(field, &text);
                return self.commit(field, true);
            }
        };

        self.caret = target.min(len);
        if !extend {
            self.anchor = self.caret;
        }
        self.commit(field, false)
    }

    /// Pointer pressed at character `index`; Shift extends.
    pub fn press(&mut self, field: &mut TextField, index: usize, extend: bool) -> EditEffect {
        self.sync(field);
        self.caret = index.min(char_len(&field.value));
        if !extend {
            self.anchor = self.caret;
        }
        self.commit(field, false)
    }

    /// Pointer dragged to character `index` with the button held.
    pub fn drag(&mut self, field: &mut TextField, index: usize) -> EditEffect {
        self.press(field, index, true)
    }
}

/// Character boundary nearest to `x` pixels into `value`.
pub fn char_index_at(measure: &dyn TextMeasure, font: &FieldFont, value: &str, x: f64) -> usize {
    if x <= 0.0 {
        return 0;
    }
    let mut previous = 0.0;
    for (index, (byte, ch)) in value.char_indices().enumerate() {
        let width = measure.text_width(&value[..byte + ch.len_utf8()], font);
        if x < width {
            return if x - previous < width - x {
                index
            } else {
                index + 1
            };
        }
        previous = width;
    }
    char_len(value)
}
