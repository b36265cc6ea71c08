//! The API key form of the main window.
//!
//! Keys are read and written through [`Backend`] with `keys:get` and
//! `keys:save`, the same requests `--set-key` and `--stdio` use.

use crate::apply::TextField;
use crate::keys::{self, KeyMap};
use crate::protocol::{Backend, Message, Response};

use super::editing::{EditEffect, EditKey, FieldEditor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStatus {
    /// A key is stored; shown masked.
    Stored(String),
    Missing,
    Saved,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct KeyForm {
    pub input: TextField,
    editor: FieldEditor,
    status: Option<KeyStatus>,
}

impl KeyForm {
    pub fn status(&self) -> Option<&KeyStatus> {
        self.status.as_ref()
    }

    /// The input, with every character masked.
    pub fn masked_input(&self) -> String {
        "\u{2022}".repeat(self.input.value.chars().count())
    }

    pub fn edit(&mut self, key: EditKey, extend: bool) -> EditEffect {
        self.editor.apply(&mut self.input, key, extend)
    }

    /// Refresh the status from the stored OpenRouter key.
    pub fn load(&mut self, backend: &Backend) {
        self.status = Some(match backend.handle(&Message::GetKeys) {
            Some(Response::Keys { keys: stored }) => stored
                .get(keys::OPENROUTER)
                .filter(|value| !value.trim().is_empty())
                .map(|value| KeyStatus::Stored(keys::mask(value)))
                .unwrap_or(KeyStatus::Missing),
            _ => KeyStatus::Missing,
        });
    }

    /// Save the typed key. Blank input is ignored.
    pub fn save(&mut self, backend: &Backend) -> bool {
        let value = self.input.value.trim().to_string();
        if value.is_empty() {
            return false;
        }
        let keys: KeyMap = [(keys::OPENROUTER.to_string(), value)].into_iter().collect();
        let saved = match backend.handle(&Message::SaveKeys { keys }) {
            Some(Response::Ack { ok: true }) => KeyStatus::Saved,
            Some(Response::Error { message }) => KeyStatus::Failed(message),
            _ => KeyStatus::Failed("The key could not be saved".to_string()),
        };
        let ok = saved == KeyStatus::Saved;
        self.status = Some(saved);
        if ok {
            self.input = TextField::default();
            self.editor = FieldEditor::default();
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::Tone;
    use crate::keys::{KeyStore, MemoryKeyStore};
    use crate::transform::fakes::EchoTransform;

    fn backend(store: Arc<MemoryKeyStore>) -> Backend {
        Backend::new(Arc::new(EchoTransform::default()), store, Tone::Formal)
    }

    fn type_text(form: &mut KeyForm, text: &str) {
        for ch in text.chars() {
            form.edit(EditKey::Insert(ch.to_string()), false);
        }
    }

    #[test]
    fn saving_stores_the_key_and_clears_the_input() {
        let store = Arc::new(MemoryKeyStore::new());
        let backend = backend(store.clone());
        let mut form = KeyForm::default();

        form.load(&backend);
        assert_eq!(form.status(), Some(&KeyStatus::Missing));

        type_text(&mut form, "sk-or-123456789");
        assert_eq!(form.masked_input().chars().count(), 15);
        assert!(form.save(&backend));

        assert_eq!(form.status(), Some(&KeyStatus::Saved));
        assert!(form.input.value.is_empty());
        assert_eq!(
            store.get_keys().get(keys::OPENROUTER).map(String::as_str),
            Some("sk-or-123456789")
        );

        form.load(&backend);
        assert_eq!(
            form.status(),
            Some(&KeyStatus::Stored(keys::mask("sk-or-123456789")))
        );
    }

    #[test]
    fn blank_input_is_not_saved() {
        let store = Arc::new(MemoryKeyStore::new());
        let backend = backend(store.clone());
        let mut form = KeyForm::default();
        type_text(&mut form, "   ");

        assert!(!form.save(&backend));
        assert!(store.get_keys().is_empty());
        assert_eq!(form.status(), None);
    }
}
