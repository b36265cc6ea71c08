//! Prompt construction for each transform operation.
//!
//! Every operation produces a system prompt plus a user prompt that quotes the
//! source text. Grammar and tone prompts keep the language of the source text
//! (Persian for RTL-Semitic text, English otherwise).

use super::provider::ChatMessage;
use crate::context::{detect_script, Language, Tone};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![ChatMessage::system(self.system), ChatMessage::user(self.user)]
    }
}

fn source_language(text: &str) -> &'static str {
    detect_script(text).source_language().name()
}

pub fn translate(text: &str, target: Language, tone: Tone) -> Prompt {
    let target = target.name();
    Prompt {
        system: format!(
            "You are a helpful translator. Translate the given text to {target} accurately \
             with a {tone} tone and only return the translation without any explanations \
             or additional text."
        ),
        user: format!(
            "Translate the following text to {target} with a {tone} tone. Only show the \
             translation without any explanations or additional text: \"{text}\""
        ),
    }
}

pub fn correct_grammar(text: &str) -> Prompt {
    let language = source_language(text);
    Prompt {
        system: format!(
            "You are a {language} language expert. Fix any grammatical errors in the text. \
             Only return the corrected {language} text without any explanations."
        ),
        user: format!(
            "Fix the grammar of this {language} text, maintaining {language} language: \"{text}\""
        ),
    }
}

/// `summary_language` is a language code; unknown codes fall back to English.
pub fn summarize(text: &str, summary_language: &str) -> Prompt {
    let language = source_language(text);
    let output = Language::name_for_code(summary_language);
    Prompt {
        system: format!(
            "You are a helpful summarizer. Create a concise summary in {output}. Only return \
             the summary without any explanations or additional text."
        ),
        user: format!(
            "Create a concise summary of this {language} text in {output}. Only show the \
             summary without any explanations or additional text: \"{text}\""
        ),
    }
}

pub fn adjust_tone(text: &str, tone: Tone) -> Prompt {
    let language = source_language(text);
    Prompt {
        system: format!(
            "You are a {language} writing expert. Rewrite the text in a {tone} tone while \
             maintaining {language} language. Only return the rewritten text without any \
             explanations."
        ),
        user: format!(
            "Rewrite this {language} text in a {tone} tone, maintaining {language} language: \
             \"{text}\""
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_names_target_and_tone() {
        let p = translate("سلام", Language::French, Tone::Friendly);
        assert!(p.system.contains("to French"));
        assert!(p.system.contains("friendly tone"));
        assert!(p.user.ends_with("\"سلام\""));
    }

    #[test]
    fn grammar_keeps_source_language() {
        assert!(correct_grammar("their going").user.contains("English text"));
        let persian = correct_grammar("من رفتم");
        assert!(persian.system.contains("Persian language expert"));
        assert!(persian.user.contains("maintaining Persian"));
    }

    #[test]
    fn summary_uses_configured_language() {
        let p = summarize("A long article", "fa");
        assert!(p.user.contains("English text in Persian"));
        assert!(p.system.contains("summary in Persian"));
        assert!(summarize("x", "??").system.contains("in English"));
    }

    #[test]
    fn tone_prompt_mentions_tone() {
        let p = adjust_tone("hey there", Tone::Academic);
        assert!(p.user.contains("academic tone"));
    }

    #[test]
    fn messages_are_system_then_user() {
        let messages = adjust_tone("x", Tone::Formal).into_messages();
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
    }
}
