//! Context classification - which actions a selection gets.
//!
//! `classify` is a pure function: no network, no surface access. It looks at
//! the selection's editability and a coarse script heuristic and composes the
//! ordered action set for the floating menu or popup.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::selection::Selection;

/// Coarse language-family classification of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Script {
    /// Arabic / Persian block (U+0600..=U+06FF).
    RtlSemitic,
    Other,
}

impl Script {
    /// The language a transform should keep when it must not change language.
    pub fn source_language(self) -> Language {
        match self {
            Script::RtlSemitic => Language::Persian,
            Script::Other => Language::English,
        }
    }

    /// The default translation target for text in this script.
    pub fn translation_target(self) -> Language {
        match self {
            Script::RtlSemitic => Language::English,
            Script::Other => Language::Persian,
        }
    }
}

/// First code point in the Arabic block wins; everything else is `Other`.
pub fn detect_script(text: &str) -> Script {
    if text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c)) {
        Script::RtlSemitic
    } else {
        Script::Other
    }
}

/// The kinds of text transform a menu can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Translate,
    Summarize,
    CorrectGrammar,
    FixWriting,
    AdjustTone,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Translate => "translate",
            ActionKind::Summarize => "summarize",
            ActionKind::CorrectGrammar => "correct-grammar",
            ActionKind::FixWriting => "fix-writing",
            ActionKind::AdjustTone => "adjust-tone",
        }
    }

    /// Label used on result cards and notices.
    pub fn result_label(self) -> &'static str {
        match self {
            ActionKind::Translate => "Translation",
            ActionKind::Summarize => "Summary",
            ActionKind::CorrectGrammar => "Grammar",
            ActionKind::FixWriting => "Writing",
            ActionKind::AdjustTone => "Tone",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed tone vocabulary offered by the AdjustTone submenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Friendly,
    Academic,
    Creative,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Formal, Tone::Friendly, Tone::Academic, Tone::Creative];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Friendly => "friendly",
            Tone::Academic => "academic",
            Tone::Creative => "creative",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Formal
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translation target languages understood by the prompt builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Persian,
    French,
    German,
    Spanish,
    Arabic,
    Turkish,
    Russian,
    Chinese,
}

impl Language {
    /// Targets offered by the popup's language picker.
    pub const PICKER: [Language; 8] = [
        Language::English,
        Language::French,
        Language::German,
        Language::Spanish,
        Language::Arabic,
        Language::Turkish,
        Language::Russian,
        Language::Chinese,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Persian => "fa",
            Language::French => "fr",
            Language::German => "de",
            Language::Spanish => "es",
            Language::Arabic => "ar",
            Language::Turkish => "tr",
            Language::Russian => "ru",
            Language::Chinese => "zh",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Persian => "Persian",
            Language::French => "French",
            Language::German => "German",
            Language::Spanish => "Spanish",
            Language::Arabic => "Arabic",
            Language::Turkish => "Turkish",
            Language::Russian => "Russian",
            Language::Chinese => "Chinese",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        [Language::Persian]
            .into_iter()
            .chain(Self::PICKER)
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    /// Unknown codes fall back to English, matching the prompt builders.
    pub fn name_for_code(code: &str) -> &'static str {
        Self::from_code(code).unwrap_or(Language::English).name()
    }
}

/// How a Translate entry picks its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslateTarget {
    Fixed(Language),
    /// Opens the language picker; choosing a language dispatches once.
    Picker,
}

/// One entry of a menu's action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    Translate(TranslateTarget),
    Summarize,
    CorrectGrammar,
    FixWriting,
    /// Opens the tone submenu.
    AdjustTone,
}

impl MenuAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            MenuAction::Translate(_) => ActionKind::Translate,
            MenuAction::Summarize => ActionKind::Summarize,
            MenuAction::CorrectGrammar => ActionKind::CorrectGrammar,
            MenuAction::FixWriting => ActionKind::FixWriting,
            MenuAction::AdjustTone => ActionKind::AdjustTone,
        }
    }

    /// True for entries that open a submenu instead of dispatching.
    pub fn opens_submenu(&self) -> bool {
        matches!(
            self,
            MenuAction::AdjustTone | MenuAction::Translate(TranslateTarget::Picker)
        )
    }

    pub fn label(&self) -> String {
        match self {
            MenuAction::Translate(TranslateTarget::Fixed(lang)) => {
                format!("Translate to {}", lang.name())
            }
            MenuAction::Translate(TranslateTarget::Picker) => "Translate".to_string(),
            MenuAction::Summarize => "Summarize".to_string(),
            MenuAction::CorrectGrammar => "Check grammar".to_string(),
            MenuAction::FixWriting => "Fix writing".to_string(),
            MenuAction::AdjustTone => "Change tone".to_string(),
        }
    }
}

/// Ordered, duplicate-free set of menu actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet(SmallVec<[MenuAction; 4]>);

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `action` unless an entry of the same kind is already present.
    pub fn push(&mut self, action: MenuAction) {
        if !self.contains_kind(action.kind()) {
            self.0.push(action);
        }
    }

    pub fn contains_kind(&self, kind: ActionKind) -> bool {
        self.0.iter().any(|a| a.kind() == kind)
    }

    pub fn get(&self, kind: ActionKind) -> Option<&MenuAction> {
        self.0.iter().find(|a| a.kind() == kind)
    }

    pub fn kinds(&self) -> Vec<ActionKind> {
        self.0.iter().map(|a| a.kind()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MenuAction> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Swaps a fixed Translate entry for the language picker.
    pub fn with_language_picker(mut self) -> Self {
        for action in self.0.iter_mut() {
            if let MenuAction::Translate(target) = action {
                *target = TranslateTarget::Picker;
            }
        }
        self
    }
}

impl FromIterator<MenuAction> for ActionSet {
    fn from_iter<I: IntoIterator<Item = MenuAction>>(iter: I) -> Self {
        let mut set = ActionSet::new();
        for action in iter {
            set.push(action);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub script: Script,
    pub actions: ActionSet,
}

/// Classify a selection into its script and action set.
pub fn classify(selection: &Selection) -> Classification {
    classify_text(&selection.text, selection.editable)
}

/// | editable | script      | actions                                      |
/// |----------|-------------|----------------------------------------------|
/// | yes      | RTL-Semitic | Translate(->Other), FixWriting               |
/// | yes      | Other       | CorrectGrammar, FixWriting, AdjustTone       |
/// | no       | RTL-Semitic | Translate(->Other)                           |
/// | no       | Other       | Translate(->RTL-Semitic), Summarize          |
pub fn classify_text(text: &str, editable: bool) -> Classification {
    let script = detect_script(text);
    let translate = MenuAction::Translate(TranslateTarget::Fixed(script.translation_target()));

    let actions: ActionSet = match (editable, script) {
        (true, Script::RtlSemitic) => [translate, MenuAction::FixWriting].into_iter().collect(),
        (true, Script::Other) => [
            MenuAction::CorrectGrammar,
            MenuAction::FixWriting,
            MenuAction::AdjustTone,
        ]
        .into_iter()
        .collect(),
        (false, Script::RtlSemitic) => [translate].into_iter().collect(),
        (false, Script::Other) => [translate, MenuAction::Summarize].into_iter().collect(),
    };

    Classification { script, actions }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_block_is_rtl_semitic() {
        assert_eq!(detect_script("سلام دنیا"), Script::RtlSemitic);
        assert_eq!(detect_script("\u{0600}"), Script::RtlSemitic);
        assert_eq!(detect_script("\u{06FF}"), Script::RtlSemitic);
    }

    #[test]
    fn ascii_is_other() {
        assert_eq!(detect_script("hello world"), Script::Other);
        assert_eq!(detect_script(""), Script::Other);
        // Just outside the block on both sides
        assert_eq!(detect_script("\u{05FF}\u{0700}"), Script::Other);
    }

    #[test]
    fn mixed_text_with_one_arabic_code_point_is_rtl() {
        assert_eq!(detect_script("the word کتاب means book"), Script::RtlSemitic);
    }

    #[test]
    fn editable_rtl_gets_translate_to_english_and_fix_writing() {
        let c = classify_text("متن فارسی", true);
        assert_eq!(c.script, Script::RtlSemitic);
        assert_eq!(
            c.actions.kinds(),
            vec![ActionKind::Translate, ActionKind::FixWriting]
        );
        assert_eq!(
            c.actions.get(ActionKind::Translate),
            Some(&MenuAction::Translate(TranslateTarget::Fixed(Language::English)))
        );
    }

    #[test]
    fn editable_latin_gets_grammar_writing_and_tone() {
        let c = classify_text("their going home", true);
        assert_eq!(
            c.actions.kinds(),
            vec![
                ActionKind::CorrectGrammar,
                ActionKind::FixWriting,
                ActionKind::AdjustTone
            ]
        );
        assert!(c.actions.get(ActionKind::AdjustTone).unwrap().opens_submenu());
    }

    #[test]
    fn read_only_rtl_gets_translate_only() {
        let c = classify_text("متن", false);
        assert_eq!(c.actions.kinds(), vec![ActionKind::Translate]);
    }

    #[test]
    fn read_only_latin_gets_translate_to_persian_and_summarize() {
        let c = classify_text("A long article paragraph.", false);
        assert_eq!(
            c.actions.kinds(),
            vec![ActionKind::Translate, ActionKind::Summarize]
        );
        assert_eq!(
            c.actions.get(ActionKind::Translate),
            Some(&MenuAction::Translate(TranslateTarget::Fixed(Language::Persian)))
        );
    }

    #[test]
    fn action_set_ignores_duplicate_kinds() {
        let set: ActionSet = [
            MenuAction::Summarize,
            MenuAction::Summarize,
            MenuAction::FixWriting,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn language_picker_replaces_fixed_target() {
        let c = classify_text("متن", true);
        let set = c.actions.with_language_picker();
        assert_eq!(
            set.get(ActionKind::Translate),
            Some(&MenuAction::Translate(TranslateTarget::Picker))
        );
    }

    #[test]
    fn tone_parse_and_language_codes() {
        assert_eq!(Tone::parse(" Academic "), Some(Tone::Academic));
        assert_eq!(Tone::parse("sarcastic"), None);
        assert_eq!(Language::name_for_code("fa"), "Persian");
        assert_eq!(Language::name_for_code("xx"), "English");
    }
}
