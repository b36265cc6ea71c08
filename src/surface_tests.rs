use super::*;
use crate::apply::Display;
use crate::selection::AverageAdvance;
use crate::transform::fakes::EchoTransform;

fn controller(content: SurfaceContent, transform: EchoTransform) -> SurfaceController {
    SurfaceController::new(
        content,
        &Config::default(),
        Box::new(AverageAdvance::default()),
        Arc::new(transform),
    )
}

fn field_content(value: &str, start: usize, end: usize) -> SurfaceContent {
    let mut content = SurfaceContent::new(Viewport::new(1024.0, 768.0));
    content.field = TextField::new(value);
    content.field.select(start, end);
    content.field_rect = Rect::new(100.0, 100.0, 400.0, 30.0);
    content.site = Some(SelectionSite::Field);
    content
}

fn paragraph_content(text: &str, start: usize, end: usize, editable: bool) -> (SurfaceContent, NodeId) {
    let mut content = SurfaceContent::new(Viewport::new(1024.0, 768.0));
    let body = content.document.root();
    let p = content.document.append_element(body, "p", Display::Block);
    let node = content.document.append_text(p, text);
    content.site = Some(SelectionSite::Text {
        node,
        start,
        end,
        bounds: Rect::new(120.0, 220.0, 90.0, 18.0),
        editable,
    });
    (content, node)
}

#[test]
fn editable_field_result_replaces_selection_and_moves_caret() {
    let mut surface = controller(field_content("I has a apple", 2, 13), EchoTransform::default());
    let now = Instant::now();

    surface.selection_changed();
    assert!(matches!(surface.on_frame(now), Observation::Show(_)));
    assert!(surface.click(ActionKind::CorrectGrammar));

    let applied = surface.wait_settlement(now).unwrap();
    let expected = "grammar:has a apple";
    assert_eq!(surface.content.field.value, format!("I {}", expected));
    assert_eq!(
        applied,
        Applied::Replaced {
            caret: 2 + expected.chars().count()
        }
    );
    assert_eq!(
        surface.content.field.selection_start,
        2 + expected.chars().count()
    );
    assert!(!surface.menu().is_open());
}

#[test]
fn read_only_result_becomes_a_card_after_the_paragraph() {
    let (content, node) = paragraph_content("Some long article text", 0, 22, false);
    let mut surface = controller(content, EchoTransform::default());
    let now = Instant::now();

    surface.selection_changed();
    surface.on_frame(now);
    assert!(surface.click(ActionKind::Summarize));

    let applied = surface.wait_settlement(now).unwrap();
    let Applied::Card(card_id) = applied else {
        panic!("expected a card, got {:?}", applied);
    };
    let doc = &surface.content.document;
    let p = doc.parent(node).unwrap();
    assert_eq!(doc.children(doc.root()), &[p, card_id]);
    let cards = doc.cards();
    assert_eq!(cards[0].1.label, "Summary");
    assert_eq!(cards[0].1.original, "Some long article text");
    assert_eq!(cards[0].1.result, "summary:Some long article text");
    // Source text untouched
    assert_eq!(doc.text(node), Some("Some long article text"));
}

#[test]
fn rich_text_result_edits_in_place() {
    let (content, node) = paragraph_content("Their going home", 0, 11, true);
    let mut surface = controller(content, EchoTransform::default());
    let now = Instant::now();

    surface.selection_changed();
    surface.on_frame(now);
    assert!(surface.click(ActionKind::FixWriting));
    surface.wait_settlement(now).unwrap();

    assert_eq!(
        surface.content.document.text(node),
        Some("grammar:Their going home")
    );
}

#[test]
fn failure_shows_notice_and_leaves_text_untouched() {
    let mut surface = controller(field_content("I has a apple", 2, 13), EchoTransform::failing());
    let now = Instant::now();

    surface.selection_changed();
    surface.on_frame(now);
    assert!(surface.click(ActionKind::CorrectGrammar));

    let applied = surface.wait_settlement(now).unwrap();
    assert!(matches!(applied, Applied::Failed(_)));
    assert_eq!(surface.content.field.value, "I has a apple");
    assert_eq!(surface.notices().len(), 1);
    assert!(surface.notices()[0].message.contains("backend unavailable"));
    assert!(!surface.menu().is_open());

    surface.dismiss_notice(0);
    assert!(surface.notices().is_empty());
}

#[test]
fn field_edited_during_dispatch_is_an_application_failure() {
    let mut surface = controller(field_content("I has a apple", 2, 13), EchoTransform::default());
    let now = Instant::now();

    surface.selection_changed();
    surface.on_frame(now);
    assert!(surface.click(ActionKind::CorrectGrammar));
    surface.content.field.value = "something else entirely".into();

    let applied = surface.wait_settlement(now).unwrap();
    assert!(matches!(applied, Applied::Failed(_)));
    assert_eq!(surface.content.field.value, "something else entirely");
    assert_eq!(
        surface.notices()[0].message,
        "Could not apply the result to the selection"
    );
}

#[test]
fn clearing_the_selection_mid_flight_drops_the_result() {
    let mut surface = controller(field_content("I has a apple", 2, 13), EchoTransform::default());
    let now = Instant::now();

    surface.selection_changed();
    surface.on_frame(now);
    assert!(surface.click(ActionKind::CorrectGrammar));

    surface.content.site = None;
    surface.selection_changed();
    assert_eq!(surface.on_frame(now), Observation::Cleared);

    assert_eq!(surface.wait_settlement(now), None);
    assert_eq!(surface.content.field.value, "I has a apple");
}

#[test]
fn tone_submenu_flow_on_a_surface() {
    let mut surface = controller(field_content("hey whats up", 0, 12), EchoTransform::default());
    let now = Instant::now();

    surface.selection_changed();
    surface.on_frame(now);
    assert!(!surface.click(ActionKind::AdjustTone));
    assert!(surface.choose_tone(Tone::Friendly));
    surface.wait_settlement(now).unwrap();
    assert_eq!(surface.content.field.value, "tone-friendly:hey whats up");
}

#[test]
fn reselecting_the_same_text_elsewhere_applies_to_the_new_range() {
    let mut surface = controller(field_content("cat cat", 0, 3), EchoTransform::default());
    let now = Instant::now();

    surface.selection_changed();
    assert!(matches!(surface.on_frame(now), Observation::Show(_)));

    // Same text, second occurrence: the observer does not show again
    surface.content.field.select(4, 7);
    surface.selection_changed();
    assert_eq!(surface.on_frame(now), Observation::Unchanged);

    assert!(surface.click(ActionKind::CorrectGrammar));
    let applied = surface.wait_settlement(now).unwrap();

    assert_eq!(surface.content.field.value, "cat grammar:cat");
    assert_eq!(
        applied,
        Applied::Replaced {
            caret: 4 + "grammar:cat".chars().count()
        }
    );
}

#[test]
fn missing_key_shows_instructions_without_touching_the_field() {
    let mut surface = controller(
        field_content("I has a apple", 2, 13),
        EchoTransform::unconfigured(),
    );
    let now = Instant::now();

    surface.selection_changed();
    surface.on_frame(now);
    assert!(surface.click(ActionKind::CorrectGrammar));

    let applied = surface.wait_settlement(now).unwrap();
    assert_eq!(
        applied,
        Applied::NeedsConfiguration(Notice {
            message: "grammar needs an API key".into()
        })
    );
    assert_eq!(surface.content.field.value, "I has a apple");
    assert_eq!(surface.notices().len(), 1);
    assert!(!surface.menu().is_open());
}

#[test]
fn unconfigured_service_never_reaches_the_provider() {
    use crate::keys::{self, MemoryKeyStore};
    use crate::transform::{ChatMessage, ChatProvider, TransformService};

    struct Unreachable;
    impl ChatProvider for Unreachable {
        fn provider_id(&self) -> &str {
            "unreachable"
        }
        fn complete(&self, _: &[ChatMessage], _: &str) -> anyhow::Result<String> {
            panic!("provider called without a key");
        }
    }

    if std::env::var(keys::env_var_name(keys::OPENROUTER)).is_ok() {
        return;
    }
    let service = TransformService::new(
        Arc::new(Unreachable),
        Arc::new(MemoryKeyStore::new()),
        "fa",
    );
    let mut surface = SurfaceController::new(
        field_content("I has a apple", 2, 13),
        &Config::default(),
        Box::new(AverageAdvance::default()),
        Arc::new(service),
    );
    let now = Instant::now();

    surface.selection_changed();
    surface.on_frame(now);
    assert!(surface.click(ActionKind::CorrectGrammar));

    let applied = surface.wait_settlement(now).unwrap();
    let Applied::NeedsConfiguration(notice) = applied else {
        panic!("expected setup instructions, got {:?}", applied);
    };
    assert!(notice.message.starts_with("Grammar correction requires an API key"));
    assert_eq!(surface.content.field.value, "I has a apple");
}
