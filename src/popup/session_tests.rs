use super::*;
use crate::context::TranslateTarget;
use crate::dispatcher::{execute, ActionResult, DispatchTicket};
use crate::error::GrammaryError;
use crate::transform::fakes::EchoTransform;

fn session_with(text: &str) -> PopupSession {
    let mut session = PopupSession::new(PopupId(1), &PopupConfig::default());
    session.receive(SelectionPayload {
        text: text.into(),
        editable: true,
        script: crate::context::detect_script(text),
    });
    session
}

fn dispatched(command: MenuCommand) -> (ActionRequest, DispatchTicket) {
    match command {
        MenuCommand::Dispatch(request, ticket) => (request, ticket),
        other => panic!("expected a dispatch, got {:?}", other),
    }
}

fn run(session: &mut PopupSession, command: MenuCommand) -> bool {
    let (request, ticket) = dispatched(command);
    let result = execute(&EchoTransform::default(), &request, Tone::Formal);
    session.settle(Settlement {
        ticket,
        request,
        result,
    })
}

#[test]
fn nothing_is_clickable_before_the_payload_arrives() {
    let mut session = PopupSession::new(PopupId(1), &PopupConfig::default());
    assert!(session.actions().is_empty());
    assert_eq!(session.click(ActionKind::CorrectGrammar), MenuCommand::Ignored);
}

#[test]
fn editable_persian_capture_gets_a_language_picker() {
    let session = session_with("این یک متن است");
    assert_eq!(
        session.actions().get(ActionKind::Translate),
        Some(&MenuAction::Translate(TranslateTarget::Picker))
    );
    assert!(session.actions().contains_kind(ActionKind::FixWriting));
}

#[test]
fn language_choice_translates_once_into_the_result_area() {
    let mut session = session_with("سلام");
    assert_eq!(session.click(ActionKind::Translate), MenuCommand::SubmenuToggled);
    assert!(session.language_picker_visible());

    let command = session.choose_language(Language::French);
    assert!(!session.language_picker_visible());
    assert!(run(&mut session, command));

    assert_eq!(
        session.result(),
        &ResultArea::Success {
            kind: ActionKind::Translate,
            text: "translate-fr-formal:سلام".into()
        }
    );
    // The popup stays open for copying
    assert!(!session.is_busy());
}

#[test]
fn processing_state_blocks_other_actions() {
    let mut session = session_with("their going home");
    let (_request, _ticket) = dispatched(session.click(ActionKind::CorrectGrammar));

    assert_eq!(
        session.result(),
        &ResultArea::Processing(ActionKind::CorrectGrammar)
    );
    assert!(!session.is_enabled(ActionKind::FixWriting));
    assert_eq!(session.click(ActionKind::FixWriting), MenuCommand::Ignored);
    assert_eq!(session.click(ActionKind::AdjustTone), MenuCommand::Ignored);
}

#[test]
fn tone_submenu_dispatches_adjust_tone() {
    let mut session = session_with("hey whats up");
    assert_eq!(session.click(ActionKind::AdjustTone), MenuCommand::SubmenuToggled);
    let command = session.choose_tone(Tone::Creative);
    assert!(!session.tone_submenu_visible());
    assert!(run(&mut session, command));
    assert_eq!(
        session.result().text(),
        Some("tone-creative:hey whats up")
    );
}

#[test]
fn failure_shows_the_error_in_the_result_area() {
    let mut session = session_with("text");
    let (request, ticket) = dispatched(session.click(ActionKind::CorrectGrammar));
    session.settle(Settlement {
        ticket,
        request,
        result: ActionResult::failure(&GrammaryError::service("rate limited")),
    });
    match session.result() {
        ResultArea::Error { message } => assert!(message.contains("rate limited")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn missing_key_shows_setup_instructions_that_cannot_be_copied() {
    let mut session = session_with("I has a apple");
    let (request, ticket) = dispatched(session.click(ActionKind::CorrectGrammar));
    let result = execute(&EchoTransform::unconfigured(), &request, Tone::Formal);
    assert!(session.settle(Settlement {
        ticket,
        request,
        result,
    }));

    assert_eq!(
        session.result(),
        &ResultArea::NeedsConfiguration {
            message: "grammar needs an API key".into()
        }
    );
    let copied = session
        .copy_result(|_| panic!("setup instructions copied"), Instant::now())
        .unwrap();
    assert!(!copied);
}

#[test]
fn result_growth_is_capped() {
    let mut session = session_with("text");
    assert_eq!(session.size(), Size::new(300.0, 250.0));
    assert_eq!(session.content_measured(180.0), Size::new(300.0, 200.0));
    assert_eq!(session.content_measured(2000.0), Size::new(300.0, 600.0));
}

#[test]
fn copy_shows_a_notification_for_three_seconds() {
    let mut session = session_with("hello");
    let command = session.click(ActionKind::CorrectGrammar);
    run(&mut session, command);

    let now = Instant::now();
    let mut copied = String::new();
    let did_copy = session
        .copy_result(
            |text| {
                copied = text.to_string();
                Ok(())
            },
            now,
        )
        .unwrap();

    assert!(did_copy);
    assert_eq!(copied, "grammar:hello");
    assert_eq!(session.notification(now), Some("Copied to clipboard"));
    assert_eq!(
        session.notification(now + Duration::from_millis(2999)),
        Some("Copied to clipboard")
    );
    assert_eq!(session.notification(now + NOTIFICATION_DURATION), None);

    session.tick(now + NOTIFICATION_DURATION);
    assert_eq!(session.next_deadline(), None);
}

#[test]
fn copy_without_a_result_does_nothing() {
    let mut session = session_with("hello");
    let copied = session
        .copy_result(|_| panic!("nothing to copy"), Instant::now())
        .unwrap();
    assert!(!copied);
}

#[test]
fn closing_orphans_the_in_flight_action() {
    let mut session = session_with("hello");
    let (request, ticket) = dispatched(session.click(ActionKind::CorrectGrammar));
    session.close();
    assert!(ticket.token.is_cancelled());
    assert!(!session.settle(Settlement {
        ticket,
        request,
        result: ActionResult::success("late"),
    }));
}

#[test]
fn content_estimate_grows_with_the_result() {
    use crate::selection::AverageAdvance;

    let measure = AverageAdvance::default();
    let mut session = session_with("hello");
    let empty = session.estimate_content_height(&measure);

    let (request, ticket) = dispatched(session.click(ActionKind::CorrectGrammar));
    session.settle(Settlement {
        ticket,
        request,
        result: ActionResult::success("word ".repeat(200)),
    });
    let long = session.estimate_content_height(&measure);

    assert!(long > empty);
    assert_eq!(session.content_measured(long).height, 600.0);
}
