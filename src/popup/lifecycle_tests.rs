use super::*;
use crate::context::Script;
use anyhow::anyhow;

/// Records host calls and asserts that two surfaces never coexist.
#[derive(Default)]
struct RecordingHost {
    live: Vec<PopupId>,
    events: Vec<String>,
    pushed: Vec<(PopupId, SelectionPayload)>,
    fail_open: bool,
}

impl PopupHost for RecordingHost {
    fn open(&mut self, id: PopupId, bounds: Rect) -> anyhow::Result<()> {
        if self.fail_open {
            return Err(anyhow!("no window server"));
        }
        assert!(
            self.live.is_empty(),
            "opening {} while {:?} is still live",
            id,
            self.live
        );
        self.live.push(id);
        self.events
            .push(format!("open {} at {},{}", id, bounds.left, bounds.top));
        Ok(())
    }

    fn close(&mut self, id: PopupId) {
        self.live.retain(|live| *live != id);
        self.events.push(format!("close {}", id));
    }

    fn push(&mut self, id: PopupId, payload: &SelectionPayload) {
        self.pushed.push((id, payload.clone()));
    }
}

fn lifecycle() -> PopupLifecycle {
    PopupLifecycle::new(Size::new(300.0, 250.0))
}

fn displays() -> Vec<Rect> {
    vec![Rect::new(0.0, 0.0, 1440.0, 900.0)]
}

fn capture(
    popups: &mut PopupLifecycle,
    host: &mut RecordingHost,
    result: anyhow::Result<String>,
) -> CaptureOutcome {
    assert!(popups.hotkey_pressed(Some(Point::new(100.0, 120.0))));
    popups.captured(result, &displays(), host)
}

#[test]
fn whitespace_capture_returns_to_idle_without_a_surface() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();

    let outcome = capture(&mut popups, &mut host, Ok("   ".into()));

    assert_eq!(outcome, CaptureOutcome::NoSelection);
    assert_eq!(popups.state(), &PopupState::Idle);
    assert!(host.events.is_empty());
}

#[test]
fn capture_error_is_treated_as_no_selection() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();

    let outcome = capture(&mut popups, &mut host, Err(anyhow!("permission denied")));

    assert_eq!(outcome, CaptureOutcome::NoSelection);
    assert_eq!(popups.state(), &PopupState::Idle);
    assert!(host.events.is_empty());
}

#[test]
fn capture_opens_a_popup_at_the_pointer() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();

    let outcome = capture(&mut popups, &mut host, Ok("hello there".into()));

    let CaptureOutcome::Opened(id) = outcome else {
        panic!("expected a popup, got {:?}", outcome);
    };
    assert_eq!(host.events, vec![format!("open {} at 100,120", id)]);
    let popup = popups.current().unwrap();
    assert!(popup.selection.editable);
    assert_eq!(popup.selection.script, Script::Other);
    assert!(!popup.ready);
}

#[test]
fn payload_is_pushed_only_after_ready_and_only_once() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();
    let CaptureOutcome::Opened(id) = capture(&mut popups, &mut host, Ok("سلام".into())) else {
        panic!("expected a popup");
    };

    assert!(host.pushed.is_empty());
    assert!(popups.ready(id, &mut host));
    assert!(!popups.ready(id, &mut host));

    assert_eq!(
        host.pushed,
        vec![(
            id,
            SelectionPayload {
                text: "سلام".into(),
                editable: true,
                script: Script::RtlSemitic,
            }
        )]
    );
}

#[test]
fn second_hotkey_destroys_the_first_popup_before_creating_the_next() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();
    let CaptureOutcome::Opened(first) = capture(&mut popups, &mut host, Ok("one".into())) else {
        panic!("expected a popup");
    };
    let CaptureOutcome::Opened(second) = capture(&mut popups, &mut host, Ok("two".into())) else {
        panic!("expected a popup");
    };

    assert_ne!(first, second);
    assert_eq!(
        host.events,
        vec![
            format!("open {} at 100,120", first),
            format!("close {}", first),
            format!("open {} at 100,120", second),
        ]
    );
    assert_eq!(host.live, vec![second]);
}

#[test]
fn blank_capture_while_open_closes_the_old_popup() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();
    capture(&mut popups, &mut host, Ok("one".into()));

    assert_eq!(
        capture(&mut popups, &mut host, Ok("\n\t".into())),
        CaptureOutcome::NoSelection
    );
    assert!(host.live.is_empty());
    assert_eq!(popups.state(), &PopupState::Idle);
}

#[test]
fn blur_closes_but_stale_ids_are_ignored() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();
    let CaptureOutcome::Opened(first) = capture(&mut popups, &mut host, Ok("one".into())) else {
        panic!("expected a popup");
    };
    let CaptureOutcome::Opened(second) = capture(&mut popups, &mut host, Ok("two".into())) else {
        panic!("expected a popup");
    };

    // The replaced window's late blur must not close the new one
    assert!(!popups.blurred(first, &mut host));
    assert_eq!(host.live, vec![second]);

    assert!(popups.blurred(second, &mut host));
    assert_eq!(popups.state(), &PopupState::Idle);
    assert!(host.live.is_empty());
}

#[test]
fn events_inside_the_popup_keep_it_open() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();
    let CaptureOutcome::Opened(id) = capture(&mut popups, &mut host, Ok("text".into())) else {
        panic!("expected a popup");
    };
    popups.ready(id, &mut host);

    // Only blur and explicit close end the session
    assert!(matches!(popups.state(), PopupState::PopupOpen(_)));
    assert!(popups.close_requested(id, &mut host));
    assert!(!popups.close_requested(id, &mut host));
}

#[test]
fn hotkey_during_capture_is_ignored() {
    let mut popups = lifecycle();
    assert!(popups.hotkey_pressed(None));
    assert!(!popups.hotkey_pressed(None));
}

#[test]
fn capture_without_hotkey_is_ignored() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();
    assert_eq!(
        popups.captured(Ok("x".into()), &displays(), &mut host),
        CaptureOutcome::Ignored
    );
}

#[test]
fn open_failure_leaves_the_lifecycle_idle() {
    let mut popups = lifecycle();
    let mut host = RecordingHost {
        fail_open: true,
        ..Default::default()
    };

    let outcome = capture(&mut popups, &mut host, Ok("text".into()));

    assert!(matches!(outcome, CaptureOutcome::Failed(_)));
    assert_eq!(popups.state(), &PopupState::Idle);
}

#[test]
fn popup_is_kept_on_screen() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();
    assert!(popups.hotkey_pressed(Some(Point::new(1400.0, 880.0))));
    popups.captured(Ok("edge".into()), &displays(), &mut host);
    let bounds = popups.current().unwrap().bounds;
    assert_eq!(bounds.right(), 1440.0);
    assert_eq!(bounds.bottom(), 900.0);
}

#[test]
fn popup_opens_where_the_pointer_was_when_the_hotkey_fired() {
    let mut popups = lifecycle();
    let mut host = RecordingHost::default();
    assert!(popups.hotkey_pressed(Some(Point::new(200.0, 300.0))));
    // The user moves the pointer while the capture runs; only the press counts
    popups.captured(Ok("moved".into()), &displays(), &mut host);

    let bounds = popups.current().unwrap().bounds;
    assert_eq!((bounds.left, bounds.top), (200.0, 300.0));
}
