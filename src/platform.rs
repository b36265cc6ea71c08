//! Platform-specific window and pointer helpers.
//!
//! On macOS this talks to AppKit and Core Graphics. On other platforms the
//! functions degrade to no-ops or fixed fallbacks so call sites need no
//! conditional compilation.

use crate::geometry::{Point, Rect, Size};
use crate::logging;

#[cfg(target_os = "macos")]
use cocoa::appkit::NSApp;
#[cfg(target_os = "macos")]
use cocoa::base::{id, nil};
#[cfg(target_os = "macos")]
use cocoa::foundation::NSRect;
#[cfg(target_os = "macos")]
use objc::{class, msg_send, sel, sel_impl};

/// AppKit is main-thread only.
#[cfg(target_os = "macos")]
fn debug_assert_main_thread() {
    unsafe {
        let is_main: bool = msg_send![class!(NSThread), isMainThread];
        debug_assert!(is_main, "AppKit calls must run on the main thread");
    }
}

// ============================================================================
// Application Activation Policy
// ============================================================================

/// No Dock icon and no menu bar ownership; the app lives in the tray and
/// behind the hotkey.
#[cfg(target_os = "macos")]
pub fn configure_as_accessory_app() {
    debug_assert_main_thread();
    unsafe {
        let app: id = NSApp();
        // NSApplicationActivationPolicyAccessory = 1
        let _: () = msg_send![app, setActivationPolicy: 1i64];
    }
    logging::log("PANEL", "Configured app as accessory");
}

#[cfg(not(target_os = "macos"))]
pub fn configure_as_accessory_app() {}

// ============================================================================
// Pointer Position
// ============================================================================

#[cfg(target_os = "macos")]
use core_graphics::event::CGEvent;
#[cfg(target_os = "macos")]
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};

/// Global pointer position in top-left-origin screen coordinates.
#[cfg(target_os = "macos")]
pub fn pointer_position() -> Option<Point> {
    let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState).ok()?;
    let event = CGEvent::new(source).ok()?;
    let location = event.location();
    Some(Point::new(location.x, location.y))
}

#[cfg(not(target_os = "macos"))]
pub fn pointer_position() -> Option<Point> {
    None
}

// ============================================================================
// Displays
// ============================================================================

/// Display frames in top-left-origin global coordinates.
#[cfg(target_os = "macos")]
pub fn display_frames() -> Vec<Rect> {
    debug_assert_main_thread();
    unsafe {
        let screens: id = msg_send![class!(NSScreen), screens];
        let count: usize = msg_send![screens, count];

        // mainScreen, not firstObject: they differ after display rearrangement
        let main_screen: id = msg_send![class!(NSScreen), mainScreen];
        let main_screen = if main_screen == nil {
            logging::log("POSITION", "mainScreen returned nil, using firstObject");
            msg_send![screens, firstObject]
        } else {
            main_screen
        };
        let main_frame: NSRect = msg_send![main_screen, frame];
        let primary_height = main_frame.size.height;

        (0..count)
            .map(|i| {
                let screen: id = msg_send![screens, objectAtIndex: i];
                let frame: NSRect = msg_send![screen, frame];
                Rect::new(
                    frame.origin.x,
                    primary_height - frame.origin.y - frame.size.height,
                    frame.size.width,
                    frame.size.height,
                )
            })
            .collect()
    }
}

#[cfg(not(target_os = "macos"))]
pub fn display_frames() -> Vec<Rect> {
    vec![Rect::new(0.0, 0.0, 1920.0, 1080.0)]
}

fn contains_point(rect: &Rect, point: Point) -> bool {
    point.x >= rect.left && point.x < rect.right() && point.y >= rect.top && point.y < rect.bottom()
}

/// Bounds for a popup of `size` opened at `pointer`: the window's top-left
/// sits at the pointer, pulled back inside the display that holds it.
pub fn popup_bounds(pointer: Point, size: Size, displays: &[Rect]) -> Rect {
    let display = displays
        .iter()
        .find(|d| contains_point(d, pointer))
        .or_else(|| displays.first());

    let Some(display) = display else {
        return Rect::new(pointer.x, pointer.y, size.width, size.height);
    };

    let clamp = |value: f64, min: f64, max: f64| value.min(max).max(min);
    Rect::new(
        clamp(pointer.x, display.left, display.right() - size.width),
        clamp(pointer.y, display.top, display.bottom() - size.height),
        size.width,
        size.height,
    )
}
