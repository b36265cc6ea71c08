//! The main window: a scratch text field with the selection menu, the API
//! key form and recent activity.
//!
//! The scratch field is a full surface: selection, scroll and paint ticks go
//! to a [`SurfaceController`](crate::surface::SurfaceController) and the menu
//! is drawn from its [`MenuState`](crate::menu::MenuState).
//!
//! # Module Structure
//!
//! - `editing`: keyboard and pointer editing of a text field
//! - `settings`: the API key form
//! - `window`: gpui rendering and the window singleton

mod editing;
mod settings;
mod window;

pub use editing::{char_index_at, EditEffect, EditKey, FieldEditor};
pub use settings::{KeyForm, KeyStatus};
pub use window::{open_workspace, WorkspaceDeps, WorkspaceWindow};

use crate::geometry::{Rect, Viewport};
use crate::positioner::{Appearance, Placement};

/// Outer padding of the window content.
pub const CONTENT_PADDING: f64 = 24.0;
/// Title and hint above the scratch field.
pub const HEADER_HEIGHT: f64 = 56.0;
pub const FIELD_HEIGHT: f64 = 40.0;
/// Text inset inside the scratch field.
pub const FIELD_PADDING_X: f64 = 10.0;
/// Everything below the field; scrolling stops when it is in view.
pub const CONTENT_HEIGHT: f64 = 640.0;

/// Viewport-space rectangle of the scratch field.
pub fn field_rect(viewport: Viewport) -> Rect {
    Rect::new(
        CONTENT_PADDING,
        CONTENT_PADDING + HEADER_HEIGHT - viewport.scroll_y,
        (viewport.width - 2.0 * CONTENT_PADDING).max(0.0),
        FIELD_HEIGHT,
    )
}

/// Vertical scroll after a wheel `delta`, kept inside the content.
pub fn clamp_scroll(viewport: Viewport, delta: f64) -> f64 {
    let max = (CONTENT_HEIGHT - viewport.height).max(0.0);
    (viewport.scroll_y + delta).clamp(0.0, max)
}

/// Where to draw the menu in the window: its document-space placement
/// moved into the viewport, then shifted by the reveal offset.
pub fn menu_origin(placement: &Placement, viewport: Viewport, appearance: Appearance) -> (f32, f32) {
    (
        (placement.rect.left - viewport.scroll_x) as f32,
        (placement.rect.top - viewport.scroll_y) as f32 + appearance.offset_y,
    )
}
