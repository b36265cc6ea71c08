//! Hotkey-triggered popup surfaces for system-wide selections.
//!
//! ```text
//! src/popup/
//! ├── lifecycle.rs - Idle -> Capturing -> PopupOpen over a PopupHost
//! ├── session.rs   - per-window view-model: actions, result area, copy
//! └── window.rs    - gpui window + the controller that owns the lifecycle
//! ```
//!
//! `lifecycle` and `session` are framework-free and tested without a window
//! server; `window` only translates between them and gpui.

pub mod lifecycle;
pub mod session;
pub mod window;

pub use lifecycle::{CaptureOutcome, OpenPopup, PopupHost, PopupId, PopupLifecycle, PopupState};
pub use session::{PopupSession, ResultArea, NOTIFICATION_DURATION};
pub use window::{PopupController, PopupDeps, PopupEvent, PopupWindow};
