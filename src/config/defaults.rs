//! Default configuration values

pub const DEFAULT_CONFIG_PATH: &str = "~/.grammary/config.json";

/// Capture hotkey: Cmd+Shift+G on macOS, Ctrl+Shift+G elsewhere
#[cfg(target_os = "macos")]
pub const DEFAULT_HOTKEY_MODIFIERS: &[&str] = &["meta", "shift"];
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_HOTKEY_MODIFIERS: &[&str] = &["ctrl", "shift"];
pub const DEFAULT_HOTKEY_KEY: &str = "KeyG";

/// Floating menu
pub const DEFAULT_EDGE_MARGIN: f64 = 10.0;
pub const DEFAULT_HIDE_ANIMATION_MS: u64 = 200;
pub const DEFAULT_SCROLL_SETTLE_MS: u64 = 150;

/// Popup footprint
pub const DEFAULT_POPUP_WIDTH: f64 = 300.0;
pub const DEFAULT_POPUP_HEIGHT: f64 = 250.0;
pub const DEFAULT_POPUP_MAX_HEIGHT: f64 = 600.0;
pub const DEFAULT_CONTENT_PADDING: f64 = 20.0;

/// Text-generation backend
pub const DEFAULT_MODEL: &str = "google/gemma-2-9b-it:free";
pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_SUMMARY_LANGUAGE: &str = "fa";
pub const DEFAULT_TONE: &str = "formal";

pub const DEFAULT_TRAY: bool = true;
