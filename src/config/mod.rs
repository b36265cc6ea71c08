//! Configuration - user preferences loaded from `~/.grammary/config.json`
//!
//! - `defaults` - default constant values
//! - `types` - configuration structs (Config, HotkeyConfig, ...)
//! - `loader` - file system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    DEFAULT_CONFIG_PATH, DEFAULT_CONTENT_PADDING, DEFAULT_EDGE_MARGIN, DEFAULT_HIDE_ANIMATION_MS,
    DEFAULT_HOTKEY_KEY, DEFAULT_POPUP_HEIGHT, DEFAULT_POPUP_MAX_HEIGHT, DEFAULT_POPUP_WIDTH,
    DEFAULT_SCROLL_SETTLE_MS,
};

pub use types::{Config, HotkeyConfig, MenuConfig, PopupConfig, TransformConfig};

pub use loader::{load_config, load_config_from};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
