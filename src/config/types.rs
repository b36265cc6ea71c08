//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults::*;
use crate::context::Tone;

// ============================================
// HOTKEY
// ============================================

/// A key combination in `global-hotkey` vocabulary.
///
/// `modifiers` holds "meta" / "cmd", "ctrl", "alt" / "opt", "shift";
/// `key` is a `Code` name such as "KeyG" or "Digit0".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub modifiers: Vec<String>,
    pub key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        HotkeyConfig {
            modifiers: DEFAULT_HOTKEY_MODIFIERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            key: DEFAULT_HOTKEY_KEY.to_string(),
        }
    }
}

// ============================================
// MENU
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuConfig {
    /// Minimum distance between the menu and the viewport's left/right edge
    #[serde(default = "default_edge_margin")]
    pub edge_margin: f64,
    /// How long a hidden menu stays mounted before it is removed
    #[serde(default = "default_hide_animation_ms")]
    pub hide_animation_ms: u64,
    /// Quiet period after the last scroll event before re-observing
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,
}

fn default_edge_margin() -> f64 {
    DEFAULT_EDGE_MARGIN
}
fn default_hide_animation_ms() -> u64 {
    DEFAULT_HIDE_ANIMATION_MS
}
fn default_scroll_settle_ms() -> u64 {
    DEFAULT_SCROLL_SETTLE_MS
}

impl MenuConfig {
    pub fn hide_animation(&self) -> Duration {
        Duration::from_millis(self.hide_animation_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        MenuConfig {
            edge_margin: DEFAULT_EDGE_MARGIN,
            hide_animation_ms: DEFAULT_HIDE_ANIMATION_MS,
            scroll_settle_ms: DEFAULT_SCROLL_SETTLE_MS,
        }
    }
}

// ============================================
// POPUP
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupConfig {
    #[serde(default = "default_popup_width")]
    pub width: f64,
    #[serde(default = "default_popup_height")]
    pub height: f64,
    /// Cap for content-driven growth
    #[serde(default = "default_popup_max_height")]
    pub max_height: f64,
    /// Added to the measured content height when growing
    #[serde(default = "default_content_padding")]
    pub content_padding: f64,
}

fn default_popup_width() -> f64 {
    DEFAULT_POPUP_WIDTH
}
fn default_popup_height() -> f64 {
    DEFAULT_POPUP_HEIGHT
}
fn default_popup_max_height() -> f64 {
    DEFAULT_POPUP_MAX_HEIGHT
}
fn default_content_padding() -> f64 {
    DEFAULT_CONTENT_PADDING
}

impl PopupConfig {
    /// Height for the given rendered content height, never above `max_height`.
    pub fn grown_height(&self, content_height: f64) -> f64 {
        (content_height + self.content_padding).min(self.max_height)
    }
}

impl Default for PopupConfig {
    fn default() -> Self {
        PopupConfig {
            width: DEFAULT_POPUP_WIDTH,
            height: DEFAULT_POPUP_HEIGHT,
            max_height: DEFAULT_POPUP_MAX_HEIGHT,
            content_padding: DEFAULT_CONTENT_PADDING,
        }
    }
}

// ============================================
// TRANSFORM
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Language code summaries are written in
    #[serde(default = "default_summary_language")]
    pub summary_language: String,
    #[serde(default)]
    pub default_tone: Tone,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_summary_language() -> String {
    DEFAULT_SUMMARY_LANGUAGE.to_string()
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            summary_language: DEFAULT_SUMMARY_LANGUAGE.to_string(),
            default_tone: Tone::default(),
        }
    }
}

// ============================================
// ROOT
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub popup: PopupConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    /// Show the tray icon when its asset is available
    #[serde(default = "default_tray")]
    pub tray: bool,
}

fn default_tray() -> bool {
    DEFAULT_TRAY
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hotkey: HotkeyConfig::default(),
            menu: MenuConfig::default(),
            popup: PopupConfig::default(),
            transform: TransformConfig::default(),
            tray: DEFAULT_TRAY,
        }
    }
}
