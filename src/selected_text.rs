//! System-wide selected text and the clipboard.
//!
//! - [`SystemCapture`] reads the focused application's selection through the
//!   `get-selected-text` crate (accessibility API first, simulated copy as a
//!   fallback).
//! - [`copy_to_clipboard`] backs the popup's Copy control.
//!
//! ## Permissions
//!
//! On macOS, capture requires Accessibility permission in System Settings >
//! Privacy & Security > Accessibility.

use anyhow::{bail, Context, Result};
use arboard::Clipboard;
use get_selected_text::get_selected_text as get_selected_text_impl;
use tracing::{debug, info, instrument, warn};

/// Source of the OS-wide selection. Mocked in tests.
pub trait SelectionCapture: Send + Sync {
    /// The currently selected text, or an empty string when nothing is
    /// selected.
    fn capture(&self) -> Result<String>;
}

// ============================================================================
// Permission Functions
// ============================================================================

#[cfg(target_os = "macos")]
#[instrument]
pub fn has_accessibility_permission() -> bool {
    let result = macos_accessibility_client::accessibility::application_is_trusted();
    debug!(granted = result, "Checked accessibility permission");
    result
}

#[cfg(not(target_os = "macos"))]
pub fn has_accessibility_permission() -> bool {
    true
}

/// Show the system permission prompt. Returns whether permission is granted.
#[cfg(target_os = "macos")]
#[instrument]
pub fn request_accessibility_permission() -> bool {
    info!("Requesting accessibility permission");
    let result = macos_accessibility_client::accessibility::application_is_trusted_with_prompt();
    if !result {
        warn!("Accessibility permission denied or pending");
    }
    result
}

#[cfg(not(target_os = "macos"))]
pub fn request_accessibility_permission() -> bool {
    true
}

// ============================================================================
// Capture
// ============================================================================

/// Captures from the focused application.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCapture;

impl SelectionCapture for SystemCapture {
    #[instrument(skip_all)]
    fn capture(&self) -> Result<String> {
        if !has_accessibility_permission() {
            bail!("Accessibility permission required. Enable in System Settings > Privacy & Security > Accessibility");
        }

        match get_selected_text_impl() {
            Ok(text) => {
                if text.is_empty() {
                    debug!("No text selected (empty result)");
                } else {
                    info!(text_len = text.len(), "Got selected text");
                }
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "Failed to get selected text");
                bail!("Failed to get selected text: {}", e)
            }
        }
    }
}

// ============================================================================
// Clipboard
// ============================================================================

#[instrument(skip(text), fields(text_len = text.len()))]
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
    clipboard
        .set_text(text)
        .context("Failed to set clipboard text")?;
    debug!("Copied result to clipboard");
    Ok(())
}
