//! The global capture hotkey.
//!
//! One binding (platform modifier + shift + G by default) is registered on a
//! listener thread. Each press is forwarded to [`capture_channel`], which the
//! UI loop drains to start a capture. Failing to register is logged and the
//! app keeps running without the hotkey.

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use crate::config::{HotkeyConfig, DEFAULT_HOTKEY_KEY};
use crate::logging;

static CAPTURE_CHANNEL: OnceLock<(async_channel::Sender<()>, async_channel::Receiver<()>)> =
    OnceLock::new();

/// Hotkey presses, one `()` per press.
pub fn capture_channel() -> &'static (async_channel::Sender<()>, async_channel::Receiver<()>) {
    CAPTURE_CHANNEL.get_or_init(|| async_channel::bounded(10))
}

static PRESS_COUNT: AtomicU64 = AtomicU64::new(0);

fn parse_code(key: &str) -> Option<Code> {
    let code = match key {
        "KeyA" => Code::KeyA,
        "KeyB" => Code::KeyB,
        "KeyC" => Code::KeyC,
        "KeyD" => Code::KeyD,
        "KeyE" => Code::KeyE,
        "KeyF" => Code::KeyF,
        "KeyG" => Code::KeyG,
        "KeyH" => Code::KeyH,
        "KeyI" => Code::KeyI,
        "KeyJ" => Code::KeyJ,
        "KeyK" => Code::KeyK,
        "KeyL" => Code::KeyL,
        "KeyM" => Code::KeyM,
        "KeyN" => Code::KeyN,
        "KeyO" => Code::KeyO,
        "KeyP" => Code::KeyP,
        "KeyQ" => Code::KeyQ,
        "KeyR" => Code::KeyR,
        "KeyS" => Code::KeyS,
        "KeyT" => Code::KeyT,
        "KeyU" => Code::KeyU,
        "KeyV" => Code::KeyV,
        "KeyW" => Code::KeyW,
        "KeyX" => Code::KeyX,
        "KeyY" => Code::KeyY,
        "KeyZ" => Code::KeyZ,
        "Digit0" => Code::Digit0,
        "Digit1" => Code::Digit1,
        "Digit2" => Code::Digit2,
        "Digit3" => Code::Digit3,
        "Digit4" => Code::Digit4,
        "Digit5" => Code::Digit5,
        "Digit6" => Code::Digit6,
        "Digit7" => Code::Digit7,
        "Digit8" => Code::Digit8,
        "Digit9" => Code::Digit9,
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        "Space" => Code::Space,
        "Enter" => Code::Enter,
        "Semicolon" => Code::Semicolon,
        _ => return None,
    };
    Some(code)
}

fn parse_modifiers(names: &[String]) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    for name in names {
        match name.to_ascii_lowercase().as_str() {
            "meta" | "cmd" | "super" => modifiers |= Modifiers::META,
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" | "opt" | "option" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            other => logging::log("HOTKEY", &format!("Ignoring unknown modifier '{}'", other)),
        }
    }
    modifiers
}

/// Build the hotkey for `config`. An unknown key falls back to the default key.
pub fn hotkey_from_config(config: &HotkeyConfig) -> HotKey {
    let code = parse_code(&config.key).unwrap_or_else(|| {
        logging::log(
            "HOTKEY",
            &format!(
                "Unknown key code '{}'. Valid keys: KeyA-KeyZ, Digit0-Digit9, F1-F12, Space, Enter, Semicolon. Falling back to {}",
                config.key, DEFAULT_HOTKEY_KEY
            ),
        );
        Code::KeyG
    });
    HotKey::new(Some(parse_modifiers(&config.modifiers)), code)
}

/// "meta+shift+KeyG"
pub fn hotkey_display(config: &HotkeyConfig) -> String {
    config
        .modifiers
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(config.key.as_str()))
        .collect::<Vec<_>>()
        .join("+")
}

fn format_hotkey_error(e: &HotkeyError, display: &str) -> String {
    match e {
        HotkeyError::AlreadyRegistered(hk) => format!(
            "Hotkey '{}' is already registered by another application (ID: {}). \
             Set a different one under \"hotkey\" in the config file.",
            display,
            hk.id()
        ),
        HotkeyError::FailedToRegister(msg) => format!(
            "System rejected hotkey '{}': {}. This shortcut may be reserved by the OS.",
            display, msg
        ),
        HotkeyError::OsError(os_err) => {
            format!("OS error registering '{}': {}", display, os_err)
        }
        other => format!("Failed to register hotkey '{}': {}", display, other),
    }
}

/// Register the capture hotkey and forward presses to [`capture_channel`].
pub fn start_hotkey_listener(config: HotkeyConfig) {
    std::thread::spawn(move || {
        let manager = match GlobalHotKeyManager::new() {
            Ok(m) => m,
            Err(e) => {
                logging::log("HOTKEY", &format!("Failed to create hotkey manager: {}", e));
                return;
            }
        };

        let hotkey = hotkey_from_config(&config);
        let hotkey_id = hotkey.id();
        let display = hotkey_display(&config);

        if let Err(e) = manager.register(hotkey) {
            logging::log("HOTKEY", &format_hotkey_error(&e, &display));
            return;
        }
        logging::log(
            "HOTKEY",
            &format!("Registered capture hotkey {} (id: {})", display, hotkey_id),
        );

        let receiver = GlobalHotKeyEvent::receiver();
        // `manager` must outlive the loop or the binding is dropped
        while let Ok(event) = receiver.recv() {
            if event.state != HotKeyState::Pressed || event.id != hotkey_id {
                continue;
            }
            let count = PRESS_COUNT.fetch_add(1, Ordering::SeqCst) + 1;
            if capture_channel().0.send_blocking(()).is_err() {
                logging::log("HOTKEY", "Capture channel closed, stopping listener");
                break;
            }
            tracing::debug!(count, "Capture hotkey pressed");
        }
        drop(manager);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(modifiers: &[&str], key: &str) -> HotkeyConfig {
        HotkeyConfig {
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            key: key.to_string(),
        }
    }

    #[test]
    fn builds_the_configured_binding() {
        let hotkey = hotkey_from_config(&config(&["ctrl", "shift"], "KeyG"));
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyG)
        );
    }

    #[test]
    fn modifier_aliases_are_accepted() {
        let hotkey = hotkey_from_config(&config(&["cmd", "opt"], "Digit1"));
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::META | Modifiers::ALT), Code::Digit1)
        );
    }

    #[test]
    fn unknown_key_falls_back_to_default() {
        let hotkey = hotkey_from_config(&config(&["shift"], "Banana"));
        assert_eq!(hotkey, HotKey::new(Some(Modifiers::SHIFT), Code::KeyG));
    }

    #[test]
    fn display_joins_modifiers_and_key() {
        assert_eq!(
            hotkey_display(&config(&["meta", "shift"], "KeyG")),
            "meta+shift+KeyG"
        );
        assert_eq!(hotkey_display(&config(&[], "F5")), "F5");
    }

    #[test]
    fn capture_channel_delivers_presses() {
        while capture_channel().1.try_recv().is_ok() {}
        capture_channel().0.send_blocking(()).unwrap();
        assert!(capture_channel().1.try_recv().is_ok());
        assert!(capture_channel().1.try_recv().is_err());
    }

    #[cfg(feature = "system-tests")]
    #[test]
    fn manager_can_be_created() {
        assert!(GlobalHotKeyManager::new().is_ok());
    }
}
