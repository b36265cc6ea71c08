//! Menu bar icon with "Open Grammary" and "Quit".
//!
//! The icon is read from `assets/icon.png`. When no icon can be found the
//! tray is skipped and the app keeps running on the hotkey alone.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tray_icon::{
    menu::{Menu, MenuEvent, MenuEventReceiver, MenuItem, PredefinedMenuItem},
    Icon, TrayIcon, TrayIconBuilder,
};

use crate::error::{GrammaryError, ResultExt};

pub const ICON_RELATIVE_PATH: &str = "assets/icon.png";
const TOOLTIP: &str = "Grammary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayMenuAction {
    Open,
    Quit,
}

/// Places an icon is looked for, in order: next to the executable, one level
/// up from it (bundle layouts), then the working directory.
pub fn icon_search_paths(exe_dir: Option<&Path>, cwd: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = exe_dir {
        paths.push(dir.join(ICON_RELATIVE_PATH));
        if let Some(parent) = dir.parent() {
            paths.push(parent.join(ICON_RELATIVE_PATH));
        }
    }
    if let Some(dir) = cwd {
        paths.push(dir.join(ICON_RELATIVE_PATH));
    }
    paths
}

/// First existing candidate, or a `Resource` error naming the asset.
pub fn find_icon_in(candidates: &[PathBuf]) -> Result<PathBuf, GrammaryError> {
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .ok_or_else(|| GrammaryError::Resource {
            path: ICON_RELATIVE_PATH.to_string(),
            reason: format!("not found in {} location(s)", candidates.len()),
        })
}

pub fn find_icon() -> Result<PathBuf, GrammaryError> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd = std::env::current_dir().ok();
    let found = find_icon_in(&icon_search_paths(exe_dir.as_deref(), cwd.as_deref()));
    if let Ok(path) = &found {
        tracing::debug!(path = %path.display(), "Found tray icon");
    }
    found
}

fn load_icon(path: &Path) -> Result<Icon> {
    let image = image::open(path)
        .with_context(|| format!("Failed to decode {}", path.display()))?
        .into_rgba8();
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height).context("Failed to create tray icon")
}

pub struct TrayManager {
    #[allow(dead_code)]
    tray_icon: TrayIcon,
    open_id: String,
    quit_id: String,
}

impl TrayManager {
    /// Builds the tray from the icon at `icon_path`.
    ///
    /// # Errors
    ///
    /// Fails when the icon cannot be decoded or the platform refuses the
    /// tray (no status area on some Linux desktops).
    pub fn new(icon_path: &Path) -> Result<Self> {
        let icon = load_icon(icon_path)?;

        let menu = Menu::new();
        let open_item = MenuItem::new("Open Grammary", true, None);
        let quit_item = MenuItem::new("Quit", true, None);
        let open_id = open_item.id().0.clone();
        let quit_id = quit_item.id().0.clone();

        menu.append(&open_item).context("Failed to add Open item")?;
        menu.append(&PredefinedMenuItem::separator())
            .context("Failed to add separator")?;
        menu.append(&quit_item).context("Failed to add Quit item")?;

        let tray_icon = TrayIconBuilder::new()
            .with_icon(icon)
            .with_tooltip(TOOLTIP)
            .with_menu(Box::new(menu))
            .build()
            .context("Failed to create tray icon")?;

        tracing::info!(icon = %icon_path.display(), "Tray icon created");
        Ok(Self {
            tray_icon,
            open_id,
            quit_id,
        })
    }

    /// `find_icon` then `new`; `None` (with a warning) when either fails.
    pub fn try_create() -> Option<Self> {
        let path = match find_icon() {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "No tray icon, skipping tray");
                return None;
            }
        };
        Self::new(&path).warn_on_err()
    }

    pub fn menu_event_receiver(&self) -> &MenuEventReceiver {
        MenuEvent::receiver()
    }

    pub fn match_menu_event(&self, event: &MenuEvent) -> Option<TrayMenuAction> {
        match_action(&event.id.0, &self.open_id, &self.quit_id)
    }
}

fn match_action(id: &str, open_id: &str, quit_id: &str) -> Option<TrayMenuAction> {
    if id == open_id {
        Some(TrayMenuAction::Open)
    } else if id == quit_id {
        Some(TrayMenuAction::Quit)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_order_is_exe_then_parent_then_cwd() {
        let paths = icon_search_paths(
            Some(Path::new("/opt/grammary/bin")),
            Some(Path::new("/home/me")),
        );
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/opt/grammary/bin/assets/icon.png"),
                PathBuf::from("/opt/grammary/assets/icon.png"),
                PathBuf::from("/home/me/assets/icon.png"),
            ]
        );
    }

    #[test]
    fn missing_icon_is_a_resource_warning() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_icon_in(&icon_search_paths(None, Some(dir.path()))).unwrap_err();
        assert!(matches!(err, GrammaryError::Resource { .. }));
        assert_eq!(err.severity(), crate::error::ErrorSeverity::Warning);
        assert!(err.user_message().contains("assets/icon.png"));
    }

    #[test]
    fn first_existing_icon_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        for dir in [first.path(), second.path()] {
            std::fs::create_dir_all(dir.join("assets")).unwrap();
            std::fs::write(dir.join(ICON_RELATIVE_PATH), b"png").unwrap();
        }
        let candidates = icon_search_paths(None, Some(second.path()));
        let mut all = icon_search_paths(None, Some(first.path()));
        all.extend(candidates);
        assert_eq!(
            find_icon_in(&all).unwrap(),
            first.path().join(ICON_RELATIVE_PATH)
        );
    }

    #[test]
    fn unknown_menu_ids_are_ignored() {
        assert_eq!(match_action("1", "1", "2"), Some(TrayMenuAction::Open));
        assert_eq!(match_action("2", "1", "2"), Some(TrayMenuAction::Quit));
        assert_eq!(match_action("3", "1", "2"), None);
    }

    #[test]
    fn shipped_icon_decodes() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(ICON_RELATIVE_PATH);
        let icon = image::open(&path).unwrap();
        assert!(icon.width() > 0 && icon.height() > 0);
    }
}
