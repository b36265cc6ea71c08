//! Configuration loading from the file system

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::DEFAULT_CONFIG_PATH;
use super::types::Config;

/// Load `~/.grammary/config.json`, or the file given on the command line.
pub fn load_config(path_override: Option<&Path>) -> Config {
    let path = match path_override {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref()),
        None => PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref()),
    };
    load_config_from(&path)
}

/// Returns `Config::default()` if the file is missing or does not parse.
#[instrument(name = "load_config", fields(path = %path.display()))]
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        info!("Config file not found, using defaults");
        return Config::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(error = %e, "Failed to read config file, using defaults");
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&contents) {
        Ok(config) => {
            info!("Loaded config");
            config
        }
        Err(e) => {
            let error_hint = if e.to_string().contains("missing field `modifiers`")
                || e.to_string().contains("missing field `key`")
            {
                "\n\nHint: 'hotkey' requires 'modifiers' (array) and 'key' (string). Example:\n\
                \"hotkey\": {\n\
                  \"modifiers\": [\"ctrl\", \"shift\"],  // \"meta\", \"ctrl\", \"alt\", \"shift\"\n\
                  \"key\": \"KeyG\"\n\
                }"
            } else if e.to_string().contains("unknown variant") {
                "\n\nHint: 'transform.defaultTone' must be one of formal, friendly, academic, creative"
            } else {
                ""
            };

            warn!(
                error = %e,
                hint = %error_hint,
                "Failed to parse config JSON, using defaults"
            );
            Config::default()
        }
    }
}
