//! Credential storage for transform API keys.
//!
//! Keys are a flat `name -> secret` map (`"openrouter" -> "sk-..."`).
//! `save_keys` merges into what is already stored; it never drops a key that
//! the incoming map does not mention.
//!
//! # Environment fallback
//!
//! When the store has no entry for a provider, `GRAMMARY_<NAME>_API_KEY` is
//! consulted (`GRAMMARY_OPENROUTER_API_KEY` for `"openrouter"`).

use std::collections::BTreeMap;
use std::env;

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::logging;

pub type KeyMap = BTreeMap<String, String>;

/// Key name used for the text-generation backend.
pub const OPENROUTER: &str = "openrouter";

/// Service name for keyring storage
const KEYRING_SERVICE: &str = "app.grammary.keys";
/// Keyring entry holding the comma-separated list of stored key names
const KEYRING_INDEX: &str = "__index";

pub trait KeyStore: Send + Sync {
    /// Merge `keys` into the store. Returns the acknowledgement sent back to
    /// the surface.
    fn save_keys(&self, keys: &KeyMap) -> Result<bool>;

    fn get_keys(&self) -> KeyMap;
}

/// Environment variable consulted for `name`.
pub fn env_var_name(name: &str) -> String {
    format!("GRAMMARY_{}_API_KEY", name.to_ascii_uppercase())
}

/// Stored key for `name`, then the environment. Empty values count as missing.
pub fn resolve_key(store: &dyn KeyStore, name: &str) -> Option<String> {
    store
        .get_keys()
        .remove(name)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            env::var(env_var_name(name))
                .ok()
                .filter(|v| !v.trim().is_empty())
        })
}

/// `name=value` from the command line. Names are lower-cased.
pub fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim().to_ascii_lowercase();
    if name.is_empty() {
        return Err("key name is empty".to_string());
    }
    Ok((name, value.trim().to_string()))
}

/// Display form of a secret: the last four characters, everything else
/// starred. Short secrets are fully hidden.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

fn merge(existing: &mut KeyMap, incoming: &KeyMap) {
    for (name, value) in incoming {
        existing.insert(name.clone(), value.clone());
    }
}

/// Process-local store. Used by tests and as a fallback when the system
/// keyring is unavailable.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: Mutex<KeyMap>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: KeyMap) -> Self {
        Self {
            keys: Mutex::new(keys),
        }
    }
}

impl KeyStore for MemoryKeyStore {
    fn save_keys(&self, keys: &KeyMap) -> Result<bool> {
        merge(&mut self.keys.lock(), keys);
        Ok(true)
    }

    fn get_keys(&self) -> KeyMap {
        self.keys.lock().clone()
    }
}

/// System keyring (Keychain on macOS, Secret Service on Linux).
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key)
            .with_context(|| format!("Failed to create keyring entry for {}", key))
    }

    fn get_secret(&self, key: &str) -> Option<String> {
        let entry = match self.entry(key) {
            Ok(entry) => entry,
            Err(e) => {
                logging::log("KEYRING", &format!("{:#}", e));
                return None;
            }
        };
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                logging::log(
                    "KEYRING",
                    &format!("Error retrieving secret for key {}: {}", key, e),
                );
                None
            }
        }
    }

    fn set_secret(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .with_context(|| format!("Failed to store secret for {}", key))
    }

    fn stored_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .get_secret(KEYRING_INDEX)
            .map(|index| {
                index
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if !names.iter().any(|n| n == OPENROUTER) {
            names.push(OPENROUTER.to_string());
        }
        names
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyStore for KeyringStore {
    fn save_keys(&self, keys: &KeyMap) -> Result<bool> {
        let mut names = self.stored_names();
        for (name, value) in keys {
            self.set_secret(name, value)?;
            logging::log(
                "KEYRING",
                &format!("Stored key {} ({} chars)", name, value.len()),
            );
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        self.set_secret(KEYRING_INDEX, &names.join(","))?;
        Ok(true)
    }

    fn get_keys(&self) -> KeyMap {
        self.stored_names()
            .into_iter()
            .filter_map(|name| self.get_secret(&name).map(|value| (name, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> KeyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn save_merges_and_acknowledges() {
        let store = MemoryKeyStore::with_keys(map(&[("openrouter", "old"), ("other", "keep")]));
        assert!(store.save_keys(&map(&[("openrouter", "new")])).unwrap());
        assert_eq!(
            store.get_keys(),
            map(&[("openrouter", "new"), ("other", "keep")])
        );
    }

    #[test]
    fn assignments_split_on_the_first_equals() {
        assert_eq!(
            parse_assignment("OpenRouter=sk-a=b"),
            Ok(("openrouter".to_string(), "sk-a=b".to_string()))
        );
        assert!(parse_assignment("openrouter").is_err());
        assert!(parse_assignment(" =x").is_err());
    }

    #[test]
    fn masking_keeps_only_the_tail() {
        assert_eq!(mask("sk-or-v1-abcdef"), "***********cdef");
        assert_eq!(mask("short"), "*****");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn env_var_names_are_prefixed() {
        assert_eq!(env_var_name("openrouter"), "GRAMMARY_OPENROUTER_API_KEY");
    }

    #[test]
    fn resolve_prefers_the_store() {
        let store = MemoryKeyStore::with_keys(map(&[("stored-only", "sk-1")]));
        assert_eq!(resolve_key(&store, "stored-only").as_deref(), Some("sk-1"));
    }

    #[test]
    fn blank_stored_keys_count_as_missing() {
        let store = MemoryKeyStore::with_keys(map(&[("blank-provider", "   ")]));
        assert_eq!(resolve_key(&store, "blank-provider"), None);
    }

    #[test]
    fn resolve_falls_back_to_environment() {
        let name = "grammary-env-fallback-test";
        env::set_var(env_var_name(name), "sk-env");
        let store = MemoryKeyStore::new();
        assert_eq!(resolve_key(&store, name).as_deref(), Some("sk-env"));
        env::remove_var(env_var_name(name));
    }

    #[cfg(feature = "system-tests")]
    #[test]
    fn keyring_round_trip() {
        let store = KeyringStore::with_service("app.grammary.keys.test");
        store.save_keys(&map(&[("openrouter", "sk-test")])).unwrap();
        assert_eq!(
            store.get_keys().get("openrouter").map(String::as_str),
            Some("sk-test")
        );
    }
}
