//! Persistent key-value storage for session-scoped data.
//!
//! A single JSON file in the data directory holds the access token and
//! the cached user, permission, and avatar entries under fixed keys.
//! Everything is cleared together on logout.

// Allow dead code: store API methods exercised by tests
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::warn;

/// Store file name in the data directory
const STORE_FILE: &str = "storage.json";

/// Access token, JSON-encoded string
pub const TOKEN_KEY: &str = "access_token";
/// Cached user profile
pub const USER_KEY: &str = "user";
/// Cached permission list
pub const PERMISSIONS_KEY: &str = "permissions";
/// Cached avatar file reference
pub const AVATAR_KEY: &str = "avatar";

#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl LocalStore {
    /// Open the store under the given data directory, reading any
    /// existing file. An unreadable or unparseable file is a
    /// data-integrity problem, not a crash: the store starts empty and
    /// the session comes up unauthenticated.
    pub fn open(data_dir: PathBuf) -> Self {
        let path = data_dir.join(STORE_FILE);
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!(error = %e, ?path, "Malformed store file, starting empty");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(|v| v.as_str()).map(str::to_string)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.persist()
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    /// Remove every key. Called on logout so no session-scoped value
    /// outlives the token.
    pub fn clear(&mut self) -> Result<()> {
        self.values.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove store file {:?}", self.path))?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write store file {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicU64, Ordering};

    static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

    /// Fresh scratch directory per test so store files never collide.
    pub(crate) fn scratch_dir(label: &str) -> PathBuf {
        let n = DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "canteen-tui-test-{}-{}-{}",
            label,
            std::process::id(),
            n
        ));
        std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
        dir
    }

    fn store_path(dir: &Path) -> PathBuf {
        dir.join(STORE_FILE)
    }

    #[test]
    fn test_set_get_roundtrip_persists() {
        let dir = scratch_dir("store-roundtrip");
        let mut store = LocalStore::open(dir.clone());
        store
            .set(TOKEN_KEY, Value::String("abc123".to_string()))
            .expect("Failed to set token");

        assert_eq!(store.get_string(TOKEN_KEY).as_deref(), Some("abc123"));
        assert!(store_path(&dir).exists());

        // A second open sees the persisted value
        let reopened = LocalStore::open(dir);
        assert_eq!(reopened.get_string(TOKEN_KEY).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_clear_removes_all_keys_and_file() {
        let dir = scratch_dir("store-clear");
        let mut store = LocalStore::open(dir.clone());
        store.set(TOKEN_KEY, Value::String("t".into())).unwrap();
        store.set(USER_KEY, serde_json::json!({"id": 1})).unwrap();
        store.set(PERMISSIONS_KEY, serde_json::json!(["a"])).unwrap();

        store.clear().expect("Failed to clear store");
        assert!(!store.contains(TOKEN_KEY));
        assert!(!store.contains(USER_KEY));
        assert!(!store.contains(PERMISSIONS_KEY));
        assert!(!store_path(&dir).exists());
    }

    #[test]
    fn test_malformed_file_falls_back_to_empty() {
        let dir = scratch_dir("store-malformed");
        std::fs::write(store_path(&dir), "{not json").unwrap();

        let store = LocalStore::open(dir);
        assert!(!store.contains(TOKEN_KEY));
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let dir = scratch_dir("store-remove");
        let mut store = LocalStore::open(dir);
        store.remove("nope").expect("Remove of missing key failed");
    }
}
