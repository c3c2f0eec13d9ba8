//! Persistent client-side storage for the session token and preferences

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

/// Storage for the session token and the preferred currency
///
/// The token lives only on the client; the server keeps no session table,
/// so clearing the store is all logout amounts to.
pub trait TokenStore: Send + Sync {
    /// The stored session token, if any
    fn token(&self) -> Option<String>;

    /// Persist a session token
    fn save_token(&self, token: &str) -> Result<()>;

    /// Drop the stored session token
    fn clear_token(&self) -> Result<()>;

    /// The stored currency preference, if any
    fn preferred_currency(&self) -> Option<String>;

    /// Persist the currency preference
    fn save_preferred_currency(&self, code: &str) -> Result<()>;
}

/// In-memory store; state is lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<StoreContents>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.inner.lock().expect("store lock poisoned").token.clone()
    }

    fn save_token(&self, token: &str) -> Result<()> {
        self.inner.lock().expect("store lock poisoned").token = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        self.inner.lock().expect("store lock poisoned").token = None;
        Ok(())
    }

    fn preferred_currency(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .preferred_currency
            .clone()
    }

    fn save_preferred_currency(&self, code: &str) -> Result<()> {
        self.inner
            .lock()
            .expect("store lock poisoned")
            .preferred_currency = Some(code.to_string());
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreContents {
    token: Option<String>,
    #[serde(rename = "preferredCurrency")]
    preferred_currency: Option<String>,
}

/// JSON-file-backed store, the durable analogue of browser local storage
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Create a store backed by the given file; the file is created on
    /// first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> StoreContents {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn write(&self, contents: &StoreContents) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(contents)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        self.read().token
    }

    fn save_token(&self, token: &str) -> Result<()> {
        let mut contents = self.read();
        contents.token = Some(token.to_string());
        self.write(&contents)
    }

    fn clear_token(&self) -> Result<()> {
        let mut contents = self.read();
        contents.token = None;
        self.write(&contents)
    }

    fn preferred_currency(&self) -> Option<String> {
        self.read().preferred_currency
    }

    fn save_preferred_currency(&self, code: &str) -> Result<()> {
        let mut contents = self.read();
        contents.preferred_currency = Some(code.to_string());
        self.write(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.token(), None);

        store.save_token("abc").unwrap();
        assert_eq!(store.token(), Some("abc".to_string()));

        store.clear_token().unwrap();
        assert_eq!(store.token(), None);

        store.save_preferred_currency("USD").unwrap();
        assert_eq!(store.preferred_currency(), Some("USD".to_string()));
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "rentora-store-test-{}.json",
            uuid::Uuid::new_v4()
        ));
        let store = FileTokenStore::new(&path);

        assert_eq!(store.token(), None);
        store.save_token("tok-1").unwrap();
        store.save_preferred_currency("GBP").unwrap();

        // A fresh store over the same file sees the persisted values
        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.token(), Some("tok-1".to_string()));
        assert_eq!(reopened.preferred_currency(), Some("GBP".to_string()));

        reopened.clear_token().unwrap();
        assert_eq!(reopened.token(), None);
        // Clearing the token leaves the currency preference alone
        assert_eq!(reopened.preferred_currency(), Some("GBP".to_string()));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_store_survives_corrupt_file() {
        let path = std::env::temp_dir().join(format!(
            "rentora-store-corrupt-{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.token(), None);
        store.save_token("fresh").unwrap();
        assert_eq!(store.token(), Some("fresh".to_string()));

        std::fs::remove_file(&path).ok();
    }
}
