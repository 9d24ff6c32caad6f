//! Durable secret/key-value slots for session state.
//!
//! The sync client persists access/refresh tokens and the current user
//! snapshot through this trait so a session can be restored without a
//! network round trip. Implementations are injected, never global.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::errors::{Error, Result};

pub trait SecretStore: Send + Sync {
    fn set_secret(&self, key: &str, secret: &str) -> Result<()>;
    fn get_secret(&self, key: &str) -> Result<Option<String>>;
    fn delete_secret(&self, key: &str) -> Result<()>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    slots: Mutex<HashMap<String, String>>,
}

impl SecretStore for MemorySecretStore {
    fn set_secret(&self, key: &str, secret: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), secret.to_string());
        Ok(())
    }

    fn get_secret(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn delete_secret(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

impl MemorySecretStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|_| Error::Secret("secret store lock poisoned".to_string()))
    }
}

/// File-backed store: one JSON object per application data directory.
///
/// Not encrypted; suitable for the token cache and profile snapshot the
/// session layer keeps (same trust level as the SQLite file next to it).
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSecretStore {
    pub fn new(app_data_dir: &str) -> Self {
        Self {
            path: PathBuf::from(app_data_dir).join("session.json"),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Secret(format!("failed reading {}: {e}", self.path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Secret(format!("corrupt session file: {e}")))
    }

    fn write_all(&self, slots: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Secret(format!("failed creating session dir: {e}")))?;
        }
        let raw = serde_json::to_string_pretty(slots)
            .map_err(|e| Error::Secret(format!("failed serializing session: {e}")))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| Error::Secret(format!("failed writing {}: {e}", self.path.display())))
    }
}

impl SecretStore for FileSecretStore {
    fn set_secret(&self, key: &str, secret: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Secret("secret store lock poisoned".to_string()))?;
        let mut slots = self.read_all()?;
        slots.insert(key.to_string(), secret.to_string());
        self.write_all(&slots)
    }

    fn get_secret(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Secret("secret store lock poisoned".to_string()))?;
        Ok(self.read_all()?.get(key).cloned())
    }

    fn delete_secret(&self, key: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| Error::Secret("secret store lock poisoned".to_string()))?;
        let mut slots = self.read_all()?;
        if slots.remove(key).is_some() {
            self.write_all(&slots)?;
        }
        Ok(())
    }
}
