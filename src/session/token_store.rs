//! Persisted login: the bearer token and user record under fixed keys.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::domain::aggregates::User;
use crate::{Result, StorefrontError};

pub const TOKEN_KEY: &str = "shopkartToken";
pub const USER_KEY: &str = "shopkartUser";

/// Key/value client storage.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads a persisted login; a half-written or unreadable login counts as none.
pub fn load_login(store: &dyn TokenStore) -> Result<Option<(User, String)>> {
    let (Some(user), Some(token)) = (store.get(USER_KEY)?, store.get(TOKEN_KEY)?) else {
        return Ok(None);
    };
    match serde_json::from_str::<User>(&user) {
        Ok(user) => Ok(Some((user, token))),
        Err(e) => {
            warn!("Discarding unreadable stored user: {}", e);
            Ok(None)
        }
    }
}

pub fn save_login(store: &dyn TokenStore, user: &User, token: &str) -> Result<()> {
    store.set(USER_KEY, &serde_json::to_string(user)?)?;
    store.set(TOKEN_KEY, token)
}

pub fn save_user(store: &dyn TokenStore, user: &User) -> Result<()> {
    store.set(USER_KEY, &serde_json::to_string(user)?)
}

pub fn clear_login(store: &dyn TokenStore) -> Result<()> {
    store.remove(USER_KEY)?;
    store.remove(TOKEN_KEY)
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self { Self::default() }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().map_err(poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().map_err(poisoned)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().map_err(poisoned)?.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into(), lock: Mutex::new(()) } }

    pub fn path(&self) -> &Path { &self.path }

    /// A file that does not parse is treated as empty; the next write replaces it.
    fn read(&self) -> Result<HashMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => match serde_json::from_str(&text) {
                Ok(values) => Ok(values),
                Err(e) => {
                    warn!(path = %self.path.display(), "Ignoring unreadable session file: {}", e);
                    Ok(HashMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StorefrontError::Storage(format!("{}: {e}", self.path.display()))),
        }
    }

    fn write(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| StorefrontError::Storage(format!("{}: {e}", dir.display())))?;
        }
        let text = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, text).map_err(|e| StorefrontError::Storage(format!("{}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), "Session file written");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut values = self.read()?;
        f(&mut values);
        self.write(&values)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|v| { v.insert(key.to_string(), value.to_string()); })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|v| { v.remove(key); })
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StorefrontError {
    StorefrontError::Storage("token store lock poisoned".to_string())
}
