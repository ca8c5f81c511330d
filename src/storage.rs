use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StorageError;
use crate::models::Theme;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "sip_token";
/// Key holding the UI theme preference (`light` | `dark`).
pub const THEME_KEY: &str = "theme";

// 1. StorageService Contract
/// StorageService
///
/// The durable client-side key/value store. It survives process restarts so that a new
/// session can re-enter the `Checking` state from a previously persisted token.
///
/// Two implementations exist: `FileStorage` (a JSON file in the state directory, used by
/// the CLI) and `MemoryStorage` (in-process, used by tests and embedders).
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// StorageState
///
/// The shared handle to the durable store, injected into the context, the request
/// client and the session store.
pub type StorageState = Arc<dyn StorageService>;

// 2. The File Implementation
/// FileStorage
///
/// Persists all keys in a single `storage.json` under the configured state directory.
/// Every write rewrites the whole file; the store only ever holds two small values.
#[derive(Clone)]
pub struct FileStorage {
    path: PathBuf,
    // Serialises read-modify-write cycles from concurrent tasks in this process.
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl FileStorage {
    pub const FILE_NAME: &'static str = "storage.json";

    /// new
    ///
    /// Points the store at `<state_dir>/storage.json`. The directory is created lazily on
    /// the first write.
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(Self::FILE_NAME),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(items)?;
        tokio::fs::write(&self.path, raw).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageService for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all().await?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_all().await?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut items = self.read_all().await?;
        if items.remove(key).is_some() {
            self.write_all(&items).await?;
        }
        Ok(())
    }
}

// 3. The In-Memory Implementation (For Tests)
/// MemoryStorage
///
/// A process-local store. `new_failing` builds one whose every operation fails, for
/// exercising the storage error paths.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<Mutex<BTreeMap<String, String>>>,
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            items: Arc::default(),
            should_fail: true,
        }
    }

    /// Pre-populates the store, e.g. with a token left over from a previous run.
    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items.lock().insert(key.to_string(), value.to_string());
        self
    }

    /// Synchronous peek used by assertions.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.items.lock().clone()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Io("Mock Storage Error: Simulation requested".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageService for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.items.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.items.lock().remove(key);
        Ok(())
    }
}

// --- Theme Preference ---

/// load_theme
///
/// Reads the stored theme. Missing, unreadable or unrecognised values fall back to
/// `Theme::Light`.
pub async fn load_theme(storage: &dyn StorageService) -> Theme {
    match storage.get_item(THEME_KEY).await {
        Ok(Some(value)) => Theme::parse(&value).unwrap_or_default(),
        Ok(None) => Theme::default(),
        Err(e) => {
            tracing::warn!("Could not read theme preference: {}", e);
            Theme::default()
        }
    }
}

/// toggle_theme
///
/// Flips the stored theme and persists the new value, returning it.
pub async fn toggle_theme(storage: &dyn StorageService) -> Result<Theme, StorageError> {
    let next = load_theme(storage).await.toggled();
    storage.set_item(THEME_KEY, next.as_str()).await?;
    Ok(next)
}
