//! Durable storage for the token pair.
//!
//! The app persists exactly one value: the serialized `AuthTokens` under the
//! key `authTokens`. Absence means logged out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ApiError;
use crate::types::AuthTokens;

/// Key under which the token pair is stored.
pub const TOKENS_KEY: &str = "authTokens";

/// Abstraction over the durable key-value store holding the token pair.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Stored tokens, or `None` when logged out. Unreadable content counts
    /// as logged out.
    async fn load(&self) -> Option<AuthTokens>;

    async fn save(&self, tokens: &AuthTokens) -> Result<(), ApiError>;

    /// Remove the stored tokens. Removing nothing is not an error.
    async fn clear(&self) -> Result<(), ApiError>;
}

/// JSON key-value file, one entry per key.
///
/// Other keys in the file are left untouched; writes go through a temporary
/// file and a rename so a crash never leaves half a file behind.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<data dir>/triptalk/storage.json`, falling back to the working
    /// directory when the platform has no data dir.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("triptalk")
            .join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> BTreeMap<String, Value> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read token storage");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "token storage is corrupt, ignoring");
            BTreeMap::new()
        })
    }

    async fn write_map(&self, map: &BTreeMap<String, Value>) -> Result<(), ApiError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ApiError::Storage(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(map).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ApiError::Storage(e.to_string()))
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Option<AuthTokens> {
        let mut map = self.read_map().await;
        let value = map.remove(TOKENS_KEY)?;
        match serde_json::from_value(value) {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                warn!(error = %e, "stored tokens are malformed, treating as logged out");
                None
            }
        }
    }

    async fn save(&self, tokens: &AuthTokens) -> Result<(), ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await;
        let value =
            serde_json::to_value(tokens).map_err(|e| ApiError::Serialization(e.to_string()))?;
        map.insert(TOKENS_KEY.to_string(), value);
        self.write_map(&map).await
    }

    async fn clear(&self) -> Result<(), ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_map().await;
        if map.remove(TOKENS_KEY).is_none() {
            return Ok(());
        }
        self.write_map(&map).await
    }
}

/// In-process store for tests and sessions that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<AuthTokens>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: AuthTokens) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Option<AuthTokens> {
        self.tokens.lock().await.clone()
    }

    async fn save(&self, tokens: &AuthTokens) -> Result<(), ApiError> {
        *self.tokens.lock().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        *self.tokens.lock().await = None;
        Ok(())
    }
}

#[async_trait]
impl<S: TokenStore + ?Sized> TokenStore for std::sync::Arc<S> {
    async fn load(&self) -> Option<AuthTokens> {
        (**self).load().await
    }

    async fn save(&self, tokens: &AuthTokens) -> Result<(), ApiError> {
        (**self).save(tokens).await
    }

    async fn clear(&self) -> Result<(), ApiError> {
        (**self).clear().await
    }
}
