// src/core/cache.rs

//! Time-boxed storage for finished subdomain reports.
//!
//! The cache is an injected [`ResultCache`] rather than process-wide state. The production
//! backend keeps one JSON object on disk mapping `"subdomains_<domain>"` to
//! `{timestamp, data}` and always reads and writes the whole object. There is no locking:
//! two writers racing on the file resolve as last-write-wins. Failures are logged and
//! treated as a miss, never surfaced to the request.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::core::models::CacheEntry;

/// Freshness window used when nothing else is configured.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Key under which a domain's report is stored.
pub fn cache_key(domain: &str) -> String {
    format!("subdomains_{}", domain)
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Keyed store for cache entries.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<CacheEntry>;
    async fn put(&self, key: &str, entry: CacheEntry);
}

/// [`ResultCache`] persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file. A missing file is an empty map.
    async fn load(&self) -> Result<Map<String, Value>, CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Writes the whole map back, creating the parent directory if needed.
    async fn save(&self, map: &Map<String, Value>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }

    async fn load_or_empty(&self) -> Map<String, Value> {
        self.load().await.unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Failed to load cache, treating it as empty.");
            Map::new()
        })
    }
}

#[async_trait]
impl ResultCache for JsonFileCache {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut map = self.load_or_empty().await;
        let raw = map.remove(key)?;
        match serde_json::from_value(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable cache entry.");
                None
            }
        }
    }

    async fn put(&self, key: &str, entry: CacheEntry) {
        let value = match serde_json::to_value(&entry) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache entry.");
                return;
            }
        };

        let mut map = self.load_or_empty().await;
        map.insert(key.to_string(), value);
        match self.save(&map).await {
            Ok(()) => debug!(key, path = %self.path.display(), "Cache entry written."),
            Err(e) => warn!(key, error = %e, "Failed to save cache."),
        }
    }
}

/// In-process [`ResultCache`], used by tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(key).cloned()
    }

    async fn put(&self, key: &str, entry: CacheEntry) {
        self.entries.write().await.insert(key.to_string(), entry);
    }
}
