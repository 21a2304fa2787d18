use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::SearchHistoryItem;
use crate::utils::error::ApiError;

/// Most-recent-first analysis history persisted as a JSON file.
pub struct HistoryStore {
    path: PathBuf,
    max_entries: usize,
    entries: RwLock<Vec<SearchHistoryItem>>,
}

impl HistoryStore {
    /// Load the history file. A missing file starts an empty history and a
    /// corrupt one is logged and discarded.
    pub async fn load(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        let path = path.into();
        let mut entries = read_entries(&path).await;
        entries.truncate(max_entries);
        debug!("Loaded {} history entries from {:?}", entries.len(), path);

        Self {
            path,
            max_entries,
            entries: RwLock::new(entries),
        }
    }

    /// Add an entry at the front. The in-memory list only changes once the
    /// file has been written.
    pub async fn record(&self, item: SearchHistoryItem) -> Result<(), ApiError> {
        let mut entries = self.entries.write().await;
        let mut updated = Vec::with_capacity(self.max_entries);
        updated.push(item);
        updated.extend(entries.iter().take(self.max_entries.saturating_sub(1)).cloned());

        self.persist(&updated).await?;
        *entries = updated;
        Ok(())
    }

    pub async fn list(&self) -> Vec<SearchHistoryItem> {
        self.entries.read().await.clone()
    }

    pub async fn get(&self, id: &Uuid) -> Result<SearchHistoryItem, ApiError> {
        self.entries
            .read()
            .await
            .iter()
            .find(|item| &item.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("History entry {} not found", id)))
    }

    pub async fn clear(&self) -> Result<(), ApiError> {
        let mut entries = self.entries.write().await;
        self.persist(&[]).await?;
        entries.clear();
        Ok(())
    }

    async fn persist(&self, entries: &[SearchHistoryItem]) -> Result<(), ApiError> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| ApiError::InternalError(format!("Failed to serialize history: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ApiError::InternalError(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to write history: {}", e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to write history: {}", e)))
    }
}

async fn read_entries(path: &Path) -> Vec<SearchHistoryItem> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!("Failed to read history {:?}: {}", path, e);
            return Vec::new();
        }
    };

    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        warn!("Ignoring corrupt history {:?}: {}", path, e);
        Vec::new()
    })
}
