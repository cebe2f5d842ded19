//! Persistence of the rotation position across restarts.
//!
//! Only the id of the dashboard on screen is stored. The next process picks the
//! rotation back up at that dashboard if it is still in the list.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rotator_model::DashboardId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PositionStoreError;

#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Last saved dashboard id, if any.
    async fn load(&self) -> Result<Option<DashboardId>, PositionStoreError>;

    async fn save(&self, id: &DashboardId) -> Result<(), PositionStoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredPosition {
    dashboard: DashboardId,
    saved_at: DateTime<Utc>,
}

/// Stores the position as a small JSON document, replaced atomically on each
/// save.
#[derive(Debug, Clone)]
pub struct FilePositionStore {
    path: PathBuf,
}

impl FilePositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PositionStoreError {
        PositionStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "position.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PositionStore for FilePositionStore {
    async fn load(&self) -> Result<Option<DashboardId>, PositionStoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(err) => return Err(self.io_error(err)),
        };

        let stored: StoredPosition =
            serde_json::from_slice(&raw).map_err(|source| {
                PositionStoreError::Decode {
                    path: self.path.clone(),
                    source,
                }
            })?;
        debug!(
            dashboard = %stored.dashboard,
            saved_at = %stored.saved_at,
            "restored rotation position"
        );
        Ok(Some(stored.dashboard))
    }

    async fn save(&self, id: &DashboardId) -> Result<(), PositionStoreError> {
        let stored = StoredPosition {
            dashboard: id.clone(),
            saved_at: Utc::now(),
        };
        let encoded = serde_json::to_vec_pretty(&stored)
            .map_err(PositionStoreError::Encode)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, encoded)
            .await
            .map_err(|err| self.io_error(err))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|err| self.io_error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_means_no_position() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FilePositionStore::new(dir.path().join("position.json"));

        assert_eq!(store.load().await.expect("load"), None);
    }

    #[tokio::test]
    async fn save_then_load_returns_latest_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store =
            FilePositionStore::new(dir.path().join("state/position.json"));

        store.save(&DashboardId::from("ci")).await.expect("save ci");
        store.save(&DashboardId::from("ops")).await.expect("save ops");

        assert_eq!(
            store.load().await.expect("load"),
            Some(DashboardId::from("ops"))
        );
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("position.json");
        std::fs::write(&path, b"{not json").expect("write");

        let err = FilePositionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, PositionStoreError::Decode { .. }));
    }
}
