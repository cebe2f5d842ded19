use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rotator_model::DashboardDescriptor;
use tracing::debug;
use url::Url;

use super::{ConfigSource, payload::parse_payload};
use crate::error::{ConfigError, Result, RotatorError};

/// Reads the dashboard list from a local file.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_url(url: &Url) -> Result<Self> {
        url.to_file_path()
            .map(Self::new)
            .map_err(|_| RotatorError::UnsupportedScheme(url.to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    async fn refresh(
        &self,
    ) -> std::result::Result<Vec<DashboardDescriptor>, ConfigError> {
        let body =
            tokio::fs::read_to_string(&self.path).await.map_err(|err| {
                ConfigError::Unreachable(format!(
                    "{}: {err}",
                    self.path.display()
                ))
            })?;
        debug!(
            path = %self.path.display(),
            bytes = body.len(),
            "configuration read"
        );

        Ok(parse_payload(&body)?.descriptors)
    }
}
