//! Fetching and validating the dashboard list.
//!
//! A [`ConfigSource`] knows nothing about rotation or rendering: it returns a
//! freshly validated list and leaves adopting it to the controller. A failed
//! refresh never touches the list the controller is already rotating through.

mod file;
mod http;
pub mod payload;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rotator_model::DashboardDescriptor;
use url::Url;

use crate::error::{ConfigError, Result, RotatorError};

pub use file::FileConfigSource;
pub use http::HttpConfigSource;
pub use payload::{ParsedPayload, SkippedEntry, parse_payload};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Fetches the remote configuration and returns the validated dashboards
    /// in rotation order.
    async fn refresh(
        &self,
    ) -> std::result::Result<Vec<DashboardDescriptor>, ConfigError>;
}

/// Picks the transport matching the scheme of `url`.
pub fn config_source_for(
    url: &Url,
    request_timeout: Duration,
) -> Result<Arc<dyn ConfigSource>> {
    match url.scheme() {
        "http" | "https" => Ok(Arc::new(HttpConfigSource::new(
            url.clone(),
            request_timeout,
        )?)),
        "file" => Ok(Arc::new(FileConfigSource::from_url(url)?)),
        other => Err(RotatorError::UnsupportedScheme(other.to_owned())),
    }
}
