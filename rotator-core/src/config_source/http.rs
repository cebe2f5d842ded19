use std::time::Duration;

use async_trait::async_trait;
use rotator_model::DashboardDescriptor;
use tracing::debug;
use url::Url;

use super::{ConfigSource, payload::parse_payload};
use crate::error::{ConfigError, Result};

/// Fetches the dashboard list with an HTTP(S) GET.
#[derive(Debug, Clone)]
pub struct HttpConfigSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpConfigSource {
    pub fn new(url: Url, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("site-rotator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn refresh(
        &self,
    ) -> std::result::Result<Vec<DashboardDescriptor>, ConfigError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|err| unreachable(&self.url, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::Unreachable(format!(
                "{} returned HTTP {status}",
                self.url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| unreachable(&self.url, &err))?;
        debug!(url = %self.url, bytes = body.len(), "configuration fetched");

        Ok(parse_payload(&body)?.descriptors)
    }
}

fn unreachable(url: &Url, err: &reqwest::Error) -> ConfigError {
    if err.is_timeout() {
        ConfigError::Unreachable(format!("{url}: request timed out"))
    } else {
        ConfigError::Unreachable(format!("{url}: {err}"))
    }
}
