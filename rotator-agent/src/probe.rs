//! Headless render surface.
//!
//! Fetches each dashboard with a plain GET to prove it is reachable and
//! reports the page geometry configured for the deployment. Scroll offsets are
//! only recorded; there is nothing to paint.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rotator_core::{NavigationError, PageMetrics, RenderSurface};
use tracing::{debug, trace};
use url::Url;

#[derive(Debug)]
pub struct HttpProbeSurface {
    client: reqwest::Client,
    metrics: PageMetrics,
    offset: Mutex<f64>,
}

impl HttpProbeSurface {
    pub fn new(
        metrics: PageMetrics,
        load_timeout: Duration,
    ) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(load_timeout)
            .user_agent(concat!("site-rotator/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            metrics,
            offset: Mutex::new(0.0),
        })
    }

    /// Offset of the most recent scroll on the current page.
    #[cfg(test)]
    pub fn offset(&self) -> f64 {
        *self.offset.lock()
    }
}

#[async_trait]
impl RenderSurface for HttpProbeSurface {
    async fn load(&self, url: &Url) -> Result<PageMetrics, NavigationError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(NavigationError::ContentError(format!(
                "{url} returned HTTP {status}"
            )));
        }

        // The body counts toward the load, as it would in a browser.
        let body = response.bytes().await.map_err(classify)?;
        debug!(%url, bytes = body.len(), "dashboard fetched");

        *self.offset.lock() = 0.0;
        Ok(self.metrics)
    }

    fn scroll_to(&self, offset: f64) {
        *self.offset.lock() = offset;
        trace!(offset, "scroll");
    }
}

fn classify(err: reqwest::Error) -> NavigationError {
    if err.is_timeout() {
        NavigationError::Timeout
    } else if err.is_body() || err.is_decode() {
        NavigationError::ContentError(err.to_string())
    } else {
        NavigationError::NetworkFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tokio::net::TcpListener;

    use super::*;

    async fn serve() -> SocketAddr {
        let router = Router::new()
            .route("/ok", get(|| async { "<html>dashboard</html>" }))
            .route(
                "/down",
                get(|| async {
                    (StatusCode::SERVICE_UNAVAILABLE, "maintenance")
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        addr
    }

    fn url(addr: SocketAddr, path: &str) -> Url {
        Url::parse(&format!("http://{addr}{path}")).expect("url")
    }

    fn surface(timeout: Duration) -> HttpProbeSurface {
        HttpProbeSurface::new(PageMetrics::new(2_160.0, 1_080.0), timeout)
            .expect("client")
    }

    #[tokio::test]
    async fn reachable_page_reports_configured_metrics() {
        let addr = serve().await;
        let surface = surface(Duration::from_secs(2));
        surface.scroll_to(300.0);

        let metrics = surface.load(&url(addr, "/ok")).await.expect("load");

        assert_eq!(metrics, PageMetrics::new(2_160.0, 1_080.0));
        assert_eq!(surface.offset(), 0.0);
    }

    #[tokio::test]
    async fn error_status_is_a_content_error() {
        let addr = serve().await;
        let err = surface(Duration::from_secs(2))
            .load(&url(addr, "/down"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NavigationError::ContentError(message) if message.contains("503")
        ));
    }

    #[tokio::test]
    async fn slow_page_times_out() {
        let addr = serve().await;
        let err = surface(Duration::from_millis(100))
            .load(&url(addr, "/slow"))
            .await
            .unwrap_err();

        assert_eq!(err, NavigationError::Timeout);
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = surface(Duration::from_secs(2))
            .load(&url(addr, "/ok"))
            .await
            .unwrap_err();

        assert!(matches!(err, NavigationError::NetworkFailure(_)));
    }
}
