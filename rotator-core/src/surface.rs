//! Boundary to the component that actually renders dashboards.

use async_trait::async_trait;
use url::Url;

use crate::error::NavigationError;

/// Geometry reported by the render surface once a page has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageMetrics {
    /// Full height of the page content. Zero when unknown.
    pub content_height: f64,
    /// Height of the visible area. Zero when unknown.
    pub viewport_height: f64,
}

impl PageMetrics {
    pub fn new(content_height: f64, viewport_height: f64) -> Self {
        Self {
            content_height,
            viewport_height,
        }
    }

    /// Distance the page can scroll before its bottom edge is visible.
    pub fn scrollable_extent(&self) -> f64 {
        let content = finite_or_zero(self.content_height);
        let viewport = finite_or_zero(self.viewport_height);
        (content - viewport).max(0.0)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// A surface capable of loading a URL and scrolling the loaded page.
///
/// `load` resolves exactly once per attempt, either with the page metrics or
/// with the reason the load failed. The runtime dispatches it on a separate
/// task and discards the outcome of attempts that have been superseded.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    async fn load(&self, url: &Url) -> Result<PageMetrics, NavigationError>;

    /// Moves the current page to `offset`. Must not block.
    fn scroll_to(&self, offset: f64);
}
