use std::time::Duration;

use url::Url;

use crate::ids::DashboardId;

/// A single dashboard in the rotation: identity, location, and display
/// metadata.
///
/// Descriptors are immutable once loaded. A configuration refresh replaces the
/// whole list rather than editing entries in place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DashboardDescriptor {
    pub id: DashboardId,
    pub url: Url,
    pub title: String,
    /// Per-dashboard override of the default dwell interval.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub dwell: Option<Duration>,
}

impl DashboardDescriptor {
    /// Builds a descriptor whose id and title are derived from the URL.
    pub fn from_url(url: Url) -> Self {
        let id = DashboardId::new(url.as_str());
        let title = default_title(&url);
        Self {
            id,
            url,
            title,
            dwell: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<DashboardId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.dwell = Some(dwell);
        self
    }

    /// Dwell interval for this dashboard, falling back to `default`.
    pub fn dwell_or(&self, default: Duration) -> Duration {
        self.dwell.unwrap_or(default)
    }
}

/// Display label used when the configuration does not provide a title.
pub fn default_title(url: &Url) -> String {
    match url.host_str() {
        Some(host) => host.to_owned(),
        None => url.as_str().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url_derives_id_and_title() {
        let url = Url::parse("https://grafana.example.com/d/abc").unwrap();
        let descriptor = DashboardDescriptor::from_url(url.clone());

        assert_eq!(descriptor.id.as_str(), url.as_str());
        assert_eq!(descriptor.title, "grafana.example.com");
        assert_eq!(descriptor.dwell, None);
    }

    #[test]
    fn dwell_override_wins_over_default() {
        let url = Url::parse("https://status.example.com/").unwrap();
        let default = Duration::from_secs(30);

        let plain = DashboardDescriptor::from_url(url.clone());
        assert_eq!(plain.dwell_or(default), default);

        let custom = plain.with_dwell(Duration::from_secs(12));
        assert_eq!(custom.dwell_or(default), Duration::from_secs(12));
    }
}
