use std::fmt;

/// Stable identifier of a dashboard within a loaded rotation list.
///
/// Identifiers are opaque: they come from the remote configuration when it
/// supplies one and otherwise fall back to the dashboard URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DashboardId(String);

impl DashboardId {
    pub fn new(value: impl Into<String>) -> Self {
        DashboardId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for DashboardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DashboardId {
    fn from(value: &str) -> Self {
        DashboardId(value.to_owned())
    }
}

impl From<String> for DashboardId {
    fn from(value: String) -> Self {
        DashboardId(value)
    }
}

impl fmt::Display for DashboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
