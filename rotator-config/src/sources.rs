use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub source: FileSourceConfig,
    #[serde(default)]
    pub rotation: FileRotationConfig,
    #[serde(default)]
    pub state: FileStateConfig,
    #[serde(default)]
    pub probe: FileProbeConfig,
}

/// Durations in the file are either whole seconds or humantime strings such
/// as `"90s"` or `"5m"`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FileDuration {
    Seconds(u64),
    Text(String),
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<FileDuration>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileRotationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<FileDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_dwell: Option<FileDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_duration: Option<FileDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_step: Option<FileDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_easing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<FileDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_timeout: Option<FileDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_on_empty: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_file: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileProbeConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport_height: Option<f64>,
}

/// Environment-derived configuration values, kept raw until the loader
/// parses them so that errors can name the offending variable.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub source_url: Option<String>,
    pub request_timeout: Option<String>,
    pub refresh_interval: Option<String>,
    pub default_dwell: Option<String>,
    pub scroll_duration: Option<String>,
    pub scroll_step: Option<String>,
    pub scroll_easing: Option<String>,
    pub retry_limit: Option<String>,
    pub backoff: Option<String>,
    pub load_timeout: Option<String>,
    pub clear_on_empty: Option<bool>,
    pub position_file: Option<PathBuf>,
    pub probe_content_height: Option<String>,
    pub probe_viewport_height: Option<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the environment layer from an arbitrary key lookup. Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key).filter(|value| !value.trim().is_empty())
        };

        Self {
            config_path: var("ROTATOR_CONFIG").map(PathBuf::from),
            source_url: var("ROTATOR_CONFIG_URL"),
            request_timeout: var("ROTATOR_REQUEST_TIMEOUT"),
            refresh_interval: var("ROTATOR_REFRESH_INTERVAL"),
            default_dwell: var("ROTATOR_DEFAULT_DWELL"),
            scroll_duration: var("ROTATOR_SCROLL_DURATION"),
            scroll_step: var("ROTATOR_SCROLL_STEP"),
            scroll_easing: var("ROTATOR_SCROLL_EASING"),
            retry_limit: var("ROTATOR_RETRY_LIMIT"),
            backoff: var("ROTATOR_BACKOFF"),
            load_timeout: var("ROTATOR_LOAD_TIMEOUT"),
            clear_on_empty: var("ROTATOR_CLEAR_ON_EMPTY")
                .and_then(|raw| parse_bool(&raw)),
            position_file: var("ROTATOR_POSITION_FILE").map(PathBuf::from),
            probe_content_height: var("ROTATOR_PROBE_CONTENT_HEIGHT"),
            probe_viewport_height: var("ROTATOR_PROBE_VIEWPORT_HEIGHT"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
