use std::path::PathBuf;
use std::time::Duration;

use rotator_core::{
    EasingKind, PageMetrics, RotationSettings, ScrollSettings,
};
use url::Url;

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub rotation: RotationConfig,
    pub state: StateConfig,
    pub probe: ProbeConfig,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Location of the dashboard list (`http`, `https`, or `file`).
    pub url: Url,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationConfig {
    pub refresh_interval: Duration,
    pub default_dwell: Duration,
    pub scroll_duration: Duration,
    pub scroll_step: Duration,
    pub scroll_easing: EasingKind,
    pub retry_limit: u32,
    pub backoff: Duration,
    pub load_timeout: Duration,
    pub clear_on_empty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StateConfig {
    /// Where the rotation position is persisted. Disabled when unset.
    pub position_file: Option<PathBuf>,
}

/// Page geometry the headless probe surface reports for every dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeConfig {
    pub content_height: f64,
    pub viewport_height: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

impl Config {
    pub fn rotation_settings(&self) -> RotationSettings {
        let rotation = &self.rotation;
        RotationSettings {
            default_dwell: rotation.default_dwell,
            scroll: ScrollSettings {
                duration: rotation.scroll_duration,
                min_step: rotation.scroll_step,
                easing: rotation.scroll_easing,
            },
            retry_limit: rotation.retry_limit,
            backoff: rotation.backoff,
            refresh_interval: rotation.refresh_interval,
            load_timeout: rotation.load_timeout,
            clear_on_empty: rotation.clear_on_empty,
        }
    }
}

impl ProbeConfig {
    pub fn metrics(&self) -> PageMetrics {
        PageMetrics::new(self.content_height, self.viewport_height)
    }
}
