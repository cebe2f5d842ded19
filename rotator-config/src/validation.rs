use std::time::Duration;

use thiserror::Error;

use crate::models::Config;

const MIN_SENSIBLE_REFRESH: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("no configuration source URL set")]
    MissingSourceUrl,
    #[error("configuration source scheme '{scheme}' is not supported")]
    UnsupportedScheme { scheme: String },
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("retry_limit must allow at least one attempt")]
    ZeroRetryLimit,
    #[error("{field} must be a finite, non-negative height, got {value}")]
    InvalidProbeHeight { field: &'static str, value: f64 },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    let scheme = config.source.url.scheme();
    if !matches!(scheme, "http" | "https" | "file") {
        return Err(ConfigGuardRailError::UnsupportedScheme {
            scheme: scheme.to_owned(),
        });
    }

    let rotation = &config.rotation;
    for (field, value) in [
        ("source.request_timeout", config.source.request_timeout),
        ("rotation.refresh_interval", rotation.refresh_interval),
        ("rotation.default_dwell", rotation.default_dwell),
        ("rotation.scroll_step", rotation.scroll_step),
        ("rotation.backoff", rotation.backoff),
        ("rotation.load_timeout", rotation.load_timeout),
    ] {
        if value.is_zero() {
            return Err(ConfigGuardRailError::ZeroDuration { field });
        }
    }

    if rotation.retry_limit == 0 {
        return Err(ConfigGuardRailError::ZeroRetryLimit);
    }

    for (field, value) in [
        ("probe.content_height", config.probe.content_height),
        ("probe.viewport_height", config.probe.viewport_height),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigGuardRailError::InvalidProbeHeight {
                field,
                value,
            });
        }
    }

    if rotation.default_dwell < rotation.scroll_duration {
        warnings.push_with_hint(
            format!(
                "default dwell ({}) is shorter than the scroll duration ({}); \
                 long pages advance as soon as scrolling ends",
                humantime::format_duration(rotation.default_dwell),
                humantime::format_duration(rotation.scroll_duration),
            ),
            "Raise ROTATOR_DEFAULT_DWELL or lower ROTATOR_SCROLL_DURATION",
        );
    }

    if !rotation.scroll_duration.is_zero()
        && rotation.scroll_step > rotation.scroll_duration
    {
        warnings.push(format!(
            "scroll step ({}) exceeds the scroll duration; \
             pages jump straight to the bottom",
            humantime::format_duration(rotation.scroll_step),
        ));
    }

    if rotation.refresh_interval < MIN_SENSIBLE_REFRESH {
        warnings.push_with_hint(
            format!(
                "refresh interval of {} polls the configuration source \
                 very often",
                humantime::format_duration(rotation.refresh_interval),
            ),
            "The list is also re-read at every wraparound; \
             5m is usually enough",
        );
    }

    Ok(warnings)
}
