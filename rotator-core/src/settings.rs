//! Operational parameters of the rotation controller.
//!
//! Every field has a default suitable for an office wall display. Deployments
//! override them through `rotator-config`.

use std::time::Duration;

use crate::scroll::EasingKind;

pub const DEFAULT_DWELL: Duration = Duration::from_secs(30);
pub const DEFAULT_SCROLL_DURATION: Duration = Duration::from_secs(20);
pub const DEFAULT_SCROLL_STEP: Duration = Duration::from_millis(100);
pub const DEFAULT_RETRY_LIMIT: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Timing of the per-page scroll animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSettings {
    /// Time taken to scroll from the top of a page to its bottom.
    pub duration: Duration,
    /// Minimum interval between two offset updates.
    pub min_step: Duration,
    pub easing: EasingKind,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            duration: DEFAULT_SCROLL_DURATION,
            min_step: DEFAULT_SCROLL_STEP,
            easing: EasingKind::EaseInOut,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotationSettings {
    /// Dwell used for dashboards without their own override.
    pub default_dwell: Duration,
    pub scroll: ScrollSettings,
    /// Load attempts per visit before a dashboard is skipped.
    pub retry_limit: u32,
    /// Delay between a failed load and its retry.
    pub backoff: Duration,
    /// Interval of the periodic configuration refresh.
    pub refresh_interval: Duration,
    /// Upper bound on a single page load.
    pub load_timeout: Duration,
    /// When set, a refresh that yields zero dashboards empties the rotation
    /// instead of keeping the last good list.
    pub clear_on_empty: bool,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            default_dwell: DEFAULT_DWELL,
            scroll: ScrollSettings::default(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            backoff: DEFAULT_BACKOFF,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            clear_on_empty: false,
        }
    }
}

impl RotationSettings {
    /// Retry limit with the floor of one attempt applied.
    pub fn attempts_per_visit(&self) -> u32 {
        self.retry_limit.max(1)
    }
}
