//! Time-based scroll planning for a loaded dashboard.
//!
//! A [`ScrollPlan`] is a finite, lazily evaluated sequence of [`ScrollTick`]s
//! that moves the page from the top to the bottom of its scrollable extent
//! over the configured duration. The plan only computes offsets and delays;
//! the runtime owns the timers that space the ticks out.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::settings::ScrollSettings;
use crate::surface::PageMetrics;

/// Easing function applied to scroll progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EasingKind {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl EasingKind {
    pub const ALL: [Self; 4] =
        [Self::Linear, Self::EaseIn, Self::EaseOut, Self::EaseInOut];

    /// Maps linear progress `t` in `[0, 1]` onto eased progress.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - 2.0 * (1.0 - t) * (1.0 - t)
                }
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }
}

impl fmt::Display for EasingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EasingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "linear" => Ok(Self::Linear),
            "ease-in" | "easein" => Ok(Self::EaseIn),
            "ease-out" | "easeout" => Ok(Self::EaseOut),
            "ease-in-out" | "easeinout" => Ok(Self::EaseInOut),
            other => Err(format!(
                "unknown easing '{other}' (expected one of linear, ease-in, ease-out, ease-in-out)"
            )),
        }
    }
}

/// One scroll update: wait `delay` after the previous tick, then move the
/// page to `offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTick {
    pub delay: Duration,
    /// Time since the start of the plan at which this tick lands.
    pub at: Duration,
    pub offset: f64,
}

/// Builds scroll plans from page metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollDriver {
    settings: ScrollSettings,
}

impl ScrollDriver {
    pub fn new(settings: ScrollSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ScrollSettings {
        &self.settings
    }

    /// Starts a fresh plan for a page with the given metrics.
    pub fn start(&self, metrics: PageMetrics) -> ScrollPlan {
        ScrollPlan::new(
            metrics.scrollable_extent(),
            self.settings.duration,
            self.settings.min_step,
            self.settings.easing,
        )
    }
}

/// Finite sequence of scroll ticks for one page visit.
///
/// A plan is not restartable: once it has finished or been cancelled it
/// yields nothing, and a new plan must be started to replay the animation.
#[derive(Debug, Clone)]
pub struct ScrollPlan {
    extent: f64,
    total_duration: Duration,
    step: Duration,
    easing: EasingKind,
    total_ticks: u64,
    emitted: u64,
    elapsed: Duration,
    current_offset: f64,
    finished: bool,
}

impl ScrollPlan {
    pub fn new(
        extent: f64,
        total_duration: Duration,
        min_step: Duration,
        easing: EasingKind,
    ) -> Self {
        let extent = if extent.is_finite() { extent.max(0.0) } else { 0.0 };
        let step = min_step.max(Duration::from_millis(1));

        let total_ticks = if extent <= 0.0 {
            0
        } else if total_duration.is_zero() {
            1
        } else {
            let ticks = total_duration.as_nanos().div_ceil(step.as_nanos());
            u64::try_from(ticks).unwrap_or(u64::MAX).max(1)
        };

        Self {
            extent,
            total_duration,
            step,
            easing,
            total_ticks,
            emitted: 0,
            elapsed: Duration::ZERO,
            current_offset: 0.0,
            finished: total_ticks == 0,
        }
    }

    /// Scrollable distance covered by the plan, in surface units.
    pub fn extent(&self) -> f64 {
        self.extent
    }

    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// Offset of the most recently emitted tick.
    pub fn current_offset(&self) -> f64 {
        self.current_offset
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True when the plan completes without any visible motion.
    pub fn is_static(&self) -> bool {
        self.total_ticks == 0
    }

    pub fn remaining_ticks(&self) -> u64 {
        if self.finished {
            0
        } else {
            self.total_ticks - self.emitted
        }
    }

    /// Stops the plan immediately; the current offset is left untouched.
    pub fn cancel(&mut self) {
        self.finished = true;
    }

    fn tick_time(&self, index: u64) -> Duration {
        if index >= self.total_ticks {
            return self.total_duration;
        }
        let nanos = self.step.as_nanos().saturating_mul(u128::from(index));
        let nanos = u64::try_from(nanos).unwrap_or(u64::MAX);
        Duration::from_nanos(nanos).min(self.total_duration)
    }
}

impl Iterator for ScrollPlan {
    type Item = ScrollTick;

    fn next(&mut self) -> Option<ScrollTick> {
        if self.finished || self.emitted >= self.total_ticks {
            self.finished = true;
            return None;
        }

        self.emitted += 1;
        let at = self.tick_time(self.emitted);
        let delay = at.saturating_sub(self.elapsed);

        let offset = if self.emitted == self.total_ticks {
            self.extent
        } else {
            let progress =
                at.as_secs_f64() / self.total_duration.as_secs_f64();
            (self.extent * self.easing.apply(progress))
                .clamp(self.current_offset, self.extent)
        };

        self.elapsed = at;
        self.current_offset = offset;
        if self.emitted == self.total_ticks {
            self.finished = true;
        }

        Some(ScrollTick { delay, at, offset })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining =
            usize::try_from(self.remaining_ticks()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
