use std::time::Duration;

use rotator_model::{DashboardDescriptor, DashboardId};
use url::Url;

use crate::error::{ConfigError, NavigationError};
use crate::surface::PageMetrics;

/// Purposes for which the controller keeps a timer. At most one timer per
/// kind is pending at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Delay before retrying a failed load.
    Backoff,
    /// Spacing between two scroll offset updates.
    ScrollTick,
    /// Remaining dwell time after scrolling finished.
    Dwell,
    /// Periodic configuration refresh.
    Refresh,
}

impl TimerKind {
    pub(crate) fn index(self) -> usize {
        match self {
            TimerKind::Backoff => 0,
            TimerKind::ScrollTick => 1,
            TimerKind::Dwell => 2,
            TimerKind::Refresh => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerKind::Backoff => "backoff",
            TimerKind::ScrollTick => "scroll_tick",
            TimerKind::Dwell => "dwell",
            TimerKind::Refresh => "refresh",
        }
    }
}

/// Generation tag of a navigation attempt. Results carrying an older ticket
/// than the controller's current one are stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NavigationTicket(pub u64);

impl NavigationTicket {
    pub(crate) fn next(self) -> Self {
        NavigationTicket(self.0.wrapping_add(1))
    }
}

/// Inputs to the controller. The runtime feeds them one at a time in arrival
/// order.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// Outcome of a configuration refresh.
    ConfigRefreshed(Result<Vec<DashboardDescriptor>, ConfigError>),
    NavigationFinished {
        ticket: NavigationTicket,
        metrics: PageMetrics,
    },
    NavigationFailed {
        ticket: NavigationTicket,
        error: NavigationError,
    },
    /// The loaded page changed size after it finished loading.
    ContentResized {
        ticket: NavigationTicket,
        metrics: PageMetrics,
    },
    TimerFired {
        kind: TimerKind,
        generation: u64,
    },
    /// Operator picked a dashboard from the list view.
    SelectRequested(DashboardId),
    RefreshRequested,
    Pause,
    Resume,
}

/// Side effects requested by the controller, executed by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Load `url`; report the outcome tagged with `ticket`. Supersedes any
    /// navigation still in flight.
    Navigate {
        ticket: NavigationTicket,
        url: Url,
    },
    CancelNavigation,
    /// Arm the timer of `kind`, replacing any pending one.
    StartTimer {
        kind: TimerKind,
        generation: u64,
        after: Duration,
    },
    CancelTimer(TimerKind),
    ScrollTo {
        offset: f64,
    },
    RefreshConfig,
    /// The dashboard on screen changed; persist it as the rotation position.
    PositionChanged(DashboardId),
}
