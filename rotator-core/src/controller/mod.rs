//! The rotation state machine.
//!
//! [`RotationController`] is synchronous and performs no I/O. Every input is a
//! [`ControllerEvent`] stamped with the current instant, and every output is a
//! list of [`Effect`]s for the runtime to execute. Asynchronous completions
//! (page loads, timers) come back as events carrying the generation they were
//! started with, and anything older than the controller's current generation
//! is dropped on arrival.

mod events;
mod state;
mod timers;


use std::sync::Arc;
use std::time::Duration;

use rotator_model::{
    DashboardDescriptor, DashboardId, RotationPhase, RotationSnapshot,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, InternalError, NavigationError};
use crate::scroll::{ScrollDriver, ScrollPlan, ScrollTick};
use crate::settings::RotationSettings;
use crate::surface::PageMetrics;

pub use events::{ControllerEvent, Effect, NavigationTicket, TimerKind};
pub use state::RotationState;

use timers::TimerSet;

#[derive(Debug)]
struct ActiveScroll {
    plan: ScrollPlan,
    /// Tick waiting on the armed `ScrollTick` timer.
    pending: Option<ScrollTick>,
}

/// Decides which dashboard is on screen and for how long.
#[derive(Debug)]
pub struct RotationController {
    settings: RotationSettings,
    driver: ScrollDriver,
    state: RotationState,
    timers: TimerSet,
    ticket: NavigationTicket,
    navigation_in_flight: bool,
    scroll: Option<ActiveScroll>,
    shown_at: Option<Instant>,
    /// Refreshed list waiting for the current dashboard to finish.
    pending_list: Option<Arc<[DashboardDescriptor]>>,
    refresh_in_flight: bool,
    /// Dashboard to start from when the next list is adopted while idle.
    resume_hint: Option<DashboardId>,
    /// Last dashboard announced through `PositionChanged`.
    position: Option<DashboardId>,
    /// Set by the operator; survives the list being cleared.
    paused: bool,
    /// Panic on impossible transitions instead of resetting to idle.
    strict_invariants: bool,
}

impl RotationController {
    pub fn new(settings: RotationSettings) -> Self {
        Self {
            driver: ScrollDriver::new(settings.scroll),
            settings,
            state: RotationState::default(),
            timers: TimerSet::default(),
            ticket: NavigationTicket::default(),
            navigation_in_flight: false,
            scroll: None,
            shown_at: None,
            pending_list: None,
            refresh_in_flight: false,
            resume_hint: None,
            position: None,
            paused: false,
            strict_invariants: cfg!(debug_assertions),
        }
    }

    /// Starts the rotation at `id` if it is part of the first list adopted.
    pub fn with_resume_hint(mut self, id: Option<DashboardId>) -> Self {
        self.set_resume_hint(id);
        self
    }

    /// The hint is already persisted, so starting on it is not announced
    /// again.
    pub fn set_resume_hint(&mut self, id: Option<DashboardId>) {
        self.position = id.clone();
        self.resume_hint = id;
    }

    /// Chooses between panicking and resetting to idle when the state
    /// machine reaches a transition it should never take. Defaults to
    /// panicking in debug builds only.
    pub fn with_strict_invariants(mut self, strict: bool) -> Self {
        self.strict_invariants = strict;
        self
    }

    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn phase(&self) -> RotationPhase {
        self.state.phase()
    }

    pub fn snapshot(&self) -> RotationSnapshot {
        RotationSnapshot {
            page: self.ticket.0,
            ..self.state.snapshot()
        }
    }

    pub fn has_pending_list(&self) -> bool {
        self.pending_list.is_some()
    }

    /// Requests the first configuration load and arms the periodic refresh.
    pub fn start(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        self.timers.arm(
            TimerKind::Refresh,
            self.settings.refresh_interval,
            &mut effects,
        );
        self.request_refresh(&mut effects);
        effects
    }

    pub fn handle(
        &mut self,
        event: ControllerEvent,
        now: Instant,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        let before = self.state.phase();

        match event {
            ControllerEvent::ConfigRefreshed(result) => {
                self.on_config_refreshed(result, &mut effects)
            }
            ControllerEvent::NavigationFinished { ticket, metrics } => {
                self.on_navigation_finished(ticket, metrics, now, &mut effects)
            }
            ControllerEvent::NavigationFailed { ticket, error } => {
                self.on_navigation_failed(ticket, error, &mut effects)
            }
            ControllerEvent::ContentResized { ticket, metrics } => {
                self.on_content_resized(ticket, metrics, now, &mut effects)
            }
            ControllerEvent::TimerFired { kind, generation } => {
                self.on_timer(kind, generation, now, &mut effects)
            }
            ControllerEvent::SelectRequested(id) => {
                self.on_select(id, &mut effects)
            }
            ControllerEvent::RefreshRequested => {
                self.request_refresh(&mut effects)
            }
            ControllerEvent::Pause => self.on_pause(&mut effects),
            ControllerEvent::Resume => self.on_resume(&mut effects),
        }

        let after = self.state.phase();
        if before != after {
            debug!(from = %before, to = %after, "rotation phase changed");
        }
        effects
    }

    fn request_refresh(&mut self, effects: &mut Vec<Effect>) {
        if self.refresh_in_flight {
            debug!("configuration refresh already in flight");
            return;
        }
        self.refresh_in_flight = true;
        effects.push(Effect::RefreshConfig);
    }

    fn on_config_refreshed(
        &mut self,
        result: Result<Vec<DashboardDescriptor>, ConfigError>,
        effects: &mut Vec<Effect>,
    ) {
        self.refresh_in_flight = false;
        match result {
            Ok(list) if !list.is_empty() => self.adopt_list(list, effects),
            Ok(_) | Err(ConfigError::Empty) => {
                if self.settings.clear_on_empty {
                    if !self.state.is_empty() {
                        warn!("configuration is empty; clearing rotation");
                    }
                    self.enter_idle(effects);
                } else {
                    warn!(
                        dashboards = self.state.len(),
                        "configuration is empty; keeping current rotation"
                    );
                }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    dashboards = self.state.len(),
                    "configuration refresh failed; keeping current rotation"
                );
            }
        }
    }

    fn adopt_list(
        &mut self,
        list: Vec<DashboardDescriptor>,
        effects: &mut Vec<Effect>,
    ) {
        let list: Arc<[DashboardDescriptor]> = list.into();

        if self.state.is_empty() {
            let index = self
                .resume_hint
                .take()
                .and_then(|id| list.iter().position(|d| d.id == id))
                .unwrap_or(0);
            info!(
                dashboards = list.len(),
                start = index,
                "rotation list adopted"
            );
            self.state.replace(list, index);
            if self.paused {
                self.state.set_phase(RotationPhase::Paused);
                info!("rotation stays paused until resumed");
            } else {
                self.begin_visit(index, effects);
            }
        } else if self.state.same_list(&list) {
            debug!("configuration unchanged");
            self.pending_list = None;
        } else {
            debug!(
                dashboards = list.len(),
                "configuration changed; applying after the current dashboard"
            );
            self.pending_list = Some(list);
        }
    }

    /// Moves to the dashboard after the current one, applying a pending list
    /// first.
    fn advance(&mut self, effects: &mut Vec<Effect>) {
        let current = self.state.current_index();
        let next = if let Some(list) = self.pending_list.take() {
            let position = self
                .state
                .current()
                .and_then(|current| {
                    list.iter().position(|d| d.id == current.id)
                });
            let next = match position {
                Some(position) => (position + 1) % list.len(),
                // The current dashboard was removed; its successor has shifted
                // into its slot.
                None => {
                    current.filter(|idx| *idx < list.len()).unwrap_or(0)
                }
            };
            info!(dashboards = list.len(), "rotation list replaced");
            self.state.replace(list, next);
            next
        } else {
            match current {
                Some(idx) => (idx + 1) % self.state.len(),
                None => {
                    self.invalid_state("advance with an empty list", effects);
                    return;
                }
            }
        };

        if next == 0 {
            self.request_refresh(effects);
        }
        self.begin_visit(next, effects);
    }

    fn begin_visit(&mut self, index: usize, effects: &mut Vec<Effect>) {
        self.stop_display(effects);
        self.paused = false;
        self.state.set_current(index);

        let Some(descriptor) = self.state.current() else {
            self.invalid_state("visit of a missing dashboard", effects);
            return;
        };
        let id = descriptor.id.clone();
        let url = descriptor.url.clone();
        info!(
            dashboard = %id,
            title = %descriptor.title,
            index,
            "showing dashboard"
        );

        self.ticket = self.ticket.next();
        self.navigation_in_flight = true;
        self.state.set_phase(RotationPhase::Loading);
        effects.push(Effect::Navigate {
            ticket: self.ticket,
            url,
        });
        if self.position.as_ref() != Some(&id) {
            self.position = Some(id.clone());
            effects.push(Effect::PositionChanged(id));
        }
    }

    /// Cancels everything tied to the dashboard on screen.
    fn stop_display(&mut self, effects: &mut Vec<Effect>) {
        self.timers.disarm(TimerKind::ScrollTick, effects);
        self.timers.disarm(TimerKind::Dwell, effects);
        self.timers.disarm(TimerKind::Backoff, effects);
        if let Some(mut scroll) = self.scroll.take() {
            scroll.plan.cancel();
        }
        self.shown_at = None;
    }

    fn cancel_navigation(&mut self, effects: &mut Vec<Effect>) {
        if self.navigation_in_flight {
            self.navigation_in_flight = false;
            self.ticket = self.ticket.next();
            effects.push(Effect::CancelNavigation);
        }
    }

    fn accepts(&self, ticket: NavigationTicket) -> bool {
        ticket == self.ticket
            && self.navigation_in_flight
            && self.state.phase() == RotationPhase::Loading
    }

    fn on_navigation_finished(
        &mut self,
        ticket: NavigationTicket,
        metrics: PageMetrics,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        if !self.accepts(ticket) {
            debug!(ticket = ticket.0, "discarding stale navigation result");
            return;
        }
        self.navigation_in_flight = false;
        if let Some(id) = self.state.current().map(|d| d.id.clone()) {
            self.state.reset_failures(&id);
        }

        let plan = self.driver.start(metrics);
        debug!(
            extent = plan.extent(),
            content_height = metrics.content_height,
            "dashboard loaded"
        );
        self.shown_at = Some(now);
        self.state.set_phase(RotationPhase::Scrolling);
        self.scroll = Some(ActiveScroll {
            plan,
            pending: None,
        });
        self.schedule_scroll_tick(now, effects);
    }

    fn schedule_scroll_tick(
        &mut self,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        let Some(scroll) = self.scroll.as_mut() else {
            return;
        };
        match scroll.plan.next() {
            Some(tick) => {
                scroll.pending = Some(tick);
                self.timers.arm(TimerKind::ScrollTick, tick.delay, effects);
            }
            None => {
                self.scroll = None;
                self.begin_dwell(now, effects);
            }
        }
    }

    fn begin_dwell(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        let Some(dwell) = self
            .state
            .current()
            .map(|d| d.dwell_or(self.settings.default_dwell))
        else {
            self.invalid_state("dwell without a current dashboard", effects);
            return;
        };
        let visible = self
            .shown_at
            .map(|shown_at| now.saturating_duration_since(shown_at))
            .unwrap_or(Duration::ZERO);
        let remaining = dwell.saturating_sub(visible);

        debug!(
            dwell_ms = dwell.as_millis() as u64,
            remaining_ms = remaining.as_millis() as u64,
            "scroll complete"
        );
        self.state.set_phase(RotationPhase::Dwelling);
        self.timers.arm(TimerKind::Dwell, remaining, effects);
    }

    fn on_navigation_failed(
        &mut self,
        ticket: NavigationTicket,
        error: NavigationError,
        effects: &mut Vec<Effect>,
    ) {
        if !self.accepts(ticket) {
            debug!(ticket = ticket.0, "discarding stale navigation failure");
            return;
        }
        self.navigation_in_flight = false;
        let Some(id) = self.state.current().map(|d| d.id.clone()) else {
            self.invalid_state(
                "navigation failure without a dashboard",
                effects,
            );
            return;
        };

        let attempts = self.state.record_failure(&id);
        let limit = self.settings.attempts_per_visit();
        self.state.set_phase(RotationPhase::Error);

        if attempts >= limit {
            warn!(
                dashboard = %id,
                error = %error,
                attempts,
                "dashboard keeps failing; skipping"
            );
            self.state.reset_failures(&id);
            self.advance(effects);
        } else {
            warn!(
                dashboard = %id,
                error = %error,
                attempt = attempts,
                limit,
                "dashboard failed to load; retrying after backoff"
            );
            self.timers
                .arm(TimerKind::Backoff, self.settings.backoff, effects);
        }
    }

    fn on_content_resized(
        &mut self,
        ticket: NavigationTicket,
        metrics: PageMetrics,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        if ticket != self.ticket
            || self.state.phase() != RotationPhase::Scrolling
        {
            return;
        }
        let extent = metrics.scrollable_extent();
        let Some(scroll) = self.scroll.as_mut() else {
            return;
        };
        if extent >= scroll.plan.current_offset() {
            return;
        }

        debug!(
            extent,
            offset = scroll.plan.current_offset(),
            "page shrank below the scroll position; ending scroll"
        );
        scroll.plan.cancel();
        self.scroll = None;
        self.timers.disarm(TimerKind::ScrollTick, effects);
        self.begin_dwell(now, effects);
    }

    fn on_timer(
        &mut self,
        kind: TimerKind,
        generation: u64,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        if !self.timers.accept(kind, generation) {
            debug!(timer = kind.as_str(), generation, "discarding stale timer");
            return;
        }

        let phase = self.state.phase();
        match kind {
            TimerKind::Refresh => {
                self.timers.arm(
                    TimerKind::Refresh,
                    self.settings.refresh_interval,
                    effects,
                );
                self.request_refresh(effects);
            }
            TimerKind::ScrollTick => {
                let tick = self.scroll.as_mut().and_then(|s| s.pending.take());
                match (phase, tick) {
                    (RotationPhase::Scrolling, Some(tick)) => {
                        effects.push(Effect::ScrollTo {
                            offset: tick.offset,
                        });
                        self.schedule_scroll_tick(now, effects);
                    }
                    _ => self.invalid_state(
                        "scroll tick without a scroll",
                        effects,
                    ),
                }
            }
            TimerKind::Dwell => {
                if phase == RotationPhase::Dwelling {
                    self.advance(effects);
                } else {
                    self.invalid_state(
                        "dwell timer outside of dwelling",
                        effects,
                    );
                }
            }
            TimerKind::Backoff => match (phase, self.state.current_index()) {
                (RotationPhase::Error, Some(index)) => {
                    debug!("backoff elapsed; retrying dashboard");
                    self.begin_visit(index, effects);
                }
                _ => self.invalid_state(
                    "backoff timer outside of error",
                    effects,
                ),
            },
        }
    }

    fn on_select(&mut self, id: DashboardId, effects: &mut Vec<Effect>) {
        match self.state.position_of(&id) {
            Some(index) => {
                info!(dashboard = %id, "dashboard selected manually");
                self.begin_visit(index, effects);
            }
            None => warn!(
                dashboard = %id,
                "ignoring selection of unknown dashboard"
            ),
        }
    }

    fn on_pause(&mut self, effects: &mut Vec<Effect>) {
        if self.state.is_empty() || self.state.phase() == RotationPhase::Paused
        {
            return;
        }
        self.stop_display(effects);
        self.cancel_navigation(effects);
        self.paused = true;
        self.state.set_phase(RotationPhase::Paused);
        info!("rotation paused");
    }

    fn on_resume(&mut self, effects: &mut Vec<Effect>) {
        match (self.state.phase(), self.state.current_index()) {
            (RotationPhase::Paused, Some(index)) => {
                info!("rotation resumed");
                self.begin_visit(index, effects);
            }
            // Paused before the list was cleared; rotate once a list arrives.
            (RotationPhase::Idle, _) if self.paused => {
                info!("rotation resumed");
                self.paused = false;
            }
            _ => {}
        }
    }

    fn enter_idle(&mut self, effects: &mut Vec<Effect>) {
        self.stop_display(effects);
        self.cancel_navigation(effects);
        if let Some(current) = self.state.current() {
            self.resume_hint = Some(current.id.clone());
        }
        self.pending_list = None;
        self.state.clear();
    }

    /// A transition the state machine should never take. Strict controllers
    /// stop here; the others reset to idle and reload the configuration.
    fn invalid_state(&mut self, detail: &str, effects: &mut Vec<Effect>) {
        let err = InternalError::InvalidState {
            phase: self.state.phase().to_string(),
            detail: detail.to_owned(),
        };
        if self.strict_invariants {
            panic!("{err}");
        }
        error!(error = %err, "rotation controller reset");
        self.enter_idle(effects);
        self.request_refresh(effects);
    }
}
