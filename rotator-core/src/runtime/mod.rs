//! Tokio driver for the rotation controller.
//!
//! One task owns the [`RotationController`] and a single bounded mailbox.
//! Effects are executed by spawning short-lived tasks (page loads, timers,
//! configuration refreshes) that post their outcome back to the mailbox, so
//! the controller only ever sees one event at a time. Timers and the page
//! load in flight are aborted when superseded; outcomes that still slip
//! through carry a stale generation and are dropped by the controller.
//! Position changes go to a separate writer task that only ever saves the
//! newest position, so a slow store never holds up the rotation.

mod handle;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rotator_model::{DashboardId, RotationSnapshot};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config_source::ConfigSource;
use crate::controller::{ControllerEvent, Effect, RotationController, TimerKind};
use crate::error::NavigationError;
use crate::position::PositionStore;
use crate::settings::RotationSettings;
use crate::surface::RenderSurface;

pub use handle::RotationHandle;

const MAILBOX_CAPACITY: usize = 64;

/// Builder for a rotation task.
pub struct RotationRuntime {
    settings: RotationSettings,
    source: Arc<dyn ConfigSource>,
    surface: Arc<dyn RenderSurface>,
    positions: Option<Arc<dyn PositionStore>>,
}

impl fmt::Debug for RotationRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationRuntime")
            .field("settings", &self.settings)
            .field("persists_position", &self.positions.is_some())
            .finish()
    }
}

impl RotationRuntime {
    pub fn new(
        settings: RotationSettings,
        source: Arc<dyn ConfigSource>,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            settings,
            source,
            surface,
            positions: None,
        }
    }

    /// Restores the rotation position on start and records every change.
    pub fn with_position_store(
        mut self,
        store: Arc<dyn PositionStore>,
    ) -> Self {
        self.positions = Some(store);
        self
    }

    /// Spawns the rotation task on the current tokio runtime.
    pub fn spawn(self) -> RotationHandle {
        let (mailbox, inbox) = mpsc::channel(MAILBOX_CAPACITY);
        let (snapshots_tx, snapshots) =
            watch::channel(RotationSnapshot::default());
        let shutdown = CancellationToken::new();

        let driver = Driver {
            load_timeout: self.settings.load_timeout,
            controller: RotationController::new(self.settings),
            source: self.source,
            surface: self.surface,
            positions: self.positions,
            position_writer: None,
            mailbox: mailbox.clone(),
            snapshots: snapshots_tx,
            timers: HashMap::new(),
            navigation: None,
            refresh: None,
        };
        let task = tokio::spawn(driver.run(inbox, shutdown.clone()));

        RotationHandle {
            mailbox,
            snapshots,
            shutdown,
            task,
        }
    }
}

struct Driver {
    controller: RotationController,
    source: Arc<dyn ConfigSource>,
    surface: Arc<dyn RenderSurface>,
    positions: Option<Arc<dyn PositionStore>>,
    position_writer: Option<watch::Sender<Option<DashboardId>>>,
    load_timeout: Duration,
    mailbox: mpsc::Sender<ControllerEvent>,
    snapshots: watch::Sender<RotationSnapshot>,
    timers: HashMap<TimerKind, JoinHandle<()>>,
    navigation: Option<JoinHandle<()>>,
    refresh: Option<JoinHandle<()>>,
}

impl Driver {
    async fn run(
        mut self,
        mut inbox: mpsc::Receiver<ControllerEvent>,
        shutdown: CancellationToken,
    ) {
        let resume_hint = match &self.positions {
            Some(store) => match store.load().await {
                Ok(id) => id,
                Err(err) => {
                    warn!(error = %err, "failed to restore rotation position");
                    None
                }
            },
            None => None,
        };
        if let Some(id) = &resume_hint {
            info!(dashboard = %id, "resuming rotation");
        }
        self.controller.set_resume_hint(resume_hint);
        self.position_writer = self.positions.take().map(|store| {
            let (latest, pending) = watch::channel(None);
            tokio::spawn(write_positions(store, pending));
            latest
        });

        let effects = self.controller.start();
        self.execute(effects);
        self.publish();

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                event = inbox.recv() => {
                    let Some(event) = event else { break };
                    let effects = self.controller.handle(event, Instant::now());
                    self.execute(effects);
                    self.publish();
                }
            }
        }

        self.abort_all();
        shutdown.cancel();
        info!("rotation runtime stopped");
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Navigate { ticket, url } => {
                    if let Some(previous) = self.navigation.take() {
                        previous.abort();
                    }
                    let surface = Arc::clone(&self.surface);
                    let mailbox = self.mailbox.clone();
                    let timeout = self.load_timeout;
                    self.navigation = Some(tokio::spawn(async move {
                        debug!(%url, ticket = ticket.0, "loading dashboard");
                        let event = match tokio::time::timeout(
                            timeout,
                            surface.load(&url),
                        )
                        .await
                        {
                            Ok(Ok(metrics)) => {
                                ControllerEvent::NavigationFinished {
                                    ticket,
                                    metrics,
                                }
                            }
                            Ok(Err(error)) => {
                                ControllerEvent::NavigationFailed {
                                    ticket,
                                    error,
                                }
                            }
                            Err(_) => ControllerEvent::NavigationFailed {
                                ticket,
                                error: NavigationError::Timeout,
                            },
                        };
                        let _ = mailbox.send(event).await;
                    }));
                }
                Effect::CancelNavigation => {
                    if let Some(navigation) = self.navigation.take() {
                        navigation.abort();
                    }
                }
                Effect::StartTimer {
                    kind,
                    generation,
                    after,
                } => {
                    let mailbox = self.mailbox.clone();
                    let timer = tokio::spawn(async move {
                        tokio::time::sleep(after).await;
                        let fired =
                            ControllerEvent::TimerFired { kind, generation };
                        let _ = mailbox.send(fired).await;
                    });
                    if let Some(previous) = self.timers.insert(kind, timer) {
                        previous.abort();
                    }
                }
                Effect::CancelTimer(kind) => {
                    if let Some(timer) = self.timers.remove(&kind) {
                        timer.abort();
                    }
                }
                Effect::ScrollTo { offset } => self.surface.scroll_to(offset),
                Effect::RefreshConfig => {
                    let source = Arc::clone(&self.source);
                    let mailbox = self.mailbox.clone();
                    self.refresh = Some(tokio::spawn(async move {
                        let result = source.refresh().await;
                        let _ = mailbox
                            .send(ControllerEvent::ConfigRefreshed(result))
                            .await;
                    }));
                }
                Effect::PositionChanged(id) => {
                    if let Some(writer) = &self.position_writer {
                        writer.send_replace(Some(id));
                    }
                }
            }
        }
    }

    fn publish(&self) {
        let next = self.controller.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn abort_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        if let Some(navigation) = self.navigation.take() {
            navigation.abort();
        }
        if let Some(refresh) = self.refresh.take() {
            refresh.abort();
        }
    }
}

/// Saves positions until the driver goes away. Positions published while a
/// save is running collapse into the newest one; the last position is still
/// written after the driver exits.
async fn write_positions(
    store: Arc<dyn PositionStore>,
    mut pending: watch::Receiver<Option<DashboardId>>,
) {
    while pending.changed().await.is_ok() {
        let Some(id) = pending.borrow_and_update().clone() else {
            continue;
        };
        if let Err(err) = store.save(&id).await {
            warn!(
                dashboard = %id,
                error = %err,
                "failed to persist rotation position"
            );
        }
    }
}
