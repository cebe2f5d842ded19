use rotator_model::{DashboardId, RotationSnapshot};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::controller::{ControllerEvent, NavigationTicket};
use crate::error::{Result, RotatorError};
use crate::surface::PageMetrics;

/// Control surface of a running rotation.
///
/// Commands are queued on the runtime mailbox and applied in order with the
/// runtime's own completions. Snapshots are published after every event that
/// changed the observable state.
#[derive(Debug)]
pub struct RotationHandle {
    pub(super) mailbox: mpsc::Sender<ControllerEvent>,
    pub(super) snapshots: watch::Receiver<RotationSnapshot>,
    pub(super) shutdown: CancellationToken,
    pub(super) task: JoinHandle<()>,
}

impl RotationHandle {
    /// Jumps to `id` immediately. Unknown ids are ignored by the controller.
    pub async fn select(&self, id: impl Into<DashboardId>) -> Result<()> {
        self.send(ControllerEvent::SelectRequested(id.into())).await
    }

    /// Requests a configuration refresh outside of the periodic schedule.
    pub async fn refresh(&self) -> Result<()> {
        self.send(ControllerEvent::RefreshRequested).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(ControllerEvent::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(ControllerEvent::Resume).await
    }

    /// Reports new metrics for the page loaded under `ticket`. Ends the
    /// scroll early when the page shrank below the current offset; reports
    /// about a page that has since been replaced are dropped.
    pub async fn report_resize(
        &self,
        ticket: NavigationTicket,
        metrics: PageMetrics,
    ) -> Result<()> {
        self.send(ControllerEvent::ContentResized { ticket, metrics })
            .await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> RotationSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Ticket of the page on screen, as of the latest snapshot.
    pub fn current_ticket(&self) -> NavigationTicket {
        NavigationTicket(self.snapshots.borrow().page)
    }

    /// Receiver notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<RotationSnapshot> {
        self.snapshots.clone()
    }

    /// Token cancelled when the runtime shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the runtime and waits for its task to exit. Pending timers and
    /// the navigation in flight are aborted.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(err) = self.task.await
            && err.is_panic()
        {
            error!(error = %err, "rotation runtime panicked");
        }
    }

    async fn send(&self, event: ControllerEvent) -> Result<()> {
        self.mailbox
            .send(event)
            .await
            .map_err(|_| RotatorError::RuntimeStopped)
    }
}
