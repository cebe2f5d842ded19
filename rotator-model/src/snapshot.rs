//! Read model handed to passive list views.

use std::sync::Arc;

use crate::{DashboardDescriptor, DashboardId, RotationPhase};

/// Point-in-time view of the rotation: the active list, the selected entry,
/// and the controller phase.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RotationSnapshot {
    pub descriptors: Arc<[DashboardDescriptor]>,
    /// `None` exactly when `descriptors` is empty.
    pub current_index: Option<usize>,
    pub phase: RotationPhase,
    /// Consecutive load failures of the current dashboard.
    pub current_failures: u32,
    /// Generation of the page on screen; resize reports quote it back.
    pub page: u64,
}

impl RotationSnapshot {
    pub fn current(&self) -> Option<&DashboardDescriptor> {
        self.current_index.and_then(|idx| self.descriptors.get(idx))
    }

    pub fn current_id(&self) -> Option<&DashboardId> {
        self.current().map(|descriptor| &descriptor.id)
    }

    pub fn position_of(&self, id: &DashboardId) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|descriptor| &descriptor.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }
}
