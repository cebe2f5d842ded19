use std::collections::HashMap;
use std::sync::Arc;

use rotator_model::{
    DashboardDescriptor, DashboardId, RotationPhase, RotationSnapshot,
};

/// State owned by the rotation controller.
///
/// `current_index` is always a valid index while `descriptors` is non-empty.
/// An empty list always comes with [`RotationPhase::Idle`].
#[derive(Debug, Clone, Default)]
pub struct RotationState {
    descriptors: Arc<[DashboardDescriptor]>,
    current_index: usize,
    phase: RotationPhase,
    failures: HashMap<DashboardId, u32>,
}

impl RotationState {
    pub fn descriptors(&self) -> &[DashboardDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.descriptors.is_empty()).then_some(self.current_index)
    }

    pub fn current(&self) -> Option<&DashboardDescriptor> {
        self.descriptors.get(self.current_index)
    }

    pub fn phase(&self) -> RotationPhase {
        self.phase
    }

    pub fn position_of(&self, id: &DashboardId) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|descriptor| &descriptor.id == id)
    }

    /// Consecutive load failures recorded for `id`.
    pub fn failures_of(&self, id: &DashboardId) -> u32 {
        self.failures.get(id).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> RotationSnapshot {
        RotationSnapshot {
            descriptors: Arc::clone(&self.descriptors),
            current_index: self.current_index(),
            phase: self.phase,
            current_failures: self
                .current()
                .map(|descriptor| self.failures_of(&descriptor.id))
                .unwrap_or(0),
            page: 0,
        }
    }

    pub(crate) fn same_list(&self, other: &[DashboardDescriptor]) -> bool {
        *self.descriptors == *other
    }

    pub(crate) fn set_phase(&mut self, phase: RotationPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_current(&mut self, index: usize) {
        debug_assert!(index < self.descriptors.len());
        self.current_index = index;
    }

    /// Swaps in a new list. Failure counters survive only for dashboards that
    /// are still present.
    pub(crate) fn replace(
        &mut self,
        descriptors: Arc<[DashboardDescriptor]>,
        index: usize,
    ) {
        self.failures.retain(|id, _| {
            descriptors.iter().any(|descriptor| &descriptor.id == id)
        });
        self.current_index = index.min(descriptors.len().saturating_sub(1));
        self.descriptors = descriptors;
    }

    pub(crate) fn clear(&mut self) {
        self.descriptors = Arc::from(Vec::new());
        self.current_index = 0;
        self.failures.clear();
        self.phase = RotationPhase::Idle;
    }

    pub(crate) fn record_failure(&mut self, id: &DashboardId) -> u32 {
        let count = self.failures.entry(id.clone()).or_insert(0);
        *count += 1;
        *count
    }

    pub(crate) fn reset_failures(&mut self, id: &DashboardId) {
        self.failures.remove(id);
    }
}
