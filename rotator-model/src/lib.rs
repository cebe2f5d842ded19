//! Core data model definitions shared across the rotator crates.
#![allow(missing_docs)]

pub mod descriptor;
pub mod ids;
pub mod phase;
pub mod snapshot;

// Intentionally curated re-exports for downstream consumers.
pub use descriptor::DashboardDescriptor;
pub use ids::DashboardId;
pub use phase::RotationPhase;
pub use snapshot::RotationSnapshot;
pub use url::Url;
