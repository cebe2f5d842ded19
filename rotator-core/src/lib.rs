//! Rotation controller for unattended wall displays.
//!
//! The crate is split along the seams of the rotation pipeline:
//!
//! - [`config_source`] fetches and validates the dashboard list.
//! - [`scroll`] turns a page height into a timed sequence of scroll offsets.
//! - [`surface`] is the boundary to whatever actually renders pages.
//! - [`controller`] is the synchronous state machine deciding what to show,
//!   when to retry, and when to advance.
//! - [`runtime`] drives the controller on tokio: one mailbox, cancellable
//!   timers, generation-tagged async completions.
//! - [`position`] remembers the rotation position across restarts.

pub mod config_source;
pub mod controller;
pub mod error;
pub mod position;
pub mod runtime;
pub mod scroll;
pub mod settings;
pub mod surface;

pub use config_source::{
    ConfigSource, FileConfigSource, HttpConfigSource, config_source_for,
};
pub use controller::{
    ControllerEvent, Effect, NavigationTicket, RotationController,
    RotationState, TimerKind,
};
pub use error::{
    ConfigError, InternalError, NavigationError, PositionStoreError, Result,
    RotatorError,
};
pub use position::{FilePositionStore, PositionStore};
pub use rotator_model::{
    DashboardDescriptor, DashboardId, RotationPhase, RotationSnapshot,
};
pub use runtime::{RotationHandle, RotationRuntime};
pub use scroll::{EasingKind, ScrollDriver, ScrollPlan, ScrollTick};
pub use settings::{RotationSettings, ScrollSettings};
pub use surface::{PageMetrics, RenderSurface};
