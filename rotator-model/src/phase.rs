use std::fmt;

/// Lifecycle phase of the rotation controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RotationPhase {
    /// No descriptors are loaded; nothing is displayed.
    #[default]
    Idle,
    /// Navigation requested, waiting for the render surface.
    Loading,
    /// Page loaded and the scroll plan is playing.
    Scrolling,
    /// Scroll finished; waiting out the remaining dwell time.
    Dwelling,
    /// Rotation suspended by the operator.
    Paused,
    /// The current dashboard failed to load and is waiting for a retry.
    Error,
}

impl RotationPhase {
    /// True while a dashboard is on screen or being brought on screen.
    pub fn is_displaying(self) -> bool {
        matches!(
            self,
            RotationPhase::Loading
                | RotationPhase::Scrolling
                | RotationPhase::Dwelling
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RotationPhase::Idle => "idle",
            RotationPhase::Loading => "loading",
            RotationPhase::Scrolling => "scrolling",
            RotationPhase::Dwelling => "dwelling",
            RotationPhase::Paused => "paused",
            RotationPhase::Error => "error",
        }
    }
}

impl fmt::Display for RotationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
