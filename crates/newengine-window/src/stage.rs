use std::fmt;

/// Visibility of a window. Ordered: `Paused < Inactive < Running`.
///
/// Frames are produced only at `Inactive` or above; dropping below `Inactive`
/// releases GPU resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Not visible. No frames.
    #[default]
    Paused,
    /// Visible but not focused / not interactive.
    Inactive,
    Running,
}

impl Stage {
    #[inline]
    pub fn is_visible(self) -> bool {
        self >= Stage::Inactive
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Paused => "paused",
            Stage::Inactive => "inactive",
            Stage::Running => "running",
        })
    }
}
