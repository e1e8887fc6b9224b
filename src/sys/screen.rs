use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use crate::model::WorkspaceId;

/// Snapshot of a display as reported by the windowing system.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub name: String,
    /// Usable area in desktop coordinates (excludes system docks and panels).
    pub working_area: Rect<i32>,
    /// DPI scaling in percent; 100 means unscaled.
    pub scale_factor: i32,
}

impl Monitor {
    pub fn new(name: impl Into<String>, working_area: Rect<i32>, scale_factor: i32) -> Self {
        Self {
            name: name.into(),
            working_area,
            scale_factor,
        }
    }

    /// Scales an unscaled pixel length by this monitor's scale factor,
    /// rounding toward zero.
    pub fn scale(&self, value: i32) -> i32 {
        (f64::from(value) * f64::from(self.scale_factor) / 100.0).floor() as i32
    }
}

/// Answers which monitor currently shows a workspace.
pub trait MonitorRouter {
    fn monitor_for_workspace(&self, workspace: WorkspaceId) -> Option<Monitor>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_floors() {
        let m = Monitor::new("DISPLAY", Rect::new(0, 0, 1920, 1080), 150);
        assert_eq!(m.scale(10), 15);
        assert_eq!(m.scale(5), 7);
        assert_eq!(m.scale(30), 45);
        let m = Monitor::new("DISPLAY", Rect::new(0, 0, 1920, 1080), 100);
        assert_eq!(m.scale(30), 30);
    }
}
