use tracing::{debug, trace};

use crate::layout_engine::{
    Direction, Edges, LayoutEngine, LayoutEngineIdentity, LayoutEngineKind, WindowState,
};
use crate::sys::geometry::{NormalizedPoint, Rect};
use crate::sys::screen::Monitor;
use crate::sys::window::WindowRef;

/// Lays windows out side by side in equal-width columns.
#[derive(Clone, Debug)]
pub struct ColumnEngine {
    name: String,
    identity: LayoutEngineIdentity,
    left_to_right: bool,
    windows: Vec<WindowRef>,
}

impl ColumnEngine {
    pub fn new(name: impl Into<String>, left_to_right: bool) -> Self {
        Self {
            name: name.into(),
            identity: LayoutEngineIdentity::new(),
            left_to_right,
            windows: Vec::new(),
        }
    }

    pub fn left_to_right(&self) -> bool { self.left_to_right }

    fn with_windows(&self, windows: Vec<WindowRef>) -> Option<LayoutEngineKind> {
        Some(
            Self {
                windows,
                ..self.clone()
            }
            .into(),
        )
    }

    fn index_of(&self, window: &WindowRef) -> Option<usize> {
        self.windows.iter().position(|w| w == window)
    }

    /// Sequence index of the neighbour of `index` in `direction`, wrapping
    /// around at both ends.
    fn neighbour(&self, index: usize, direction: Direction) -> Option<usize> {
        let n = self.windows.len();
        let forward = match (direction, self.left_to_right) {
            (Direction::Right, true) | (Direction::Left, false) => true,
            (Direction::Left, true) | (Direction::Right, false) => false,
            (Direction::Up | Direction::Down, _) => return None,
        };
        Some(if forward { (index + 1) % n } else { (index + n - 1) % n })
    }
}

impl LayoutEngine for ColumnEngine {
    fn name(&self) -> &str { &self.name }

    fn identity(&self) -> LayoutEngineIdentity { self.identity }

    fn count(&self) -> usize { self.windows.len() }

    fn contains_window(&self, window: &WindowRef) -> bool { self.windows.contains(window) }

    fn windows(&self) -> Vec<WindowRef> { self.windows.clone() }

    fn get_first_window(&self) -> Option<WindowRef> { self.windows.first().cloned() }

    fn add_window(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        if self.contains_window(window) {
            return None;
        }
        let mut windows = self.windows.clone();
        windows.push(window.clone());
        self.with_windows(windows)
    }

    fn remove_window(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        let index = self.index_of(window)?;
        let mut windows = self.windows.clone();
        windows.remove(index);
        self.with_windows(windows)
    }

    fn move_window_to_point(
        &self,
        window: &WindowRef,
        point: NormalizedPoint,
    ) -> Option<LayoutEngineKind> {
        let mut windows = self.windows.clone();
        windows.retain(|w| w != window);

        let count = windows.len();
        let slot = (point.x * count as f64).round();
        let slot = if slot.is_nan() { 0 } else { slot.clamp(0.0, count as f64) as usize };
        let index = if self.left_to_right { slot } else { count - slot };
        trace!(%window, index, "column insertion slot");

        windows.insert(index, window.clone());
        if windows == self.windows {
            return None;
        }
        self.with_windows(windows)
    }

    fn move_window_edges_in_direction(
        &self,
        _edges: Edges,
        _deltas: NormalizedPoint,
        _window: &WindowRef,
    ) -> Option<LayoutEngineKind> {
        None
    }

    fn swap_window_in_direction(
        &self,
        direction: Direction,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind> {
        let index = self.index_of(window)?;
        if self.windows.len() < 2 {
            return None;
        }
        let other = self.neighbour(index, direction)?;
        let mut windows = self.windows.clone();
        windows.swap(index, other);
        self.with_windows(windows)
    }

    fn focus_window_in_direction(&self, direction: Direction, window: &WindowRef) {
        let Some(index) = self.index_of(window) else {
            debug!(%window, "window not in column layout");
            return;
        };
        if let Some(other) = self.neighbour(index, direction) {
            self.windows[other].focus();
        }
    }

    fn do_layout(&self, rect: Rect<i32>, _monitor: &Monitor) -> Vec<WindowState> {
        let n = self.windows.len();
        if n == 0 {
            return Vec::new();
        }
        let n_i32 = n as i32;
        let base = rect.width / n_i32;
        let remainder = rect.width - base * n_i32;

        self.windows
            .iter()
            .enumerate()
            .map(|(i, window)| {
                let slot = (if self.left_to_right { i } else { n - 1 - i }) as i32;
                let width = if slot == n_i32 - 1 { base + remainder } else { base };
                WindowState::normal(
                    window.clone(),
                    Rect::new(rect.x + slot * base, rect.y, width, rect.height),
                )
            })
            .collect()
    }

    fn ascii_tree(&self) -> ascii_tree::Tree {
        let arrow = if self.left_to_right { "→" } else { "←" };
        let leaves =
            self.windows.iter().map(|w| ascii_tree::Tree::Leaf(vec![w.to_string()])).collect();
        ascii_tree::Tree::Node(format!("{} {arrow}", self.name), leaves)
    }
}
