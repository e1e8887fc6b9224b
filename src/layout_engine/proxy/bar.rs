use crate::common::config::BarSettings;
use crate::layout_engine::{
    Direction, Edges, Engine, LayoutEngine, LayoutEngineIdentity, LayoutEngineKind, WindowState,
};
use crate::sys::geometry::{NormalizedPoint, Rect};
use crate::sys::screen::Monitor;
use crate::sys::window::WindowRef;

/// Reserves a strip at the top of the layout for a status bar.
#[derive(Clone, Debug)]
pub struct BarEngine {
    bar: BarSettings,
    inner: Engine,
}

impl BarEngine {
    pub fn new(bar: BarSettings, inner: Engine) -> Self { Self { bar, inner } }

    pub fn inner(&self) -> &Engine { &self.inner }

    fn update_inner(&self, inner: Engine) -> Option<LayoutEngineKind> {
        if inner.ptr_eq(&self.inner) {
            return None;
        }
        Some(Self { inner, ..self.clone() }.into())
    }
}

impl LayoutEngine for BarEngine {
    fn name(&self) -> &str { self.inner.name() }

    fn identity(&self) -> LayoutEngineIdentity { self.inner.identity() }

    fn count(&self) -> usize { self.inner.count() }

    fn contains_window(&self, window: &WindowRef) -> bool { self.inner.contains_window(window) }

    fn windows(&self) -> Vec<WindowRef> { self.inner.windows() }

    fn get_first_window(&self) -> Option<WindowRef> { self.inner.get_first_window() }

    fn add_window(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.add_window(window))
    }

    fn remove_window(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.remove_window(window))
    }

    fn move_window_to_point(
        &self,
        window: &WindowRef,
        point: NormalizedPoint,
    ) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.move_window_to_point(window, point))
    }

    fn move_window_edges_in_direction(
        &self,
        edges: Edges,
        deltas: NormalizedPoint,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.move_window_edges_in_direction(edges, deltas, window))
    }

    fn swap_window_in_direction(
        &self,
        direction: Direction,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.swap_window_in_direction(direction, window))
    }

    fn focus_window_in_direction(&self, direction: Direction, window: &WindowRef) {
        self.inner.focus_window_in_direction(direction, window)
    }

    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowState> {
        let height = monitor.scale(self.bar.height);
        let below_bar = Rect::new(rect.x, rect.y + height, rect.width, rect.height - height);
        self.inner.do_layout(below_bar, monitor)
    }

    fn window_focused(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.window_focused(window))
    }

    fn set_window_floating(&self, window: &WindowRef, floating: bool) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.set_window_floating(window, floating))
    }

    fn ascii_tree(&self) -> ascii_tree::Tree {
        ascii_tree::Tree::Node(format!("bar height={}", self.bar.height), vec![
            self.inner.ascii_tree(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::systems::ColumnEngine;
    use crate::sys::headless::HeadlessWindow;

    fn bar_over_column(height: i32, windows: &[WindowRef]) -> Engine {
        let inner = windows
            .iter()
            .fold(Engine::new(ColumnEngine::new("Column", true)), |e, w| e.add_window(w));
        Engine::new(BarEngine::new(BarSettings { height }, inner))
    }

    #[test]
    fn reserves_space_at_the_top() {
        let (_w, window) = HeadlessWindow::spawn(0);
        let engine = bar_over_column(30, &[window]);
        let monitor = Monitor::new("test", Rect::new(0, 0, 100, 100), 100);
        let states = engine.do_layout(Rect::new(0, 0, 100, 100), &monitor);
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].rect, Rect::new(0, 30, 100, 70));
    }

    #[test]
    fn height_scales_with_the_monitor() {
        let (_w, window) = HeadlessWindow::spawn(0);
        let engine = bar_over_column(30, &[window]);
        let monitor = Monitor::new("test", Rect::new(0, 0, 1920, 1080), 150);
        let states = engine.do_layout(Rect::new(0, 0, 1920, 1080), &monitor);
        assert_eq!(states[0].rect, Rect::new(0, 45, 1920, 1035));
    }

    #[test]
    fn unchanged_inner_keeps_the_proxy() {
        let (_w, window) = HeadlessWindow::spawn(0);
        let engine = bar_over_column(30, &[window.clone()]);
        assert!(engine.add_window(&window).ptr_eq(&engine));
        assert!(engine.swap_window_in_direction(Direction::Left, &window).ptr_eq(&engine));
        let removed = engine.remove_window(&window);
        assert!(!removed.ptr_eq(&engine));
        assert_eq!(removed.count(), 0);
    }
}
