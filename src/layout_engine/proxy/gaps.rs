use crate::common::config::GapSettings;
use crate::layout_engine::{
    Direction, Edges, Engine, LayoutEngine, LayoutEngineIdentity, LayoutEngineKind, WindowState,
};
use crate::sys::geometry::{NormalizedPoint, Rect};
use crate::sys::screen::Monitor;
use crate::sys::window::WindowRef;

/// Leaves space around the layout and between windows.
#[derive(Clone, Debug)]
pub struct GapsEngine {
    gaps: GapSettings,
    inner: Engine,
}

impl GapsEngine {
    pub fn new(gaps: GapSettings, inner: Engine) -> Self { Self { gaps, inner } }

    pub fn inner(&self) -> &Engine { &self.inner }

    fn update_inner(&self, inner: Engine) -> Option<LayoutEngineKind> {
        if inner.ptr_eq(&self.inner) {
            return None;
        }
        Some(Self { inner, ..self.clone() }.into())
    }
}

impl LayoutEngine for GapsEngine {
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
        let outer = monitor.scale(self.gaps.outer_gap);
        let inner = monitor.scale(self.gaps.inner_gap);
        self.inner
            .do_layout(rect.shrink(outer), monitor)
            .into_iter()
            .map(|state| WindowState { rect: state.rect.shrink(inner), ..state })
            .collect()
    }

    fn window_focused(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.window_focused(window))
    }

    fn set_window_floating(&self, window: &WindowRef, floating: bool) -> Option<LayoutEngineKind> {
        self.update_inner(self.inner.set_window_floating(window, floating))
    }

    fn ascii_tree(&self) -> ascii_tree::Tree {
        let desc = format!("gaps outer={} inner={}", self.gaps.outer_gap, self.gaps.inner_gap);
        ascii_tree::Tree::Node(desc, vec![self.inner.ascii_tree()])
    }
}
