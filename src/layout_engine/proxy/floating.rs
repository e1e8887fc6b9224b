use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::common::collections::HashSet;
use crate::layout_engine::{
    Direction, Edges, Engine, LayoutEngine, LayoutEngineIdentity, LayoutEngineKind, WindowState,
};
use crate::sys::geometry::{NormalizedPoint, Rect};
use crate::sys::screen::Monitor;
use crate::sys::window::WindowRef;
use crate::sys::window_server::WindowServer;

/// Lets chosen windows escape tiling. A floating window keeps whatever frame
/// the user gave it and never reaches the inner engine.
#[derive(Clone)]
pub struct FloatingEngine {
    inner: Engine,
    floating: Rc<HashSet<WindowRef>>,
    server: Rc<dyn WindowServer>,
}

impl fmt::Debug for FloatingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingEngine")
            .field("inner", &self.inner)
            .field("floating", &self.floating)
            .finish_non_exhaustive()
    }
}

impl FloatingEngine {
    pub fn new(server: Rc<dyn WindowServer>, inner: Engine) -> Self {
        Self {
            inner,
            floating: Rc::default(),
            server,
        }
    }

    pub fn inner(&self) -> &Engine { &self.inner }

    pub fn is_floating(&self, window: &WindowRef) -> bool { self.floating.contains(window) }

    fn update_inner(&self, inner: Engine) -> Option<LayoutEngineKind> {
        if inner.ptr_eq(&self.inner) {
            return None;
        }
        Some(Self { inner, ..self.clone() }.into())
    }

    fn with_floating(&self, inner: Engine, update: impl FnOnce(&mut HashSet<WindowRef>)) -> Self {
        let mut floating = self.floating.clone();
        update(Rc::make_mut(&mut floating));
        Self {
            inner,
            floating,
            server: self.server.clone(),
        }
    }

    /// Where a floating window currently is, relative to the monitor.
    fn floating_state(&self, window: &WindowRef, monitor: &Monitor) -> Option<WindowState> {
        let area = monitor.working_area;
        let Some(frame) = self.server.window_frame(window) else {
            debug!(%window, "floating window has no known frame");
            return None;
        };
        let Some(visible) = frame.intersect(&area) else {
            debug!(%window, ?frame, "floating window is off this monitor");
            return None;
        };
        Some(WindowState::normal(window.clone(), visible.translate(-area.x, -area.y)))
    }
}

impl LayoutEngine for FloatingEngine {
    fn name(&self) -> &str { self.inner.name() }

    fn identity(&self) -> LayoutEngineIdentity { self.inner.identity() }

    fn count(&self) -> usize { self.inner.count() + self.floating.len() }

    fn contains_window(&self, window: &WindowRef) -> bool {
        self.is_floating(window) || self.inner.contains_window(window)
    }

    fn windows(&self) -> Vec<WindowRef> {
        let mut windows = self.inner.windows();
        windows.extend(self.floating.iter().cloned());
        windows
    }

    fn get_first_window(&self) -> Option<WindowRef> {
        self.inner.get_first_window().or_else(|| self.floating.iter().next().cloned())
    }

    fn add_window(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        if self.is_floating(window) {
            return None;
        }
        self.update_inner(self.inner.add_window(window))
    }

    fn remove_window(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        if self.is_floating(window) {
            let next = self.with_floating(self.inner.clone(), |set| {
                set.remove(window);
            });
            return Some(next.into());
        }
        self.update_inner(self.inner.remove_window(window))
    }

    fn move_window_to_point(
        &self,
        window: &WindowRef,
        point: NormalizedPoint,
    ) -> Option<LayoutEngineKind> {
        if self.is_floating(window) {
            return None;
        }
        self.update_inner(self.inner.move_window_to_point(window, point))
    }

    fn move_window_edges_in_direction(
        &self,
        edges: Edges,
        deltas: NormalizedPoint,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind> {
        if self.is_floating(window) {
            return None;
        }
        self.update_inner(self.inner.move_window_edges_in_direction(edges, deltas, window))
    }

    fn swap_window_in_direction(
        &self,
        direction: Direction,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind> {
        if self.is_floating(window) {
            return None;
        }
        self.update_inner(self.inner.swap_window_in_direction(direction, window))
    }

    fn focus_window_in_direction(&self, direction: Direction, window: &WindowRef) {
        if self.is_floating(window) {
            debug!(%window, "directional focus from a floating window");
            return;
        }
        self.inner.focus_window_in_direction(direction, window)
    }

    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowState> {
        let mut states = self.inner.do_layout(rect, monitor);
        states.extend(self.floating.iter().filter_map(|w| self.floating_state(w, monitor)));
        states
    }

    fn window_focused(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        if self.is_floating(window) {
            return None;
        }
        self.update_inner(self.inner.window_focused(window))
    }

    fn set_window_floating(&self, window: &WindowRef, floating: bool) -> Option<LayoutEngineKind> {
        if floating == self.is_floating(window) {
            return None;
        }
        let next = if floating {
            if !self.inner.contains_window(window) {
                debug!(%window, "cannot float a window this engine does not hold");
                return None;
            }
            self.with_floating(self.inner.remove_window(window), |set| {
                set.insert(window.clone());
            })
        } else {
            self.with_floating(self.inner.add_window(window), |set| {
                set.remove(window);
            })
        };
        Some(next.into())
    }

    fn ascii_tree(&self) -> ascii_tree::Tree {
        let floating: Vec<_> = self.floating.iter().map(ToString::to_string).collect();
        let mut children = vec![self.inner.ascii_tree()];
        if !floating.is_empty() {
            children.push(ascii_tree::Tree::Leaf(floating));
        }
        ascii_tree::Tree::Node("floating".to_string(), children)
    }
}
