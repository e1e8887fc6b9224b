use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use super::proxy::{BarEngine, FloatingEngine, GapsEngine};
use super::systems::{ColumnEngine, TreeEngine};
use super::{Direction, Edges};
use crate::sys::geometry::{NormalizedPoint, Rect};
use crate::sys::screen::Monitor;
use crate::sys::window::WindowRef;

/// Token shared by every successive value of one slot in a workspace's
/// engine rotation, and by every proxy wrapped around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutEngineIdentity(u64);

impl LayoutEngineIdentity {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for LayoutEngineIdentity {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for LayoutEngineIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "engine#{}", self.0) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSize {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

/// Where a window should be and in what state, as produced by one layout
/// pass.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowState {
    pub window: WindowRef,
    pub rect: Rect<i32>,
    pub size: WindowSize,
}

impl WindowState {
    pub fn normal(window: WindowRef, rect: Rect<i32>) -> Self {
        Self { window, rect, size: WindowSize::Normal }
    }
}

/// Operations shared by every layout engine.
///
/// Values are never mutated. Each updating operation returns `None` when
/// nothing changed, or the successor value. [`Engine`] turns this into the
/// "same handle means no-op" contract callers rely on.
#[enum_dispatch]
pub trait LayoutEngine {
    fn name(&self) -> &str;
    fn identity(&self) -> LayoutEngineIdentity;
    fn count(&self) -> usize;
    fn contains_window(&self, window: &WindowRef) -> bool;
    /// All windows in layout order.
    fn windows(&self) -> Vec<WindowRef>;
    fn get_first_window(&self) -> Option<WindowRef>;

    fn add_window(&self, window: &WindowRef) -> Option<LayoutEngineKind>;
    fn remove_window(&self, window: &WindowRef) -> Option<LayoutEngineKind>;
    fn move_window_to_point(
        &self,
        window: &WindowRef,
        point: NormalizedPoint,
    ) -> Option<LayoutEngineKind>;
    /// `deltas` are measured in the unit square of the whole layout.
    fn move_window_edges_in_direction(
        &self,
        edges: Edges,
        deltas: NormalizedPoint,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind>;
    fn swap_window_in_direction(
        &self,
        direction: Direction,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind>;
    fn focus_window_in_direction(&self, direction: Direction, window: &WindowRef);

    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowState>;

    /// Focus bookkeeping. Never changes geometry.
    fn window_focused(&self, _window: &WindowRef) -> Option<LayoutEngineKind> { None }

    fn set_window_floating(&self, _window: &WindowRef, _floating: bool) -> Option<LayoutEngineKind> {
        None
    }

    fn ascii_tree(&self) -> ascii_tree::Tree;
}

#[enum_dispatch(LayoutEngine)]
#[derive(Clone, Debug)]
pub enum LayoutEngineKind {
    Column(ColumnEngine),
    Tree(TreeEngine),
    Gaps(GapsEngine),
    Bar(BarEngine),
    Floating(FloatingEngine),
}

/// Immutable, cheaply clonable handle to a layout engine value.
#[derive(Clone, Debug)]
pub struct Engine(Rc<LayoutEngineKind>);

impl Engine {
    pub fn new(kind: impl Into<LayoutEngineKind>) -> Self { Self(Rc::new(kind.into())) }

    /// Whether both handles point at the same value. Two handles for the
    /// same rotation slot may differ here yet share an identity.
    pub fn ptr_eq(&self, other: &Engine) -> bool { Rc::ptr_eq(&self.0, &other.0) }

    pub fn kind(&self) -> &LayoutEngineKind { &self.0 }

    fn update(&self, next: Option<LayoutEngineKind>) -> Engine {
        match next {
            Some(kind) => Engine::new(kind),
            None => self.clone(),
        }
    }

    pub fn add_window(&self, window: &WindowRef) -> Engine {
        self.update(self.0.add_window(window))
    }

    pub fn remove_window(&self, window: &WindowRef) -> Engine {
        self.update(self.0.remove_window(window))
    }

    pub fn move_window_to_point(&self, window: &WindowRef, point: NormalizedPoint) -> Engine {
        self.update(self.0.move_window_to_point(window, point))
    }

    pub fn move_window_edges_in_direction(
        &self,
        edges: Edges,
        deltas: NormalizedPoint,
        window: &WindowRef,
    ) -> Engine {
        self.update(self.0.move_window_edges_in_direction(edges, deltas, window))
    }

    pub fn swap_window_in_direction(&self, direction: Direction, window: &WindowRef) -> Engine {
        self.update(self.0.swap_window_in_direction(direction, window))
    }

    pub fn window_focused(&self, window: &WindowRef) -> Engine {
        self.update(self.0.window_focused(window))
    }

    pub fn set_window_floating(&self, window: &WindowRef, floating: bool) -> Engine {
        self.update(self.0.set_window_floating(window, floating))
    }

    pub fn draw_tree(&self) -> String {
        let mut out = String::new();
        if ascii_tree::write_tree(&mut out, &self.0.ascii_tree()).is_err() {
            return format!("{} <unrenderable>", self.0.name());
        }
        out
    }
}

impl std::ops::Deref for Engine {
    type Target = LayoutEngineKind;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl From<LayoutEngineKind> for Engine {
    fn from(kind: LayoutEngineKind) -> Self { Engine(Rc::new(kind)) }
}
