//! An in-memory windowing system. Backs the `lattice preview` command and
//! the test suite; records every call the layout core makes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;

use super::geometry::Rect;
use super::screen::{Monitor, MonitorRouter};
use super::window::{Icon, Window, WindowRef};
use super::window_server::WindowServer;
use crate::common::collections::HashMap;
use crate::layout_engine::WindowState;
use crate::model::WorkspaceId;

#[derive(Debug)]
pub struct HeadlessWindow {
    id: usize,
    title: String,
    focus_count: Cell<usize>,
    hidden: Cell<bool>,
    minimized: Cell<bool>,
    mouse_moving: Cell<bool>,
}

impl HeadlessWindow {
    pub fn new(id: usize, title: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id,
            title: title.into(),
            focus_count: Cell::new(0),
            hidden: Cell::new(false),
            minimized: Cell::new(false),
            mouse_moving: Cell::new(false),
        })
    }

    /// Creates a window together with the handle the layout core uses.
    pub fn spawn(id: usize) -> (Rc<Self>, WindowRef) {
        let window = Self::new(id, format!("window-{id}"));
        let handle = WindowRef::new(window.clone());
        (window, handle)
    }

    pub fn id(&self) -> usize { self.id }

    pub fn focus_count(&self) -> usize { self.focus_count.get() }

    pub fn is_hidden(&self) -> bool { self.hidden.get() }

    pub fn is_minimized(&self) -> bool { self.minimized.get() }

    pub fn set_mouse_moving(&self, moving: bool) { self.mouse_moving.set(moving); }
}

impl Window for HeadlessWindow {
    fn title(&self) -> String { self.title.clone() }

    fn focus(&self) {
        self.focus_count.set(self.focus_count.get() + 1);
        self.hidden.set(false);
    }

    fn hide(&self) { self.hidden.set(true); }

    fn show_minimized(&self) { self.minimized.set(true); }

    fn is_mouse_moving(&self) -> bool { self.mouse_moving.get() }

    fn icon(&self) -> Option<Icon> { None }
}

/// Window server and monitor router in one.
#[derive(Default)]
pub struct HeadlessDisplay {
    monitors: RefCell<HashMap<WorkspaceId, Monitor>>,
    frames: RefCell<HashMap<WindowRef, Rect<i32>>>,
    batches: RefCell<Vec<Vec<WindowState>>>,
}

impl HeadlessDisplay {
    pub fn new() -> Rc<Self> { Rc::new(Self::default()) }

    pub fn show_workspace(&self, workspace: WorkspaceId, monitor: Monitor) {
        self.monitors.borrow_mut().insert(workspace, monitor);
    }

    pub fn hide_workspace(&self, workspace: WorkspaceId) {
        self.monitors.borrow_mut().remove(&workspace);
    }

    /// Pretends the user moved a window by hand.
    pub fn set_frame(&self, window: &WindowRef, frame: Rect<i32>) {
        self.frames.borrow_mut().insert(window.clone(), frame);
    }

    pub fn batch_count(&self) -> usize { self.batches.borrow().len() }

    pub fn last_batch(&self) -> Vec<WindowState> {
        self.batches.borrow().last().cloned().unwrap_or_default()
    }
}

impl WindowServer for HeadlessDisplay {
    fn window_frame(&self, window: &WindowRef) -> Option<Rect<i32>> {
        self.frames.borrow().get(window).copied()
    }

    fn apply_positions(&self, states: Vec<WindowState>) {
        debug!(count = states.len(), "headless batch");
        let mut frames = self.frames.borrow_mut();
        for state in &states {
            frames.insert(state.window.clone(), state.rect);
        }
        self.batches.borrow_mut().push(states);
    }
}

impl MonitorRouter for HeadlessDisplay {
    fn monitor_for_workspace(&self, workspace: WorkspaceId) -> Option<Monitor> {
        self.monitors.borrow().get(&workspace).cloned()
    }
}
