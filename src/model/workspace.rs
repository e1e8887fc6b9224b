use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, instrument, trace, warn};

use crate::actor::broadcast::{BroadcastEvent, BroadcastSender};
use crate::common::collections::{HashMap, HashSet};
use crate::layout_engine::{
    Direction, Edges, Engine, LayoutEngine, LayoutEngineIdentity, LayoutEngineKind,
    ProxyLayoutEngine, WindowState,
};
use crate::sys::geometry::{NormalizedPoint, Rect};
use crate::sys::screen::MonitorRouter;
use crate::sys::window::WindowRef;
use crate::sys::window_server::{PositionBatch, WindowServer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(u64);

impl WorkspaceId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for WorkspaceId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "workspace#{}", self.0) }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("workspace '{0}' needs at least one layout engine")]
    NoLayoutEngines(String),
}

/// The collaborators a workspace talks to.
#[derive(Clone)]
pub struct WorkspaceContext {
    pub window_server: Rc<dyn WindowServer>,
    pub router: Rc<dyn MonitorRouter>,
    pub events: Option<BroadcastSender>,
}

/// A named set of windows and the rotation of layout engines that arrange
/// them.
///
/// Regular windows are known to every engine in the rotation. Phantom
/// windows belong to a single engine and are only shown while that engine is
/// active.
pub struct Workspace {
    id: WorkspaceId,
    name: String,
    ctx: WorkspaceContext,
    layout_engines: Vec<Engine>,
    active: usize,
    windows: HashSet<WindowRef>,
    phantom_windows: HashMap<WindowRef, LayoutEngineIdentity>,
    window_locations: HashMap<WindowRef, WindowState>,
    last_focused_window: Option<WindowRef>,
    disposed: bool,
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active_layout_engine().name())
            .field("windows", &self.windows.len())
            .field("phantom_windows", &self.phantom_windows.len())
            .finish_non_exhaustive()
    }
}

impl Workspace {
    pub fn new(
        ctx: WorkspaceContext,
        name: impl Into<String>,
        layout_engines: Vec<Engine>,
    ) -> Result<Self, WorkspaceError> {
        let name = name.into();
        if layout_engines.is_empty() {
            return Err(WorkspaceError::NoLayoutEngines(name));
        }
        Ok(Self {
            id: WorkspaceId::new(),
            name,
            ctx,
            layout_engines,
            active: 0,
            windows: HashSet::default(),
            phantom_windows: HashMap::default(),
            window_locations: HashMap::default(),
            last_focused_window: None,
            disposed: false,
        })
    }

    /// Wraps every engine in the rotation with each proxy, first proxy
    /// innermost.
    pub fn initialize(&mut self, proxies: &[ProxyLayoutEngine]) {
        for proxy in proxies {
            for engine in &mut self.layout_engines {
                *engine = proxy(engine.clone());
            }
        }
    }

    pub fn id(&self) -> WorkspaceId { self.id }

    pub fn name(&self) -> &str { &self.name }

    pub fn rename(&mut self, name: impl Into<String>) {
        let old_name = std::mem::replace(&mut self.name, name.into());
        debug!(%old_name, new_name = %self.name, "renamed workspace");
        self.broadcast(BroadcastEvent::WorkspaceRenamed {
            workspace_id: self.id,
            old_name,
            new_name: self.name.clone(),
        });
    }

    pub fn active_layout_engine(&self) -> &Engine { &self.layout_engines[self.active] }

    pub fn layout_engines(&self) -> &[Engine] { &self.layout_engines }

    pub fn last_focused_window(&self) -> Option<&WindowRef> { self.last_focused_window.as_ref() }

    /// Regular windows only. Phantom windows are never listed.
    pub fn windows(&self) -> impl Iterator<Item = &WindowRef> { self.windows.iter() }

    pub fn is_disposed(&self) -> bool { self.disposed }

    pub fn contains_window(&self, window: &WindowRef) -> bool {
        self.windows.contains(window) || self.is_active_phantom(window)
    }

    pub fn try_get_window_location(&self, window: &WindowRef) -> Option<&WindowState> {
        self.window_locations.get(window)
    }

    /// Whether the active engine currently lets `window` float.
    pub fn is_window_floating(&self, window: &WindowRef) -> bool {
        match self.active_layout_engine().kind() {
            LayoutEngineKind::Floating(floating) => floating.is_floating(window),
            _ => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn replace_layout_engine(&mut self, index: usize, engine: Engine) {
        self.layout_engines[index] = engine;
    }

    fn is_active_phantom(&self, window: &WindowRef) -> bool {
        self.phantom_windows.get(window) == Some(&self.active_layout_engine().identity())
    }

    fn broadcast(&self, event: BroadcastEvent) {
        if let Some(events) = &self.ctx.events {
            events.send(event);
        }
    }

    /// Called for every focus change on the desktop, whether or not the
    /// window belongs here.
    #[instrument(skip_all, fields(workspace = %self.name, %window))]
    pub fn window_focused(&mut self, window: &WindowRef) {
        if self.windows.contains(window) {
            for engine in &mut self.layout_engines {
                *engine = engine.window_focused(window);
            }
        } else if self.is_active_phantom(window) {
            let active = &mut self.layout_engines[self.active];
            *active = active.window_focused(window);
        } else {
            return;
        }
        debug!("focused window");
        self.last_focused_window = Some(window.clone());
    }

    #[instrument(skip_all, fields(workspace = %self.name))]
    pub fn focus_first_window(&self) {
        match self.active_layout_engine().get_first_window() {
            Some(window) => window.focus(),
            None => debug!("no window to focus"),
        }
    }

    #[instrument(skip_all, fields(workspace = %self.name))]
    pub fn next_layout_engine(&mut self) {
        let next = (self.active + 1) % self.layout_engines.len();
        self.switch_layout_engine(next);
    }

    #[instrument(skip_all, fields(workspace = %self.name))]
    pub fn previous_layout_engine(&mut self) {
        let len = self.layout_engines.len();
        let previous = (self.active + len - 1) % len;
        self.switch_layout_engine(previous);
    }

    /// Activates the engine called `name`. Returns false when there is no
    /// such engine.
    #[instrument(skip_all, fields(workspace = %self.name, engine = name))]
    pub fn try_set_layout_engine(&mut self, name: &str) -> bool {
        let Some(index) = self.layout_engines.iter().position(|e| e.name() == name) else {
            error!("layout engine not found");
            return false;
        };
        if index == self.active {
            debug!("layout engine already active");
            return true;
        }
        self.switch_layout_engine(index);
        true
    }

    fn switch_layout_engine(&mut self, index: usize) {
        let previous = self.active;
        if index == previous {
            debug!("only one layout engine in rotation");
            return;
        }
        self.active = index;

        if self.last_focused_window.as_ref().is_some_and(|w| self.phantom_windows.contains_key(w)) {
            self.last_focused_window = None;
        }

        let outgoing = self.layout_engines[previous].identity();
        for (window, owner) in &self.phantom_windows {
            if *owner == outgoing {
                window.hide();
            }
        }

        let previous_name = self.layout_engines[previous].name().to_string();
        let current_name = self.active_layout_engine().name().to_string();
        debug!(previous = %previous_name, current = %current_name, "switched layout engine");
        self.broadcast(BroadcastEvent::ActiveLayoutEngineChanged {
            workspace_id: self.id,
            previous: previous_name,
            current: current_name,
        });

        self.do_layout();
    }

    #[instrument(skip_all, fields(workspace = %self.name, %window))]
    pub fn add_window(&mut self, window: &WindowRef) {
        if self.phantom_windows.contains_key(window) {
            debug!("window is already a phantom window here");
            return;
        }
        if !self.windows.insert(window.clone()) {
            error!("window already in workspace");
            return;
        }
        for engine in &mut self.layout_engines {
            *engine = engine.add_window(window);
        }
        self.do_layout();
        window.focus();
    }

    /// Returns true only if every engine that should hold the window let go
    /// of it.
    #[instrument(skip_all, fields(workspace = %self.name, %window))]
    pub fn remove_window(&mut self, window: &WindowRef) -> bool {
        if self.last_focused_window.as_ref() == Some(window) {
            self.last_focused_window = None;
        }

        if let Some(&owner) = self.phantom_windows.get(window) {
            return self.remove_phantom_from_owner(window, owner);
        }

        if !self.windows.contains(window) {
            error!("window not in workspace");
            return false;
        }

        let mut success = true;
        for engine in &mut self.layout_engines {
            let next = engine.remove_window(window);
            if next.ptr_eq(engine) {
                error!(engine = engine.name(), "layout engine could not remove window");
                success = false;
            } else {
                *engine = next;
            }
        }

        if success {
            self.windows.remove(window);
            self.do_layout();
        }
        success
    }

    fn remove_phantom_from_owner(&mut self, window: &WindowRef, owner: LayoutEngineIdentity) -> bool {
        let Some(engine) = self.layout_engines.iter_mut().find(|e| e.identity() == owner) else {
            error!(%owner, "phantom window owner is not in the rotation");
            return false;
        };
        let next = engine.remove_window(window);
        if next.ptr_eq(engine) {
            error!(%owner, "owner could not remove phantom window");
            return false;
        }
        *engine = next;
        self.phantom_windows.remove(window);
        self.broadcast(BroadcastEvent::PhantomWindowRemoved {
            workspace_id: self.id,
            engine: owner,
            window: window.to_string(),
        });
        self.do_layout();
        true
    }

    /// The window to act on: `window` if given, else the last focused one.
    fn target_window(&self, window: Option<&WindowRef>) -> Option<WindowRef> {
        let Some(window) = window.or(self.last_focused_window.as_ref()) else {
            error!("no window to act on");
            return None;
        };
        if !self.contains_window(window) {
            error!(%window, "window not in workspace");
            return None;
        }
        Some(window.clone())
    }

    /// Replaces the active engine and relayouts, if anything changed.
    fn update_active(&mut self, next: Engine) {
        if next.ptr_eq(self.active_layout_engine()) {
            trace!("layout engine unchanged");
            return;
        }
        self.layout_engines[self.active] = next;
        self.do_layout();
    }

    #[instrument(skip_all, fields(workspace = %self.name, %direction))]
    pub fn focus_window_in_direction(&self, direction: Direction, window: Option<&WindowRef>) {
        if let Some(window) = self.target_window(window) {
            self.active_layout_engine().focus_window_in_direction(direction, &window);
        }
    }

    #[instrument(skip_all, fields(workspace = %self.name, %direction))]
    pub fn swap_window_in_direction(&mut self, direction: Direction, window: Option<&WindowRef>) {
        if let Some(window) = self.target_window(window) {
            let next = self.active_layout_engine().swap_window_in_direction(direction, &window);
            self.update_active(next);
        }
    }

    #[instrument(skip_all, fields(workspace = %self.name, ?edges, ?deltas))]
    pub fn move_window_edges_in_direction(
        &mut self,
        edges: Edges,
        deltas: NormalizedPoint,
        window: Option<&WindowRef>,
    ) {
        if let Some(window) = self.target_window(window) {
            let next =
                self.active_layout_engine().move_window_edges_in_direction(edges, deltas, &window);
            self.update_active(next);
        }
    }

    /// Puts `window` where the user dropped it, adding it if it is new.
    #[instrument(skip_all, fields(workspace = %self.name, %window, ?point))]
    pub fn move_window_to_point(&mut self, window: &WindowRef, point: NormalizedPoint) {
        if self.phantom_windows.contains_key(window) {
            error!("phantom windows cannot be moved by point");
            return;
        }
        self.windows.insert(window.clone());
        for engine in &mut self.layout_engines {
            *engine = engine.move_window_to_point(window, point);
        }
        self.do_layout();
    }

    #[instrument(skip_all, fields(workspace = %self.name, %window, floating))]
    pub fn set_window_floating(&mut self, window: &WindowRef, floating: bool) {
        if !self.windows.contains(window) {
            warn!("only regular windows can float");
            return;
        }
        let mut changed = false;
        for engine in &mut self.layout_engines {
            let next = engine.set_window_floating(window, floating);
            changed |= !next.ptr_eq(engine);
            *engine = next;
        }
        if changed {
            self.do_layout();
        } else {
            debug!("no layout engine handles floating windows");
        }
    }

    /// Registers a window owned by the engine with identity `engine`, which
    /// must be the active one.
    #[instrument(skip_all, fields(workspace = %self.name, %engine, %window))]
    pub fn add_phantom_window(&mut self, engine: LayoutEngineIdentity, window: &WindowRef) {
        if self.active_layout_engine().identity() != engine {
            error!("layout engine is not active");
            return;
        }
        if self.phantom_windows.contains_key(window) || self.windows.contains(window) {
            error!("window already in workspace");
            return;
        }
        let active = &mut self.layout_engines[self.active];
        *active = active.add_window(window);
        self.phantom_windows.insert(window.clone(), engine);
        self.broadcast(BroadcastEvent::PhantomWindowAdded {
            workspace_id: self.id,
            engine,
            window: window.to_string(),
        });
        self.do_layout();
    }

    #[instrument(skip_all, fields(workspace = %self.name, %engine, %window))]
    pub fn remove_phantom_window(&mut self, engine: LayoutEngineIdentity, window: &WindowRef) {
        if self.active_layout_engine().identity() != engine {
            error!("layout engine is not active");
            return;
        }
        match self.phantom_windows.get(window) {
            None => error!("phantom window not in workspace"),
            Some(owner) if *owner != engine => error!(%owner, "phantom window has another owner"),
            Some(_) => {
                if self.last_focused_window.as_ref() == Some(window) {
                    self.last_focused_window = None;
                }
                self.remove_phantom_from_owner(window, engine);
            }
        }
    }

    /// Hides every window, for when another workspace takes over the monitor.
    #[instrument(skip_all, fields(workspace = %self.name))]
    pub fn deactivate(&mut self) {
        for window in self.windows.iter().chain(self.phantom_windows.keys()) {
            window.hide();
        }
        self.window_locations.clear();
    }

    /// Leaves windows visible to the user. Safe to call more than once.
    #[instrument(skip_all, fields(workspace = %self.name))]
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if self.ctx.router.monitor_for_workspace(self.id).is_none() {
            for window in &self.windows {
                window.show_minimized();
            }
        }
        self.disposed = true;
    }

    /// Lays out the active engine on this workspace's monitor and moves the
    /// windows there in one batch.
    #[instrument(skip_all, fields(workspace = %self.name))]
    pub fn do_layout(&mut self) {
        let Some(monitor) = self.ctx.router.monitor_for_workspace(self.id) else {
            debug!("workspace not on any monitor");
            return;
        };
        self.window_locations.clear();
        self.broadcast(BroadcastEvent::WorkspaceLayoutStarted { workspace_id: self.id });

        let area = monitor.working_area;
        let engine = self.active_layout_engine();
        trace!(engine = engine.name(), "starting layout");
        let states = engine.do_layout(Rect::new(0, 0, area.width, area.height), &monitor);

        {
            let mut batch = PositionBatch::new(&*self.ctx.window_server);
            for state in states {
                if state.window.is_mouse_moving() {
                    trace!(window = %state.window, "skipping window being dragged");
                    continue;
                }
                let state = WindowState {
                    rect: state.rect.translate(area.x, area.y).clamp_non_negative(),
                    ..state
                };
                trace!(window = %state.window, rect = ?state.rect, "placing window");
                batch.add(state.clone());
                self.window_locations.insert(state.window.clone(), state);
            }
        }

        self.broadcast(BroadcastEvent::WorkspaceLayoutCompleted {
            workspace_id: self.id,
            windows: self.window_locations.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::actor::{self, broadcast::BroadcastReceiver};
    use crate::common::config::{GapSettings, LayoutSettings, ProxyKind};
    use crate::layout_engine::{
        ColumnEngine, FloatingEngine, GapsEngine, TreeEngine, proxies_from_settings,
    };
    use crate::sys::geometry::Point;
    use crate::sys::headless::{HeadlessDisplay, HeadlessWindow};
    use crate::sys::screen::Monitor;

    struct Harness {
        display: Rc<HeadlessDisplay>,
        workspace: Workspace,
        events: BroadcastReceiver,
    }

    impl Harness {
        fn new(engines: Vec<Engine>) -> Self {
            let display = HeadlessDisplay::new();
            let (tx, events) = actor::channel();
            let ctx = WorkspaceContext {
                window_server: display.clone(),
                router: display.clone(),
                events: Some(tx),
            };
            let workspace = Workspace::new(ctx, "main", engines).unwrap();
            display.show_workspace(workspace.id(), monitor());
            Harness { display, workspace, events }
        }

        fn columns(names: &[&str]) -> Self {
            Self::new(names.iter().map(|n| Engine::new(ColumnEngine::new(*n, true))).collect())
        }

        fn drain(&self) -> Vec<BroadcastEvent> { self.events.try_iter().map(|(_, e)| e).collect() }

        fn laid_out(&self) -> Vec<WindowRef> {
            self.display.last_batch().into_iter().map(|s| s.window).collect()
        }
    }

    fn monitor() -> Monitor { Monitor::new("test", Rect::new(100, 50, 1000, 800), 100) }

    #[test]
    fn needs_at_least_one_engine() {
        let display = HeadlessDisplay::new();
        let ctx = WorkspaceContext {
            window_server: display.clone(),
            router: display,
            events: None,
        };
        let err = Workspace::new(ctx, "empty", Vec::new()).unwrap_err();
        assert_eq!(err, WorkspaceError::NoLayoutEngines("empty".to_string()));
    }

    #[test]
    fn add_window_lays_out_in_desktop_coordinates() {
        let mut h = Harness::columns(&["Column"]);
        let (raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);

        let expected = WindowState::normal(window.clone(), Rect::new(100, 50, 1000, 800));
        assert_eq!(h.display.last_batch(), vec![expected.clone()]);
        assert_eq!(h.workspace.try_get_window_location(&window), Some(&expected));
        assert_eq!(raw.focus_count(), 1);
        assert!(h.workspace.contains_window(&window));
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut h = Harness::columns(&["Column"]);
        let (_raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);
        let batches = h.display.batch_count();
        h.workspace.add_window(&window);
        assert_eq!(h.display.batch_count(), batches);
        assert_eq!(h.workspace.active_layout_engine().count(), 1);
    }

    #[test]
    fn layout_without_monitor_does_nothing() {
        let mut h = Harness::columns(&["Column"]);
        h.display.hide_workspace(h.workspace.id());
        let (_raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);
        assert_eq!(h.display.batch_count(), 0);
        assert!(h.workspace.contains_window(&window));
        assert_eq!(h.workspace.try_get_window_location(&window), None);
    }

    #[test]
    fn dragged_windows_are_left_alone() {
        let mut h = Harness::columns(&["Column"]);
        let (raw0, w0) = HeadlessWindow::spawn(0);
        let (_raw1, w1) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&w0);
        raw0.set_mouse_moving(true);
        h.workspace.add_window(&w1);

        assert_eq!(h.laid_out(), vec![w1.clone()]);
        assert_eq!(h.workspace.try_get_window_location(&w0), None);
        assert!(h.workspace.try_get_window_location(&w1).is_some());
    }

    #[test]
    fn degenerate_rectangles_are_clamped() {
        let gaps = GapSettings { outer_gap: 400, inner_gap: 200 };
        let engine = Engine::new(GapsEngine::new(gaps, Engine::new(ColumnEngine::new("C", true))));
        let mut h = Harness::new(vec![engine]);
        let (_raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);

        let rect = h.display.last_batch()[0].rect;
        assert_eq!(rect, Rect::new(700, 650, 0, 0));
    }

    #[test]
    fn layout_events_bracket_each_pass() {
        let mut h = Harness::columns(&["Column"]);
        let (_raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);
        let id = h.workspace.id();
        assert_eq!(h.drain(), vec![
            BroadcastEvent::WorkspaceLayoutStarted { workspace_id: id },
            BroadcastEvent::WorkspaceLayoutCompleted { workspace_id: id, windows: 1 },
        ]);
    }

    #[test]
    fn remove_window() {
        let mut h = Harness::columns(&["A", "B"]);
        let (_raw0, w0) = HeadlessWindow::spawn(0);
        let (_raw1, w1) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&w0);
        h.workspace.add_window(&w1);
        h.workspace.window_focused(&w1);

        assert!(h.workspace.remove_window(&w1));
        assert_eq!(h.workspace.last_focused_window(), None);
        assert!(!h.workspace.contains_window(&w1));
        assert!(h.workspace.layout_engines().iter().all(|e| !e.contains_window(&w1)));
        assert_eq!(h.laid_out(), vec![w0.clone()]);

        assert!(!h.workspace.remove_window(&w1));
    }

    #[test]
    fn removal_is_best_effort() {
        let mut h = Harness::columns(&["A", "B"]);
        let (_raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);
        // Engine B loses track of the window behind the workspace's back.
        let stale = h.workspace.layout_engines()[1].remove_window(&window);
        h.workspace.replace_layout_engine(1, stale);
        let batches = h.display.batch_count();

        assert!(!h.workspace.remove_window(&window));
        assert!(!h.workspace.layout_engines()[0].contains_window(&window));
        assert!(h.workspace.windows().any(|w| *w == window));
        assert_eq!(h.display.batch_count(), batches);
    }

    #[test]
    fn engine_rotation_wraps() {
        let mut h = Harness::columns(&["A", "B", "C"]);
        h.workspace.previous_layout_engine();
        assert_eq!(h.workspace.active_layout_engine().name(), "C");
        h.workspace.next_layout_engine();
        assert_eq!(h.workspace.active_layout_engine().name(), "A");
        h.workspace.next_layout_engine();
        assert_eq!(h.workspace.active_layout_engine().name(), "B");

        let events = h.drain();
        assert!(events.contains(&BroadcastEvent::ActiveLayoutEngineChanged {
            workspace_id: h.workspace.id(),
            previous: "A".to_string(),
            current: "B".to_string(),
        }));
    }

    #[test]
    fn try_set_layout_engine() {
        let mut h = Harness::columns(&["A", "B"]);
        assert!(!h.workspace.try_set_layout_engine("Z"));
        assert_eq!(h.workspace.active_layout_engine().name(), "A");

        assert!(h.workspace.try_set_layout_engine("A"));
        assert!(h.drain().is_empty());
        assert_eq!(h.display.batch_count(), 0);

        assert!(h.workspace.try_set_layout_engine("B"));
        assert_eq!(h.workspace.active_layout_engine().name(), "B");
        assert_eq!(h.display.batch_count(), 1);
    }

    #[test]
    fn phantom_windows_belong_to_one_engine() {
        let mut h = Harness::columns(&["A", "B"]);
        let (_raw, regular) = HeadlessWindow::spawn(0);
        let (phantom_raw, phantom) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&regular);

        let a = h.workspace.active_layout_engine().identity();
        h.workspace.add_phantom_window(a, &phantom);
        assert!(h.workspace.contains_window(&phantom));
        assert!(!h.workspace.windows().any(|w| *w == phantom));
        assert_eq!(h.laid_out(), vec![regular.clone(), phantom.clone()]);
        assert!(!h.workspace.layout_engines()[1].contains_window(&phantom));

        h.workspace.next_layout_engine();
        assert!(phantom_raw.is_hidden());
        assert!(!h.workspace.contains_window(&phantom));
        assert_eq!(h.laid_out(), vec![regular.clone()]);

        h.workspace.next_layout_engine();
        assert_eq!(h.laid_out(), vec![regular.clone(), phantom.clone()]);
    }

    #[test]
    fn phantom_requests_from_inactive_engines_are_rejected() {
        let mut h = Harness::columns(&["A", "B"]);
        let (_raw, phantom) = HeadlessWindow::spawn(1);
        let b = h.workspace.layout_engines()[1].identity();
        h.workspace.add_phantom_window(b, &phantom);
        assert!(!h.workspace.contains_window(&phantom));
        assert!(!h.workspace.layout_engines()[1].contains_window(&phantom));

        let a = h.workspace.active_layout_engine().identity();
        h.workspace.add_phantom_window(a, &phantom);
        h.workspace.remove_phantom_window(b, &phantom);
        assert!(h.workspace.contains_window(&phantom));

        h.workspace.remove_phantom_window(a, &phantom);
        assert!(!h.workspace.contains_window(&phantom));
        assert!(!h.workspace.active_layout_engine().contains_window(&phantom));
    }

    #[test]
    fn phantoms_cannot_become_regular_windows() {
        let mut h = Harness::columns(&["A"]);
        let (_raw, phantom) = HeadlessWindow::spawn(1);
        let a = h.workspace.active_layout_engine().identity();
        h.workspace.add_phantom_window(a, &phantom);

        h.workspace.add_window(&phantom);
        h.workspace.move_window_to_point(&phantom, Point::new(0.5, 0.5));
        assert_eq!(h.workspace.windows().count(), 0);

        assert!(h.workspace.remove_window(&phantom));
        assert!(!h.workspace.contains_window(&phantom));
    }

    #[test]
    fn switching_engines_forgets_a_focused_phantom() {
        let mut h = Harness::columns(&["A", "B"]);
        let (_raw, phantom) = HeadlessWindow::spawn(1);
        let a = h.workspace.active_layout_engine().identity();
        h.workspace.add_phantom_window(a, &phantom);
        h.workspace.window_focused(&phantom);
        assert_eq!(h.workspace.last_focused_window(), Some(&phantom));

        h.workspace.next_layout_engine();
        assert_eq!(h.workspace.last_focused_window(), None);
    }

    #[test]
    fn window_focused_ignores_strangers() {
        let mut h = Harness::columns(&["A"]);
        let (_raw, stranger) = HeadlessWindow::spawn(1);
        h.workspace.window_focused(&stranger);
        assert_eq!(h.workspace.last_focused_window(), None);
    }

    #[test]
    fn swap_uses_last_focused_window() {
        let mut h = Harness::columns(&["A"]);
        let (_raw0, w0) = HeadlessWindow::spawn(0);
        let (_raw1, w1) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&w0);
        h.workspace.add_window(&w1);

        let batches = h.display.batch_count();
        h.workspace.swap_window_in_direction(Direction::Right, None);
        assert_eq!(h.display.batch_count(), batches);

        h.workspace.window_focused(&w0);
        h.workspace.swap_window_in_direction(Direction::Right, None);
        assert_eq!(h.workspace.active_layout_engine().windows(), vec![w1.clone(), w0.clone()]);
        assert_eq!(h.display.batch_count(), batches + 1);

        // Vertical swaps change nothing, so nothing is laid out again.
        h.workspace.swap_window_in_direction(Direction::Up, Some(&w0));
        assert_eq!(h.display.batch_count(), batches + 1);
    }

    #[test]
    fn edge_moves_relayout_only_on_change() {
        let tree = Engine::new(TreeEngine::new("Tree", Direction::Right));
        let mut h = Harness::new(vec![tree]);
        let (_raw0, w0) = HeadlessWindow::spawn(0);
        let (_raw1, w1) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&w0);
        h.workspace.add_window(&w1);
        let batches = h.display.batch_count();

        h.workspace.move_window_edges_in_direction(Edges::LEFT, Point::new(-0.1, 0.0), Some(&w0));
        assert_eq!(h.display.batch_count(), batches);

        h.workspace.move_window_edges_in_direction(Edges::RIGHT, Point::new(0.1, 0.0), Some(&w0));
        assert_eq!(h.display.batch_count(), batches + 1);
        let rect = h.workspace.try_get_window_location(&w0).map(|s| s.rect);
        assert_eq!(rect, Some(Rect::new(100, 50, 600, 800)));
    }

    #[test]
    fn focus_in_direction() {
        let mut h = Harness::columns(&["A"]);
        let (raw0, w0) = HeadlessWindow::spawn(0);
        let (_raw1, w1) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&w0);
        h.workspace.add_window(&w1);
        h.workspace.focus_window_in_direction(Direction::Right, Some(&w1));
        assert_eq!(raw0.focus_count(), 2);

        let (_raw2, stranger) = HeadlessWindow::spawn(2);
        h.workspace.focus_window_in_direction(Direction::Right, Some(&stranger));
        assert_eq!(raw0.focus_count(), 2);
    }

    #[test]
    fn move_window_to_point_adds_to_every_engine() {
        let mut h = Harness::columns(&["A", "B"]);
        let (_raw0, w0) = HeadlessWindow::spawn(0);
        let (_raw1, w1) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&w0);
        h.workspace.move_window_to_point(&w1, Point::new(0.0, 0.5));

        for engine in h.workspace.layout_engines() {
            assert_eq!(engine.windows(), vec![w1.clone(), w0.clone()]);
        }
        assert!(h.workspace.windows().any(|w| *w == w1));

        let batches = h.display.batch_count();
        h.workspace.move_window_to_point(&w1, Point::new(0.0, 0.5));
        assert_eq!(h.display.batch_count(), batches + 1);
    }

    #[test]
    fn initialize_wraps_every_engine() {
        let mut h = Harness::columns(&["A", "B"]);
        let before: Vec<_> = h.workspace.layout_engines().iter().map(|e| e.identity()).collect();
        let settings = LayoutSettings {
            proxies: vec![ProxyKind::Floating, ProxyKind::Gaps],
            ..LayoutSettings::default()
        };
        h.workspace.initialize(&proxies_from_settings(&settings, h.display.clone()));

        for (engine, identity) in h.workspace.layout_engines().iter().zip(before) {
            assert!(matches!(engine.kind(), LayoutEngineKind::Floating(_)));
            assert_eq!(engine.identity(), identity);
        }

        let (_raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);
        assert_eq!(h.display.last_batch()[0].rect, Rect::new(115, 65, 970, 770));
    }

    #[test]
    fn floating_toggle_relayouts() {
        let floating_column = |display: &Rc<HeadlessDisplay>| {
            let inner = Engine::new(ColumnEngine::new("Column", true));
            Engine::new(FloatingEngine::new(display.clone(), inner))
        };
        let display = HeadlessDisplay::new();
        let ctx = WorkspaceContext {
            window_server: display.clone(),
            router: display.clone(),
            events: None,
        };
        let mut workspace = Workspace::new(ctx, "main", vec![floating_column(&display)]).unwrap();
        display.show_workspace(workspace.id(), monitor());

        let (_raw0, w0) = HeadlessWindow::spawn(0);
        let (_raw1, w1) = HeadlessWindow::spawn(1);
        workspace.add_window(&w0);
        workspace.add_window(&w1);
        display.set_frame(&w1, Rect::new(200, 100, 300, 200));

        workspace.set_window_floating(&w1, true);
        let batch = display.last_batch();
        assert_eq!(batch[0].rect, Rect::new(100, 50, 1000, 800));
        assert_eq!(batch[1].window, w1);
        assert_eq!(batch[1].rect, Rect::new(200, 100, 300, 200));

        let batches = display.batch_count();
        workspace.set_window_floating(&w1, true);
        assert_eq!(display.batch_count(), batches);
    }

    #[test]
    fn floating_frames_are_stable_with_any_proxy_order() {
        let mut h = Harness::columns(&["A"]);
        let settings = LayoutSettings {
            proxies: vec![ProxyKind::Gaps, ProxyKind::Floating],
            ..LayoutSettings::default()
        };
        h.workspace.initialize(&proxies_from_settings(&settings, h.display.clone()));
        let (_raw0, w0) = HeadlessWindow::spawn(0);
        let (_raw1, w1) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&w0);
        h.workspace.add_window(&w1);
        h.display.set_frame(&w1, Rect::new(200, 100, 300, 200));
        h.workspace.set_window_floating(&w1, true);
        assert!(h.workspace.is_window_floating(&w1));

        let mut seen = Vec::new();
        for _ in 0..3 {
            h.workspace.do_layout();
            seen.push(h.workspace.try_get_window_location(&w1).map(|s| s.rect));
        }
        assert_eq!(seen, vec![Some(Rect::new(200, 100, 300, 200)); 3]);
    }

    #[test]
    fn deactivate_hides_everything() {
        let mut h = Harness::columns(&["A"]);
        let (raw0, w0) = HeadlessWindow::spawn(0);
        let (raw1, w1) = HeadlessWindow::spawn(1);
        h.workspace.add_window(&w0);
        let a = h.workspace.active_layout_engine().identity();
        h.workspace.add_phantom_window(a, &w1);

        h.workspace.deactivate();
        assert!(raw0.is_hidden());
        assert!(raw1.is_hidden());
        assert_eq!(h.workspace.try_get_window_location(&w0), None);
    }

    #[test]
    fn dispose_minimizes_windows_of_hidden_workspaces_once() {
        let mut h = Harness::columns(&["A"]);
        let (raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);

        h.workspace.dispose();
        assert!(h.workspace.is_disposed());
        assert!(!raw.is_minimized());

        let mut h = Harness::columns(&["A"]);
        let (raw, window) = HeadlessWindow::spawn(0);
        h.workspace.add_window(&window);
        h.display.hide_workspace(h.workspace.id());
        h.workspace.dispose();
        assert!(raw.is_minimized());
        h.workspace.dispose();
        assert!(h.workspace.is_disposed());
    }

    #[test]
    fn rename_broadcasts() {
        let mut h = Harness::columns(&["A"]);
        h.workspace.rename("web");
        assert_eq!(h.workspace.name(), "web");
        assert_eq!(h.drain(), vec![BroadcastEvent::WorkspaceRenamed {
            workspace_id: h.workspace.id(),
            old_name: "main".to_string(),
            new_name: "web".to_string(),
        }]);
    }
}
