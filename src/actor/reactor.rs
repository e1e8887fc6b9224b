//! The reactor routes window events and user commands to workspaces.
//!
//! It owns every workspace and knows which one is shown on the monitor. Window
//! events are applied to the workspace that holds the window; commands act on
//! the active workspace.

mod error;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub use error::ReactorError;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace, warn};

use crate::actor::{self, broadcast::BroadcastSender};
use crate::common::collections::HashMap;
use crate::common::config::Config;
use crate::layout_engine::{
    Direction, Edges, ProxyLayoutEngine, engines_from_settings, proxies_from_settings,
};
use crate::model::{Workspace, WorkspaceContext, WorkspaceId};
use crate::sys::geometry::NormalizedPoint;
use crate::sys::screen::{Monitor, MonitorRouter};
use crate::sys::window::WindowRef;
use crate::sys::window_server::WindowServer;

pub type Sender = actor::Sender<Event>;
pub type Receiver = actor::Receiver<Event>;

#[derive(Debug)]
pub enum Event {
    /// A new window should be tiled on the active workspace.
    WindowAdded(WindowRef),
    WindowRemoved(WindowRef),
    WindowFocused(WindowRef),
    /// The user dropped a window at a point of the monitor, normalized to the
    /// unit square.
    WindowMoved {
        window: WindowRef,
        point: NormalizedPoint,
    },
    Command(LayoutCommand),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    FocusWindowInDirection(Direction),
    SwapWindowInDirection(Direction),
    MoveWindowEdgesInDirection { edges: Edges, deltas: NormalizedPoint },
    NextLayoutEngine,
    PreviousLayoutEngine,
    SetLayoutEngine(String),
    ToggleFloating,
    FocusFirstWindow,
    ActivateWorkspace(usize),
}

/// The single monitor the reactor drives, and which workspace it shows.
struct MonitorSlot {
    monitor: RefCell<Monitor>,
    workspace: Cell<Option<WorkspaceId>>,
}

impl MonitorRouter for MonitorSlot {
    fn monitor_for_workspace(&self, workspace: WorkspaceId) -> Option<Monitor> {
        (self.workspace.get() == Some(workspace)).then(|| self.monitor.borrow().clone())
    }
}

pub struct Reactor {
    config: Config,
    window_server: Rc<dyn WindowServer>,
    slot: Rc<MonitorSlot>,
    events: Option<BroadcastSender>,
    proxies: Vec<ProxyLayoutEngine>,
    workspaces: Vec<Workspace>,
    active: usize,
    window_workspaces: HashMap<WindowRef, WorkspaceId>,
}

impl Reactor {
    /// Creates one workspace per configured name and shows the first one.
    pub fn new(
        config: Config,
        window_server: Rc<dyn WindowServer>,
        monitor: Monitor,
        events: Option<BroadcastSender>,
    ) -> Result<Self, ReactorError> {
        if config.workspaces.names.is_empty() {
            return Err(ReactorError::NoWorkspaces);
        }
        let proxies = proxies_from_settings(&config.layout, window_server.clone());
        let slot = Rc::new(MonitorSlot {
            monitor: RefCell::new(monitor),
            workspace: Cell::new(None),
        });
        let mut reactor = Reactor {
            config,
            window_server,
            slot,
            events,
            proxies,
            workspaces: Vec::new(),
            active: 0,
            window_workspaces: HashMap::default(),
        };
        let names = reactor.config.workspaces.names.clone();
        for name in names {
            reactor.add_workspace(name)?;
        }
        reactor.slot.workspace.set(Some(reactor.workspaces[0].id()));
        Ok(reactor)
    }

    pub fn run(mut self, events: Receiver) {
        for (span, event) in events {
            let _guard = span.enter();
            self.handle_event(event);
        }
        debug!("event channel closed");
    }

    pub fn workspaces(&self) -> &[Workspace] { &self.workspaces }

    pub fn active_workspace(&self) -> &Workspace { &self.workspaces[self.active] }

    pub fn active_workspace_index(&self) -> usize { self.active }

    /// Which workspace tiles `window`, if any.
    pub fn workspace_for_window(&self, window: &WindowRef) -> Option<&Workspace> {
        let id = self.window_workspaces.get(window)?;
        self.workspaces.iter().find(|ws| ws.id() == *id)
    }

    pub fn add_workspace(&mut self, name: impl Into<String>) -> Result<WorkspaceId, ReactorError> {
        let ctx = WorkspaceContext {
            window_server: self.window_server.clone(),
            router: self.slot.clone(),
            events: self.events.clone(),
        };
        let engines = engines_from_settings(&self.config.layout.engines, self.events.as_ref());
        let mut workspace = Workspace::new(ctx, name, engines)?;
        workspace.initialize(&self.proxies);
        debug!(workspace = workspace.name(), id = %workspace.id(), "created workspace");
        let id = workspace.id();
        self.workspaces.push(workspace);
        Ok(id)
    }

    /// Disposes the workspace at `index`. The last workspace cannot be
    /// removed.
    pub fn remove_workspace(&mut self, index: usize) -> bool {
        if index >= self.workspaces.len() {
            error!(index, "no such workspace");
            return false;
        }
        if self.workspaces.len() == 1 {
            warn!("cannot remove the last workspace");
            return false;
        }
        if index == self.active {
            let next = if index == 0 { 1 } else { index - 1 };
            self.activate_workspace(next);
        }

        let mut workspace = self.workspaces.remove(index);
        workspace.dispose();
        let id = workspace.id();
        self.window_workspaces.retain(|_, ws| *ws != id);
        if self.active > index {
            self.active -= 1;
        }
        debug!(workspace = workspace.name(), "removed workspace");
        true
    }

    /// Moves the monitor to a different working area and lays out again.
    pub fn set_monitor(&mut self, monitor: Monitor) {
        *self.slot.monitor.borrow_mut() = monitor;
        self.workspaces[self.active].do_layout();
    }

    #[instrument(name = "reactor::handle_event", skip(self), fields(event = ?event))]
    pub fn handle_event(&mut self, event: Event) {
        match &event {
            Event::WindowMoved { .. } => trace!(?event, "Event"),
            _ => debug!(?event, "Event"),
        }

        match event {
            Event::WindowAdded(window) => {
                if let Some(id) = self.window_workspaces.get(&window) {
                    debug!(%window, workspace = %id, "window already tiled");
                    return;
                }
                let workspace = &mut self.workspaces[self.active];
                workspace.add_window(&window);
                self.window_workspaces.insert(window, workspace.id());
            }
            Event::WindowRemoved(window) => {
                let Some(workspace) = self.workspace_mut_for_window(&window) else {
                    debug!(%window, "removed window was not tiled");
                    return;
                };
                if workspace.remove_window(&window) {
                    self.window_workspaces.remove(&window);
                }
            }
            Event::WindowFocused(window) => {
                for workspace in &mut self.workspaces {
                    workspace.window_focused(&window);
                }
            }
            Event::WindowMoved { window, point } => {
                let active_id = self.workspaces[self.active].id();
                if let Some(workspace) = self.workspace_mut_for_window(&window) {
                    if workspace.id() != active_id && !workspace.remove_window(&window) {
                        error!(%window, "window could not leave its workspace");
                        return;
                    }
                }
                let workspace = &mut self.workspaces[self.active];
                workspace.move_window_to_point(&window, point);
                self.window_workspaces.insert(window, active_id);
            }
            Event::Command(command) => self.handle_command(command),
        }
    }

    fn workspace_mut_for_window(&mut self, window: &WindowRef) -> Option<&mut Workspace> {
        let id = *self.window_workspaces.get(window)?;
        self.workspaces.iter_mut().find(|ws| ws.id() == id)
    }

    pub fn handle_command(&mut self, command: LayoutCommand) {
        let workspace = &mut self.workspaces[self.active];
        match command {
            LayoutCommand::FocusWindowInDirection(direction) => {
                workspace.focus_window_in_direction(direction, None)
            }
            LayoutCommand::SwapWindowInDirection(direction) => {
                workspace.swap_window_in_direction(direction, None)
            }
            LayoutCommand::MoveWindowEdgesInDirection { edges, deltas } => {
                workspace.move_window_edges_in_direction(edges, deltas, None)
            }
            LayoutCommand::NextLayoutEngine => workspace.next_layout_engine(),
            LayoutCommand::PreviousLayoutEngine => workspace.previous_layout_engine(),
            LayoutCommand::SetLayoutEngine(name) => {
                workspace.try_set_layout_engine(&name);
            }
            LayoutCommand::ToggleFloating => {
                let Some(window) = workspace.last_focused_window().cloned() else {
                    warn!("no focused window to float");
                    return;
                };
                let floating = !workspace.is_window_floating(&window);
                workspace.set_window_floating(&window, floating);
            }
            LayoutCommand::FocusFirstWindow => workspace.focus_first_window(),
            LayoutCommand::ActivateWorkspace(index) => self.activate_workspace(index),
        }
    }

    fn activate_workspace(&mut self, index: usize) {
        if index >= self.workspaces.len() {
            error!(index, "no such workspace");
            return;
        }
        if index == self.active {
            return;
        }
        self.workspaces[self.active].deactivate();
        self.active = index;
        let workspace = &mut self.workspaces[index];
        self.slot.workspace.set(Some(workspace.id()));
        debug!(workspace = workspace.name(), "activated workspace");
        workspace.do_layout();
        workspace.focus_first_window();
    }
}
