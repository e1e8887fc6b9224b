use tracing::trace;

use super::geometry::Rect;
use super::window::WindowRef;
use crate::layout_engine::WindowState;

/// The part of the windowing system that knows where windows are and can
/// move them.
pub trait WindowServer {
    /// Last known frame of the window in desktop coordinates.
    fn window_frame(&self, window: &WindowRef) -> Option<Rect<i32>>;

    /// Moves all windows in one go. Called once per [`PositionBatch`].
    fn apply_positions(&self, states: Vec<WindowState>);
}

/// Collects window positions and hands them to the window server as one
/// batch when dropped, so a partially applied layout is never on screen.
pub struct PositionBatch<'a> {
    server: &'a dyn WindowServer,
    states: Vec<WindowState>,
}

impl<'a> PositionBatch<'a> {
    pub fn new(server: &'a dyn WindowServer) -> Self { Self { server, states: Vec::new() } }

    pub fn add(&mut self, state: WindowState) { self.states.push(state); }

    pub fn len(&self) -> usize { self.states.len() }

    pub fn is_empty(&self) -> bool { self.states.is_empty() }
}

impl Drop for PositionBatch<'_> {
    fn drop(&mut self) {
        let states = std::mem::take(&mut self.states);
        trace!(count = states.len(), "applying window positions");
        self.server.apply_positions(states);
    }
}
