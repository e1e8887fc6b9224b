use tracing::{debug, trace};

use crate::actor::broadcast::{BroadcastEvent, BroadcastSender};
use crate::layout_engine::split_tree::SplitTree;
use crate::layout_engine::{
    Direction, Edges, LayoutEngine, LayoutEngineIdentity, LayoutEngineKind, WindowState,
};
use crate::sys::geometry::{NormalizedPoint, Rect};
use crate::sys::screen::Monitor;
use crate::sys::window::WindowRef;

/// Tiles windows in a tree of nested horizontal and vertical splits.
#[derive(Clone, Debug)]
pub struct TreeEngine {
    name: String,
    identity: LayoutEngineIdentity,
    add_direction: Direction,
    tree: SplitTree,
    focused: Option<WindowRef>,
    last_inserted: Option<WindowRef>,
    events: Option<BroadcastSender>,
}

impl TreeEngine {
    pub fn new(name: impl Into<String>, add_direction: Direction) -> Self {
        Self {
            name: name.into(),
            identity: LayoutEngineIdentity::new(),
            add_direction,
            tree: SplitTree::new(),
            focused: None,
            last_inserted: None,
            events: None,
        }
    }

    /// Announces structural changes on `events`.
    pub fn with_events(mut self, events: BroadcastSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn add_direction(&self) -> Direction { self.add_direction }

    pub fn tree(&self) -> &SplitTree { &self.tree }

    fn anchor(&self) -> Option<&WindowRef> {
        [self.focused.as_ref(), self.last_inserted.as_ref()]
            .into_iter()
            .flatten()
            .find(|w| self.tree.contains(w))
    }

    fn with_tree(&self, tree: SplitTree) -> Self {
        let next = Self { tree, ..self.clone() };
        if let Some(events) = &next.events {
            events.send(BroadcastEvent::TreeLayoutChanged {
                engine: next.identity,
                windows: next.tree.windows().iter().map(ToString::to_string).collect(),
            });
        }
        next
    }

    fn forget(&self, window: &WindowRef) -> Self {
        let drop_if = |slot: &Option<WindowRef>| slot.clone().filter(|w| w != window);
        Self {
            focused: drop_if(&self.focused),
            last_inserted: drop_if(&self.last_inserted),
            ..self.clone()
        }
    }
}

impl LayoutEngine for TreeEngine {
    fn name(&self) -> &str { &self.name }

    fn identity(&self) -> LayoutEngineIdentity { self.identity }

    fn count(&self) -> usize { self.tree.len() }

    fn contains_window(&self, window: &WindowRef) -> bool { self.tree.contains(window) }

    fn windows(&self) -> Vec<WindowRef> { self.tree.windows() }

    fn get_first_window(&self) -> Option<WindowRef> { self.tree.windows().into_iter().next() }

    fn add_window(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        if self.tree.contains(window) {
            return None;
        }
        let tree = self.tree.insert(self.anchor(), window.clone(), self.add_direction);
        let mut next = self.with_tree(tree);
        next.last_inserted = Some(window.clone());
        Some(next.into())
    }

    fn remove_window(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        let tree = self.tree.remove(window)?;
        Some(self.forget(window).with_tree(tree).into())
    }

    fn move_window_to_point(
        &self,
        window: &WindowRef,
        point: NormalizedPoint,
    ) -> Option<LayoutEngineKind> {
        let base = self.forget(window);
        let tree = self.tree.remove(window).unwrap_or_else(|| self.tree.clone());

        let point = point.clamp_to_unit();
        let tree = match tree.leaf_at(point) {
            None => tree.insert(None, window.clone(), self.add_direction),
            Some((target, rect)) => {
                let candidates = [
                    (point.x - rect.x, Direction::Left),
                    (rect.right() - point.x, Direction::Right),
                    (point.y - rect.y, Direction::Up),
                    (rect.bottom() - point.y, Direction::Down),
                ];
                let direction = candidates
                    .into_iter()
                    .min_by(|a, b| a.0.total_cmp(&b.0))
                    .map_or(self.add_direction, |(_, d)| d);
                trace!(%window, %target, %direction, "splitting leaf under point");
                tree.insert(Some(&target), window.clone(), direction)
            }
        };
        if tree == self.tree {
            trace!(%window, "window dropped back into its own slot");
            return None;
        }
        let mut next = base.with_tree(tree);
        next.last_inserted = Some(window.clone());
        Some(next.into())
    }

    fn move_window_edges_in_direction(
        &self,
        edges: Edges,
        deltas: NormalizedPoint,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind> {
        let mut tree = self.tree.clone();
        let mut changed = false;
        for direction in edges.directions() {
            let delta = match direction {
                Direction::Left | Direction::Right => deltas.x,
                Direction::Up | Direction::Down => deltas.y,
            };
            if let Some(next) = tree.move_edge(window, direction, delta) {
                tree = next;
                changed = true;
            } else {
                debug!(%window, %direction, "no edge to move");
            }
        }
        changed.then(|| self.with_tree(tree).into())
    }

    fn swap_window_in_direction(
        &self,
        direction: Direction,
        window: &WindowRef,
    ) -> Option<LayoutEngineKind> {
        let other = self.tree.neighbour(window, direction)?;
        let tree = self.tree.swap(window, &other)?;
        Some(self.with_tree(tree).into())
    }

    fn focus_window_in_direction(&self, direction: Direction, window: &WindowRef) {
        match self.tree.neighbour(window, direction) {
            Some(other) => other.focus(),
            None => debug!(%window, %direction, "no window in that direction"),
        }
    }

    fn do_layout(&self, rect: Rect<i32>, _monitor: &Monitor) -> Vec<WindowState> {
        self.tree
            .layout(rect)
            .into_iter()
            .map(|(window, rect)| WindowState::normal(window, rect))
            .collect()
    }

    fn window_focused(&self, window: &WindowRef) -> Option<LayoutEngineKind> {
        if self.focused.as_ref() == Some(window) || !self.tree.contains(window) {
            return None;
        }
        Some(
            Self {
                focused: Some(window.clone()),
                ..self.clone()
            }
            .into(),
        )
    }

    fn ascii_tree(&self) -> ascii_tree::Tree { self.tree.ascii_tree(&self.name) }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::actor;
    use crate::layout_engine::Engine;
    use crate::sys::geometry::Point;
    use crate::sys::headless::HeadlessWindow;

    fn monitor() -> Monitor { Monitor::new("test", Rect::new(0, 0, 1000, 600), 100) }

    fn spawn(n: usize) -> (Vec<Rc<HeadlessWindow>>, Vec<WindowRef>) {
        (0..n).map(HeadlessWindow::spawn).unzip()
    }

    fn rects(engine: &Engine) -> Vec<Rect<i32>> {
        engine.do_layout(Rect::new(0, 0, 1000, 600), &monitor()).into_iter().map(|s| s.rect).collect()
    }

    fn with_windows(refs: &[WindowRef]) -> Engine {
        refs.iter().fold(Engine::new(TreeEngine::new("Tree", Direction::Right)), |e, w| {
            e.add_window(w)
        })
    }

    #[test]
    fn add_and_remove_obey_identity_law() {
        let (_raw, refs) = spawn(2);
        let engine = with_windows(&refs[..1]);
        assert!(engine.add_window(&refs[0]).ptr_eq(&engine));
        assert!(engine.remove_window(&refs[1]).ptr_eq(&engine));

        let removed = engine.remove_window(&refs[0]);
        assert_eq!(removed.count(), 0);
        assert_eq!(removed.identity(), engine.identity());
        assert!(removed.do_layout(Rect::new(0, 0, 10, 10), &monitor()).is_empty());
    }

    #[test]
    fn windows_tile_along_add_direction() {
        let (_raw, refs) = spawn(2);
        let engine = with_windows(&refs);
        assert_eq!(rects(&engine), vec![Rect::new(0, 0, 500, 600), Rect::new(500, 0, 500, 600)]);
    }

    #[test]
    fn insert_goes_next_to_the_focused_window() {
        let (_raw, refs) = spawn(3);
        let engine = Engine::new(TreeEngine::new("Tree", Direction::Down));
        let engine = engine.add_window(&refs[0]).add_window(&refs[1]);
        let engine = engine.window_focused(&refs[0]).add_window(&refs[2]);
        assert_eq!(engine.windows(), vec![refs[0].clone(), refs[2].clone(), refs[1].clone()]);
    }

    #[test]
    fn window_focused_is_a_no_op_for_strangers() {
        let (_raw, refs) = spawn(2);
        let engine = with_windows(&refs[..1]);
        assert!(engine.window_focused(&refs[1]).ptr_eq(&engine));
        let focused = engine.window_focused(&refs[0]);
        assert!(!focused.ptr_eq(&engine));
        assert!(focused.window_focused(&refs[0]).ptr_eq(&focused));
        assert_eq!(rects(&focused), rects(&engine));
    }

    #[test]
    fn focus_and_swap_do_not_wrap() {
        let (raw, refs) = spawn(2);
        let engine = with_windows(&refs);
        engine.focus_window_in_direction(Direction::Left, &refs[0]);
        assert_eq!(raw[1].focus_count(), 0);
        engine.focus_window_in_direction(Direction::Right, &refs[0]);
        assert_eq!(raw[1].focus_count(), 1);

        assert!(engine.swap_window_in_direction(Direction::Left, &refs[0]).ptr_eq(&engine));
        let swapped = engine.swap_window_in_direction(Direction::Right, &refs[0]);
        assert_eq!(swapped.windows(), vec![refs[1].clone(), refs[0].clone()]);
    }

    #[test]
    fn move_to_point_splits_toward_nearest_edge() {
        let (_raw, refs) = spawn(3);
        let engine = with_windows(&refs[..2]);
        // Near the bottom of the right window.
        let moved = engine.move_window_to_point(&refs[2], Point::new(0.75, 0.95));
        assert_eq!(
            rects(&moved),
            vec![Rect::new(0, 0, 500, 600), Rect::new(500, 0, 500, 300), Rect::new(500, 300, 500, 300)]
        );
        assert_eq!(moved.windows()[2], refs[2]);
    }

    #[test]
    fn move_to_point_onto_own_slot_is_a_no_op() {
        let (_raw, refs) = spawn(2);
        let engine = with_windows(&refs);
        let dropped = engine.move_window_to_point(&refs[1], Point::new(0.99, 0.5));
        assert!(dropped.ptr_eq(&engine));

        let moved = engine.move_window_to_point(&refs[1], Point::new(0.01, 0.5));
        assert!(!moved.ptr_eq(&engine));
        assert_eq!(moved.windows(), vec![refs[1].clone(), refs[0].clone()]);
    }

    #[test]
    fn move_to_point_into_empty_tree() {
        let (_raw, refs) = spawn(1);
        let engine = Engine::new(TreeEngine::new("Tree", Direction::Right));
        let moved = engine.move_window_to_point(&refs[0], Point::new(-3.0, 7.0));
        assert_eq!(moved.windows(), refs);
    }

    #[test]
    fn edge_moves_resize_neighbours() {
        let (_raw, refs) = spawn(2);
        let engine = with_windows(&refs);
        let moved = engine.move_window_edges_in_direction(Edges::RIGHT, Point::new(0.1, 0.0), &refs[0]);
        assert_eq!(rects(&moved), vec![Rect::new(0, 0, 600, 600), Rect::new(600, 0, 400, 600)]);

        let untouched =
            engine.move_window_edges_in_direction(Edges::UP, Point::new(0.0, 0.3), &refs[0]);
        assert!(untouched.ptr_eq(&engine));
    }

    #[test]
    fn structural_changes_are_broadcast() {
        let (tx, rx) = actor::channel();
        let (_raw, refs) = spawn(2);
        let engine = Engine::new(TreeEngine::new("Tree", Direction::Right).with_events(tx));
        let engine = engine.add_window(&refs[0]).add_window(&refs[1]);
        let _ = engine.window_focused(&refs[0]);

        let events: Vec<_> = rx.try_iter().map(|(_, e)| e).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            BroadcastEvent::TreeLayoutChanged {
                engine: engine.identity(),
                windows: vec!["window-0".to_string(), "window-1".to_string()],
            }
        );
    }

    #[test]
    fn layout_is_idempotent() {
        let (_raw, refs) = spawn(5);
        let engine = with_windows(&refs);
        let rect = Rect::new(3, 7, 1001, 599);
        assert_eq!(engine.do_layout(rect, &monitor()), engine.do_layout(rect, &monitor()));
        let total: i32 = engine.do_layout(rect, &monitor()).iter().map(|s| s.rect.width).sum();
        assert_eq!(total, 1001);
    }
}
