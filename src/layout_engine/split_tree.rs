//! Persistent n-ary split tree used by the tree engine.
//!
//! Every update returns a new tree. Only the nodes on the path from the root
//! to the change are rebuilt; all other subtrees are shared with the previous
//! value.

use std::rc::Rc;

use super::{Direction, Orientation};
use crate::sys::geometry::{NormalizedPoint, Point, Rect};
use crate::sys::window::WindowRef;

/// No child may be resized below this share of its parent.
pub const MIN_WEIGHT_FRACTION: f64 = 0.05;

/// How far past an edge we probe for a neighbour, in unit-square terms.
const PROBE: f64 = 1e-6;

/// Child indices from the root down to a node.
pub type Path = Vec<usize>;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Leaf(WindowRef),
    Split(Rc<Split>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Split {
    pub orientation: Orientation,
    pub children: Vec<(f64, Node)>,
}

impl Split {
    fn new(orientation: Orientation, children: Vec<(f64, Node)>) -> Node {
        Node::Split(Rc::new(Split { orientation, children }))
    }

    fn total_weight(&self) -> f64 { self.children.iter().map(|(w, _)| w).sum() }

    fn mean_weight(&self) -> f64 {
        if self.children.is_empty() {
            1.0
        } else {
            self.total_weight() / self.children.len() as f64
        }
    }
}

impl Node {
    fn child(&self, index: usize) -> Option<&Node> {
        match self {
            Node::Split(split) => split.children.get(index).map(|(_, node)| node),
            Node::Leaf(_) => None,
        }
    }

    fn ascii_tree(&self) -> ascii_tree::Tree {
        match self {
            Node::Leaf(window) => ascii_tree::Tree::Leaf(vec![window.to_string()]),
            Node::Split(split) => {
                let total = split.total_weight();
                let desc = format!("{:?}", split.orientation);
                let children = split
                    .children
                    .iter()
                    .map(|(weight, child)| match child.ascii_tree() {
                        ascii_tree::Tree::Leaf(lines) => ascii_tree::Tree::Leaf(
                            lines
                                .into_iter()
                                .map(|line| format!("{line} ({:.0}%)", weight / total * 100.0))
                                .collect(),
                        ),
                        node => node,
                    })
                    .collect();
                ascii_tree::Tree::Node(desc, children)
            }
        }
    }
}

/// Rebuilds the spine from `node` down to `path`, replacing the node found
/// there with the result of `f`.
fn update_at(node: &Node, path: &[usize], f: &mut dyn FnMut(&Node) -> Node) -> Node {
    let Some((&index, rest)) = path.split_first() else {
        return f(node);
    };
    match node {
        Node::Split(split) if index < split.children.len() => {
            let mut children = split.children.clone();
            children[index].1 = update_at(&children[index].1, rest, f);
            Split::new(split.orientation, children)
        }
        _ => node.clone(),
    }
}

/// Splits `extent` into pieces proportional to `weights`, rounding the
/// cumulative boundaries so the pieces always add up to `extent`.
fn partition(extent: i32, weights: &[f64]) -> Vec<(i32, i32)> {
    let total: f64 = weights.iter().sum();
    let equal = total <= 0.0 || !total.is_finite();
    let n = weights.len() as f64;
    let mut before = 0.0;
    weights
        .iter()
        .map(|&weight| {
            let after = before + if equal { 1.0 } else { weight };
            let scale = if equal { n } else { total };
            let start = (before * f64::from(extent) / scale).round() as i32;
            let end = (after * f64::from(extent) / scale).round() as i32;
            before = after;
            (start, end - start)
        })
        .collect()
}

fn partition_unit(rect: Rect<f64>, orientation: Orientation, weights: &[f64]) -> Vec<Rect<f64>> {
    let total: f64 = weights.iter().sum();
    let mut before = 0.0;
    weights
        .iter()
        .map(|&weight| {
            let share = if total > 0.0 { weight / total } else { 1.0 / weights.len() as f64 };
            let child = match orientation {
                Orientation::Horizontal => Rect::new(
                    rect.x + before * rect.width,
                    rect.y,
                    share * rect.width,
                    rect.height,
                ),
                Orientation::Vertical => Rect::new(
                    rect.x,
                    rect.y + before * rect.height,
                    rect.width,
                    share * rect.height,
                ),
            };
            before += share;
            child
        })
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitTree {
    root: Option<Node>,
}

impl SplitTree {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.root.is_none() }

    pub fn root(&self) -> Option<&Node> { self.root.as_ref() }

    pub fn windows(&self) -> Vec<WindowRef> {
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            collect_windows(root, &mut out);
        }
        out
    }

    pub fn len(&self) -> usize { self.windows().len() }

    pub fn contains(&self, window: &WindowRef) -> bool { self.find(window).is_some() }

    pub fn find(&self, window: &WindowRef) -> Option<Path> {
        fn go(node: &Node, window: &WindowRef, path: &mut Path) -> bool {
            match node {
                Node::Leaf(w) => w == window,
                Node::Split(split) => {
                    for (i, (_, child)) in split.children.iter().enumerate() {
                        path.push(i);
                        if go(child, window, path) {
                            return true;
                        }
                        path.pop();
                    }
                    false
                }
            }
        }
        let mut path = Vec::new();
        go(self.root.as_ref()?, window, &mut path).then_some(path)
    }

    fn node_at(&self, path: &[usize]) -> Option<&Node> {
        path.iter().try_fold(self.root.as_ref()?, |node, &i| node.child(i))
    }

    fn with_root(root: Node) -> Self { Self { root: Some(root) } }

    fn update_at(&self, path: &[usize], mut f: impl FnMut(&Node) -> Node) -> Self {
        match &self.root {
            Some(root) => Self::with_root(update_at(root, path, &mut f)),
            None => self.clone(),
        }
    }

    pub fn last_window(&self) -> Option<WindowRef> { self.windows().pop() }

    /// Puts `window` next to `anchor`. If the anchor's parent already splits
    /// along `direction`'s axis the window becomes its sibling; otherwise the
    /// anchor is replaced by a new split holding both. Falls back to the last
    /// leaf when `anchor` is not in the tree.
    pub fn insert(
        &self,
        anchor: Option<&WindowRef>,
        window: WindowRef,
        direction: Direction,
    ) -> Self {
        let Some(root) = &self.root else {
            return Self::with_root(Node::Leaf(window));
        };
        let path = anchor
            .and_then(|a| self.find(a))
            .or_else(|| self.last_window().and_then(|w| self.find(&w)))
            .unwrap_or_default();

        let orientation = direction.orientation();
        let forward = direction.is_forward();
        let new_leaf = Node::Leaf(window);

        if let Some((&index, parent_path)) = path.split_last() {
            if let Some(Node::Split(parent)) = self.node_at(parent_path) {
                if parent.orientation == orientation {
                    let weight = parent.mean_weight();
                    let at = if forward { index + 1 } else { index };
                    return self.update_at(parent_path, |_| {
                        let mut children = parent.children.clone();
                        children.insert(at, (weight, new_leaf.clone()));
                        Split::new(orientation, children)
                    });
                }
            }
        }

        let wrap = |anchor: &Node| {
            let pair = if forward {
                vec![(1.0, anchor.clone()), (1.0, new_leaf.clone())]
            } else {
                vec![(1.0, new_leaf.clone()), (1.0, anchor.clone())]
            };
            Split::new(orientation, pair)
        };
        if path.is_empty() {
            return Self::with_root(wrap(root));
        }
        self.update_at(&path, wrap)
    }

    /// Returns `None` when `window` is not in the tree.
    pub fn remove(&self, window: &WindowRef) -> Option<Self> {
        let path = self.find(window)?;
        let Some((&index, parent_path)) = path.split_last() else {
            return Some(Self::new());
        };
        Some(self.update_at(parent_path, |parent| match parent {
            Node::Split(split) => {
                let mut children = split.children.clone();
                children.remove(index);
                if children.len() == 1 {
                    children.remove(0).1
                } else {
                    Split::new(split.orientation, children)
                }
            }
            leaf => leaf.clone(),
        }))
    }

    /// Exchanges the leaves holding `a` and `b`.
    pub fn swap(&self, a: &WindowRef, b: &WindowRef) -> Option<Self> {
        let path_a = self.find(a)?;
        let path_b = self.find(b)?;
        if path_a == path_b {
            return None;
        }
        let tree = self.update_at(&path_a, |_| Node::Leaf(b.clone()));
        Some(tree.update_at(&path_b, |_| Node::Leaf(a.clone())))
    }

    /// Pixel rectangles for every window, tiling `rect` exactly.
    pub fn layout(&self, rect: Rect<i32>) -> Vec<(WindowRef, Rect<i32>)> {
        fn go(node: &Node, rect: Rect<i32>, out: &mut Vec<(WindowRef, Rect<i32>)>) {
            match node {
                Node::Leaf(window) => out.push((window.clone(), rect)),
                Node::Split(split) => {
                    let weights: Vec<f64> = split.children.iter().map(|(w, _)| *w).collect();
                    let extent = match split.orientation {
                        Orientation::Horizontal => rect.width,
                        Orientation::Vertical => rect.height,
                    };
                    for ((offset, len), (_, child)) in
                        partition(extent, &weights).into_iter().zip(&split.children)
                    {
                        let child_rect = match split.orientation {
                            Orientation::Horizontal => {
                                Rect::new(rect.x + offset, rect.y, len, rect.height)
                            }
                            Orientation::Vertical => {
                                Rect::new(rect.x, rect.y + offset, rect.width, len)
                            }
                        };
                        go(child, child_rect, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        if let Some(root) = &self.root {
            go(root, rect, &mut out);
        }
        out
    }

    /// Rectangle of the node at `path` within the unit square.
    fn unit_rect(&self, path: &[usize]) -> Option<Rect<f64>> {
        let mut node = self.root.as_ref()?;
        let mut rect = Rect::UNIT;
        for &index in path {
            let Node::Split(split) = node else { return None };
            let weights: Vec<f64> = split.children.iter().map(|(w, _)| *w).collect();
            rect = *partition_unit(rect, split.orientation, &weights).get(index)?;
            node = &split.children.get(index)?.1;
        }
        Some(rect)
    }

    pub fn window_rect(&self, window: &WindowRef) -> Option<Rect<f64>> {
        self.unit_rect(&self.find(window)?)
    }

    /// The leaf containing `point`, with its unit-square rectangle.
    pub fn leaf_at(&self, point: NormalizedPoint) -> Option<(WindowRef, Rect<f64>)> {
        let mut node = self.root.as_ref()?;
        let mut rect = Rect::UNIT;
        if !rect.contains(point) {
            return None;
        }
        loop {
            match node {
                Node::Leaf(window) => return Some((window.clone(), rect)),
                Node::Split(split) => {
                    let weights: Vec<f64> = split.children.iter().map(|(w, _)| *w).collect();
                    let rects = partition_unit(rect, split.orientation, &weights);
                    let index = rects
                        .iter()
                        .position(|r| r.contains(point))
                        .unwrap_or(rects.len() - 1);
                    rect = rects[index];
                    node = &split.children[index].1;
                }
            }
        }
    }

    /// The window on the other side of `window`'s edge in `direction`.
    pub fn neighbour(&self, window: &WindowRef, direction: Direction) -> Option<WindowRef> {
        let rect = self.window_rect(window)?;
        let mid = rect.center();
        let probe = match direction {
            Direction::Left => Point::new(rect.x - PROBE, mid.y),
            Direction::Right => Point::new(rect.right() + PROBE, mid.y),
            Direction::Up => Point::new(mid.x, rect.y - PROBE),
            Direction::Down => Point::new(mid.x, rect.bottom() + PROBE),
        };
        self.leaf_at(probe).map(|(w, _)| w).filter(|w| w != window)
    }

    /// Moves the edge of `window` facing `direction` by `delta` (unit square
    /// of the whole layout, positive is right/down). Returns `None` when no
    /// ancestor can absorb the change.
    pub fn move_edge(&self, window: &WindowRef, direction: Direction, delta: f64) -> Option<Self> {
        if delta == 0.0 || !delta.is_finite() {
            return None;
        }
        let path = self.find(window)?;
        let forward = direction.is_forward();

        for depth in (1..=path.len()).rev() {
            let parent_path = &path[..depth - 1];
            let index = path[depth - 1];
            let Some(Node::Split(parent)) = self.node_at(parent_path) else { continue };
            if parent.orientation != direction.orientation() {
                continue;
            }
            let neighbour = if forward {
                index + 1
            } else {
                match index.checked_sub(1) {
                    Some(i) => i,
                    None => continue,
                }
            };
            if neighbour >= parent.children.len() {
                continue;
            }

            let parent_rect = self.unit_rect(parent_path)?;
            let extent = match parent.orientation {
                Orientation::Horizontal => parent_rect.width,
                Orientation::Vertical => parent_rect.height,
            };
            if extent <= 0.0 {
                return None;
            }
            let total = parent.total_weight();
            let growth = if forward { delta } else { -delta };
            let moved = growth / extent * total;

            let min = MIN_WEIGHT_FRACTION * total;
            let own = parent.children[index].0;
            let pair = own + parent.children[neighbour].0;
            if pair - min < min {
                return None;
            }
            let new_own = (own + moved).clamp(min, pair - min);
            if (new_own - own).abs() < f64::EPSILON {
                return None;
            }

            return Some(self.update_at(parent_path, |_| {
                let mut children = parent.children.clone();
                children[index].0 = new_own;
                children[neighbour].0 = pair - new_own;
                Split::new(parent.orientation, children)
            }));
        }
        None
    }

    pub fn ascii_tree(&self, name: &str) -> ascii_tree::Tree {
        match &self.root {
            Some(root) => ascii_tree::Tree::Node(name.to_string(), vec![root.ascii_tree()]),
            None => ascii_tree::Tree::Leaf(vec![format!("{name} (empty)")]),
        }
    }
}

fn collect_windows(node: &Node, out: &mut Vec<WindowRef>) {
    match node {
        Node::Leaf(window) => out.push(window.clone()),
        Node::Split(split) => {
            for (_, child) in &split.children {
                collect_windows(child, out);
            }
        }
    }
}
