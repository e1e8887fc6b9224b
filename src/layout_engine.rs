mod engine;
mod graph;
pub mod proxy;
mod resize;
pub mod split_tree;
pub mod systems;

pub use engine::{
    Engine, LayoutEngine, LayoutEngineIdentity, LayoutEngineKind, WindowSize, WindowState,
};
pub use graph::{Direction, Orientation};
pub use proxy::{
    BarEngine, FloatingEngine, GapsEngine, ProxyLayoutEngine, proxies_from_settings,
};
pub use resize::Edges;
pub use systems::{ColumnEngine, TreeEngine, engines_from_settings};
