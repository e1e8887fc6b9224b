//! The engines that actually arrange windows. Everything else in the layout
//! pipeline is a proxy around one of these.

mod column;
mod tree;

pub use column::ColumnEngine;
pub use tree::TreeEngine;

use super::Engine;
use crate::actor::broadcast::BroadcastSender;
use crate::common::config::{EngineKind, EngineSettings};

/// Builds a fresh engine rotation, one engine per entry, each with its own
/// identity.
pub fn engines_from_settings(
    settings: &[EngineSettings],
    events: Option<&BroadcastSender>,
) -> Vec<Engine> {
    settings
        .iter()
        .map(|s| match s.kind {
            EngineKind::Column => Engine::new(ColumnEngine::new(s.display_name(), s.left_to_right)),
            EngineKind::Tree => {
                let tree = TreeEngine::new(s.display_name(), s.add_direction);
                match events {
                    Some(events) => Engine::new(tree.with_events(events.clone())),
                    None => Engine::new(tree),
                }
            }
        })
        .collect()
}
