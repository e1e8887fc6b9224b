use serde::{Deserialize, Serialize};

use crate::layout_engine::LayoutEngineIdentity;
use crate::model::WorkspaceId;

/// Notifications for widgets outside the layout core (bars, focus
/// indicators, previews).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum BroadcastEvent {
    WorkspaceRenamed {
        workspace_id: WorkspaceId,
        old_name: String,
        new_name: String,
    },
    ActiveLayoutEngineChanged {
        workspace_id: WorkspaceId,
        previous: String,
        current: String,
    },
    WorkspaceLayoutStarted {
        workspace_id: WorkspaceId,
    },
    WorkspaceLayoutCompleted {
        workspace_id: WorkspaceId,
        windows: usize,
    },
    PhantomWindowAdded {
        workspace_id: WorkspaceId,
        engine: LayoutEngineIdentity,
        window: String,
    },
    PhantomWindowRemoved {
        workspace_id: WorkspaceId,
        engine: LayoutEngineIdentity,
        window: String,
    },
    TreeLayoutChanged {
        engine: LayoutEngineIdentity,
        windows: Vec<String>,
    },
}

pub type BroadcastSender = crate::actor::Sender<BroadcastEvent>;
pub type BroadcastReceiver = crate::actor::Receiver<BroadcastEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let event = BroadcastEvent::WorkspaceLayoutStarted { workspace_id: WorkspaceId::new() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "workspace_layout_started");
    }
}
