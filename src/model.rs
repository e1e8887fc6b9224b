pub mod workspace;

pub use workspace::{Workspace, WorkspaceContext, WorkspaceError, WorkspaceId};
