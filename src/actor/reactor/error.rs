use thiserror::Error;

use crate::model::WorkspaceError;

#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("At least one workspace must be configured")]
    NoWorkspaces,
    #[error("Workspace could not be created: {0}")]
    Workspace(#[from] WorkspaceError),
}
