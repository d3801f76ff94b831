//! Error taxonomy shared by every pipeline stage.

use thiserror::Error;

use crate::collab::CollaboratorError;
use crate::record::StoreError;
use crate::storage::StorageError;
use crate::video::AssemblyError;

/// Failure of a pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Referenced topic or script does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An external service failed and the stage has no fallback.
    #[error("{service} failed: {source}")]
    Collaborator {
        service: &'static str,
        #[source]
        source: CollaboratorError,
    },

    /// The record is not in a state that allows this stage.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("Asset storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn collaborator(service: &'static str, source: CollaboratorError) -> Self {
        Self::Collaborator { service, source }
    }

    pub fn script_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "script",
            id: id.into(),
        }
    }

    pub fn topic_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "topic",
            id: id.into(),
        }
    }

    /// Stable category name used in logs and metrics labels.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Collaborator { .. } => "collaborator",
            Self::Precondition(_) => "precondition",
            Self::Assembly(_) => "assembly",
            Self::Storage(_) => "storage",
            Self::Store(_) => "store",
        }
    }
}

/// Ordering conflicts in the store surface as precondition failures; the
/// loser of a race sees the same error as an out-of-order caller.
impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            StoreError::StaleStatus { .. }
            | StoreError::StaleRevision { .. }
            | StoreError::InvalidTransition { .. }
            | StoreError::DuplicateScript(_) => Self::Precondition(e.to_string()),
            StoreError::Database(_) => Self::Store(e),
        }
    }
}
