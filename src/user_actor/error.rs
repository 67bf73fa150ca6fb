use thiserror::Error;

use crate::actor_framework::{FrameworkError, TableError};
use crate::domain::Role;
use crate::policy::Operation;

/// Errors that can occur during user directory operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("User already exists: {0}")]
    AlreadyExists(String),
    #[error("User validation error: {0}")]
    ValidationError(String),
    #[error("Forbidden: {role} may not {operation}")]
    Forbidden { role: Role, operation: Operation },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for UserError {
    fn from(value: FrameworkError) -> Self {
        match value {
            FrameworkError::Table(TableError::NotFound { id, .. }) => {
                UserError::NotFound(id.to_string())
            }
            FrameworkError::Table(TableError::Duplicate { key, .. }) => UserError::AlreadyExists(key),
            FrameworkError::Table(TableError::Rejected { reason, .. }) => {
                UserError::ValidationError(reason)
            }
            other => UserError::ActorCommunicationError(other.to_string()),
        }
    }
}
