//! Error Types
//!
//! Failures of the issue operations, grouped as validation errors (bad client
//! input), not-found errors (project or issue absent) and persistence errors.

use thiserror::Error;

use crate::database::DatabaseError;
use crate::domain::IssueId;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("required field(s) missing")]
    MissingRequiredFields,
    #[error("missing _id")]
    MissingId,
    #[error("invalid issue id '{0}'")]
    InvalidId(String),
    #[error("malformed field: {0}")]
    InvalidField(String),
    #[error("no update field(s) sent")]
    NoUpdateFields,
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("issue {0} not found")]
    IssueNotFound(IssueId),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl IssueError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IssueError::MissingRequiredFields
                | IssueError::MissingId
                | IssueError::InvalidId(_)
                | IssueError::InvalidField(_)
                | IssueError::NoUpdateFields
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, IssueError::ProjectNotFound(_) | IssueError::IssueNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, IssueError>;
