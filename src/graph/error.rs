//! Errors surfaced by graph operations

use super::id::ThingId;
use crate::storage::{LinkRefusal, StorageError};
use thiserror::Error;

/// Errors that can occur in graph use cases
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Class \"{0}\" not found.")]
    ClassNotFound(ThingId),

    #[error("Thing \"{0}\" not found.")]
    ThingNotFound(ThingId),

    #[error("Predicate \"{0}\" not found.")]
    PredicateNotFound(ThingId),

    #[error("The class \"{child}\" cannot be a subclass of \"{parent}\".")]
    InvalidSubclassRelation { child: ThingId, parent: ThingId },

    #[error("The class \"{child}\" already has a parent class ({parent}).")]
    ParentClassAlreadyExists { child: ThingId, parent: ThingId },

    #[error("The class \"{0}\" already has subclasses.")]
    ParentClassAlreadyHasChildren(ThingId),

    #[error("A label must be a single line of at most {max} characters.", max = super::thing::MAX_LABEL_LENGTH)]
    InvalidLabel,

    #[error("Unknown sort property \"{0}\".")]
    InvalidSortProperty(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Coarse classification of errors, for transports that map errors to statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidRelation,
    Conflict,
    InvalidInput,
    Internal,
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::ClassNotFound(_)
            | GraphError::ThingNotFound(_)
            | GraphError::PredicateNotFound(_) => ErrorKind::NotFound,
            GraphError::InvalidSubclassRelation { .. } => ErrorKind::InvalidRelation,
            GraphError::ParentClassAlreadyExists { .. }
            | GraphError::ParentClassAlreadyHasChildren(_) => ErrorKind::Conflict,
            GraphError::InvalidLabel | GraphError::InvalidSortProperty(_) => ErrorKind::InvalidInput,
            GraphError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<LinkRefusal> for GraphError {
    fn from(refusal: LinkRefusal) -> Self {
        match refusal {
            LinkRefusal::ParentHasChildren { parent } => {
                GraphError::ParentClassAlreadyHasChildren(parent)
            }
            LinkRefusal::ChildHasParent { child, parent } => {
                GraphError::ParentClassAlreadyExists { child, parent }
            }
            LinkRefusal::Cycle { child, parent } => {
                GraphError::InvalidSubclassRelation { child, parent }
            }
        }
    }
}

impl ErrorKind {
    /// HTTP-style status code: conflicts are reported as bad requests.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidRelation | ErrorKind::Conflict | ErrorKind::InvalidInput => 400,
            ErrorKind::Internal => 500,
        }
    }
}
