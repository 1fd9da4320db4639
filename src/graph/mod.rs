//! Core graph data structures

mod error;
mod hierarchy;
mod id;
mod statement;
mod thing;


pub use error::{ErrorKind, GraphError, GraphResult};
pub use hierarchy::{ChildClass, ClassHierarchyEntry, ClassSubclassRelation};
pub use id::{prefix, ContributorId, StatementId, ThingId};
pub use statement::GeneralStatement;
pub use thing::{
    is_valid_label, pseudo_class, Class, Literal, Predicate, Resource, Thing, DEFAULT_DATATYPE,
    MAX_LABEL_LENGTH,
};
