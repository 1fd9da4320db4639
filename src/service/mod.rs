//! Use cases over the repository ports

mod class_hierarchy;
mod statements;
mod things;

pub use class_hierarchy::ClassHierarchyService;
pub use statements::StatementService;
pub use things::{CreateClass, CreateStatement, ThingService};
