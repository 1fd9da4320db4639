//! Storage backends
//!
//! Every backend implements the repository ports in `traits`, which
//! together make up a `GraphStore`. `SqliteStore` persists to disk;
//! `InMemoryStore` is for tests and ephemeral sessions.

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{
    ClassHierarchyRepository, ClassRelationRepository, ClassRepository, GraphStore, LinkOutcome,
    LinkRefusal, LiteralRepository, OpenStore, PredicateRepository, ResourceRepository, StatementRepository,
    StorageError, StorageResult, ThingRepository,
};
