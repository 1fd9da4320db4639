//! orkg-graph: knowledge graph core
//!
//! A graph of things (classes, resources, predicates, literals) connected
//! by statements, with a single-parent class hierarchy and bounded
//! statement bundle traversal.
//!
//! # Core Concepts
//!
//! - **Things**: nodes of the graph, addressed by a `ThingId`
//! - **Statements**: subject-predicate-object triples between things
//! - **Class hierarchy**: a forest of subclass relations between classes
//! - **Bundles**: the statements reachable from a thing, filtered by depth
//!   and by the classes of the objects
//!
//! # Example
//!
//! ```
//! use orkg_graph::{ContributorId, GraphApi, InMemoryStore};
//! use std::sync::Arc;
//!
//! let api = GraphApi::new(Arc::new(InMemoryStore::new()));
//! let paper = api.create_class(ContributorId::UNKNOWN, "Paper", None, None).unwrap();
//! assert!(api.parent(&paper.id).unwrap().is_none());
//! ```

pub mod api;
pub mod config;
mod graph;
pub mod mcp;
pub mod query;
pub mod service;
pub mod storage;

pub use api::GraphApi;
pub use graph::{
    is_valid_label, prefix, pseudo_class, ChildClass, Class, ClassHierarchyEntry,
    ClassSubclassRelation, ContributorId, ErrorKind, GeneralStatement, GraphError, GraphResult,
    Literal, Predicate, Resource, StatementId, Thing, ThingId, DEFAULT_DATATYPE, MAX_LABEL_LENGTH,
};
pub use query::{Bundle, BundleConfiguration, Order, Page, PageRequest, Sort, SortDirection};
pub use storage::{
    GraphStore, InMemoryStore, LinkOutcome, LinkRefusal, OpenStore, SqliteStore, StorageError,
    StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
