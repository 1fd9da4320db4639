//! Repository ports
//!
//! Use cases depend on these traits only. Each backend implements all of
//! them, which makes it a [`GraphStore`].

use crate::graph::{
    ChildClass, Class, ClassHierarchyEntry, ClassSubclassRelation, GeneralStatement, Literal,
    Predicate, Resource, StatementId, Thing, ThingId,
};
use crate::query::{BundleConfiguration, Page, PageRequest, Sort};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("No free {0} id after repeated attempts")]
    IdExhausted(&'static str),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

pub trait ClassRepository: Send + Sync {
    /// Insert or replace a class
    fn save_class(&self, class: &Class) -> StorageResult<()>;

    /// Insert a class unless some thing already uses its id.
    ///
    /// Returns `false`, writing nothing, when the id is taken.
    fn insert_class(&self, class: &Class) -> StorageResult<bool>;

    fn find_class_by_id(&self, id: &ThingId) -> StorageResult<Option<Class>>;

    /// All classes ordered by id
    fn find_all_classes(&self, page: PageRequest) -> StorageResult<Page<Class>>;

    /// Remove all classes along with their subclass relations
    fn delete_all_classes(&self) -> StorageResult<()>;

    /// A fresh `C`-prefixed id no thing currently uses
    fn next_class_id(&self) -> StorageResult<ThingId>;
}

pub trait ResourceRepository: Send + Sync {
    fn save_resource(&self, resource: &Resource) -> StorageResult<()>;

    /// Like [`ClassRepository::insert_class`], for resources
    fn insert_resource(&self, resource: &Resource) -> StorageResult<bool>;

    fn find_resource_by_id(&self, id: &ThingId) -> StorageResult<Option<Resource>>;

    fn find_all_resources(&self, page: PageRequest) -> StorageResult<Page<Resource>>;

    fn delete_all_resources(&self) -> StorageResult<()>;

    fn next_resource_id(&self) -> StorageResult<ThingId>;
}

pub trait PredicateRepository: Send + Sync {
    fn save_predicate(&self, predicate: &Predicate) -> StorageResult<()>;

    fn insert_predicate(&self, predicate: &Predicate) -> StorageResult<bool>;

    fn find_predicate_by_id(&self, id: &ThingId) -> StorageResult<Option<Predicate>>;

    fn delete_all_predicates(&self) -> StorageResult<()>;

    fn next_predicate_id(&self) -> StorageResult<ThingId>;
}

pub trait LiteralRepository: Send + Sync {
    fn save_literal(&self, literal: &Literal) -> StorageResult<()>;

    fn insert_literal(&self, literal: &Literal) -> StorageResult<bool>;

    fn find_literal_by_id(&self, id: &ThingId) -> StorageResult<Option<Literal>>;

    fn delete_all_literals(&self) -> StorageResult<()>;

    fn next_literal_id(&self) -> StorageResult<ThingId>;
}

/// Lookup of any kind of thing by id
pub trait ThingRepository: Send + Sync {
    fn find_thing_by_id(&self, id: &ThingId) -> StorageResult<Option<Thing>>;
}

pub trait StatementRepository: Send + Sync {
    fn save_statement(&self, statement: &GeneralStatement) -> StorageResult<()>;

    /// Insert a statement unless its id is taken; `false` when it is
    fn insert_statement(&self, statement: &GeneralStatement) -> StorageResult<bool>;

    fn find_statement_by_id(&self, id: &StatementId) -> StorageResult<Option<GeneralStatement>>;

    /// Collect the statements reachable from `id` under `configuration`,
    /// ordered by `sort`.
    ///
    /// Empty when `id` is not the subject of any statement.
    fn fetch_as_bundle(
        &self,
        id: &ThingId,
        configuration: &BundleConfiguration,
        sort: &Sort,
    ) -> StorageResult<Vec<GeneralStatement>>;

    fn delete_all_statements(&self) -> StorageResult<()>;

    /// A fresh `S`-prefixed id no statement currently uses
    fn next_statement_id(&self) -> StorageResult<StatementId>;
}

/// Why a guarded link was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRefusal {
    /// New links were required but the parent already has children
    ParentHasChildren { parent: ThingId },
    /// The child is already attached to `parent`
    ChildHasParent { child: ThingId, parent: ThingId },
    /// The child is the parent itself or one of its ancestors
    Cycle { child: ThingId, parent: ThingId },
}

/// Result of [`ClassRelationRepository::link_relations`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Number of relations written
    Linked(usize),
    /// Nothing was written
    Refused(LinkRefusal),
}

/// Write side of the subclass hierarchy
pub trait ClassRelationRepository: Send + Sync {
    /// Store a relation, replacing any existing parent of the child
    fn save_relation(&self, relation: &ClassSubclassRelation) -> StorageResult<()>;

    /// Store several relations atomically: all of them or none
    fn save_all_relations(&self, relations: &[ClassSubclassRelation]) -> StorageResult<()>;

    /// Validate and store relations under one lock or transaction.
    ///
    /// Every relation is checked against the state before the batch, and
    /// the first failing check refuses the whole batch:
    ///
    /// - with `must_not_exist`, the parent must have no children and the
    ///   child no parent;
    /// - without it, a child already under the requested parent is skipped
    ///   and a child under any other parent is refused;
    /// - a child that is the parent or one of its ancestors is refused.
    fn link_relations(
        &self,
        relations: &[ClassSubclassRelation],
        must_not_exist: bool,
    ) -> StorageResult<LinkOutcome>;

    /// Remove the parent edge of a child; no-op if it has none
    fn delete_relation_by_child_id(&self, child_id: &ThingId) -> StorageResult<()>;

    fn delete_all_relations(&self) -> StorageResult<()>;
}

/// Read side of the subclass hierarchy
///
/// Paged results are ordered by class id ascending.
pub trait ClassHierarchyRepository: Send + Sync {
    /// The direct parent of a class, if any
    fn find_parent_by_child_id(&self, child_id: &ThingId) -> StorageResult<Option<Class>>;

    /// Direct children of a class, each with its own direct-children count
    fn find_all_children_by_ancestor_id(
        &self,
        id: &ThingId,
        page: PageRequest,
    ) -> StorageResult<Page<ChildClass>>;

    /// The topmost ancestor; `None` for roots themselves and unknown ids
    fn find_root_by_descendant_id(&self, id: &ThingId) -> StorageResult<Option<Class>>;

    /// Classes without a parent, including isolated ones
    fn find_all_roots(&self, page: PageRequest) -> StorageResult<Page<Class>>;

    /// Whether `child_id` is a descendant of `id` at any depth
    fn exists_child(&self, id: &ThingId, child_id: &ThingId) -> StorageResult<bool>;

    /// Whether `id` has at least one direct child
    fn exists_children(&self, id: &ThingId) -> StorageResult<bool>;

    /// Distinct resources that are instances of `id` or of any descendant
    fn count_class_instances(&self, id: &ThingId) -> StorageResult<u64>;

    /// The class and all of its ancestors, each with its parent id
    fn find_class_hierarchy(
        &self,
        id: &ThingId,
        page: PageRequest,
    ) -> StorageResult<Page<ClassHierarchyEntry>>;
}

/// A backend implementing every repository port
pub trait GraphStore:
    ClassRepository
    + ResourceRepository
    + PredicateRepository
    + LiteralRepository
    + ThingRepository
    + StatementRepository
    + ClassRelationRepository
    + ClassHierarchyRepository
{
}

impl<T> GraphStore for T where
    T: ClassRepository
        + ResourceRepository
        + PredicateRepository
        + LiteralRepository
        + ThingRepository
        + StatementRepository
        + ClassRelationRepository
        + ClassHierarchyRepository
{
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
