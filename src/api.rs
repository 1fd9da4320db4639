//! Transport-independent API layer.
//!
//! `GraphApi` is the single entry point for all consumer-facing operations.
//! Transports (MCP, CLI, direct embedding) call `GraphApi` methods and
//! never reach into the services or storage directly.

use std::sync::Arc;

use crate::graph::{
    ChildClass, Class, ClassHierarchyEntry, ContributorId, GeneralStatement, GraphResult, Literal,
    Predicate, Resource, Thing, ThingId,
};
use crate::query::{Bundle, BundleConfiguration, Page, PageRequest, Sort};
use crate::service::{
    ClassHierarchyService, CreateClass, CreateStatement, StatementService, ThingService,
};
use crate::storage::GraphStore;

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct GraphApi {
    hierarchy: Arc<ClassHierarchyService>,
    statements: Arc<StatementService>,
    things: Arc<ThingService>,
}

impl GraphApi {
    /// Wire all services to one backing store.
    pub fn new<S: GraphStore + 'static>(store: Arc<S>) -> Self {
        let hierarchy =
            ClassHierarchyService::new(store.clone(), store.clone(), store.clone());
        let statements = StatementService::new(store.clone(), store.clone());
        let things = ThingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        );
        Self {
            hierarchy: Arc::new(hierarchy),
            statements: Arc::new(statements),
            things: Arc::new(things),
        }
    }

    // --- Things ---

    pub fn create_class(
        &self,
        contributor: ContributorId,
        label: &str,
        uri: Option<&str>,
        description: Option<&str>,
    ) -> GraphResult<Class> {
        self.things.create_class(
            contributor,
            CreateClass {
                label: label.to_string(),
                uri: uri.map(str::to_string),
                description: description.map(str::to_string),
            },
        )
    }

    pub fn create_resource(
        &self,
        contributor: ContributorId,
        label: &str,
        classes: &[ThingId],
    ) -> GraphResult<Resource> {
        self.things.create_resource(contributor, label, classes)
    }

    pub fn create_predicate(&self, contributor: ContributorId, label: &str) -> GraphResult<Predicate> {
        self.things.create_predicate(contributor, label)
    }

    pub fn create_literal(
        &self,
        contributor: ContributorId,
        label: &str,
        datatype: Option<&str>,
    ) -> GraphResult<Literal> {
        self.things.create_literal(contributor, label, datatype)
    }

    pub fn create_statement(
        &self,
        contributor: ContributorId,
        subject_id: &ThingId,
        predicate_id: &ThingId,
        object_id: &ThingId,
        index: Option<i64>,
    ) -> GraphResult<GeneralStatement> {
        self.things.create_statement(
            contributor,
            CreateStatement {
                subject_id: subject_id.clone(),
                predicate_id: predicate_id.clone(),
                object_id: object_id.clone(),
                index,
            },
        )
    }

    pub fn find_class(&self, id: &ThingId) -> GraphResult<Class> {
        self.things.find_class(id)
    }

    pub fn find_thing(&self, id: &ThingId) -> GraphResult<Thing> {
        self.things.find_thing(id)
    }

    // --- Class hierarchy: write ---

    /// Attach children to a class that has none yet. A parent with
    /// subclasses, or a child that already has any parent, is a conflict.
    pub fn add_children(
        &self,
        contributor: ContributorId,
        parent_id: &ThingId,
        child_ids: &[ThingId],
    ) -> GraphResult<()> {
        self.hierarchy.create(contributor, parent_id, child_ids, true)
    }

    /// Attach children to a class, tolerating children already attached
    /// to it.
    pub fn upsert_children(
        &self,
        contributor: ContributorId,
        parent_id: &ThingId,
        child_ids: &[ThingId],
    ) -> GraphResult<()> {
        self.hierarchy.create(contributor, parent_id, child_ids, false)
    }

    /// Give a class a parent; repeating the same call is a no-op.
    pub fn set_parent(
        &self,
        contributor: ContributorId,
        child_id: &ThingId,
        parent_id: &ThingId,
    ) -> GraphResult<()> {
        self.hierarchy
            .create(contributor, parent_id, std::slice::from_ref(child_id), false)
    }

    /// Detach a class from its parent.
    pub fn remove_parent(&self, child_id: &ThingId) -> GraphResult<()> {
        self.hierarchy.delete(child_id)
    }

    // --- Class hierarchy: read ---

    pub fn children(&self, id: &ThingId, page: PageRequest) -> GraphResult<Page<ChildClass>> {
        self.hierarchy.find_children(id, page)
    }

    pub fn parent(&self, id: &ThingId) -> GraphResult<Option<Class>> {
        self.hierarchy.find_parent(id)
    }

    pub fn root(&self, id: &ThingId) -> GraphResult<Option<Class>> {
        self.hierarchy.find_root(id)
    }

    pub fn roots(&self, page: PageRequest) -> GraphResult<Page<Class>> {
        self.hierarchy.find_all_roots(page)
    }

    pub fn hierarchy(
        &self,
        id: &ThingId,
        page: PageRequest,
    ) -> GraphResult<Page<ClassHierarchyEntry>> {
        self.hierarchy.find_class_hierarchy(id, page)
    }

    pub fn count_instances(&self, id: &ThingId) -> GraphResult<u64> {
        self.hierarchy.count_class_instances(id)
    }

    // --- Bundles ---

    pub fn bundle(
        &self,
        thing_id: &ThingId,
        configuration: &BundleConfiguration,
        include_first: bool,
        sort: &Sort,
    ) -> GraphResult<Bundle> {
        self.statements
            .fetch_as_bundle(thing_id, configuration, include_first, sort)
    }
}
