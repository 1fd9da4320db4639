//! Creation and lookup of things and statements

use crate::graph::{
    is_valid_label, Class, ContributorId, GeneralStatement, GraphError, GraphResult, Literal,
    Predicate, Resource, Thing, ThingId,
};
use crate::storage::{
    ClassRepository, LiteralRepository, PredicateRepository, ResourceRepository,
    StatementRepository, StorageError, StorageResult, ThingRepository,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ids minted per create before giving up
const MAX_ID_ATTEMPTS: usize = 16;

/// Input for creating a class
#[derive(Debug, Clone, Default)]
pub struct CreateClass {
    pub label: String,
    pub uri: Option<String>,
    pub description: Option<String>,
}

/// Input for creating a statement
#[derive(Debug, Clone)]
pub struct CreateStatement {
    pub subject_id: ThingId,
    pub predicate_id: ThingId,
    pub object_id: ThingId,
    pub index: Option<i64>,
}

pub struct ThingService {
    classes: Arc<dyn ClassRepository>,
    resources: Arc<dyn ResourceRepository>,
    predicates: Arc<dyn PredicateRepository>,
    literals: Arc<dyn LiteralRepository>,
    things: Arc<dyn ThingRepository>,
    statements: Arc<dyn StatementRepository>,
}

fn check_label(label: &str) -> GraphResult<()> {
    if is_valid_label(label) {
        Ok(())
    } else {
        warn!("rejected invalid label");
        Err(GraphError::InvalidLabel)
    }
}

/// Mint an id, build the entity and insert it unless the id was taken in
/// the meantime, in which case a new id is minted.
fn insert_fresh<I, T>(
    kind: &'static str,
    mut next_id: impl FnMut() -> StorageResult<I>,
    mut build: impl FnMut(I) -> T,
    mut insert: impl FnMut(&T) -> StorageResult<bool>,
) -> GraphResult<T> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let entity = build(next_id()?);
        if insert(&entity)? {
            return Ok(entity);
        }
        debug!(kind, "id taken by a concurrent insert");
    }
    warn!(kind, attempts = MAX_ID_ATTEMPTS, "no free id");
    Err(StorageError::IdExhausted(kind).into())
}

impl ThingService {
    pub fn new(
        classes: Arc<dyn ClassRepository>,
        resources: Arc<dyn ResourceRepository>,
        predicates: Arc<dyn PredicateRepository>,
        literals: Arc<dyn LiteralRepository>,
        things: Arc<dyn ThingRepository>,
        statements: Arc<dyn StatementRepository>,
    ) -> Self {
        Self {
            classes,
            resources,
            predicates,
            literals,
            things,
            statements,
        }
    }

    pub fn create_class(&self, contributor: ContributorId, command: CreateClass) -> GraphResult<Class> {
        check_label(&command.label)?;
        let class = insert_fresh(
            "class",
            || self.classes.next_class_id(),
            |id| Class {
                uri: command.uri.clone(),
                description: command.description.clone(),
                ..Class::new(id, command.label.as_str()).created_by(contributor)
            },
            |class| self.classes.insert_class(class),
        )?;
        info!(class = %class.id, "class created");
        Ok(class)
    }

    /// Create a resource; every listed class must exist.
    pub fn create_resource(
        &self,
        contributor: ContributorId,
        label: &str,
        classes: &[ThingId],
    ) -> GraphResult<Resource> {
        check_label(label)?;
        for class_id in classes {
            if self.classes.find_class_by_id(class_id)?.is_none() {
                warn!(class = %class_id, "resource class not found");
                return Err(GraphError::ClassNotFound(class_id.clone()));
            }
        }
        let resource = insert_fresh(
            "resource",
            || self.resources.next_resource_id(),
            |id| {
                Resource::new(id, label)
                    .with_classes(classes.iter().cloned())
                    .created_by(contributor)
            },
            |resource| self.resources.insert_resource(resource),
        )?;
        info!(resource = %resource.id, "resource created");
        Ok(resource)
    }

    pub fn create_predicate(&self, contributor: ContributorId, label: &str) -> GraphResult<Predicate> {
        check_label(label)?;
        let predicate = insert_fresh(
            "predicate",
            || self.predicates.next_predicate_id(),
            |id| Predicate::new(id, label).created_by(contributor),
            |predicate| self.predicates.insert_predicate(predicate),
        )?;
        info!(predicate = %predicate.id, "predicate created");
        Ok(predicate)
    }

    /// Literal values may span lines; only the length is bounded.
    pub fn create_literal(
        &self,
        contributor: ContributorId,
        label: &str,
        datatype: Option<&str>,
    ) -> GraphResult<Literal> {
        if label.chars().count() > crate::graph::MAX_LABEL_LENGTH {
            return Err(GraphError::InvalidLabel);
        }
        let literal = insert_fresh(
            "literal",
            || self.literals.next_literal_id(),
            |id| {
                let literal = Literal::new(id, label).created_by(contributor);
                match datatype {
                    Some(datatype) => literal.with_datatype(datatype),
                    None => literal,
                }
            },
            |literal| self.literals.insert_literal(literal),
        )?;
        info!(literal = %literal.id, "literal created");
        Ok(literal)
    }

    pub fn create_statement(
        &self,
        contributor: ContributorId,
        command: CreateStatement,
    ) -> GraphResult<GeneralStatement> {
        let subject = self.require_thing(&command.subject_id)?;
        let predicate = self
            .predicates
            .find_predicate_by_id(&command.predicate_id)?
            .ok_or_else(|| {
                warn!(predicate = %command.predicate_id, "predicate not found");
                GraphError::PredicateNotFound(command.predicate_id.clone())
            })?;
        let object = self.require_thing(&command.object_id)?;

        let statement = insert_fresh(
            "statement",
            || self.statements.next_statement_id(),
            |id| GeneralStatement {
                index: command.index,
                ..GeneralStatement::new(id, subject.clone(), predicate.clone(), object.clone())
                    .created_by(contributor)
            },
            |statement| self.statements.insert_statement(statement),
        )?;
        info!(statement = %statement.id, "statement created");
        Ok(statement)
    }

    pub fn find_class(&self, id: &ThingId) -> GraphResult<Class> {
        self.classes
            .find_class_by_id(id)?
            .ok_or_else(|| GraphError::ClassNotFound(id.clone()))
    }

    pub fn find_thing(&self, id: &ThingId) -> GraphResult<Thing> {
        self.require_thing(id)
    }

    fn require_thing(&self, id: &ThingId) -> GraphResult<Thing> {
        self.things.find_thing_by_id(id)?.ok_or_else(|| {
            warn!(thing = %id, "thing not found");
            GraphError::ThingNotFound(id.clone())
        })
    }
}
