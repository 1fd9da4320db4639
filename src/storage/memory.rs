//! In-memory storage backend
//!
//! Keeps every entity in ordered maps behind a single `RwLock`. The subclass
//! hierarchy is a parent-pointer map plus a children index for downward
//! lookups.

use super::traits::{
    ClassHierarchyRepository, ClassRelationRepository, ClassRepository, LinkOutcome, LinkRefusal,
    LiteralRepository, PredicateRepository, ResourceRepository, StatementRepository, StorageError,
    StorageResult, ThingRepository,
};
use crate::graph::{
    prefix, ChildClass, Class, ClassHierarchyEntry, ClassSubclassRelation, GeneralStatement,
    Literal, Predicate, Resource, StatementId, Thing, ThingId,
};
use crate::query::{BundleConfiguration, BundleTraversal, Page, PageRequest, Sort};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    classes: BTreeMap<ThingId, Class>,
    resources: BTreeMap<ThingId, Resource>,
    predicates: BTreeMap<ThingId, Predicate>,
    literals: BTreeMap<ThingId, Literal>,
    statements: BTreeMap<StatementId, GeneralStatement>,
    /// child id -> parent id
    parents: HashMap<ThingId, ThingId>,
    /// parent id -> direct children
    children: HashMap<ThingId, BTreeSet<ThingId>>,
    /// subject id -> statements with that subject
    subjects: HashMap<ThingId, BTreeSet<StatementId>>,
}

impl State {
    fn thing_exists(&self, id: &ThingId) -> bool {
        self.classes.contains_key(id)
            || self.resources.contains_key(id)
            || self.predicates.contains_key(id)
            || self.literals.contains_key(id)
    }

    fn next_thing_id(&self, prefix: char, count: usize) -> ThingId {
        let mut n = count as u64 + 1;
        loop {
            let id = ThingId::numbered(prefix, n);
            if !self.thing_exists(&id) {
                return id;
            }
            n += 1;
        }
    }

    fn insert_relation(&mut self, relation: &ClassSubclassRelation) {
        let child_id = relation.child.id.clone();
        self.remove_relation(&child_id);
        self.children
            .entry(relation.parent.id.clone())
            .or_default()
            .insert(child_id.clone());
        self.parents.insert(child_id, relation.parent.id.clone());
    }

    fn remove_relation(&mut self, child_id: &ThingId) {
        if let Some(parent_id) = self.parents.remove(child_id) {
            if let Some(siblings) = self.children.get_mut(&parent_id) {
                siblings.remove(child_id);
                if siblings.is_empty() {
                    self.children.remove(&parent_id);
                }
            }
        }
    }

    /// `Ok(false)` when the child already sits under the requested parent.
    fn check_link(
        &self,
        relation: &ClassSubclassRelation,
        must_not_exist: bool,
    ) -> Result<bool, LinkRefusal> {
        let child = &relation.child.id;
        let parent = &relation.parent.id;
        if must_not_exist && self.child_count(parent) > 0 {
            return Err(LinkRefusal::ParentHasChildren {
                parent: parent.clone(),
            });
        }
        match self.parent_id(child) {
            Some(current) if must_not_exist || current != parent => {
                return Err(LinkRefusal::ChildHasParent {
                    child: child.clone(),
                    parent: current.clone(),
                })
            }
            Some(_) => return Ok(false),
            None => {}
        }
        if self.ancestry(parent).contains(child) {
            return Err(LinkRefusal::Cycle {
                child: child.clone(),
                parent: parent.clone(),
            });
        }
        Ok(true)
    }

    fn put_statement(&mut self, statement: &GeneralStatement) {
        if let Some(old) = self.statements.get(&statement.id).map(|s| s.subject.id().clone()) {
            if let Some(ids) = self.subjects.get_mut(&old) {
                ids.remove(&statement.id);
            }
        }
        self.subjects
            .entry(statement.subject.id().clone())
            .or_default()
            .insert(statement.id.clone());
        self.statements
            .insert(statement.id.clone(), statement.clone());
    }

    fn parent_id(&self, id: &ThingId) -> Option<&ThingId> {
        self.parents.get(id)
    }

    fn child_count(&self, id: &ThingId) -> u64 {
        self.children.get(id).map_or(0, |c| c.len() as u64)
    }

    /// `id` followed by its ancestors, nearest first. Stops on a repeated id.
    fn ancestry(&self, id: &ThingId) -> Vec<ThingId> {
        let mut seen: HashSet<&ThingId> = HashSet::new();
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(class_id) = current {
            if !seen.insert(class_id) {
                break;
            }
            chain.push(class_id.clone());
            current = self.parent_id(class_id);
        }
        chain
    }

    /// `id` and every class below it.
    fn descendants_inclusive(&self, id: &ThingId) -> HashSet<ThingId> {
        let mut found: HashSet<ThingId> = HashSet::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if !found.insert(current.clone()) {
                continue;
            }
            if let Some(children) = self.children.get(&current) {
                stack.extend(children.iter().cloned());
            }
        }
        found
    }

    fn outgoing(&self, subject: &ThingId) -> Vec<GeneralStatement> {
        self.subjects
            .get(subject)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.statements.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Storage backend holding everything in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl ClassRepository for InMemoryStore {
    fn save_class(&self, class: &Class) -> StorageResult<()> {
        self.write()?.classes.insert(class.id.clone(), class.clone());
        Ok(())
    }

    fn insert_class(&self, class: &Class) -> StorageResult<bool> {
        let mut state = self.write()?;
        if state.thing_exists(&class.id) {
            return Ok(false);
        }
        state.classes.insert(class.id.clone(), class.clone());
        Ok(true)
    }

    fn find_class_by_id(&self, id: &ThingId) -> StorageResult<Option<Class>> {
        Ok(self.read()?.classes.get(id).cloned())
    }

    fn find_all_classes(&self, page: PageRequest) -> StorageResult<Page<Class>> {
        let state = self.read()?;
        Ok(Page::slice(state.classes.values().cloned().collect(), page))
    }

    fn delete_all_classes(&self) -> StorageResult<()> {
        let mut state = self.write()?;
        state.classes.clear();
        state.parents.clear();
        state.children.clear();
        Ok(())
    }

    fn next_class_id(&self) -> StorageResult<ThingId> {
        let state = self.read()?;
        Ok(state.next_thing_id(prefix::CLASS, state.classes.len()))
    }
}

impl ResourceRepository for InMemoryStore {
    fn save_resource(&self, resource: &Resource) -> StorageResult<()> {
        self.write()?
            .resources
            .insert(resource.id.clone(), resource.clone());
        Ok(())
    }

    fn insert_resource(&self, resource: &Resource) -> StorageResult<bool> {
        let mut state = self.write()?;
        if state.thing_exists(&resource.id) {
            return Ok(false);
        }
        state.resources.insert(resource.id.clone(), resource.clone());
        Ok(true)
    }

    fn find_resource_by_id(&self, id: &ThingId) -> StorageResult<Option<Resource>> {
        Ok(self.read()?.resources.get(id).cloned())
    }

    fn find_all_resources(&self, page: PageRequest) -> StorageResult<Page<Resource>> {
        let state = self.read()?;
        Ok(Page::slice(state.resources.values().cloned().collect(), page))
    }

    fn delete_all_resources(&self) -> StorageResult<()> {
        self.write()?.resources.clear();
        Ok(())
    }

    fn next_resource_id(&self) -> StorageResult<ThingId> {
        let state = self.read()?;
        Ok(state.next_thing_id(prefix::RESOURCE, state.resources.len()))
    }
}

impl PredicateRepository for InMemoryStore {
    fn save_predicate(&self, predicate: &Predicate) -> StorageResult<()> {
        self.write()?
            .predicates
            .insert(predicate.id.clone(), predicate.clone());
        Ok(())
    }

    fn insert_predicate(&self, predicate: &Predicate) -> StorageResult<bool> {
        let mut state = self.write()?;
        if state.thing_exists(&predicate.id) {
            return Ok(false);
        }
        state
            .predicates
            .insert(predicate.id.clone(), predicate.clone());
        Ok(true)
    }

    fn find_predicate_by_id(&self, id: &ThingId) -> StorageResult<Option<Predicate>> {
        Ok(self.read()?.predicates.get(id).cloned())
    }

    fn delete_all_predicates(&self) -> StorageResult<()> {
        self.write()?.predicates.clear();
        Ok(())
    }

    fn next_predicate_id(&self) -> StorageResult<ThingId> {
        let state = self.read()?;
        Ok(state.next_thing_id(prefix::PREDICATE, state.predicates.len()))
    }
}

impl LiteralRepository for InMemoryStore {
    fn save_literal(&self, literal: &Literal) -> StorageResult<()> {
        self.write()?
            .literals
            .insert(literal.id.clone(), literal.clone());
        Ok(())
    }

    fn insert_literal(&self, literal: &Literal) -> StorageResult<bool> {
        let mut state = self.write()?;
        if state.thing_exists(&literal.id) {
            return Ok(false);
        }
        state.literals.insert(literal.id.clone(), literal.clone());
        Ok(true)
    }

    fn find_literal_by_id(&self, id: &ThingId) -> StorageResult<Option<Literal>> {
        Ok(self.read()?.literals.get(id).cloned())
    }

    fn delete_all_literals(&self) -> StorageResult<()> {
        self.write()?.literals.clear();
        Ok(())
    }

    fn next_literal_id(&self) -> StorageResult<ThingId> {
        let state = self.read()?;
        Ok(state.next_thing_id(prefix::LITERAL, state.literals.len()))
    }
}

impl ThingRepository for InMemoryStore {
    fn find_thing_by_id(&self, id: &ThingId) -> StorageResult<Option<Thing>> {
        let state = self.read()?;
        let thing = state
            .classes
            .get(id)
            .cloned()
            .map(Thing::from)
            .or_else(|| state.resources.get(id).cloned().map(Thing::from))
            .or_else(|| state.predicates.get(id).cloned().map(Thing::from))
            .or_else(|| state.literals.get(id).cloned().map(Thing::from));
        Ok(thing)
    }
}

impl StatementRepository for InMemoryStore {
    fn save_statement(&self, statement: &GeneralStatement) -> StorageResult<()> {
        self.write()?.put_statement(statement);
        Ok(())
    }

    fn insert_statement(&self, statement: &GeneralStatement) -> StorageResult<bool> {
        let mut state = self.write()?;
        if state.statements.contains_key(&statement.id) {
            return Ok(false);
        }
        state.put_statement(statement);
        Ok(true)
    }

    fn find_statement_by_id(&self, id: &StatementId) -> StorageResult<Option<GeneralStatement>> {
        Ok(self.read()?.statements.get(id).cloned())
    }

    fn fetch_as_bundle(
        &self,
        id: &ThingId,
        configuration: &BundleConfiguration,
        sort: &Sort,
    ) -> StorageResult<Vec<GeneralStatement>> {
        let state = self.read()?;
        let mut statements = BundleTraversal::from(id, configuration)
            .execute(|subject| Ok::<_, StorageError>(state.outgoing(subject)))?;
        sort.sort_statements(&mut statements);
        Ok(statements)
    }

    fn delete_all_statements(&self) -> StorageResult<()> {
        let mut state = self.write()?;
        state.statements.clear();
        state.subjects.clear();
        Ok(())
    }

    fn next_statement_id(&self) -> StorageResult<StatementId> {
        let state = self.read()?;
        let mut n = state.statements.len() as u64 + 1;
        loop {
            let id = StatementId::numbered(n);
            if !state.statements.contains_key(&id) {
                return Ok(id);
            }
            n += 1;
        }
    }
}

impl ClassRelationRepository for InMemoryStore {
    fn save_relation(&self, relation: &ClassSubclassRelation) -> StorageResult<()> {
        self.write()?.insert_relation(relation);
        Ok(())
    }

    fn save_all_relations(&self, relations: &[ClassSubclassRelation]) -> StorageResult<()> {
        // One write guard for the whole batch
        let mut state = self.write()?;
        for relation in relations {
            state.insert_relation(relation);
        }
        Ok(())
    }

    fn link_relations(
        &self,
        relations: &[ClassSubclassRelation],
        must_not_exist: bool,
    ) -> StorageResult<LinkOutcome> {
        let mut state = self.write()?;
        let mut pending = Vec::with_capacity(relations.len());
        for relation in relations {
            match state.check_link(relation, must_not_exist) {
                Ok(true) => pending.push(relation),
                Ok(false) => {}
                Err(refusal) => return Ok(LinkOutcome::Refused(refusal)),
            }
        }
        for relation in &pending {
            state.insert_relation(relation);
        }
        Ok(LinkOutcome::Linked(pending.len()))
    }

    fn delete_relation_by_child_id(&self, child_id: &ThingId) -> StorageResult<()> {
        self.write()?.remove_relation(child_id);
        Ok(())
    }

    fn delete_all_relations(&self) -> StorageResult<()> {
        let mut state = self.write()?;
        state.parents.clear();
        state.children.clear();
        Ok(())
    }
}

impl ClassHierarchyRepository for InMemoryStore {
    fn find_parent_by_child_id(&self, child_id: &ThingId) -> StorageResult<Option<Class>> {
        let state = self.read()?;
        Ok(state
            .parent_id(child_id)
            .and_then(|parent_id| state.classes.get(parent_id))
            .cloned())
    }

    fn find_all_children_by_ancestor_id(
        &self,
        id: &ThingId,
        page: PageRequest,
    ) -> StorageResult<Page<ChildClass>> {
        let state = self.read()?;
        let children: Vec<ChildClass> = state
            .children
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|child_id| state.classes.get(child_id))
            .map(|class| ChildClass {
                class: class.clone(),
                child_count: state.child_count(&class.id),
            })
            .collect();
        Ok(Page::slice(children, page))
    }

    fn find_root_by_descendant_id(&self, id: &ThingId) -> StorageResult<Option<Class>> {
        let state = self.read()?;
        let ancestry = state.ancestry(id);
        if ancestry.len() < 2 {
            return Ok(None);
        }
        let Some(top) = ancestry.last() else {
            return Ok(None);
        };
        // A cycle has no root
        if state.parent_id(top).is_some() {
            return Ok(None);
        }
        Ok(state.classes.get(top).cloned())
    }

    fn find_all_roots(&self, page: PageRequest) -> StorageResult<Page<Class>> {
        let state = self.read()?;
        let roots: Vec<Class> = state
            .classes
            .values()
            .filter(|class| !state.parents.contains_key(&class.id))
            .cloned()
            .collect();
        Ok(Page::slice(roots, page))
    }

    fn exists_child(&self, id: &ThingId, child_id: &ThingId) -> StorageResult<bool> {
        let state = self.read()?;
        Ok(state.ancestry(child_id).iter().skip(1).any(|ancestor| ancestor == id))
    }

    fn exists_children(&self, id: &ThingId) -> StorageResult<bool> {
        Ok(self.read()?.child_count(id) > 0)
    }

    fn count_class_instances(&self, id: &ThingId) -> StorageResult<u64> {
        let state = self.read()?;
        let classes = state.descendants_inclusive(id);
        let count = state
            .resources
            .values()
            .filter(|resource| resource.classes.iter().any(|c| classes.contains(c)))
            .count();
        Ok(count as u64)
    }

    fn find_class_hierarchy(
        &self,
        id: &ThingId,
        page: PageRequest,
    ) -> StorageResult<Page<ClassHierarchyEntry>> {
        let state = self.read()?;
        let mut entries: Vec<ClassHierarchyEntry> = state
            .ancestry(id)
            .iter()
            .filter_map(|class_id| state.classes.get(class_id))
            .map(|class| ClassHierarchyEntry {
                class: class.clone(),
                parent_id: state.parent_id(&class.id).cloned(),
            })
            .collect();
        entries.sort_by(|a, b| a.class.id.cmp(&b.class.id));
        Ok(Page::slice(entries, page))
    }
}
