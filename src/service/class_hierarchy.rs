//! Class hierarchy use cases

use crate::graph::{
    ChildClass, Class, ClassHierarchyEntry, ClassSubclassRelation, ContributorId, GraphError,
    GraphResult, ThingId,
};
use crate::query::{Page, PageRequest};
use crate::storage::{
    ClassHierarchyRepository, ClassRelationRepository, ClassRepository, LinkOutcome,
};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Validates and applies changes to the subclass forest
pub struct ClassHierarchyService {
    hierarchy: Arc<dyn ClassHierarchyRepository>,
    relations: Arc<dyn ClassRelationRepository>,
    classes: Arc<dyn ClassRepository>,
}

impl ClassHierarchyService {
    pub fn new(
        hierarchy: Arc<dyn ClassHierarchyRepository>,
        relations: Arc<dyn ClassRelationRepository>,
        classes: Arc<dyn ClassRepository>,
    ) -> Self {
        Self {
            hierarchy,
            relations,
            classes,
        }
    }

    fn require_class(&self, id: &ThingId) -> GraphResult<Class> {
        self.classes.find_class_by_id(id)?.ok_or_else(|| {
            warn!(class = %id, "class not found");
            GraphError::ClassNotFound(id.clone())
        })
    }

    // === Write ===

    /// Make every class in `child_ids` a subclass of `parent_id`.
    ///
    /// Existence and self-links are checked first. The remaining rules are
    /// checked by the store in the same guarded step as the write, so a
    /// concurrent link cannot slip in between:
    ///
    /// - with `must_not_exist`, the parent must be a leaf and no child may
    ///   have a parent yet;
    /// - otherwise a child already under `parent_id` is skipped;
    /// - a child under another parent, or above `parent_id`, is refused.
    ///
    /// Either every new edge is stored or none is.
    pub fn create(
        &self,
        contributor: ContributorId,
        parent_id: &ThingId,
        child_ids: &[ThingId],
        must_not_exist: bool,
    ) -> GraphResult<()> {
        let parent = self.require_class(parent_id)?;
        let child_ids: BTreeSet<&ThingId> = child_ids.iter().collect();
        if child_ids.contains(parent_id) {
            warn!(class = %parent_id, "class cannot be its own subclass");
            return Err(GraphError::InvalidSubclassRelation {
                child: parent_id.clone(),
                parent: parent_id.clone(),
            });
        }

        let now = Utc::now();
        let relations = child_ids
            .into_iter()
            .map(|child_id| {
                let child = self.require_class(child_id)?;
                Ok(ClassSubclassRelation::new(child, parent.clone())
                    .created_by(contributor)
                    .created_at(now))
            })
            .collect::<GraphResult<Vec<_>>>()?;
        if relations.is_empty() {
            return Ok(());
        }

        match self.relations.link_relations(&relations, must_not_exist)? {
            LinkOutcome::Linked(0) => {
                debug!(parent = %parent_id, "relations already present");
                Ok(())
            }
            LinkOutcome::Linked(count) => {
                info!(parent = %parent_id, count, "subclass relations created");
                Ok(())
            }
            LinkOutcome::Refused(refusal) => {
                warn!(parent = %parent_id, ?refusal, "subclass relations refused");
                Err(refusal.into())
            }
        }
    }

    /// Detach a class from its parent. No-op if it has none.
    pub fn delete(&self, child_id: &ThingId) -> GraphResult<()> {
        self.require_class(child_id)?;
        self.relations.delete_relation_by_child_id(child_id)?;
        info!(class = %child_id, "subclass relation deleted");
        Ok(())
    }

    // === Read ===

    pub fn find_children(&self, id: &ThingId, page: PageRequest) -> GraphResult<Page<ChildClass>> {
        self.require_class(id)?;
        debug!(class = %id, page = page.page, "finding children");
        Ok(self.hierarchy.find_all_children_by_ancestor_id(id, page)?)
    }

    pub fn find_parent(&self, id: &ThingId) -> GraphResult<Option<Class>> {
        self.require_class(id)?;
        Ok(self.hierarchy.find_parent_by_child_id(id)?)
    }

    pub fn find_root(&self, id: &ThingId) -> GraphResult<Option<Class>> {
        self.require_class(id)?;
        Ok(self.hierarchy.find_root_by_descendant_id(id)?)
    }

    pub fn find_all_roots(&self, page: PageRequest) -> GraphResult<Page<Class>> {
        Ok(self.hierarchy.find_all_roots(page)?)
    }

    pub fn find_class_hierarchy(
        &self,
        id: &ThingId,
        page: PageRequest,
    ) -> GraphResult<Page<ClassHierarchyEntry>> {
        self.require_class(id)?;
        debug!(class = %id, "finding class hierarchy");
        Ok(self.hierarchy.find_class_hierarchy(id, page)?)
    }

    /// Resources that are instances of the class or any of its subclasses.
    pub fn count_class_instances(&self, id: &ThingId) -> GraphResult<u64> {
        self.require_class(id)?;
        Ok(self.hierarchy.count_class_instances(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, StorageError, StorageResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    /// Relation repository that counts written relations and delegates to a store
    struct CountingRelations {
        store: Arc<InMemoryStore>,
        written: AtomicUsize,
        fail: bool,
    }

    impl ClassRelationRepository for CountingRelations {
        fn save_relation(&self, relation: &ClassSubclassRelation) -> StorageResult<()> {
            self.store.save_relation(relation)
        }

        fn save_all_relations(&self, relations: &[ClassSubclassRelation]) -> StorageResult<()> {
            self.store.save_all_relations(relations)
        }

        fn link_relations(
            &self,
            relations: &[ClassSubclassRelation],
            must_not_exist: bool,
        ) -> StorageResult<LinkOutcome> {
            if self.fail {
                return Err(StorageError::CorruptRow("write rejected".into()));
            }
            let outcome = self.store.link_relations(relations, must_not_exist)?;
            if let LinkOutcome::Linked(count) = outcome {
                self.written.fetch_add(count, Ordering::SeqCst);
            }
            Ok(outcome)
        }

        fn delete_relation_by_child_id(&self, child_id: &ThingId) -> StorageResult<()> {
            self.store.delete_relation_by_child_id(child_id)
        }

        fn delete_all_relations(&self) -> StorageResult<()> {
            self.store.delete_all_relations()
        }
    }

    /// Class lookups that pause, so concurrent callers reach the write together
    struct SlowClasses(Arc<InMemoryStore>);

    impl ClassRepository for SlowClasses {
        fn save_class(&self, class: &Class) -> StorageResult<()> {
            self.0.save_class(class)
        }

        fn insert_class(&self, class: &Class) -> StorageResult<bool> {
            self.0.insert_class(class)
        }

        fn find_class_by_id(&self, id: &ThingId) -> StorageResult<Option<Class>> {
            thread::sleep(Duration::from_millis(2));
            self.0.find_class_by_id(id)
        }

        fn find_all_classes(&self, page: PageRequest) -> StorageResult<Page<Class>> {
            self.0.find_all_classes(page)
        }

        fn delete_all_classes(&self) -> StorageResult<()> {
            self.0.delete_all_classes()
        }

        fn next_class_id(&self) -> StorageResult<ThingId> {
            self.0.next_class_id()
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        relations: Arc<CountingRelations>,
        service: ClassHierarchyService,
    }

    fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for id in ["1", "2", "3", "4", "5", "6"] {
            store.save_class(&Class::new(id, format!("class {id}"))).unwrap();
        }
        store
    }

    fn create_test_fixture_with(fail: bool) -> Fixture {
        let store = seeded_store();
        let relations = Arc::new(CountingRelations {
            store: store.clone(),
            written: AtomicUsize::new(0),
            fail,
        });
        let service = ClassHierarchyService::new(store.clone(), relations.clone(), store.clone());
        Fixture {
            store,
            relations,
            service,
        }
    }

    fn create_test_fixture() -> Fixture {
        create_test_fixture_with(false)
    }

    fn ids(values: &[&str]) -> Vec<ThingId> {
        values.iter().map(|v| ThingId::from(*v)).collect()
    }

    fn id(value: &str) -> ThingId {
        ThingId::from(value)
    }

    impl Fixture {
        fn written(&self) -> usize {
            self.relations.written.load(Ordering::SeqCst)
        }

        fn parent_of(&self, child: &str) -> Option<String> {
            self.store
                .find_parent_by_child_id(&id(child))
                .unwrap()
                .map(|c| c.id.to_string())
        }
    }

    #[test]
    fn creates_relations_in_one_batch() {
        let f = create_test_fixture();
        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2", "3"]), true)
            .unwrap();

        assert_eq!(f.written(), 2);
        assert_eq!(f.parent_of("2").as_deref(), Some("1"));
        assert_eq!(f.parent_of("3").as_deref(), Some("1"));
    }

    #[test]
    fn missing_parent_is_reported() {
        let f = create_test_fixture();
        let err = f
            .service
            .create(ContributorId::UNKNOWN, &id("9"), &ids(&["2"]), true)
            .unwrap_err();
        assert!(matches!(err, GraphError::ClassNotFound(c) if c == id("9")));
        assert_eq!(f.written(), 0);
    }

    #[test]
    fn missing_child_is_reported_and_nothing_is_written() {
        let f = create_test_fixture();
        let err = f
            .service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2", "9"]), true)
            .unwrap_err();
        assert!(matches!(err, GraphError::ClassNotFound(c) if c == id("9")));
        assert_eq!(f.written(), 0);
        assert!(f.parent_of("2").is_none());
    }

    #[test]
    fn self_relation_is_rejected_in_both_modes() {
        let f = create_test_fixture();
        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
            .unwrap();
        for must_not_exist in [true, false] {
            let err = f
                .service
                .create(ContributorId::UNKNOWN, &id("1"), &ids(&["3", "1"]), must_not_exist)
                .unwrap_err();
            assert!(matches!(err, GraphError::InvalidSubclassRelation { .. }));
        }
        assert_eq!(f.written(), 1);
        assert!(f.parent_of("3").is_none());
    }

    #[test]
    fn different_existing_parent_is_a_conflict() {
        let f = create_test_fixture();
        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
            .unwrap();

        let err = f
            .service
            .create(ContributorId::UNKNOWN, &id("3"), &ids(&["2"]), false)
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::ParentClassAlreadyExists { child, parent } if child == id("2") && parent == id("1")
        ));
    }

    #[test]
    fn same_parent_is_idempotent_unless_it_must_not_exist() {
        let f = create_test_fixture();
        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
            .unwrap();

        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), false)
            .unwrap();
        assert_eq!(f.written(), 1);

        let err = f
            .service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
            .unwrap_err();
        assert_eq!(err.kind(), crate::graph::ErrorKind::Conflict);
        assert_eq!(f.written(), 1);
    }

    #[test]
    fn new_links_require_a_leaf_parent() {
        let f = create_test_fixture();
        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
            .unwrap();

        let err = f
            .service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["3"]), true)
            .unwrap_err();
        assert!(matches!(&err, GraphError::ParentClassAlreadyHasChildren(p) if *p == id("1")));
        assert_eq!(err.status_code(), 400);
        assert!(f.parent_of("3").is_none());

        // Upserting may extend a parent that already has children
        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2", "3"]), false)
            .unwrap();
        assert_eq!(f.parent_of("3").as_deref(), Some("1"));
        assert_eq!(f.written(), 2);
    }

    #[test]
    fn cycles_are_rejected() {
        let f = create_test_fixture();
        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
            .unwrap();
        f.service
            .create(ContributorId::UNKNOWN, &id("2"), &ids(&["3"]), true)
            .unwrap();

        let err = f
            .service
            .create(ContributorId::UNKNOWN, &id("3"), &ids(&["1"]), true)
            .unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidSubclassRelation { child, parent } if child == id("1") && parent == id("3")
        ));
    }

    #[test]
    fn concurrent_opposite_links_never_form_a_cycle() {
        for _ in 0..20 {
            let store = seeded_store();
            let service = ClassHierarchyService::new(
                store.clone(),
                store.clone(),
                Arc::new(SlowClasses(store.clone())),
            );
            let barrier = Barrier::new(2);

            let (down, up) = thread::scope(|s| {
                let down = s.spawn(|| {
                    barrier.wait();
                    service.create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
                });
                let up = s.spawn(|| {
                    barrier.wait();
                    service.create(ContributorId::UNKNOWN, &id("2"), &ids(&["1"]), true)
                });
                (down.join().unwrap(), up.join().unwrap())
            });

            assert_ne!(down.is_ok(), up.is_ok(), "exactly one link must win");
            let refused = down.err().or(up.err()).unwrap();
            assert!(matches!(refused, GraphError::InvalidSubclassRelation { .. }));

            let one = store.find_parent_by_child_id(&id("1")).unwrap();
            let two = store.find_parent_by_child_id(&id("2")).unwrap();
            assert!(one.is_none() || two.is_none());
        }
    }

    #[test]
    fn concurrent_links_to_one_child_keep_the_first_parent() {
        for _ in 0..20 {
            let store = seeded_store();
            let service = ClassHierarchyService::new(
                store.clone(),
                store.clone(),
                Arc::new(SlowClasses(store.clone())),
            );
            let barrier = Barrier::new(2);

            let results = thread::scope(|s| {
                let handles: Vec<_> = ["3", "4"]
                    .into_iter()
                    .map(|parent| {
                        let (service, barrier) = (&service, &barrier);
                        s.spawn(move || {
                            barrier.wait();
                            service.create(ContributorId::UNKNOWN, &id(parent), &ids(&["5"]), false)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap())
                    .collect::<Vec<_>>()
            });

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            let winner = if results[0].is_ok() { "3" } else { "4" };
            let parent = store.find_parent_by_child_id(&id("5")).unwrap().unwrap();
            assert_eq!(parent.id, id(winner));
        }
    }

    #[test]
    fn storage_failure_is_surfaced() {
        let f = create_test_fixture_with(true);
        let err = f
            .service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
            .unwrap_err();
        assert!(matches!(err, GraphError::Storage(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn delete_requires_existing_class() {
        let f = create_test_fixture();
        let err = f.service.delete(&id("9")).unwrap_err();
        assert!(matches!(err, GraphError::ClassNotFound(_)));

        f.service
            .create(ContributorId::UNKNOWN, &id("1"), &ids(&["2"]), true)
            .unwrap();
        f.service.delete(&id("2")).unwrap();
        assert!(f.parent_of("2").is_none());
        // Deleting again is a no-op
        f.service.delete(&id("2")).unwrap();
    }

    #[test]
    fn reads_check_that_the_class_exists() {
        let f = create_test_fixture();
        let missing = id("9");
        assert!(f.service.find_children(&missing, PageRequest::default()).is_err());
        assert!(f.service.find_parent(&missing).is_err());
        assert!(f.service.find_root(&missing).is_err());
        assert!(f.service.find_class_hierarchy(&missing, PageRequest::default()).is_err());
        assert!(f.service.count_class_instances(&missing).is_err());
        assert!(f.service.find_all_roots(PageRequest::default()).is_ok());
    }

    #[test]
    fn parent_and_root_are_none_for_roots() {
        let f = create_test_fixture();
        assert!(f.service.find_parent(&id("4")).unwrap().is_none());
        assert!(f.service.find_root(&id("4")).unwrap().is_none());
    }
}
