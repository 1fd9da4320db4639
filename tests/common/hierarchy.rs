//! Class hierarchy contracts every backend must satisfy

use super::{class, id, predicate, resource, seed_hierarchy, seed_instances, statement};
use orkg_graph::{
    Class, ClassSubclassRelation, GraphStore, LinkOutcome, LinkRefusal, Literal, PageRequest,
    Predicate, Resource, StatementId,
};

fn all() -> PageRequest {
    PageRequest::of(0, 100)
}

fn relation(child: &str, parent: &str) -> ClassSubclassRelation {
    ClassSubclassRelation::new(class(child), class(parent))
}

pub fn parent_is_the_direct_superclass<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let parent = store.find_parent_by_child_id(&id("5")).unwrap().unwrap();
    assert_eq!(parent.id, id("3"));
    assert!(store.find_parent_by_child_id(&id("1")).unwrap().is_none());
    assert!(store.find_parent_by_child_id(&id("missing")).unwrap().is_none());
}

pub fn children_carry_their_own_child_counts<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let page = store.find_all_children_by_ancestor_id(&id("1"), all()).unwrap();
    let found: Vec<(&str, u64)> = page
        .content
        .iter()
        .map(|c| (c.class.id.as_str(), c.child_count))
        .collect();
    assert_eq!(found, vec![("2", 0), ("3", 2)]);
    assert_eq!(page.total_elements, 2);

    let leaf = store.find_all_children_by_ancestor_id(&id("5"), all()).unwrap();
    assert!(leaf.is_empty());
}

pub fn children_are_paged_by_id<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let second = store
        .find_all_children_by_ancestor_id(&id("1"), PageRequest::of(1, 1))
        .unwrap();
    assert_eq!(second.content.len(), 1);
    assert_eq!(second.content[0].class.id, id("3"));
    assert_eq!(second.total_elements, 2);
    assert_eq!(second.total_pages, 2);
}

pub fn root_is_the_topmost_ancestor<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    for descendant in ["2", "3", "5", "6"] {
        let root = store.find_root_by_descendant_id(&id(descendant)).unwrap();
        assert_eq!(root.map(|c| c.id), Some(id("1")), "root of {descendant}");
    }
    assert!(store.find_root_by_descendant_id(&id("1")).unwrap().is_none());
    assert!(store.find_root_by_descendant_id(&id("4")).unwrap().is_none());
    assert!(store.find_root_by_descendant_id(&id("missing")).unwrap().is_none());
}

pub fn roots_include_isolated_classes<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let roots = store.find_all_roots(all()).unwrap();
    let found: Vec<&str> = roots.content.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(found, vec!["1", "4"]);
    assert_eq!(roots.total_elements, 2);
}

pub fn descendant_check_is_transitive<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    assert!(store.exists_child(&id("1"), &id("5")).unwrap());
    assert!(store.exists_child(&id("3"), &id("6")).unwrap());
    assert!(store.exists_child(&id("1"), &id("2")).unwrap());
    assert!(!store.exists_child(&id("5"), &id("1")).unwrap());
    assert!(!store.exists_child(&id("2"), &id("5")).unwrap());
    assert!(!store.exists_child(&id("1"), &id("4")).unwrap());
    assert!(!store.exists_child(&id("5"), &id("5")).unwrap());
}

pub fn has_children_only_for_parents<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    assert!(store.exists_children(&id("1")).unwrap());
    assert!(store.exists_children(&id("3")).unwrap());
    assert!(!store.exists_children(&id("2")).unwrap());
    assert!(!store.exists_children(&id("4")).unwrap());
}

pub fn instance_count_spans_descendants<S: GraphStore>(store: &S) {
    seed_hierarchy(store);
    seed_instances(store);

    assert_eq!(store.count_class_instances(&id("1")).unwrap(), 3);
    assert_eq!(store.count_class_instances(&id("2")).unwrap(), 2);
    assert_eq!(store.count_class_instances(&id("3")).unwrap(), 1);
    assert_eq!(store.count_class_instances(&id("4")).unwrap(), 1);
    assert_eq!(store.count_class_instances(&id("6")).unwrap(), 0);
}

pub fn hierarchy_lists_the_class_and_its_ancestors<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let page = store.find_class_hierarchy(&id("5"), all()).unwrap();
    let found: Vec<(&str, Option<&str>)> = page
        .content
        .iter()
        .map(|e| (e.class.id.as_str(), e.parent_id.as_ref().map(|p| p.as_str())))
        .collect();
    assert_eq!(found, vec![("1", None), ("3", Some("1")), ("5", Some("3"))]);
    assert_eq!(page.total_elements, 3);

    let root = store.find_class_hierarchy(&id("4"), all()).unwrap();
    assert_eq!(root.content.len(), 1);
    assert!(root.content[0].parent_id.is_none());

    assert!(store.find_class_hierarchy(&id("missing"), all()).unwrap().is_empty());
}

pub fn saving_a_relation_moves_the_child<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    store
        .save_relation(&ClassSubclassRelation::new(class("5"), class("2")))
        .unwrap();

    assert_eq!(store.find_parent_by_child_id(&id("5")).unwrap().unwrap().id, id("2"));
    let siblings = store.find_all_children_by_ancestor_id(&id("3"), all()).unwrap();
    assert_eq!(siblings.content.len(), 1);
    assert_eq!(siblings.content[0].class.id, id("6"));
    assert!(store.exists_children(&id("2")).unwrap());
}

pub fn deleting_a_relation_makes_a_new_root<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    store.delete_relation_by_child_id(&id("3")).unwrap();
    store.delete_relation_by_child_id(&id("4")).unwrap();

    let roots = store.find_all_roots(all()).unwrap();
    let found: Vec<&str> = roots.content.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(found, vec!["1", "3", "4"]);
    assert_eq!(store.find_root_by_descendant_id(&id("5")).unwrap().unwrap().id, id("3"));
    assert!(!store.exists_child(&id("1"), &id("6")).unwrap());
}

pub fn deleting_classes_drops_relations<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    store.delete_all_classes().unwrap();

    assert!(store.find_all_roots(all()).unwrap().is_empty());
    assert!(store.find_parent_by_child_id(&id("5")).unwrap().is_none());
    assert!(!store.exists_children(&id("1")).unwrap());
}

pub fn next_class_id_is_unused<S: GraphStore>(store: &S) {
    let first = store.next_class_id().unwrap();
    assert!(first.as_str().starts_with('C'));

    store.save_class(&class(first.as_str())).unwrap();
    let second = store.next_class_id().unwrap();
    assert_ne!(first, second);
    assert!(store.find_class_by_id(&second).unwrap().is_none());
}

pub fn offsets_past_the_end_give_empty_pages<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let far = store.find_all_roots(PageRequest::of(usize::MAX, 10)).unwrap();
    assert!(far.is_empty());
    assert_eq!(far.total_elements, 2);

    let huge = store.find_all_children_by_ancestor_id(&id("1"), PageRequest::of(0, usize::MAX)).unwrap();
    assert_eq!(huge.content.len(), 2);
}

pub fn linking_rechecks_cycles_at_write_time<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let outcome = store.link_relations(&[relation("1", "5")], false).unwrap();
    assert_eq!(
        outcome,
        LinkOutcome::Refused(LinkRefusal::Cycle { child: id("1"), parent: id("5") })
    );
    let outcome = store.link_relations(&[relation("4", "4")], false).unwrap();
    assert!(matches!(outcome, LinkOutcome::Refused(LinkRefusal::Cycle { .. })));

    assert!(store.find_parent_by_child_id(&id("1")).unwrap().is_none());
    assert!(store.find_parent_by_child_id(&id("4")).unwrap().is_none());
}

pub fn linking_refuses_children_with_another_parent<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let outcome = store.link_relations(&[relation("2", "3")], false).unwrap();
    assert_eq!(
        outcome,
        LinkOutcome::Refused(LinkRefusal::ChildHasParent { child: id("2"), parent: id("1") })
    );

    // Already in place: skipped, and the new child still goes in
    let outcome = store
        .link_relations(&[relation("2", "1"), relation("4", "1")], false)
        .unwrap();
    assert_eq!(outcome, LinkOutcome::Linked(1));
    assert_eq!(store.find_parent_by_child_id(&id("4")).unwrap().unwrap().id, id("1"));
    assert_eq!(store.find_parent_by_child_id(&id("2")).unwrap().unwrap().id, id("1"));
}

pub fn new_links_need_a_leaf_parent<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let outcome = store.link_relations(&[relation("4", "3")], true).unwrap();
    assert_eq!(
        outcome,
        LinkOutcome::Refused(LinkRefusal::ParentHasChildren { parent: id("3") })
    );
    assert!(store.find_parent_by_child_id(&id("4")).unwrap().is_none());

    let outcome = store.link_relations(&[relation("4", "2")], true).unwrap();
    assert_eq!(outcome, LinkOutcome::Linked(1));
    assert_eq!(store.find_root_by_descendant_id(&id("4")).unwrap().unwrap().id, id("1"));
}

pub fn refused_link_batch_writes_nothing<S: GraphStore>(store: &S) {
    seed_hierarchy(store);

    let outcome = store
        .link_relations(&[relation("4", "6"), relation("1", "6")], false)
        .unwrap();
    assert!(matches!(outcome, LinkOutcome::Refused(LinkRefusal::Cycle { .. })));
    assert!(store.find_parent_by_child_id(&id("4")).unwrap().is_none());
    assert!(!store.exists_children(&id("6")).unwrap());
}

pub fn inserts_refuse_taken_ids<S: GraphStore>(store: &S) {
    store.save_class(&Class::new("C1", "first")).unwrap();
    store.save_literal(&Literal::new("L1", "value")).unwrap();

    assert!(!store.insert_class(&Class::new("C1", "second")).unwrap());
    assert!(!store.insert_class(&Class::new("L1", "class over a literal")).unwrap());
    assert!(!store.insert_resource(&Resource::new("C1", "resource over a class")).unwrap());
    assert!(!store.insert_predicate(&Predicate::new("L1", "predicate over a literal")).unwrap());
    assert!(!store.insert_literal(&Literal::new("C1", "literal over a class")).unwrap());
    assert_eq!(store.find_class_by_id(&id("C1")).unwrap().unwrap().label, "first");
    assert!(store.find_resource_by_id(&id("C1")).unwrap().is_none());

    assert!(store.insert_class(&Class::new("C2", "fresh")).unwrap());
    assert!(store.insert_resource(&resource("R1", &["C2"])).unwrap());
    assert!(store.insert_predicate(&predicate()).unwrap());
    assert_eq!(store.count_class_instances(&id("C2")).unwrap(), 1);

    let first = statement("S1", resource("R1", &[]), resource("R1", &[]), 1);
    assert!(store.insert_statement(&first).unwrap());
    let clash = statement("S1", resource("R1", &[]), Literal::new("L1", "value"), 2);
    assert!(!store.insert_statement(&clash).unwrap());
    let kept = store.find_statement_by_id(&StatementId::from("S1")).unwrap().unwrap();
    assert_eq!(kept.object.id(), &id("R1"));
}
