//! Statement bundle contracts every backend must satisfy

use super::{contributor, id, predicate, resource, seed_chain, sorted_ids, statement, statement_ids};
use orkg_graph::{pseudo_class, BundleConfiguration, GraphStore, Order, Sort, SortDirection};
use orkg_graph::query::StatementSortProperty;

fn fetch<S: GraphStore>(store: &S, configuration: BundleConfiguration) -> Vec<String> {
    let statements = store
        .fetch_as_bundle(&id("A"), &configuration, &Sort::unsorted())
        .unwrap();
    sorted_ids(&statements).into_iter().map(String::from).collect()
}

pub fn unbounded_bundle_reaches_everything_newest_first<S: GraphStore>(store: &S) {
    seed_chain(store);

    let statements = store
        .fetch_as_bundle(&id("A"), &BundleConfiguration::new(), &Sort::unsorted())
        .unwrap();
    assert_eq!(statement_ids(&statements), vec!["S5", "S4", "S3", "S2", "S1"]);
}

pub fn min_level_hides_the_first_level<S: GraphStore>(store: &S) {
    seed_chain(store);

    assert_eq!(
        fetch(store, BundleConfiguration::new().min_level(1)),
        vec!["S2", "S3", "S4"]
    );
}

pub fn max_level_stops_the_walk<S: GraphStore>(store: &S) {
    seed_chain(store);

    assert_eq!(
        fetch(store, BundleConfiguration::new().max_level(2)),
        vec!["S1", "S2", "S5"]
    );
    assert_eq!(
        fetch(store, BundleConfiguration::new().min_level(1).max_level(2)),
        vec!["S2"]
    );
}

pub fn blacklist_prunes_the_subtree<S: GraphStore>(store: &S) {
    seed_chain(store);

    assert_eq!(
        fetch(store, BundleConfiguration::new().blacklist([id("Hidden")])),
        vec!["S1", "S5"]
    );
    assert_eq!(
        fetch(store, BundleConfiguration::new().blacklist([id(pseudo_class::RESOURCE)])),
        vec!["S5"]
    );
}

pub fn whitelist_keeps_only_matching_objects<S: GraphStore>(store: &S) {
    seed_chain(store);

    assert_eq!(
        fetch(store, BundleConfiguration::new().whitelist([id("Kept")])),
        vec!["S1", "S2", "S3"]
    );
    assert_eq!(
        fetch(store, BundleConfiguration::new().whitelist([id(pseudo_class::LITERAL)])),
        vec!["S5"]
    );
}

pub fn cycles_terminate<S: GraphStore>(store: &S) {
    seed_chain(store);
    store
        .save_statement(&statement("S6", resource("E", &[]), resource("A", &[]), 6))
        .unwrap();

    assert_eq!(
        fetch(store, BundleConfiguration::new()),
        vec!["S1", "S2", "S3", "S4", "S5", "S6"]
    );
}

pub fn thing_without_statements_has_an_empty_bundle<S: GraphStore>(store: &S) {
    seed_chain(store);

    let statements = store
        .fetch_as_bundle(&id("L1"), &BundleConfiguration::new(), &Sort::unsorted())
        .unwrap();
    assert!(statements.is_empty());
}

/// `A` pointing at four resources; creators and times interleave.
fn seed_star<S: GraphStore>(store: &S) {
    let hub = resource("A", &[]);
    store.save_resource(&hub).unwrap();
    store.save_predicate(&predicate()).unwrap();

    let spokes = [
        ("S1", 2, 4, Some(2)),
        ("S2", 1, 3, None),
        ("S3", 2, 2, Some(0)),
        ("S4", 1, 1, Some(1)),
    ];
    for (n, (statement_id, creator, seconds, index)) in spokes.into_iter().enumerate() {
        let spoke = resource(&format!("X{n}"), &[]);
        store.save_resource(&spoke).unwrap();
        let mut s = statement(statement_id, hub.clone(), spoke, seconds).created_by(contributor(creator));
        s.index = index;
        store.save_statement(&s).unwrap();
    }
}

pub fn sort_keys_apply_in_order<S: GraphStore>(store: &S) {
    seed_star(store);

    let sort = Sort::by([
        Order::desc(StatementSortProperty::CreatedBy),
        Order::asc(StatementSortProperty::CreatedAt),
    ]);
    let statements = store
        .fetch_as_bundle(&id("A"), &BundleConfiguration::new(), &sort)
        .unwrap();
    assert_eq!(statement_ids(&statements), vec!["S3", "S1", "S4", "S2"]);
}

pub fn missing_index_sorts_last<S: GraphStore>(store: &S) {
    seed_star(store);

    let sort = Sort::parse(&["index,asc"]).unwrap();
    assert_eq!(sort.orders[0].direction, SortDirection::Asc);
    let statements = store
        .fetch_as_bundle(&id("A"), &BundleConfiguration::new(), &sort)
        .unwrap();
    assert_eq!(statement_ids(&statements), vec!["S3", "S4", "S1", "S2"]);
}
