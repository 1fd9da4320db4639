//! Shared fixtures for the store contract tests
//!
//! Fixtures write straight through the repository ports so every backend
//! starts from the same graph.

#![allow(dead_code)]

pub mod bundles;
pub mod hierarchy;

use chrono::{DateTime, Utc};
use orkg_graph::{
    Class, ClassSubclassRelation, ContributorId, GeneralStatement, GraphStore, Literal, Predicate,
    Resource, StatementId, Thing, ThingId,
};
use uuid::Uuid;

pub fn id(value: &str) -> ThingId {
    ThingId::from(value)
}

pub fn ids(values: &[&str]) -> Vec<ThingId> {
    values.iter().copied().map(ThingId::from).collect()
}

/// A fixed instant, `seconds` after a common epoch.
pub fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + seconds, 0).expect("valid timestamp")
}

pub fn contributor(n: u128) -> ContributorId {
    ContributorId::from_uuid(Uuid::from_u128(n))
}

pub fn class(value: &str) -> Class {
    Class::new(value, format!("Class {value}")).created_at(at(0))
}

/// Classes 1..=6 with the tree
///
/// ```text
/// 1 ── 2
///  └── 3 ── 5
///       └── 6
/// 4
/// ```
pub fn seed_hierarchy<S: GraphStore>(store: &S) {
    for n in 1..=6 {
        store.save_class(&class(&n.to_string())).unwrap();
    }
    let relations: Vec<ClassSubclassRelation> = [("2", "1"), ("3", "1"), ("5", "3"), ("6", "3")]
        .into_iter()
        .map(|(child, parent)| ClassSubclassRelation::new(class(child), class(parent)))
        .collect();
    store.save_all_relations(&relations).unwrap();
}

/// Resources tagged with hierarchy classes: R1 {1}, R2 {2}, R3 {4}, R4 {2, 5}
pub fn seed_instances<S: GraphStore>(store: &S) {
    let tagged = [
        ("R1", vec!["1"]),
        ("R2", vec!["2"]),
        ("R3", vec!["4"]),
        ("R4", vec!["2", "5"]),
    ];
    for (resource, classes) in tagged {
        store
            .save_resource(&Resource::new(resource, resource).with_classes(ids(&classes)))
            .unwrap();
    }
}

pub fn resource(value: &str, classes: &[&str]) -> Resource {
    Resource::new(value, format!("Resource {value}"))
        .with_classes(ids(classes))
        .created_at(at(0))
}

pub fn predicate() -> Predicate {
    Predicate::new("P1", "has part").created_at(at(0))
}

pub fn statement(
    statement_id: &str,
    subject: impl Into<Thing>,
    object: impl Into<Thing>,
    seconds: i64,
) -> GeneralStatement {
    GeneralStatement::new(
        StatementId::new(statement_id),
        subject.into(),
        predicate(),
        object.into(),
    )
    .created_at(at(seconds))
}

/// The chain `A -S1-> B -S2-> C -S3-> D -S4-> E` plus a literal hanging
/// off `A` via `S5`. `C` is an instance of class `Hidden`; later
/// statements are newer.
pub fn seed_chain<S: GraphStore>(store: &S) {
    let a = resource("A", &[]);
    let b = resource("B", &["Kept"]);
    let c = resource("C", &["Hidden", "Kept"]);
    let d = resource("D", &["Kept"]);
    let e = resource("E", &[]);
    let note = Literal::new("L1", "a note").created_at(at(0));

    for r in [&a, &b, &c, &d, &e] {
        store.save_resource(r).unwrap();
    }
    store.save_literal(&note).unwrap();
    store.save_predicate(&predicate()).unwrap();

    let statements = [
        statement("S1", a.clone(), b.clone(), 1),
        statement("S2", b, c.clone(), 2),
        statement("S3", c, d.clone(), 3),
        statement("S4", d, e, 4),
        statement("S5", a, note, 5),
    ];
    for s in &statements {
        store.save_statement(s).unwrap();
    }
}

pub fn statement_ids(statements: &[GeneralStatement]) -> Vec<&str> {
    statements.iter().map(|s| s.id.as_str()).collect()
}

pub fn sorted_ids(statements: &[GeneralStatement]) -> Vec<&str> {
    let mut ids = statement_ids(statements);
    ids.sort_unstable();
    ids
}

/// Runs each named contract from `common::<module>` against a freshly
/// created store.
macro_rules! store_contracts {
    ($backend:ident, $make:expr, $module:ident => [$($name:ident),* $(,)?]) => {
        mod $backend {
            use super::*;

            $(
                #[test]
                fn $name() {
                    let store = $make;
                    $crate::common::$module::$name(&store);
                }
            )*
        }
    };
}
