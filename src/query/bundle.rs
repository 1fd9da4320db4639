//! Statement bundles: the subgraph reachable from a thing via outgoing statements

use super::sort::Sort;
use crate::graph::{GeneralStatement, StatementId, Thing, ThingId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Bounds and class filters for a bundle traversal
///
/// Statements whose subject is the start thing are at level 1, statements
/// of their objects at level 2, and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfiguration {
    /// Statements at this level or shallower are walked through but not
    /// returned; `Some(1)` hides the direct statements
    pub min_level: Option<usize>,
    /// Statements deeper than this level are not visited; `Some(1)` keeps
    /// only the direct statements
    pub max_level: Option<usize>,
    /// Objects carrying any of these classes are pruned
    #[serde(default)]
    pub blacklist: Vec<ThingId>,
    /// If non-empty, only objects carrying one of these classes are kept
    #[serde(default)]
    pub whitelist: Vec<ThingId>,
}

impl BundleConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct statements of the start thing only.
    pub fn first_level() -> Self {
        Self::new().max_level(1)
    }

    pub fn min_level(mut self, level: usize) -> Self {
        self.min_level = Some(level);
        self
    }

    pub fn max_level(mut self, level: usize) -> Self {
        self.max_level = Some(level);
        self
    }

    pub fn blacklist(mut self, classes: impl IntoIterator<Item = ThingId>) -> Self {
        self.blacklist.extend(classes);
        self
    }

    pub fn whitelist(mut self, classes: impl IntoIterator<Item = ThingId>) -> Self {
        self.whitelist.extend(classes);
        self
    }

    /// Whether a statement pointing at `object` passes the class filters.
    pub fn admits(&self, object: &Thing) -> bool {
        let classes = object.bundle_classes();
        if self.blacklist.iter().any(|c| classes.contains(c)) {
            return false;
        }
        self.whitelist.is_empty() || self.whitelist.iter().any(|c| classes.contains(c))
    }

    fn includes_level(&self, level: usize) -> bool {
        self.min_level.map_or(true, |min| level > min)
    }

    fn exceeds_level(&self, level: usize) -> bool {
        self.max_level.is_some_and(|max| level > max)
    }
}

/// The statements reachable from a root thing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub root_id: ThingId,
    pub bundle: Vec<GeneralStatement>,
}

impl Bundle {
    pub fn new(root_id: ThingId, bundle: Vec<GeneralStatement>) -> Self {
        Self { root_id, bundle }
    }

    /// Union of two bundles of the same root, deduplicated by statement id
    /// and re-sorted.
    pub fn merge(mut self, other: Bundle, sort: &Sort) -> Self {
        let mut seen: HashSet<StatementId> = self.bundle.iter().map(|s| s.id.clone()).collect();
        for statement in other.bundle {
            if seen.insert(statement.id.clone()) {
                self.bundle.push(statement);
            }
        }
        sort.sort_statements(&mut self.bundle);
        self
    }

    pub fn len(&self) -> usize {
        self.bundle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundle.is_empty()
    }
}

/// Breadth-first walk over outgoing statements
///
/// The walk is storage agnostic: callers hand in a function returning the
/// statements whose subject is a given thing.
#[derive(Debug, Clone)]
pub struct BundleTraversal<'a> {
    pub origin: &'a ThingId,
    pub configuration: &'a BundleConfiguration,
}

impl<'a> BundleTraversal<'a> {
    pub fn from(origin: &'a ThingId, configuration: &'a BundleConfiguration) -> Self {
        Self {
            origin,
            configuration,
        }
    }

    /// Run the walk, returning statements in discovery order.
    ///
    /// Each statement is considered at most once, so cyclic graphs terminate.
    pub fn execute<F, E>(&self, mut outgoing: F) -> Result<Vec<GeneralStatement>, E>
    where
        F: FnMut(&ThingId) -> Result<Vec<GeneralStatement>, E>,
    {
        let config = self.configuration;
        let mut visited: HashSet<StatementId> = HashSet::new();
        let mut result: Vec<GeneralStatement> = Vec::new();
        let mut current_level: Vec<ThingId> = vec![self.origin.clone()];
        let mut level = 1;

        while !current_level.is_empty() && !config.exceeds_level(level) {
            let mut next_level: Vec<ThingId> = Vec::new();
            let mut expanded: HashSet<ThingId> = HashSet::new();

            for subject in &current_level {
                for statement in outgoing(subject)? {
                    if !visited.insert(statement.id.clone()) {
                        continue;
                    }
                    if !config.admits(&statement.object) {
                        continue;
                    }

                    let object_id = statement.object.id().clone();
                    if expanded.insert(object_id.clone()) {
                        next_level.push(object_id);
                    }
                    if config.includes_level(level) {
                        result.push(statement);
                    }
                }
            }

            current_level = next_level;
            level += 1;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{pseudo_class, Literal, Predicate, Resource};
    use std::collections::HashMap;
    use std::convert::Infallible;

    struct Fixture {
        by_subject: HashMap<ThingId, Vec<GeneralStatement>>,
    }

    impl Fixture {
        fn new(statements: Vec<GeneralStatement>) -> Self {
            let mut by_subject: HashMap<ThingId, Vec<GeneralStatement>> = HashMap::new();
            for s in statements {
                by_subject.entry(s.subject.id().clone()).or_default().push(s);
            }
            Self { by_subject }
        }

        fn run(&self, origin: &str, config: &BundleConfiguration) -> Vec<String> {
            let origin = ThingId::from(origin);
            let statements = BundleTraversal::from(&origin, config)
                .execute(|subject| {
                    Ok::<_, Infallible>(self.by_subject.get(subject).cloned().unwrap_or_default())
                })
                .unwrap();
            let mut ids: Vec<String> = statements.iter().map(|s| s.id.to_string()).collect();
            ids.sort();
            ids
        }
    }

    fn link(id: &str, subject: &str, object: &str) -> GeneralStatement {
        GeneralStatement::new(
            id,
            Resource::new(subject, subject),
            Predicate::new("P1", "related"),
            Resource::new(object, object),
        )
    }

    fn chain() -> Fixture {
        Fixture::new(vec![
            link("S1", "R1", "R2"),
            link("S2", "R2", "R3"),
            link("S3", "R3", "R4"),
            link("S4", "R4", "R5"),
        ])
    }

    #[test]
    fn unbounded_walk_returns_everything_reachable() {
        assert_eq!(chain().run("R1", &BundleConfiguration::new()), ["S1", "S2", "S3", "S4"]);
    }

    #[test]
    fn max_level_stops_the_walk() {
        let config = BundleConfiguration::new().max_level(2);
        assert_eq!(chain().run("R1", &config), ["S1", "S2"]);
    }

    #[test]
    fn min_level_hides_but_still_walks() {
        let config = BundleConfiguration::new().min_level(1);
        assert_eq!(chain().run("R1", &config), ["S2", "S3", "S4"]);
    }

    #[test]
    fn min_level_is_the_last_hidden_level_and_max_level_the_last_visited() {
        let chain = chain();
        assert_eq!(chain.run("R1", &BundleConfiguration::first_level()), ["S1"]);
        assert_eq!(chain.run("R1", &BundleConfiguration::new().min_level(2).max_level(3)), ["S3"]);
        assert!(chain.run("R1", &BundleConfiguration::new().min_level(2).max_level(2)).is_empty());
    }

    #[test]
    fn empty_when_start_is_never_a_subject() {
        assert!(chain().run("R5", &BundleConfiguration::new()).is_empty());
        assert!(chain().run("missing", &BundleConfiguration::new()).is_empty());
    }

    #[test]
    fn cycles_terminate() {
        let fixture = Fixture::new(vec![link("S1", "R1", "R2"), link("S2", "R2", "R1")]);
        assert_eq!(fixture.run("R1", &BundleConfiguration::new()), ["S1", "S2"]);
    }

    #[test]
    fn blacklisted_objects_are_pruned_with_their_subtree() {
        let fixture = Fixture::new(vec![
            link("S1", "R1", "R2"),
            GeneralStatement::new(
                "S2",
                Resource::new("R1", "R1"),
                Predicate::new("P1", "related"),
                Resource::new("R3", "R3").with_classes(["Hidden"]),
            ),
            link("S3", "R3", "R4"),
        ]);
        let config = BundleConfiguration::new().blacklist([ThingId::from("Hidden")]);
        assert_eq!(fixture.run("R1", &config), ["S1"]);
    }

    #[test]
    fn whitelist_accepts_pseudo_classes() {
        let fixture = Fixture::new(vec![
            link("S1", "R1", "R2"),
            GeneralStatement::new(
                "S2",
                Resource::new("R1", "R1"),
                Predicate::new("P1", "label"),
                Literal::new("L1", "text"),
            ),
        ]);
        let config = BundleConfiguration::new().whitelist([ThingId::from(pseudo_class::LITERAL)]);
        assert_eq!(fixture.run("R1", &config), ["S2"]);
    }

    #[test]
    fn merge_deduplicates_by_statement_id() {
        let first = Bundle::new(ThingId::from("R1"), vec![link("S1", "R1", "R2")]);
        let second = Bundle::new(
            ThingId::from("R1"),
            vec![link("S1", "R1", "R2"), link("S2", "R2", "R3")],
        );
        let merged = first.merge(second, &Sort::unsorted());
        assert_eq!(merged.len(), 2);
    }
}
