//! Things: classes, resources, predicates and literals

use super::id::{ContributorId, ThingId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Longest label accepted when creating things.
pub const MAX_LABEL_LENGTH: usize = 8164;

/// Pseudo-class ids every thing carries for bundle filtering.
///
/// A blacklist or whitelist may name these next to real class ids, e.g.
/// blacklisting `Literal` prunes all literal objects from a bundle.
pub mod pseudo_class {
    pub const RESOURCE: &str = "Resource";
    pub const LITERAL: &str = "Literal";
    pub const PREDICATE: &str = "Predicate";
    pub const CLASS: &str = "Class";
}

/// Default datatype of literals without an explicit one.
pub const DEFAULT_DATATYPE: &str = "xsd:string";

/// A label is valid when it is single-line and not too long.
pub fn is_valid_label(label: &str) -> bool {
    !label.contains(['\n', '\r']) && label.chars().count() <= MAX_LABEL_LENGTH
}

/// A class of the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: ThingId,
    pub label: String,
    pub uri: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
}

impl Class {
    pub fn new(id: impl Into<ThingId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            uri: None,
            description: None,
            created_at: Utc::now(),
            created_by: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = contributor;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

/// A resource, an instance of zero or more classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ThingId,
    pub label: String,
    pub classes: BTreeSet<ThingId>,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
}

impl Resource {
    pub fn new(id: impl Into<ThingId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            classes: BTreeSet::new(),
            created_at: Utc::now(),
            created_by: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }

    pub fn with_classes<I, T>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ThingId>,
    {
        self.classes.extend(classes.into_iter().map(Into::into));
        self
    }

    pub fn created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = contributor;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub id: ThingId,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
}

impl Predicate {
    pub fn new(id: impl Into<ThingId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            created_at: Utc::now(),
            created_by: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }

    pub fn created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = contributor;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub id: ThingId,
    pub label: String,
    pub datatype: String,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
}

impl Literal {
    pub fn new(id: impl Into<ThingId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            datatype: DEFAULT_DATATYPE.to_string(),
            created_at: Utc::now(),
            created_by: ContributorId::UNKNOWN,
            modifiable: true,
        }
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = datatype.into();
        self
    }

    pub fn created_by(mut self, contributor: ContributorId) -> Self {
        self.created_by = contributor;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }
}

/// Any node of the graph that can be the subject or object of a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_class", rename_all = "lowercase")]
pub enum Thing {
    Class(Class),
    Resource(Resource),
    Predicate(Predicate),
    Literal(Literal),
}

impl Thing {
    pub fn id(&self) -> &ThingId {
        match self {
            Thing::Class(c) => &c.id,
            Thing::Resource(r) => &r.id,
            Thing::Predicate(p) => &p.id,
            Thing::Literal(l) => &l.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Thing::Class(c) => &c.label,
            Thing::Resource(r) => &r.label,
            Thing::Predicate(p) => &p.label,
            Thing::Literal(l) => &l.label,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Thing::Class(c) => c.created_at,
            Thing::Resource(r) => r.created_at,
            Thing::Predicate(p) => p.created_at,
            Thing::Literal(l) => l.created_at,
        }
    }

    pub fn created_by(&self) -> ContributorId {
        match self {
            Thing::Class(c) => c.created_by,
            Thing::Resource(r) => r.created_by,
            Thing::Predicate(p) => p.created_by,
            Thing::Literal(l) => l.created_by,
        }
    }

    /// Classes considered by bundle filters: the thing's pseudo-class,
    /// plus the instance classes for resources.
    pub fn bundle_classes(&self) -> BTreeSet<ThingId> {
        match self {
            Thing::Resource(r) => {
                let mut classes = r.classes.clone();
                classes.insert(ThingId::from(pseudo_class::RESOURCE));
                classes
            }
            Thing::Class(_) => BTreeSet::from([ThingId::from(pseudo_class::CLASS)]),
            Thing::Predicate(_) => BTreeSet::from([ThingId::from(pseudo_class::PREDICATE)]),
            Thing::Literal(_) => BTreeSet::from([ThingId::from(pseudo_class::LITERAL)]),
        }
    }
}

impl From<Class> for Thing {
    fn from(class: Class) -> Self {
        Thing::Class(class)
    }
}

impl From<Resource> for Thing {
    fn from(resource: Resource) -> Self {
        Thing::Resource(resource)
    }
}

impl From<Predicate> for Thing {
    fn from(predicate: Predicate) -> Self {
        Thing::Predicate(predicate)
    }
}

impl From<Literal> for Thing {
    fn from(literal: Literal) -> Self {
        Thing::Literal(literal)
    }
}
