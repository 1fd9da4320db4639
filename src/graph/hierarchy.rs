//! Subclass relations and the views derived from them

use super::id::{ContributorId, ThingId};
use super::thing::Class;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed "child is a subclass of parent" edge
///
/// A class has at most one parent. Saving a relation for a child that
/// already has one replaces the old edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSubclassRelation {
    pub child: Class,
    pub parent: Class,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
}

impl ClassSubclassRelation {
    pub fn new(child: Class, parent: Class) -> Self {
        Self {
            child,
            parent,
            created_at: Utc::now(),
            created_by: ContributorId::UNKNOWN,
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

/// A direct child together with the number of its own direct children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildClass {
    pub class: Class,
    pub child_count: u64,
}

/// One class on the path from a class up to its root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassHierarchyEntry {
    pub class: Class,
    pub parent_id: Option<ThingId>,
}
