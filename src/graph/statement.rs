//! Statements: subject-predicate-object triples

use super::id::{ContributorId, StatementId};
use super::thing::{Predicate, Thing};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed triple linking two things through a predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralStatement {
    pub id: StatementId,
    pub subject: Thing,
    pub predicate: Predicate,
    pub object: Thing,
    pub created_at: DateTime<Utc>,
    pub created_by: ContributorId,
    pub modifiable: bool,
    /// Position among sibling statements, if ordered
    pub index: Option<i64>,
}

impl GeneralStatement {
    pub fn new(
        id: impl Into<StatementId>,
        subject: impl Into<Thing>,
        predicate: Predicate,
        object: impl Into<Thing>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            predicate,
            object: object.into(),
            created_at: Utc::now(),
            created_by: ContributorId::UNKNOWN,
            modifiable: true,
            index: None,
        }
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.index = Some(index);
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
