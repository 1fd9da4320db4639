//! Identifiers for things, statements and contributors

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Prefixes used when minting new thing identifiers.
pub mod prefix {
    pub const CLASS: char = 'C';
    pub const RESOURCE: char = 'R';
    pub const PREDICATE: char = 'P';
    pub const LITERAL: char = 'L';
    pub const STATEMENT: char = 'S';
}

/// Identifier of a thing (class, resource, predicate or literal)
///
/// Ids are unique across all kinds of things. Ordering is plain string
/// ordering, which is what hierarchy queries sort by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThingId(String);

impl ThingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the `n`-th candidate id for the given kind prefix.
    pub fn numbered(prefix: char, n: u64) -> Self {
        Self(format!("{prefix}{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ThingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ThingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a statement
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(String);

impl StatementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn numbered(n: u64) -> Self {
        Self(format!("{}{n}", prefix::STATEMENT))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StatementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StatementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StatementId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of the contributor who created something
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributorId(Uuid);

impl ContributorId {
    /// The anonymous contributor (nil UUID)
    pub const UNKNOWN: ContributorId = ContributorId(Uuid::nil());

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ContributorId {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl std::fmt::Display for ContributorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContributorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
