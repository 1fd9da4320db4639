//! Sort specifications for statement results

use crate::graph::{GeneralStatement, GraphError, Thing};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Statement attributes a bundle can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementSortProperty {
    #[serde(rename = "id")]
    Id,
    #[serde(rename = "created_at")]
    CreatedAt,
    #[serde(rename = "created_by")]
    CreatedBy,
    #[serde(rename = "index")]
    Index,
    #[serde(rename = "sub.id")]
    SubjectId,
    #[serde(rename = "sub.label")]
    SubjectLabel,
    #[serde(rename = "sub.created_at")]
    SubjectCreatedAt,
    #[serde(rename = "sub.created_by")]
    SubjectCreatedBy,
    #[serde(rename = "obj.id")]
    ObjectId,
    #[serde(rename = "obj.label")]
    ObjectLabel,
    #[serde(rename = "obj.created_at")]
    ObjectCreatedAt,
    #[serde(rename = "obj.created_by")]
    ObjectCreatedBy,
}

impl StatementSortProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreatedAt => "created_at",
            Self::CreatedBy => "created_by",
            Self::Index => "index",
            Self::SubjectId => "sub.id",
            Self::SubjectLabel => "sub.label",
            Self::SubjectCreatedAt => "sub.created_at",
            Self::SubjectCreatedBy => "sub.created_by",
            Self::ObjectId => "obj.id",
            Self::ObjectLabel => "obj.label",
            Self::ObjectCreatedAt => "obj.created_at",
            Self::ObjectCreatedBy => "obj.created_by",
        }
    }

    /// Ascending comparison with absent values ordered last.
    fn compare(&self, a: &GeneralStatement, b: &GeneralStatement) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::CreatedBy => a.created_by.cmp(&b.created_by),
            Self::Index => match (a.index, b.index) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => x.cmp(&y),
            },
            Self::SubjectId => a.subject.id().cmp(b.subject.id()),
            Self::SubjectLabel => a.subject.label().cmp(b.subject.label()),
            Self::SubjectCreatedAt => a.subject.created_at().cmp(&b.subject.created_at()),
            Self::SubjectCreatedBy => compare_creators(&a.subject, &b.subject),
            Self::ObjectId => a.object.id().cmp(b.object.id()),
            Self::ObjectLabel => a.object.label().cmp(b.object.label()),
            Self::ObjectCreatedAt => a.object.created_at().cmp(&b.object.created_at()),
            Self::ObjectCreatedBy => compare_creators(&a.object, &b.object),
        }
    }
}

fn compare_creators(a: &Thing, b: &Thing) -> Ordering {
    a.created_by().cmp(&b.created_by())
}

impl FromStr for StatementSortProperty {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let property = match s {
            "id" => Self::Id,
            "created_at" => Self::CreatedAt,
            "created_by" => Self::CreatedBy,
            "index" => Self::Index,
            "sub.id" => Self::SubjectId,
            "sub.label" => Self::SubjectLabel,
            "sub.created_at" => Self::SubjectCreatedAt,
            "sub.created_by" => Self::SubjectCreatedBy,
            "obj.id" => Self::ObjectId,
            "obj.label" => Self::ObjectLabel,
            "obj.created_at" => Self::ObjectCreatedAt,
            "obj.created_by" => Self::ObjectCreatedBy,
            other => return Err(GraphError::InvalidSortProperty(other.to_string())),
        };
        Ok(property)
    }
}

/// A single sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub property: StatementSortProperty,
    pub direction: SortDirection,
}

impl Order {
    pub fn asc(property: StatementSortProperty) -> Self {
        Self {
            property,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(property: StatementSortProperty) -> Self {
        Self {
            property,
            direction: SortDirection::Desc,
        }
    }

    fn compare(&self, a: &GeneralStatement, b: &GeneralStatement) -> Ordering {
        let ordering = self.property.compare(a, b);
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Parses `property` or `property,asc|desc`.
impl FromStr for Order {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (property, direction) = match s.split_once(',') {
            Some((property, direction)) => (property.trim(), direction.trim()),
            None => (s.trim(), "asc"),
        };
        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(GraphError::InvalidSortProperty(s.to_string())),
        };
        Ok(Self {
            property: property.parse()?,
            direction,
        })
    }
}

/// Ordered list of sort keys; empty means unsorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    /// Parse a list of `property[,direction]` expressions.
    pub fn parse<S: AsRef<str>>(expressions: &[S]) -> Result<Self, GraphError> {
        let orders = expressions
            .iter()
            .map(|e| e.as_ref().parse())
            .collect::<Result<Vec<Order>, _>>()?;
        Ok(Self { orders })
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Unsorted falls back to newest first.
    pub fn compare(&self, a: &GeneralStatement, b: &GeneralStatement) -> Ordering {
        if self.is_unsorted() {
            return b.created_at.cmp(&a.created_at);
        }
        self.orders
            .iter()
            .map(|order| order.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    pub fn sort_statements(&self, statements: &mut [GeneralStatement]) {
        statements.sort_by(|a, b| self.compare(a, b));
    }
}
