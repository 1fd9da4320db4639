//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

// ── Shared ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClassIdParams {
    #[schemars(description = "The class ID")]
    pub id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PagedClassParams {
    #[schemars(description = "The class ID")]
    pub id: String,
    #[schemars(description = "Zero-based page number (default 0)")]
    pub page: Option<usize>,
    #[schemars(description = "Page size (server default if omitted)")]
    pub size: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PageParams {
    #[schemars(description = "Zero-based page number (default 0)")]
    pub page: Option<usize>,
    #[schemars(description = "Page size (server default if omitted)")]
    pub size: Option<usize>,
}

// ── Class hierarchy params ──────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateClassParams {
    #[schemars(description = "Label of the new class")]
    pub label: String,
    #[schemars(description = "External URI the class stands for")]
    pub uri: Option<String>,
    #[schemars(description = "Free-text description")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LinkChildrenParams {
    #[schemars(description = "The parent class ID")]
    pub parent_id: String,
    #[schemars(description = "IDs of the classes to attach as direct subclasses")]
    pub child_ids: Vec<String>,
}

// ── Thing params ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateResourceParams {
    #[schemars(description = "Label of the new resource")]
    pub label: String,
    #[schemars(description = "IDs of the classes the resource is an instance of")]
    pub classes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreatePredicateParams {
    #[schemars(description = "Label of the new predicate")]
    pub label: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateLiteralParams {
    #[schemars(description = "The literal value")]
    pub label: String,
    #[schemars(description = "Datatype, e.g. 'xsd:integer' (default 'xsd:string')")]
    pub datatype: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateStatementParams {
    #[schemars(description = "ID of the subject thing")]
    pub subject_id: String,
    #[schemars(description = "ID of the predicate")]
    pub predicate_id: String,
    #[schemars(description = "ID of the object thing")]
    pub object_id: String,
    #[schemars(description = "Position among sibling statements")]
    pub index: Option<i64>,
}

// ── Bundle params ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FetchBundleParams {
    #[schemars(description = "ID of the thing the bundle starts from")]
    pub thing_id: String,
    #[schemars(description = "Statements at this level or shallower are walked through but not returned; 1 hides the direct statements")]
    pub min_level: Option<usize>,
    #[schemars(description = "Statements deeper than this level are not visited; 1 keeps only the direct statements")]
    pub max_level: Option<usize>,
    #[schemars(description = "Class IDs whose instances are pruned (also 'Resource', 'Literal', 'Predicate', 'Class')")]
    pub blacklist: Option<Vec<String>>,
    #[schemars(description = "If set, only objects of these class IDs are followed")]
    pub whitelist: Option<Vec<String>>,
    #[schemars(description = "Always include the direct statements of the thing")]
    pub include_first: Option<bool>,
    #[schemars(description = "Sort keys like 'created_at,desc' or 'sub.label'")]
    pub sort: Option<Vec<String>>,
}
