//! MCP server: exposes the class hierarchy, thing creation and statement
//! bundles via the Model Context Protocol.
//!
//! Tools: 10 class + 4 thing + 1 bundle = 15 total.

pub mod params;

use crate::config::PagingConfig;
use crate::graph::{ContributorId, GraphError, ThingId};
use crate::query::{BundleConfiguration, Sort};
use crate::GraphApi;
use params::*;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Serialize;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok_text(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn err_text(msg: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg)]))
}

fn ok_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => ok_text(text),
        Err(e) => err_text(format!("failed to serialize result: {e}")),
    }
}

/// Tool error carrying the message and its HTTP-equivalent status.
fn graph_err(e: GraphError) -> Result<CallToolResult, McpError> {
    let body = json!({ "error": e.to_string(), "status": e.status_code() });
    err_text(body.to_string())
}

fn thing_ids(ids: Vec<String>) -> Vec<ThingId> {
    ids.into_iter().map(ThingId::from).collect()
}

// ---------------------------------------------------------------------------
// GraphMcpServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct GraphMcpServer {
    api: GraphApi,
    paging: PagingConfig,
    contributor: ContributorId,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GraphMcpServer {
    pub fn new(api: GraphApi, paging: PagingConfig, contributor: ContributorId) -> Self {
        Self {
            api,
            paging,
            contributor,
            tool_router: Self::tool_router(),
        }
    }

    // ── Class tools ─────────────────────────────────────────────────────

    #[tool(description = "Create a new class")]
    fn class_create(
        &self,
        Parameters(p): Parameters<CreateClassParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.create_class(
            self.contributor,
            &p.label,
            p.uri.as_deref(),
            p.description.as_deref(),
        ) {
            Ok(class) => ok_json(&class),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "List the direct subclasses of a class, each with its own child count")]
    fn class_children(
        &self,
        Parameters(p): Parameters<PagedClassParams>,
    ) -> Result<CallToolResult, McpError> {
        let page = self.paging.request(p.page, p.size);
        match self.api.children(&ThingId::from(p.id), page) {
            Ok(children) => ok_json(&children),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Get the direct parent of a class (null if it has none)")]
    fn class_parent(
        &self,
        Parameters(p): Parameters<ClassIdParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.parent(&ThingId::from(p.id)) {
            Ok(parent) => ok_json(&parent),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Get the topmost ancestor of a class (null if it has no parent)")]
    fn class_root(
        &self,
        Parameters(p): Parameters<ClassIdParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.root(&ThingId::from(p.id)) {
            Ok(root) => ok_json(&root),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "List all classes without a parent")]
    fn class_roots(
        &self,
        Parameters(p): Parameters<PageParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.roots(self.paging.request(p.page, p.size)) {
            Ok(roots) => ok_json(&roots),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "List a class and all its ancestors, each with its parent ID")]
    fn class_hierarchy(
        &self,
        Parameters(p): Parameters<PagedClassParams>,
    ) -> Result<CallToolResult, McpError> {
        let page = self.paging.request(p.page, p.size);
        match self.api.hierarchy(&ThingId::from(p.id), page) {
            Ok(entries) => ok_json(&entries),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Count resources that are instances of a class or any of its subclasses")]
    fn class_count(
        &self,
        Parameters(p): Parameters<ClassIdParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.count_instances(&ThingId::from(p.id)) {
            Ok(count) => ok_json(&json!({ "count": count })),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Attach classes as subclasses of a class without subclasses; fails if any of them already has a parent")]
    fn class_link(
        &self,
        Parameters(p): Parameters<LinkChildrenParams>,
    ) -> Result<CallToolResult, McpError> {
        let parent_id = ThingId::from(p.parent_id);
        match self
            .api
            .add_children(self.contributor, &parent_id, &thing_ids(p.child_ids))
        {
            Ok(()) => ok_json(&json!({ "linked": parent_id })),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Attach classes as subclasses; classes already under this parent are left as is")]
    fn class_relink(
        &self,
        Parameters(p): Parameters<LinkChildrenParams>,
    ) -> Result<CallToolResult, McpError> {
        let parent_id = ThingId::from(p.parent_id);
        match self
            .api
            .upsert_children(self.contributor, &parent_id, &thing_ids(p.child_ids))
        {
            Ok(()) => ok_json(&json!({ "linked": parent_id })),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Detach a class from its parent")]
    fn class_unlink(
        &self,
        Parameters(p): Parameters<ClassIdParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = ThingId::from(p.id);
        match self.api.remove_parent(&id) {
            Ok(()) => ok_json(&json!({ "unlinked": id })),
            Err(e) => graph_err(e),
        }
    }

    // ── Thing tools ─────────────────────────────────────────────────────

    #[tool(description = "Create a resource, optionally as an instance of existing classes")]
    fn resource_create(
        &self,
        Parameters(p): Parameters<CreateResourceParams>,
    ) -> Result<CallToolResult, McpError> {
        let classes = thing_ids(p.classes.unwrap_or_default());
        match self.api.create_resource(self.contributor, &p.label, &classes) {
            Ok(resource) => ok_json(&resource),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Create a predicate")]
    fn predicate_create(
        &self,
        Parameters(p): Parameters<CreatePredicateParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.create_predicate(self.contributor, &p.label) {
            Ok(predicate) => ok_json(&predicate),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Create a literal value")]
    fn literal_create(
        &self,
        Parameters(p): Parameters<CreateLiteralParams>,
    ) -> Result<CallToolResult, McpError> {
        match self
            .api
            .create_literal(self.contributor, &p.label, p.datatype.as_deref())
        {
            Ok(literal) => ok_json(&literal),
            Err(e) => graph_err(e),
        }
    }

    #[tool(description = "Create a statement linking a subject to an object through a predicate")]
    fn statement_create(
        &self,
        Parameters(p): Parameters<CreateStatementParams>,
    ) -> Result<CallToolResult, McpError> {
        match self.api.create_statement(
            self.contributor,
            &ThingId::from(p.subject_id),
            &ThingId::from(p.predicate_id),
            &ThingId::from(p.object_id),
            p.index,
        ) {
            Ok(statement) => ok_json(&statement),
            Err(e) => graph_err(e),
        }
    }

    // ── Bundle tools ────────────────────────────────────────────────────

    #[tool(description = "Collect the statements reachable from a thing by following outgoing statements")]
    fn bundle_fetch(
        &self,
        Parameters(p): Parameters<FetchBundleParams>,
    ) -> Result<CallToolResult, McpError> {
        let sort = match Sort::parse(p.sort.unwrap_or_default().as_slice()) {
            Ok(sort) => sort,
            Err(e) => return graph_err(e),
        };
        let configuration = BundleConfiguration {
            min_level: p.min_level,
            max_level: p.max_level,
            blacklist: thing_ids(p.blacklist.unwrap_or_default()),
            whitelist: thing_ids(p.whitelist.unwrap_or_default()),
        };
        match self.api.bundle(
            &ThingId::from(p.thing_id),
            &configuration,
            p.include_first.unwrap_or(false),
            &sort,
        ) {
            Ok(bundle) => ok_json(&bundle),
            Err(e) => graph_err(e),
        }
    }
}

#[tool_handler]
impl ServerHandler for GraphMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Knowledge graph MCP server: class hierarchy, things, statements and bundles"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run_mcp_server(api: GraphApi, paging: PagingConfig, contributor: ContributorId) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        let server = GraphMcpServer::new(api, paging, contributor);

        tracing::info!("mcp server starting on stdio");

        let service = match server.serve(rmcp::transport::stdio()).await {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to start MCP server: {}", e);
                return 1;
            }
        };

        if let Err(e) = service.waiting().await {
            eprintln!("MCP server error: {}", e);
            return 1;
        }

        0
    })
}
