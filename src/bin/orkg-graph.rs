//! orkg-graph CLI: class hierarchy and statement bundles, with MCP server.
//!
//! Usage:
//!   orkg-graph mcp [--db path | --in-memory]
//!   orkg-graph class <subcommand> [--db path]
//!   orkg-graph bundle <thing-id> [--max-level n] [--sort key,dir]

use clap::{Parser, Subcommand};
use orkg_graph::config::{Backend, Config, PagingConfig};
use orkg_graph::mcp::run_mcp_server;
use orkg_graph::{
    BundleConfiguration, ContributorId, GraphApi, GraphResult, InMemoryStore, OpenStore, Sort,
    SqliteStore, ThingId,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "orkg-graph",
    version,
    about = "Knowledge graph class hierarchy and statement bundles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Keep the graph in memory; nothing is persisted
    #[arg(long, global = true, conflicts_with = "db")]
    in_memory: bool,
    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Contributor UUID recorded on everything created
    #[arg(long, global = true)]
    contributor: Option<ContributorId>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP (Model Context Protocol) server on stdio
    Mcp,
    /// Work with classes and the subclass hierarchy
    Class {
        #[command(subcommand)]
        action: ClassAction,
    },
    /// Create a resource
    Resource {
        /// Label of the resource
        label: String,
        /// Class the resource is an instance of (repeatable)
        #[arg(long = "class")]
        classes: Vec<String>,
    },
    /// Create a predicate
    Predicate {
        /// Label of the predicate
        label: String,
    },
    /// Create a literal
    Literal {
        /// The literal value
        label: String,
        /// Datatype, e.g. xsd:integer
        #[arg(long)]
        datatype: Option<String>,
    },
    /// Create a statement
    Statement {
        subject: String,
        predicate: String,
        object: String,
        /// Position among sibling statements
        #[arg(long)]
        index: Option<i64>,
    },
    /// Fetch the statements reachable from a thing
    Bundle {
        /// ID of the starting thing
        thing_id: String,
        /// Hide statements at this level or shallower (1 hides direct statements)
        #[arg(long)]
        min_level: Option<usize>,
        /// Skip statements deeper than this level (1 keeps direct statements only)
        #[arg(long)]
        max_level: Option<usize>,
        /// Prune objects of this class (repeatable)
        #[arg(long)]
        blacklist: Vec<String>,
        /// Only follow objects of this class (repeatable)
        #[arg(long)]
        whitelist: Vec<String>,
        /// Always include the direct statements of the thing
        #[arg(long)]
        include_first: bool,
        /// Sort key such as created_at,desc (repeatable)
        #[arg(long)]
        sort: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ClassAction {
    /// Create a new class
    Create {
        label: String,
        #[arg(long)]
        uri: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List direct subclasses
    Children {
        id: String,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        size: Option<usize>,
    },
    /// Show the direct parent
    Parent { id: String },
    /// Show the topmost ancestor
    Root { id: String },
    /// List classes without a parent
    Roots {
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        size: Option<usize>,
    },
    /// List a class and its ancestors
    Hierarchy {
        id: String,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        size: Option<usize>,
    },
    /// Count instances, including those of subclasses
    Count { id: String },
    /// Attach subclasses to a parent
    Link {
        parent: String,
        #[arg(required = true)]
        children: Vec<String>,
        /// Tolerate children already attached to this parent
        #[arg(long)]
        upsert: bool,
    },
    /// Give a class a parent
    SetParent { child: String, parent: String },
    /// Detach a class from its parent
    Unlink { child: String },
}

fn load_config(cli: &Cli) -> Result<Config, String> {
    let mut config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(db) = &cli.db {
        config.database.backend = Backend::Sqlite;
        config.database.path = Some(db.clone());
    }
    if cli.in_memory {
        config.database.backend = Backend::Memory;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

/// Log to stderr; stdout carries command output and the MCP transport.
fn init_logging(level: &str) {
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_api(config: &Config) -> Result<GraphApi, String> {
    match config.database.backend {
        Backend::Memory => Ok(GraphApi::new(Arc::new(InMemoryStore::new()))),
        Backend::Sqlite => {
            let path = config.database_path();
            let store = SqliteStore::open(&path)
                .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;
            Ok(GraphApi::new(Arc::new(store)))
        }
    }
}

fn report<T: Serialize>(result: GraphResult<T>) -> i32 {
    let value = match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match serde_json::to_string_pretty(&value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn ids(values: Vec<String>) -> Vec<ThingId> {
    values.into_iter().map(ThingId::from).collect()
}

fn cmd_class(
    api: &GraphApi,
    paging: &PagingConfig,
    contributor: ContributorId,
    action: ClassAction,
) -> i32 {
    match action {
        ClassAction::Create {
            label,
            uri,
            description,
        } => report(api.create_class(contributor, &label, uri.as_deref(), description.as_deref())),
        ClassAction::Children { id, page, size } => {
            report(api.children(&ThingId::from(id), paging.request(page, size)))
        }
        ClassAction::Parent { id } => report(api.parent(&ThingId::from(id))),
        ClassAction::Root { id } => report(api.root(&ThingId::from(id))),
        ClassAction::Roots { page, size } => report(api.roots(paging.request(page, size))),
        ClassAction::Hierarchy { id, page, size } => {
            report(api.hierarchy(&ThingId::from(id), paging.request(page, size)))
        }
        ClassAction::Count { id } => report(
            api.count_instances(&ThingId::from(id))
                .map(|count| serde_json::json!({ "count": count })),
        ),
        ClassAction::Link {
            parent,
            children,
            upsert,
        } => {
            let parent = ThingId::from(parent);
            let children = ids(children);
            let result = if upsert {
                api.upsert_children(contributor, &parent, &children)
            } else {
                api.add_children(contributor, &parent, &children)
            };
            report(result.map(|()| serde_json::json!({ "linked": parent, "children": children })))
        }
        ClassAction::SetParent { child, parent } => {
            let child = ThingId::from(child);
            let parent = ThingId::from(parent);
            report(
                api.set_parent(contributor, &child, &parent)
                    .map(|()| serde_json::json!({ "child": child, "parent": parent })),
            )
        }
        ClassAction::Unlink { child } => {
            let child = ThingId::from(child);
            report(
                api.remove_parent(&child)
                    .map(|()| serde_json::json!({ "unlinked": child })),
            )
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_bundle(
    api: &GraphApi,
    thing_id: String,
    min_level: Option<usize>,
    max_level: Option<usize>,
    blacklist: Vec<String>,
    whitelist: Vec<String>,
    include_first: bool,
    sort: Vec<String>,
) -> i32 {
    let sort = match Sort::parse(&sort) {
        Ok(sort) => sort,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 2;
        }
    };
    let configuration = BundleConfiguration {
        min_level,
        max_level,
        blacklist: ids(blacklist),
        whitelist: ids(whitelist),
    };
    report(api.bundle(&ThingId::from(thing_id), &configuration, include_first, &sort))
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    init_logging(&config.log_level);

    let api = match open_api(&config) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let contributor = cli.contributor.unwrap_or_default();

    let code = match cli.command {
        Commands::Mcp => run_mcp_server(api, config.paging.clone(), contributor),
        Commands::Class { action } => cmd_class(&api, &config.paging, contributor, action),
        Commands::Resource { label, classes } => {
            report(api.create_resource(contributor, &label, &ids(classes)))
        }
        Commands::Predicate { label } => report(api.create_predicate(contributor, &label)),
        Commands::Literal { label, datatype } => {
            report(api.create_literal(contributor, &label, datatype.as_deref()))
        }
        Commands::Statement {
            subject,
            predicate,
            object,
            index,
        } => report(api.create_statement(
            contributor,
            &ThingId::from(subject),
            &ThingId::from(predicate),
            &ThingId::from(object),
            index,
        )),
        Commands::Bundle {
            thing_id,
            min_level,
            max_level,
            blacklist,
            whitelist,
            include_first,
            sort,
        } => cmd_bundle(
            &api,
            thing_id,
            min_level,
            max_level,
            blacklist,
            whitelist,
            include_first,
            sort,
        ),
    };

    std::process::exit(code);
}
