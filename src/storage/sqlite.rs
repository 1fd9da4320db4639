//! SQLite storage backend
//!
//! Things live in one table per kind; ids are unique across all of them.
//! The hierarchy is a `subclass_of` table keyed by child id, so a class can
//! never have two parents. Upward and downward walks use recursive CTEs.

use super::traits::{
    ClassHierarchyRepository, ClassRelationRepository, ClassRepository, LinkOutcome, LinkRefusal,
    LiteralRepository, OpenStore, PredicateRepository, ResourceRepository, StatementRepository,
    StorageError, StorageResult, ThingRepository,
};
use crate::graph::{
    prefix, ChildClass, Class, ClassHierarchyEntry, ClassSubclassRelation, ContributorId,
    GeneralStatement, Literal, Predicate, Resource, StatementId, Thing, ThingId,
};
use crate::query::{BundleConfiguration, BundleTraversal, Page, PageRequest, Sort};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const CLASS_COLUMNS: &str =
    "c.id, c.label, c.uri, c.description, c.created_at, c.created_by, c.modifiable";

/// Upward walk from a class, excluding the class itself
const ANCESTORS_CTE: &str = r#"
    WITH RECURSIVE ancestors(id) AS (
        SELECT parent_id FROM subclass_of WHERE child_id = ?1
        UNION
        SELECT s.parent_id FROM subclass_of s JOIN ancestors a ON s.child_id = a.id
    )
"#;

/// Upward walk from a class, including the class itself
const CHAIN_CTE: &str = r#"
    WITH RECURSIVE chain(id) AS (
        SELECT ?1
        UNION
        SELECT s.parent_id FROM subclass_of s JOIN chain ch ON s.child_id = ch.id
    )
"#;

/// SQLite-backed graph store
///
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS classes (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                uri TEXT,
                description TEXT,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                modifiable INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS resources (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                modifiable INTEGER NOT NULL
            );

            -- Instance-of links; class ids are not constrained
            CREATE TABLE IF NOT EXISTS resource_classes (
                resource_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                PRIMARY KEY (resource_id, class_id),
                FOREIGN KEY (resource_id) REFERENCES resources(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_resource_classes_class
                ON resource_classes(class_id);

            CREATE TABLE IF NOT EXISTS predicates (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                modifiable INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS literals (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                datatype TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                modifiable INTEGER NOT NULL
            );

            -- One row per child: a class has at most one parent
            CREATE TABLE IF NOT EXISTS subclass_of (
                child_id TEXT PRIMARY KEY,
                parent_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                FOREIGN KEY (child_id) REFERENCES classes(id) ON DELETE CASCADE,
                FOREIGN KEY (parent_id) REFERENCES classes(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_subclass_of_parent
                ON subclass_of(parent_id);

            CREATE TABLE IF NOT EXISTS statements (
                id TEXT PRIMARY KEY,
                subject_id TEXT NOT NULL,
                predicate_id TEXT NOT NULL,
                object_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                modifiable INTEGER NOT NULL,
                statement_index INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_statements_subject
                ON statements(subject_id);

            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Run `insert` unless `taken` finds the id in use, both inside one
    /// immediate transaction. Returns whether the row was written.
    fn insert_unless_taken(
        &self,
        taken: impl FnOnce(&Connection) -> StorageResult<bool>,
        insert: impl FnOnce(&Connection) -> StorageResult<()>,
    ) -> StorageResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if taken(&tx)? {
            return Ok(false);
        }
        insert(&tx)?;
        tx.commit()?;
        Ok(true)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

// === Row conversion ===

fn format_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn parse_time(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

fn parse_contributor(value: &str) -> StorageResult<ContributorId> {
    value
        .parse()
        .map_err(|e| StorageError::CorruptRow(format!("contributor id {value:?}: {e}")))
}

fn to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// `LIMIT` and `OFFSET` values; anything past `i64::MAX` is clamped.
fn page_params(page: PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.size).unwrap_or(i64::MAX),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

struct ClassRow {
    id: String,
    label: String,
    uri: Option<String>,
    description: Option<String>,
    created_at: String,
    created_by: String,
    modifiable: bool,
}

impl ClassRow {
    /// Reads the first seven columns, in `CLASS_COLUMNS` order.
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            uri: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            created_by: row.get(5)?,
            modifiable: row.get(6)?,
        })
    }

    fn into_class(self) -> StorageResult<Class> {
        Ok(Class {
            id: ThingId::from(self.id),
            label: self.label,
            uri: self.uri,
            description: self.description,
            created_at: parse_time(&self.created_at)?,
            created_by: parse_contributor(&self.created_by)?,
            modifiable: self.modifiable,
        })
    }
}

/// Common columns of resources, predicates and literals
struct ThingRow {
    id: String,
    label: String,
    created_at: String,
    created_by: String,
    modifiable: bool,
}

impl ThingRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
            created_at: row.get(2)?,
            created_by: row.get(3)?,
            modifiable: row.get(4)?,
        })
    }
}

struct StatementRow {
    id: String,
    subject_id: String,
    predicate_id: String,
    object_id: String,
    created_at: String,
    created_by: String,
    modifiable: bool,
    index: Option<i64>,
}

impl StatementRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            subject_id: row.get(1)?,
            predicate_id: row.get(2)?,
            object_id: row.get(3)?,
            created_at: row.get(4)?,
            created_by: row.get(5)?,
            modifiable: row.get(6)?,
            index: row.get(7)?,
        })
    }

    fn into_statement(self, conn: &Connection) -> StorageResult<GeneralStatement> {
        let subject = load_thing(conn, &ThingId::from(self.subject_id.as_str()))?
            .ok_or_else(|| dangling(&self.id, &self.subject_id))?;
        let predicate = load_predicate(conn, &ThingId::from(self.predicate_id.as_str()))?
            .ok_or_else(|| dangling(&self.id, &self.predicate_id))?;
        let object = load_thing(conn, &ThingId::from(self.object_id.as_str()))?
            .ok_or_else(|| dangling(&self.id, &self.object_id))?;

        Ok(GeneralStatement {
            id: StatementId::from(self.id),
            subject,
            predicate,
            object,
            created_at: parse_time(&self.created_at)?,
            created_by: parse_contributor(&self.created_by)?,
            modifiable: self.modifiable,
            index: self.index,
        })
    }
}

fn dangling(statement_id: &str, thing_id: &str) -> StorageError {
    StorageError::CorruptRow(format!(
        "statement {statement_id} references missing thing {thing_id}"
    ))
}

// === Loading ===

fn load_class(conn: &Connection, id: &ThingId) -> StorageResult<Option<Class>> {
    let sql = format!("SELECT {CLASS_COLUMNS} FROM classes c WHERE c.id = ?1");
    conn.query_row(&sql, params![id.as_str()], ClassRow::read)
        .optional()?
        .map(ClassRow::into_class)
        .transpose()
}

fn load_resource_classes(conn: &Connection, id: &str) -> StorageResult<BTreeSet<ThingId>> {
    let mut stmt = conn.prepare(
        "SELECT class_id FROM resource_classes WHERE resource_id = ?1 ORDER BY class_id",
    )?;
    let classes = stmt
        .query_map(params![id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(classes.into_iter().map(ThingId::from).collect())
}

fn resource_from_row(conn: &Connection, row: ThingRow) -> StorageResult<Resource> {
    Ok(Resource {
        classes: load_resource_classes(conn, &row.id)?,
        id: ThingId::from(row.id),
        label: row.label,
        created_at: parse_time(&row.created_at)?,
        created_by: parse_contributor(&row.created_by)?,
        modifiable: row.modifiable,
    })
}

fn load_resource(conn: &Connection, id: &ThingId) -> StorageResult<Option<Resource>> {
    let row = conn
        .query_row(
            "SELECT id, label, created_at, created_by, modifiable FROM resources WHERE id = ?1",
            params![id.as_str()],
            ThingRow::read,
        )
        .optional()?;
    row.map(|row| resource_from_row(conn, row)).transpose()
}

fn load_predicate(conn: &Connection, id: &ThingId) -> StorageResult<Option<Predicate>> {
    let row = conn
        .query_row(
            "SELECT id, label, created_at, created_by, modifiable FROM predicates WHERE id = ?1",
            params![id.as_str()],
            ThingRow::read,
        )
        .optional()?;
    row.map(|row| {
        Ok(Predicate {
            id: ThingId::from(row.id),
            label: row.label,
            created_at: parse_time(&row.created_at)?,
            created_by: parse_contributor(&row.created_by)?,
            modifiable: row.modifiable,
        })
    })
    .transpose()
}

fn load_literal(conn: &Connection, id: &ThingId) -> StorageResult<Option<Literal>> {
    let row = conn
        .query_row(
            "SELECT id, label, created_at, created_by, modifiable, datatype FROM literals WHERE id = ?1",
            params![id.as_str()],
            |row| Ok((ThingRow::read(row)?, row.get::<_, String>(5)?)),
        )
        .optional()?;
    row.map(|(row, datatype)| {
        Ok(Literal {
            id: ThingId::from(row.id),
            label: row.label,
            datatype,
            created_at: parse_time(&row.created_at)?,
            created_by: parse_contributor(&row.created_by)?,
            modifiable: row.modifiable,
        })
    })
    .transpose()
}

fn load_thing(conn: &Connection, id: &ThingId) -> StorageResult<Option<Thing>> {
    if let Some(class) = load_class(conn, id)? {
        return Ok(Some(Thing::Class(class)));
    }
    if let Some(resource) = load_resource(conn, id)? {
        return Ok(Some(Thing::Resource(resource)));
    }
    if let Some(predicate) = load_predicate(conn, id)? {
        return Ok(Some(Thing::Predicate(predicate)));
    }
    Ok(load_literal(conn, id)?.map(Thing::Literal))
}

const STATEMENT_COLUMNS: &str = "id, subject_id, predicate_id, object_id, created_at, created_by, modifiable, statement_index";

fn load_statement(conn: &Connection, id: &StatementId) -> StorageResult<Option<GeneralStatement>> {
    let sql = format!("SELECT {STATEMENT_COLUMNS} FROM statements WHERE id = ?1");
    conn.query_row(&sql, params![id.as_str()], StatementRow::read)
        .optional()?
        .map(|row| row.into_statement(conn))
        .transpose()
}

fn outgoing_statements(conn: &Connection, subject: &ThingId) -> StorageResult<Vec<GeneralStatement>> {
    let sql = format!("SELECT {STATEMENT_COLUMNS} FROM statements WHERE subject_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![subject.as_str()], StatementRow::read)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(|row| row.into_statement(conn)).collect()
}

fn thing_exists(conn: &Connection, id: &ThingId) -> StorageResult<bool> {
    let exists = conn.query_row(
        r#"
        SELECT EXISTS (SELECT 1 FROM classes WHERE id = ?1)
            OR EXISTS (SELECT 1 FROM resources WHERE id = ?1)
            OR EXISTS (SELECT 1 FROM predicates WHERE id = ?1)
            OR EXISTS (SELECT 1 FROM literals WHERE id = ?1)
        "#,
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// `table` is always one of the fixed thing tables.
fn next_thing_id(conn: &Connection, prefix: char, table: &str) -> StorageResult<ThingId> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    let mut n = to_u64(count) + 1;
    loop {
        let id = ThingId::numbered(prefix, n);
        if !thing_exists(conn, &id)? {
            return Ok(id);
        }
        n += 1;
    }
}

fn upsert_relation(conn: &Connection, relation: &ClassSubclassRelation) -> StorageResult<()> {
    conn.execute(
        r#"
        INSERT INTO subclass_of (child_id, parent_id, created_at, created_by)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(child_id) DO UPDATE SET
            parent_id = excluded.parent_id,
            created_at = excluded.created_at,
            created_by = excluded.created_by
        "#,
        params![
            relation.child.id.as_str(),
            relation.parent.id.as_str(),
            format_time(&relation.created_at),
            relation.created_by.to_string(),
        ],
    )?;
    Ok(())
}

fn statement_exists(conn: &Connection, id: &StatementId) -> StorageResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM statements WHERE id = ?1)",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Whether `ancestor` lies strictly above `class`.
fn descends_from(conn: &Connection, class: &ThingId, ancestor: &ThingId) -> StorageResult<bool> {
    let sql = format!("{ANCESTORS_CTE} SELECT EXISTS (SELECT 1 FROM ancestors WHERE id = ?2)");
    let exists = conn.query_row(&sql, params![class.as_str(), ancestor.as_str()], |row| {
        row.get(0)
    })?;
    Ok(exists)
}

fn has_children(conn: &Connection, id: &ThingId) -> StorageResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM subclass_of WHERE parent_id = ?1)",
        params![id.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Inner `Ok(false)` when the child already sits under the requested parent.
fn check_link(
    conn: &Connection,
    relation: &ClassSubclassRelation,
    must_not_exist: bool,
) -> StorageResult<Result<bool, LinkRefusal>> {
    let child = &relation.child.id;
    let parent = &relation.parent.id;
    if must_not_exist && has_children(conn, parent)? {
        return Ok(Err(LinkRefusal::ParentHasChildren {
            parent: parent.clone(),
        }));
    }
    let current: Option<String> = conn
        .query_row(
            "SELECT parent_id FROM subclass_of WHERE child_id = ?1",
            params![child.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    match current.map(ThingId::from) {
        Some(current) if must_not_exist || current != *parent => {
            return Ok(Err(LinkRefusal::ChildHasParent {
                child: child.clone(),
                parent: current,
            }))
        }
        Some(_) => return Ok(Ok(false)),
        None => {}
    }
    if child == parent || descends_from(conn, parent, child)? {
        return Ok(Err(LinkRefusal::Cycle {
            child: child.clone(),
            parent: parent.clone(),
        }));
    }
    Ok(Ok(true))
}

fn upsert_class(conn: &Connection, class: &Class) -> StorageResult<()> {
    // Upsert rather than REPLACE so subclass rows are not cascaded away
    conn.execute(
        r#"
        INSERT INTO classes (id, label, uri, description, created_at, created_by, modifiable)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id) DO UPDATE SET
            label = excluded.label,
            uri = excluded.uri,
            description = excluded.description,
            created_at = excluded.created_at,
            created_by = excluded.created_by,
            modifiable = excluded.modifiable
        "#,
        params![
            class.id.as_str(),
            class.label,
            class.uri,
            class.description,
            format_time(&class.created_at),
            class.created_by.to_string(),
            class.modifiable,
        ],
    )?;
    Ok(())
}

/// Writes the resource row and replaces its class links; callers own the transaction.
fn upsert_resource(conn: &Connection, resource: &Resource) -> StorageResult<()> {
    conn.execute(
        r#"
        INSERT INTO resources (id, label, created_at, created_by, modifiable)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            label = excluded.label,
            created_at = excluded.created_at,
            created_by = excluded.created_by,
            modifiable = excluded.modifiable
        "#,
        params![
            resource.id.as_str(),
            resource.label,
            format_time(&resource.created_at),
            resource.created_by.to_string(),
            resource.modifiable,
        ],
    )?;
    conn.execute(
        "DELETE FROM resource_classes WHERE resource_id = ?1",
        params![resource.id.as_str()],
    )?;
    for class_id in &resource.classes {
        conn.execute(
            "INSERT INTO resource_classes (resource_id, class_id) VALUES (?1, ?2)",
            params![resource.id.as_str(), class_id.as_str()],
        )?;
    }
    Ok(())
}

fn upsert_predicate(conn: &Connection, predicate: &Predicate) -> StorageResult<()> {
    conn.execute(
        r#"
        INSERT INTO predicates (id, label, created_at, created_by, modifiable)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(id) DO UPDATE SET
            label = excluded.label,
            created_at = excluded.created_at,
            created_by = excluded.created_by,
            modifiable = excluded.modifiable
        "#,
        params![
            predicate.id.as_str(),
            predicate.label,
            format_time(&predicate.created_at),
            predicate.created_by.to_string(),
            predicate.modifiable,
        ],
    )?;
    Ok(())
}

fn upsert_literal(conn: &Connection, literal: &Literal) -> StorageResult<()> {
    conn.execute(
        r#"
        INSERT INTO literals (id, label, datatype, created_at, created_by, modifiable)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            label = excluded.label,
            datatype = excluded.datatype,
            created_at = excluded.created_at,
            created_by = excluded.created_by,
            modifiable = excluded.modifiable
        "#,
        params![
            literal.id.as_str(),
            literal.label,
            literal.datatype,
            format_time(&literal.created_at),
            literal.created_by.to_string(),
            literal.modifiable,
        ],
    )?;
    Ok(())
}

fn upsert_statement(conn: &Connection, statement: &GeneralStatement) -> StorageResult<()> {
    conn.execute(
        r#"
        INSERT INTO statements (id, subject_id, predicate_id, object_id, created_at, created_by, modifiable, statement_index)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(id) DO UPDATE SET
            subject_id = excluded.subject_id,
            predicate_id = excluded.predicate_id,
            object_id = excluded.object_id,
            created_at = excluded.created_at,
            created_by = excluded.created_by,
            modifiable = excluded.modifiable,
            statement_index = excluded.statement_index
        "#,
        params![
            statement.id.as_str(),
            statement.subject.id().as_str(),
            statement.predicate.id.as_str(),
            statement.object.id().as_str(),
            format_time(&statement.created_at),
            statement.created_by.to_string(),
            statement.modifiable,
            statement.index,
        ],
    )?;
    Ok(())
}

fn classes_from_rows(rows: Vec<ClassRow>) -> StorageResult<Vec<Class>> {
    rows.into_iter().map(ClassRow::into_class).collect()
}

// === Repositories ===

impl ClassRepository for SqliteStore {
    fn save_class(&self, class: &Class) -> StorageResult<()> {
        let conn = self.conn()?;
        upsert_class(&conn, class)
    }

    fn insert_class(&self, class: &Class) -> StorageResult<bool> {
        self.insert_unless_taken(
            |conn| thing_exists(conn, &class.id),
            |conn| upsert_class(conn, class),
        )
    }

    fn find_class_by_id(&self, id: &ThingId) -> StorageResult<Option<Class>> {
        let conn = self.conn()?;
        load_class(&conn, id)
    }

    fn find_all_classes(&self, page: PageRequest) -> StorageResult<Page<Class>> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM classes", [], |row| row.get(0))?;
        let (limit, offset) = page_params(page);
        let sql = format!("SELECT {CLASS_COLUMNS} FROM classes c ORDER BY c.id LIMIT ?1 OFFSET ?2");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit, offset], ClassRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(classes_from_rows(rows)?, page, to_u64(total)))
    }

    fn delete_all_classes(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute_batch("DELETE FROM subclass_of; DELETE FROM classes;")?;
        Ok(())
    }

    fn next_class_id(&self) -> StorageResult<ThingId> {
        let conn = self.conn()?;
        next_thing_id(&conn, prefix::CLASS, "classes")
    }
}

impl ResourceRepository for SqliteStore {
    fn save_resource(&self, resource: &Resource) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        upsert_resource(&tx, resource)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_resource(&self, resource: &Resource) -> StorageResult<bool> {
        self.insert_unless_taken(
            |conn| thing_exists(conn, &resource.id),
            |conn| upsert_resource(conn, resource),
        )
    }

    fn find_resource_by_id(&self, id: &ThingId) -> StorageResult<Option<Resource>> {
        let conn = self.conn()?;
        load_resource(&conn, id)
    }

    fn find_all_resources(&self, page: PageRequest) -> StorageResult<Page<Resource>> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;
        let (limit, offset) = page_params(page);
        let mut stmt = conn.prepare(
            "SELECT id, label, created_at, created_by, modifiable FROM resources ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt
            .query_map(params![limit, offset], ThingRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        let resources = rows
            .into_iter()
            .map(|row| resource_from_row(&conn, row))
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Page::new(resources, page, to_u64(total)))
    }

    fn delete_all_resources(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute_batch("DELETE FROM resource_classes; DELETE FROM resources;")?;
        Ok(())
    }

    fn next_resource_id(&self) -> StorageResult<ThingId> {
        let conn = self.conn()?;
        next_thing_id(&conn, prefix::RESOURCE, "resources")
    }
}

impl PredicateRepository for SqliteStore {
    fn save_predicate(&self, predicate: &Predicate) -> StorageResult<()> {
        let conn = self.conn()?;
        upsert_predicate(&conn, predicate)
    }

    fn insert_predicate(&self, predicate: &Predicate) -> StorageResult<bool> {
        self.insert_unless_taken(
            |conn| thing_exists(conn, &predicate.id),
            |conn| upsert_predicate(conn, predicate),
        )
    }

    fn find_predicate_by_id(&self, id: &ThingId) -> StorageResult<Option<Predicate>> {
        let conn = self.conn()?;
        load_predicate(&conn, id)
    }

    fn delete_all_predicates(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM predicates", [])?;
        Ok(())
    }

    fn next_predicate_id(&self) -> StorageResult<ThingId> {
        let conn = self.conn()?;
        next_thing_id(&conn, prefix::PREDICATE, "predicates")
    }
}

impl LiteralRepository for SqliteStore {
    fn save_literal(&self, literal: &Literal) -> StorageResult<()> {
        let conn = self.conn()?;
        upsert_literal(&conn, literal)
    }

    fn insert_literal(&self, literal: &Literal) -> StorageResult<bool> {
        self.insert_unless_taken(
            |conn| thing_exists(conn, &literal.id),
            |conn| upsert_literal(conn, literal),
        )
    }

    fn find_literal_by_id(&self, id: &ThingId) -> StorageResult<Option<Literal>> {
        let conn = self.conn()?;
        load_literal(&conn, id)
    }

    fn delete_all_literals(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM literals", [])?;
        Ok(())
    }

    fn next_literal_id(&self) -> StorageResult<ThingId> {
        let conn = self.conn()?;
        next_thing_id(&conn, prefix::LITERAL, "literals")
    }
}

impl ThingRepository for SqliteStore {
    fn find_thing_by_id(&self, id: &ThingId) -> StorageResult<Option<Thing>> {
        let conn = self.conn()?;
        load_thing(&conn, id)
    }
}

impl StatementRepository for SqliteStore {
    fn save_statement(&self, statement: &GeneralStatement) -> StorageResult<()> {
        let conn = self.conn()?;
        upsert_statement(&conn, statement)
    }

    fn insert_statement(&self, statement: &GeneralStatement) -> StorageResult<bool> {
        self.insert_unless_taken(
            |conn| statement_exists(conn, &statement.id),
            |conn| upsert_statement(conn, statement),
        )
    }

    fn find_statement_by_id(&self, id: &StatementId) -> StorageResult<Option<GeneralStatement>> {
        let conn = self.conn()?;
        load_statement(&conn, id)
    }

    fn fetch_as_bundle(
        &self,
        id: &ThingId,
        configuration: &BundleConfiguration,
        sort: &Sort,
    ) -> StorageResult<Vec<GeneralStatement>> {
        let conn = self.conn()?;
        let mut statements = BundleTraversal::from(id, configuration)
            .execute(|subject| outgoing_statements(&conn, subject))?;
        sort.sort_statements(&mut statements);
        Ok(statements)
    }

    fn delete_all_statements(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM statements", [])?;
        Ok(())
    }

    fn next_statement_id(&self) -> StorageResult<StatementId> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM statements", [], |row| row.get(0))?;
        let mut n = to_u64(count) + 1;
        loop {
            let id = StatementId::numbered(n);
            if !statement_exists(&conn, &id)? {
                return Ok(id);
            }
            n += 1;
        }
    }
}

impl ClassRelationRepository for SqliteStore {
    fn save_relation(&self, relation: &ClassSubclassRelation) -> StorageResult<()> {
        let conn = self.conn()?;
        upsert_relation(&conn, relation)
    }

    fn save_all_relations(&self, relations: &[ClassSubclassRelation]) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for relation in relations {
            upsert_relation(&tx, relation)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn link_relations(
        &self,
        relations: &[ClassSubclassRelation],
        must_not_exist: bool,
    ) -> StorageResult<LinkOutcome> {
        let mut conn = self.conn()?;
        // Immediate: no other writer may change the hierarchy between check and write
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut pending = Vec::with_capacity(relations.len());
        for relation in relations {
            match check_link(&tx, relation, must_not_exist)? {
                Ok(true) => pending.push(relation),
                Ok(false) => {}
                Err(refusal) => return Ok(LinkOutcome::Refused(refusal)),
            }
        }
        for relation in &pending {
            upsert_relation(&tx, relation)?;
        }
        tx.commit()?;
        Ok(LinkOutcome::Linked(pending.len()))
    }

    fn delete_relation_by_child_id(&self, child_id: &ThingId) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM subclass_of WHERE child_id = ?1",
            params![child_id.as_str()],
        )?;
        Ok(())
    }

    fn delete_all_relations(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM subclass_of", [])?;
        Ok(())
    }
}

impl ClassHierarchyRepository for SqliteStore {
    fn find_parent_by_child_id(&self, child_id: &ThingId) -> StorageResult<Option<Class>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {CLASS_COLUMNS} FROM subclass_of s JOIN classes c ON c.id = s.parent_id WHERE s.child_id = ?1"
        );
        conn.query_row(&sql, params![child_id.as_str()], ClassRow::read)
            .optional()?
            .map(ClassRow::into_class)
            .transpose()
    }

    fn find_all_children_by_ancestor_id(
        &self,
        id: &ThingId,
        page: PageRequest,
    ) -> StorageResult<Page<ChildClass>> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subclass_of s JOIN classes c ON c.id = s.child_id WHERE s.parent_id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        let (limit, offset) = page_params(page);
        let sql = format!(
            r#"
            SELECT {CLASS_COLUMNS},
                (SELECT COUNT(*) FROM subclass_of g WHERE g.parent_id = c.id)
            FROM subclass_of s JOIN classes c ON c.id = s.child_id
            WHERE s.parent_id = ?1
            ORDER BY c.id
            LIMIT ?2 OFFSET ?3
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![id.as_str(), limit, offset], |row| {
                Ok((ClassRow::read(row)?, row.get::<_, i64>(7)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let children = rows
            .into_iter()
            .map(|(row, count)| {
                Ok(ChildClass {
                    class: row.into_class()?,
                    child_count: to_u64(count),
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Page::new(children, page, to_u64(total)))
    }

    fn find_root_by_descendant_id(&self, id: &ThingId) -> StorageResult<Option<Class>> {
        let conn = self.conn()?;
        let sql = format!(
            r#"
            {ANCESTORS_CTE}
            SELECT {CLASS_COLUMNS} FROM ancestors a JOIN classes c ON c.id = a.id
            WHERE NOT EXISTS (SELECT 1 FROM subclass_of s WHERE s.child_id = a.id)
            LIMIT 1
            "#
        );
        conn.query_row(&sql, params![id.as_str()], ClassRow::read)
            .optional()?
            .map(ClassRow::into_class)
            .transpose()
    }

    fn find_all_roots(&self, page: PageRequest) -> StorageResult<Page<Class>> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM classes c WHERE NOT EXISTS (SELECT 1 FROM subclass_of s WHERE s.child_id = c.id)",
            [],
            |row| row.get(0),
        )?;
        let (limit, offset) = page_params(page);
        let sql = format!(
            r#"
            SELECT {CLASS_COLUMNS} FROM classes c
            WHERE NOT EXISTS (SELECT 1 FROM subclass_of s WHERE s.child_id = c.id)
            ORDER BY c.id
            LIMIT ?1 OFFSET ?2
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit, offset], ClassRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(classes_from_rows(rows)?, page, to_u64(total)))
    }

    fn exists_child(&self, id: &ThingId, child_id: &ThingId) -> StorageResult<bool> {
        let conn = self.conn()?;
        descends_from(&conn, child_id, id)
    }

    fn exists_children(&self, id: &ThingId) -> StorageResult<bool> {
        let conn = self.conn()?;
        has_children(&conn, id)
    }

    fn count_class_instances(&self, id: &ThingId) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            r#"
            WITH RECURSIVE descendants(id) AS (
                SELECT ?1
                UNION
                SELECT s.child_id FROM subclass_of s JOIN descendants d ON s.parent_id = d.id
            )
            SELECT COUNT(DISTINCT rc.resource_id)
            FROM resource_classes rc JOIN descendants d ON rc.class_id = d.id
            "#,
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(to_u64(count))
    }

    fn find_class_hierarchy(
        &self,
        id: &ThingId,
        page: PageRequest,
    ) -> StorageResult<Page<ClassHierarchyEntry>> {
        let conn = self.conn()?;
        let count_sql =
            format!("{CHAIN_CTE} SELECT COUNT(*) FROM chain ch JOIN classes c ON c.id = ch.id");
        let total: i64 = conn.query_row(&count_sql, params![id.as_str()], |row| row.get(0))?;
        let (limit, offset) = page_params(page);
        let sql = format!(
            r#"
            {CHAIN_CTE}
            SELECT {CLASS_COLUMNS}, s.parent_id
            FROM chain ch
            JOIN classes c ON c.id = ch.id
            LEFT JOIN subclass_of s ON s.child_id = c.id
            ORDER BY c.id
            LIMIT ?2 OFFSET ?3
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![id.as_str(), limit, offset], |row| {
                Ok((ClassRow::read(row)?, row.get::<_, Option<String>>(7)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        let entries = rows
            .into_iter()
            .map(|(row, parent_id)| {
                Ok(ClassHierarchyEntry {
                    class: row.into_class()?,
                    parent_id: parent_id.map(ThingId::from),
                })
            })
            .collect::<StorageResult<Vec<_>>>()?;
        Ok(Page::new(entries, page, to_u64(total)))
    }
}
