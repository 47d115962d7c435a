//! SQLite kit: read-only inspection of a local database file.
//!
//! Tool handlers are synchronous and already run on the blocking pool, so
//! each call opens its own read-only connection and drives it on a
//! current-thread runtime that lives for that call only.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Number, Value, json};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row, SqliteConnection, TypeInfo, ValueRef};
use tracing::{debug, instrument};

use crate::domains::tools::{Kit, KitError, KitRegistrar, ToolSchema};

const DEFAULT_PREVIEW_LIMIT: i64 = 20;

/// Hard limit so a preview can't dump a whole table.
const MAX_PREVIEW_LIMIT: i64 = 1000;

// ============================================================================
// Tool Parameters
// ============================================================================

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableParams {
    /// Table name, as returned by `list_tables`.
    pub table_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PreviewParams {
    /// Table name, as returned by `list_tables`.
    pub table_name: String,

    /// Maximum number of rows to return.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PREVIEW_LIMIT
}

// ============================================================================
// Database access
// ============================================================================

/// A database file opened read-only, one connection per call.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `{"tables": [name, ...]}` in creation order.
    pub fn list_tables(&self) -> anyhow::Result<Value> {
        block_on(self.query_tables())
    }

    /// `{"columns": [{"name", "type"}, ...]}` for one table.
    pub fn list_columns(&self, table: &str) -> anyhow::Result<Value> {
        block_on(self.query_columns(table))
    }

    /// `{"columns": [...], "rows": [[...], ...]}` for the first `limit` rows.
    pub fn preview_table(&self, table: &str, limit: i64) -> anyhow::Result<Value> {
        if limit < 0 {
            bail!("limit must not be negative (got {limit})");
        }
        block_on(self.query_preview(table, limit.min(MAX_PREVIEW_LIMIT)))
    }

    async fn connect(&self) -> anyhow::Result<SqliteConnection> {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true)
            .connect()
            .await
            .with_context(|| format!("Failed to open database '{}'", self.path.display()))
    }

    async fn query_tables(&self) -> anyhow::Result<Value> {
        let mut conn = self.connect().await?;
        let tables = table_names(&mut conn).await?;
        conn.close().await?;
        Ok(json!({ "tables": tables }))
    }

    async fn query_columns(&self, table: &str) -> anyhow::Result<Value> {
        let mut conn = self.connect().await?;
        ensure_table(&mut conn, table).await?;
        let columns: Vec<Value> = table_info(&mut conn, table)
            .await?
            .into_iter()
            .map(|(name, ty)| json!({ "name": name, "type": ty }))
            .collect();
        conn.close().await?;
        Ok(json!({ "columns": columns }))
    }

    #[instrument(skip(self))]
    async fn query_preview(&self, table: &str, limit: i64) -> anyhow::Result<Value> {
        let mut conn = self.connect().await?;
        ensure_table(&mut conn, table).await?;

        let sql = format!("SELECT * FROM {} LIMIT ?1", quote_identifier(table));
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&mut conn).await?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => table_info(&mut conn, table)
                .await?
                .into_iter()
                .map(|(name, _)| name)
                .collect(),
        };
        let rows = rows
            .iter()
            .map(row_values)
            .collect::<anyhow::Result<Vec<_>>>()?;
        conn.close().await?;

        debug!("Previewed {} rows of '{}'", rows.len(), table);
        Ok(json!({ "columns": columns, "rows": rows }))
    }
}

fn block_on<T>(future: impl Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the query runtime")?;
    runtime.block_on(future)
}

async fn table_names(conn: &mut SqliteConnection) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
        .fetch_all(&mut *conn)
        .await
}

/// Table names are checked against the catalog before they reach any SQL.
async fn ensure_table(conn: &mut SqliteConnection, table: &str) -> anyhow::Result<()> {
    if !table_names(conn).await?.iter().any(|name| name == table) {
        bail!("no such table: '{table}'");
    }
    Ok(())
}

async fn table_info(
    conn: &mut SqliteConnection,
    table: &str,
) -> anyhow::Result<Vec<(String, String)>> {
    let rows = sqlx::query("SELECT name, type FROM pragma_table_info(?1)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;
    rows.iter()
        .map(|row| -> anyhow::Result<(String, String)> {
            Ok((row.try_get("name")?, row.try_get("type")?))
        })
        .collect()
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn row_values(row: &SqliteRow) -> anyhow::Result<Vec<Value>> {
    (0..row.len()).map(|index| cell(row, index)).collect()
}

/// Convert one cell by its storage class. Blobs become lowercase hex.
fn cell(row: &SqliteRow, index: usize) -> anyhow::Result<Value> {
    let storage = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_string()
    };

    let value = match storage.as_str() {
        "INTEGER" => Value::from(row.try_get::<i64, _>(index)?),
        "REAL" => Number::from_f64(row.try_get::<f64, _>(index)?)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        "BLOB" => {
            let bytes: Vec<u8> = row.try_get(index)?;
            Value::String(bytes.iter().map(|b| format!("{b:02x}")).collect())
        }
        _ => Value::String(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}

// ============================================================================
// Kit
// ============================================================================

/// The SQLite kit. Unavailable when the database file does not exist.
#[derive(Debug, Clone)]
pub struct SqliteKit {
    database: Database,
}

impl SqliteKit {
    pub const NAME: &'static str = "sqlite";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            database: Database::new(path),
        }
    }
}

impl Kit for SqliteKit {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register(&self, registrar: &mut KitRegistrar<'_>) -> Result<(), KitError> {
        if !self.database.path().is_file() {
            return Err(KitError::unavailable(
                Self::NAME,
                format!(
                    "database '{}' not found (set MCP_SQLITE_PATH)",
                    self.database.path().display()
                ),
            ));
        }

        let schema = ToolSchema::builder("List all table names in the SQLite database.")
            .build()
            .map_err(|source| KitError::Registration {
                kit: Self::NAME.to_string(),
                source,
            })?;
        let db = self.database.clone();
        registrar.register("list_tables", schema, move |_| db.list_tables())?;

        let db = self.database.clone();
        registrar.register_typed(
            "list_columns",
            "List column names and types for a table.",
            move |p: TableParams| db.list_columns(&p.table_name),
        )?;
        let db = self.database.clone();
        registrar.register_typed(
            "preview_table",
            "Preview the first N rows of a table.",
            move |p: PreviewParams| db.preview_table(&p.table_name, p.limit),
        )?;
        Ok(())
    }
}
