//! SQLite-backed stores.
//!
//! [`Database`] owns the single connection every store shares. Store
//! operations are split by entity into submodules, each adding methods to
//! `Database`. Every write is one statement, so each runs in its own
//! implicit transaction.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use rusqlite::types::Value;
use uuid::Uuid;

use crate::aggregate::EntityKind;
use crate::error::{Error, Result};
use crate::migrations::{self, MigrationConfig};

mod application;
mod association;
mod company;
pub(crate) mod constraint;
mod event;
mod person;
pub(crate) mod row;

pub(crate) use application::application_at;
pub(crate) use company::company_at;
pub(crate) use event::event_at;
pub(crate) use person::person_at;

pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::internal(format!("cannot create {}", parent.display()), e))?;
        }
        let conn = Connection::open(&path)?;
        Self::configure(&conn)?;
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Ok(Self { conn, path: None })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    }

    /// XDG data directory, or `./applytrack.db` when none can be determined.
    pub fn default_path() -> PathBuf {
        match directories::ProjectDirs::from("", "", "applytrack") {
            Some(dirs) => dirs.data_dir().join("applytrack.db"),
            None => PathBuf::from("applytrack.db"),
        }
    }

    /// `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn migrate(&mut self, config: &MigrationConfig) -> Result<usize> {
        migrations::run_migrations(&mut self.conn, config)
    }

    /// Fails unless the schema has been applied.
    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'application'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(Error::validation(
                "database not initialized, run 'applytrack init' first",
            ));
        }
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Stored columns of an entity table, in canonical projection order.
pub(crate) fn columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Company => company::COMPANY_COLUMNS,
        EntityKind::Person => person::PERSON_COLUMNS,
        EntityKind::Event => event::EVENT_COLUMNS,
        EntityKind::Application => application::APPLICATION_COLUMNS,
    }
}

/// Column list for a SELECT or RETURNING clause, optionally alias-qualified.
pub(crate) fn column_list(alias: Option<&str>, columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{a}.{c}"),
            None => (*c).to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Dynamic partial UPDATE: only columns that were set appear in the SQL.
/// `updated_date` is always stamped.
pub(crate) struct UpdateBuilder {
    table: &'static str,
    columns: Vec<&'static str>,
    values: Vec<Value>,
}

impl UpdateBuilder {
    pub(crate) fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub(crate) fn set_opt<T: Into<Value>>(&mut self, column: &'static str, value: Option<T>) {
        if let Some(value) = value {
            self.columns.push(column);
            self.values.push(value.into());
        }
    }

    /// SQL and bound values for `UPDATE ... WHERE id = ? RETURNING ...`.
    pub(crate) fn finish(mut self, id: Uuid, returning: &[&str]) -> (String, Vec<Value>) {
        self.columns.push("updated_date");
        self.values
            .push(Value::Text(crate::timestamp::format(&crate::timestamp::now())));
        let assignments = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        self.values.push(Value::Text(id.to_string()));
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ?{} RETURNING {}",
            self.table,
            self.values.len(),
            column_list(None, returning)
        );
        (sql, self.values)
    }
}

/// Case-insensitive substring pattern for `LOWER(col) LIKE ... ESCAPE '\'`.
/// SQLite's `LOWER` folds ASCII only, so the needle is folded the same way.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for ch in needle.to_ascii_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Zero rows affected is NotFound, more than one is an invariant violation.
pub(crate) fn expect_one_affected(affected: usize, detail: impl FnOnce() -> String) -> Result<()> {
    match affected {
        0 => Err(Error::not_found(detail())),
        1 => Ok(()),
        n => Err(Error::invariant(format!(
            "delete affected {n} rows, expected 1: {}",
            detail()
        ))),
    }
}
