//! Schema migrations, loaded from SQL files on disk and applied with refinery.
//!
//! Refinery tracks applied migrations in its own `refinery_schema_history`
//! table, so running them twice is a no-op.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Directory holding `V<n>__<name>.sql` files.
    pub path: PathBuf,
    /// When false, `path` is resolved against the working directory.
    pub path_is_absolute: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            path_is_absolute: false,
        }
    }
}

impl MigrationConfig {
    pub fn new(path: impl Into<PathBuf>, path_is_absolute: bool) -> Self {
        Self {
            path: path.into(),
            path_is_absolute,
        }
    }

    pub fn resolve(&self) -> Result<PathBuf> {
        if self.path_is_absolute {
            if !self.path.is_absolute() {
                return Err(Error::invalid_field(
                    "MigrationsPath",
                    format!("{} is not an absolute path", self.path.display()),
                ));
            }
            return Ok(self.path.clone());
        }
        let cwd = std::env::current_dir()
            .map_err(|e| Error::internal("cannot determine working directory", e))?;
        Ok(cwd.join(&self.path))
    }
}

/// Apply every pending migration found under the configured directory.
/// Returns the number of migrations applied by this call.
pub fn run_migrations(conn: &mut Connection, config: &MigrationConfig) -> Result<usize> {
    let dir = config.resolve()?;
    run_migrations_from(conn, &dir)
}

pub fn run_migrations_from(conn: &mut Connection, dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Err(Error::invalid_field(
            "MigrationsPath",
            format!("{} is not a directory", dir.display()),
        ));
    }
    let migrations = refinery::load_sql_migrations(dir).map_err(|e| {
        Error::internal(format!("failed to load migrations from {}", dir.display()), e)
    })?;
    let report = refinery::Runner::new(&migrations)
        .run(conn)
        .map_err(|e| Error::internal("failed to apply migrations", e))?;

    let applied = report.applied_migrations();
    for migration in applied {
        tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
    }
    Ok(applied.len())
}
