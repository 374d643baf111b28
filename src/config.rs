//! Where the database lives and where its migrations come from.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::Result;
use crate::migrations::MigrationConfig;

pub const DATABASE_ENV: &str = "APPLYTRACK_DB";
pub const MIGRATIONS_ENV: &str = "APPLYTRACK_MIGRATIONS";
pub const MIGRATIONS_ABSOLUTE_ENV: &str = "APPLYTRACK_MIGRATIONS_ABSOLUTE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database_path: PathBuf,
    pub migrations: MigrationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: Database::default_path(),
            migrations: MigrationConfig::default(),
        }
    }
}

impl Config {
    /// Open the database file without touching the schema.
    pub fn open(&self) -> Result<Database> {
        Database::open(&self.database_path)
    }
}
