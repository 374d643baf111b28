//! Persistence layer for a personal job-search tracker.
//!
//! Companies, persons, events, and applications live in SQLite, joined by
//! five many-to-many association tables. Every store is a method on
//! [`Database`]; aggregate reads that embed related children are in
//! [`fetch`].

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod ids;
pub mod migrations;
pub mod models;
pub mod timestamp;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use aggregate::Level;
pub use config::Config;
pub use db::Database;
pub use error::{Error, ErrorKind, Result};
pub use fetch::{ApplicationIncludes, CompanyIncludes, EventIncludes, PersonIncludes};
pub use migrations::MigrationConfig;
pub use validation::Validate;
