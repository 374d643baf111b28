//! Translation of SQLite constraint failures into the error taxonomy.
//!
//! Classification uses the extended result code. The message is read only
//! to recover the name of a failed CHECK constraint.

use rusqlite::{ErrorCode, ffi};

use crate::error::Error;
use crate::models::application::{COMPANY_REFERENCE_REQUIRED, JOB_TITLE_OR_URL_REQUIRED};

pub const FOREIGN_KEY_MISSING: &str = "Foreign key does not exist";
pub const FOREIGN_KEY_REFERENCED: &str = "Foreign key is still referenced";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Violation {
    Unique,
    ForeignKey,
    /// Name of the CHECK constraint, or its expression when unnamed.
    Check(String),
    NotNull(String),
}

/// The kind of write that failed; decides how a violation reads.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Write<'a> {
    Insert { conflict: &'a str },
    Update,
    Delete,
}

pub(crate) fn violation(err: &rusqlite::Error) -> Option<Violation> {
    let rusqlite::Error::SqliteFailure(failure, message) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }
    let message = message.as_deref().unwrap_or_default();
    match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
            Some(Violation::Unique)
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
        // ON DELETE RESTRICT is enforced by an internal trigger.
        ffi::SQLITE_CONSTRAINT_TRIGGER if message.starts_with("FOREIGN KEY constraint failed") => {
            Some(Violation::ForeignKey)
        }
        ffi::SQLITE_CONSTRAINT_CHECK => Some(Violation::Check(
            message
                .strip_prefix("CHECK constraint failed: ")
                .unwrap_or(message)
                .to_string(),
        )),
        ffi::SQLITE_CONSTRAINT_NOTNULL => Some(Violation::NotNull(
            message
                .strip_prefix("NOT NULL constraint failed: ")
                .unwrap_or(message)
                .to_string(),
        )),
        _ => None,
    }
}

pub(crate) fn translate(err: rusqlite::Error, write: Write<'_>) -> Error {
    let Some(violation) = violation(&err) else {
        return Error::from(err);
    };
    match (violation, write) {
        (Violation::Unique, Write::Insert { conflict }) => Error::conflict(conflict),
        (Violation::Unique, _) => Error::conflict("value already exists in database."),
        (Violation::ForeignKey, Write::Delete) => Error::validation(FOREIGN_KEY_REFERENCED),
        (Violation::ForeignKey, _) => Error::validation(FOREIGN_KEY_MISSING),
        (Violation::Check(name), _) => match name.as_str() {
            "company_reference_not_null" => Error::validation(COMPANY_REFERENCE_REQUIRED),
            "job_title_job_url_not_null" => Error::validation(JOB_TITLE_OR_URL_REQUIRED),
            _ => Error::validation(format!("check constraint failed: {name}")),
        },
        (Violation::NotNull(column), _) => {
            Error::invalid_field(column.clone(), format!("{column} cannot be null"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rusqlite::Connection;

    fn scratch() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id TEXT PRIMARY KEY NOT NULL);
             CREATE TABLE child (
                 parent_id TEXT NOT NULL REFERENCES parent (id),
                 owner_id TEXT REFERENCES parent (id) ON DELETE RESTRICT,
                 title TEXT,
                 url TEXT,
                 CONSTRAINT job_title_job_url_not_null CHECK (title IS NOT NULL OR url IS NOT NULL)
             );
             INSERT INTO parent (id) VALUES ('p1');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn duplicate_primary_key_is_conflict() {
        let conn = scratch();
        let err = conn.execute("INSERT INTO parent (id) VALUES ('p1')", []).unwrap_err();
        assert_eq!(violation(&err), Some(Violation::Unique));
        let err = translate(err, Write::Insert { conflict: "ID already exists in database." });
        assert_eq!(err.to_string(), "conflict error on insert: ID already exists in database.");
    }

    #[test]
    fn missing_parent_is_foreign_key_validation() {
        let conn = scratch();
        let err = conn
            .execute("INSERT INTO child (parent_id, title) VALUES ('nope', 't')", [])
            .unwrap_err();
        let err = translate(err, Write::Insert { conflict: "unused" });
        assert_eq!(err.to_string(), "validation error: Foreign key does not exist");
    }

    #[test]
    fn referenced_parent_on_delete() {
        let conn = scratch();
        conn.execute("INSERT INTO child (parent_id, title) VALUES ('p1', 't')", []).unwrap();
        let err = conn.execute("DELETE FROM parent WHERE id = 'p1'", []).unwrap_err();
        let err = translate(err, Write::Delete);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().ends_with(FOREIGN_KEY_REFERENCED));
    }

    #[test]
    fn restricted_parent_on_delete() {
        let conn = scratch();
        conn.execute("INSERT INTO parent (id) VALUES ('p2')", []).unwrap();
        conn.execute(
            "INSERT INTO child (parent_id, owner_id, title) VALUES ('p1', 'p2', 't')",
            [],
        )
        .unwrap();
        let err = conn.execute("DELETE FROM parent WHERE id = 'p2'", []).unwrap_err();
        assert_eq!(violation(&err), Some(Violation::ForeignKey));
        let err = translate(err, Write::Delete);
        assert_eq!(err.to_string(), format!("validation error: {FOREIGN_KEY_REFERENCED}"));
    }

    #[test]
    fn named_check_maps_to_its_message() {
        let conn = scratch();
        let err = conn.execute("INSERT INTO child (parent_id) VALUES ('p1')", []).unwrap_err();
        assert_eq!(
            violation(&err),
            Some(Violation::Check("job_title_job_url_not_null".into()))
        );
        let err = translate(err, Write::Insert { conflict: "unused" });
        assert_eq!(err.to_string(), format!("validation error: {JOB_TITLE_OR_URL_REQUIRED}"));
    }

    #[test]
    fn not_null_names_the_column() {
        let conn = scratch();
        let err = conn.execute("INSERT INTO parent (id) VALUES (NULL)", []).unwrap_err();
        let err = translate(err, Write::Update);
        assert_eq!(err.field(), Some("parent.id"));
    }

    #[test]
    fn other_failures_are_internal() {
        let conn = scratch();
        let err = conn.execute("INSERT INTO missing_table VALUES (1)", []).unwrap_err();
        assert!(violation(&err).is_none());
        assert_eq!(translate(err, Write::Update).kind(), ErrorKind::Internal);
    }
}
