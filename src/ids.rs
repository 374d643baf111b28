//! Identifier helpers. Ids are v4 UUIDs, stored in their hyphenated form.

use uuid::Uuid;

pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// Caller-supplied id, or a fresh one when absent.
pub fn or_new(id: Option<Uuid>) -> Uuid {
    id.unwrap_or_else(new_id)
}

/// `None` and the nil UUID both count as "not supplied".
pub fn is_empty(id: Option<Uuid>) -> bool {
    id.is_none_or(|id| id.is_nil())
}

/// Column value for an optional reference. Nil is stored as NULL.
pub fn column(id: Option<Uuid>) -> Option<String> {
    id.filter(|id| !id.is_nil()).map(|id| id.to_string())
}
