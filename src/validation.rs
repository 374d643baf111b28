//! Request validation. Pure checks that run before any storage access.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::{ids, timestamp};

pub const NOTHING_TO_UPDATE: &str = "nothing to update";

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub(crate) fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_field(field, format!("{field} is empty")));
    }
    Ok(())
}

/// A supplied string must not be empty; an absent one is fine.
pub(crate) fn non_empty_opt(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => non_empty(field, v),
        None => Ok(()),
    }
}

pub(crate) fn non_zero_id(field: &str, id: Uuid) -> Result<()> {
    if id.is_nil() {
        return Err(Error::invalid_field(field, format!("{field} is empty")));
    }
    Ok(())
}

pub(crate) fn non_zero_id_opt(field: &str, id: Option<Uuid>) -> Result<()> {
    match id {
        Some(id) => non_zero_id(field, id),
        None => Ok(()),
    }
}

pub(crate) fn non_zero_time(field: &str, ts: &DateTime<Utc>) -> Result<()> {
    if timestamp::is_zero(ts) {
        return Err(Error::invalid_field(field, format!("{field} is zero")));
    }
    Ok(())
}

pub(crate) fn non_zero_time_opt(field: &str, ts: Option<&DateTime<Utc>>) -> Result<()> {
    match ts {
        Some(ts) => non_zero_time(field, ts),
        None => Ok(()),
    }
}

/// At least one of two ids must be present and non-nil.
pub(crate) fn one_of_ids(left: (&str, Option<Uuid>), right: (&str, Option<Uuid>)) -> Result<()> {
    if ids::is_empty(left.1) && ids::is_empty(right.1) {
        return Err(Error::validation(format!(
            "{} and {} cannot both be empty",
            left.0, right.0
        )));
    }
    Ok(())
}

pub(crate) fn something_to_update(present: &[bool]) -> Result<()> {
    if !present.iter().any(|p| *p) {
        return Err(Error::validation(NOTHING_TO_UPDATE));
    }
    Ok(())
}
