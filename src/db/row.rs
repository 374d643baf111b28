//! Typed column readers for values stored as text.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use crate::timestamp;

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

#[derive(Debug, thiserror::Error)]
#[error("unknown value '{0}'")]
struct UnknownVariant(String);

pub(crate) fn uuid(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn uuid_opt(row: &Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn time(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    timestamp::parse(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn time_opt(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| timestamp::parse(&s).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn enumeration<T: FromStr>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|_| conversion_error(idx, UnknownVariant(raw.clone())))
}

pub(crate) fn enumeration_opt<T: FromStr>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse::<T>()
            .map_err(|_| conversion_error(idx, UnknownVariant(s.clone())))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompanyType;
    use rusqlite::Connection;

    #[test]
    fn reads_text_columns_into_types() {
        let conn = Connection::open_in_memory().unwrap();
        let sql = "SELECT '6f1c8a7e-2b7d-4c4e-9f43-0c4f2b0e8d11', \
                   '2024-05-01T09:30:00.125Z', 'recruiter', NULL";
        let (id, ts, kind, missing): (Uuid, DateTime<Utc>, CompanyType, Option<DateTime<Utc>>) =
            conn.query_row(sql, [], |row| {
                Ok((uuid(row, 0)?, time(row, 1)?, enumeration(row, 2)?, time_opt(row, 3)?))
            })
            .unwrap();
        assert_eq!(id.to_string(), "6f1c8a7e-2b7d-4c4e-9f43-0c4f2b0e8d11");
        assert_eq!(timestamp::format(&ts), "2024-05-01T09:30:00.125Z");
        assert_eq!(kind, CompanyType::Recruiter);
        assert!(missing.is_none());
    }

    #[test]
    fn unknown_enum_value_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let result =
            conn.query_row("SELECT 'charity'", [], |row| enumeration::<CompanyType>(row, 0));
        assert!(matches!(result, Err(rusqlite::Error::FromSqlConversionFailure(0, _, _))));
    }
}
