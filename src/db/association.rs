use rusqlite::types::Value;
use rusqlite::{Row, params, params_from_iter};
use uuid::Uuid;

use super::constraint::{self, Write};
use super::{Database, expect_one_affected, row};
use crate::error::Result;
use crate::models::{AssociateRequest, Association, DeleteRequest};
use crate::timestamp;
use crate::validation::{self, Validate};

impl Database {
    /// Insert an association row. A repeated pair is a Conflict; an endpoint
    /// that does not exist is a Validation error.
    pub fn associate<R: AssociateRequest>(&self, req: &R) -> Result<R::Row> {
        req.validate()?;
        let (left, right) = req.pair();
        let created = req.created_date().unwrap_or_else(timestamp::now);
        let (table, l, r) = parts::<R::Row>();

        let sql = format!(
            "INSERT INTO {table} ({l}, {r}, created_date) VALUES (?1, ?2, ?3)
             RETURNING {l}, {r}, created_date"
        );
        let conflict = format!(
            "{} and {} combination already exists in database.",
            <R::Row as Association>::LEFT.label,
            <R::Row as Association>::RIGHT.label
        );
        self.conn()
            .query_row(
                &sql,
                params![left.to_string(), right.to_string(), timestamp::format(&created)],
                row_to_association::<R::Row>,
            )
            .map_err(|e| {
                constraint::translate(
                    e,
                    Write::Insert {
                        conflict: &conflict,
                    },
                )
            })
    }

    /// Rows matching whichever side(s) are supplied, newest first. Both sides
    /// empty is a Validation error; no match is an empty list.
    pub fn get_associations<A: Association>(
        &self,
        left: Option<Uuid>,
        right: Option<Uuid>,
    ) -> Result<Vec<A>> {
        validation::one_of_ids((A::LEFT.label, left), (A::RIGHT.label, right))?;
        let (table, l, r) = parts::<A>();

        let mut filters = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        for (column, id) in [(l, left), (r, right)] {
            if let Some(id) = id.filter(|id| !id.is_nil()) {
                values.push(Value::Text(id.to_string()));
                filters.push(format!("{column} = ?{}", values.len()));
            }
        }
        let sql = format!(
            "SELECT {l}, {r}, created_date FROM {table} WHERE {} ORDER BY created_date DESC",
            filters.join(" AND ")
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), row_to_association::<A>)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_all_associations<A: Association>(&self) -> Result<Vec<A>> {
        let (table, l, r) = parts::<A>();
        let sql = format!("SELECT {l}, {r}, created_date FROM {table} ORDER BY created_date DESC");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_association::<A>)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete_association<R: DeleteRequest>(&self, req: &R) -> Result<()> {
        req.validate()?;
        let (left, right) = req.pair();
        let (table, l, r) = parts::<R::Row>();

        let affected = self
            .conn()
            .execute(
                &format!("DELETE FROM {table} WHERE {l} = ?1 AND {r} = ?2"),
                params![left.to_string(), right.to_string()],
            )
            .map_err(|e| constraint::translate(e, Write::Delete))?;
        expect_one_affected(affected, || {
            format!(
                "{}: {left}, {}: {right}",
                <R::Row as Association>::LEFT.label,
                <R::Row as Association>::RIGHT.label
            )
        })
    }
}

fn parts<A: Association>() -> (&'static str, &'static str, &'static str) {
    (A::TABLE, A::LEFT.column, A::RIGHT.column)
}

fn row_to_association<A: Association>(row: &Row) -> rusqlite::Result<A> {
    Ok(A::from_parts(
        row::uuid(row, 0)?,
        row::uuid(row, 1)?,
        row::time(row, 2)?,
    ))
}
