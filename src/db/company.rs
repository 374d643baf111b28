use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use super::constraint::{self, Write};
use super::{Database, UpdateBuilder, column_list, expect_one_affected, like_pattern, row};
use crate::error::{Error, Result};
use crate::models::{Company, CreateCompany, UpdateCompany};
use crate::validation::Validate;
use crate::{ids, timestamp};

pub(crate) const COMPANY_COLUMNS: &[&str] = &[
    "id",
    "name",
    "company_type",
    "notes",
    "last_contact",
    "created_date",
    "updated_date",
];

impl Database {
    pub fn create_company(&self, req: &CreateCompany) -> Result<Company> {
        req.validate()?;
        let id = ids::or_new(req.id);
        let created = req.created_date.unwrap_or_else(timestamp::now);

        let sql = format!(
            "INSERT INTO company (
                id, name, company_type, notes, last_contact, created_date, updated_date
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {}",
            column_list(None, COMPANY_COLUMNS)
        );
        self.conn()
            .query_row(
                &sql,
                params![
                    id.to_string(),
                    req.name,
                    req.company_type.as_ref(),
                    req.notes,
                    timestamp::format_opt(req.last_contact.as_ref()),
                    timestamp::format(&created),
                    timestamp::format_opt(req.updated_date.as_ref()),
                ],
                row_to_company,
            )
            .map_err(|e| {
                constraint::translate(
                    e,
                    Write::Insert {
                        conflict: "ID already exists in database.",
                    },
                )
            })
    }

    pub fn get_company(&self, id: Uuid) -> Result<Company> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        let sql = format!(
            "SELECT {} FROM company WHERE id = ?1",
            column_list(None, COMPANY_COLUMNS)
        );
        self.conn()
            .query_row(&sql, [id.to_string()], row_to_company)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("ID: {id}")))
    }

    /// Case-insensitive substring match on name, ordered by name.
    pub fn get_all_companies_by_name(&self, name: &str) -> Result<Vec<Company>> {
        if name.is_empty() {
            return Err(Error::invalid_field("Name", "Name is empty"));
        }
        let sql = format!(
            "SELECT {} FROM company WHERE LOWER(name) LIKE ?1 ESCAPE '\\' ORDER BY name ASC",
            column_list(None, COMPANY_COLUMNS)
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let companies = stmt
            .query_map([like_pattern(name)], row_to_company)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if companies.is_empty() {
            return Err(Error::not_found(format!("Name: {name}")));
        }
        Ok(companies)
    }

    pub fn get_all_companies(&self) -> Result<Vec<Company>> {
        let sql = format!(
            "SELECT {} FROM company ORDER BY created_date DESC",
            column_list(None, COMPANY_COLUMNS)
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let companies = stmt
            .query_map([], row_to_company)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(companies)
    }

    pub fn update_company(&self, req: &UpdateCompany) -> Result<Company> {
        req.validate()?;

        let mut update = UpdateBuilder::new("company");
        update.set_opt("name", req.name.clone());
        update.set_opt("company_type", req.company_type.map(|t| t.to_string()));
        update.set_opt("notes", req.notes.clone());
        update.set_opt("last_contact", timestamp::format_opt(req.last_contact.as_ref()));
        let (sql, values) = update.finish(req.id, COMPANY_COLUMNS);

        self.conn()
            .query_row(&sql, params_from_iter(values), row_to_company)
            .optional()
            .map_err(|e| constraint::translate(e, Write::Update))?
            .ok_or_else(|| Error::not_found(format!("ID: {}", req.id)))
    }

    pub fn delete_company(&self, id: Uuid) -> Result<()> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        let affected = self
            .conn()
            .execute("DELETE FROM company WHERE id = ?1", [id.to_string()])
            .map_err(|e| constraint::translate(e, Write::Delete))?;
        expect_one_affected(affected, || format!("ID: {id}"))
    }
}

/// Decode columns in `COMPANY_COLUMNS` order, starting at `offset`.
pub(crate) fn company_at(row: &Row, offset: usize) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row::uuid(row, offset)?,
        name: row.get(offset + 1)?,
        company_type: row::enumeration(row, offset + 2)?,
        notes: row.get(offset + 3)?,
        last_contact: row::time_opt(row, offset + 4)?,
        created_date: row::time(row, offset + 5)?,
        updated_date: row::time_opt(row, offset + 6)?,
        persons: None,
        events: None,
    })
}

fn row_to_company(row: &Row) -> rusqlite::Result<Company> {
    company_at(row, 0)
}
