use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use super::constraint::{self, Write};
use super::{Database, UpdateBuilder, column_list, expect_one_affected, row};
use crate::error::{Error, Result};
use crate::models::{CreateEvent, Event, UpdateEvent};
use crate::validation::Validate;
use crate::{ids, timestamp};

pub(crate) const EVENT_COLUMNS: &[&str] = &[
    "id",
    "event_type",
    "description",
    "notes",
    "event_date",
    "created_date",
    "updated_date",
];

impl Database {
    pub fn create_event(&self, req: &CreateEvent) -> Result<Event> {
        req.validate()?;
        let id = ids::or_new(req.id);
        let created = req.created_date.unwrap_or_else(timestamp::now);

        let sql = format!(
            "INSERT INTO event (
                id, event_type, description, notes, event_date, created_date, updated_date
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING {}",
            column_list(None, EVENT_COLUMNS)
        );
        self.conn()
            .query_row(
                &sql,
                params![
                    id.to_string(),
                    req.event_type.as_ref(),
                    req.description,
                    req.notes,
                    timestamp::format(&req.event_date),
                    timestamp::format(&created),
                    timestamp::format_opt(req.updated_date.as_ref()),
                ],
                row_to_event,
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

    pub fn get_event(&self, id: Uuid) -> Result<Event> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        let sql = format!(
            "SELECT {} FROM event WHERE id = ?1",
            column_list(None, EVENT_COLUMNS)
        );
        self.conn()
            .query_row(&sql, [id.to_string()], row_to_event)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("ID: {id}")))
    }

    /// Most recent event first.
    pub fn get_all_events(&self) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM event ORDER BY event_date DESC",
            column_list(None, EVENT_COLUMNS)
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let events = stmt
            .query_map([], row_to_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(events)
    }

    pub fn update_event(&self, req: &UpdateEvent) -> Result<Event> {
        req.validate()?;

        let mut update = UpdateBuilder::new("event");
        update.set_opt("event_type", req.event_type.map(|t| t.to_string()));
        update.set_opt("description", req.description.clone());
        update.set_opt("notes", req.notes.clone());
        update.set_opt("event_date", timestamp::format_opt(req.event_date.as_ref()));
        let (sql, values) = update.finish(req.id, EVENT_COLUMNS);

        self.conn()
            .query_row(&sql, params_from_iter(values), row_to_event)
            .optional()
            .map_err(|e| constraint::translate(e, Write::Update))?
            .ok_or_else(|| Error::not_found(format!("ID: {}", req.id)))
    }

    pub fn delete_event(&self, id: Uuid) -> Result<()> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        let affected = self
            .conn()
            .execute("DELETE FROM event WHERE id = ?1", [id.to_string()])
            .map_err(|e| constraint::translate(e, Write::Delete))?;
        expect_one_affected(affected, || format!("ID: {id}"))
    }
}

pub(crate) fn event_at(row: &Row, offset: usize) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row::uuid(row, offset)?,
        event_type: row::enumeration(row, offset + 1)?,
        description: row.get(offset + 2)?,
        notes: row.get(offset + 3)?,
        event_date: row::time(row, offset + 4)?,
        created_date: row::time(row, offset + 5)?,
        updated_date: row::time_opt(row, offset + 6)?,
        companies: None,
        persons: None,
        applications: None,
    })
}

fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
    event_at(row, 0)
}
