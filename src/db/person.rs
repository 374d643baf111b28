use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use super::constraint::{self, Write};
use super::{Database, UpdateBuilder, column_list, expect_one_affected, like_pattern, row};
use crate::error::{Error, Result};
use crate::models::{CreatePerson, Person, UpdatePerson};
use crate::validation::Validate;
use crate::{ids, timestamp};

pub(crate) const PERSON_COLUMNS: &[&str] = &[
    "id",
    "name",
    "person_type",
    "email",
    "phone",
    "notes",
    "created_date",
    "updated_date",
];

impl Database {
    pub fn create_person(&self, req: &CreatePerson) -> Result<Person> {
        req.validate()?;
        let id = ids::or_new(req.id);
        let created = req.created_date.unwrap_or_else(timestamp::now);

        let sql = format!(
            "INSERT INTO person (
                id, name, person_type, email, phone, notes, created_date, updated_date
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING {}",
            column_list(None, PERSON_COLUMNS)
        );
        self.conn()
            .query_row(
                &sql,
                params![
                    id.to_string(),
                    req.name,
                    req.person_type.as_ref(),
                    req.email,
                    req.phone,
                    req.notes,
                    timestamp::format(&created),
                    timestamp::format_opt(req.updated_date.as_ref()),
                ],
                row_to_person,
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

    pub fn get_person(&self, id: Uuid) -> Result<Person> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        let sql = format!(
            "SELECT {} FROM person WHERE id = ?1",
            column_list(None, PERSON_COLUMNS)
        );
        self.conn()
            .query_row(&sql, [id.to_string()], row_to_person)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("ID: {id}")))
    }

    pub fn get_all_persons_by_name(&self, name: &str) -> Result<Vec<Person>> {
        if name.is_empty() {
            return Err(Error::invalid_field("Name", "Name is empty"));
        }
        let sql = format!(
            "SELECT {} FROM person WHERE LOWER(name) LIKE ?1 ESCAPE '\\' ORDER BY name ASC",
            column_list(None, PERSON_COLUMNS)
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let persons = stmt
            .query_map([like_pattern(name)], row_to_person)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if persons.is_empty() {
            return Err(Error::not_found(format!("Name: {name}")));
        }
        Ok(persons)
    }

    pub fn get_all_persons(&self) -> Result<Vec<Person>> {
        let sql = format!(
            "SELECT {} FROM person ORDER BY created_date DESC",
            column_list(None, PERSON_COLUMNS)
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let persons = stmt
            .query_map([], row_to_person)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(persons)
    }

    pub fn update_person(&self, req: &UpdatePerson) -> Result<Person> {
        req.validate()?;

        let mut update = UpdateBuilder::new("person");
        update.set_opt("name", req.name.clone());
        update.set_opt("person_type", req.person_type.map(|t| t.to_string()));
        update.set_opt("email", req.email.clone());
        update.set_opt("phone", req.phone.clone());
        update.set_opt("notes", req.notes.clone());
        let (sql, values) = update.finish(req.id, PERSON_COLUMNS);

        self.conn()
            .query_row(&sql, params_from_iter(values), row_to_person)
            .optional()
            .map_err(|e| constraint::translate(e, Write::Update))?
            .ok_or_else(|| Error::not_found(format!("ID: {}", req.id)))
    }

    pub fn delete_person(&self, id: Uuid) -> Result<()> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        let affected = self
            .conn()
            .execute("DELETE FROM person WHERE id = ?1", [id.to_string()])
            .map_err(|e| constraint::translate(e, Write::Delete))?;
        expect_one_affected(affected, || format!("ID: {id}"))
    }
}

pub(crate) fn person_at(row: &Row, offset: usize) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row::uuid(row, offset)?,
        name: row.get(offset + 1)?,
        person_type: row::enumeration(row, offset + 2)?,
        email: row.get(offset + 3)?,
        phone: row.get(offset + 4)?,
        notes: row.get(offset + 5)?,
        created_date: row::time(row, offset + 6)?,
        updated_date: row::time_opt(row, offset + 7)?,
        companies: None,
        events: None,
        applications: None,
    })
}

fn row_to_person(row: &Row) -> rusqlite::Result<Person> {
    person_at(row, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{AssociateCompanyPerson, CompanyPerson, PersonType};
    use crate::test_support::{self, assert_close_to_now};

    #[test]
    fn create_round_trips_all_fields() {
        let db = test_support::database();
        let req = CreatePerson {
            email: Some("anne@example.com".into()),
            phone: Some("+44 7700 900123".into()),
            notes: Some("hiring manager".into()),
            ..CreatePerson::new("Anne Gale", PersonType::JobContact)
        };
        let person = db.create_person(&req).unwrap();
        assert_close_to_now(person.created_date);
        assert_eq!(db.get_person(person.id).unwrap(), person);
        assert_eq!(person.person_type, PersonType::JobContact);
        assert_eq!(person.email.as_deref(), Some("anne@example.com"));
    }

    #[test]
    fn get_all_by_name_matches_substring_any_case() {
        let db = test_support::database();
        for name in ["Steven Annerson", "Anna Davies", "Anne Gale", "Bob Smith"] {
            test_support::person(&db, name);
        }
        let names: Vec<String> = db
            .get_all_persons_by_name("ann")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["Anna Davies", "Anne Gale", "Steven Annerson"]);
    }

    #[test]
    fn get_all_by_name_without_match_is_not_found() {
        let db = test_support::database();
        test_support::person(&db, "Bob Smith");
        let err = db.get_all_persons_by_name("zed").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("zed"));
    }

    #[test]
    fn update_rejects_empty_email_before_storage() {
        let db = test_support::database();
        let person = test_support::person(&db, "Anne Gale");
        let err = db
            .update_person(&UpdatePerson {
                email: Some(String::new()),
                ..UpdatePerson::new(person.id)
            })
            .unwrap_err();
        assert_eq!(err.field(), Some("Email"));
    }

    #[test]
    fn update_changes_type_and_stamps_updated_date() {
        let db = test_support::database();
        let person = test_support::person(&db, "Anne Gale");
        let updated = db
            .update_person(&UpdatePerson {
                person_type: Some(PersonType::Cto),
                ..UpdatePerson::new(person.id)
            })
            .unwrap();
        assert_eq!(updated.person_type, PersonType::Cto);
        assert_eq!(updated.name, person.name);
        assert_close_to_now(updated.updated_date.unwrap());
    }

    #[test]
    fn delete_cascades_to_associations() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let person = test_support::person(&db, "Anne Gale");
        db.associate(&AssociateCompanyPerson::new(company.id, person.id))
            .unwrap();

        db.delete_person(person.id).unwrap();
        let rows = db
            .get_associations::<CompanyPerson>(Some(company.id), None)
            .unwrap();
        assert!(rows.is_empty());
    }
}
