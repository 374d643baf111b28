use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use super::constraint::{self, Write};
use super::{Database, UpdateBuilder, column_list, expect_one_affected, like_pattern, row};
use crate::error::{Error, Result};
use crate::models::{Application, CreateApplication, UpdateApplication};
use crate::validation::Validate;
use crate::{ids, timestamp};

pub(crate) const APPLICATION_COLUMNS: &[&str] = &[
    "id",
    "company_id",
    "recruiter_id",
    "job_title",
    "job_ad_url",
    "country",
    "area",
    "remote_status_type",
    "weekdays_in_office",
    "estimated_cycle_time",
    "estimated_commute_time",
    "application_date",
    "created_date",
    "updated_date",
];

impl Database {
    pub fn create_application(&self, req: &CreateApplication) -> Result<Application> {
        req.validate()?;
        let id = ids::or_new(req.id);
        let created = req.created_date.unwrap_or_else(timestamp::now);

        let sql = format!(
            "INSERT INTO application (
                id, company_id, recruiter_id, job_title, job_ad_url, country, area,
                remote_status_type, weekdays_in_office, estimated_cycle_time,
                estimated_commute_time, application_date, created_date, updated_date
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             RETURNING {}",
            column_list(None, APPLICATION_COLUMNS)
        );
        self.conn()
            .query_row(
                &sql,
                params![
                    id.to_string(),
                    ids::column(req.company_id),
                    ids::column(req.recruiter_id),
                    req.job_title,
                    req.job_ad_url,
                    req.country,
                    req.area,
                    req.remote_status_type.map(|t| t.to_string()),
                    req.weekdays_in_office,
                    req.estimated_cycle_time,
                    req.estimated_commute_time,
                    timestamp::format_opt(req.application_date.as_ref()),
                    timestamp::format(&created),
                    timestamp::format_opt(req.updated_date.as_ref()),
                ],
                row_to_application,
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

    pub fn get_application(&self, id: Uuid) -> Result<Application> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        let sql = format!(
            "SELECT {} FROM application WHERE id = ?1",
            column_list(None, APPLICATION_COLUMNS)
        );
        self.conn()
            .query_row(&sql, [id.to_string()], row_to_application)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("ID: {id}")))
    }

    /// Case-insensitive substring match on job title, ordered by title.
    pub fn get_all_applications_by_job_title(&self, job_title: &str) -> Result<Vec<Application>> {
        if job_title.is_empty() {
            return Err(Error::invalid_field("JobTitle", "JobTitle is empty"));
        }
        let sql = format!(
            "SELECT {} FROM application
             WHERE LOWER(job_title) LIKE ?1 ESCAPE '\\'
             ORDER BY job_title ASC",
            column_list(None, APPLICATION_COLUMNS)
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let applications = stmt
            .query_map([like_pattern(job_title)], row_to_application)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        if applications.is_empty() {
            return Err(Error::not_found(format!("JobTitle: {job_title}")));
        }
        Ok(applications)
    }

    pub fn get_all_applications(&self) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {} FROM application ORDER BY created_date DESC",
            column_list(None, APPLICATION_COLUMNS)
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let applications = stmt
            .query_map([], row_to_application)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(applications)
    }

    pub fn update_application(&self, req: &UpdateApplication) -> Result<Application> {
        req.validate()?;

        let mut update = UpdateBuilder::new("application");
        update.set_opt("company_id", ids::column(req.company_id));
        update.set_opt("recruiter_id", ids::column(req.recruiter_id));
        update.set_opt("job_title", req.job_title.clone());
        update.set_opt("job_ad_url", req.job_ad_url.clone());
        update.set_opt("country", req.country.clone());
        update.set_opt("area", req.area.clone());
        update.set_opt("remote_status_type", req.remote_status_type.map(|t| t.to_string()));
        update.set_opt("weekdays_in_office", req.weekdays_in_office);
        update.set_opt("estimated_cycle_time", req.estimated_cycle_time);
        update.set_opt("estimated_commute_time", req.estimated_commute_time);
        update.set_opt(
            "application_date",
            timestamp::format_opt(req.application_date.as_ref()),
        );
        let (sql, values) = update.finish(req.id, APPLICATION_COLUMNS);

        self.conn()
            .query_row(&sql, params_from_iter(values), row_to_application)
            .optional()
            .map_err(|e| constraint::translate(e, Write::Update))?
            .ok_or_else(|| Error::not_found(format!("ID: {}", req.id)))
    }

    pub fn delete_application(&self, id: Uuid) -> Result<()> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        let affected = self
            .conn()
            .execute("DELETE FROM application WHERE id = ?1", [id.to_string()])
            .map_err(|e| constraint::translate(e, Write::Delete))?;
        expect_one_affected(affected, || format!("ID: {id}"))
    }
}

pub(crate) fn application_at(row: &Row, offset: usize) -> rusqlite::Result<Application> {
    Ok(Application {
        id: row::uuid(row, offset)?,
        company_id: row::uuid_opt(row, offset + 1)?,
        recruiter_id: row::uuid_opt(row, offset + 2)?,
        job_title: row.get(offset + 3)?,
        job_ad_url: row.get(offset + 4)?,
        country: row.get(offset + 5)?,
        area: row.get(offset + 6)?,
        remote_status_type: row::enumeration_opt(row, offset + 7)?,
        weekdays_in_office: row.get(offset + 8)?,
        estimated_cycle_time: row.get(offset + 9)?,
        estimated_commute_time: row.get(offset + 10)?,
        application_date: row::time_opt(row, offset + 11)?,
        created_date: row::time(row, offset + 12)?,
        updated_date: row::time_opt(row, offset + 13)?,
        company: None,
        recruiter: None,
        persons: None,
        events: None,
    })
}

fn row_to_application(row: &Row) -> rusqlite::Result<Application> {
    application_at(row, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::RemoteStatusType;
    use crate::models::application::{COMPANY_REFERENCE_REQUIRED, JOB_TITLE_OR_URL_REQUIRED};
    use crate::test_support::{self, assert_close_to_now, assert_same_instant};
    use chrono::Duration;

    #[test]
    fn create_with_every_field_round_trips() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let recruiter = test_support::company(&db, "Hays");
        let applied = timestamp::now() - Duration::days(1);
        let app = db
            .create_application(&CreateApplication {
                company_id: Some(company.id),
                recruiter_id: Some(recruiter.id),
                job_title: Some("Backend Engineer".into()),
                job_ad_url: Some("https://jobs.example.com/backend".into()),
                country: Some("UK".into()),
                area: Some("London".into()),
                remote_status_type: Some(RemoteStatusType::Hybrid),
                weekdays_in_office: Some(2),
                estimated_cycle_time: Some(30),
                estimated_commute_time: Some(45),
                application_date: Some(applied),
                ..Default::default()
            })
            .unwrap();
        assert_close_to_now(app.created_date);
        assert_same_instant(app.application_date.unwrap(), applied);
        assert_eq!(db.get_application(app.id).unwrap(), app);
        assert_eq!(app.remote_status_type, Some(RemoteStatusType::Hybrid));
        assert_eq!(app.weekdays_in_office, Some(2));
    }

    #[test]
    fn nil_company_beside_real_recruiter_is_stored_as_null() {
        let db = test_support::database();
        let recruiter = test_support::company(&db, "Hays");
        let app = db
            .create_application(&CreateApplication {
                company_id: Some(Uuid::nil()),
                recruiter_id: Some(recruiter.id),
                job_title: Some("Developer".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(app.company_id, None);
        assert_eq!(app.recruiter_id, Some(recruiter.id));
        assert_eq!(db.get_application(app.id).unwrap().company_id, None);
    }

    #[test]
    fn unknown_recruiter_is_foreign_key_validation() {
        let db = test_support::database();
        let err = db
            .create_application(&CreateApplication {
                recruiter_id: Some(ids::new_id()),
                job_title: Some("Developer".into()),
                remote_status_type: Some(RemoteStatusType::Remote),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "validation error: Foreign key does not exist");
        assert!(db.get_all_applications().unwrap().is_empty());
    }

    #[test]
    fn schema_checks_back_up_validation() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let conn = db.conn();

        let err = conn
            .execute(
                "INSERT INTO application (id, job_title, created_date) VALUES (?1, 'Dev', ?2)",
                params![ids::new_id().to_string(), timestamp::format(&timestamp::now())],
            )
            .unwrap_err();
        let err = constraint::translate(err, Write::Insert { conflict: "" });
        assert_eq!(err.to_string(), format!("validation error: {COMPANY_REFERENCE_REQUIRED}"));

        let err = conn
            .execute(
                "INSERT INTO application (id, company_id, created_date) VALUES (?1, ?2, ?3)",
                params![
                    ids::new_id().to_string(),
                    company.id.to_string(),
                    timestamp::format(&timestamp::now())
                ],
            )
            .unwrap_err();
        let err = constraint::translate(err, Write::Insert { conflict: "" });
        assert_eq!(err.to_string(), format!("validation error: {JOB_TITLE_OR_URL_REQUIRED}"));
    }

    #[test]
    fn get_all_by_job_title() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        for title in ["Senior Developer", "Developer Advocate", "Product Manager"] {
            test_support::application_for(&db, company.id, title);
        }
        let titles: Vec<String> = db
            .get_all_applications_by_job_title("DEVELOPER")
            .unwrap()
            .into_iter()
            .filter_map(|a| a.job_title)
            .collect();
        assert_eq!(titles, ["Developer Advocate", "Senior Developer"]);

        let err = db.get_all_applications_by_job_title("chef").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn update_moves_application_to_recruiter() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let recruiter = test_support::company(&db, "Hays");
        let app = test_support::application_for(&db, company.id, "Developer");

        let updated = db
            .update_application(&UpdateApplication {
                recruiter_id: Some(recruiter.id),
                weekdays_in_office: Some(3),
                ..UpdateApplication::new(app.id)
            })
            .unwrap();
        assert_eq!(updated.company_id, Some(company.id));
        assert_eq!(updated.recruiter_id, Some(recruiter.id));
        assert_eq!(updated.weekdays_in_office, Some(3));
        assert_eq!(updated.job_title, app.job_title);
        assert_close_to_now(updated.updated_date.unwrap());
    }

    #[test]
    fn update_to_unknown_company_is_foreign_key_validation() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let app = test_support::application_for(&db, company.id, "Developer");
        let err = db
            .update_application(&UpdateApplication {
                company_id: Some(ids::new_id()),
                ..UpdateApplication::new(app.id)
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "validation error: Foreign key does not exist");
    }

    #[test]
    fn delete_removes_row() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let app = test_support::application_for(&db, company.id, "Developer");
        db.delete_application(app.id).unwrap();
        assert_eq!(db.get_application(app.id).unwrap_err().kind(), ErrorKind::NotFound);
    }
}
