//! Fixtures shared by the unit tests.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::migrations::MigrationConfig;
use crate::models::{
    Application, Company, CompanyType, CreateApplication, CreateCompany, CreateEvent, CreatePerson,
    Event, EventType, Person, PersonType, RemoteStatusType,
};
use crate::timestamp;

pub(crate) fn migrations() -> MigrationConfig {
    MigrationConfig::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"), true)
}

/// Fresh in-memory database with the schema applied.
pub(crate) fn database() -> Database {
    let mut db = Database::open_in_memory().unwrap();
    db.migrate(&migrations()).unwrap();
    db
}

pub(crate) fn company(db: &Database, name: &str) -> Company {
    db.create_company(&CreateCompany::new(name, CompanyType::Employer))
        .unwrap()
}

pub(crate) fn person(db: &Database, name: &str) -> Person {
    db.create_person(&CreatePerson::new(name, PersonType::Unknown))
        .unwrap()
}

pub(crate) fn event_at(db: &Database, when: DateTime<Utc>) -> Event {
    db.create_event(&CreateEvent {
        description: Some("event".into()),
        ..CreateEvent::new(EventType::Applied, when)
    })
    .unwrap()
}

pub(crate) fn application_for(db: &Database, company_id: Uuid, job_title: &str) -> Application {
    db.create_application(&CreateApplication {
        company_id: Some(company_id),
        job_title: Some(job_title.into()),
        remote_status_type: Some(RemoteStatusType::Remote),
        ..Default::default()
    })
    .unwrap()
}

#[track_caller]
pub(crate) fn assert_close_to_now(instant: DateTime<Utc>) {
    let drift = (timestamp::now() - instant).abs();
    assert!(drift < Duration::seconds(5), "{instant} is not close to now");
}

/// Equal once both sides are truncated to stored precision.
#[track_caller]
pub(crate) fn assert_same_instant(a: DateTime<Utc>, b: DateTime<Utc>) {
    assert_eq!(timestamp::truncate(a), timestamp::truncate(b));
}
