//! Aggregate reads: a parent entity with its related children embedded.

use rusqlite::{Row, params_from_iter};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::aggregate::{self, EntityKind, Level, Relation};
use crate::db::{self, Database, column_list};
use crate::error::{Error, Result};
use crate::models::{Application, Company, Event, Person, Related};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationIncludes {
    pub company: Level,
    pub recruiter: Level,
    pub persons: Level,
    pub events: Level,
}

impl ApplicationIncludes {
    pub fn all(level: Level) -> Self {
        Self {
            company: level,
            recruiter: level,
            persons: level,
            events: level,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompanyIncludes {
    pub persons: Level,
    pub events: Level,
}

impl CompanyIncludes {
    pub fn all(level: Level) -> Self {
        Self {
            persons: level,
            events: level,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersonIncludes {
    pub companies: Level,
    pub events: Level,
    pub applications: Level,
}

impl PersonIncludes {
    pub fn all(level: Level) -> Self {
        Self {
            companies: level,
            events: level,
            applications: level,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventIncludes {
    pub companies: Level,
    pub persons: Level,
    pub applications: Level,
}

impl EventIncludes {
    pub fn all(level: Level) -> Self {
        Self {
            companies: level,
            persons: level,
            applications: level,
        }
    }
}

/// A parent entity that can be read with its relations in one query.
trait Aggregate: Sized {
    const KIND: EntityKind;
    type Includes;

    /// Every relation of the parent, each with its requested level. Relations
    /// at level `none` still get a column.
    fn relations(includes: &Self::Includes) -> Vec<(Relation, Level)>;

    fn scalar(row: &Row) -> rusqlite::Result<Self>;

    fn attach(&mut self, relation: Relation, level: Level, raw: Option<String>) -> Result<()>;
}

impl Aggregate for Application {
    const KIND: EntityKind = EntityKind::Application;
    type Includes = ApplicationIncludes;

    fn relations(includes: &ApplicationIncludes) -> Vec<(Relation, Level)> {
        vec![
            (Relation::ApplicationCompany, includes.company),
            (Relation::ApplicationRecruiter, includes.recruiter),
            (Relation::ApplicationPersons, includes.persons),
            (Relation::ApplicationEvents, includes.events),
        ]
    }

    fn scalar(row: &Row) -> rusqlite::Result<Self> {
        db::application_at(row, 0)
    }

    fn attach(&mut self, relation: Relation, level: Level, raw: Option<String>) -> Result<()> {
        match relation {
            Relation::ApplicationCompany => self.company = decode_one(level, raw)?,
            Relation::ApplicationRecruiter => self.recruiter = decode_one(level, raw)?,
            Relation::ApplicationPersons => self.persons = decode_many(level, raw)?,
            Relation::ApplicationEvents => self.events = decode_many(level, raw)?,
            other => return Err(foreign_relation(other)),
        }
        Ok(())
    }
}

impl Aggregate for Company {
    const KIND: EntityKind = EntityKind::Company;
    type Includes = CompanyIncludes;

    fn relations(includes: &CompanyIncludes) -> Vec<(Relation, Level)> {
        vec![
            (Relation::CompanyPersons, includes.persons),
            (Relation::CompanyEvents, includes.events),
        ]
    }

    fn scalar(row: &Row) -> rusqlite::Result<Self> {
        db::company_at(row, 0)
    }

    fn attach(&mut self, relation: Relation, level: Level, raw: Option<String>) -> Result<()> {
        match relation {
            Relation::CompanyPersons => self.persons = decode_many(level, raw)?,
            Relation::CompanyEvents => self.events = decode_many(level, raw)?,
            other => return Err(foreign_relation(other)),
        }
        Ok(())
    }
}

impl Aggregate for Person {
    const KIND: EntityKind = EntityKind::Person;
    type Includes = PersonIncludes;

    fn relations(includes: &PersonIncludes) -> Vec<(Relation, Level)> {
        vec![
            (Relation::PersonCompanies, includes.companies),
            (Relation::PersonEvents, includes.events),
            (Relation::PersonApplications, includes.applications),
        ]
    }

    fn scalar(row: &Row) -> rusqlite::Result<Self> {
        db::person_at(row, 0)
    }

    fn attach(&mut self, relation: Relation, level: Level, raw: Option<String>) -> Result<()> {
        match relation {
            Relation::PersonCompanies => self.companies = decode_many(level, raw)?,
            Relation::PersonEvents => self.events = decode_many(level, raw)?,
            Relation::PersonApplications => self.applications = decode_many(level, raw)?,
            other => return Err(foreign_relation(other)),
        }
        Ok(())
    }
}

impl Aggregate for Event {
    const KIND: EntityKind = EntityKind::Event;
    type Includes = EventIncludes;

    fn relations(includes: &EventIncludes) -> Vec<(Relation, Level)> {
        vec![
            (Relation::EventCompanies, includes.companies),
            (Relation::EventPersons, includes.persons),
            (Relation::EventApplications, includes.applications),
        ]
    }

    fn scalar(row: &Row) -> rusqlite::Result<Self> {
        db::event_at(row, 0)
    }

    fn attach(&mut self, relation: Relation, level: Level, raw: Option<String>) -> Result<()> {
        match relation {
            Relation::EventCompanies => self.companies = decode_many(level, raw)?,
            Relation::EventPersons => self.persons = decode_many(level, raw)?,
            Relation::EventApplications => self.applications = decode_many(level, raw)?,
            other => return Err(foreign_relation(other)),
        }
        Ok(())
    }
}

fn foreign_relation(relation: Relation) -> Error {
    Error::invariant(format!("{relation:?} does not belong to this entity"))
}

/// Compose the SELECT for `kind` with the given relations spliced in.
pub(crate) fn select_sql(kind: EntityKind, relations: &[(Relation, Level)], by_id: bool) -> String {
    let alias = kind.alias();
    let mut projection = column_list(Some(alias), db::columns(kind));
    let mut joins = String::new();
    let mut grouped = false;

    for &(relation, level) in relations {
        let fragments = aggregate::fragments(relation, level);
        projection.push_str(&format!(", {} AS {}", fragments.projection, relation.column()));
        if !fragments.joins.is_empty() {
            joins.push(' ');
            joins.push_str(&fragments.joins);
        }
        grouped |= relation.is_many() && level != Level::None;
    }

    let mut sql = format!("SELECT {projection} FROM {} {alias}{joins}", kind.table());
    if by_id {
        sql.push_str(&format!(" WHERE {alias}.id = ?1"));
    }
    if grouped {
        sql.push_str(&format!(" GROUP BY {alias}.id"));
    }
    sql.push_str(&format!(" ORDER BY {alias}.{} DESC", kind.order_column()));
    sql
}

#[derive(Deserialize)]
struct IdOnly {
    #[serde(rename = "ID")]
    id: Uuid,
}

fn decode_one<T: DeserializeOwned>(
    level: Level,
    raw: Option<String>,
) -> Result<Option<Related<T>>> {
    let Some(raw) = raw else { return Ok(None) };
    let value: Value = serde_json::from_str(&raw)?;
    decode_item(level, value).map(Some)
}

fn decode_many<T: DeserializeOwned>(
    level: Level,
    raw: Option<String>,
) -> Result<Option<Vec<Related<T>>>> {
    let Some(raw) = raw else { return Ok(None) };
    match serde_json::from_str(&raw)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| decode_item(level, item))
            .collect::<Result<Vec<_>>>()
            .map(Some),
        other => Err(Error::invariant(format!("expected a JSON array, got {other}"))),
    }
}

/// The requested level picks the shape, so a child that fails to decode in
/// full is an error rather than an id.
fn decode_item<T: DeserializeOwned>(level: Level, item: Value) -> Result<Related<T>> {
    // Aggregating with DISTINCT can hand objects back as JSON text.
    let item = match item {
        Value::String(text) => serde_json::from_str(&text)?,
        other => other,
    };
    match level {
        Level::All => Ok(Related::Full(serde_json::from_value(item)?)),
        Level::Ids => {
            let IdOnly { id } = serde_json::from_value(item)?;
            Ok(Related::Id { id })
        }
        Level::None => Err(Error::invariant("relation at level none carried a value")),
    }
}

impl Database {
    fn fetch<T: Aggregate>(&self, id: Option<Uuid>, includes: &T::Includes) -> Result<Vec<T>> {
        let relations = T::relations(includes);
        let sql = select_sql(T::KIND, &relations, id.is_some());
        debug!(entity = T::KIND.table(), %sql, "aggregate query");

        let scalar_count = db::columns(T::KIND).len();
        let params: Vec<String> = id.iter().map(Uuid::to_string).collect();
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                let entity = T::scalar(row)?;
                let raws = (0..relations.len())
                    .map(|i| row.get::<_, Option<String>>(scalar_count + i))
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok((entity, raws))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(mut entity, raws)| {
                for (&(relation, level), raw) in relations.iter().zip(raws) {
                    entity.attach(relation, level, raw)?;
                }
                Ok(entity)
            })
            .collect()
    }

    fn fetch_one<T: Aggregate>(&self, id: Uuid, includes: &T::Includes) -> Result<T> {
        if id.is_nil() {
            return Err(Error::invalid_field("ID", "ID is empty"));
        }
        self.fetch(Some(id), includes)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("ID: {id}")))
    }

    pub fn get_application_with(
        &self,
        id: Uuid,
        includes: &ApplicationIncludes,
    ) -> Result<Application> {
        self.fetch_one(id, includes)
    }

    /// Newest application first.
    pub fn get_all_applications_with(
        &self,
        includes: &ApplicationIncludes,
    ) -> Result<Vec<Application>> {
        self.fetch(None, includes)
    }

    pub fn get_company_with(&self, id: Uuid, includes: &CompanyIncludes) -> Result<Company> {
        self.fetch_one(id, includes)
    }

    pub fn get_all_companies_with(&self, includes: &CompanyIncludes) -> Result<Vec<Company>> {
        self.fetch(None, includes)
    }

    pub fn get_person_with(&self, id: Uuid, includes: &PersonIncludes) -> Result<Person> {
        self.fetch_one(id, includes)
    }

    pub fn get_all_persons_with(&self, includes: &PersonIncludes) -> Result<Vec<Person>> {
        self.fetch(None, includes)
    }

    pub fn get_event_with(&self, id: Uuid, includes: &EventIncludes) -> Result<Event> {
        self.fetch_one(id, includes)
    }

    /// Most recent event first.
    pub fn get_all_events_with(&self, includes: &EventIncludes) -> Result<Vec<Event>> {
        self.fetch(None, includes)
    }

    /// Events linked to an application, most recent first. Level `none`
    /// yields an empty list.
    pub fn get_events_for_application(
        &self,
        id: Uuid,
        level: Level,
    ) -> Result<Vec<Related<Event>>> {
        let includes = ApplicationIncludes {
            events: level,
            ..Default::default()
        };
        Ok(self.get_application_with(id, &includes)?.events.unwrap_or_default())
    }

    pub fn get_persons_for_application(
        &self,
        id: Uuid,
        level: Level,
    ) -> Result<Vec<Related<Person>>> {
        let includes = ApplicationIncludes {
            persons: level,
            ..Default::default()
        };
        Ok(self.get_application_with(id, &includes)?.persons.unwrap_or_default())
    }

    pub fn get_persons_for_company(&self, id: Uuid, level: Level) -> Result<Vec<Related<Person>>> {
        let includes = CompanyIncludes {
            persons: level,
            ..Default::default()
        };
        Ok(self.get_company_with(id, &includes)?.persons.unwrap_or_default())
    }

    pub fn get_events_for_company(&self, id: Uuid, level: Level) -> Result<Vec<Related<Event>>> {
        let includes = CompanyIncludes {
            events: level,
            ..Default::default()
        };
        Ok(self.get_company_with(id, &includes)?.events.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::*;
    use crate::test_support::{self, assert_same_instant};
    use crate::{ids, timestamp};
    use chrono::Duration;

    fn ids_of<T: crate::models::Identified>(items: &[Related<T>]) -> Vec<Uuid> {
        items.iter().map(Related::id).collect()
    }

    #[test]
    fn select_groups_only_when_aggregating() {
        let none = Application::relations(&ApplicationIncludes::default());
        let sql = select_sql(EntityKind::Application, &none, true);
        assert!(sql.contains("null AS company"));
        assert!(sql.contains("null AS events"));
        assert!(!sql.contains("JOIN"));
        assert!(!sql.contains("GROUP BY"));
        assert!(sql.ends_with("WHERE a.id = ?1 ORDER BY a.created_date DESC"));

        let singles = Application::relations(&ApplicationIncludes {
            company: Level::All,
            ..Default::default()
        });
        assert!(!select_sql(EntityKind::Application, &singles, false).contains("GROUP BY"));

        let many = Event::relations(&EventIncludes::all(Level::Ids));
        let sql = select_sql(EntityKind::Event, &many, false);
        assert!(sql.contains("GROUP BY e.id ORDER BY e.event_date DESC"));
    }

    #[test]
    fn level_none_leaves_relations_absent() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let app = test_support::application_for(&db, company.id, "Developer");
        let fetched = db
            .get_application_with(app.id, &ApplicationIncludes::default())
            .unwrap();
        assert_eq!(fetched, app);
        assert!(fetched.company.is_none());
        assert!(fetched.persons.is_none());
    }

    #[test]
    fn included_relation_without_children_is_empty_list() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let app = test_support::application_for(&db, company.id, "Developer");
        let fetched = db
            .get_application_with(app.id, &ApplicationIncludes::all(Level::Ids))
            .unwrap();
        assert_eq!(fetched.persons, Some(vec![]));
        assert_eq!(fetched.events, Some(vec![]));
        assert!(fetched.recruiter.is_none());
        assert_eq!(fetched.company.map(|c| c.id()), Some(company.id));
    }

    #[test]
    fn two_many_relations_do_not_multiply() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let app = test_support::application_for(&db, company.id, "Developer");
        let base = timestamp::now();
        let mut persons = Vec::new();
        let mut events = Vec::new();
        for i in 0..3 {
            let person = test_support::person(&db, &format!("Person {i}"));
            db.associate(&AssociateApplicationPerson::new(app.id, person.id))
                .unwrap();
            persons.push(person);
        }
        for i in 0..2 {
            let event = test_support::event_at(&db, base + Duration::hours(i));
            db.associate(&AssociateApplicationEvent::new(app.id, event.id))
                .unwrap();
            events.push(event);
        }

        let fetched = db
            .get_application_with(app.id, &ApplicationIncludes::all(Level::All))
            .unwrap();
        assert_eq!(fetched.persons.as_ref().map(Vec::len), Some(3));
        assert_eq!(
            ids_of(fetched.events.as_deref().unwrap()),
            [events[1].id, events[0].id]
        );
        let embedded = fetched.company.and_then(Related::into_full).unwrap();
        assert_eq!(embedded.name, "Acme");
    }

    #[test]
    fn events_for_application_newest_first() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let app = test_support::application_for(&db, company.id, "Developer");
        let t = timestamp::now();
        let mut created = Vec::new();
        for offset in [1, 3, 2] {
            let event = test_support::event_at(&db, t + Duration::hours(offset));
            db.associate(&AssociateApplicationEvent::new(app.id, event.id))
                .unwrap();
            created.push(event);
        }

        let events = db.get_events_for_application(app.id, Level::All).unwrap();
        assert_eq!(
            ids_of(&events),
            [created[1].id, created[2].id, created[0].id]
        );
        let first = events[0].full().unwrap();
        assert_same_instant(first.event_date, t + Duration::hours(3));

        let only_ids = db.get_events_for_application(app.id, Level::Ids).unwrap();
        assert!(only_ids.iter().all(|e| matches!(e, Related::Id { .. })));
        assert!(db.get_events_for_application(app.id, Level::None).unwrap().is_empty());
    }

    #[test]
    fn persons_and_events_for_company() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let other = test_support::company(&db, "Globex");
        let anne = test_support::person(&db, "Anne Gale");
        let bob = test_support::person(&db, "Bob Smith");
        db.associate(&AssociateCompanyPerson::new(company.id, anne.id)).unwrap();
        db.associate(&AssociateCompanyPerson::new(other.id, bob.id)).unwrap();
        let event = test_support::event_at(&db, timestamp::now());
        db.associate(&AssociateCompanyEvent::new(company.id, event.id)).unwrap();

        let persons = db.get_persons_for_company(company.id, Level::All).unwrap();
        assert_eq!(ids_of(&persons), [anne.id]);
        assert_eq!(persons[0].full().unwrap().name, "Anne Gale");
        let events = db.get_events_for_company(other.id, Level::Ids).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn person_lists_applications_and_companies() {
        let db = test_support::database();
        let company = test_support::company(&db, "Acme");
        let app = test_support::application_for(&db, company.id, "Developer");
        let anne = test_support::person(&db, "Anne Gale");
        db.associate(&AssociateApplicationPerson::new(app.id, anne.id)).unwrap();
        db.associate(&AssociateCompanyPerson::new(company.id, anne.id)).unwrap();

        let fetched = db
            .get_person_with(anne.id, &PersonIncludes::all(Level::All))
            .unwrap();
        let applications = fetched.applications.unwrap();
        assert_eq!(ids_of(&applications), [app.id]);
        assert_eq!(
            applications[0].full().unwrap().job_title.as_deref(),
            Some("Developer")
        );
        assert_eq!(ids_of(&fetched.companies.unwrap()), [company.id]);
        assert_eq!(fetched.events, Some(vec![]));
    }

    #[test]
    fn get_all_with_keeps_parent_order() {
        let db = test_support::database();
        let base = timestamp::now();
        let early = test_support::event_at(&db, base);
        let late = test_support::event_at(&db, base + Duration::days(1));
        let anne = test_support::person(&db, "Anne Gale");
        db.associate(&AssociateEventPerson::new(early.id, anne.id)).unwrap();

        let events = db.get_all_events_with(&EventIncludes::all(Level::Ids)).unwrap();
        let order: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        assert_eq!(order, [late.id, early.id]);
        assert_eq!(events[0].persons, Some(vec![]));
        assert_eq!(ids_of(events[1].persons.as_deref().unwrap()), [anne.id]);

        let companies = db.get_all_companies_with(&CompanyIncludes::default()).unwrap();
        assert!(companies.is_empty());
    }

    #[test]
    fn missing_parent_is_not_found() {
        let db = test_support::database();
        let err = db
            .get_company_with(ids::new_id(), &CompanyIncludes::all(Level::All))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = db
            .get_event_with(Uuid::nil(), &EventIncludes::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn decode_tolerates_text_elements() {
        let id = ids::new_id();
        let raw = serde_json::to_string(&vec![format!(r#"{{"ID":"{id}"}}"#)]).unwrap();
        let decoded: Vec<Related<Person>> =
            decode_many(Level::Ids, Some(raw)).unwrap().unwrap();
        assert_eq!(ids_of(&decoded), [id]);
        assert!(decode_many::<Person>(Level::Ids, None).unwrap().is_none());
    }

    #[test]
    fn undecodable_full_child_is_internal() {
        let raw = serde_json::json!({
            "ID": ids::new_id(),
            "Name": "Acme",
            "CompanyType": "charity",
            "CreatedDate": "2024-05-01T09:30:00.000Z",
        })
        .to_string();
        let err = decode_one::<Company>(Level::All, Some(raw.clone())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        let related = decode_one::<Company>(Level::Ids, Some(raw)).unwrap().unwrap();
        assert!(matches!(related, Related::Id { .. }));
    }
}
