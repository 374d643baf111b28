//! SQL fragments for reading a parent row together with its related children.
//!
//! For each relation of a parent, [`fragments`] yields a JSON projection and
//! the LEFT JOINs it depends on, shaped by an inclusion [`Level`]. The fetch
//! layer splices them into one SELECT so a single round-trip returns the
//! parent with every requested child embedded as JSON.
//!
//! Many-cardinality children are aggregated with
//! `JSON_GROUP_ARRAY(DISTINCT ...)`: when two such relations are joined in the
//! same query the rows form a cross product, and `DISTINCT` collapses it back
//! to one entry per child. `DISTINCT` never touches the parent's own columns.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How much of a related child to embed.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    /// Column is present but always `null`; no joins.
    #[default]
    None,
    /// Children carry only their `ID`.
    Ids,
    /// Children carry every persisted column.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum EntityKind {
    Company,
    Person,
    Event,
    Application,
}

/// A JSON key and the column it is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonColumn {
    pub key: &'static str,
    pub column: &'static str,
}

const fn col(key: &'static str, column: &'static str) -> JsonColumn {
    JsonColumn { key, column }
}

const COMPANY_JSON: &[JsonColumn] = &[
    col("ID", "id"),
    col("Name", "name"),
    col("CompanyType", "company_type"),
    col("Notes", "notes"),
    col("LastContact", "last_contact"),
    col("CreatedDate", "created_date"),
    col("UpdatedDate", "updated_date"),
];

const PERSON_JSON: &[JsonColumn] = &[
    col("ID", "id"),
    col("Name", "name"),
    col("PersonType", "person_type"),
    col("Email", "email"),
    col("Phone", "phone"),
    col("Notes", "notes"),
    col("CreatedDate", "created_date"),
    col("UpdatedDate", "updated_date"),
];

const EVENT_JSON: &[JsonColumn] = &[
    col("ID", "id"),
    col("EventType", "event_type"),
    col("Description", "description"),
    col("Notes", "notes"),
    col("EventDate", "event_date"),
    col("CreatedDate", "created_date"),
    col("UpdatedDate", "updated_date"),
];

const APPLICATION_JSON: &[JsonColumn] = &[
    col("ID", "id"),
    col("CompanyID", "company_id"),
    col("RecruiterID", "recruiter_id"),
    col("JobTitle", "job_title"),
    col("JobAdURL", "job_ad_url"),
    col("Country", "country"),
    col("Area", "area"),
    col("RemoteStatusType", "remote_status_type"),
    col("WeekdaysInOffice", "weekdays_in_office"),
    col("EstimatedCycleTime", "estimated_cycle_time"),
    col("EstimatedCommuteTime", "estimated_commute_time"),
    col("ApplicationDate", "application_date"),
    col("CreatedDate", "created_date"),
    col("UpdatedDate", "updated_date"),
];

const ID_ONLY: &[JsonColumn] = &[col("ID", "id")];

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Company => "company",
            EntityKind::Person => "person",
            EntityKind::Event => "event",
            EntityKind::Application => "application",
        }
    }

    /// Alias used when this entity is the parent of a query.
    pub fn alias(self) -> &'static str {
        match self {
            EntityKind::Company => "c",
            EntityKind::Person => "p",
            EntityKind::Event => "e",
            EntityKind::Application => "a",
        }
    }

    /// Canonical ordering column, always sorted descending.
    pub fn order_column(self) -> &'static str {
        match self {
            EntityKind::Event => "event_date",
            _ => "created_date",
        }
    }

    /// Every persisted column, in projection order.
    pub fn json_columns(self) -> &'static [JsonColumn] {
        match self {
            EntityKind::Company => COMPANY_JSON,
            EntityKind::Person => PERSON_JSON,
            EntityKind::Event => EVENT_JSON,
            EntityKind::Application => APPLICATION_JSON,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Direct foreign key on the parent row.
    One { foreign_key: &'static str },
    /// Through an association table.
    Many {
        link_table: &'static str,
        link_alias: &'static str,
        parent_key: &'static str,
        child_key: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Relation {
    ApplicationCompany,
    ApplicationRecruiter,
    ApplicationPersons,
    ApplicationEvents,
    CompanyPersons,
    CompanyEvents,
    PersonCompanies,
    PersonEvents,
    PersonApplications,
    EventCompanies,
    EventPersons,
    EventApplications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationSpec {
    pub parent: EntityKind,
    pub child: EntityKind,
    pub child_alias: &'static str,
    /// Name of the projected column, e.g. `persons`.
    pub column: &'static str,
    pub cardinality: Cardinality,
}

const fn many(
    link_table: &'static str,
    link_alias: &'static str,
    parent_key: &'static str,
    child_key: &'static str,
) -> Cardinality {
    Cardinality::Many {
        link_table,
        link_alias,
        parent_key,
        child_key,
    }
}

impl Relation {
    pub fn spec(self) -> RelationSpec {
        use EntityKind::*;

        let (parent, child, child_alias, column, cardinality) = match self {
            Relation::ApplicationCompany => (
                Application,
                Company,
                "c",
                "company",
                Cardinality::One {
                    foreign_key: "company_id",
                },
            ),
            Relation::ApplicationRecruiter => (
                Application,
                Company,
                "r",
                "recruiter",
                Cardinality::One {
                    foreign_key: "recruiter_id",
                },
            ),
            Relation::ApplicationPersons => (
                Application,
                Person,
                "p",
                "persons",
                many("application_person", "ap", "application_id", "person_id"),
            ),
            Relation::ApplicationEvents => (
                Application,
                Event,
                "e",
                "events",
                many("application_event", "ae", "application_id", "event_id"),
            ),
            Relation::CompanyPersons => (
                Company,
                Person,
                "p",
                "persons",
                many("company_person", "cp", "company_id", "person_id"),
            ),
            Relation::CompanyEvents => (
                Company,
                Event,
                "e",
                "events",
                many("company_event", "ce", "company_id", "event_id"),
            ),
            Relation::PersonCompanies => (
                Person,
                Company,
                "c",
                "companies",
                many("company_person", "cp", "person_id", "company_id"),
            ),
            Relation::PersonEvents => (
                Person,
                Event,
                "e",
                "events",
                many("event_person", "ep", "person_id", "event_id"),
            ),
            Relation::PersonApplications => (
                Person,
                Application,
                "a",
                "applications",
                many("application_person", "ap", "person_id", "application_id"),
            ),
            Relation::EventCompanies => (
                Event,
                Company,
                "c",
                "companies",
                many("company_event", "ce", "event_id", "company_id"),
            ),
            Relation::EventPersons => (
                Event,
                Person,
                "p",
                "persons",
                many("event_person", "ep", "event_id", "person_id"),
            ),
            Relation::EventApplications => (
                Event,
                Application,
                "a",
                "applications",
                many("application_event", "ae", "event_id", "application_id"),
            ),
        };
        RelationSpec {
            parent,
            child,
            child_alias,
            column,
            cardinality,
        }
    }

    pub fn is_many(self) -> bool {
        matches!(self.spec().cardinality, Cardinality::Many { .. })
    }

    pub fn column(self) -> &'static str {
        self.spec().column
    }
}

/// Projection and joins for one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragments {
    /// Expression selected as the relation's column.
    pub projection: String,
    /// LEFT JOIN clauses the projection reads from; empty at level `none`.
    pub joins: String,
}

/// Fragments for `relation` at `level`. Pure: no I/O, no state.
pub fn fragments(relation: Relation, level: Level) -> Fragments {
    let columns = match level {
        Level::None => {
            return Fragments {
                projection: "null".to_string(),
                joins: String::new(),
            };
        }
        Level::Ids => ID_ONLY,
        Level::All => relation.spec().child.json_columns(),
    };

    let spec = relation.spec();
    let parent = spec.parent.alias();
    let child = spec.child_alias;
    let object = json_object(child, columns);

    match spec.cardinality {
        Cardinality::One { foreign_key } => Fragments {
            projection: format!("CASE WHEN {child}.id IS NOT NULL THEN {object} ELSE NULL END"),
            joins: format!(
                "LEFT JOIN {} {child} ON {child}.id = {parent}.{foreign_key}",
                spec.child.table()
            ),
        },
        Cardinality::Many {
            link_table,
            link_alias,
            parent_key,
            child_key,
        } => Fragments {
            projection: format!(
                "COALESCE(JSON_GROUP_ARRAY(DISTINCT {object} ORDER BY {child}.{order} DESC) \
                 FILTER (WHERE {child}.id IS NOT NULL), JSON_ARRAY())",
                order = spec.child.order_column()
            ),
            joins: format!(
                "LEFT JOIN {link_table} {link_alias} ON {link_alias}.{parent_key} = {parent}.id \
                 LEFT JOIN {} {child} ON {child}.id = {link_alias}.{child_key}",
                spec.child.table()
            ),
        },
    }
}

fn json_object(alias: &str, columns: &[JsonColumn]) -> String {
    let pairs = columns
        .iter()
        .map(|c| format!("'{}', {alias}.{}", c.key, c.column))
        .collect::<Vec<_>>()
        .join(", ");
    format!("JSON_OBJECT({pairs})")
}
