//! Association rows linking two primary entities.
//!
//! All five association tables share one shape: a pair of foreign keys, a
//! creation timestamp, and a unique constraint on the pair. Each pair gets a
//! row type plus `Associate*`/`Delete*` request types; the stores work
//! against the [`Association`] trait so the SQL is written once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::timestamp;
use crate::validation::{self, Validate};

/// One end of an association: its column and the label used in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Side {
    pub column: &'static str,
    pub label: &'static str,
}

pub trait Association: Sized {
    const TABLE: &'static str;
    const LEFT: Side;
    const RIGHT: Side;

    fn from_parts(left: Uuid, right: Uuid, created_date: DateTime<Utc>) -> Self;
    fn pair(&self) -> (Uuid, Uuid);
    fn created_date(&self) -> DateTime<Utc>;
}

pub trait AssociateRequest: Validate {
    type Row: Association;

    fn pair(&self) -> (Uuid, Uuid);
    fn created_date(&self) -> Option<DateTime<Utc>>;
}

pub trait DeleteRequest: Validate {
    type Row: Association;

    fn pair(&self) -> (Uuid, Uuid);
}

fn validate_pair<A: Association>(left: Uuid, right: Uuid) -> Result<()> {
    validation::non_zero_id(A::LEFT.label, left)?;
    validation::non_zero_id(A::RIGHT.label, right)?;
    Ok(())
}

macro_rules! association {
    (
        $(#[$meta:meta])*
        $row:ident, $associate:ident, $delete:ident,
        table = $table:literal,
        $left:ident => $left_label:literal,
        $right:ident => $right_label:literal $(,)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $row {
            #[serde(rename = $left_label)]
            pub $left: Uuid,
            #[serde(rename = $right_label)]
            pub $right: Uuid,
            #[serde(rename = "CreatedDate", with = "timestamp::serde_ms")]
            pub created_date: DateTime<Utc>,
        }

        impl Association for $row {
            const TABLE: &'static str = $table;
            const LEFT: Side = Side {
                column: stringify!($left),
                label: $left_label,
            };
            const RIGHT: Side = Side {
                column: stringify!($right),
                label: $right_label,
            };

            fn from_parts(left: Uuid, right: Uuid, created_date: DateTime<Utc>) -> Self {
                Self {
                    $left: left,
                    $right: right,
                    created_date,
                }
            }

            fn pair(&self) -> (Uuid, Uuid) {
                (self.$left, self.$right)
            }

            fn created_date(&self) -> DateTime<Utc> {
                self.created_date
            }
        }

        #[derive(Debug, Clone, PartialEq)]
        pub struct $associate {
            pub $left: Uuid,
            pub $right: Uuid,
            pub created_date: Option<DateTime<Utc>>,
        }

        impl $associate {
            pub fn new($left: Uuid, $right: Uuid) -> Self {
                Self {
                    $left,
                    $right,
                    created_date: None,
                }
            }
        }

        impl Validate for $associate {
            fn validate(&self) -> Result<()> {
                validate_pair::<$row>(self.$left, self.$right)?;
                validation::non_zero_time_opt("CreatedDate", self.created_date.as_ref())
            }
        }

        impl AssociateRequest for $associate {
            type Row = $row;

            fn pair(&self) -> (Uuid, Uuid) {
                (self.$left, self.$right)
            }

            fn created_date(&self) -> Option<DateTime<Utc>> {
                self.created_date
            }
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $delete {
            pub $left: Uuid,
            pub $right: Uuid,
        }

        impl $delete {
            pub fn new($left: Uuid, $right: Uuid) -> Self {
                Self { $left, $right }
            }
        }

        impl Validate for $delete {
            fn validate(&self) -> Result<()> {
                validate_pair::<$row>(self.$left, self.$right)
            }
        }

        impl DeleteRequest for $delete {
            type Row = $row;

            fn pair(&self) -> (Uuid, Uuid) {
                (self.$left, self.$right)
            }
        }
    };
}

association! {
    /// A person who works at, or recruits for, a company.
    CompanyPerson, AssociateCompanyPerson, DeleteCompanyPerson,
    table = "company_person",
    company_id => "CompanyID",
    person_id => "PersonID",
}

association! {
    CompanyEvent, AssociateCompanyEvent, DeleteCompanyEvent,
    table = "company_event",
    company_id => "CompanyID",
    event_id => "EventID",
}

association! {
    /// A person who took part in an event.
    EventPerson, AssociateEventPerson, DeleteEventPerson,
    table = "event_person",
    event_id => "EventID",
    person_id => "PersonID",
}

association! {
    ApplicationPerson, AssociateApplicationPerson, DeleteApplicationPerson,
    table = "application_person",
    application_id => "ApplicationID",
    person_id => "PersonID",
}

association! {
    ApplicationEvent, AssociateApplicationEvent, DeleteApplicationEvent,
    table = "application_event",
    application_id => "ApplicationID",
    event_id => "EventID",
}
