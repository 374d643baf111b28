use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{Application, Company, Event, Identified, Related};
use crate::error::Result;
use crate::timestamp;
use crate::validation::{self, Validate};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PersonType {
    #[serde(rename = "CEO")]
    #[strum(serialize = "CEO")]
    Ceo,
    #[serde(rename = "CTO")]
    #[strum(serialize = "CTO")]
    Cto,
    Developer,
    ExternalRecruiter,
    InternalRecruiter,
    #[serde(rename = "HR")]
    #[strum(serialize = "HR")]
    Hr,
    JobAdvertiser,
    JobContact,
    Other,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Person {
    #[serde(rename = "ID")]
    pub id: Uuid,
    pub name: String,
    pub person_type: PersonType,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "timestamp::serde_ms")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::serde_ms_opt")]
    pub updated_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<Related<Company>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Related<Event>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<Related<Application>>>,
}

impl Identified for Person {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePerson {
    pub id: Option<Uuid>,
    pub name: String,
    pub person_type: PersonType,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl CreatePerson {
    pub fn new(name: impl Into<String>, person_type: PersonType) -> Self {
        Self {
            id: None,
            name: name.into(),
            person_type,
            email: None,
            phone: None,
            notes: None,
            created_date: None,
            updated_date: None,
        }
    }
}

impl Validate for CreatePerson {
    fn validate(&self) -> Result<()> {
        validation::non_zero_id_opt("ID", self.id)?;
        validation::non_empty("Name", &self.name)?;
        validation::non_empty_opt("Email", self.email.as_deref())?;
        validation::non_empty_opt("Phone", self.phone.as_deref())?;
        validation::non_empty_opt("Notes", self.notes.as_deref())?;
        validation::non_zero_time_opt("CreatedDate", self.created_date.as_ref())?;
        validation::non_zero_time_opt("UpdatedDate", self.updated_date.as_ref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePerson {
    pub id: Uuid,
    pub name: Option<String>,
    pub person_type: Option<PersonType>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl UpdatePerson {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

impl Validate for UpdatePerson {
    fn validate(&self) -> Result<()> {
        validation::something_to_update(&[
            self.name.is_some(),
            self.person_type.is_some(),
            self.email.is_some(),
            self.phone.is_some(),
            self.notes.is_some(),
        ])?;
        validation::non_zero_id("ID", self.id)?;
        validation::non_empty_opt("Name", self.name.as_deref())?;
        validation::non_empty_opt("Email", self.email.as_deref())?;
        validation::non_empty_opt("Phone", self.phone.as_deref())?;
        validation::non_empty_opt("Notes", self.notes.as_deref())?;
        Ok(())
    }
}
