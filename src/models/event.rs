use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{Application, Company, Identified, Person, Related};
use crate::error::Result;
use crate::timestamp;
use crate::validation::{self, Validate};

/// Lifecycle step in a job application.
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
pub enum EventType {
    Applied,
    CallBooked,
    CallCompleted,
    CodeTestReceived,
    CodeTestCompleted,
    InterviewBooked,
    InterviewCompleted,
    RecruiterInterviewBooked,
    RecruiterInterviewCompleted,
    Paused,
    Offer,
    Rejected,
    Signed,
    Withdrew,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    #[serde(rename = "ID")]
    pub id: Uuid,
    pub event_type: EventType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "timestamp::serde_ms")]
    pub event_date: DateTime<Utc>,
    #[serde(with = "timestamp::serde_ms")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::serde_ms_opt")]
    pub updated_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<Related<Company>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persons: Option<Vec<Related<Person>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<Related<Application>>>,
}

impl Identified for Event {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateEvent {
    pub id: Option<Uuid>,
    pub event_type: EventType,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub event_date: DateTime<Utc>,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl CreateEvent {
    pub fn new(event_type: EventType, event_date: DateTime<Utc>) -> Self {
        Self {
            id: None,
            event_type,
            description: None,
            notes: None,
            event_date,
            created_date: None,
            updated_date: None,
        }
    }
}

impl Validate for CreateEvent {
    fn validate(&self) -> Result<()> {
        validation::non_zero_id_opt("ID", self.id)?;
        validation::non_zero_time("EventDate", &self.event_date)?;
        validation::non_zero_time_opt("CreatedDate", self.created_date.as_ref())?;
        validation::non_zero_time_opt("UpdatedDate", self.updated_date.as_ref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateEvent {
    pub id: Uuid,
    pub event_type: Option<EventType>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
}

impl UpdateEvent {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

impl Validate for UpdateEvent {
    fn validate(&self) -> Result<()> {
        validation::something_to_update(&[
            self.event_type.is_some(),
            self.description.is_some(),
            self.notes.is_some(),
            self.event_date.is_some(),
        ])?;
        validation::non_zero_id("ID", self.id)?;
        validation::non_zero_time_opt("EventDate", self.event_date.as_ref())?;
        Ok(())
    }
}
