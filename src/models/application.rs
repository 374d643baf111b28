use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{Company, Event, Identified, Person, Related};
use crate::error::Result;
use crate::timestamp;
use crate::validation::{self, Validate};

pub const COMPANY_REFERENCE_REQUIRED: &str = "CompanyID and RecruiterID cannot both be empty";
pub const JOB_TITLE_OR_URL_REQUIRED: &str = "JobTitle and JobAdURL cannot both be empty";

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
pub enum RemoteStatusType {
    Hybrid,
    Office,
    Remote,
    Unknown,
}

/// A job application, addressed to a company, a recruiter, or both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Application {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "CompanyID", default)]
    pub company_id: Option<Uuid>,
    #[serde(rename = "RecruiterID", default)]
    pub recruiter_id: Option<Uuid>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(rename = "JobAdURL", default)]
    pub job_ad_url: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub remote_status_type: Option<RemoteStatusType>,
    #[serde(default)]
    pub weekdays_in_office: Option<i64>,
    /// Days from application to decision.
    #[serde(default)]
    pub estimated_cycle_time: Option<i64>,
    /// Minutes, one way.
    #[serde(default)]
    pub estimated_commute_time: Option<i64>,
    #[serde(default, with = "timestamp::serde_ms_opt")]
    pub application_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp::serde_ms")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::serde_ms_opt")]
    pub updated_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Related<Company>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recruiter: Option<Related<Company>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persons: Option<Vec<Related<Person>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Related<Event>>>,
}

impl Identified for Application {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateApplication {
    pub id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub recruiter_id: Option<Uuid>,
    pub job_title: Option<String>,
    pub job_ad_url: Option<String>,
    pub country: Option<String>,
    pub area: Option<String>,
    pub remote_status_type: Option<RemoteStatusType>,
    pub weekdays_in_office: Option<i64>,
    pub estimated_cycle_time: Option<i64>,
    pub estimated_commute_time: Option<i64>,
    pub application_date: Option<DateTime<Utc>>,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl Validate for CreateApplication {
    fn validate(&self) -> Result<()> {
        validation::non_zero_id_opt("ID", self.id)?;
        validation::one_of_ids(("CompanyID", self.company_id), ("RecruiterID", self.recruiter_id))?;
        if blank(&self.job_title) && blank(&self.job_ad_url) {
            return Err(crate::Error::validation(JOB_TITLE_OR_URL_REQUIRED));
        }
        validation::non_empty_opt("JobTitle", self.job_title.as_deref())?;
        validation::non_empty_opt("JobAdURL", self.job_ad_url.as_deref())?;
        validation::non_zero_time_opt("ApplicationDate", self.application_date.as_ref())?;
        validation::non_zero_time_opt("CreatedDate", self.created_date.as_ref())?;
        validation::non_zero_time_opt("UpdatedDate", self.updated_date.as_ref())?;
        Ok(())
    }
}

/// Absent and empty count the same.
fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateApplication {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub recruiter_id: Option<Uuid>,
    pub job_title: Option<String>,
    pub job_ad_url: Option<String>,
    pub country: Option<String>,
    pub area: Option<String>,
    pub remote_status_type: Option<RemoteStatusType>,
    pub weekdays_in_office: Option<i64>,
    pub estimated_cycle_time: Option<i64>,
    pub estimated_commute_time: Option<i64>,
    pub application_date: Option<DateTime<Utc>>,
}

impl UpdateApplication {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

impl Validate for UpdateApplication {
    fn validate(&self) -> Result<()> {
        validation::something_to_update(&[
            self.company_id.is_some(),
            self.recruiter_id.is_some(),
            self.job_title.is_some(),
            self.job_ad_url.is_some(),
            self.country.is_some(),
            self.area.is_some(),
            self.remote_status_type.is_some(),
            self.weekdays_in_office.is_some(),
            self.estimated_cycle_time.is_some(),
            self.estimated_commute_time.is_some(),
            self.application_date.is_some(),
        ])?;
        validation::non_zero_id("ID", self.id)?;
        validation::non_zero_id_opt("CompanyID", self.company_id)?;
        validation::non_zero_id_opt("RecruiterID", self.recruiter_id)?;
        validation::non_empty_opt("JobTitle", self.job_title.as_deref())?;
        validation::non_empty_opt("JobAdURL", self.job_ad_url.as_deref())?;
        validation::non_zero_time_opt("ApplicationDate", self.application_date.as_ref())?;
        Ok(())
    }
}
