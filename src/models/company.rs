use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{Event, Identified, Person, Related};
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
pub enum CompanyType {
    Employer,
    Recruiter,
    Consultancy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Company {
    #[serde(rename = "ID")]
    pub id: Uuid,
    pub name: String,
    pub company_type: CompanyType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "timestamp::serde_ms_opt")]
    pub last_contact: Option<DateTime<Utc>>,
    #[serde(with = "timestamp::serde_ms")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::serde_ms_opt")]
    pub updated_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persons: Option<Vec<Related<Person>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<Related<Event>>>,
}

impl Identified for Company {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCompany {
    pub id: Option<Uuid>,
    pub name: String,
    pub company_type: CompanyType,
    pub notes: Option<String>,
    pub last_contact: Option<DateTime<Utc>>,
    pub created_date: Option<DateTime<Utc>>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl CreateCompany {
    pub fn new(name: impl Into<String>, company_type: CompanyType) -> Self {
        Self {
            id: None,
            name: name.into(),
            company_type,
            notes: None,
            last_contact: None,
            created_date: None,
            updated_date: None,
        }
    }
}

impl Validate for CreateCompany {
    fn validate(&self) -> Result<()> {
        validation::non_zero_id_opt("ID", self.id)?;
        validation::non_empty("Name", &self.name)?;
        validation::non_zero_time_opt("LastContact", self.last_contact.as_ref())?;
        validation::non_zero_time_opt("CreatedDate", self.created_date.as_ref())?;
        validation::non_zero_time_opt("UpdatedDate", self.updated_date.as_ref())?;
        Ok(())
    }
}

/// Partial update; only the fields that are `Some` change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCompany {
    pub id: Uuid,
    pub name: Option<String>,
    pub company_type: Option<CompanyType>,
    pub notes: Option<String>,
    pub last_contact: Option<DateTime<Utc>>,
}

impl UpdateCompany {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

impl Validate for UpdateCompany {
    fn validate(&self) -> Result<()> {
        validation::something_to_update(&[
            self.name.is_some(),
            self.company_type.is_some(),
            self.notes.is_some(),
            self.last_contact.is_some(),
        ])?;
        validation::non_zero_id("ID", self.id)?;
        validation::non_empty_opt("Name", self.name.as_deref())?;
        validation::non_zero_time_opt("LastContact", self.last_contact.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ids;
    use strum::IntoEnumIterator;

    #[test]
    fn company_type_strings() {
        let names: Vec<String> = CompanyType::iter().map(|t| t.to_string()).collect();
        assert_eq!(names, ["employer", "recruiter", "consultancy"]);
        assert_eq!("consultancy".parse::<CompanyType>().unwrap(), CompanyType::Consultancy);
        assert!("Employer".parse::<CompanyType>().is_err());
    }

    #[test]
    fn create_requires_name() {
        let err = CreateCompany::new("", CompanyType::Employer).validate().unwrap_err();
        assert_eq!(err.field(), Some("Name"));
    }

    #[test]
    fn create_rejects_zero_updated_date() {
        let req = CreateCompany {
            updated_date: Some(DateTime::<Utc>::default()),
            ..CreateCompany::new("Acme", CompanyType::Employer)
        };
        let err = req.validate().unwrap_err();
        assert_eq!(err.field(), Some("UpdatedDate"));
    }

    #[test]
    fn create_rejects_nil_id() {
        let req = CreateCompany {
            id: Some(Uuid::nil()),
            ..CreateCompany::new("Acme", CompanyType::Employer)
        };
        assert_eq!(req.validate().unwrap_err().field(), Some("ID"));
    }

    #[test]
    fn create_accepts_minimal_request() {
        assert!(CreateCompany::new("Acme", CompanyType::Employer).validate().is_ok());
    }

    #[test]
    fn update_with_no_fields_is_nothing_to_update() {
        let err = UpdateCompany::new(ids::new_id()).validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "validation error: nothing to update");
    }

    #[test]
    fn update_rejects_empty_name() {
        let req = UpdateCompany {
            name: Some(String::new()),
            ..UpdateCompany::new(ids::new_id())
        };
        assert_eq!(req.validate().unwrap_err().field(), Some("Name"));
    }

    #[test]
    fn update_with_notes_only_is_valid() {
        let req = UpdateCompany {
            notes: Some("met at meetup".into()),
            ..UpdateCompany::new(ids::new_id())
        };
        assert!(req.validate().is_ok());
    }
}
