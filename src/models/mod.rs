//! Entity, association, and request types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod application;
pub mod association;
pub mod company;
pub mod event;
pub mod person;

pub use application::{Application, CreateApplication, RemoteStatusType, UpdateApplication};
pub use association::*;
pub use company::{Company, CompanyType, CreateCompany, UpdateCompany};
pub use event::{CreateEvent, Event, EventType, UpdateEvent};
pub use person::{CreatePerson, Person, PersonType, UpdatePerson};

/// A child entity embedded in an aggregate read.
///
/// At inclusion level `all` the child is fully hydrated; at level `ids`
/// only its identifier is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Related<T> {
    Full(T),
    Id {
        #[serde(rename = "ID")]
        id: Uuid,
    },
}

pub trait Identified {
    fn id(&self) -> Uuid;
}

impl<T: Identified> Related<T> {
    pub fn id(&self) -> Uuid {
        match self {
            Related::Full(entity) => entity.id(),
            Related::Id { id } => *id,
        }
    }

    pub fn full(&self) -> Option<&T> {
        match self {
            Related::Full(entity) => Some(entity),
            Related::Id { .. } => None,
        }
    }

    pub fn into_full(self) -> Option<T> {
        match self {
            Related::Full(entity) => Some(entity),
            Related::Id { .. } => None,
        }
    }
}
