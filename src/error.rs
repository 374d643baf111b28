//! Error taxonomy shared by every store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure kind. Callers branch on this, never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Request violates a stated precondition.
    #[error("validation error{}: {message}", field_suffix(.field))]
    Validation {
        field: Option<String>,
        message: String,
    },

    /// Lookup key did not match any row.
    #[error("error: object not found: {0}")]
    NotFound(String),

    /// Write would violate a uniqueness rule.
    #[error("conflict error on insert: {0}")]
    Conflict(String),

    /// Unexpected backend or decoding failure.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(f) => format!(" on field '{f}'"),
        None => String::new(),
    }
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Error::NotFound(detail.into())
    }

    pub fn conflict(detail: impl Into<String>) -> Self {
        Error::Conflict(detail.into())
    }

    /// Build an Internal error and log it with its cause. Internal is the
    /// only kind that gets logged.
    pub fn internal<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let message = message.into();
        tracing::error!(error = %source, source_debug = ?source, "{message}");
        Error::Internal {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Internal error without an underlying cause (invariant violations).
    pub fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("{message}");
        Error::Internal {
            message,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Field name carried by a Validation error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::internal("database query failed", err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::internal("failed to decode aggregated JSON", err)
    }
}
