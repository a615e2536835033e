//! Error types of this crate

use std::fmt::{Display, Formatter};

use thiserror::Error;

/// What could not be found by a single-target operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Missing {
    /// No source carrying the calendar extension matches this identifier
    Calendar(String),
    /// No source carrying the task-list extension matches this identifier
    TaskList(String),
    /// The backend has no component with this uid
    Item(String),
}

impl Display for Missing {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Calendar(id) => write!(f, "Calendar not found: {}", id),
            Missing::TaskList(id) => write!(f, "Task list not found: {}", id),
            Missing::Item(_uid) => write!(f, "VTODO not found"),
        }
    }
}

/// Errors that can occur while talking to a calendar backend
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotFound(Missing),

    #[error("Unable to connect to source {source_uid}: {reason}")]
    ConnectionFailure { source_uid: String, reason: String },

    #[error("Unable to query source {source_uid}: {reason}")]
    QueryFailure { source_uid: String, reason: String },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid priority {0} (expected 0-9)")]
    InvalidPriority(u8),

    /// A backend call exceeded the connect timeout of a [`Provider`](crate::Provider).
    /// The provider reports it as the reason of a `ConnectionFailure` or a `QueryFailure`
    #[error("Backend did not answer within {0:?}")]
    Timeout(std::time::Duration),

    #[error("iCal error: {0}")]
    Ical(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML error: {0}")]
    Xml(#[from] minidom::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub(crate) fn connection<S: ToString>(source_uid: &str, reason: S) -> Self {
        Error::ConnectionFailure { source_uid: source_uid.to_string(), reason: reason.to_string() }
    }

    pub(crate) fn query<S: ToString>(source_uid: &str, reason: S) -> Self {
        Error::QueryFailure { source_uid: source_uid.to_string(), reason: reason.to_string() }
    }
}

/// Result type alias for this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages() {
        assert_eq!(Error::NotFound(Missing::Calendar("Work".into())).to_string(), "Calendar not found: Work");
        assert_eq!(Error::NotFound(Missing::TaskList("x".into())).to_string(), "Task list not found: x");
        assert_eq!(Error::NotFound(Missing::Item("abc".into())).to_string(), "VTODO not found");
        assert!(Error::NotFound(Missing::Item("abc".into())).is_not_found());
        assert!(Error::InvalidPriority(12).is_not_found() == false);
    }
}
