//! The JSON documents the command-line tool prints

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The result of a command that targets a single calendar or task list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationOutcome {
    /// An item has been created
    pub fn created(uid: String) -> Self {
        Self { success: true, uid: Some(uid), error: None }
    }

    /// An item has been updated or deleted
    pub fn done() -> Self {
        Self { success: true, uid: None, error: None }
    }

    pub fn failed(error: &Error) -> Self {
        Self { success: false, uid: None, error: Some(error.to_string()) }
    }
}

/// What a listing command prints (to stderr) when it fails
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: String,
}

impl From<&Error> for ErrorReport {
    fn from(error: &Error) -> Self {
        Self { error: error.to_string() }
    }
}
