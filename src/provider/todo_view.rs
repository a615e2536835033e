//! The flattened views the provider returns to its callers

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarSource;
use crate::component::Component;
use crate::time::to_iso;

/// A to-do item, as listed by [`Provider::list_todos`](crate::Provider::list_todos)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoView {
    pub uid: Option<String>,
    pub summary: String,
    pub description: String,
    /// ISO-8601 local date-time, or `null`
    pub due: Option<String>,
    /// ISO-8601 local date-time, or `null`
    pub dtstart: Option<String>,
    pub status: String,
    pub priority: u8,
    pub percent_complete: u8,
    pub calendar_name: String,
    pub calendar_uid: String,
}

impl TodoView {
    /// Flatten a `VTODO` fetched from `source`
    pub fn new(todo: &Component, source: &CalendarSource) -> Self {
        let mut priority = todo.priority();
        if priority == 0 {
            // Some backends store a priority the typed accessor does not understand
            priority = todo.raw_priority().unwrap_or(0);
        }

        Self {
            uid: todo.uid().map(String::from),
            summary: todo.summary().unwrap_or_default().to_string(),
            description: todo.description().unwrap_or_default().to_string(),
            due: todo.due().and_then(to_iso),
            dtstart: todo.dtstart().and_then(to_iso),
            status: todo.todo_status().as_str().to_string(),
            priority,
            percent_complete: todo.percent_complete(),
            calendar_name: source.display_name().to_string(),
            calendar_uid: source.uid().to_string(),
        }
    }
}

/// A task list, as listed by [`Provider::list_task_lists`](crate::Provider::list_task_lists)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListView {
    pub uid: String,
    pub name: String,
    pub enabled: bool,
}

impl From<&CalendarSource> for TaskListView {
    fn from(source: &CalendarSource) -> Self {
        Self {
            uid: source.uid().to_string(),
            name: source.display_name().to_string(),
            enabled: source.enabled(),
        }
    }
}
