//! To-do tasks (iCal `VTODO` item) and their completion

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentKind, PropertyKind};
use crate::error::{Error, Result};
use crate::time::CalendarTime;

/// The `STATUS` of a `VTODO`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoStatus {
    #[serde(rename = "NEEDS-ACTION")]
    NeedsAction,
    #[serde(rename = "IN-PROCESS")]
    InProcess,
    #[serde(rename = "COMPLETED")]
    Completed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::NeedsAction => "NEEDS-ACTION",
            TodoStatus::InProcess => "IN-PROCESS",
            TodoStatus::Completed => "COMPLETED",
            TodoStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for TodoStatus {
    fn default() -> Self {
        TodoStatus::NeedsAction
    }
}

impl Display for TodoStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Ok(TodoStatus::NeedsAction),
            "IN-PROCESS" => Ok(TodoStatus::InProcess),
            "COMPLETED" => Ok(TodoStatus::Completed),
            "CANCELLED" => Ok(TodoStatus::Cancelled),
            other => Err(Error::Ical(format!("unknown VTODO status {:?}", other))),
        }
    }
}

/// RFC5545 defines the completion as several optional fields, yet some combinations make no sense.
/// This enum is a view over these fields that forbids such impossible combinations.
///
/// * `COMPLETED` is an optional timestamp that tells when this task has been completed
/// * `STATUS` is an optional field, that can be set to `NEEDS-ACTION`, `COMPLETED`, or others.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Completed(Option<DateTime<Utc>>),
    Uncompleted,
}
impl CompletionStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, CompletionStatus::Completed(_))
    }

    pub fn of(todo: &Component) -> Self {
        match todo.todo_status() {
            TodoStatus::Completed => CompletionStatus::Completed(todo.completed().and_then(|t| t.to_utc())),
            _ => CompletionStatus::Uncompleted,
        }
    }
}

/// What `update-todo` can do to a to-do item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TodoAction {
    Complete,
    Uncomplete,
    /// Remove the item from the backend. This is not a status change, and it cannot be undone
    Delete,
}

impl FromStr for TodoAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "complete" => Ok(TodoAction::Complete),
            "uncomplete" => Ok(TodoAction::Uncomplete),
            "delete" => Ok(TodoAction::Delete),
            other => Err(Error::Backend(format!("unknown action {:?}", other))),
        }
    }
}

/// Fields a caller can give to a new to-do item
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewTodo {
    pub summary: String,
    /// Due date, as a UNIX timestamp. `0` means "no due date"
    pub due: i64,
    /// 0 (undefined) to 9
    pub priority: u8,
    pub description: String,
}

/// Build a brand new `VTODO` that is not on a backend yet.
///
/// A new to-do always starts as `NEEDS-ACTION` and 0% complete.
/// `due` is the already-converted due date, if any.
pub fn new_todo(fields: &NewTodo, due: Option<CalendarTime>) -> Result<Component> {
    if fields.priority > 9 {
        return Err(Error::InvalidPriority(fields.priority));
    }

    let mut todo = Component::new(ComponentKind::Todo);
    todo.set_summary(&fields.summary);
    todo.set_status(TodoStatus::NeedsAction);

    if let Some(due) = due {
        todo.set_due(due);
    }
    if fields.priority > 0 {
        todo.set_priority(fields.priority);
    }
    if fields.description.is_empty() == false {
        todo.set_description(&fields.description);
    }
    todo.replace_singleton(PropertyKind::PercentComplete, 0u8);
    Ok(todo)
}

/// Mark a to-do as completed at `now`
pub fn complete(todo: &mut Component, now: DateTime<Utc>) {
    todo.set_status(TodoStatus::Completed);
    todo.replace_singleton(PropertyKind::PercentComplete, 100u8);
    todo.replace_singleton(PropertyKind::Completed, CalendarTime::from_utc(&now));
}

/// Mark a to-do as not completed (yet)
pub fn uncomplete(todo: &mut Component) {
    todo.set_status(TodoStatus::NeedsAction);
    todo.replace_singleton(PropertyKind::PercentComplete, 0u8);
    todo.remove_properties(&PropertyKind::Completed);
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Property;
    use crate::time::Zone;

    fn buy_milk() -> Component {
        let fields = NewTodo { summary: "Buy milk".to_string(), ..NewTodo::default() };
        new_todo(&fields, None).unwrap()
    }

    #[test]
    fn new_todo_initial_state() {
        let todo = buy_milk();
        assert!(todo.is_todo());
        assert_eq!(todo.summary(), Some("Buy milk"));
        assert_eq!(todo.todo_status(), TodoStatus::NeedsAction);
        assert_eq!(todo.percent_complete(), 0);
        assert_eq!(todo.properties(&PropertyKind::PercentComplete).len(), 1);
        assert!(todo.first_property(&PropertyKind::Priority).is_none());
        assert!(todo.due().is_none());
        assert!(todo.description().is_none());
        assert_eq!(CompletionStatus::of(&todo), CompletionStatus::Uncompleted);
    }

    #[test]
    fn new_todo_with_fields() {
        let fields = NewTodo {
            summary: "Taxes".to_string(),
            due: 1_714_521_600,
            priority: 3,
            description: "Before May".to_string(),
        };
        let due = CalendarTime::new(2024, 5, 1, 0, 0, 0, Zone::Utc);
        let todo = new_todo(&fields, Some(due.clone())).unwrap();
        assert_eq!(todo.priority(), 3);
        assert_eq!(todo.due(), Some(&due));
        assert_eq!(todo.description(), Some("Before May"));

        let fields = NewTodo { priority: 10, ..fields };
        assert!(matches!(new_todo(&fields, None), Err(Error::InvalidPriority(10))));
    }

    #[test]
    fn complete_sets_every_field() {
        let mut todo = buy_milk();
        let now = Utc::now();
        complete(&mut todo, now);

        assert_eq!(todo.todo_status(), TodoStatus::Completed);
        assert_eq!(todo.percent_complete(), 100);
        assert_eq!(todo.properties(&PropertyKind::PercentComplete).len(), 1);
        assert_eq!(todo.properties(&PropertyKind::Completed).len(), 1);
        let completed_at = todo.completed().unwrap();
        assert_eq!(completed_at.zone(), &Zone::Utc);
        assert_eq!(completed_at.to_utc().unwrap().timestamp(), now.timestamp());
        assert!(CompletionStatus::of(&todo).is_completed());

        // Completing twice keeps singletons single
        complete(&mut todo, now);
        assert_eq!(todo.properties(&PropertyKind::Completed).len(), 1);
    }

    #[test]
    fn uncomplete_restores_initial_state() {
        let mut todo = buy_milk();
        todo.add_property(PropertyKind::PercentComplete, Property::new(60u8));
        todo.set_priority(8);
        complete(&mut todo, Utc::now());
        uncomplete(&mut todo);

        assert_eq!(todo.todo_status(), TodoStatus::NeedsAction);
        assert_eq!(todo.properties(&PropertyKind::PercentComplete), &[Property::new(0u8)]);
        assert!(todo.completed().is_none());
        assert_eq!(todo.priority(), 8);
        assert_eq!(CompletionStatus::of(&todo), CompletionStatus::Uncompleted);
    }

    #[test]
    fn statuses() {
        assert_eq!("in-process".parse::<TodoStatus>().unwrap(), TodoStatus::InProcess);
        assert!("DONE".parse::<TodoStatus>().is_err());
        assert_eq!(serde_json::to_string(&TodoStatus::NeedsAction).unwrap(), "\"NEEDS-ACTION\"");
        assert_eq!("delete".parse::<TodoAction>().unwrap(), TodoAction::Delete);
        assert!("archive".parse::<TodoAction>().is_err());
    }
}
