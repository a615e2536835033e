//! This modules exposes the operations a host application can run against a backend
//!
//! A [`Provider`] resolves the user-supplied calendar and task-list identifiers, converts the timestamps it is given,
//! and drives the to-do state machine. Items of several task lists are merged into one sorted listing.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;

use crate::calendar::{resolve, CalendarSource, ClientPurpose, ExtensionKind, SearchFilter};
use crate::component::Component;
use crate::error::{Error, Missing, Result};
use crate::event::{new_event, NewEvent};
use crate::task::{self, new_todo, NewTodo, TodoAction, TodoStatus};
use crate::time::{to_calendar_time, BuiltinTimezones, CalendarTime, SystemClock};
use crate::traits::{CalendarClient, SourceRegistry, TimezoneLookup, WallClock};
use crate::utils::comparison::compare_todos_by_due;

pub mod listing_progress;
use listing_progress::ListingProgress;
pub mod todo_view;
use todo_view::{TaskListView, TodoView};


/// Runs calendar and to-do operations against a [`SourceRegistry`].
///
/// Usually, the registry will be a [`Cache`](crate::cache::Cache) or a [`Client`](crate::client::Client).
/// Every operation is a fresh unit of work: nothing is kept between two calls, the backend is the only source of truth.
pub struct Provider<R>
where
    R: SourceRegistry,
{
    registry: R,
    clock: Box<dyn WallClock + Send + Sync>,
    timezones: Box<dyn TimezoneLookup + Send + Sync>,
    /// How long to wait for a backend session (and for a listing). `None` waits forever
    connect_timeout: Option<Duration>,
}

impl<R> Provider<R>
where
    R: SourceRegistry + Sync,
{
    /// Create a provider that uses the wall clock of this process and the `chrono-tz` timezones
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            clock: Box::new(SystemClock::new()),
            timezones: Box::new(BuiltinTimezones),
            connect_timeout: None,
        }
    }

    pub fn with_clock<C: WallClock + Send + Sync + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_timezones<L: TimezoneLookup + Send + Sync + 'static>(mut self, timezones: L) -> Self {
        self.timezones = Box::new(timezones);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the backend this provider uses
    pub fn registry(&self) -> &R { &self.registry }
    /// Returns the backend this provider uses
    pub fn registry_mut(&mut self) -> &mut R { &mut self.registry }

    fn calendar_time(&self, timestamp: i64) -> Result<CalendarTime> {
        to_calendar_time(timestamp, self.clock.as_ref(), self.timezones.as_ref())
    }

    /// Await a backend call, giving up after the connect timeout (if any)
    async fn bounded<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.connect_timeout {
            None => future.await,
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(result) => result,
                Err(_elapsed) => Err(Error::Timeout(limit)),
            },
        }
    }

    async fn open(&self, source: &CalendarSource, purpose: ClientPurpose) -> Result<R::Client> {
        self.bounded(self.registry.connect(source, purpose)).await
            .map_err(|err| match err {
                Error::ConnectionFailure{ .. } => err,
                other => Error::connection(source.uid(), other),
            })
    }

    async fn query_all(&self, client: &R::Client, source: &CalendarSource) -> Result<Vec<Component>> {
        self.bounded(client.get_object_list(&SearchFilter::All)).await
            .map_err(|err| match err {
                Error::QueryFailure{ .. } => err,
                other => Error::query(source.uid(), other),
            })
    }

    /// Create a calendar event, and return its uid
    pub async fn create_event(&self, calendar: &str, fields: &NewEvent) -> Result<String> {
        let start = self.calendar_time(fields.start)?;
        let end = self.calendar_time(fields.end)?;
        let event = new_event(fields, start, end);

        let source = resolve(&self.registry, calendar, ExtensionKind::Calendar).await?;
        let mut client = self.open(&source, ClientPurpose::Events).await?;
        let uid = client.create_object(event).await?;
        log::info!("Created event {:?} ({}) in {}", fields.summary, uid, source.display_name());
        Ok(uid)
    }

    /// Create a to-do item, and return its uid.
    ///
    /// A `due` of 0 means "no due date", a `priority` of 0 means "no priority".
    pub async fn create_todo(&self, task_list: &str, fields: &NewTodo) -> Result<String> {
        let due = match fields.due {
            timestamp if timestamp > 0 => Some(self.calendar_time(timestamp)?),
            _ => None,
        };
        let todo = new_todo(fields, due)?;

        let source = resolve(&self.registry, task_list, ExtensionKind::TaskList).await?;
        let mut client = self.open(&source, ClientPurpose::Tasks).await?;
        let uid = client.create_object(todo).await?;
        log::info!("Created to-do {:?} ({}) in {}", fields.summary, uid, source.display_name());
        Ok(uid)
    }

    /// Returns every task list, enabled or not
    pub async fn list_task_lists(&self) -> Result<Vec<TaskListView>> {
        Ok(self.registry.list_sources(ExtensionKind::TaskList).await?
            .iter()
            .map(TaskListView::from)
            .collect())
    }

    /// Returns the to-do items of every enabled task list, sorted by due date.
    ///
    /// Task lists that cannot be reached or queried are skipped (and logged).
    pub async fn list_todos(&self, include_completed: bool) -> Result<Vec<TodoView>> {
        let mut progress = ListingProgress::new();
        self.list_todos_with_progress(include_completed, &mut progress).await
    }

    /// Same as [`Self::list_todos`], and tells which task lists have been skipped
    pub async fn list_todos_with_progress(&self, include_completed: bool, progress: &mut ListingProgress) -> Result<Vec<TodoView>> {
        let sources = self.registry.list_sources(ExtensionKind::TaskList).await?;

        let mut todos = Vec::new();
        for source in &sources {
            if source.enabled() == false {
                progress.debug(&format!("Task list {} is disabled", source.display_name()));
                continue;
            }
            progress.visit(source.display_name());

            let client = match self.open(source, ClientPurpose::Tasks).await {
                Err(err) => {
                    progress.skip(source.uid(), source.display_name(), &err.to_string());
                    continue;
                },
                Ok(client) => client,
            };

            let components = match self.query_all(&client, source).await {
                Err(err) => {
                    progress.skip(source.uid(), source.display_name(), &err.to_string());
                    continue;
                },
                Ok(components) => components,
            };

            let count_before = todos.len();
            for component in components {
                if component.is_todo() == false {
                    continue;
                }
                if include_completed == false && component.todo_status() == TodoStatus::Completed {
                    continue;
                }
                todos.push(TodoView::new(&component, source));
            }
            progress.debug(&format!("{} to-do items in {}", todos.len() - count_before, source.display_name()));
        }

        // This is a stable sort: items without a due date keep the order of the backend
        todos.sort_by(compare_todos_by_due);
        Ok(todos)
    }

    /// Complete, uncomplete or delete a to-do item
    pub async fn update_todo(&self, task_list: &str, uid: &str, action: TodoAction) -> Result<()> {
        let source = resolve(&self.registry, task_list, ExtensionKind::TaskList).await?;
        let mut client = self.open(&source, ClientPurpose::Tasks).await?;

        if action == TodoAction::Delete {
            client.remove_object(uid).await?;
            log::info!("Deleted to-do {} from {}", uid, source.display_name());
            return Ok(());
        }

        // Always work on the latest version of the item
        let mut todo = client.get_object(uid).await?
            .filter(|component| component.is_todo())
            .ok_or_else(|| Error::NotFound(Missing::Item(uid.to_string())))?;

        match action {
            TodoAction::Complete => task::complete(&mut todo, Utc::now()),
            _ => task::uncomplete(&mut todo),
        }
        client.modify_object(&todo).await?;
        log::info!("Marked to-do {} as {}", uid, todo.todo_status());
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono_tz::Tz;

    use crate::cache::Cache;
    use crate::calendar::Extensions;
    use crate::mock_behaviour::MockBehaviour;
    use crate::time::FixedZoneClock;

    fn provider() -> Provider<Cache> {
        let path = std::env::temp_dir().join(format!("weekly-calendar-provider-{}.json", uuid::Uuid::new_v4()));
        let mut cache = Cache::new(&path);
        cache.add_source(CalendarSource::new("chores".into(), "Chores".into(), Extensions::TASK_LIST, true));
        cache.add_source(CalendarSource::new("work".into(), "Work".into(), Extensions::CALENDAR, true));
        Provider::new(cache).with_clock(FixedZoneClock(Tz::UTC))
    }

    #[tokio::test]
    async fn invalid_priority_is_rejected_first() {
        let provider = provider();
        let fields = NewTodo { summary: "Too important".into(), priority: 10, ..NewTodo::default() };
        // The task list does not even exist: the priority is checked before contacting the backend
        let err = provider.create_todo("nonexistent", &fields).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPriority(10)));
    }

    #[tokio::test]
    async fn purpose_must_match_the_source() {
        let provider = provider();
        let fields = NewTodo { summary: "Misplaced".into(), ..NewTodo::default() };
        let err = provider.create_todo("Work", &fields).await.unwrap_err();
        assert_eq!(err.to_string(), "Task list not found: Work");
    }

    #[tokio::test]
    async fn connection_failures_are_reported() {
        let mut provider = provider();
        provider.registry_mut().set_mock_behaviour("chores", MockBehaviour::unreachable());

        let fields = NewTodo { summary: "Unreachable".into(), ..NewTodo::default() };
        let err = provider.create_todo("chores", &fields).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailure{ ref source_uid, .. } if source_uid == "chores"));
    }

    #[tokio::test]
    async fn update_requires_a_todo() {
        let provider = provider();
        let err = provider.update_todo("Chores", "missing-uid", TodoAction::Complete).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "VTODO not found");

        let err = provider.update_todo("Chores", "missing-uid", TodoAction::Delete).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
