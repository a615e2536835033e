//! Some test scenarii, that populate a local backend with task lists and items
//!
//! The backend is a [`Cache`] stored in a temporary file.

use std::path::PathBuf;

use chrono_tz::Tz;

use weekly_calendar::cache::Cache;
use weekly_calendar::component::{ComponentKind, PropertyKind};
use weekly_calendar::mock_behaviour::MockBehaviour;
use weekly_calendar::task::TodoStatus;
use weekly_calendar::time::{CalendarTime, FixedZoneClock, Zone};
use weekly_calendar::{CalendarSource, Component, Extensions, Provider};

pub fn temp_cache_path() -> PathBuf {
    std::env::temp_dir().join(format!("weekly-calendar-test-{}.json", uuid::Uuid::new_v4()))
}

/// An empty cache with the sources every test uses
pub fn test_cache() -> Cache {
    let mut cache = Cache::new(&temp_cache_path());
    cache.add_source(CalendarSource::new("chores".into(), "Chores".into(), Extensions::TASK_LIST, true));
    cache.add_source(CalendarSource::new("work-tasks".into(), "Work".into(), Extensions::TASK_LIST, true));
    cache.add_source(CalendarSource::new("office".into(), "Office".into(), Extensions::TASK_LIST, true));
    cache.add_source(CalendarSource::new("archive".into(), "Archive".into(), Extensions::TASK_LIST, false));
    cache.add_source(CalendarSource::new("work".into(), "Work".into(), Extensions::CALENDAR, true));
    cache
}

/// A provider whose "local" time is UTC
pub fn test_provider(cache: Cache) -> Provider<Cache> {
    let _ = env_logger::builder().is_test(true).try_init();
    Provider::new(cache).with_clock(FixedZoneClock(Tz::UTC))
}

pub fn todo(summary: &str, due: Option<CalendarTime>, status: TodoStatus) -> Component {
    let mut todo = Component::new(ComponentKind::Todo);
    todo.set_summary(summary);
    todo.set_status(status);
    if let Some(due) = due {
        todo.set_due(due);
    }
    todo
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32) -> CalendarTime {
    CalendarTime::new(year, month, day, hour, 0, 0, Zone::Utc)
}

/// A backend with items in several task lists.
///
/// * `chores` has two to-do items due on March 5th and 1st (the latter is completed), one without due date, and an event
/// * `work-tasks` has a to-do item due on March 2nd, and one without due date
/// * `office` cannot be reached
/// * `archive` is disabled
pub fn populated_cache() -> Cache {
    let mut cache = test_cache();

    cache.add_component("chores", todo("Water the plants", Some(utc(2024, 3, 5, 18)), TodoStatus::NeedsAction)).unwrap();
    cache.add_component("chores", todo("Clean the fridge", None, TodoStatus::InProcess)).unwrap();
    let mut done = todo("Pay the rent", Some(utc(2024, 3, 1, 9)), TodoStatus::Completed);
    done.replace_singleton(PropertyKind::PercentComplete, 100u8);
    cache.add_component("chores", done).unwrap();
    let mut event = Component::new(ComponentKind::Event);
    event.set_summary("Plumber visit");
    event.set_dtstart(utc(2024, 3, 4, 8));
    cache.add_component("chores", event).unwrap();

    cache.add_component("work-tasks", todo("Send the report", Some(utc(2024, 3, 2, 17)), TodoStatus::NeedsAction)).unwrap();
    cache.add_component("work-tasks", todo("Book a room", None, TodoStatus::NeedsAction)).unwrap();

    cache.add_component("office", todo("Unreachable item", Some(utc(2024, 3, 1, 8)), TodoStatus::NeedsAction)).unwrap();
    cache.set_mock_behaviour("office", MockBehaviour::unreachable());

    cache.add_component("archive", todo("Archived item", Some(utc(2024, 1, 1, 8)), TodoStatus::NeedsAction)).unwrap();

    cache
}
