//! Listing the to-do items of several task lists

mod scenarii;

use std::time::Duration;

use async_trait::async_trait;

use weekly_calendar::cache::Cache;
use weekly_calendar::calendar::ClientPurpose;
use weekly_calendar::mock_behaviour::MockBehaviour;
use weekly_calendar::provider::listing_progress::ListingProgress;
use weekly_calendar::provider::todo_view::TodoView;
use weekly_calendar::traits::SourceRegistry;
use weekly_calendar::{CachedCalendar, CalendarSource, ExtensionKind, Result, TodoStatus};

fn summaries(todos: &[TodoView]) -> Vec<&str> {
    todos.iter().map(|t| t.summary.as_str()).collect()
}

fn assert_sorted_by_due(todos: &[TodoView]) {
    let first_without_due = todos.iter().position(|t| t.due.is_none()).unwrap_or(todos.len());
    assert!(todos[first_without_due..].iter().all(|t| t.due.is_none()));
    let dues: Vec<&String> = todos[..first_without_due].iter().filter_map(|t| t.due.as_ref()).collect();
    assert!(dues.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn unreachable_source_is_skipped() {
    let provider = scenarii::test_provider(scenarii::populated_cache());

    let mut progress = ListingProgress::new();
    let todos = provider.list_todos_with_progress(false, &mut progress).await.unwrap();

    assert_eq!(summaries(&todos), vec!["Send the report", "Water the plants", "Clean the fridge", "Book a room"]);
    assert_sorted_by_due(&todos);

    // "office" could not be reached, "archive" is disabled and not even visited
    assert_eq!(progress.n_visited(), 3);
    assert_eq!(progress.skipped().len(), 1);
    assert_eq!(progress.skipped()[0].uid, "office");

    assert_eq!(todos[0].calendar_name, "Work");
    assert_eq!(todos[0].calendar_uid, "work-tasks");
    assert_eq!(todos[0].due.as_deref(), Some("2024-03-02T17:00:00"));
    assert_eq!(todos[2].status, TodoStatus::InProcess.as_str());
    assert_eq!(todos[2].due, None);
}

#[tokio::test]
async fn completed_items_on_demand() {
    let provider = scenarii::test_provider(scenarii::populated_cache());

    let todos = provider.list_todos(true).await.unwrap();
    assert_eq!(summaries(&todos), vec!["Pay the rent", "Send the report", "Water the plants", "Clean the fridge", "Book a room"]);
    assert_sorted_by_due(&todos);
    assert_eq!(todos[0].status, "COMPLETED");
    assert_eq!(todos[0].percent_complete, 100);
}

#[tokio::test]
async fn query_failure_is_skipped() {
    let mut cache = scenarii::populated_cache();
    cache.set_mock_behaviour("work-tasks", MockBehaviour {
        get_object_list_behaviour: (0, 1),
        ..MockBehaviour::default()
    });
    let provider = scenarii::test_provider(cache);

    let mut progress = ListingProgress::new();
    let todos = provider.list_todos_with_progress(false, &mut progress).await.unwrap();
    assert_eq!(summaries(&todos), vec!["Water the plants", "Clean the fridge"]);
    let skipped: Vec<&str> = progress.skipped().iter().map(|s| s.uid.as_str()).collect();
    assert_eq!(skipped, vec!["work-tasks", "office"]);

    // The mocked failure only happens once
    let todos = provider.list_todos(false).await.unwrap();
    assert_eq!(todos.len(), 4);
}

#[tokio::test]
async fn task_lists() {
    let provider = scenarii::test_provider(scenarii::populated_cache());

    let lists = provider.list_task_lists().await.unwrap();
    let uids: Vec<&str> = lists.iter().map(|l| l.uid.as_str()).collect();
    assert_eq!(uids, vec!["chores", "work-tasks", "office", "archive"]);
    assert_eq!(lists[1].name, "Work");
    assert!(lists[3].enabled == false);
    assert!(lists[..3].iter().all(|l| l.enabled));
}


/// A backend that takes forever to open sessions on one of its sources
struct SlowRegistry {
    inner: Cache,
    slow_source: String,
}

#[async_trait]
impl SourceRegistry for SlowRegistry {
    type Client = CachedCalendar;

    async fn list_sources(&self, kind: ExtensionKind) -> Result<Vec<CalendarSource>> {
        self.inner.list_sources(kind).await
    }

    async fn ref_source(&self, uid: &str) -> Result<Option<CalendarSource>> {
        self.inner.ref_source(uid).await
    }

    async fn connect(&self, source: &CalendarSource, purpose: ClientPurpose) -> Result<Self::Client> {
        if source.uid() == self.slow_source {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inner.connect(source, purpose).await
    }
}

#[tokio::test]
async fn hung_source_is_skipped_after_the_timeout() {
    let _ = env_logger::builder().is_test(true).try_init();
    let registry = SlowRegistry { inner: scenarii::populated_cache(), slow_source: "chores".to_string() };
    let provider = weekly_calendar::Provider::new(registry)
        .with_clock(weekly_calendar::time::FixedZoneClock(chrono_tz::Tz::UTC))
        .with_connect_timeout(Some(Duration::from_millis(100)));

    let mut progress = ListingProgress::new();
    let todos = provider.list_todos_with_progress(false, &mut progress).await.unwrap();
    assert_eq!(summaries(&todos), vec!["Send the report", "Book a room"]);
    let skipped: Vec<&str> = progress.skipped().iter().map(|s| s.uid.as_str()).collect();
    assert_eq!(skipped, vec!["chores", "office"]);
    assert_eq!(progress.skipped()[0].reason, "Unable to connect to source chores: Backend did not answer within 100ms");
}
