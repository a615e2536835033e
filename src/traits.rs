//! Traits used by the backends of this crate
//!
//! A backend provides a [`SourceRegistry`], that enumerates its calendars and task lists, and opens
//! [`CalendarClient`] sessions on them.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use chrono_tz::Tz;

use crate::calendar::{CalendarSource, ClientPurpose, ExtensionKind, SearchFilter};
use crate::component::Component;
use crate::error::Result;

/// The registry of the sources (calendars and task lists) a backend knows about
#[async_trait]
pub trait SourceRegistry {
    /// The kind of sessions this registry opens
    type Client: CalendarClient + Send;

    /// Returns every source that carries the given extension.
    /// The order is defined by the backend.
    async fn list_sources(&self, kind: ExtensionKind) -> Result<Vec<CalendarSource>>;

    /// Returns the source with this exact uid, if any
    async fn ref_source(&self, uid: &str) -> Result<Option<CalendarSource>>;

    /// Open a session on a source.
    /// This may wait for the backend as long as it takes to reply (or to fail)
    async fn connect(&self, source: &CalendarSource, purpose: ClientPurpose) -> Result<Self::Client>;
}

/// A session opened on a single source
#[async_trait]
pub trait CalendarClient {
    /// Store a new component, and return the uid it has been stored with.
    /// A uid is assigned in case the component has none.
    async fn create_object(&mut self, component: Component) -> Result<String>;

    /// Fetch the current version of a component
    async fn get_object(&self, uid: &str) -> Result<Option<Component>>;

    /// Replace a stored component with `component` (matched by uid)
    async fn modify_object(&mut self, component: &Component) -> Result<()>;

    /// Remove a component from this source
    async fn remove_object(&mut self, uid: &str) -> Result<()>;

    /// Returns the components that match a filter
    async fn get_object_list(&self, filter: &SearchFilter) -> Result<Vec<Component>>;
}

/// Something that knows which timezones are "built in"
pub trait TimezoneLookup {
    /// Resolve a timezone short name (e.g. `EST`). \
    /// Returns `None` in case no builtin timezone has this name.
    fn builtin_timezone(&self, name: &str) -> Option<Tz>;

    fn utc_timezone(&self) -> Tz;
}

/// A source of local wall-clock time
pub trait WallClock {
    /// Returns the local date and time for a UNIX timestamp, along with the short name of the local timezone at this instant
    fn local_wall_clock(&self, timestamp: i64) -> Option<(NaiveDateTime, String)>;
}
