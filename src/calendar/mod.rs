//! Calendar sources (calendars and task lists), and how to find them

pub mod cached_calendar;
pub mod remote_calendar;

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use bitflags::bitflags;

use crate::error::{Error, Missing, Result};
use crate::traits::SourceRegistry;

bitflags! {
    /// What a source provides
    #[derive(Serialize, Deserialize)]
    pub struct Extensions: u8 {
        /// Calendar events, such as meetings
        const CALENDAR = 1;
        /// To-do items, such as reminders
        const TASK_LIST = 2;
    }
}

impl TryFrom<minidom::Element> for Extensions {
    type Error = Error;

    /// Create an instance from a CalDAV <supported-calendar-component-set> element
    fn try_from(element: minidom::Element) -> Result<Self> {
        if element.name() != "supported-calendar-component-set" {
            return Err(Error::Backend("Element must be a <supported-calendar-component-set>".into()));
        }

        let mut flags = Self::empty();
        for child in element.children() {
            match child.attr("name") {
                None => continue,
                Some("VEVENT") => flags.insert(Self::CALENDAR),
                Some("VTODO") => flags.insert(Self::TASK_LIST),
                Some(other) => {
                    log::warn!("Unimplemented supported component type: {:?}. Ignoring it", other);
                    continue
                },
            };
        }

        Ok(flags)
    }
}

/// A single extension a source may carry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionKind {
    #[serde(rename = "CALENDAR")]
    Calendar,
    #[serde(rename = "TASK_LIST")]
    TaskList,
}

impl ExtensionKind {
    pub fn flag(&self) -> Extensions {
        match self {
            ExtensionKind::Calendar => Extensions::CALENDAR,
            ExtensionKind::TaskList => Extensions::TASK_LIST,
        }
    }

    fn missing(&self, identifier: &str) -> Missing {
        match self {
            ExtensionKind::Calendar => Missing::Calendar(identifier.to_string()),
            ExtensionKind::TaskList => Missing::TaskList(identifier.to_string()),
        }
    }
}

/// What a client session is opened for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientPurpose {
    Events,
    Tasks,
}

impl ClientPurpose {
    pub fn extension(&self) -> ExtensionKind {
        match self {
            ClientPurpose::Events => ExtensionKind::Calendar,
            ClientPurpose::Tasks => ExtensionKind::TaskList,
        }
    }
}

/// Flags to tell which components should be retrieved
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchFilter {
    /// Return every component
    All,
    /// Return only to-do items
    Todos,
    /// Return only calendar events
    Events,
}

impl Default for SearchFilter {
    fn default() -> Self {
        SearchFilter::All
    }
}

impl SearchFilter {
    pub fn matches(&self, component: &crate::component::Component) -> bool {
        match self {
            SearchFilter::All => true,
            SearchFilter::Todos => component.is_todo(),
            SearchFilter::Events => component.is_event(),
        }
    }
}

/// A calendar or a task list, as registered by a backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalendarSource {
    uid: String,
    display_name: String,
    extensions: Extensions,
    enabled: bool,
}

impl CalendarSource {
    pub fn new(uid: String, display_name: String, extensions: Extensions, enabled: bool) -> Self {
        Self { uid, display_name, extensions, enabled }
    }

    pub fn uid(&self) -> &str            { &self.uid          }
    pub fn display_name(&self) -> &str   { &self.display_name }
    pub fn extensions(&self) -> Extensions { self.extensions }
    pub fn enabled(&self) -> bool        { self.enabled       }

    pub fn has_extension(&self, kind: ExtensionKind) -> bool {
        self.extensions.contains(kind.flag())
    }
}


/// Find the source a user-supplied identifier designates.
///
/// `identifier` is first looked up as a source uid. If this fails (or if that source does not carry `required`),
/// the first source carrying `required` whose display name or uid equals `identifier` is returned.
pub async fn resolve<R>(registry: &R, identifier: &str, required: ExtensionKind) -> Result<CalendarSource>
where
    R: SourceRegistry + Sync + ?Sized,
{
    if let Some(source) = registry.ref_source(identifier).await? {
        if source.has_extension(required) {
            return Ok(source);
        }
        log::debug!("Source {} does not carry the {:?} extension", identifier, required);
    }

    registry.list_sources(required).await?
        .into_iter()
        .filter(|source| source.has_extension(required))
        .find(|source| source.display_name() == identifier || source.uid() == identifier)
        .ok_or_else(|| Error::NotFound(required.missing(identifier)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;

    fn test_registry() -> Cache {
        let mut cache = Cache::new(&std::env::temp_dir().join("weekly-calendar-resolve.json"));
        cache.add_source(CalendarSource::new("tasks-1".into(), "Work".into(), Extensions::TASK_LIST, true));
        cache.add_source(CalendarSource::new("cal-1".into(), "Work".into(), Extensions::CALENDAR, true));
        cache.add_source(CalendarSource::new("cal-2".into(), "Home".into(), Extensions::CALENDAR, false));
        cache.add_source(CalendarSource::new("Home".into(), "Renamed".into(), Extensions::TASK_LIST, true));
        cache
    }

    #[tokio::test]
    async fn resolve_by_uid_or_name() {
        let registry = test_registry();
        let by_uid = resolve(&registry, "cal-1", ExtensionKind::Calendar).await.unwrap();
        let by_name = resolve(&registry, "Work", ExtensionKind::Calendar).await.unwrap();
        assert_eq!(by_uid.uid(), "cal-1");
        assert_eq!(by_uid, by_name);

        let err = resolve(&registry, "nonexistent", ExtensionKind::Calendar).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Calendar not found: nonexistent");
    }

    #[tokio::test]
    async fn resolve_requires_the_extension() {
        let registry = test_registry();
        // "tasks-1" exists, but it is not a calendar
        assert!(resolve(&registry, "tasks-1", ExtensionKind::Calendar).await.unwrap_err().is_not_found());
        assert_eq!(resolve(&registry, "Work", ExtensionKind::TaskList).await.unwrap().uid(), "tasks-1");

        // The uid "Home" is a task list, so the calendar named "Home" is found by name
        assert_eq!(resolve(&registry, "Home", ExtensionKind::Calendar).await.unwrap().uid(), "cal-2");
        assert_eq!(resolve(&registry, "Home", ExtensionKind::TaskList).await.unwrap().uid(), "Home");
    }

    #[test]
    fn extensions_from_caldav_component_set() {
        let xml = r#"<supported-calendar-component-set xmlns="urn:ietf:params:xml:ns:caldav"><comp name="VEVENT"/><comp name="VTODO"/><comp name="VJOURNAL"/></supported-calendar-component-set>"#;
        let element: minidom::Element = xml.parse().unwrap();
        let flags = Extensions::try_from(element).unwrap();
        assert_eq!(flags, Extensions::CALENDAR | Extensions::TASK_LIST);

        let element: minidom::Element = r#"<prop xmlns="DAV:"/>"#.parse().unwrap();
        assert!(Extensions::try_from(element).is_err());
    }
}
