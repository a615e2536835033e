//! Calendar events (iCal `VEVENT` item)

use crate::component::{Component, ComponentKind};
use crate::time::CalendarTime;

/// Fields a caller can give to a new event
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewEvent {
    pub summary: String,
    /// Start time, as a UNIX timestamp
    pub start: i64,
    /// End time, as a UNIX timestamp
    pub end: i64,
    pub location: String,
    pub description: String,
}

/// Build a brand new `VEVENT` that is not on a backend yet.
/// Empty locations and descriptions are not written.
pub fn new_event(fields: &NewEvent, start: CalendarTime, end: CalendarTime) -> Component {
    let mut event = Component::new(ComponentKind::Event);
    event.set_summary(&fields.summary);
    event.set_dtstart(start);
    event.set_dtend(end);

    if fields.location.is_empty() == false {
        event.set_location(&fields.location);
    }
    if fields.description.is_empty() == false {
        event.set_description(&fields.description);
    }
    event
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Zone;

    #[test]
    fn optional_fields_are_skipped_when_empty() {
        let start = CalendarTime::new(2024, 6, 3, 14, 0, 0, Zone::Utc);
        let end = CalendarTime::new(2024, 6, 3, 15, 0, 0, Zone::Utc);

        let fields = NewEvent { summary: "Standup".to_string(), ..NewEvent::default() };
        let event = new_event(&fields, start.clone(), end.clone());
        assert!(event.is_event());
        assert_eq!(event.summary(), Some("Standup"));
        assert_eq!(event.dtstart(), Some(&start));
        assert_eq!(event.dtend(), Some(&end));
        assert!(event.location().is_none());
        assert!(event.description().is_none());

        let fields = NewEvent { location: "Room 4".to_string(), description: "Daily".to_string(), ..fields };
        let event = new_event(&fields, start, end);
        assert_eq!(event.location(), Some("Room 4"));
        assert_eq!(event.description(), Some("Daily"));
    }
}
