//! A module to build iCal files

use std::collections::BTreeMap;

use chrono::{Offset, TimeZone as _};
use chrono_tz::Tz;
use ics::components::{Parameter, Property as IcsProperty};
use ics::{ICalendar, Standard, ToDo};

use crate::component::{Component, ComponentKind, Property, PropertyKind, PropertyValue};
use crate::error::{Error, Result};
use crate::time::{CalendarTime, Zone};

/// Create an iCal file from a [`Component`]. The component must have a UID.
pub fn build_from(component: &Component) -> Result<String> {
    let uid = component.uid()
        .ok_or_else(|| Error::Ical(format!("Unable to build a {} without a UID", component.kind().name())))?;
    let dtstamp = match component.first_property(&PropertyKind::DtStamp).map(Property::value) {
        Some(PropertyValue::Time(t)) => t.to_ical(),
        _ => CalendarTime::now_utc().to_ical(),
    };

    let properties = component.iter()
        .filter(|(kind, _)| matches!(kind, PropertyKind::Uid | PropertyKind::DtStamp) == false)
        .map(|(kind, prop)| encode_property(kind, prop));

    let mut calendar = ICalendar::new("2.0", super::default_prod_id());
    for timezone in timezones_of(component) {
        calendar.add_timezone(timezone);
    }
    match component.kind() {
        ComponentKind::Todo => {
            let mut todo = ToDo::new(uid, dtstamp);
            for prop in properties {
                todo.push(prop);
            }
            calendar.add_todo(todo);
        },
        ComponentKind::Event => {
            let mut event = ics::Event::new(uid, dtstamp);
            for prop in properties {
                event.push(prop);
            }
            calendar.add_event(event);
        },
    }

    Ok(calendar.to_string())
}

/// One `VTIMEZONE` per TZID the component refers to.
///
/// Each of them has a single `STANDARD` rule, with the UTC offset that is in force at the first date-time using it.
/// TZIDs that are not in the `chrono-tz` database are left without a definition.
fn timezones_of(component: &Component) -> Vec<ics::TimeZone<'static>> {
    let mut first_uses = BTreeMap::new();
    for (_kind, prop) in component.iter() {
        if let PropertyValue::Time(t) = prop.value() {
            if let (Zone::Named(tzid), Some(naive)) = (t.zone(), t.to_naive()) {
                first_uses.entry(tzid.clone()).or_insert((naive, t.to_ical()));
            }
        }
    }

    let mut timezones = Vec::new();
    for (tzid, (naive, dtstart)) in first_uses {
        let tz = match tzid.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                log::debug!("No VTIMEZONE written for unknown TZID {}", tzid);
                continue;
            },
        };
        let offset = match tz.from_local_datetime(&naive).earliest() {
            Some(local) => format_utc_offset(local.offset().fix().local_minus_utc()),
            None => {
                log::debug!("{} does not exist in {}, no VTIMEZONE written", dtstart, tzid);
                continue;
            },
        };
        timezones.push(ics::TimeZone::standard(tzid, Standard::new(dtstart, offset.clone(), offset)));
    }
    timezones
}

/// `+HHMM` or `-HHMM`
fn format_utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{}{:02}{:02}", sign, minutes / 60, minutes % 60)
}

fn encode_property(kind: &PropertyKind, prop: &Property) -> IcsProperty<'static> {
    let value = match prop.value() {
        PropertyValue::Text(text) => match kind {
            PropertyKind::Other(_) => text.clone(),
            _ => super::escape_text(text),
        },
        PropertyValue::Integer(i) => i.to_string(),
        PropertyValue::Time(t) => t.to_ical(),
    };

    let mut encoded = IcsProperty::new(kind.name().to_string(), value);
    if let PropertyValue::Time(t) = prop.value() {
        if t.is_date() {
            encoded.add(Parameter::new("VALUE", "DATE"));
        }
        if let Zone::Named(tzid) = t.zone() {
            encoded.add(Parameter::new("TZID", tzid.clone()));
        }
    }
    for (key, values) in prop.params() {
        encoded.add(Parameter::new(key.clone(), values.join(",")));
    }
    encoded
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{complete, new_todo, NewTodo};

    #[test]
    fn test_ical_from_task() {
        let fields = NewTodo { summary: "This is a task with ÜTF-8 characters, and a comma".to_string(), priority: 2, ..NewTodo::default() };
        let mut todo = new_todo(&fields, None).unwrap();
        todo.set_uid("some-uid");
        todo.replace_singleton(PropertyKind::DtStamp, CalendarTime::new(2021, 3, 21, 0, 16, 0, Zone::Utc));
        let now = chrono::Utc::now();
        complete(&mut todo, now);

        let ical = build_from(&todo).unwrap();
        assert!(ical.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ical.contains("BEGIN:VTODO\r\nUID:some-uid\r\nDTSTAMP:20210321T001600Z\r\n"));
        assert!(ical.contains("SUMMARY:This is a task with ÜTF-8 characters\\, and a comma\r\n"));
        assert!(ical.contains("STATUS:COMPLETED\r\n"));
        assert!(ical.contains("PERCENT-COMPLETE:100\r\n"));
        assert!(ical.contains(&format!("COMPLETED:{}\r\n", CalendarTime::from_utc(&now).to_ical())));

        let parsed = crate::ical::parse(&ical).unwrap();
        assert_eq!(parsed, todo);
    }

    #[test]
    fn test_ical_from_event() {
        let mut event = Component::new(ComponentKind::Event);
        event.set_uid("event-uid");
        event.set_summary("Lunch");
        event.set_dtstart(CalendarTime::new(2024, 6, 3, 12, 0, 0, Zone::Named("Europe/Paris".to_string())));
        event.set_dtend(CalendarTime::date(2024, 6, 4));

        let ical = build_from(&event).unwrap();
        assert!(ical.contains("BEGIN:VEVENT\r\n"));
        assert!(ical.contains("DTSTART;TZID=Europe/Paris:20240603T120000\r\n"));
        assert!(ical.contains("DTEND;VALUE=DATE:20240604\r\n"));

        let parsed = crate::ical::parse(&ical).unwrap();
        assert_eq!(parsed.dtstart(), event.dtstart());
        assert_eq!(parsed.dtend(), event.dtend());
    }

    #[test]
    fn named_zones_get_a_vtimezone() {
        let mut event = Component::new(ComponentKind::Event);
        event.set_uid("meeting");
        event.set_dtstart(CalendarTime::new(2024, 6, 3, 12, 0, 0, Zone::Named("CET".to_string())));
        event.set_dtend(CalendarTime::new(2024, 6, 3, 9, 0, 0, Zone::Named("EST".to_string())));

        let ical = build_from(&event).unwrap();
        assert!(ical.contains("BEGIN:VTIMEZONE\r\nTZID:CET\r\nBEGIN:STANDARD\r\nDTSTART:20240603T120000\r\nTZOFFSETFROM:+0200\r\nTZOFFSETTO:+0200\r\nEND:STANDARD\r\nEND:VTIMEZONE\r\n"));
        assert!(ical.contains("TZID:EST\r\n"));
        assert!(ical.contains("TZOFFSETTO:-0500\r\n"));
        assert!(ical.contains("DTSTART;TZID=CET:20240603T120000\r\n"));

        // Timezone definitions are not items
        let parsed = crate::ical::parse(&ical).unwrap();
        assert_eq!(parsed.dtstart(), event.dtstart());
    }

    #[test]
    fn utc_and_floating_times_need_no_vtimezone() {
        let mut todo = Component::new(ComponentKind::Todo);
        todo.set_uid("todo");
        todo.replace_singleton(PropertyKind::Due, CalendarTime::new(2024, 6, 3, 12, 0, 0, Zone::Utc));
        assert!(build_from(&todo).unwrap().contains("VTIMEZONE") == false);
        assert_eq!(format_utc_offset(-9000), "-0230");
    }

    #[test]
    fn test_uid_is_required() {
        let event = Component::new(ComponentKind::Event);
        assert!(build_from(&event).is_err());
    }
}
