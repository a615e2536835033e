//! A module to parse iCal files

use ical::parser::ical::component::{IcalCalendar, IcalEvent, IcalTodo};

use crate::component::{Component, ComponentKind, Property, PropertyKind, PropertyValue};
use crate::error::{Error, Result};
use crate::time::CalendarTime;


/// Parse an iCal file that contains a single `VEVENT` or `VTODO`
///
/// `VTIMEZONE` definitions are skipped. The `ical` crate trims property values, so TEXT values lose their trailing whitespace.
pub fn parse(content: &str) -> Result<Component> {
    let mut reader = ical::IcalParser::new(content.as_bytes());
    let parsed_item = match reader.next() {
        None => return Err(Error::Ical("Invalid iCal data to parse".into())),
        Some(item) => match item {
            Err(err) => return Err(Error::Ical(format!("Unable to parse iCal data: {}", err))),
            Ok(item) => item,
        }
    };

    let (kind, properties) = match assert_single_type(&parsed_item)? {
        CurrentType::Event(event) => (ComponentKind::Event, &event.properties),
        CurrentType::Todo(todo) => (ComponentKind::Todo, &todo.properties),
    };

    let mut component = Component::new(kind);
    for prop in properties {
        let (kind, property) = decode_property(prop);
        component.add_property(kind, property);
    }

    // What to do with multiple items?
    if reader.next().map(|r| r.is_ok()) == Some(true) {
        return Err(Error::Ical("Parsing multiple items are not supported".into()));
    }

    Ok(component)
}

fn decode_property(prop: &ical::property::Property) -> (PropertyKind, Property) {
    let kind = PropertyKind::from_name(&prop.name);
    let mut params = prop.params.clone().unwrap_or_default();
    let raw = prop.value.clone().unwrap_or_default();

    let value = if kind.is_time() {
        let tzid = params.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("TZID"))
            .and_then(|(_, values)| values.first())
            .map(String::as_str);
        match CalendarTime::from_ical(&raw, tzid) {
            Ok(time) => {
                // These are derived from the value when building the iCal file again
                params.retain(|(key, _)| key.eq_ignore_ascii_case("TZID") == false && key.eq_ignore_ascii_case("VALUE") == false);
                PropertyValue::Time(time)
            },
            Err(err) => {
                log::warn!("Keeping {} as text: {}", kind, err);
                PropertyValue::Text(raw)
            },
        }
    } else if kind.is_integer() {
        match raw.parse::<i64>() {
            Ok(i) => PropertyValue::Integer(i),
            Err(_) => PropertyValue::Text(raw),
        }
    } else if let PropertyKind::Other(_) = kind {
        // Unknown properties may not be TEXT values, they are written back verbatim
        PropertyValue::Text(raw)
    } else {
        PropertyValue::Text(super::unescape_text(&raw))
    };

    (kind, Property::with_params(value, params))
}

enum CurrentType<'a> {
    Event(&'a IcalEvent),
    Todo(&'a IcalTodo),
}

fn assert_single_type<'a>(item: &'a IcalCalendar) -> Result<CurrentType<'a>> {
    let n_events = item.events.len();
    let n_todos = item.todos.len();
    let n_journals = item.journals.len();

    if n_events == 1 && n_todos == 0 && n_journals == 0 {
        return Ok(CurrentType::Event(&item.events[0]));
    }

    if n_todos == 1 && n_events == 0 && n_journals == 0 {
        return Ok(CurrentType::Todo(&item.todos[0]));
    }

    Err(Error::Ical("Only a single TODO or a single EVENT is supported".into()))
}


#[cfg(test)]
mod test {
    const EXAMPLE_ICAL: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//Nextcloud Tasks v0.13.6\r
BEGIN:VTODO\r
UID:0633de27-8c32-42be-bcb8-63bc879c6185\r
CREATED:20210321T001600\r
LAST-MODIFIED:20210321T001600\r
DTSTAMP:20210321T001600\r
SUMMARY:Do not forget to do this\\, really\r
DUE;TZID=Europe/Paris:20210401T120000\r
PRIORITY:3\r
PERCENT-COMPLETE:45\r
STATUS:IN-PROCESS\r
END:VTODO\r
END:VCALENDAR\r
";

    const EXAMPLE_MULTIPLE_ICAL: &str = "BEGIN:VCALENDAR\r
VERSION:2.0\r
PRODID:-//Nextcloud Tasks v0.13.6\r
BEGIN:VTODO\r
UID:0633de27-8c32-42be-bcb8-63bc879c6185\r
SUMMARY:Call Mom\r
END:VTODO\r
BEGIN:VEVENT\r
UID:0633de27-8c32-42be-bcb8-63bc879c6186\r
SUMMARY:Visit Mom\r
END:VEVENT\r
END:VCALENDAR\r
";

    use super::*;
    use crate::task::TodoStatus;
    use crate::time::{to_iso, Zone};

    #[test]
    fn test_ical_parsing() {
        let todo = parse(EXAMPLE_ICAL).unwrap();

        assert!(todo.is_todo());
        assert_eq!(todo.uid(), Some("0633de27-8c32-42be-bcb8-63bc879c6185"));
        assert_eq!(todo.summary(), Some("Do not forget to do this, really"));
        assert_eq!(todo.todo_status(), TodoStatus::InProcess);
        assert_eq!(todo.priority(), 3);
        assert_eq!(todo.percent_complete(), 45);

        let due = todo.due().unwrap();
        assert_eq!(due.zone(), &Zone::Named("Europe/Paris".to_string()));
        assert_eq!(to_iso(due).unwrap(), "2021-04-01T12:00:00");
        assert!(todo.first_property(&PropertyKind::Due).unwrap().params().is_empty());

        let created = todo.first_property(&PropertyKind::Other("CREATED".to_string())).unwrap();
        assert_eq!(created.value(), &PropertyValue::Text("20210321T001600".to_string()));
    }

    #[test]
    fn test_multiple_items_in_ical() {
        assert!(parse(EXAMPLE_MULTIPLE_ICAL).is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn trailing_whitespace_is_trimmed() {
        let mut todo = Component::new(ComponentKind::Todo);
        todo.set_uid("groceries");
        todo.set_summary("Milk, ");
        let parsed = parse(&crate::ical::build_from(&todo).unwrap()).unwrap();
        assert_eq!(parsed.summary(), Some("Milk,"));
    }
}
