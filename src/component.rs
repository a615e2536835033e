//! Calendar components (iCal `VEVENT` and `VTODO` items) and their properties

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use crate::task::TodoStatus;
use crate::time::CalendarTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// A calendar event (`VEVENT`)
    Event,
    /// A to-do item (`VTODO`)
    Todo,
}

impl ComponentKind {
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Event => "VEVENT",
            ComponentKind::Todo => "VTODO",
        }
    }
}

/// The kinds of properties this crate knows about. Any other property is kept as `Other`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKind {
    Uid,
    DtStamp,
    Summary,
    Description,
    Location,
    DtStart,
    DtEnd,
    Due,
    Status,
    Priority,
    PercentComplete,
    Completed,
    Other(String),
}

impl PropertyKind {
    /// The iCal name of this property
    pub fn name(&self) -> &str {
        match self {
            PropertyKind::Uid => "UID",
            PropertyKind::DtStamp => "DTSTAMP",
            PropertyKind::Summary => "SUMMARY",
            PropertyKind::Description => "DESCRIPTION",
            PropertyKind::Location => "LOCATION",
            PropertyKind::DtStart => "DTSTART",
            PropertyKind::DtEnd => "DTEND",
            PropertyKind::Due => "DUE",
            PropertyKind::Status => "STATUS",
            PropertyKind::Priority => "PRIORITY",
            PropertyKind::PercentComplete => "PERCENT-COMPLETE",
            PropertyKind::Completed => "COMPLETED",
            PropertyKind::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "UID" => PropertyKind::Uid,
            "DTSTAMP" => PropertyKind::DtStamp,
            "SUMMARY" => PropertyKind::Summary,
            "DESCRIPTION" => PropertyKind::Description,
            "LOCATION" => PropertyKind::Location,
            "DTSTART" => PropertyKind::DtStart,
            "DTEND" => PropertyKind::DtEnd,
            "DUE" => PropertyKind::Due,
            "STATUS" => PropertyKind::Status,
            "PRIORITY" => PropertyKind::Priority,
            "PERCENT-COMPLETE" => PropertyKind::PercentComplete,
            "COMPLETED" => PropertyKind::Completed,
            other => PropertyKind::Other(other.to_string()),
        }
    }

    /// Whether values of this property are date-times
    pub fn is_time(&self) -> bool {
        matches!(self,
            PropertyKind::DtStamp | PropertyKind::DtStart | PropertyKind::DtEnd
            | PropertyKind::Due | PropertyKind::Completed)
    }

    /// Whether values of this property are integers
    pub fn is_integer(&self) -> bool {
        matches!(self, PropertyKind::Priority | PropertyKind::PercentComplete)
    }
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Time(CalendarTime),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&CalendarTime> {
        match self {
            PropertyValue::Time(t) => Some(t),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self { PropertyValue::Text(s.to_string()) }
}
impl From<String> for PropertyValue {
    fn from(s: String) -> Self { PropertyValue::Text(s) }
}
impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self { PropertyValue::Integer(i) }
}
impl From<u8> for PropertyValue {
    fn from(i: u8) -> Self { PropertyValue::Integer(i64::from(i)) }
}
impl From<CalendarTime> for PropertyValue {
    fn from(t: CalendarTime) -> Self { PropertyValue::Time(t) }
}

/// A single property value, with its iCal parameters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    value: PropertyValue,
    params: Vec<(String, Vec<String>)>,
}

impl Property {
    pub fn new<V: Into<PropertyValue>>(value: V) -> Self {
        Self { value: value.into(), params: Vec::new() }
    }

    pub fn with_params<V: Into<PropertyValue>>(value: V, params: Vec<(String, Vec<String>)>) -> Self {
        Self { value: value.into(), params }
    }

    pub fn value(&self) -> &PropertyValue { &self.value }
    pub fn params(&self) -> &[(String, Vec<String>)] { &self.params }

    /// Returns the first value of a parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}


/// A `VEVENT` or a `VTODO`.
///
/// Properties are stored by kind. A kind may have several values, e.g. when a backend returned such a component,
/// but properties that are singletons by nature are always written with [`Component::replace_singleton`].
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    kind: ComponentKind,
    properties: BTreeMap<PropertyKind, Vec<Property>>,
}

impl Component {
    pub fn new(kind: ComponentKind) -> Self {
        Self { kind, properties: BTreeMap::new() }
    }

    pub fn kind(&self) -> ComponentKind { self.kind }
    pub fn is_todo(&self) -> bool { self.kind == ComponentKind::Todo }
    pub fn is_event(&self) -> bool { self.kind == ComponentKind::Event }

    /// Every value of a property kind, in insertion order
    pub fn properties(&self, kind: &PropertyKind) -> &[Property] {
        self.properties.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_property(&self, kind: &PropertyKind) -> Option<&Property> {
        self.properties(kind).first()
    }

    /// Iterate over every property of this component
    pub fn iter(&self) -> impl Iterator<Item = (&PropertyKind, &Property)> {
        self.properties.iter()
            .flat_map(|(kind, props)| props.iter().map(move |p| (kind, p)))
    }

    /// Append a property, keeping any previous value of this kind
    pub fn add_property(&mut self, kind: PropertyKind, property: Property) {
        self.properties.entry(kind).or_insert_with(Vec::new).push(property);
    }

    /// Remove every value of a property kind. Returns how many values have been removed
    pub fn remove_properties(&mut self, kind: &PropertyKind) -> usize {
        self.properties.remove(kind).map(|props| props.len()).unwrap_or(0)
    }

    /// Replace every value of a property kind with a single one.
    ///
    /// After this call, `kind` has exactly one value, whatever count it had before.
    pub fn replace_singleton<V: Into<PropertyValue>>(&mut self, kind: PropertyKind, value: V) {
        self.properties.insert(kind, vec![Property::new(value)]);
    }

    fn text(&self, kind: &PropertyKind) -> Option<&str> {
        self.first_property(kind).and_then(|p| p.value().as_text())
    }

    fn time(&self, kind: &PropertyKind) -> Option<&CalendarTime> {
        self.first_property(kind).and_then(|p| p.value().as_time())
    }

    pub fn uid(&self) -> Option<&str>         { self.text(&PropertyKind::Uid)         }
    pub fn summary(&self) -> Option<&str>     { self.text(&PropertyKind::Summary)     }
    pub fn description(&self) -> Option<&str> { self.text(&PropertyKind::Description) }
    pub fn location(&self) -> Option<&str>    { self.text(&PropertyKind::Location)    }
    pub fn dtstart(&self) -> Option<&CalendarTime>   { self.time(&PropertyKind::DtStart)   }
    pub fn dtend(&self) -> Option<&CalendarTime>     { self.time(&PropertyKind::DtEnd)     }
    pub fn due(&self) -> Option<&CalendarTime>       { self.time(&PropertyKind::Due)       }
    pub fn completed(&self) -> Option<&CalendarTime> { self.time(&PropertyKind::Completed) }

    pub fn set_uid(&mut self, uid: &str)                 { self.replace_singleton(PropertyKind::Uid, uid)                 }
    pub fn set_summary(&mut self, summary: &str)         { self.replace_singleton(PropertyKind::Summary, summary)         }
    pub fn set_description(&mut self, description: &str) { self.replace_singleton(PropertyKind::Description, description) }
    pub fn set_location(&mut self, location: &str)       { self.replace_singleton(PropertyKind::Location, location)       }
    pub fn set_dtstart(&mut self, time: CalendarTime)    { self.replace_singleton(PropertyKind::DtStart, time)            }
    pub fn set_dtend(&mut self, time: CalendarTime)      { self.replace_singleton(PropertyKind::DtEnd, time)              }
    pub fn set_due(&mut self, time: CalendarTime)        { self.replace_singleton(PropertyKind::Due, time)                }

    /// Returns the uid of this component, after assigning a random one in case it had none
    pub fn ensure_uid(&mut self) -> String {
        if let Some(uid) = self.uid() {
            return uid.to_string();
        }
        let uid = uuid::Uuid::new_v4().to_hyphenated().to_string();
        self.set_uid(&uid);
        uid
    }

    /// The raw `STATUS` value
    pub fn status(&self) -> Option<&str> {
        self.text(&PropertyKind::Status)
    }

    pub fn set_status(&mut self, status: TodoStatus) {
        self.replace_singleton(PropertyKind::Status, status.as_str());
    }

    /// The to-do status, `NEEDS-ACTION` when absent or unrecognized
    pub fn todo_status(&self) -> TodoStatus {
        self.status()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// The priority (0 means undefined). Values outside 0-9 are reported as 0
    pub fn priority(&self) -> u8 {
        self.first_property(&PropertyKind::Priority)
            .and_then(|p| p.value().as_integer())
            .and_then(|i| u8::try_from(i).ok())
            .filter(|p| *p <= 9)
            .unwrap_or(0)
    }

    /// The priority as written in the raw property, even if it was not stored as a well-formed integer
    pub fn raw_priority(&self) -> Option<u8> {
        match self.first_property(&PropertyKind::Priority)?.value() {
            PropertyValue::Integer(i) => u8::try_from(*i).ok(),
            PropertyValue::Text(t) => t.trim().parse().ok(),
            PropertyValue::Time(_) => None,
        }
    }

    pub fn set_priority(&mut self, priority: u8) {
        self.replace_singleton(PropertyKind::Priority, priority);
    }

    /// The percent-complete (0 when absent)
    pub fn percent_complete(&self) -> u8 {
        self.first_property(&PropertyKind::PercentComplete)
            .and_then(|p| p.value().as_integer())
            .and_then(|i| u8::try_from(i).ok())
            .unwrap_or(0)
    }
}
