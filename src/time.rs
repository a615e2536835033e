//! Conversions between UNIX timestamps and iCal time values

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};
use crate::traits::{TimezoneLookup, WallClock};

/// The timezone a [`CalendarTime`] is expressed in
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Zone {
    /// No timezone at all ("floating" time in RFC5545)
    Floating,
    Utc,
    /// A named timezone, given by its TZID
    Named(String),
}

impl From<Tz> for Zone {
    fn from(tz: Tz) -> Self {
        if tz == Tz::UTC {
            Zone::Utc
        } else {
            Zone::Named(tz.name().to_string())
        }
    }
}

/// A date and time, as stored in an iCal property.
///
/// The fields are not validated: a value coming from a backend may describe a date that does not exist.
/// [`CalendarTime::null`] is a distinguished value that describes no date at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CalendarTime {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    /// Whether this is a `VALUE=DATE` value, that has no time part
    is_date: bool,
    zone: Zone,
}

impl CalendarTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32, zone: Zone) -> Self {
        Self { year, month, day, hour, minute, second, is_date: false, zone }
    }

    /// A date without a time part
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day, hour: 0, minute: 0, second: 0, is_date: true, zone: Zone::Floating }
    }

    /// The "null time", that is different from any real instant
    pub fn null() -> Self {
        Self::new(0, 0, 0, 0, 0, 0, Zone::Floating)
    }

    pub fn from_naive(dt: &NaiveDateTime, zone: Zone) -> Self {
        Self::new(dt.year(), dt.month(), dt.day(), dt.hour(), dt.minute(), dt.second(), zone)
    }

    pub fn from_utc(dt: &DateTime<Utc>) -> Self {
        Self::from_naive(&dt.naive_utc(), Zone::Utc)
    }

    pub fn now_utc() -> Self {
        Self::from_utc(&Utc::now())
    }

    pub fn is_null(&self) -> bool {
        self.year == 0 && self.month == 0 && self.day == 0
    }

    pub fn year(&self) -> i32    { self.year   }
    pub fn month(&self) -> u32   { self.month  }
    pub fn day(&self) -> u32     { self.day    }
    pub fn hour(&self) -> u32    { self.hour   }
    pub fn minute(&self) -> u32  { self.minute }
    pub fn second(&self) -> u32  { self.second }
    pub fn is_date(&self) -> bool { self.is_date }
    pub fn zone(&self) -> &Zone  { &self.zone  }

    /// Returns the wall-clock date and time, or `None` in case the fields do not form a valid date
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        if self.is_null() {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, self.second)
    }

    /// Returns the instant this value describes.
    /// Floating times (and unknown TZIDs) describe no instant.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let naive = self.to_naive()?;
        match &self.zone {
            Zone::Utc => Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)),
            Zone::Named(tzid) => {
                let tz: Tz = tzid.parse().ok()?;
                tz.from_local_datetime(&naive).earliest().map(|dt| dt.with_timezone(&Utc))
            },
            Zone::Floating => None,
        }
    }

    /// Parse an iCal value (`YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]`)
    pub fn from_ical(value: &str, tzid: Option<&str>) -> Result<Self> {
        let value = value.trim();
        let invalid = || Error::InvalidDate(format!("invalid iCal date-time value {:?}", value));
        let digits = |range: std::ops::Range<usize>| -> Result<u32> {
            let part = value.get(range).ok_or_else(invalid)?;
            if part.bytes().all(|b| b.is_ascii_digit()) == false {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        let year = digits(0..4)? as i32;
        let month = digits(4..6)?;
        let day = digits(6..8)?;
        if value.len() == 8 {
            return Ok(Self::date(year, month, day));
        }

        if value.get(8..9) != Some("T") {
            return Err(invalid());
        }
        let hour = digits(9..11)?;
        let minute = digits(11..13)?;
        let second = digits(13..15)?;
        let zone = match (value.get(15..), tzid) {
            (Some("Z"), _) => Zone::Utc,
            (Some(""), Some(tzid)) => Zone::Named(tzid.to_string()),
            (Some(""), None) => Zone::Floating,
            _ => return Err(invalid()),
        };
        Ok(Self::new(year, month, day, hour, minute, second, zone))
    }

    /// Format this value the way iCal properties expect it (without any TZID, that is a parameter)
    pub fn to_ical(&self) -> String {
        if self.is_date {
            return format!("{:04}{:02}{:02}", self.year, self.month, self.day);
        }
        let suffix = if self.zone == Zone::Utc { "Z" } else { "" };
        format!("{:04}{:02}{:02}T{:02}{:02}{:02}{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, suffix)
    }
}

impl Display for CalendarTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.zone {
            Zone::Named(tzid) => write!(f, "{} ({})", self.to_ical(), tzid),
            _ => write!(f, "{}", self.to_ical()),
        }
    }
}


/// Convert a UNIX timestamp to a local-time `CalendarTime`.
///
/// The value keeps the local wall-clock fields. It is tagged with the builtin timezone that has the
/// local zone's short name, or with UTC when there is no such timezone. In the latter case the fields are
/// *not* converted, so the value describes another instant than `timestamp` (unless the local zone is UTC).
pub fn to_calendar_time<C, L>(timestamp: i64, clock: &C, timezones: &L) -> Result<CalendarTime>
where
    C: WallClock + ?Sized,
    L: TimezoneLookup + ?Sized,
{
    let (local, short_name) = clock.local_wall_clock(timestamp)
        .ok_or_else(|| Error::InvalidDate(format!("timestamp {} is out of range", timestamp)))?;

    let zone = match timezones.builtin_timezone(&short_name) {
        Some(tz) => Zone::from(tz),
        None => {
            log::debug!("No builtin timezone named {:?}, tagging local time {} as UTC", short_name, local);
            Zone::from(timezones.utc_timezone())
        },
    };
    Ok(CalendarTime::from_naive(&local, zone))
}

/// Format a `CalendarTime` as an ISO-8601 local date-time (e.g. `2024-03-01T09:30:00`).
///
/// Returns `None` for the null time, and for fields that do not form a valid date.
pub fn to_iso(time: &CalendarTime) -> Option<String> {
    if time.year() < 1 || time.year() > 9999 {
        return None;
    }
    time.to_naive()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}


/// Timezones known to the `chrono-tz` database, looked up by their exact name
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinTimezones;

impl TimezoneLookup for BuiltinTimezones {
    fn builtin_timezone(&self, name: &str) -> Option<Tz> {
        name.parse::<Tz>().ok()
    }

    fn utc_timezone(&self) -> Tz {
        Tz::UTC
    }
}

/// A wall clock that always uses the same timezone
#[derive(Clone, Copy, Debug)]
pub struct FixedZoneClock(pub Tz);

impl WallClock for FixedZoneClock {
    fn local_wall_clock(&self, timestamp: i64) -> Option<(NaiveDateTime, String)> {
        let dt = self.0.timestamp_opt(timestamp, 0).single()?;
        Some((dt.naive_local(), dt.format("%Z").to_string()))
    }
}

/// The wall clock of this process.
///
/// The local timezone is taken from `TZ`, then from the `/etc/localtime` link.
/// When neither names a known timezone, `chrono::Local` is used: its short name is a numeric offset, that never matches a builtin timezone.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    zone: Option<Tz>,
}

impl SystemClock {
    pub fn new() -> Self {
        let zone = detect_local_zone();
        log::debug!("Local timezone: {:?}", zone);
        Self { zone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl WallClock for SystemClock {
    fn local_wall_clock(&self, timestamp: i64) -> Option<(NaiveDateTime, String)> {
        match self.zone {
            Some(tz) => FixedZoneClock(tz).local_wall_clock(timestamp),
            None => {
                let dt = Local.timestamp_opt(timestamp, 0).single()?;
                Some((dt.naive_local(), dt.format("%Z").to_string()))
            },
        }
    }
}

fn detect_local_zone() -> Option<Tz> {
    if let Ok(tz) = std::env::var("TZ") {
        if let Ok(tz) = tz.trim_start_matches(':').parse::<Tz>() {
            return Some(tz);
        }
    }

    let target = std::fs::read_link("/etc/localtime").ok()?;
    let target = target.to_string_lossy();
    let marker = "zoneinfo/";
    let start = target.find(marker)? + marker.len();
    target[start..].parse::<Tz>().ok()
}
