//! Normalized schedule domain model.
//!
//! Models are immutable after construction: parsers build them once per
//! fetch-or-cache-load cycle and the cache layer persists them; readers
//! work from the deserialized artifacts, never from a live parse.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::error::PortalError;

/// School weekdays, Monday through Friday, in timetable order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Weekday {
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
}

impl Weekday {
    /// All five weekdays in timetable order.
    pub const ALL: [Self; 5] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
    ];

    /// English weekday name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|day| day.as_str().eq_ignore_ascii_case(s))
            .with_context(|| format!("unknown weekday: {s}"))
    }
}

/// One scheduled class in one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSlot {
    /// Start time as supplied by the portal (e.g. `8:40`).
    pub period_time: String,
    /// Raw class label for that slot.
    pub class_name: String,
}

/// A single timetabled day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// Weekday this day falls on.
    pub name: Weekday,
    /// Start time of the first period.
    pub start: String,
    /// Start time of the last period.
    pub end: String,
    /// Periods in the order they were scheduled.
    pub periods: Vec<PeriodSlot>,
}

impl Day {
    /// Builds a day from its surviving periods.
    ///
    /// `start`/`end` come from the first and last period in insertion
    /// order, not from a chronological sort.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::MalformedSchedule` when `periods` is empty.
    pub fn new(name: Weekday, periods: Vec<PeriodSlot>) -> Result<Self, PortalError> {
        let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
            return Err(PortalError::MalformedSchedule(format!(
                "{name} has no timetabled periods"
            )));
        };

        let start = first.period_time.clone();
        let end = last.period_time.clone();
        Ok(Self {
            name,
            start,
            end,
            periods,
        })
    }
}

/// One week of the timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    /// 1-based position of this week in the timetable grid.
    pub week_number: u32,
    /// The five weekdays of this week.
    pub days: BTreeMap<Weekday, Day>,
}

impl Week {
    /// Lookup key used in the JSON artifact (`"W{n}"`).
    #[must_use]
    pub fn key(&self) -> String {
        format!("W{}", self.week_number)
    }
}

/// Timetable JSON artifact: weeks keyed `"W{n}"`.
pub type TimetableJson = BTreeMap<String, Week>;

/// Builds the keyed artifact form from parsed weeks.
#[must_use]
pub fn keyed_by_week(weeks: Vec<Week>) -> TimetableJson {
    weeks.into_iter().map(|week| (week.key(), week)).collect()
}

/// One calendar day record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    /// ISO-8601 date (`2024-03-12`).
    pub date: String,
    /// Day status (school day, holiday, weekend, ...).
    pub status: Option<String>,
    /// Timetable week number within the year, `None` outside term time.
    pub week: Option<String>,
    /// Term identifier.
    pub term: Option<String>,
    /// Timetabled weekday name.
    pub weekday: Option<String>,
    /// Week number within the term.
    pub term_week: Option<String>,
}

/// Parsed calendar: by-date index plus by-week grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Every known day, keyed by ISO date.
    pub days: BTreeMap<String, CalendarDay>,
    /// Days grouped by timetable week number, in document order.
    pub weeks: BTreeMap<String, Vec<CalendarDay>>,
}

impl Calendar {
    /// Resolves the timetable week number for the given ISO date.
    #[must_use]
    pub fn week_for_date(&self, date: &str) -> Option<&str> {
        self.days.get(date).and_then(|day| day.week.as_deref())
    }
}
