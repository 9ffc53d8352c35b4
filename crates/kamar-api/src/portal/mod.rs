//! KAMAR parent portal API client module.
//!
//! Handles form-encoded command requests to the portal endpoint and turns
//! the XML payloads into the normalized schedule model.

mod api;
mod client;
mod dom;
mod error;
mod model;
mod parse;
pub(crate) mod xml;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalPortalApi, PortalApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{PortalClient, PortalClientBuilder};
pub use dom::XmlNode;
#[allow(clippy::module_name_repetitions)]
pub use error::{PortalError, Resource};
pub use model::{
    Calendar, CalendarDay, Day, PeriodSlot, TimetableJson, Week, Weekday, keyed_by_week,
};
pub use parse::{
    find_calendar_days, find_start_times, find_timetable_data, parse_calendar, parse_periods,
    parse_timetable,
};
