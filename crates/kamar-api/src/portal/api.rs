//! `PortalApi` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;

/// Parent portal API trait.
///
/// Abstracts the raw fetch operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(PortalApi: Send)]
pub trait LocalPortalApi {
    /// Fetches the raw timetable XML (`GetStudentTimetable`).
    ///
    /// # Errors
    ///
    /// Returns an error if login or the HTTP request fails.
    async fn fetch_timetable(&self) -> Result<String>;

    /// Fetches the raw period start-time XML (`GetGlobals`).
    ///
    /// # Errors
    ///
    /// Returns an error if login or the HTTP request fails.
    async fn fetch_periods(&self) -> Result<String>;

    /// Fetches the raw calendar XML (`GetCalendar`).
    ///
    /// # Errors
    ///
    /// Returns an error if login or the HTTP request fails.
    async fn fetch_calendar(&self) -> Result<String>;
}
