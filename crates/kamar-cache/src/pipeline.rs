//! Two-level cache pipeline: raw XML artifacts to parsed JSON artifacts.
//!
//! Read paths check the derived JSON artifact first and only invoke the
//! parsers (which in turn go through the raw-XML cache) when the artifact
//! is missing or a refresh was requested.

use anyhow::{Context, Result};
use kamar_api::portal::{
    Calendar, LocalPortalApi, TimetableJson, XmlNode, find_calendar_days, find_start_times,
    find_timetable_data, keyed_by_week, parse_calendar, parse_periods, parse_timetable,
};
use tracing::instrument;

use crate::store::{CacheKind, CacheStore};

/// Loads the timetable, rebuilding the JSON artifact when it is missing or
/// a refresh was requested.
///
/// # Errors
///
/// Returns an error if fetching, parsing, or cache I/O fails.
pub async fn load_timetable(
    api: &impl LocalPortalApi,
    store: &CacheStore,
    refresh: bool,
) -> Result<TimetableJson> {
    if !refresh && store.exists(CacheKind::TimetableJson) {
        return store.load_json(CacheKind::TimetableJson);
    }
    convert_timetable(api, store, refresh).await
}

/// Rebuilds `timetable.json` from the raw timetable and period XML.
///
/// The raw responses go through the cache (`refresh` forces a refetch); the
/// parsed result is always persisted before being returned.
///
/// # Errors
///
/// Returns an error if fetching, parsing, or cache I/O fails.
#[instrument(skip_all)]
pub async fn convert_timetable(
    api: &impl LocalPortalApi,
    store: &CacheStore,
    refresh: bool,
) -> Result<TimetableJson> {
    let timetable_xml = store
        .fetch_or_load(CacheKind::TimetableXml, refresh, || api.fetch_timetable())
        .await?;
    let periods_xml = store
        .fetch_or_load(CacheKind::PeriodsXml, refresh, || api.fetch_periods())
        .await?;

    let timetable_tree = XmlNode::parse(&timetable_xml).context("invalid timetable XML")?;
    let periods_tree = XmlNode::parse(&periods_xml).context("invalid periods XML")?;

    let period_times = parse_periods(find_start_times(&periods_tree)?);
    let grid = find_timetable_data(&timetable_tree)?;
    let weeks = parse_timetable(grid, &period_times)?;

    let keyed = keyed_by_week(weeks);
    store.save_json(CacheKind::TimetableJson, &keyed)?;
    tracing::info!(
        weeks = keyed.len(),
        path = %store.path(CacheKind::TimetableJson).display(),
        "timetable converted"
    );
    Ok(keyed)
}

/// Loads the calendar, rebuilding the JSON artifact when it is missing or
/// a refresh was requested.
///
/// # Errors
///
/// Returns an error if fetching, parsing, or cache I/O fails.
pub async fn load_calendar(
    api: &impl LocalPortalApi,
    store: &CacheStore,
    refresh: bool,
) -> Result<Calendar> {
    if !refresh && store.exists(CacheKind::CalendarJson) {
        return store.load_json(CacheKind::CalendarJson);
    }
    convert_calendar(api, store, refresh).await
}

/// Rebuilds `calendar.json` from the raw calendar XML.
///
/// # Errors
///
/// Returns an error if fetching, parsing, or cache I/O fails.
#[instrument(skip_all)]
pub async fn convert_calendar(
    api: &impl LocalPortalApi,
    store: &CacheStore,
    refresh: bool,
) -> Result<Calendar> {
    let calendar_xml = store
        .fetch_or_load(CacheKind::CalendarXml, refresh, || api.fetch_calendar())
        .await?;

    let calendar_tree = XmlNode::parse(&calendar_xml).context("invalid calendar XML")?;
    let days = find_calendar_days(&calendar_tree)?;
    let calendar = parse_calendar(days)?;

    store.save_json(CacheKind::CalendarJson, &calendar)?;
    tracing::info!(
        days = calendar.days.len(),
        path = %store.path(CacheKind::CalendarJson).display(),
        "calendar converted"
    );
    Ok(calendar)
}
