//! Terminal table rendering for a timetable week.

use chrono::NaiveTime;
use kamar_api::portal::{CalendarDay, Week, Weekday};

/// Extracts the Monday..Friday dates for a calendar week.
///
/// Calendar weeks run Sunday through Saturday; the weekend bounds are
/// dropped. Shorter weeks lose their first and last entries all the same.
#[must_use]
pub fn weekday_dates(days: &[CalendarDay]) -> Vec<String> {
    let count = days.len();
    days.iter()
        .map(|day| day.date.clone())
        .skip(1)
        .take(count.saturating_sub(2))
        .collect()
}

/// Short `dd/mm` form of an ISO date.
fn short_date(date: &str) -> String {
    let mut parts = date.splitn(3, '-');
    let _year = parts.next();
    match (parts.next(), parts.next()) {
        (Some(month), Some(day)) => format!("{day}/{month}"),
        _ => String::from(date),
    }
}

/// Presentable form of a raw class label.
///
/// Labels pack `level-line-subject-teacher-room`; only the last three
/// segments are shown. Labels without them render as an empty cell (breaks,
/// before/after school, or the continuation of a class).
fn format_class(raw: &str) -> String {
    let parts: Vec<&str> = raw.split('-').collect();
    match parts.get(2..) {
        Some([subject, teacher, room]) => format!("{subject} - {teacher} - {room}"),
        _ => String::new(),
    }
}

/// Parses a `H:MM` clock time; unparsable values sort first.
fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Distinct start times across the week, sorted chronologically.
fn collect_times(week: &Week) -> Vec<String> {
    let mut times: Vec<String> = week
        .days
        .values()
        .flat_map(|day| day.periods.iter().map(|slot| slot.period_time.clone()))
        .collect();
    times.sort_unstable();
    times.dedup();
    times.sort_by_key(|time| parse_time(time));
    times
}

/// Renders one week as aligned text lines: a title, a header of weekday
/// columns, and one row per distinct start time.
#[must_use]
pub fn render_week(week: &Week, week_number: u32, dates: &[String]) -> Vec<String> {
    let times = collect_times(week);

    let mut header: Vec<String> = vec![String::from("Time")];
    for (index, weekday) in Weekday::ALL.iter().enumerate() {
        match dates.get(index) {
            Some(date) => header.push(format!("{weekday} ({})", short_date(date))),
            None => header.push(weekday.to_string()),
        }
    }

    let mut rows: Vec<Vec<String>> = vec![header];
    for time in &times {
        let mut row = vec![time.clone()];
        for weekday in &Weekday::ALL {
            let cell = week
                .days
                .get(weekday)
                .and_then(|day| day.periods.iter().find(|slot| slot.period_time == *time))
                .map_or_else(String::new, |slot| format_class(&slot.class_name));
            row.push(cell);
        }
        rows.push(row);
    }

    layout(&rows, week_number)
}

/// Pads rows into aligned columns under a title line.
fn layout(rows: &[Vec<String>], week_number: u32) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let mut lines = vec![format!("Timetable - Week {week_number}")];
    for row in rows {
        let line = row
            .iter()
            .enumerate()
            .map(|(index, cell)| {
                let width = widths.get(index).copied().unwrap_or(0);
                format!("{cell:<width$}")
            })
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(String::from(line.trim_end()));
    }
    lines
}
