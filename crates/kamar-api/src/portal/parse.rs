//! XML-to-domain-model parsers for the portal payloads.

use std::collections::BTreeMap;

use super::dom::XmlNode;
use super::error::PortalError;
use super::model::{Calendar, CalendarDay, Day, PeriodSlot, Week, Weekday};

/// Number of header rows preceding week data in `TimetableData`.
const HEADER_ROWS: usize = 3;

/// Locates the `StartTimes` container in a `GetGlobals` response tree.
///
/// # Errors
///
/// Returns `PortalError::MissingData` when the container is absent.
pub fn find_start_times(root: &XmlNode) -> Result<&XmlNode, PortalError> {
    root.find("StartTimes")
        .ok_or_else(|| PortalError::MissingData(String::from("StartTimes")))
}

/// Locates the `TimetableData` grid in a `GetStudentTimetable` response tree.
///
/// The grid sits under `Students` -> first student entry -> `TimetableData`.
///
/// # Errors
///
/// Returns `PortalError::MissingData` when any link of that chain is absent.
pub fn find_timetable_data(root: &XmlNode) -> Result<&XmlNode, PortalError> {
    let students = root
        .find("Students")
        .ok_or_else(|| PortalError::MissingData(String::from("Students")))?;
    let student = students
        .children
        .first()
        .ok_or_else(|| PortalError::MissingData(String::from("Students/Student")))?;
    student
        .find("TimetableData")
        .ok_or_else(|| PortalError::MissingData(String::from("TimetableData")))
}

/// Locates the `Days` container in a `GetCalendar` response tree.
///
/// # Errors
///
/// Returns `PortalError::MissingData` when the container is absent.
pub fn find_calendar_days(root: &XmlNode) -> Result<&XmlNode, PortalError> {
    root.find("Days")
        .ok_or_else(|| PortalError::MissingData(String::from("Days")))
}

/// Extracts the per-weekday period start times from the `StartTimes` element.
///
/// One list per weekday in document order; every time string passes through
/// verbatim and slots without text stay `None` at their position. Nothing is
/// deduplicated, sorted, or validated here.
#[must_use]
pub fn parse_periods(start_times: &XmlNode) -> Vec<Vec<Option<String>>> {
    start_times
        .children
        .iter()
        .map(|day| day.children.iter().map(|slot| slot.text.clone()).collect())
        .collect()
}

/// Splits a packed day row (`|cls1|cls2|`) into its class labels.
///
/// The first and last segments are boundary artifacts of the delimiter
/// packing and are discarded.
fn split_class_row(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let count = trimmed.split('|').count();
    trimmed
        .split('|')
        .skip(1)
        .take(count.saturating_sub(2))
        .map(String::from)
        .collect()
}

/// Pairs class labels with start times by position.
///
/// Zip semantics: surplus entries on either side are dropped. A later entry
/// sharing an earlier entry's start time replaces its class label in place
/// (mapping construction, not a multi-map). Slots without a start time
/// represent unscheduled positions and produce no period.
fn pair_periods(times: &[Option<String>], labels: &[String]) -> Vec<PeriodSlot> {
    let mut slots: Vec<PeriodSlot> = Vec::new();
    for (time, label) in times.iter().zip(labels) {
        let Some(time) = time else { continue };
        if let Some(existing) = slots.iter_mut().find(|slot| slot.period_time == *time) {
            existing.class_name.clone_from(label);
        } else {
            slots.push(PeriodSlot {
                period_time: time.clone(),
                class_name: label.clone(),
            });
        }
    }
    slots
}

/// Parses the timetable grid into ordered weeks.
///
/// The grid's first three children are header rows; every following child is
/// one week holding one element per weekday, Monday through Friday. Week
/// numbers are assigned from parse order starting at 1 and are contiguous.
///
/// # Errors
///
/// Returns `PortalError::MalformedSchedule` when a week does not hold
/// exactly five weekday entries, or when a day ends up with no periods.
pub fn parse_timetable(
    timetable_data: &XmlNode,
    period_times: &[Vec<Option<String>>],
) -> Result<Vec<Week>, PortalError> {
    let mut weeks = Vec::new();

    for (week_el, week_number) in timetable_data
        .children
        .iter()
        .skip(HEADER_ROWS)
        .zip(1u32..)
    {
        if week_el.children.len() != Weekday::ALL.len() {
            return Err(PortalError::MalformedSchedule(format!(
                "week {week_number} has {} day entries, expected {}",
                week_el.children.len(),
                Weekday::ALL.len()
            )));
        }

        let mut days = BTreeMap::new();
        for (day_index, (weekday, day_el)) in
            Weekday::ALL.iter().zip(&week_el.children).enumerate()
        {
            let times = period_times
                .get(day_index)
                .map_or(&[] as &[Option<String>], Vec::as_slice);
            let labels = split_class_row(day_el.text.as_deref().unwrap_or(""));
            let periods = pair_periods(times, &labels);
            let day = Day::new(*weekday, periods).map_err(|err| {
                PortalError::MalformedSchedule(format!("week {week_number}: {err}"))
            })?;
            days.insert(*weekday, day);
        }

        weeks.push(Week { week_number, days });
    }

    Ok(weeks)
}

/// Parses calendar day entries into the by-date and by-week indexes.
///
/// Every entry with a `Date` lands in the by-date index; entries whose
/// `WeekYear` is present are additionally grouped under that week number in
/// document order.
///
/// # Errors
///
/// Returns `PortalError::MissingData` when a day entry carries no `Date`.
pub fn parse_calendar(days_el: &XmlNode) -> Result<Calendar, PortalError> {
    let mut calendar = Calendar::default();

    for day_el in &days_el.children {
        let date = day_el
            .child_text("Date")
            .ok_or_else(|| PortalError::MissingData(String::from("Days/Day/Date")))?
            .to_owned();

        let record = CalendarDay {
            date: date.clone(),
            status: day_el.child_text("Status").map(String::from),
            week: day_el.child_text("WeekYear").map(String::from),
            term: day_el.child_text("Term").map(String::from),
            weekday: day_el.child_text("DayTT").map(String::from),
            term_week: day_el.child_text("Week").map(String::from),
        };

        if let Some(week) = record.week.clone() {
            calendar.weeks.entry(week).or_default().push(record.clone());
        }
        calendar.days.insert(date, record);
    }

    Ok(calendar)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    /// Builds a `StartTimes` node: one child per weekday, one grandchild
    /// per period time (`None` becomes an empty element).
    fn start_times(days: &[&[Option<&str>]]) -> XmlNode {
        XmlNode {
            name: String::from("StartTimes"),
            text: None,
            children: days
                .iter()
                .map(|slots| XmlNode {
                    name: String::from("Day"),
                    text: None,
                    children: slots
                        .iter()
                        .map(|slot| XmlNode {
                            name: String::from("PeriodTime"),
                            text: slot.map(String::from),
                            children: Vec::new(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Builds a `TimetableData` node: three header rows, then one element
    /// per week, each with one packed row per weekday.
    fn timetable_data(weeks: &[&[&str]]) -> XmlNode {
        let mut children: Vec<XmlNode> = ["Label", "GridName", "Periods"]
            .iter()
            .map(|name| XmlNode {
                name: String::from(*name),
                text: Some(String::from("header")),
                children: Vec::new(),
            })
            .collect();

        for (index, days) in weeks.iter().enumerate() {
            children.push(XmlNode {
                name: format!("W{}", index + 1),
                text: None,
                children: days
                    .iter()
                    .enumerate()
                    .map(|(day_index, row)| XmlNode {
                        name: format!("D{}", day_index + 1),
                        text: Some(String::from(*row)),
                        children: Vec::new(),
                    })
                    .collect(),
            });
        }

        XmlNode {
            name: String::from("TimetableData"),
            text: None,
            children,
        }
    }

    const FULL_DAY: &str = "|10ENG-A-ENG-SMI-R05|10MAT-A-MAT-JLB-R12|10SCI-A-SCI-TWD-R20|";

    fn five_full_days() -> Vec<&'static str> {
        vec![FULL_DAY; 5]
    }

    fn five_day_times() -> Vec<Vec<Option<String>>> {
        let day: Vec<Option<String>> = vec![
            Some(String::from("8:40")),
            Some(String::from("9:35")),
            Some(String::from("10:50")),
        ];
        vec![day; 5]
    }

    #[test]
    fn test_parse_periods_preserves_shape_and_nulls() {
        // Arrange: 2 weekdays x 3 slots with a null in the middle
        let node = start_times(&[
            &[Some("8:40"), None, Some("10:50")],
            &[Some("8:40"), Some("9:35"), None],
        ]);

        // Act
        let periods = parse_periods(&node);

        // Assert
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].len(), 3);
        assert_eq!(periods[0][0].as_deref(), Some("8:40"));
        assert_eq!(periods[0][1], None);
        assert_eq!(periods[1][2], None);
    }

    #[test]
    fn test_parse_periods_passes_text_through_verbatim() {
        // Arrange: unsorted, duplicated, oddly formatted entries
        let node = start_times(&[&[Some("9:35"), Some("9:35"), Some("late")]]);

        // Act
        let periods = parse_periods(&node);

        // Assert: no dedup, no sorting, no validation
        assert_eq!(
            periods[0],
            vec![
                Some(String::from("9:35")),
                Some(String::from("9:35")),
                Some(String::from("late"))
            ]
        );
    }

    #[test]
    fn test_find_start_times_missing_container() {
        // Arrange
        let root = XmlNode::parse("<GlobalsResults><NumberRecords>0</NumberRecords></GlobalsResults>").unwrap();

        // Act
        let result = find_start_times(&root);

        // Assert
        assert!(matches!(result, Err(PortalError::MissingData(_))));
    }

    #[test]
    fn test_parse_timetable_week_numbers_are_contiguous() {
        // Arrange: 3 header rows + 3 weeks of 5 full days
        let data = timetable_data(&[&five_full_days(), &five_full_days(), &five_full_days()]);

        // Act
        let weeks = parse_timetable(&data, &five_day_times()).unwrap();

        // Assert
        assert_eq!(weeks.len(), 3);
        let numbers: Vec<u32> = weeks.iter().map(|w| w.week_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        for week in &weeks {
            assert_eq!(week.days.len(), 5);
        }
    }

    #[test]
    fn test_parse_timetable_skips_header_rows() {
        // Arrange: only the 3 header rows, no week data
        let data = timetable_data(&[]);

        // Act
        let weeks = parse_timetable(&data, &five_day_times()).unwrap();

        // Assert
        assert!(weeks.is_empty());
    }

    #[test]
    fn test_parse_timetable_positional_pairing_drops_null_slots() {
        // Arrange: times [8:00, 9:00, null] against three classes
        let day = "|Math|Sci|Free|";
        let data = timetable_data(&[&[day, day, day, day, day]]);
        let times: Vec<Vec<Option<String>>> = vec![
            vec![
                Some(String::from("8:00")),
                Some(String::from("9:00")),
                None,
            ];
            5
        ];

        // Act
        let weeks = parse_timetable(&data, &times).unwrap();

        // Assert: exactly 2 periods, the null-keyed slot is gone
        let monday = &weeks[0].days[&Weekday::Monday];
        assert_eq!(monday.periods.len(), 2);
        assert_eq!(monday.periods[0].period_time, "8:00");
        assert_eq!(monday.periods[0].class_name, "Math");
        assert_eq!(monday.periods[1].period_time, "9:00");
        assert_eq!(monday.periods[1].class_name, "Sci");
        assert_eq!(monday.start, "8:00");
        assert_eq!(monday.end, "9:00");
    }

    #[test]
    fn test_parse_timetable_truncates_on_length_mismatch() {
        // Arrange: four classes but only two timed slots
        let day = "|A|B|C|D|";
        let data = timetable_data(&[&[day, day, day, day, day]]);
        let times: Vec<Vec<Option<String>>> =
            vec![vec![Some(String::from("8:00")), Some(String::from("9:00"))]; 5];

        // Act
        let weeks = parse_timetable(&data, &times).unwrap();

        // Assert: surplus classes are dropped by the positional zip
        let monday = &weeks[0].days[&Weekday::Monday];
        assert_eq!(monday.periods.len(), 2);
        assert_eq!(monday.periods[1].class_name, "B");
    }

    #[test]
    fn test_parse_timetable_duplicate_time_last_wins() {
        // Arrange: two slots share the 8:00 start time
        let day = "|Math|Sci|Art|";
        let data = timetable_data(&[&[day, day, day, day, day]]);
        let times: Vec<Vec<Option<String>>> = vec![
            vec![
                Some(String::from("8:00")),
                Some(String::from("8:00")),
                Some(String::from("9:00")),
            ];
            5
        ];

        // Act
        let weeks = parse_timetable(&data, &times).unwrap();

        // Assert: one slot per distinct time, later class label wins
        let monday = &weeks[0].days[&Weekday::Monday];
        assert_eq!(monday.periods.len(), 2);
        assert_eq!(monday.periods[0].period_time, "8:00");
        assert_eq!(monday.periods[0].class_name, "Sci");
        assert_eq!(monday.periods[1].class_name, "Art");
    }

    #[test]
    fn test_parse_timetable_rejects_week_without_five_days() {
        // Arrange: a week with four day entries
        let data = timetable_data(&[&[FULL_DAY, FULL_DAY, FULL_DAY, FULL_DAY]]);

        // Act
        let result = parse_timetable(&data, &five_day_times());

        // Assert
        let err = result.unwrap_err();
        assert!(matches!(err, PortalError::MalformedSchedule(_)));
        assert!(err.to_string().contains("expected 5"));
    }

    #[test]
    fn test_parse_timetable_rejects_day_with_no_periods() {
        // Arrange: every slot on every day is unscheduled
        let day = "|Free|Free|";
        let data = timetable_data(&[&[day, day, day, day, day]]);
        let times: Vec<Vec<Option<String>>> = vec![vec![None, None]; 5];

        // Act
        let result = parse_timetable(&data, &times);

        // Assert
        assert!(matches!(
            result,
            Err(PortalError::MalformedSchedule(_))
        ));
    }

    #[test]
    fn test_split_class_row_discards_boundary_segments() {
        // Arrange & Act
        let labels = split_class_row(" |A|B|C| ");

        // Assert
        assert_eq!(labels, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_split_class_row_empty_input() {
        // Arrange & Act & Assert
        assert!(split_class_row("").is_empty());
        assert!(split_class_row("||").is_empty());
    }

    #[test]
    fn test_find_timetable_data_missing_links() {
        // Arrange
        let no_students = XmlNode::parse("<Results><Other/></Results>").unwrap();
        let empty_students = XmlNode::parse("<Results><Students></Students></Results>").unwrap();
        let no_grid =
            XmlNode::parse("<Results><Students><Student><Id>1</Id></Student></Students></Results>")
                .unwrap();

        // Act & Assert
        assert!(matches!(
            find_timetable_data(&no_students),
            Err(PortalError::MissingData(_))
        ));
        assert!(matches!(
            find_timetable_data(&empty_students),
            Err(PortalError::MissingData(_))
        ));
        assert!(matches!(
            find_timetable_data(&no_grid),
            Err(PortalError::MissingData(_))
        ));
    }

    #[test]
    fn test_parse_calendar_builds_both_indexes() {
        // Arrange
        let xml = include_str!("../../../../fixtures/portal/calendar.xml");
        let root = XmlNode::parse(xml).unwrap();
        let days = find_calendar_days(&root).unwrap();

        // Act
        let calendar = parse_calendar(days).unwrap();

        // Assert
        assert_eq!(calendar.week_for_date("2024-03-12"), Some("5"));
        let week5 = calendar.weeks.get("5").unwrap();
        assert_eq!(week5.len(), 7);
        assert_eq!(week5[0].date, "2024-03-10");
        assert_eq!(week5[6].date, "2024-03-16");
    }

    #[test]
    fn test_parse_calendar_excludes_weekless_days_from_week_index() {
        // Arrange: one day with WeekYear, one without
        let xml = "<Days>\
            <Day><Date>2024-01-01</Date><Status>Holiday</Status></Day>\
            <Day><Date>2024-03-12</Date><Status>Day</Status><WeekYear>5</WeekYear></Day>\
        </Days>";
        let days = XmlNode::parse(xml).unwrap();

        // Act
        let calendar = parse_calendar(&days).unwrap();

        // Assert
        assert_eq!(calendar.days.len(), 2);
        assert!(calendar.days.contains_key("2024-01-01"));
        assert_eq!(calendar.weeks.len(), 1);
        assert_eq!(calendar.weeks.get("5").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_calendar_rejects_day_without_date() {
        // Arrange
        let days = XmlNode::parse("<Days><Day><Status>Day</Status></Day></Days>").unwrap();

        // Act & Assert
        assert!(matches!(
            parse_calendar(&days),
            Err(PortalError::MissingData(_))
        ));
    }

    #[test]
    fn test_parse_full_fixture_pipeline() {
        // Arrange
        let timetable_xml = include_str!("../../../../fixtures/portal/timetable.xml");
        let globals_xml = include_str!("../../../../fixtures/portal/globals.xml");
        let timetable_root = XmlNode::parse(timetable_xml).unwrap();
        let globals_root = XmlNode::parse(globals_xml).unwrap();

        // Act
        let period_times = parse_periods(find_start_times(&globals_root).unwrap());
        let grid = find_timetable_data(&timetable_root).unwrap();
        let weeks = parse_timetable(grid, &period_times).unwrap();

        // Assert
        assert_eq!(period_times.len(), 5);
        assert_eq!(weeks.len(), 2);
        let monday = &weeks[0].days[&Weekday::Monday];
        assert_eq!(monday.start, "8:40");
        assert_eq!(monday.periods[0].class_name, "10ENG-A-ENG-SMI-R05");
        // The empty sixth slot carries no period
        assert_eq!(monday.periods.len(), 5);
    }
}
