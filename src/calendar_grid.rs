// Calendar grid: week rows for a Sunday-first 7-column layout

use crate::availability::{month_start, AvailabilityDay};
use crate::selection::SelectionState;
use chrono::{Datelike, NaiveDate};

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarCell {
    // Blank cell aligning the first day under its weekday
    Padding,
    Day(AvailabilityDay),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalendarWeek {
    pub cells: Vec<CalendarCell>,
}

impl CalendarWeek {
    pub fn days(&self) -> impl Iterator<Item = &AvailabilityDay> {
        self.cells.iter().filter_map(|cell| match cell {
            CalendarCell::Day(day) => Some(day),
            CalendarCell::Padding => None,
        })
    }
}

/// Splits one month's days into week rows.
///
/// The first row is front-padded up to the weekday of the first date. The
/// last row stops at the final day and is never back-padded.
pub fn build_weeks(days: &[AvailabilityDay]) -> Vec<CalendarWeek> {
    let Some(first) = days.first() else {
        return Vec::new();
    };

    let leading = first.date.weekday().num_days_from_sunday() as usize;
    let mut weeks = Vec::with_capacity(6);
    let mut current: Vec<CalendarCell> = Vec::with_capacity(7);
    current.extend(std::iter::repeat(CalendarCell::Padding).take(leading));

    for day in days {
        current.push(CalendarCell::Day(*day));
        if current.len() == 7 {
            weeks.push(CalendarWeek {
                cells: std::mem::take(&mut current),
            });
        }
    }
    if !current.is_empty() {
        weeks.push(CalendarWeek { cells: current });
    }

    weeks
}

pub fn is_past(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

pub fn is_today(date: NaiveDate, today: NaiveDate) -> bool {
    date == today
}

pub fn is_selected(date: NaiveDate, selection: &SelectionState) -> bool {
    selection.check_in == Some(date) || selection.check_out == Some(date)
}

// Strictly between check-in and check-out
pub fn is_in_range(date: NaiveDate, selection: &SelectionState) -> bool {
    match (selection.check_in, selection.check_out) {
        (Some(check_in), Some(check_out)) => date > check_in && date < check_out,
        _ => false,
    }
}

// "January 2026"
pub fn month_label(today: NaiveDate, month_offset: u32) -> String {
    month_start(today, month_offset)
        .map(|start| start.format("%B %Y").to_string())
        .unwrap_or_default()
}

// Everything a renderer needs to draw one day cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub date: NaiveDate,
    pub day_number: u32,
    pub available: bool,
    pub selected: bool,
    pub in_range: bool,
    pub today: bool,
    pub past: bool,
    pub clickable: bool,
    pub title: &'static str,
}

pub fn day_view(day: &AvailabilityDay, selection: &SelectionState, today: NaiveDate) -> DayView {
    let past = is_past(day.date, today);
    let selected = is_selected(day.date, selection);

    let title = if past {
        "Past date"
    } else if !day.available {
        "Already booked - Not available"
    } else if selected {
        "Click to deselect"
    } else {
        "Click to select"
    };

    DayView {
        date: day.date,
        day_number: day.date.day(),
        available: day.available,
        selected,
        in_range: is_in_range(day.date, selection),
        today: is_today(day.date, today),
        past,
        clickable: day.available && !past,
        title,
    }
}
