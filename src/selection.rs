// Check-in / check-out selection
// Two-click protocol over the current availability snapshot.

use crate::availability::AvailabilityDay;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error(
        "Cannot select this range. {} is already booked. Please choose different dates.",
        .blocking_date.format("%b %-d")
    )]
    RangeBlocked { blocking_date: NaiveDate },
}

// A validated stay; check_out is always after check_in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl DateRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_out > check_in).then_some(Self {
            check_in,
            check_out,
        })
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    // Every night of the stay: [check_in, check_out)
    pub fn nights_iter(&self) -> impl Iterator<Item = NaiveDate> {
        let check_out = self.check_out;
        self.check_in.iter_days().take_while(move |day| *day < check_out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Empty,
    CheckInOnly(NaiveDate),
    BothSelected(DateRange),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    // Unavailable or past date; nothing changed
    Ignored,
    CheckInSelected(NaiveDate),
    // Check-in deselected, back to empty
    Cleared,
    // Check-out deselected, check-in kept
    CheckOutCleared(NaiveDate),
    Finalized(DateRange),
    // Range crossed a booked date; selection reset
    Rejected(SelectionError),
}

/// First night in `[check_in, check_out)` that the snapshot does not list as
/// available, in ascending order.
pub fn first_blocking_date(
    check_in: NaiveDate,
    check_out: NaiveDate,
    snapshot: &[AvailabilityDay],
) -> Option<NaiveDate> {
    check_in
        .iter_days()
        .take_while(|day| *day < check_out)
        .find(|day| {
            !snapshot
                .iter()
                .any(|entry| entry.date == *day && entry.available)
        })
}

pub fn is_range_available(
    check_in: NaiveDate,
    check_out: NaiveDate,
    snapshot: &[AvailabilityDay],
) -> bool {
    first_blocking_date(check_in, check_out, snapshot).is_none()
}

#[derive(Debug, Clone, Default)]
pub struct SelectionStateMachine {
    state: SelectionState,
}

impl SelectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn phase(&self) -> SelectionPhase {
        match (self.state.check_in, self.state.check_out) {
            (None, _) => SelectionPhase::Empty,
            (Some(check_in), None) => SelectionPhase::CheckInOnly(check_in),
            (Some(check_in), Some(check_out)) => match DateRange::new(check_in, check_out) {
                Some(range) => SelectionPhase::BothSelected(range),
                None => SelectionPhase::CheckInOnly(check_in),
            },
        }
    }

    pub fn finalized(&self) -> Option<DateRange> {
        match self.phase() {
            SelectionPhase::BothSelected(range) => Some(range),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.state = SelectionState::default();
    }

    /// Applies one click. `snapshot` must be the availability the calendar is
    /// currently showing; range validation runs against it.
    pub fn click(
        &mut self,
        date: NaiveDate,
        available: bool,
        is_past: bool,
        snapshot: &[AvailabilityDay],
    ) -> ClickOutcome {
        let listed_unavailable = snapshot
            .iter()
            .any(|day| day.date == date && !day.available);
        if !available || is_past || listed_unavailable {
            debug!(%date, available, is_past, "click ignored");
            return ClickOutcome::Ignored;
        }

        if self.state.check_in == Some(date) {
            debug!(%date, "check-in deselected");
            self.reset();
            return ClickOutcome::Cleared;
        }

        if self.state.check_out == Some(date) {
            debug!(%date, "check-out deselected");
            self.state.check_out = None;
            return ClickOutcome::CheckOutCleared(date);
        }

        match self.phase() {
            SelectionPhase::Empty | SelectionPhase::BothSelected(_) => self.start_at(date),
            // An earlier click restarts the selection instead of swapping
            SelectionPhase::CheckInOnly(check_in) if date <= check_in => self.start_at(date),
            SelectionPhase::CheckInOnly(check_in) => {
                match first_blocking_date(check_in, date, snapshot) {
                    Some(blocking_date) => {
                        info!(%check_in, check_out = %date, %blocking_date, "range crosses a booked date");
                        self.reset();
                        ClickOutcome::Rejected(SelectionError::RangeBlocked { blocking_date })
                    }
                    None => match DateRange::new(check_in, date) {
                        Some(range) => {
                            debug!(%check_in, check_out = %date, "range finalized");
                            self.state.check_out = Some(date);
                            ClickOutcome::Finalized(range)
                        }
                        None => self.start_at(date),
                    },
                }
            }
        }
    }

    fn start_at(&mut self, date: NaiveDate) -> ClickOutcome {
        debug!(%date, "check-in selected");
        self.state = SelectionState {
            check_in: Some(date),
            check_out: None,
        };
        ClickOutcome::CheckInSelected(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-01-18 open, 19 booked, 20 open
    fn scenario_days() -> Vec<AvailabilityDay> {
        vec![
            AvailabilityDay::new(date(2026, 1, 18), true),
            AvailabilityDay::new(date(2026, 1, 19), false),
            AvailabilityDay::new(date(2026, 1, 20), true),
        ]
    }

    fn open_days(from: NaiveDate, count: usize) -> Vec<AvailabilityDay> {
        from.iter_days()
            .take(count)
            .map(|day| AvailabilityDay::new(day, true))
            .collect()
    }

    fn click(machine: &mut SelectionStateMachine, day: NaiveDate, days: &[AvailabilityDay]) -> ClickOutcome {
        machine.click(day, true, false, days)
    }

    #[test]
    fn test_booked_day_inside_range_rejects_and_resets() {
        let days = scenario_days();
        let mut machine = SelectionStateMachine::new();

        assert_eq!(
            click(&mut machine, date(2026, 1, 18), &days),
            ClickOutcome::CheckInSelected(date(2026, 1, 18))
        );
        assert_eq!(machine.phase(), SelectionPhase::CheckInOnly(date(2026, 1, 18)));

        let outcome = click(&mut machine, date(2026, 1, 20), &days);
        let expected = SelectionError::RangeBlocked {
            blocking_date: date(2026, 1, 19),
        };
        assert_eq!(outcome, ClickOutcome::Rejected(expected.clone()));
        assert_eq!(
            expected.to_string(),
            "Cannot select this range. Jan 19 is already booked. Please choose different dates."
        );
        assert_eq!(machine.phase(), SelectionPhase::Empty);
        assert_eq!(machine.state(), SelectionState::default());
    }

    #[test]
    fn test_second_click_on_check_in_deselects() {
        let days = scenario_days();
        let mut machine = SelectionStateMachine::new();

        click(&mut machine, date(2026, 1, 18), &days);
        assert_eq!(click(&mut machine, date(2026, 1, 18), &days), ClickOutcome::Cleared);
        assert_eq!(machine.phase(), SelectionPhase::Empty);
    }

    #[test]
    fn test_two_clicks_finalize_range() {
        let days = open_days(date(2026, 6, 1), 30);
        let mut machine = SelectionStateMachine::new();

        click(&mut machine, date(2026, 6, 10), &days);
        let outcome = click(&mut machine, date(2026, 6, 14), &days);

        let range = DateRange::new(date(2026, 6, 10), date(2026, 6, 14)).unwrap();
        assert_eq!(outcome, ClickOutcome::Finalized(range));
        assert_eq!(machine.finalized(), Some(range));
        assert_eq!(range.nights(), 4);
        assert_eq!(range.nights_iter().count(), 4);
    }

    #[test]
    fn test_earlier_click_restarts_check_in() {
        let days = open_days(date(2026, 6, 1), 30);
        let mut machine = SelectionStateMachine::new();

        click(&mut machine, date(2026, 6, 10), &days);
        let outcome = click(&mut machine, date(2026, 6, 7), &days);

        assert_eq!(outcome, ClickOutcome::CheckInSelected(date(2026, 6, 7)));
        assert_eq!(machine.phase(), SelectionPhase::CheckInOnly(date(2026, 6, 7)));
        assert_eq!(machine.finalized(), None);
    }

    #[test]
    fn test_booked_check_out_cell_is_not_clickable() {
        let mut days = open_days(date(2026, 6, 1), 30);
        days[14].available = false; // 2026-06-15
        let mut machine = SelectionStateMachine::new();

        click(&mut machine, date(2026, 6, 12), &days);
        assert_eq!(click(&mut machine, date(2026, 6, 15), &days), ClickOutcome::Ignored);
        assert!(matches!(
            click(&mut machine, date(2026, 6, 14), &days),
            ClickOutcome::Finalized(_)
        ));
    }

    #[test]
    fn test_new_click_after_finalized_starts_over() {
        let days = open_days(date(2026, 6, 1), 30);
        let mut machine = SelectionStateMachine::new();

        click(&mut machine, date(2026, 6, 10), &days);
        click(&mut machine, date(2026, 6, 12), &days);
        let outcome = click(&mut machine, date(2026, 6, 20), &days);

        assert_eq!(outcome, ClickOutcome::CheckInSelected(date(2026, 6, 20)));
        assert_eq!(
            machine.state(),
            SelectionState {
                check_in: Some(date(2026, 6, 20)),
                check_out: None
            }
        );
    }

    #[test]
    fn test_clicking_check_out_keeps_check_in() {
        let days = open_days(date(2026, 6, 1), 30);
        let mut machine = SelectionStateMachine::new();

        click(&mut machine, date(2026, 6, 10), &days);
        click(&mut machine, date(2026, 6, 12), &days);
        let outcome = click(&mut machine, date(2026, 6, 12), &days);

        assert_eq!(outcome, ClickOutcome::CheckOutCleared(date(2026, 6, 12)));
        assert_eq!(machine.phase(), SelectionPhase::CheckInOnly(date(2026, 6, 10)));

        // and a later click finalizes again
        assert!(matches!(
            click(&mut machine, date(2026, 6, 16), &days),
            ClickOutcome::Finalized(_)
        ));
    }

    #[test]
    fn test_clicking_check_in_when_both_selected_clears_all() {
        let days = open_days(date(2026, 6, 1), 30);
        let mut machine = SelectionStateMachine::new();

        click(&mut machine, date(2026, 6, 10), &days);
        click(&mut machine, date(2026, 6, 12), &days);

        assert_eq!(click(&mut machine, date(2026, 6, 10), &days), ClickOutcome::Cleared);
        assert_eq!(machine.phase(), SelectionPhase::Empty);
    }

    #[test]
    fn test_unavailable_or_past_clicks_are_ignored() {
        let days = scenario_days();
        let mut machine = SelectionStateMachine::new();

        assert_eq!(machine.click(date(2026, 1, 19), false, false, &days), ClickOutcome::Ignored);
        assert_eq!(machine.click(date(2026, 1, 18), true, true, &days), ClickOutcome::Ignored);
        // caller claims available but the snapshot disagrees
        assert_eq!(machine.click(date(2026, 1, 19), true, false, &days), ClickOutcome::Ignored);
        assert_eq!(machine.phase(), SelectionPhase::Empty);

        click(&mut machine, date(2026, 1, 18), &days);
        assert_eq!(machine.click(date(2026, 1, 20), true, true, &days), ClickOutcome::Ignored);
        assert_eq!(machine.phase(), SelectionPhase::CheckInOnly(date(2026, 1, 18)));
    }

    #[test]
    fn test_range_missing_from_snapshot_is_blocked() {
        let days = open_days(date(2026, 6, 25), 6); // 25th..30th
        assert_eq!(
            first_blocking_date(date(2026, 6, 29), date(2026, 7, 2), &days),
            Some(date(2026, 7, 1))
        );
        assert!(is_range_available(date(2026, 6, 25), date(2026, 7, 1), &days));
    }

    #[test]
    fn test_reset_returns_to_empty() {
        let days = open_days(date(2026, 6, 1), 30);
        let mut machine = SelectionStateMachine::new();
        click(&mut machine, date(2026, 6, 10), &days);
        click(&mut machine, date(2026, 6, 11), &days);

        machine.reset();
        assert_eq!(machine.phase(), SelectionPhase::Empty);
        assert_eq!(machine.finalized(), None);
    }

    #[test]
    fn test_date_range_requires_order() {
        assert!(DateRange::new(date(2026, 6, 10), date(2026, 6, 10)).is_none());
        assert!(DateRange::new(date(2026, 6, 10), date(2026, 6, 9)).is_none());
        assert!(DateRange::new(date(2026, 6, 10), date(2026, 6, 11)).is_some());
    }
}
