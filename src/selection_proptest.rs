#[cfg(test)]
mod tests {
    use crate::availability::AvailabilityDay;
    use crate::calendar_grid::build_weeks;
    use crate::selection::{
        is_range_available, ClickOutcome, DateRange, SelectionPhase, SelectionStateMachine,
    };
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn month(availability: &[bool]) -> Vec<AvailabilityDay> {
        let start = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        start
            .iter_days()
            .zip(availability)
            .map(|(date, available)| AvailabilityDay::new(date, *available))
            .collect()
    }

    proptest! {
        // Whatever the clicks, a check-out only exists after a check-in with an open range
        #[test]
        fn test_selection_invariant_holds(
            availability in prop::collection::vec(any::<bool>(), 30),
            clicks in prop::collection::vec((0..30usize, any::<bool>()), 1..40),
        ) {
            let days = month(&availability);
            let mut machine = SelectionStateMachine::new();

            for (index, past) in clicks {
                let day = days[index];
                let before = machine.state();
                let outcome = machine.click(day.date, day.available, past, &days);

                if !day.available || past {
                    prop_assert_eq!(outcome, ClickOutcome::Ignored);
                    prop_assert_eq!(machine.state(), before);
                }

                let state = machine.state();
                if let Some(check_out) = state.check_out {
                    let check_in = state.check_in.expect("check-out without check-in");
                    prop_assert!(check_in < check_out);
                    prop_assert!(is_range_available(check_in, check_out, &days));
                }
            }
        }

        #[test]
        fn test_open_range_always_finalizes(
            first in 0..29usize,
            length in 1..29usize,
        ) {
            let days = month(&[true; 30]);
            let last = (first + length).min(29);
            prop_assume!(last > first);

            let mut machine = SelectionStateMachine::new();
            machine.click(days[first].date, true, false, &days);
            let outcome = machine.click(days[last].date, true, false, &days);

            let range = DateRange::new(days[first].date, days[last].date).unwrap();
            prop_assert_eq!(outcome, ClickOutcome::Finalized(range));
            prop_assert_eq!(machine.phase(), SelectionPhase::BothSelected(range));
        }

        #[test]
        fn test_grid_flattens_to_input(
            availability in prop::collection::vec(any::<bool>(), 28..=30),
        ) {
            let days = month(&availability);
            let flattened: Vec<AvailabilityDay> = build_weeks(&days)
                .iter()
                .flat_map(|week| week.days().copied().collect::<Vec<_>>())
                .collect();
            prop_assert_eq!(flattened, days);
        }
    }
}
