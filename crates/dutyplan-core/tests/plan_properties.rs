//! Property tests: every generated plan must satisfy the duty-hour rules.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use dutyplan_core::{Activity, DutyRules, DutyStatus, TripPlan, TripPlanner};
use proptest::prelude::*;

const EPS: f64 = 1e-6;

/// Timestamps are kept at millisecond precision.
fn slack() -> Duration {
    Duration::milliseconds(1)
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn plan(miles: f64, cycle_used: f64) -> TripPlan {
    TripPlanner::new()
        .calculate_trip(miles, cycle_used, Some(start()))
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn daily_driving_never_exceeds_cap(miles in 0.0f64..4000.0, used in 0.0f64..=70.0) {
        let plan = plan(miles, used);
        for day in &plan.daily_logs {
            prop_assert!(day.total_driving_hours <= 11.0 + EPS, "day {} drove {}", day.day_number, day.total_driving_hours);
        }
    }

    #[test]
    fn all_miles_are_driven(miles in 0.0f64..4000.0, used in 0.0f64..=70.0) {
        let plan = plan(miles, used);
        prop_assert!((plan.driven_hours() - miles / 60.0).abs() < EPS);
        prop_assert!((plan.total_driving_hours - miles / 60.0).abs() < EPS);
    }

    #[test]
    fn break_taken_after_eight_driving_hours(miles in 0.0f64..4000.0, used in 0.0f64..=70.0) {
        let plan = plan(miles, used);
        let entries: Vec<_> = plan.entries().collect();
        let mut since_break = 0.0;
        for (i, entry) in entries.iter().enumerate() {
            match entry.status {
                DutyStatus::Driving => {
                    since_break += entry.duration_hours;
                    prop_assert!(since_break <= 8.0 + EPS, "drove {since_break}h without a break");
                    if since_break < 8.0 - 1e-7 {
                        continue;
                    }
                    // The very next entry is the rest, unless the trip ends
                    // with the dropoff right here.
                    let next = entries[i + 1];
                    let is_rest = matches!(next.status, DutyStatus::OffDuty | DutyStatus::SleeperBerth)
                        && next.duration_hours >= 0.5 - EPS;
                    let is_final_dropoff = next.activity == Activity::Dropoff && i + 2 == entries.len();
                    prop_assert!(
                        is_rest || is_final_dropoff,
                        "after 8h of driving the next entry was '{}'", next.notes
                    );
                }
                DutyStatus::OffDuty | DutyStatus::SleeperBerth if entry.duration_hours >= 0.5 - EPS => {
                    since_break = 0.0;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn entries_are_contiguous_within_each_day(miles in 0.0f64..4000.0, used in 0.0f64..=70.0) {
        let plan = plan(miles, used);
        for day in &plan.daily_logs {
            prop_assert!(!day.log_entries.is_empty());
            for pair in day.log_entries.windows(2) {
                prop_assert_eq!(pair[0].end_time, pair[1].start_time);
            }
            for entry in &day.log_entries {
                prop_assert!(entry.duration_hours >= 0.0);
                prop_assert!(entry.end_time >= entry.start_time);
            }
        }
    }

    #[test]
    fn fuel_stops_match_interval_boundaries(miles in 0.0f64..4000.0, used in 0.0f64..=70.0) {
        let plan = plan(miles, used);
        let expected = DutyRules::default().fuel_stops_for(miles);
        let logged = plan.entries().filter(|e| e.activity == Activity::FuelStop).count() as u32;
        prop_assert_eq!(plan.num_fuel_stops, expected);
        prop_assert_eq!(logged, expected);
    }

    #[test]
    fn cycle_hours_are_accounted(miles in 0.0f64..4000.0, used in 0.0f64..=70.0) {
        let plan = plan(miles, used);
        let mut cycle = plan.cycle_used_before;
        for day in &plan.daily_logs {
            if day.is_restart {
                cycle = 0.0;
                continue;
            }
            cycle += day.cycle_hours_used();
            prop_assert!(cycle <= 70.0 + EPS, "cycle reached {cycle} on day {}", day.day_number);
            prop_assert!((day.cycle_hours_remaining - (70.0 - cycle).max(0.0)).abs() < EPS);
        }
        prop_assert!((plan.cycle_used_after - cycle).abs() < EPS);
        prop_assert_eq!(plan.restart_needed, plan.daily_logs.iter().any(|d| d.is_restart));
    }

    #[test]
    fn normal_days_fit_in_their_window(miles in 0.0f64..4000.0, used in 0.0f64..=70.0) {
        let plan = plan(miles, used);
        let last = plan.daily_logs.len() - 1;
        for (i, day) in plan.daily_logs.iter().enumerate() {
            let anchor = day.start_time().unwrap();
            if day.is_restart {
                prop_assert_eq!(day.log_entries.len(), 1);
                prop_assert_eq!(day.log_entries[0].duration_hours, 34.0);
                prop_assert_eq!(day.log_entries[0].status, DutyStatus::OffDuty);
                continue;
            }

            prop_assert!(day.end_time().unwrap() <= anchor + Duration::hours(24) + slack());
            let on_duty_end = day
                .log_entries
                .iter()
                .filter(|e| e.status.is_on_duty())
                .map(|e| e.end_time)
                .max()
                .unwrap();
            prop_assert!(on_duty_end <= anchor + Duration::hours(14) + slack());

            let tail = day.log_entries.last().unwrap();
            if i == last {
                prop_assert_eq!(tail.activity, Activity::Dropoff);
            } else {
                prop_assert_eq!(tail.activity, Activity::DailyReset);
                prop_assert!(tail.duration_hours >= 10.0 - EPS);
            }
        }
    }

    #[test]
    fn pickup_first_and_dropoff_last(miles in 0.0f64..4000.0, used in 0.0f64..=70.0) {
        let plan = plan(miles, used);
        let on_duty: Vec<_> = plan.entries().filter(|e| e.status.is_on_duty()).collect();
        prop_assert_eq!(on_duty.first().unwrap().activity, Activity::Pickup);
        prop_assert_eq!(on_duty.last().unwrap().activity, Activity::Dropoff);
        prop_assert_eq!(on_duty.iter().filter(|e| e.activity == Activity::Pickup).count(), 1);
        prop_assert_eq!(on_duty.iter().filter(|e| e.activity == Activity::Dropoff).count(), 1);
    }

    #[test]
    fn low_remaining_cycle_starts_with_restart(used in 69.01f64..=70.0, miles in 1.0f64..2000.0) {
        let plan = plan(miles, used);
        prop_assert!(plan.daily_logs[0].is_restart);
        prop_assert!(plan.restart_needed);
    }
}
