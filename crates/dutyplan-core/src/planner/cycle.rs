//! Rolling duty-cycle budget and the restart that resets it.

use chrono::Duration;
use tracing::debug;

use super::emitter::{hours_to_duration, LogEmitter};
use super::state::TripProgress;
use super::HOURS_EPS;
use crate::duty::DailyLog;
use crate::rules::DutyRules;

/// On-duty plus driving hours used against the cycle cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleTracker {
    cap: f64,
    used: f64,
}

impl CycleTracker {
    pub fn new(cap: f64, used: f64) -> Self {
        Self { cap, used }
    }

    pub fn used(&self) -> f64 {
        self.used
    }

    /// Hours left before the cycle cap is reached.
    pub fn available_cycle_hours(&self) -> f64 {
        (self.cap - self.used).max(0.0)
    }

    /// Deduct on-duty and driving hours from the budget.
    pub fn consume(&mut self, hours: f64) {
        self.used += hours;
    }

    /// Remaining hours are strictly below `threshold`.
    pub fn needs_restart(&self, threshold: f64) -> bool {
        self.available_cycle_hours() < threshold - HOURS_EPS
    }

    /// Forget all consumed hours.
    pub fn reset(&mut self) {
        self.used = 0.0;
    }
}

/// Take a restart: one off-duty entry of the restart duration starting at
/// the next day anchor, after which the cycle is empty and the next duty
/// day begins at the first anchor on or after the restart's end.
pub fn apply_restart(mut progress: TripProgress, rules: &DutyRules) -> (TripProgress, DailyLog) {
    let anchor = progress.day_start;
    debug!(
        day = progress.day_number,
        cycle_used = progress.cycle.used(),
        "scheduling {}h restart",
        rules.restart_hours
    );

    progress.cycle.reset();
    let log = LogEmitter::new(rules).emit_restart(progress.day_number, anchor);

    progress.hours_since_break = 0.0;
    progress.day_number += 1;
    progress.advance_past(anchor + hours_to_duration(rules.restart_hours));
    if progress.day_start == anchor {
        progress.day_start += Duration::hours(24);
    }
    (progress, log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duty::{Activity, DutyStatus};
    use chrono::{NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn available_hours_never_negative() {
        let mut cycle = CycleTracker::new(70.0, 65.0);
        assert_eq!(cycle.available_cycle_hours(), 5.0);
        cycle.consume(7.5);
        assert_eq!(cycle.available_cycle_hours(), 0.0);
        assert_eq!(cycle.used(), 72.5);
    }

    #[test]
    fn exactly_at_threshold_does_not_restart() {
        let cycle = CycleTracker::new(70.0, 69.0);
        assert!(!cycle.needs_restart(1.0));
    }

    #[test]
    fn just_below_threshold_restarts() {
        let cycle = CycleTracker::new(70.0, 69.01);
        assert!(cycle.needs_restart(1.0));
    }

    #[test]
    fn zero_threshold_never_restarts() {
        let cycle = CycleTracker::new(70.0, 70.0);
        assert!(!cycle.needs_restart(0.0));
    }

    #[test]
    fn restart_emits_single_off_duty_entry_and_clears_cycle() {
        let rules = DutyRules::default();
        let progress = TripProgress::new(900.0, 69.5, start(), &rules);
        let (next, log) = apply_restart(progress, &rules);

        assert!(log.is_restart);
        assert_eq!(log.day_number, 1);
        assert_eq!(log.log_entries.len(), 1);
        let entry = &log.log_entries[0];
        assert_eq!(entry.status, DutyStatus::OffDuty);
        assert_eq!(entry.activity, Activity::Restart);
        assert_eq!(entry.duration_hours, 34.0);
        assert_eq!(entry.end_time, start() + Duration::hours(34));

        assert_eq!(next.cycle.used(), 0.0);
        assert_eq!(next.day_number, 2);
        assert_eq!(next.day_start, start() + Duration::hours(48));
        assert_eq!(next.miles_remaining, 900.0);
        assert!(next.pickup_pending);
    }
}
