//! Hours-of-service trip planner.
//!
//! The planner walks a trip one day at a time:
//! - the [`CycleTracker`] decides whether the next day must be a restart
//! - the [`DayPlanner`] fills a duty day with driving, breaks and stops
//! - the [`LogEmitter`] pins each day's segments to the clock
//!
//! All state that carries across days lives in a single [`TripProgress`]
//! value threaded through each step.

pub mod cycle;
pub mod day;
pub mod emitter;
pub mod state;

pub use cycle::{apply_restart, CycleTracker};
pub use day::{DayOutcome, DayPlanner};
pub use emitter::{LogEmitter, Segment};
pub use state::{StopLabels, TripProgress};

use chrono::{Local, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::duty::TripPlan;
use crate::error::{PlanningError, Result, ValidationError};
use crate::rules::DutyRules;

/// Durations closer than this are treated as equal.
pub(crate) const HOURS_EPS: f64 = 1e-7;
/// Distances closer than this are treated as equal.
pub(crate) const MILES_EPS: f64 = 1e-6;

/// Input for a planning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub total_miles: f64,
    pub cycle_used_hours: f64,
    /// First day's anchor; today at midnight when absent
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub labels: StopLabels,
}

impl TripRequest {
    pub fn new(total_miles: f64, cycle_used_hours: f64) -> Self {
        Self {
            total_miles,
            cycle_used_hours,
            ..Self::default()
        }
    }

    pub fn starting_at(mut self, start: NaiveDateTime) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_labels(mut self, labels: StopLabels) -> Self {
        self.labels = labels;
        self
    }
}

/// Plans trips against one set of rules.
///
/// Holds no per-trip state; a single planner can serve any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct TripPlanner {
    rules: DutyRules,
}

impl TripPlanner {
    /// Create a planner with the default 70-hour/8-day rules.
    pub fn new() -> Self {
        Self {
            rules: DutyRules::default(),
        }
    }

    /// Create with custom rules.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidRule`] if the rules are unusable.
    pub fn with_rules(rules: DutyRules) -> Result<Self, ValidationError> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &DutyRules {
        &self.rules
    }

    /// Plan a trip of `total_miles` for a driver who has already used
    /// `cycle_used_hours` of the current cycle.
    ///
    /// # Errors
    /// - [`ValidationError`] for a negative or non-finite distance, or cycle
    ///   hours outside `0..=cycle_cap_hours`
    /// - [`PlanningError`] if planning cannot make progress
    pub fn calculate_trip(
        &self,
        total_miles: f64,
        cycle_used_hours: f64,
        start: Option<NaiveDateTime>,
    ) -> Result<TripPlan> {
        self.plan(&TripRequest {
            total_miles,
            cycle_used_hours,
            start,
            labels: StopLabels::default(),
        })
    }

    /// Plan a trip from a full request.
    ///
    /// # Errors
    /// Same as [`TripPlanner::calculate_trip`].
    pub fn plan(&self, request: &TripRequest) -> Result<TripPlan> {
        self.validate_request(request)?;
        self.plan_within(request, self.iteration_limit(request.total_miles))
    }

    /// Run the day loop, failing once `limit` days have been emitted
    /// without finishing.
    pub(crate) fn plan_within(&self, request: &TripRequest, limit: usize) -> Result<TripPlan> {
        let rules = &self.rules;
        let start = request.start.unwrap_or_else(default_start);
        debug!(
            miles = request.total_miles,
            cycle_used = request.cycle_used_hours,
            %start,
            limit,
            "planning trip"
        );

        let mut progress = TripProgress::new(
            request.total_miles,
            request.cycle_used_hours,
            start,
            rules,
        )
        .with_labels(request.labels.clone());
        let mut logs = Vec::new();
        let mut force_restart = false;

        while !progress.is_complete() {
            if logs.len() >= limit {
                return Err(PlanningError::IterationLimit {
                    limit,
                    miles_remaining: progress.miles_remaining,
                }
                .into());
            }

            if force_restart || progress.cycle.needs_restart(rules.restart_threshold_hours) {
                if progress.cycle.used() <= HOURS_EPS {
                    // A restart cannot free any more hours.
                    return Err(PlanningError::NoProgress {
                        day: progress.day_number,
                        cycle_available: progress.cycle.available_cycle_hours(),
                    }
                    .into());
                }
                let (next, log) = apply_restart(progress, rules);
                logs.push(log);
                progress = next;
                force_restart = false;
                continue;
            }

            match DayPlanner::new(rules).plan(progress)? {
                DayOutcome::Planned { progress: next, log } => {
                    logs.push(log);
                    progress = next;
                }
                DayOutcome::Stalled { progress: next } => {
                    warn!(
                        day = next.day_number,
                        cycle_available = next.cycle.available_cycle_hours(),
                        "no duty time fits in the remaining cycle, forcing a restart"
                    );
                    force_restart = true;
                    progress = next;
                }
            }
        }

        let plan = TripPlan {
            total_miles: request.total_miles,
            total_driving_hours: rules.hours_for_miles(request.total_miles),
            estimated_days: rules.estimated_days(request.total_miles),
            actual_days: logs.len() as u32,
            num_fuel_stops: progress.fuel_stops,
            restart_needed: logs.iter().any(|d| d.is_restart),
            cycle_used_before: request.cycle_used_hours,
            cycle_used_after: progress.cycle.used(),
            daily_logs: logs,
        };
        debug!(
            days = plan.actual_days,
            restart = plan.restart_needed,
            cycle_after = plan.cycle_used_after,
            "trip planned"
        );
        Ok(plan)
    }

    fn validate_request(&self, request: &TripRequest) -> Result<(), ValidationError> {
        if !request.total_miles.is_finite() || request.total_miles < 0.0 {
            return Err(ValidationError::InvalidDistance(request.total_miles));
        }
        let cap = self.rules.cycle_cap_hours;
        let used = request.cycle_used_hours;
        if !used.is_finite() || used < 0.0 || used > cap {
            return Err(ValidationError::CycleHoursOutOfRange { used, cap });
        }
        Ok(())
    }

    /// Upper bound on emitted days before planning is declared stuck.
    ///
    /// Every productive day covers at least half of the smaller of the
    /// daily driving cap and the cycle cap; the factor of four leaves room
    /// for a restart and a short day per cycle.
    fn iteration_limit(&self, total_miles: f64) -> usize {
        let rules = &self.rules;
        let work_hours = rules.hours_for_miles(total_miles)
            + rules.pickup_hours
            + rules.dropoff_hours
            + f64::from(rules.fuel_stops_for(total_miles)) * rules.fuel_stop_hours;
        let per_day = 0.5 * rules.max_driving_hours.min(rules.cycle_cap_hours);
        4 * (work_hours / per_day).ceil() as usize + 8
    }
}

impl Default for TripPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Plan a trip with the default rules.
///
/// # Errors
/// See [`TripPlanner::calculate_trip`].
pub fn calculate_trip(
    total_miles: f64,
    cycle_used_hours: f64,
    start: Option<NaiveDateTime>,
) -> Result<TripPlan> {
    TripPlanner::new().calculate_trip(total_miles, cycle_used_hours, start)
}

/// Local midnight today.
fn default_start() -> NaiveDateTime {
    Local::now().date_naive().and_time(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duty::Activity;
    use crate::error::CoreError;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn rejects_negative_distance() {
        let err = calculate_trip(-5.0, 0.0, Some(start())).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::InvalidDistance(_))
        ));
    }

    #[test]
    fn rejects_nan_distance() {
        assert!(calculate_trip(f64::NAN, 0.0, Some(start())).is_err());
    }

    #[test]
    fn rejects_cycle_hours_out_of_range() {
        for used in [-0.5, 70.5, f64::INFINITY] {
            let err = calculate_trip(100.0, used, Some(start())).unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::CycleHoursOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn full_cycle_starts_with_restart() {
        let plan = calculate_trip(300.0, 70.0, Some(start())).unwrap();
        assert!(plan.restart_needed);
        assert!(plan.daily_logs[0].is_restart);
        assert!(!plan.daily_logs[1].is_restart);
        assert_eq!(plan.daily_logs[1].date, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    }

    #[test]
    fn stalled_day_forces_restart() {
        // 69.5h used leaves 0.5h: above a zero threshold but too little
        // for the pickup.
        let rules = DutyRules {
            restart_threshold_hours: 0.0,
            ..DutyRules::default()
        };
        let planner = TripPlanner::with_rules(rules).unwrap();
        let plan = planner.calculate_trip(100.0, 69.5, Some(start())).unwrap();
        assert!(plan.daily_logs[0].is_restart);
        assert_eq!(plan.actual_days, 2);
    }

    #[test]
    fn no_progress_is_an_error() {
        let rules = DutyRules {
            cycle_cap_hours: 0.5,
            restart_threshold_hours: 0.0,
            ..DutyRules::default()
        };
        let planner = TripPlanner::with_rules(rules).unwrap();
        let err = planner.calculate_trip(100.0, 0.0, Some(start())).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Planning(PlanningError::NoProgress { .. })
        ));
    }

    #[test]
    fn labels_land_on_pickup_and_dropoff() {
        let request = TripRequest::new(120.0, 0.0)
            .starting_at(start())
            .with_labels(StopLabels {
                origin: Some("Denver, CO".into()),
                pickup: Some("Chicago, IL".into()),
                dropoff: Some("Gary, IN".into()),
            });
        let plan = TripPlanner::new().plan(&request).unwrap();
        let day = &plan.daily_logs[0];
        let pickup = day.entries_of(Activity::Pickup).next().unwrap();
        let dropoff = day.entries_of(Activity::Dropoff).next().unwrap();
        assert_eq!(pickup.location.as_deref(), Some("Chicago, IL"));
        assert_eq!(dropoff.location.as_deref(), Some("Gary, IN"));
        assert!(plan
            .entries()
            .all(|e| e.location.as_deref() != Some("Denver, CO")));
    }

    #[test]
    fn iteration_limit_scales_with_work() {
        let planner = TripPlanner::new();
        // pickup and dropoff only: ceil(2 / 5.5) = 1 unit of work
        assert_eq!(planner.iteration_limit(0.0), 12);
        // 11h driving plus stops: ceil(13 / 5.5) = 3
        assert_eq!(planner.iteration_limit(660.0), 20);
        // 41.67h driving, 2 fuel stops: ceil(44.67 / 5.5) = 9
        assert_eq!(planner.iteration_limit(2500.0), 44);
    }

    #[test]
    fn iteration_limit_is_enforced() {
        let request = TripRequest::new(1500.0, 0.0).starting_at(start());
        let err = TripPlanner::new().plan_within(&request, 1).unwrap_err();
        match err {
            CoreError::Planning(PlanningError::IterationLimit {
                limit,
                miles_remaining,
            }) => {
                assert_eq!(limit, 1);
                assert!((miles_remaining - (1500.0 - 660.0)).abs() < 1e-6);
            }
            other => panic!("expected IterationLimit, got {other:?}"),
        }

        // The real bound leaves enough room for the same trip.
        assert!(TripPlanner::new().plan(&request).is_ok());
    }

    #[test]
    fn planner_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TripPlanner>();
    }
}
