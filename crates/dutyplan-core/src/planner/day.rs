//! Planning a single duty day.
//!
//! A day is built greedily: pickup (first day only), then alternating
//! driving, breaks and fuel stops until one of the daily limits is hit or
//! the miles run out, then the dropoff, then the daily reset. Driving is
//! split wherever a limit falls mid-segment.

use chrono::Duration;
use tracing::{debug, trace};

use super::emitter::{LogEmitter, Segment};
use super::state::TripProgress;
use super::{HOURS_EPS, MILES_EPS};
use crate::duty::{Activity, DailyLog, DutyStatus};
use crate::error::PlanningError;
use crate::rules::DutyRules;

/// Shortest leftover drive a split may push into the next day.
const MIN_CARRYOVER_HOURS: f64 = 1.0 / 60.0;

/// Result of planning one day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    /// The day was planned and emitted.
    Planned {
        progress: TripProgress,
        log: DailyLog,
    },
    /// Nothing fit in the day's budgets; no log was emitted.
    Stalled { progress: TripProgress },
}

/// Time used so far in the day being planned.
#[derive(Debug, Clone, Copy)]
struct DayBudget {
    /// Wall-clock hours since coming on duty
    elapsed: f64,
    driven: f64,
    /// Driving plus on-duty-not-driving
    on_duty: f64,
    cycle_available: f64,
}

impl DayBudget {
    fn window_left(&self, rules: &DutyRules) -> f64 {
        rules.on_duty_window_hours - self.elapsed
    }

    fn cycle_left(&self) -> f64 {
        self.cycle_available - self.on_duty
    }

    fn fits_on_duty(&self, hours: f64, rules: &DutyRules) -> bool {
        hours <= self.window_left(rules) + HOURS_EPS && hours <= self.cycle_left() + HOURS_EPS
    }

    fn work(&mut self, hours: f64) {
        self.elapsed += hours;
        self.on_duty += hours;
    }

    fn rest(&mut self, hours: f64) {
        self.elapsed += hours;
    }
}

/// Plans one day at a time against a fixed set of rules.
pub struct DayPlanner<'a> {
    rules: &'a DutyRules,
}

impl<'a> DayPlanner<'a> {
    pub fn new(rules: &'a DutyRules) -> Self {
        Self { rules }
    }

    /// Plan the day anchored at `progress.day_start`.
    ///
    /// Returns [`DayOutcome::Stalled`] without emitting anything when not
    /// even the first activity fits, leaving the caller to decide whether
    /// a restart helps.
    ///
    /// # Errors
    /// Propagates [`PlanningError`] from the emitter if a segment length
    /// is not a finite, non-negative number.
    pub fn plan(&self, progress: TripProgress) -> Result<DayOutcome, PlanningError> {
        let rules = self.rules;
        let mut p = progress;
        let anchor = p.day_start;
        let mut day = DayBudget {
            elapsed: 0.0,
            driven: 0.0,
            on_duty: 0.0,
            cycle_available: p.cycle.available_cycle_hours(),
        };
        let mut segments: Vec<Segment> = Vec::new();

        if p.pickup_pending {
            if !day.fits_on_duty(rules.pickup_hours, rules) {
                return Ok(DayOutcome::Stalled { progress: p });
            }
            day.work(rules.pickup_hours);
            segments.push(
                Segment::new(Activity::Pickup, rules.pickup_hours, "Pickup - loading")
                    .at(p.labels.pickup.clone()),
            );
            p.pickup_pending = false;
        }

        while p.miles_remaining > MILES_EPS {
            if p.break_due(rules) {
                // Only stop for the break if some driving fits behind it.
                // Otherwise the daily reset that closes the day is the rest.
                if !self.drives_after_break(&p, &day) {
                    break;
                }
                day.rest(rules.break_duration_hours);
                segments.push(Segment::new(
                    Activity::Break,
                    rules.break_duration_hours,
                    format!(
                        "{}-minute break ({}-hour driving rule)",
                        (rules.break_duration_hours * 60.0).round(),
                        rules.break_after_hours
                    ),
                ));
                p.hours_since_break = 0.0;
                continue;
            }

            if p.fuel_due(rules) {
                if !day.fits_on_duty(rules.fuel_stop_hours, rules) {
                    break;
                }
                day.work(rules.fuel_stop_hours);
                p.fuel_stops += 1;
                segments.push(Segment::new(
                    Activity::FuelStop,
                    rules.fuel_stop_hours,
                    format!("Fuel stop at mile {:.0}", p.miles_driven),
                ));
                continue;
            }

            let hours = self.drive_limit(&p, &day);
            let finishes = hours > 0.0 && hours >= rules.hours_for_miles(p.miles_remaining);
            if hours <= HOURS_EPS && !finishes {
                break;
            }
            let miles = p.drive(hours, rules);
            day.work(hours);
            day.driven += hours;
            trace!(day = p.day_number, hours, miles, "driving segment");
            segments.push(Segment::new(
                Activity::Driving,
                hours,
                format!("Driving - {miles:.0} miles"),
            ));
        }

        if p.miles_remaining <= MILES_EPS
            && p.dropoff_pending
            && day.fits_on_duty(rules.dropoff_hours, rules)
        {
            day.work(rules.dropoff_hours);
            segments.push(
                Segment::new(Activity::Dropoff, rules.dropoff_hours, "Dropoff - unloading")
                    .at(p.labels.dropoff.clone()),
            );
            p.dropoff_pending = false;
        }

        if segments.is_empty() {
            return Ok(DayOutcome::Stalled { progress: p });
        }

        if !p.is_complete() {
            // The reset runs up to the next day's anchor.
            let reset_hours = (24.0 - day.elapsed).max(rules.daily_reset_hours);
            let status = if rules.sleeper_berth_reset {
                DutyStatus::SleeperBerth
            } else {
                DutyStatus::OffDuty
            };
            segments.push(
                Segment::new(
                    Activity::DailyReset,
                    reset_hours,
                    format!("{}-hour rest period (daily reset)", rules.daily_reset_hours),
                )
                .with_status(status),
            );
            day.rest(reset_hours);
            p.hours_since_break = 0.0;
        }

        p.cycle.consume(day.on_duty);
        let log = LogEmitter::new(rules).emit_day(
            p.day_number,
            anchor,
            &segments,
            p.cycle.available_cycle_hours(),
        )?;
        debug!(
            day = p.day_number,
            date = %log.date,
            driving = log.total_driving_hours,
            on_duty = log.total_on_duty_hours,
            miles_remaining = p.miles_remaining,
            cycle_used = p.cycle.used(),
            "planned duty day"
        );

        p.day_number += 1;
        p.day_start = anchor + Duration::hours(24);
        Ok(DayOutcome::Planned { progress: p, log })
    }

    /// Whether a break taken now leaves room for any driving, counting a
    /// fuel stop that is due at the same mile.
    fn drives_after_break(&self, p: &TripProgress, day: &DayBudget) -> bool {
        let rules = self.rules;
        let mut ahead = p.clone();
        let mut budget = *day;
        budget.rest(rules.break_duration_hours);
        ahead.hours_since_break = 0.0;
        if ahead.fuel_due(rules) {
            if !budget.fits_on_duty(rules.fuel_stop_hours, rules) {
                return false;
            }
            budget.work(rules.fuel_stop_hours);
            ahead.fuel_stops += 1;
        }
        self.drive_limit(&ahead, &budget) > HOURS_EPS
    }

    /// Longest driving segment allowed right now.
    fn drive_limit(&self, p: &TripProgress, day: &DayBudget) -> f64 {
        let rules = self.rules;
        let window_left = day.window_left(rules);
        let cycle_left = day.cycle_left();
        let trip_hours = rules.hours_for_miles(p.miles_remaining);
        let fuel_hours = rules.hours_for_miles(p.next_fuel_boundary(rules) - p.miles_driven);

        let mut limit = (rules.max_driving_hours - day.driven)
            .min(rules.break_after_hours - p.hours_since_break)
            .min(cycle_left)
            .min(window_left)
            .min(fuel_hours)
            .min(trip_hours);

        // Finishing today means the dropoff has to fit behind the last
        // segment; otherwise stop short and leave a real drive for tomorrow.
        if p.dropoff_pending && limit >= trip_hours - HOURS_EPS {
            let room = window_left.min(cycle_left) - rules.dropoff_hours;
            if room < trip_hours - HOURS_EPS {
                limit = room.min(trip_hours - MIN_CARRYOVER_HOURS);
            }
        }
        limit.max(0.0)
    }
}
