use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::cycle::CycleTracker;
use super::{HOURS_EPS, MILES_EPS};
use crate::rules::DutyRules;

/// Optional location names attached to the pickup and dropoff entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopLabels {
    /// Where the driver sets out from. Kept with saved trips only; no log
    /// entry happens there, so it is never attached to one.
    pub origin: Option<String>,
    pub pickup: Option<String>,
    pub dropoff: Option<String>,
}

/// Everything that carries over from one planned day to the next.
///
/// Each planning step takes a `TripProgress` by value and hands back the
/// updated one; nothing else is mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TripProgress {
    /// Number the next emitted day will carry
    pub day_number: u32,
    /// Clock anchor of the next day
    pub day_start: NaiveDateTime,
    pub miles_remaining: f64,
    pub miles_driven: f64,
    pub fuel_stops: u32,
    /// Driving hours since the last qualifying break
    pub hours_since_break: f64,
    pub cycle: CycleTracker,
    pub pickup_pending: bool,
    pub dropoff_pending: bool,
    pub labels: StopLabels,
}

impl TripProgress {
    pub fn new(
        total_miles: f64,
        cycle_used_hours: f64,
        start: NaiveDateTime,
        rules: &DutyRules,
    ) -> Self {
        Self {
            day_number: 1,
            day_start: start,
            miles_remaining: total_miles,
            miles_driven: 0.0,
            fuel_stops: 0,
            hours_since_break: 0.0,
            cycle: CycleTracker::new(rules.cycle_cap_hours, cycle_used_hours),
            pickup_pending: true,
            dropoff_pending: true,
            labels: StopLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: StopLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Pickup done, all miles driven, dropoff done.
    pub fn is_complete(&self) -> bool {
        !self.pickup_pending && !self.dropoff_pending && self.miles_remaining <= MILES_EPS
    }

    /// Cumulative mileage at which the next fuel stop falls due.
    pub fn next_fuel_boundary(&self, rules: &DutyRules) -> f64 {
        f64::from(self.fuel_stops + 1) * rules.fuel_interval_miles
    }

    /// A fuel boundary has been crossed and miles remain to be driven.
    pub fn fuel_due(&self, rules: &DutyRules) -> bool {
        self.miles_remaining > MILES_EPS
            && self.miles_driven >= self.next_fuel_boundary(rules) - MILES_EPS
    }

    pub fn break_due(&self, rules: &DutyRules) -> bool {
        self.hours_since_break >= rules.break_after_hours - HOURS_EPS
    }

    /// Record `hours` of driving. Distances within rounding noise of a
    /// fuel boundary or of the destination are snapped onto it.
    pub(crate) fn drive(&mut self, hours: f64, rules: &DutyRules) -> f64 {
        let mut miles = rules.miles_for_hours(hours);
        let left = self.miles_remaining - miles;
        if left.abs() <= MILES_EPS || rules.hours_for_miles(left) <= HOURS_EPS {
            miles = self.miles_remaining;
        }
        self.miles_driven += miles;
        self.miles_remaining = (self.miles_remaining - miles).max(0.0);
        if self.miles_remaining <= MILES_EPS {
            self.miles_remaining = 0.0;
        }
        let boundary = self.next_fuel_boundary(rules);
        if (self.miles_driven - boundary).abs() <= MILES_EPS {
            self.miles_driven = boundary;
        }
        self.hours_since_break += hours;
        miles
    }

    /// Move the anchor to the first day boundary at or after `t`.
    pub(crate) fn advance_past(&mut self, t: NaiveDateTime) {
        let day = Duration::hours(24);
        while self.day_start < t {
            self.day_start += day;
        }
    }
}
