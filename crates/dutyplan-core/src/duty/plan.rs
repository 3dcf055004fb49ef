use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Activity, DutyStatus, LogEntry};

/// One calendar day of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    /// 1-based position in the trip
    pub day_number: u32,
    pub date: NaiveDate,
    pub log_entries: Vec<LogEntry>,
    pub total_driving_hours: f64,
    /// On duty, not driving
    pub total_on_duty_hours: f64,
    /// Off duty and sleeper berth
    pub total_off_duty_hours: f64,
    pub remaining_drive_time: f64,
    pub remaining_on_duty_time: f64,
    pub cycle_hours_remaining: f64,
    pub is_restart: bool,
}

impl DailyLog {
    /// Start of the first entry.
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        self.log_entries.first().map(|e| e.start_time)
    }

    /// End of the last entry.
    pub fn end_time(&self) -> Option<NaiveDateTime> {
        self.log_entries.last().map(|e| e.end_time)
    }

    /// Driving plus on-duty-not-driving hours, i.e. what the day costs the cycle.
    pub fn cycle_hours_used(&self) -> f64 {
        self.total_driving_hours + self.total_on_duty_hours
    }

    /// Sum of entry durations with the given status.
    pub fn hours_in(&self, status: DutyStatus) -> f64 {
        self.log_entries
            .iter()
            .filter(|e| e.status == status)
            .map(|e| e.duration_hours)
            .sum()
    }

    pub fn entries_of(&self, activity: Activity) -> impl Iterator<Item = &LogEntry> {
        self.log_entries.iter().filter(move |e| e.activity == activity)
    }
}

/// Complete output of one planning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
    pub total_miles: f64,
    pub total_driving_hours: f64,
    /// Driving hours divided by the daily cap, rounded up
    pub estimated_days: u32,
    pub actual_days: u32,
    pub num_fuel_stops: u32,
    pub restart_needed: bool,
    pub cycle_used_before: f64,
    pub cycle_used_after: f64,
    pub daily_logs: Vec<DailyLog>,
}

impl TripPlan {
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.daily_logs.iter().flat_map(|d| d.log_entries.iter())
    }

    /// Driving hours summed over all days.
    pub fn driven_hours(&self) -> f64 {
        self.daily_logs.iter().map(|d| d.total_driving_hours).sum()
    }

    /// Start of the first logged entry.
    pub fn departure(&self) -> Option<NaiveDateTime> {
        self.daily_logs.first().and_then(DailyLog::start_time)
    }

    /// End of the last logged entry, i.e. when the dropoff finishes.
    pub fn arrival(&self) -> Option<NaiveDateTime> {
        self.daily_logs.last().and_then(DailyLog::end_time)
    }
}
