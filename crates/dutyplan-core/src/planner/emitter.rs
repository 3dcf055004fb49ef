//! Turns a day's planned segments into timestamped log entries.

use chrono::{Duration, NaiveDateTime};

use crate::duty::{Activity, DailyLog, DutyStatus, LogEntry};
use crate::error::PlanningError;
use crate::rules::DutyRules;

/// A planned block of time before it is pinned to the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub activity: Activity,
    pub status: DutyStatus,
    pub hours: f64,
    pub notes: String,
    pub location: Option<String>,
}

impl Segment {
    pub fn new(activity: Activity, hours: f64, notes: impl Into<String>) -> Self {
        Self {
            activity,
            status: activity.status(),
            hours,
            notes: notes.into(),
            location: None,
        }
    }

    pub fn with_status(mut self, status: DutyStatus) -> Self {
        self.status = status;
        self
    }

    pub fn at(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }
}

/// Convert fractional hours to a chrono duration at millisecond precision.
pub fn hours_to_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * 3_600_000.0).round() as i64)
}

pub struct LogEmitter<'a> {
    rules: &'a DutyRules,
}

impl<'a> LogEmitter<'a> {
    pub fn new(rules: &'a DutyRules) -> Self {
        Self { rules }
    }

    /// Pin `segments` to the clock starting at `anchor` and total them up.
    ///
    /// Every boundary is computed from the anchor plus the running offset,
    /// so each entry ends exactly where the next one starts.
    ///
    /// # Errors
    /// Returns [`PlanningError::NonFiniteDuration`] if any segment has a
    /// negative or non-finite length.
    pub fn emit_day(
        &self,
        day_number: u32,
        anchor: NaiveDateTime,
        segments: &[Segment],
        cycle_hours_remaining: f64,
    ) -> Result<DailyLog, PlanningError> {
        let mut entries = Vec::with_capacity(segments.len());
        let mut offset = 0.0;
        let mut start = anchor;

        for segment in segments {
            if !segment.hours.is_finite() || segment.hours < 0.0 {
                return Err(PlanningError::NonFiniteDuration {
                    day: day_number,
                    what: segment.activity.as_str().to_string(),
                    hours: segment.hours,
                });
            }
            offset += segment.hours;
            let end = anchor + hours_to_duration(offset);
            entries.push(LogEntry {
                status: segment.status,
                activity: segment.activity,
                start_time: start,
                end_time: end,
                duration_hours: segment.hours,
                notes: segment.notes.clone(),
                location: segment.location.clone(),
            });
            start = end;
        }

        let mut log = DailyLog {
            day_number,
            date: anchor.date(),
            log_entries: entries,
            total_driving_hours: 0.0,
            total_on_duty_hours: 0.0,
            total_off_duty_hours: 0.0,
            remaining_drive_time: 0.0,
            remaining_on_duty_time: 0.0,
            cycle_hours_remaining: cycle_hours_remaining.max(0.0),
            is_restart: false,
        };
        log.total_driving_hours = log.hours_in(DutyStatus::Driving);
        log.total_on_duty_hours = log.hours_in(DutyStatus::OnDutyNotDriving);
        log.total_off_duty_hours =
            log.hours_in(DutyStatus::OffDuty) + log.hours_in(DutyStatus::SleeperBerth);
        log.remaining_drive_time =
            (self.rules.max_driving_hours - log.total_driving_hours).max(0.0);
        log.remaining_on_duty_time = (self.rules.on_duty_window_hours
            - log.total_driving_hours
            - log.total_on_duty_hours)
            .max(0.0);
        Ok(log)
    }

    /// A restart day: one off-duty entry of exactly the restart duration,
    /// with every budget back at its cap.
    pub fn emit_restart(&self, day_number: u32, anchor: NaiveDateTime) -> DailyLog {
        let hours = self.rules.restart_hours;
        DailyLog {
            day_number,
            date: anchor.date(),
            log_entries: vec![LogEntry {
                status: DutyStatus::OffDuty,
                activity: Activity::Restart,
                start_time: anchor,
                end_time: anchor + hours_to_duration(hours),
                duration_hours: hours,
                notes: format!("{hours}-hour restart (cycle reset)"),
                location: None,
            }],
            total_driving_hours: 0.0,
            total_on_duty_hours: 0.0,
            total_off_duty_hours: hours,
            remaining_drive_time: self.rules.max_driving_hours,
            remaining_on_duty_time: self.rules.on_duty_window_hours,
            cycle_hours_remaining: self.rules.cycle_cap_hours,
            is_restart: true,
        }
    }
}
