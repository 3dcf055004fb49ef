//! Duty-status records.
//!
//! A trip plan is a list of [`DailyLog`]s, each a contiguous run of
//! [`LogEntry`] values in one of the four duty statuses.

mod plan;

pub use plan::{DailyLog, TripPlan};

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One of the four record-of-duty-status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyStatus {
    OffDuty,
    SleeperBerth,
    Driving,
    OnDutyNotDriving,
}

impl DutyStatus {
    pub const ALL: [DutyStatus; 4] = [
        DutyStatus::OffDuty,
        DutyStatus::SleeperBerth,
        DutyStatus::Driving,
        DutyStatus::OnDutyNotDriving,
    ];

    /// Short code as printed on paper logs.
    pub fn code(self) -> &'static str {
        match self {
            DutyStatus::OffDuty => "OFF",
            DutyStatus::SleeperBerth => "SB",
            DutyStatus::Driving => "D",
            DutyStatus::OnDutyNotDriving => "ON",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DutyStatus::OffDuty => "Off Duty",
            DutyStatus::SleeperBerth => "Sleeper Berth",
            DutyStatus::Driving => "Driving",
            DutyStatus::OnDutyNotDriving => "On Duty (Not Driving)",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DutyStatus::OffDuty => "off_duty",
            DutyStatus::SleeperBerth => "sleeper_berth",
            DutyStatus::Driving => "driving",
            DutyStatus::OnDutyNotDriving => "on_duty_not_driving",
        }
    }

    /// Counts against the daily window and the rolling cycle.
    pub fn is_on_duty(self) -> bool {
        matches!(self, DutyStatus::Driving | DutyStatus::OnDutyNotDriving)
    }

    /// Counts as rest (break, daily reset, restart).
    pub fn is_rest(self) -> bool {
        !self.is_on_duty()
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DutyStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DutyStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s || status.code() == s)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "status".to_string(),
                message: format!("unknown duty status '{s}'"),
            })
    }
}

/// What the driver is doing during an entry.
///
/// Finer-grained than [`DutyStatus`]: a fuel stop and a pickup are both
/// on duty (not driving), a break and a daily reset are both rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Pickup,
    Driving,
    Break,
    FuelStop,
    Dropoff,
    DailyReset,
    Restart,
}

impl Activity {
    /// Duty status this activity is logged under by default.
    ///
    /// A daily reset may instead be logged in the sleeper berth, see
    /// [`DutyRules::sleeper_berth_reset`](crate::DutyRules::sleeper_berth_reset).
    pub fn status(self) -> DutyStatus {
        match self {
            Activity::Driving => DutyStatus::Driving,
            Activity::Pickup | Activity::FuelStop | Activity::Dropoff => {
                DutyStatus::OnDutyNotDriving
            }
            Activity::Break | Activity::DailyReset | Activity::Restart => DutyStatus::OffDuty,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Activity::Pickup => "pickup",
            Activity::Driving => "driving",
            Activity::Break => "break",
            Activity::FuelStop => "fuel_stop",
            Activity::Dropoff => "dropoff",
            Activity::DailyReset => "daily_reset",
            Activity::Restart => "restart",
        }
    }
}

impl FromStr for Activity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let activity = match s {
            "pickup" => Activity::Pickup,
            "driving" => Activity::Driving,
            "break" => Activity::Break,
            "fuel_stop" => Activity::FuelStop,
            "dropoff" => Activity::Dropoff,
            "daily_reset" => Activity::DailyReset,
            "restart" => Activity::Restart,
            other => {
                return Err(ValidationError::InvalidValue {
                    field: "activity".to_string(),
                    message: format!("unknown activity '{other}'"),
                })
            }
        };
        Ok(activity)
    }
}

/// A single duty-status period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub status: DutyStatus,
    pub activity: Activity,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_hours: f64,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl LogEntry {
    /// Wall-clock length recomputed from the timestamps.
    pub fn elapsed_hours(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 3_600_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DutyStatus::OnDutyNotDriving).unwrap();
        assert_eq!(json, "\"on_duty_not_driving\"");
        let parsed: DutyStatus = serde_json::from_str("\"sleeper_berth\"").unwrap();
        assert_eq!(parsed, DutyStatus::SleeperBerth);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<DutyStatus>("\"napping\"").is_err());
        assert!("napping".parse::<DutyStatus>().is_err());
    }

    #[test]
    fn status_parses_codes_and_names() {
        assert_eq!("D".parse::<DutyStatus>().unwrap(), DutyStatus::Driving);
        assert_eq!("off_duty".parse::<DutyStatus>().unwrap(), DutyStatus::OffDuty);
    }

    #[test]
    fn activity_maps_to_status() {
        assert_eq!(Activity::FuelStop.status(), DutyStatus::OnDutyNotDriving);
        assert_eq!(Activity::Break.status(), DutyStatus::OffDuty);
        assert_eq!(Activity::DailyReset.status(), DutyStatus::OffDuty);
        assert!(Activity::Pickup.status().is_on_duty());
        assert!(Activity::Restart.status().is_rest());
    }

    #[test]
    fn activity_str_roundtrips() {
        for activity in [
            Activity::Pickup,
            Activity::Driving,
            Activity::Break,
            Activity::FuelStop,
            Activity::Dropoff,
            Activity::DailyReset,
            Activity::Restart,
        ] {
            assert_eq!(activity.as_str().parse::<Activity>().unwrap(), activity);
        }
    }
}
