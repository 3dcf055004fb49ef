//! Regulatory and operational constants for trip planning.
//!
//! [`DutyRules`] is an immutable value handed to the planner. The defaults
//! describe the property-carrying 70-hour/8-day regime:
//! - 11 hours of driving per duty day
//! - 14-hour on-duty window
//! - 30-minute break after 8 cumulative driving hours
//! - 10 consecutive hours off duty between duty days
//! - 34-hour restart to reset the 70-hour cycle

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Hours-of-service rules plus the operational assumptions used to
/// turn miles into time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyRules {
    /// Maximum driving hours per duty day
    #[serde(default = "default_max_driving_hours")]
    pub max_driving_hours: f64,
    /// Maximum elapsed hours from coming on duty to the next daily reset
    #[serde(default = "default_on_duty_window_hours")]
    pub on_duty_window_hours: f64,
    /// Cumulative driving hours that require a break
    #[serde(default = "default_break_after_hours")]
    pub break_after_hours: f64,
    /// Length of the mandatory break
    #[serde(default = "default_break_duration_hours")]
    pub break_duration_hours: f64,
    /// Rolling cycle budget of on-duty plus driving hours
    #[serde(default = "default_cycle_cap_hours")]
    pub cycle_cap_hours: f64,
    /// Length of the rolling cycle in days
    #[serde(default = "default_cycle_days")]
    pub cycle_days: u32,
    /// Off-duty period that resets the cycle
    #[serde(default = "default_restart_hours")]
    pub restart_hours: f64,
    /// Off-duty period between duty days
    #[serde(default = "default_daily_reset_hours")]
    pub daily_reset_hours: f64,
    /// A restart is scheduled when remaining cycle hours drop below this
    #[serde(default = "default_restart_threshold_hours")]
    pub restart_threshold_hours: f64,
    /// Average travel speed
    #[serde(default = "default_speed_mph")]
    pub speed_mph: f64,
    /// Miles between fuel stops
    #[serde(default = "default_fuel_interval_miles")]
    pub fuel_interval_miles: f64,
    #[serde(default = "default_fuel_stop_hours")]
    pub fuel_stop_hours: f64,
    #[serde(default = "default_pickup_hours")]
    pub pickup_hours: f64,
    #[serde(default = "default_dropoff_hours")]
    pub dropoff_hours: f64,
    /// Log the daily reset as sleeper-berth time instead of off duty
    #[serde(default)]
    pub sleeper_berth_reset: bool,
}

fn default_max_driving_hours() -> f64 {
    11.0
}
fn default_on_duty_window_hours() -> f64 {
    14.0
}
fn default_break_after_hours() -> f64 {
    8.0
}
fn default_break_duration_hours() -> f64 {
    0.5
}
fn default_cycle_cap_hours() -> f64 {
    70.0
}
fn default_cycle_days() -> u32 {
    8
}
fn default_restart_hours() -> f64 {
    34.0
}
fn default_daily_reset_hours() -> f64 {
    10.0
}
fn default_restart_threshold_hours() -> f64 {
    1.0
}
fn default_speed_mph() -> f64 {
    60.0
}
fn default_fuel_interval_miles() -> f64 {
    1000.0
}
fn default_fuel_stop_hours() -> f64 {
    0.5
}
fn default_pickup_hours() -> f64 {
    1.0
}
fn default_dropoff_hours() -> f64 {
    1.0
}

impl Default for DutyRules {
    fn default() -> Self {
        Self {
            max_driving_hours: default_max_driving_hours(),
            on_duty_window_hours: default_on_duty_window_hours(),
            break_after_hours: default_break_after_hours(),
            break_duration_hours: default_break_duration_hours(),
            cycle_cap_hours: default_cycle_cap_hours(),
            cycle_days: default_cycle_days(),
            restart_hours: default_restart_hours(),
            daily_reset_hours: default_daily_reset_hours(),
            restart_threshold_hours: default_restart_threshold_hours(),
            speed_mph: default_speed_mph(),
            fuel_interval_miles: default_fuel_interval_miles(),
            fuel_stop_hours: default_fuel_stop_hours(),
            pickup_hours: default_pickup_hours(),
            dropoff_hours: default_dropoff_hours(),
            sleeper_berth_reset: false,
        }
    }
}

impl DutyRules {
    /// Check that the rules describe a schedulable regime.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidRule`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("max_driving_hours", self.max_driving_hours),
            ("on_duty_window_hours", self.on_duty_window_hours),
            ("break_after_hours", self.break_after_hours),
            ("cycle_cap_hours", self.cycle_cap_hours),
            ("restart_hours", self.restart_hours),
            ("daily_reset_hours", self.daily_reset_hours),
            ("speed_mph", self.speed_mph),
            ("fuel_interval_miles", self.fuel_interval_miles),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, format!("must be a positive number, got {value}")));
            }
        }

        let non_negative = [
            ("break_duration_hours", self.break_duration_hours),
            ("restart_threshold_hours", self.restart_threshold_hours),
            ("fuel_stop_hours", self.fuel_stop_hours),
            ("pickup_hours", self.pickup_hours),
            ("dropoff_hours", self.dropoff_hours),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("must be >= 0, got {value}")));
            }
        }

        if self.cycle_days == 0 {
            return Err(invalid("cycle_days", "must be at least 1".to_string()));
        }
        if self.max_driving_hours > self.on_duty_window_hours {
            return Err(invalid(
                "max_driving_hours",
                format!(
                    "cannot exceed the on-duty window ({}h)",
                    self.on_duty_window_hours
                ),
            ));
        }
        if self.break_after_hours > self.max_driving_hours {
            return Err(invalid(
                "break_after_hours",
                format!(
                    "cannot exceed the daily driving cap ({}h)",
                    self.max_driving_hours
                ),
            ));
        }
        if self.on_duty_window_hours + self.daily_reset_hours > 24.0 {
            return Err(invalid(
                "on_duty_window_hours",
                format!(
                    "window plus daily reset ({}h) must fit in 24 hours",
                    self.daily_reset_hours
                ),
            ));
        }
        // Pickup and dropoff both land inside the first/last window.
        if self.pickup_hours + self.dropoff_hours >= self.on_duty_window_hours {
            return Err(invalid(
                "pickup_hours",
                "pickup plus dropoff must leave room for driving in the on-duty window".to_string(),
            ));
        }
        if self.restart_threshold_hours > self.cycle_cap_hours {
            return Err(invalid(
                "restart_threshold_hours",
                format!("cannot exceed the cycle cap ({}h)", self.cycle_cap_hours),
            ));
        }
        Ok(())
    }

    /// Driving hours needed to cover `miles` at the configured speed.
    pub fn hours_for_miles(&self, miles: f64) -> f64 {
        miles / self.speed_mph
    }

    /// Miles covered by `hours` of driving.
    pub fn miles_for_hours(&self, hours: f64) -> f64 {
        hours * self.speed_mph
    }

    /// Naive day estimate: driving hours divided by the daily cap, rounded up.
    pub fn estimated_days(&self, miles: f64) -> u32 {
        (self.hours_for_miles(miles) / self.max_driving_hours - 1e-9)
            .ceil()
            .max(0.0) as u32
    }

    /// Number of fuel stops a trip of `miles` needs: one per interval
    /// boundary strictly before arrival.
    pub fn fuel_stops_for(&self, miles: f64) -> u32 {
        if miles <= 0.0 {
            return 0;
        }
        ((miles / self.fuel_interval_miles - 1e-8).ceil() as u32).saturating_sub(1)
    }
}

fn invalid(field: &str, message: String) -> ValidationError {
    ValidationError::InvalidRule {
        field: field.to_string(),
        message,
    }
}
