//! # dutyplan core library
//!
//! Plans a truck trip against hours-of-service rules: given a distance and
//! the hours already used in the driver's rolling cycle, it produces a
//! day-by-day record of duty status with every drive, break, fuel stop,
//! daily reset and cycle restart laid out on the clock.
//!
//! ## Architecture
//!
//! - **Planner**: a pure, synchronous day-by-day scheduler. No I/O.
//! - **Rules**: the regulatory limits as an immutable value
//! - **Route**: straight-line mileage estimates from coordinates
//! - **Storage**: TOML configuration and SQLite plan history
//!
//! ## Key Components
//!
//! - [`TripPlanner`]: plans a trip for a set of [`DutyRules`]
//! - [`TripPlan`]: the result, one [`DailyLog`] per day
//! - [`Config`]: application configuration management
//! - [`PlanStore`]: saved plans

pub mod duty;
pub mod error;
pub mod planner;
pub mod route;
pub mod rules;
pub mod storage;

pub use duty::{Activity, DailyLog, DutyStatus, LogEntry, TripPlan};
pub use error::{ConfigError, CoreError, DatabaseError, PlanningError, ValidationError};
pub use planner::{calculate_trip, StopLabels, TripPlanner, TripRequest};
pub use route::{Coordinate, RouteEstimate, RouteEstimator, StraightLineEstimator};
pub use rules::DutyRules;
pub use storage::{Config, PlanStore, TripMeta, TripSummary};
