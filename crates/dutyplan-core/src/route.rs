//! Distance estimation between waypoints.
//!
//! The planner only ever sees a mileage figure. This module turns a list of
//! coordinates into one when no routing service is available.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ValidationError};

const EARTH_RADIUS_KM: f64 = 6371.0;
const MILES_PER_KM: f64 = 0.621371;

/// Roads run about 20% longer than the great-circle distance.
pub const DEFAULT_ROAD_FACTOR: f64 = 1.2;

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// # Errors
    /// Returns [`ValidationError::InvalidCoordinate`] if either value is
    /// out of range or not finite.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        let coord = Self { lat, lon };
        coord.validate()?;
        Ok(coord)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(ValidationError::InvalidCoordinate {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// Parses `"lat,lon"`.
impl FromStr for Coordinate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ValidationError::InvalidValue {
            field: "coordinate".into(),
            message: format!("expected 'lat,lon', got '{s}'"),
        };
        let (lat, lon) = s.split_once(',').ok_or_else(bad)?;
        let lat: f64 = lat.trim().parse().map_err(|_| bad())?;
        let lon: f64 = lon.trim().parse().map_err(|_| bad())?;
        Coordinate::new(lat, lon)
    }
}

/// Great-circle distance in miles.
pub fn haversine_miles(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().min(1.0).asin();
    c * EARTH_RADIUS_KM * MILES_PER_KM
}

/// Distance along a route, leg by leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    /// Miles between consecutive waypoints
    pub legs: Vec<f64>,
    pub total_miles: f64,
}

/// Source of trip mileage.
pub trait RouteEstimator {
    /// Estimate the driving distance through `waypoints` in order
    /// (typically current location, pickup, dropoff).
    ///
    /// # Errors
    /// Returns a validation error for fewer than two waypoints or an
    /// out-of-range coordinate.
    fn estimate_miles(&self, waypoints: &[Coordinate]) -> Result<RouteEstimate>;
}

/// Great-circle legs scaled by a road factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLineEstimator {
    road_factor: f64,
}

impl StraightLineEstimator {
    pub fn new() -> Self {
        Self {
            road_factor: DEFAULT_ROAD_FACTOR,
        }
    }

    /// # Errors
    /// Returns [`ValidationError::InvalidValue`] unless the factor is a
    /// finite number >= 1.
    pub fn with_road_factor(road_factor: f64) -> Result<Self, ValidationError> {
        if !road_factor.is_finite() || road_factor < 1.0 {
            return Err(ValidationError::InvalidValue {
                field: "road_factor".into(),
                message: format!("must be >= 1, got {road_factor}"),
            });
        }
        Ok(Self { road_factor })
    }

    pub fn road_factor(&self) -> f64 {
        self.road_factor
    }
}

impl Default for StraightLineEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteEstimator for StraightLineEstimator {
    fn estimate_miles(&self, waypoints: &[Coordinate]) -> Result<RouteEstimate> {
        if waypoints.len() < 2 {
            return Err(ValidationError::TooFewWaypoints(waypoints.len()).into());
        }
        for point in waypoints {
            point.validate()?;
        }

        let legs: Vec<f64> = waypoints
            .windows(2)
            .map(|pair| haversine_miles(pair[0], pair[1]) * self.road_factor)
            .collect();
        let total_miles = legs.iter().sum();
        debug!(legs = legs.len(), total_miles, "estimated straight-line route");
        Ok(RouteEstimate { legs, total_miles })
    }
}
