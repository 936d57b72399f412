// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity scoring.
//!
//! Points are stored unrounded as `value * points_per_unit`. Rounding to two
//! decimals (half away from zero) happens only when points are displayed, so
//! recomputing from `(value, rate)` always reproduces the stored number.

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::ActivityType;

/// Rate used when an activity type has none configured.
pub const DEFAULT_POINTS_PER_UNIT: f64 = 1.0;

/// Largest configurable `points_per_unit`.
pub const MAX_POINTS_PER_UNIT: f64 = 10_000.0;

/// Largest point total a single activity may score. Keeps company and
/// competition sums finite.
pub const MAX_ACTIVITY_POINTS: f64 = 1e12;

/// Points for `value` units at `points_per_unit`.
pub fn compute_points(value: f64, points_per_unit: Option<f64>) -> f64 {
    value * points_per_unit.unwrap_or(DEFAULT_POINTS_PER_UNIT)
}

/// Points for `value` units of `activity_type`.
///
/// Fails when the product is not a storable number, even though `value`
/// itself passed [`validate_value`].
pub fn score(activity_type: &ActivityType, value: f64) -> Result<f64> {
    let points = compute_points(value, activity_type.points_per_unit);
    if !points.is_finite() || points > MAX_ACTIVITY_POINTS {
        return Err(AppError::InvalidValue(format!(
            "Value {} is too large for activity type {}",
            value, activity_type.name
        )));
    }
    Ok(points)
}

/// Check a configured rate: finite, non-negative, at most [`MAX_POINTS_PER_UNIT`].
pub fn validate_points_per_unit(rate: f64) -> Result<f64> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(AppError::InvalidValue(
            "Points per unit must be a finite, non-negative number".to_string(),
        ));
    }
    if rate > MAX_POINTS_PER_UNIT {
        return Err(AppError::InvalidValue(format!(
            "Points per unit must not exceed {}",
            MAX_POINTS_PER_UNIT
        )));
    }
    Ok(rate)
}

/// Round points for display.
pub fn round_points(points: f64) -> f64 {
    (points * 100.0).round() / 100.0
}

/// Check a logged quantity: present, finite, non-negative.
pub fn validate_value(value: Option<f64>) -> Result<f64> {
    match value {
        None => Err(AppError::InvalidValue("Value is required".to_string())),
        Some(v) if !v.is_finite() => Err(AppError::InvalidValue(
            "Value must be a finite number".to_string(),
        )),
        Some(v) if v < 0.0 => Err(AppError::InvalidValue(
            "Value must not be negative".to_string(),
        )),
        Some(v) => Ok(v),
    }
}

/// Reject activity dates after `today`.
pub fn validate_activity_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if date > today {
        return Err(AppError::InvalidDate(format!(
            "Activity date {} is in the future",
            date
        )));
    }
    Ok(())
}
