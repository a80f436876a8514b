// BeerTally - GPL-3.0-or-later
// This file is part of BeerTally.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// BeerTally is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// BeerTally is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with BeerTally.  If not, see <https://www.gnu.org/licenses/>.

//! Linear trend over the fully cleaned tally and milestone projections.

pub mod report;

use crate::anomaly::{ErrorClass, FlaggedObservation};
use crate::core::regression::{elapsed_hours, hours_between, FitError, LinearFit};
use chrono::{Duration, NaiveDateTime};

/// The long-term goal of the group
pub const DEFAULT_TARGET: i64 = 1_000_000;

/// Spacing of the round milestones reported alongside the goal
pub const DEFAULT_MILESTONE_STEP: i64 = 10_000;

/// Linear model of the cleaned tally over time
#[derive(Debug, Clone)]
pub struct TrendModel {
    pub fit: LinearFit,
    /// Earliest timestamp of the fitted subset; hour zero of the model
    pub origin: NaiveDateTime,
    /// Latest timestamp of the fitted subset
    pub last_seen: NaiveDateTime,
    /// Highest tally value in the fitted subset
    pub max_value: i64,
}

impl TrendModel {
    /// Fit the trend over rows classed `None`, minus any excluded timestamps
    pub fn fit(
        rows: &[FlaggedObservation],
        exclusions: &[NaiveDateTime],
    ) -> Result<Self, FitError> {
        let clean = clean_rows(rows, exclusions);

        let timestamps: Vec<NaiveDateTime> =
            clean.iter().map(|r| r.observation().timestamp()).collect();
        let xs = elapsed_hours(&timestamps);
        let ys: Vec<f64> = clean.iter().map(|r| r.observation().value as f64).collect();

        let fit = LinearFit::fit(&xs, &ys)?;

        // A successful fit has at least two rows, so these are always present
        let origin = timestamps.iter().min().copied().ok_or(FitError::TooFewPoints { found: 0 })?;
        let last_seen = timestamps.iter().max().copied().ok_or(FitError::TooFewPoints { found: 0 })?;
        let max_value = clean
            .iter()
            .map(|r| r.observation().value)
            .max()
            .ok_or(FitError::TooFewPoints { found: 0 })?;

        tracing::debug!(
            "Trend over {} clean rows: {:.3} per hour, intercept {:.2}",
            fit.points,
            fit.slope,
            fit.intercept
        );

        Ok(Self {
            fit,
            origin,
            last_seen,
            max_value,
        })
    }

    pub const fn rate_per_hour(&self) -> f64 {
        self.fit.slope
    }

    pub const fn intercept(&self) -> f64 {
        self.fit.intercept
    }

    /// Model value at a timestamp
    pub fn value_at(&self, ts: NaiveDateTime) -> f64 {
        self.fit.predict(hours_between(self.origin, ts))
    }

    /// Project when the tally reaches `target`, starting from the highest value seen
    pub fn forecast(&self, target: i64) -> Forecast {
        estimate_time_to_target(self.rate_per_hour(), self.max_value, self.last_seen, target)
    }

    /// Project the next round milestone above the current maximum
    pub fn forecast_next_milestone(&self, step: i64) -> Forecast {
        self.forecast(next_milestone(self.max_value, step))
    }
}

/// Rows that feed the trend: class `None` and not on the exclusion list
pub fn clean_rows<'a>(
    rows: &'a [FlaggedObservation],
    exclusions: &[NaiveDateTime],
) -> Vec<&'a FlaggedObservation> {
    rows.iter()
        .filter(|r| r.error_class() == ErrorClass::None)
        .filter(|r| !exclusions.contains(&r.observation().timestamp()))
        .collect()
}

/// Projection towards a target value.
///
/// Every duration is `None` when the rate is not positive, since a flat or
/// shrinking tally never gets there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forecast {
    pub rate_per_hour: f64,
    pub hours_needed: Option<f64>,
    pub days_needed: Option<f64>,
    pub years_needed: Option<f64>,
    /// `None` also when the date falls outside the representable calendar
    pub estimated_date: Option<NaiveDateTime>,
    pub start_value: i64,
    pub target_value: i64,
}

pub fn estimate_time_to_target(
    rate_per_hour: f64,
    start_value: i64,
    last_seen: NaiveDateTime,
    target_value: i64,
) -> Forecast {
    let needed = target_value as f64 - start_value as f64;
    let hours_needed = (rate_per_hour > 0.0).then(|| needed / rate_per_hour);
    let days_needed = hours_needed.map(|h| h / 24.0);
    let years_needed = days_needed.map(|d| d / 365.0);
    let estimated_date = days_needed.and_then(|days| add_days(last_seen, days));

    Forecast {
        rate_per_hour,
        hours_needed,
        days_needed,
        years_needed,
        estimated_date,
        start_value,
        target_value,
    }
}

/// Smallest multiple of `step` that is at least `value`.
///
/// Falls back to `value` itself when that multiple does not fit an `i64`.
pub const fn next_milestone(value: i64, step: i64) -> i64 {
    if step <= 0 || value.rem_euclid(step) == 0 {
        return value;
    }
    match (value.div_euclid(step) + 1).checked_mul(step) {
        Some(milestone) => milestone,
        None => value,
    }
}

fn add_days(ts: NaiveDateTime, days: f64) -> Option<NaiveDateTime> {
    let millis = days * 86_400_000.0;
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    ts.checked_add_signed(Duration::try_milliseconds(millis.round() as i64)?)
}
