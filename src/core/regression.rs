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

//! Ordinary least squares with one predictor.
//!
//! Both the outlier pass and the trend estimator regress the counter value on
//! hours elapsed since the first timestamp of whatever subset they were given.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Why a line could not be fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FitError {
    #[error("need at least 2 points for a linear fit, found {found}")]
    TooFewPoints { found: usize },

    #[error("all points share the same timestamp, slope is undefined")]
    ZeroVariance,
}

/// `value = intercept + slope * hours`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub points: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope.mul_add(x, self.intercept)
    }

    /// Least-squares fit of `ys` on `xs` with an intercept term.
    ///
    /// The slices must have equal length; extra elements of the longer one are ignored.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self, FitError> {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return Err(FitError::TooFewPoints { found: n });
        }
        let (xs, ys) = (&xs[..n], &ys[..n]);

        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }

        if sxx <= f64::EPSILON {
            return Err(FitError::ZeroVariance);
        }

        let slope = sxy / sxx;
        Ok(Self {
            slope,
            intercept: slope.mul_add(-mean_x, mean_y),
            points: n,
        })
    }

    /// Observed minus predicted, element-wise
    pub fn residuals(&self, xs: &[f64], ys: &[f64]) -> Vec<f64> {
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| y - self.predict(x))
            .collect()
    }
}

/// Hours elapsed since the earliest timestamp in `timestamps`, fractional
pub fn elapsed_hours(timestamps: &[NaiveDateTime]) -> Vec<f64> {
    let Some(origin) = timestamps.iter().min().copied() else {
        return Vec::new();
    };

    timestamps
        .iter()
        .map(|ts| hours_between(origin, *ts))
        .collect()
}

pub fn hours_between(origin: NaiveDateTime, ts: NaiveDateTime) -> f64 {
    (ts - origin).num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [5.0, 7.0, 9.0, 11.0];
        let fit = LinearFit::fit(&xs, &ys).expect("fit should succeed");
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 5.0));
        assert_eq!(fit.points, 4);
        assert!(close(fit.predict(10.0), 25.0));
        assert!(fit.residuals(&xs, &ys).iter().all(|r| r.abs() < 1e-9));
    }

    #[test]
    fn test_noisy_line() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [100.0, 105.0, 40.0, 112.0, 118.0];
        let fit = LinearFit::fit(&xs, &ys).expect("fit should succeed");
        assert!(close(fit.slope, 4.3));
        assert!(close(fit.intercept, 86.4));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(
            LinearFit::fit(&[], &[]),
            Err(FitError::TooFewPoints { found: 0 })
        );
        assert_eq!(
            LinearFit::fit(&[1.0], &[3.0]),
            Err(FitError::TooFewPoints { found: 1 })
        );
        assert_eq!(
            LinearFit::fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(FitError::ZeroVariance)
        );
    }

    #[test]
    fn test_elapsed_hours_from_earliest() {
        let t0 = NaiveDate::from_ymd_opt(2025, 6, 14)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .expect("valid timestamp");
        let stamps = [
            t0 + Duration::minutes(90),
            t0,
            t0 + Duration::hours(26),
        ];
        let hours = elapsed_hours(&stamps);
        assert!(close(hours[0], 1.5));
        assert!(close(hours[1], 0.0));
        assert!(close(hours[2], 26.0));
        assert!(elapsed_hours(&[]).is_empty());
    }
}
