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

//! Trend-residual outlier detection.
//!
//! Fits one line over every observation that survived the window flags and
//! marks the points whose residual exceeds `sigma` population standard
//! deviations of all residuals.

use super::{ErrorFlagged, FlaggedObservation};
use crate::core::regression::{elapsed_hours, FitError, LinearFit};
use crate::core::stats::population_std;

/// Default residual threshold in standard deviations
pub const DEFAULT_SIGMA: f64 = 3.0;

// Residual spread below this is a perfect fit; nothing can stand out from it
const MIN_RESIDUAL_STD: f64 = 1e-9;

/// Outcome of the outlier pass
#[derive(Debug, Clone)]
pub struct OutlierPass {
    pub rows: Vec<FlaggedObservation>,
    /// The line fitted over the clean candidates, or why there is none.
    /// When the fit fails no row is marked as an outlier.
    pub fit: Result<LinearFit, FitError>,
    pub residual_std: Option<f64>,
}

impl OutlierPass {
    pub fn outlier_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_outlier).count()
    }
}

/// Mark trend outliers among the rows without error flags
pub fn flag_outliers(rows: Vec<ErrorFlagged>, sigma: f64) -> OutlierPass {
    let candidates: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.has_error())
        .map(|(idx, _)| idx)
        .collect();

    let timestamps: Vec<_> = candidates
        .iter()
        .map(|&idx| rows[idx].observation.timestamp())
        .collect();
    let xs = elapsed_hours(&timestamps);
    let ys: Vec<f64> = candidates
        .iter()
        .map(|&idx| rows[idx].observation.value as f64)
        .collect();

    let mut is_outlier = vec![false; rows.len()];
    let fit = LinearFit::fit(&xs, &ys);
    let mut residual_std = None;

    match &fit {
        Ok(line) => {
            let residuals = line.residuals(&xs, &ys);
            let std = population_std(&residuals).unwrap_or(0.0);
            residual_std = Some(std);

            if std > MIN_RESIDUAL_STD {
                let limit = sigma * std;
                for (&idx, residual) in candidates.iter().zip(&residuals) {
                    is_outlier[idx] = residual.abs() > limit;
                }
            }
        }
        Err(e) => {
            tracing::debug!("Skipping outlier detection: {e}");
        }
    }

    let pass = OutlierPass {
        rows: rows
            .into_iter()
            .zip(is_outlier)
            .map(|(flagged, is_outlier)| FlaggedObservation {
                flagged,
                is_outlier,
            })
            .collect(),
        fit,
        residual_std,
    };

    tracing::debug!(
        "Outlier pass: {} candidates, {} outliers at {sigma} sigma",
        candidates.len(),
        pass.outlier_count()
    );

    pass
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::ErrorClass;
    use crate::parser::line::ChatRecord;
    use crate::parser::message::{ClassifiedRecord, MessageKind, Observation};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 14)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .expect("valid timestamp")
    }

    fn row(hour: i64, value: i64, error_low: bool, error_high: bool) -> ErrorFlagged {
        let record = ChatRecord::new(
            t0() + Duration::hours(hour),
            "Alice".to_string(),
            value.to_string(),
            hour as usize + 1,
        );
        ErrorFlagged {
            observation: Observation {
                record: ClassifiedRecord {
                    record,
                    kind: MessageKind::ContainsNumber,
                    counter_value: Some(value),
                    member_delta: 0,
                },
                value,
            },
            error_low,
            error_high,
        }
    }

    fn series(values: &[i64]) -> Vec<ErrorFlagged> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| row(i as i64, v, false, false))
            .collect()
    }

    #[test]
    fn test_five_point_scenario() {
        let pass = flag_outliers(series(&[100, 105, 40, 112, 118]), DEFAULT_SIGMA);
        let fit = pass.fit.expect("fit should succeed");
        assert!((fit.slope - 4.3).abs() < 1e-9);

        // With five points no residual can exceed sqrt(4) = 2 population std
        assert_eq!(pass.outlier_count(), 0);

        let pass = flag_outliers(series(&[100, 105, 40, 112, 118]), 1.5);
        let flags: Vec<bool> = pass.rows.iter().map(|r| r.is_outlier).collect();
        assert_eq!(flags, [false, false, true, false, false]);
        assert_eq!(pass.rows[2].error_class(), ErrorClass::Outlier);
    }

    #[test]
    fn test_gross_drop_in_long_series() {
        let mut values: Vec<i64> = (0..20).map(|i| 100 + 5 * i).collect();
        values[10] = 20;
        let pass = flag_outliers(series(&values), DEFAULT_SIGMA);
        let outliers: Vec<usize> = pass
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_outlier)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(outliers, [10]);
    }

    #[test]
    fn test_error_rows_are_never_outliers() {
        let mut rows = series(&[100, 105, 110, 115, 120, 125, 130, 135, 140, 145]);
        rows.push(row(10, 5, true, false));
        rows.push(row(11, 900, false, true));
        let pass = flag_outliers(rows, DEFAULT_SIGMA);

        assert!(!pass.rows[10].is_outlier);
        assert!(!pass.rows[11].is_outlier);
        assert_eq!(pass.rows[10].error_class(), ErrorClass::Low);
        assert_eq!(pass.rows[11].error_class(), ErrorClass::High);
        // The flagged rows did not take part in the fit
        let fit = pass.fit.expect("fit should succeed");
        assert_eq!(fit.points, 10);
        assert!((fit.slope - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_fit_flags_nothing() {
        let pass = flag_outliers(series(&[100]), DEFAULT_SIGMA);
        assert_eq!(pass.fit, Err(FitError::TooFewPoints { found: 1 }));
        assert_eq!(pass.outlier_count(), 0);
        assert_eq!(pass.rows.len(), 1);

        let pass = flag_outliers(vec![row(0, 1, true, false), row(1, 2, false, true)], 3.0);
        assert_eq!(pass.fit, Err(FitError::TooFewPoints { found: 0 }));
        assert_eq!(pass.residual_std, None);
    }

    #[test]
    fn test_perfect_line_has_no_outliers() {
        let values: Vec<i64> = (0..50).map(|i| 7 * i).collect();
        let pass = flag_outliers(series(&values), DEFAULT_SIGMA);
        assert_eq!(pass.outlier_count(), 0);
    }
}
