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

//! Local-window error flags.
//!
//! The tally only ever grows, so a value far below the median of the values
//! posted just before it, or far above the median of the values posted just
//! after it, is almost certainly a typo. Both masks look at raw values only and
//! are independent of each other.

use super::ErrorFlagged;
use crate::core::stats::median;
use crate::parser::message::Observation;

/// Default number of neighbours on each side
pub const DEFAULT_WINDOW: usize = 10;

/// Default distance from the neighbourhood median that counts as an error
pub const DEFAULT_MARGIN: f64 = 10.0;

/// Window size and margin for the error flags
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPolicy {
    pub window: usize,
    pub margin: f64,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl WindowPolicy {
    /// Median of the `window` values right before `i`.
    /// `None` when fewer than `window` values precede it.
    pub fn trailing_median(&self, values: &[f64], i: usize) -> Option<f64> {
        if self.window == 0 || i < self.window {
            return None;
        }
        median(&values[i - self.window..i])
    }

    /// Median of the `window` values right after `i`.
    /// `None` when fewer than `window` values follow it.
    pub fn leading_median(&self, values: &[f64], i: usize) -> Option<f64> {
        let start = i + 1;
        let end = start.checked_add(self.window)?;
        if self.window == 0 || end > values.len() {
            return None;
        }
        median(&values[start..end])
    }

    /// Compute both masks for a value series
    pub fn masks(&self, values: &[f64]) -> Vec<(bool, bool)> {
        (0..values.len())
            .map(|i| {
                let value = values[i];
                // An undefined median never flags
                let low = self
                    .trailing_median(values, i)
                    .is_some_and(|m| value <= m - self.margin);
                let high = self
                    .leading_median(values, i)
                    .is_some_and(|m| value >= m + self.margin);
                (low, high)
            })
            .collect()
    }
}

/// Attach `error_low` / `error_high` to each observation
pub fn flag_errors(observations: Vec<Observation>, policy: &WindowPolicy) -> Vec<ErrorFlagged> {
    let values: Vec<f64> = observations.iter().map(|o| o.value as f64).collect();
    let masks = policy.masks(&values);

    let flagged: Vec<ErrorFlagged> = observations
        .into_iter()
        .zip(masks)
        .map(|(observation, (error_low, error_high))| ErrorFlagged {
            observation,
            error_low,
            error_high,
        })
        .collect();

    tracing::debug!(
        "Error flags over {} observations: {} low, {} high (window {}, margin {})",
        flagged.len(),
        flagged.iter().filter(|f| f.error_low).count(),
        flagged.iter().filter(|f| f.error_high).count(),
        policy.window,
        policy.margin
    );

    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn test_short_series_never_flags() {
        let values = [100.0, 105.0, 40.0, 112.0, 118.0];
        let masks = WindowPolicy::default().masks(&values);
        assert!(masks.iter().all(|&(low, high)| !low && !high));
    }

    #[test]
    fn test_window_boundaries() {
        let policy = WindowPolicy::default();
        let values = ramp(25);
        assert_eq!(policy.trailing_median(&values, 9), None);
        assert_eq!(policy.trailing_median(&values, 10), Some(104.5));
        assert_eq!(policy.leading_median(&values, 14), Some(119.5));
        assert_eq!(policy.leading_median(&values, 15), None);
    }

    #[test]
    fn test_low_typo_is_flagged() {
        let mut values = ramp(25);
        values[12] = 12.0;
        let masks = WindowPolicy::default().masks(&values);
        assert!(masks[12].0, "drop should be flagged low");
        assert!(!masks[12].1);
        assert_eq!(masks.iter().filter(|m| m.0).count(), 1);
    }

    #[test]
    fn test_high_typo_is_flagged() {
        let mut values = ramp(25);
        values[5] = 1100.0;
        let masks = WindowPolicy::default().masks(&values);
        assert!(masks[5].1, "spike should be flagged high");
        assert!(!masks[5].0, "trailing window is under-filled");
        assert_eq!(masks.iter().filter(|m| m.1).count(), 1);
    }

    #[test]
    fn test_margin_is_inclusive() {
        let policy = WindowPolicy::default();
        let mut values = vec![50.0; 11];
        values[10] = 40.0;
        assert!(policy.masks(&values)[10].0);
        values[10] = 40.5;
        assert!(!policy.masks(&values)[10].0);
    }

    #[test]
    fn test_flags_ignore_neighbour_flags() {
        // Two adjacent typos: each is judged against raw neighbours only
        let mut values = ramp(30);
        values[15] = 1.0;
        values[16] = 2.0;
        let masks = WindowPolicy::default().masks(&values);
        assert!(masks[15].0);
        assert!(masks[16].0);

        let mut single = ramp(30);
        single[16] = 2.0;
        let single_masks = WindowPolicy::default().masks(&single);
        assert_eq!(masks[16], single_masks[16]);
    }

    #[test]
    fn test_huge_window_never_flags() {
        let policy = WindowPolicy {
            window: usize::MAX,
            margin: DEFAULT_MARGIN,
        };
        let values = [100.0, 5.0, 2000.0];
        assert_eq!(policy.leading_median(&values, 0), None);
        assert_eq!(policy.trailing_median(&values, 2), None);
        assert!(policy.masks(&values).iter().all(|&m| m == (false, false)));
    }

    #[test]
    fn test_custom_policy() {
        let policy = WindowPolicy {
            window: 2,
            margin: 5.0,
        };
        let values = [10.0, 11.0, 3.0, 12.0, 13.0];
        let masks = policy.masks(&values);
        assert!(masks[2].0);
        assert!(!masks[0].0 && !masks[1].0);
    }
}
