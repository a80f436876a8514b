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

//! Plain-text forecast summary.

use super::{Forecast, TrendModel};
use chrono::NaiveDateTime;
use std::fmt;

/// Everything the text summary needs from one analysis run
#[derive(Debug, Clone)]
pub struct ForecastReport<'a> {
    pub generated_on: NaiveDateTime,
    pub source: String,
    pub total_observations: usize,
    pub clean_points: usize,
    pub model: &'a TrendModel,
    pub milestone: Forecast,
    pub goal: Forecast,
}

impl ForecastReport<'_> {
    /// One-line summary for the next round milestone
    pub fn milestone_sentence(&self) -> String {
        let f = &self.milestone;
        match f.days_needed {
            Some(days) => format!(
                "At a rate of {:.2} beers/hour, it will take approximately {days:.1} days to go from {} to {} beers.",
                f.rate_per_hour,
                group_thousands(f.start_value),
                group_thousands(f.target_value)
            ),
            None => not_growing(f),
        }
    }

    /// One-line summary for the long-term goal
    pub fn goal_sentence(&self) -> String {
        let f = &self.goal;
        match (f.years_needed, f.estimated_date) {
            (Some(years), Some(date)) => format!(
                "At a rate of {:.2} beers/hour, it will take approximately {years:.1} years ({}) to reach {} beers (from {}).",
                f.rate_per_hour,
                date.date(),
                group_thousands(f.target_value),
                group_thousands(f.start_value)
            ),
            (Some(years), None) => format!(
                "At a rate of {:.2} beers/hour, it will take approximately {years:.1} years to reach {} beers (from {}).",
                f.rate_per_hour,
                group_thousands(f.target_value),
                group_thousands(f.start_value)
            ),
            (None, _) => not_growing(f),
        }
    }
}

impl fmt::Display for ForecastReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Linear Forecast Update")?;
        writeln!(
            f,
            "Generated on: {}",
            self.generated_on.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(f, "Source file: {}", self.source)?;
        writeln!(f)?;
        writeln!(f, "Data Summary:")?;
        writeln!(f, "- Total messages processed: {}", self.total_observations)?;
        writeln!(f, "- Clean data points: {}", self.clean_points)?;
        writeln!(
            f,
            "- Current beer count: {}",
            group_thousands(self.model.max_value)
        )?;
        writeln!(
            f,
            "- Rate per hour: {:.2} beers/hour",
            self.model.rate_per_hour()
        )?;
        writeln!(f, "- Model intercept: {:.2}", self.model.intercept())?;
        writeln!(f)?;
        writeln!(f, "Forecasts:")?;
        writeln!(f)?;
        writeln!(
            f,
            "Next {} milestone ({} beers):",
            short_step(self.milestone.target_value),
            group_thousands(self.milestone.target_value)
        )?;
        writeln!(f, "{}", self.milestone_sentence())?;
        writeln!(f)?;
        writeln!(f, "Goal ({} beers):", group_thousands(self.goal.target_value))?;
        writeln!(f, "{}", self.goal_sentence())
    }
}

fn not_growing(f: &Forecast) -> String {
    format!(
        "At a rate of {:.2} beers/hour the tally is not growing, so reaching {} beers (from {}) cannot be forecast.",
        f.rate_per_hour,
        group_thousands(f.target_value),
        group_thousands(f.start_value)
    )
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// 20000 -> "20k", 1500 -> "1,500"
fn short_step(value: i64) -> String {
    if value != 0 && value % 1000 == 0 {
        format!("{}k", group_thousands(value / 1000))
    } else {
        group_thousands(value)
    }
}
