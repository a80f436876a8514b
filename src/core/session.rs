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

//! One batch run over an export, from raw lines to the fitted trend.

use crate::anomaly::outlier::OutlierPass;
use crate::anomaly::{flag_observations, ErrorClass};
use crate::config::AnalysisConfig;
use crate::core::regression::FitError;
use crate::core::table::{build_table, TallyRow};
use crate::forecast::report::ForecastReport;
use crate::forecast::{clean_rows, TrendModel};
use crate::parser::line::DateOrder;
use crate::parser::message::{classify_records, observations, ClassifiedRecord};
use crate::parser::{detect_date_order, parse_chat_lines};
use chrono::NaiveDateTime;

/// Results of every stage of one run
#[derive(Debug, Clone)]
pub struct Analysis {
    pub config: AnalysisConfig,
    pub date_order: DateOrder,
    pub input_lines: usize,
    /// Every parsed message, classified
    pub records: Vec<ClassifiedRecord>,
    /// The counter series with error and outlier flags
    pub cleaned: OutlierPass,
    pub trend: Result<TrendModel, FitError>,
}

impl Analysis {
    pub fn run<S: AsRef<str>>(lines: &[S], config: AnalysisConfig) -> Self {
        let date_order = config.date_order.unwrap_or_else(|| {
            detect_date_order(lines).unwrap_or_else(|| {
                tracing::warn!("Date order is ambiguous, assuming day-first");
                DateOrder::DayFirst
            })
        });

        let records = classify_records(parse_chat_lines(lines, date_order));
        let cleaned = flag_observations(
            observations(&records),
            &config.window_policy(),
            config.outlier_sigma,
        );
        let trend = TrendModel::fit(&cleaned.rows, &config.exclusions);

        let analysis = Self {
            config,
            date_order,
            input_lines: lines.len(),
            records,
            cleaned,
            trend,
        };
        analysis.log_summary();
        analysis
    }

    pub fn class_count(&self, class: ErrorClass) -> usize {
        self.cleaned
            .rows
            .iter()
            .filter(|r| r.error_class() == class)
            .count()
    }

    /// Number of rows the trend was fitted on
    pub fn clean_points(&self) -> usize {
        clean_rows(&self.cleaned.rows, &self.config.exclusions).len()
    }

    pub fn table(&self) -> Vec<TallyRow> {
        build_table(
            &self.cleaned.rows,
            self.trend.as_ref().ok(),
            &self.config.exclusions,
        )
    }

    /// Forecast summary, or the reason the trend could not be fitted
    pub fn report(
        &self,
        source: &str,
        generated_on: NaiveDateTime,
    ) -> Result<ForecastReport<'_>, FitError> {
        let model = self.trend.as_ref().map_err(|e| *e)?;
        Ok(ForecastReport {
            generated_on,
            source: source.to_string(),
            total_observations: self.cleaned.rows.len(),
            clean_points: self.clean_points(),
            model,
            milestone: model.forecast_next_milestone(self.config.milestone_step),
            goal: model.forecast(self.config.target),
        })
    }

    fn log_summary(&self) {
        tracing::info!(
            "Parsed {} of {} lines, {} counter observations",
            self.records.len(),
            self.input_lines,
            self.cleaned.rows.len()
        );
        tracing::info!(
            "Flags: {} outlier, {} low, {} high, {} clean",
            self.class_count(ErrorClass::Outlier),
            self.class_count(ErrorClass::Low),
            self.class_count(ErrorClass::High),
            self.class_count(ErrorClass::None)
        );
        match &self.trend {
            Ok(model) => tracing::info!(
                "Trend: {:.2} per hour over {} points, current count {}",
                model.rate_per_hour(),
                model.fit.points,
                model.max_value
            ),
            Err(e) => tracing::warn!("No trend available: {e}"),
        }
    }
}
