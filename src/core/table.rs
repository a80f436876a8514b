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

//! The flat per-observation table handed to plotting and export consumers.

use crate::anomaly::{ErrorClass, FlaggedObservation};
use crate::forecast::TrendModel;
use crate::parser::message::MessageKind;
use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::Path;

/// One row of the cleaned tally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallyRow {
    pub timestamp: NaiveDateTime,
    pub sender: String,
    pub message: String,
    pub message_kind: MessageKind,
    pub counter_value: Option<i64>,
    pub member_delta: i64,
    pub error_low: bool,
    pub error_high: bool,
    pub is_outlier: bool,
    pub error_class: ErrorClass,
    /// Trend value, set only on rows the trend was fitted on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitted_value: Option<f64>,
}

impl TallyRow {
    pub fn new(row: &FlaggedObservation, fitted_value: Option<f64>) -> Self {
        let classified = &row.observation().record;
        Self {
            timestamp: classified.record.timestamp,
            sender: classified.record.sender.clone(),
            message: classified.record.message.clone(),
            message_kind: classified.kind,
            counter_value: classified.counter_value,
            member_delta: classified.member_delta,
            error_low: row.flagged.error_low,
            error_high: row.flagged.error_high,
            is_outlier: row.is_outlier,
            error_class: row.error_class(),
            fitted_value,
        }
    }
}

/// Flatten the cleaned observations, attaching trend values where the trend applies
pub fn build_table(
    rows: &[FlaggedObservation],
    trend: Option<&TrendModel>,
    exclusions: &[NaiveDateTime],
) -> Vec<TallyRow> {
    rows.iter()
        .map(|row| {
            let ts = row.observation().timestamp();
            let in_fit = row.error_class() == ErrorClass::None && !exclusions.contains(&ts);
            let fitted = trend.filter(|_| in_fit).map(|model| model.value_at(ts));
            TallyRow::new(row, fitted)
        })
        .collect()
}

/// Write the table as pretty JSON
pub fn write_json(path: &Path, rows: &[TallyRow]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(rows).context("Failed to serialize table")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write table to {}", path.display()))?;
    tracing::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::flag_observations;
    use crate::anomaly::window::WindowPolicy;
    use crate::parser::line::DateOrder;
    use crate::parser::message::{classify_records, observations};
    use crate::parser::parse_chat_lines;

    #[test]
    fn test_table_columns() {
        let lines = [
            "14/06/2025, 10:00 - Alice added Bob",
            "14/06/2025, 11:00 - Bob: 100",
            "14/06/2025, 12:00 - Alice: 110",
            "14/06/2025, 13:00 - Bob: 120",
        ];
        let classified = classify_records(parse_chat_lines(lines, DateOrder::DayFirst));
        let pass = flag_observations(observations(&classified), &WindowPolicy::default(), 3.0);
        let trend = TrendModel::fit(&pass.rows, &[]).expect("fit should succeed");
        let excluded = [pass.rows[2].observation().timestamp()];

        let table = build_table(&pass.rows, Some(&trend), &excluded);
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].sender, "Bob");
        assert_eq!(table[0].counter_value, Some(100));
        assert_eq!(table[0].member_delta, 1);
        assert_eq!(table[0].message_kind, MessageKind::ContainsNumber);
        assert_eq!(table[0].error_class, ErrorClass::None);
        assert!(table[0].fitted_value.is_some());
        assert!(table[2].fitted_value.is_none());

        let json = serde_json::to_value(&table[0]).expect("serialize");
        assert_eq!(json["message_kind"], "contains_number");
        assert_eq!(json["error_class"], "none");
        assert_eq!(json["timestamp"], "2025-06-14T11:00:00");
    }
}
