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

//! Message classification and counter extraction.
//!
//! Every chat record gets a [`MessageKind`], a counter value when the message
//! posts one, and the running membership balance of the group.

use super::line::ChatRecord;
use chrono::NaiveDateTime;
use fancy_regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static ADDED_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\badded\b").expect("valid regex literal"));

static REMOVED_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bremoved\b").expect("valid regex literal"));

// Standalone integer that is not a mention handle (`@123` or `@ 123`)
static COUNTER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?<!@)(?<!@ )\b(\d+)\b").expect("valid regex literal"));

/// What a chat message contributes to the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Added,
    Removed,
    ContainsNumber,
    Other,
}

impl MessageKind {
    /// Net change in group membership caused by a message of this kind
    const fn membership_step(self) -> i64 {
        match self {
            Self::Added => 1,
            Self::Removed => -1,
            Self::ContainsNumber | Self::Other => 0,
        }
    }
}

/// A chat record with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub record: ChatRecord,
    pub kind: MessageKind,
    pub counter_value: Option<i64>,
    /// Members added minus members removed, up to and including this record
    pub member_delta: i64,
}

/// A classified record that carries a counter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub record: ClassifiedRecord,
    pub value: i64,
}

impl Observation {
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.record.record.timestamp
    }
}

/// Classify a message. Keywords win over numbers: "added 3 people" is `Added`.
pub fn classify_message(message: &str) -> MessageKind {
    if ADDED_KEYWORD.is_match(message).unwrap_or(false) {
        MessageKind::Added
    } else if REMOVED_KEYWORD.is_match(message).unwrap_or(false) {
        MessageKind::Removed
    } else if COUNTER_NUMBER.is_match(message).unwrap_or(false) {
        MessageKind::ContainsNumber
    } else {
        MessageKind::Other
    }
}

/// First standalone integer in the message, ignoring mention handles.
///
/// Returns `None` if there is none or the digits do not fit an `i64`.
pub fn extract_counter(message: &str) -> Option<i64> {
    let caps = COUNTER_NUMBER.captures(message).ok()??;
    let digits = caps.get(1)?.as_str();
    match digits.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Ignoring counter candidate {digits:?}: {e}");
            None
        }
    }
}

/// Classify records in order, accumulating the membership balance as we go
pub fn classify_records<I>(records: I) -> Vec<ClassifiedRecord>
where
    I: IntoIterator<Item = ChatRecord>,
{
    let mut member_delta = 0i64;

    let classified: Vec<ClassifiedRecord> = records
        .into_iter()
        .map(|record| {
            let kind = classify_message(&record.message);
            let counter_value = match kind {
                MessageKind::ContainsNumber => extract_counter(&record.message),
                MessageKind::Added | MessageKind::Removed | MessageKind::Other => None,
            };
            member_delta += kind.membership_step();

            ClassifiedRecord {
                record,
                kind,
                counter_value,
                member_delta,
            }
        })
        .collect();

    tracing::debug!(
        "Classified {} records, {} carry a counter value",
        classified.len(),
        classified
            .iter()
            .filter(|r| r.counter_value.is_some())
            .count()
    );

    classified
}

/// Select the counter series: every record with a value, in input order
pub fn observations(records: &[ClassifiedRecord]) -> Vec<Observation> {
    records
        .iter()
        .filter_map(|record| {
            record.counter_value.map(|value| Observation {
                record: record.clone(),
                value,
            })
        })
        .collect()
}
