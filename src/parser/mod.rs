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

pub mod line;
pub mod message;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fancy_regex::Regex;
use line::{ChatRecord, DateOrder};
use std::sync::LazyLock;

// <date>, <time> - <sender>: <message>
// <date>, <time> - <sender> added ...
static CHAT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{1,2})/(\d{1,2})/(\d{2,4}), (\d{1,2}):(\d{2}) - ([^:]+?)(?:: (.*)| added .*)$",
    )
    .expect("valid regex literal")
});

// Just the date stamp, used when sniffing the field order
static DATE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/\d{2,4}, ").expect("valid regex literal")
});

/// Parse one export line.
///
/// Returns `None` for anything that does not follow the chat grammar, including
/// lines whose date or time fields name an impossible instant.
pub fn parse_chat_line(raw: &str, line_number: usize, order: DateOrder) -> Option<ChatRecord> {
    let raw = raw.trim_end_matches(['\r', '\n']);
    let caps = CHAT_LINE.captures(raw).ok()??;

    let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let Some(timestamp) = build_timestamp(
        field(1),
        field(2),
        field(3),
        field(4),
        field(5),
        order,
    ) else {
        tracing::trace!("Line {line_number} matched the chat grammar but has no valid timestamp");
        return None;
    };

    let sender = field(6).to_string();
    let message = match caps.get(7) {
        Some(body) => body.as_str(),
        // "added" system lines carry no colon body; keep everything after the separator
        None => raw.split_once(" - ").map_or(raw, |(_, tail)| tail),
    };

    Some(ChatRecord::new(
        timestamp,
        sender,
        message.trim().to_string(),
        line_number,
    ))
}

/// Parse a sequence of export lines, dropping the ones that do not match.
///
/// Line numbers are 1-based positions in the input, so skipped lines leave gaps.
pub fn parse_chat_lines<I>(lines: I, order: DateOrder) -> impl Iterator<Item = ChatRecord>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    lines
        .into_iter()
        .enumerate()
        .filter_map(move |(idx, line)| parse_chat_line(line.as_ref(), idx + 1, order))
}

/// Guess the date field order by sampling the first lines of an export.
/// Returns `None` when every sampled date is ambiguous (both fields <= 12).
pub fn detect_date_order<S: AsRef<str>>(lines: &[S]) -> Option<DateOrder> {
    for line in lines.iter().take(2000) {
        let Ok(Some(caps)) = DATE_PREFIX.captures(line.as_ref()) else {
            continue;
        };
        let first: u32 = caps[1].parse().unwrap_or(0);
        let second: u32 = caps[2].parse().unwrap_or(0);

        if first > 12 && second <= 12 {
            tracing::info!("Detected day-first date stamps");
            return Some(DateOrder::DayFirst);
        }
        if second > 12 && first <= 12 {
            tracing::info!("Detected month-first date stamps");
            return Some(DateOrder::MonthFirst);
        }
    }

    None
}

fn build_timestamp(
    first: &str,
    second: &str,
    year: &str,
    hour: &str,
    minute: &str,
    order: DateOrder,
) -> Option<NaiveDateTime> {
    let (day, month) = order.day_month(first.parse().ok()?, second.parse().ok()?);
    let year: i32 = match year.len() {
        2 => 2000 + year.parse::<i32>().ok()?,
        4 => year.parse().ok()?,
        _ => return None,
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)?;
    Some(date.and_time(time))
}
