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

//! Rebuilds a group's running beer count from a chat export, flags typos and
//! outliers, and projects when the next milestones will be reached.
//!
//! The stages run strictly in order: [`parser`] turns export lines into
//! classified records, [`anomaly`] flags the counter series, and [`forecast`]
//! fits the trend over what is left. [`core::Analysis`] runs them all.

pub mod anomaly;
pub mod config;
pub mod core;
pub mod forecast;
pub mod parser;

pub use crate::anomaly::{ErrorClass, FlaggedObservation};
pub use crate::config::AnalysisConfig;
pub use crate::core::Analysis;
pub use crate::forecast::{Forecast, TrendModel};
