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

use crate::anomaly::outlier::DEFAULT_SIGMA;
use crate::anomaly::window::{WindowPolicy, DEFAULT_MARGIN, DEFAULT_WINDOW};
use crate::core::log_file::DEFAULT_EXPORT_PREFIX;
use crate::forecast::{DEFAULT_MILESTONE_STEP, DEFAULT_TARGET};
use crate::parser::line::DateOrder;
use anyhow::Context;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunable policy of an analysis run, stored as JSON in the config directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Date field order of the export; detected from the data when unset
    pub date_order: Option<DateOrder>,

    /// Neighbours on each side for the error flags
    pub window: usize,

    /// Distance from the neighbourhood median that counts as a typo
    pub margin: f64,

    /// Residual threshold of the outlier pass, in standard deviations
    pub outlier_sigma: f64,

    /// Long-term goal
    pub target: i64,

    /// Spacing of the round milestones
    pub milestone_step: i64,

    /// Known-bad messages to leave out of the trend fit, e.g. `2025-06-14T17:43:00`
    pub exclusions: Vec<NaiveDateTime>,

    /// File name prefix used when picking the newest export in a directory
    pub export_prefix: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            date_order: None,
            window: DEFAULT_WINDOW,
            margin: DEFAULT_MARGIN,
            outlier_sigma: DEFAULT_SIGMA,
            target: DEFAULT_TARGET,
            milestone_step: DEFAULT_MILESTONE_STEP,
            exclusions: Vec::new(),
            export_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
        }
    }
}

impl AnalysisConfig {
    pub const fn window_policy(&self) -> WindowPolicy {
        WindowPolicy {
            window: self.window,
            margin: self.margin,
        }
    }

    /// Get the path to the default config file
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("beertally").join("config.json"))
    }

    /// Load the default config file, returning defaults if there is none
    pub fn load() -> anyhow::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::info!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load an explicit config file. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        tracing::info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!(
            "Config: window {}, margin {}, sigma {}, {} exclusions",
            config.window,
            config.margin,
            config.outlier_sigma,
            config.exclusions.len()
        );
        Ok(config)
    }

    /// Save config to `path`, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "margin": 25.0, "date_order": "month_first", "exclusions": ["2025-06-14T17:43:00"] }"#,
        )
        .expect("write config");

        let config = AnalysisConfig::load_from(&path).expect("should load");
        assert_eq!(config.margin, 25.0);
        assert_eq!(config.window, DEFAULT_WINDOW);
        assert_eq!(config.date_order, Some(DateOrder::MonthFirst));
        assert_eq!(config.target, DEFAULT_TARGET);
        let expected = NaiveDate::from_ymd_opt(2025, 6, 14)
            .and_then(|d| d.and_hms_opt(17, 43, 0))
            .expect("valid timestamp");
        assert_eq!(config.exclusions, [expected]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");
        let config = AnalysisConfig {
            outlier_sigma: 2.5,
            target: 50_000,
            ..AnalysisConfig::default()
        };
        config.save_to(&path).expect("should save");
        let loaded = AnalysisConfig::load_from(&path).expect("should load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write config");
        assert!(AnalysisConfig::load_from(&path).is_err());
    }
}
