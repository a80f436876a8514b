pub mod outlier;
pub mod window;

use crate::parser::message::Observation;
use outlier::{flag_outliers, OutlierPass};
use serde::Serialize;
use window::{flag_errors, WindowPolicy};

/// An observation with its local-window error flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFlagged {
    pub observation: Observation,
    /// Implausibly low against the trailing window
    pub error_low: bool,
    /// Implausibly high against the leading window
    pub error_high: bool,
}

impl ErrorFlagged {
    pub const fn has_error(&self) -> bool {
        self.error_low || self.error_high
    }
}

/// Final per-observation verdict of the cleaning stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedObservation {
    pub flagged: ErrorFlagged,
    pub is_outlier: bool,
}

impl FlaggedObservation {
    pub const fn observation(&self) -> &Observation {
        &self.flagged.observation
    }

    pub const fn error_class(&self) -> ErrorClass {
        ErrorClass::classify(self.is_outlier, self.flagged.error_low, self.flagged.error_high)
    }
}

/// Reporting class of an observation. An observation can trip several
/// checks; the first in `Outlier > Low > High > None` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Outlier,
    Low,
    High,
    None,
}

impl ErrorClass {
    pub const fn classify(is_outlier: bool, error_low: bool, error_high: bool) -> Self {
        if is_outlier {
            Self::Outlier
        } else if error_low {
            Self::Low
        } else if error_high {
            Self::High
        } else {
            Self::None
        }
    }
}

/// Run both cleaning stages: window error flags, then trend outliers
pub fn flag_observations(
    observations: Vec<Observation>,
    policy: &WindowPolicy,
    sigma: f64,
) -> OutlierPass {
    flag_outliers(flag_errors(observations, policy), sigma)
}
