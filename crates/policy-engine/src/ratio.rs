//! BEV to charging point feasibility gate.

use crate::profile::FormulaProfile;
use policy_core::ValidationError;
use serde::{Deserialize, Serialize};

/// Outcome of comparing the projected fleet to the installed chargers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioAssessment {
    /// `None` when there are no charging points.
    pub actual: Option<f64>,
    pub ideal: f64,
    pub is_ideal: bool,
}

impl RatioAssessment {
    /// The actual ratio, or `DegenerateRatio` with zero charging points.
    pub fn actual(&self) -> Result<f64, ValidationError> {
        self.actual.ok_or(ValidationError::DegenerateRatio)
    }

    /// Accepted band around the ideal ratio, inclusive.
    pub fn bounds(&self, tolerance: f64) -> (f64, f64) {
        (self.ideal * (1.0 - tolerance), self.ideal * (1.0 + tolerance))
    }
}

/// Assess the fleet/charger ratio. Zero chargers is never ideal.
pub fn assess(number_of_bevs: f64, charging_points: u64, profile: &FormulaProfile) -> RatioAssessment {
    let ideal = profile.ideal_ratio();
    let actual = if charging_points == 0 {
        None
    } else {
        Some(number_of_bevs / charging_points as f64)
    };
    let mut assessment = RatioAssessment {
        actual,
        ideal,
        is_ideal: false,
    };
    let (lower, upper) = assessment.bounds(profile.ratio_tolerance);
    assessment.is_ideal = actual.is_some_and(|r| r >= lower && r <= upper);
    assessment
}
