#![deny(warnings)]

//! Policy allocation and emissions projection engine.
//!
//! This crate turns a [`PolicyConfiguration`] into a [`ProjectionResult`]:
//! - Cost and budget pipeline (allocations, overheads, grants)
//! - BEV to charging point feasibility gate
//! - Aggregate emissions projection and per-sector breakdown
//!
//! Evaluation is a pure function of its input. Out-of-range inputs are
//! clamped into their declared domain before any formula runs.

pub mod costs;
pub mod emissions;
pub mod profile;
pub mod ratio;

pub use costs::CostBreakdown;
pub use emissions::SectorBreakdown;
pub use profile::{FormulaProfile, ProfileError};
pub use ratio::RatioAssessment;

use policy_core::{clamp_configuration, PolicyConfiguration, Sector, TARGET_EMISSIONS_MT};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Everything derived from one configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    /// Name of the formula profile that produced this result.
    pub profile: String,
    pub total_allocated: Decimal,
    pub admin_cost: Decimal,
    pub charging_points: u64,
    pub charging_points_cost: Decimal,
    pub number_of_bevs: Decimal,
    pub bev_grant_cost: Decimal,
    pub biofuels_cost: Decimal,
    pub total_cost: Decimal,
    pub is_over_budget: bool,
    /// `None` when there are no charging points.
    pub actual_bev_to_charger_ratio: Option<f64>,
    pub ideal_bev_to_charger_ratio: f64,
    pub is_ideal_ratio: bool,
    /// Aggregate projection for the target year, Mt CO₂-eq.
    pub projected_emissions: f64,
    pub sector_emissions: BTreeMap<Sector, f64>,
    pub sector_reductions: BTreeMap<Sector, f64>,
}

impl ProjectionResult {
    /// Whether the projection is at or below the reference target.
    pub fn meets_target(&self) -> bool {
        self.projected_emissions <= TARGET_EMISSIONS_MT
    }

    /// Projected minus target emissions; positive means still above target.
    pub fn target_gap(&self) -> f64 {
        self.projected_emissions - TARGET_EMISSIONS_MT
    }

    /// A configuration may be locked in only when affordable and feasible.
    pub fn is_submittable(&self) -> bool {
        !self.is_over_budget && self.is_ideal_ratio
    }
}

/// Evaluate a configuration with the canonical formula profile.
pub fn evaluate(config: &PolicyConfiguration) -> ProjectionResult {
    evaluate_with_profile(config, &FormulaProfile::canonical())
}

/// Evaluate a configuration with an explicit formula profile.
pub fn evaluate_with_profile(
    config: &PolicyConfiguration,
    profile: &FormulaProfile,
) -> ProjectionResult {
    let cfg = clamp_configuration(config.clone());
    if &cfg != config {
        warn!("configuration outside declared ranges was clamped");
    }

    let costs = costs::compute(&cfg, profile);
    let bevs = costs.number_of_bevs.to_f64().unwrap_or(0.0);
    let ratio = ratio::assess(bevs, costs.charging_points, profile);
    let projected_emissions = emissions::aggregate(&cfg, costs.charging_points);
    let sectors = emissions::sector_breakdown(&cfg);

    debug!(
        profile = %profile.name,
        total_cost = %costs.total_cost,
        over_budget = costs.is_over_budget,
        ideal_ratio = ratio.is_ideal,
        projected_emissions,
        "evaluated policy configuration"
    );

    ProjectionResult {
        profile: profile.name.clone(),
        total_allocated: costs.total_allocated,
        admin_cost: costs.admin_cost,
        charging_points: costs.charging_points,
        charging_points_cost: costs.charging_points_cost,
        number_of_bevs: costs.number_of_bevs,
        bev_grant_cost: costs.bev_grant_cost,
        biofuels_cost: costs.biofuels_cost,
        total_cost: costs.total_cost,
        is_over_budget: costs.is_over_budget,
        actual_bev_to_charger_ratio: ratio.actual,
        ideal_bev_to_charger_ratio: ratio.ideal,
        is_ideal_ratio: ratio.is_ideal,
        projected_emissions,
        sector_emissions: sectors.emissions,
        sector_reductions: sectors.reductions,
    }
}
