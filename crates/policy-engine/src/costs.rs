//! Cost and budget pipeline.
//!
//! Steps run in a fixed order since later terms use earlier derived values:
//! charging points feed their own cost, the BEV fleet feeds the grant cost.

use crate::profile::FormulaProfile;
use policy_core::PolicyConfiguration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const MILLION: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Monetary figures derived from a configuration, in millions unless noted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub charging_points: u64,
    pub total_allocated: Decimal,
    pub admin_cost: Decimal,
    pub charging_points_cost: Decimal,
    /// Projected BEV fleet (vehicles, fractional).
    pub number_of_bevs: Decimal,
    pub bev_grant_cost: Decimal,
    pub biofuels_cost: Decimal,
    pub total_cost: Decimal,
    pub is_over_budget: bool,
}

/// Charging points bought by the EV-infrastructure allocation, rounded half up.
pub fn charging_points(ev_allocation: Decimal, profile: &FormulaProfile) -> u64 {
    let raw = ev_allocation / profile.reference_ev_allocation
        * Decimal::from(profile.reference_charging_points);
    raw.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(0)
}

/// BEV fleet produced by a per-vehicle grant; grants above the cap add nothing.
pub fn number_of_bevs(grant: u32, profile: &FormulaProfile) -> Decimal {
    let capped = Decimal::from(grant.min(profile.grant_cap));
    capped * Decimal::from(profile.reference_bev_fleet) / Decimal::from(profile.reference_grant)
        * profile.fleet_response_share
}

/// Run the full cost pipeline for a configuration.
pub fn compute(cfg: &PolicyConfiguration, profile: &FormulaProfile) -> CostBreakdown {
    let charging_points = charging_points(cfg.allocations.ev_infrastructure, profile);
    let total_allocated = cfg.allocations.total();
    let admin_cost = total_allocated * profile.admin_rate;
    let charging_points_cost =
        Decimal::from(charging_points) * profile.charging_point_unit_cost / MILLION;
    let number_of_bevs = number_of_bevs(cfg.bev_grant_per_vehicle, profile);
    let bev_grant_cost = Decimal::from(cfg.bev_grant_per_vehicle) * number_of_bevs / MILLION
        * profile.grant_claim_share;
    let biofuels_cost = if cfg.biofuels_enabled {
        profile.biofuels_cost
    } else {
        Decimal::ZERO
    };
    let total_cost =
        total_allocated + admin_cost + charging_points_cost + bev_grant_cost + biofuels_cost;
    // Sandbox reports the true cost but never flags it.
    let is_over_budget = !cfg.sandbox_mode && total_cost > profile.annual_budget;

    CostBreakdown {
        charging_points,
        total_allocated,
        admin_cost,
        charging_points_cost,
        number_of_bevs,
        bev_grant_cost,
        biofuels_cost,
        total_cost,
        is_over_budget,
    }
}
