//! Emissions models: the aggregate projection and the per-sector breakdown.
//!
//! Both share the linear per-sector impact curves, except for light vehicles
//! (EV infrastructure) where the breakdown uses an exponential saturation
//! curve instead of linear interpolation.

use policy_core::{PolicyConfiguration, Sector};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate baseline transport emissions, Mt CO₂-eq.
pub const BASELINE_EMISSIONS: f64 = 18.0;

const BIOFUELS_FACTOR: f64 = 0.87;
const WORK_FROM_HOME_FACTOR: f64 = 0.9865;
/// Charge at which the congestion reduction reaches `CONGESTION_REDUCTION_AT_REF`.
const CONGESTION_REF_CHARGE: f64 = 12.0;
const CONGESTION_REDUCTION_AT_REF: f64 = 0.14;
const BEV_GRANT_REF: f64 = 3500.0;
const BEV_GRANT_REDUCTION_AT_REF: f64 = 0.5;
const CHARGING_POINTS_REF: f64 = 2400.0;
const REDUCTION_PER_EXTRA_CHARGER: f64 = 0.0005;

/// Light-vehicle saturation curve: `CEILING - SPAN * exp(-RATE * allocation)`.
const EV_CURVE_CEILING: f64 = 6.73;
const EV_CURVE_SPAN: f64 = 4.73;
const EV_CURVE_RATE: f64 = 0.0024;

/// Linear response of one sector to its driving allocation.
struct LinearImpact {
    reference_allocation: f64,
    baseline: f64,
    at_reference: f64,
}

impl LinearImpact {
    fn reduction(&self, allocation: f64) -> f64 {
        allocation / self.reference_allocation * (self.baseline - self.at_reference)
    }
}

const HEAVY_RAIL: LinearImpact = LinearImpact {
    reference_allocation: 293.0,
    baseline: 0.13,
    at_reference: 0.05,
};
const BUS: LinearImpact = LinearImpact {
    reference_allocation: 176.0,
    baseline: 0.40,
    at_reference: 0.08,
};
const LIGHT_VEHICLES: LinearImpact = LinearImpact {
    reference_allocation: 100.0,
    baseline: 6.73,
    at_reference: 3.74,
};
const HGV: LinearImpact = LinearImpact {
    reference_allocation: 100.0,
    baseline: 2.91,
    at_reference: 2.62,
};
const LGV: LinearImpact = LinearImpact {
    reference_allocation: 100.0,
    baseline: 1.00,
    at_reference: 0.78,
};

/// Baseline emissions of each reported sector, Mt CO₂-eq.
pub fn sector_baseline(sector: Sector) -> f64 {
    match sector {
        Sector::HeavyRail => HEAVY_RAIL.baseline,
        Sector::BusImprovements => BUS.baseline,
        Sector::EvInfrastructure => LIGHT_VEHICLES.baseline,
        Sector::Hgv => HGV.baseline,
        Sector::Lgv => LGV.baseline,
        Sector::DomesticAviation => 0.02,
    }
}

struct Inputs {
    heavy_rail: f64,
    bus: f64,
    ev: f64,
}

impl Inputs {
    fn from_config(cfg: &PolicyConfiguration) -> Self {
        let a = &cfg.allocations;
        Self {
            heavy_rail: a.heavy_rail.to_f64().unwrap_or(0.0),
            bus: a.bus_improvements.to_f64().unwrap_or(0.0),
            ev: a.ev_infrastructure.to_f64().unwrap_or(0.0),
        }
    }
}

/// Linear-model reduction for one sector. Domestic aviation has no modelled effect.
fn linear_reduction(sector: Sector, inputs: &Inputs) -> f64 {
    match sector {
        Sector::HeavyRail => HEAVY_RAIL.reduction(inputs.heavy_rail),
        Sector::BusImprovements => BUS.reduction(inputs.bus),
        Sector::EvInfrastructure => LIGHT_VEHICLES.reduction(inputs.ev),
        Sector::Hgv => HGV.reduction(inputs.ev),
        Sector::Lgv => LGV.reduction(inputs.ev),
        Sector::DomesticAviation => 0.0,
    }
}

/// Aggregate projected emissions for the target year, Mt CO₂-eq.
///
/// The linear impacts are subtracted from the baseline, then the biofuel,
/// work-from-home and congestion factors scale the remainder in that order.
/// The grant and charger terms are subtracted last, so they are not scaled.
pub fn aggregate(cfg: &PolicyConfiguration, charging_points: u64) -> f64 {
    let inputs = Inputs::from_config(cfg);
    let total_impact: f64 = Sector::ALL
        .iter()
        .map(|&s| linear_reduction(s, &inputs))
        .sum();

    let mut emissions = BASELINE_EMISSIONS - total_impact;
    if cfg.biofuels_enabled {
        emissions *= BIOFUELS_FACTOR;
    }
    if cfg.work_from_home_enabled {
        emissions *= WORK_FROM_HOME_FACTOR;
    }
    if cfg.congestion_charge > 0 {
        let charge = f64::from(cfg.congestion_charge);
        emissions *= 1.0 - charge / CONGESTION_REF_CHARGE * CONGESTION_REDUCTION_AT_REF;
    }
    emissions -= f64::from(cfg.bev_grant_per_vehicle) / BEV_GRANT_REF * BEV_GRANT_REDUCTION_AT_REF;
    emissions -= (charging_points as f64 - CHARGING_POINTS_REF) * REDUCTION_PER_EXTRA_CHARGER;
    emissions
}

/// Allocation-dependent part of the light-vehicle curve.
///
/// Zero at zero allocation, strictly increasing, and bounded above by 4.73.
pub fn ev_saturation_gain(allocation: f64) -> f64 {
    EV_CURVE_SPAN * (1.0 - (-EV_CURVE_RATE * allocation).exp())
}

/// Light-vehicle reduction in the sector view: `6.73 - 4.73·e^(-0.0024·a)`.
///
/// Equals a fixed 2.0 floor plus [`ev_saturation_gain`].
pub fn ev_sector_reduction(allocation: f64) -> f64 {
    EV_CURVE_CEILING - EV_CURVE_SPAN * (-EV_CURVE_RATE * allocation).exp()
}

/// Per-sector emissions and reductions versus each sector's baseline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorBreakdown {
    pub emissions: BTreeMap<Sector, f64>,
    pub reductions: BTreeMap<Sector, f64>,
}

/// Per-sector breakdown used by the sector chart and summary.
pub fn sector_breakdown(cfg: &PolicyConfiguration) -> SectorBreakdown {
    let inputs = Inputs::from_config(cfg);
    let mut emissions = BTreeMap::new();
    let mut reductions = BTreeMap::new();
    for sector in Sector::ALL {
        let reduction = match sector {
            Sector::EvInfrastructure => ev_sector_reduction(inputs.ev),
            other => linear_reduction(other, &inputs),
        };
        reductions.insert(sector, reduction);
        emissions.insert(sector, sector_baseline(sector) - reduction);
    }
    SectorBreakdown {
        emissions,
        reductions,
    }
}
