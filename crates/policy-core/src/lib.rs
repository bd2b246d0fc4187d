#![deny(warnings)]

//! Core domain models and invariants for the transport emissions micro-world.
//!
//! This crate defines the serializable policy configuration consumed by the
//! projection engine, together with the declared input ranges and helpers to
//! validate or clamp a configuration at the caller boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Upper bound of every category allocation, in millions.
pub const ALLOCATION_MAX: Decimal = Decimal::from_parts(300, 0, 0, false, 0);
/// Highest congestion charge a user can set.
pub const CONGESTION_CHARGE_MAX: u32 = 20;
/// Highest per-vehicle BEV grant.
pub const BEV_GRANT_MAX: u32 = 10_000;
/// BEV grant values move in steps of this size.
pub const BEV_GRANT_STEP: u32 = 10;
/// Annual budget ceiling in millions, unless in sandbox mode.
pub const ANNUAL_BUDGET: Decimal = Decimal::from_parts(1016, 0, 0, false, 0);
/// Reference emissions target for [`TARGET_YEAR`], in Mt CO₂-eq.
pub const TARGET_EMISSIONS_MT: f64 = 6.10;
/// Year the projection is made for.
pub const TARGET_YEAR: i32 = 2030;

/// Policy categories that receive a share of the budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PolicyCategory {
    HeavyRail,
    BusImprovements,
    EvInfrastructure,
    DomesticAviation,
}

impl PolicyCategory {
    /// All categories in display order.
    pub const ALL: [PolicyCategory; 4] = [
        PolicyCategory::HeavyRail,
        PolicyCategory::BusImprovements,
        PolicyCategory::EvInfrastructure,
        PolicyCategory::DomesticAviation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PolicyCategory::HeavyRail => "Heavy Rail",
            PolicyCategory::BusImprovements => "Bus Improvements",
            PolicyCategory::EvInfrastructure => "Ev Infrastructure",
            PolicyCategory::DomesticAviation => "Domestic Aviation",
        }
    }
}

impl fmt::Display for PolicyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Emissions-contributing sectors reported in the per-sector breakdown.
///
/// HGV and LGV have no allocation of their own; they respond to the
/// EV-infrastructure allocation but are reported separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    HeavyRail,
    BusImprovements,
    EvInfrastructure,
    #[serde(rename = "HGV")]
    Hgv,
    #[serde(rename = "LGV")]
    Lgv,
    DomesticAviation,
}

impl Sector {
    /// All sectors in chart order.
    pub const ALL: [Sector; 6] = [
        Sector::HeavyRail,
        Sector::BusImprovements,
        Sector::EvInfrastructure,
        Sector::Hgv,
        Sector::Lgv,
        Sector::DomesticAviation,
    ];

    /// Label used by the sector chart.
    pub fn label(self) -> &'static str {
        match self {
            Sector::HeavyRail => "Heavy Rail",
            Sector::BusImprovements => "Bus Fleet",
            Sector::EvInfrastructure => "Light Vehicles",
            Sector::Hgv => "Heavy Goods Vehicles",
            Sector::Lgv => "Light Goods Vehicles",
            Sector::DomesticAviation => "Domestic Aviation",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Budget allocated to each policy category, in millions of currency units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Allocations {
    pub heavy_rail: Decimal,
    pub bus_improvements: Decimal,
    pub ev_infrastructure: Decimal,
    pub domestic_aviation: Decimal,
}

impl Allocations {
    pub fn get(&self, category: PolicyCategory) -> Decimal {
        match category {
            PolicyCategory::HeavyRail => self.heavy_rail,
            PolicyCategory::BusImprovements => self.bus_improvements,
            PolicyCategory::EvInfrastructure => self.ev_infrastructure,
            PolicyCategory::DomesticAviation => self.domestic_aviation,
        }
    }

    pub fn set(&mut self, category: PolicyCategory, amount: Decimal) {
        let slot = match category {
            PolicyCategory::HeavyRail => &mut self.heavy_rail,
            PolicyCategory::BusImprovements => &mut self.bus_improvements,
            PolicyCategory::EvInfrastructure => &mut self.ev_infrastructure,
            PolicyCategory::DomesticAviation => &mut self.domestic_aviation,
        };
        *slot = amount;
    }

    /// Iterate `(category, amount)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (PolicyCategory, Decimal)> + '_ {
        PolicyCategory::ALL.into_iter().map(|c| (c, self.get(c)))
    }

    /// Sum over the four categories.
    pub fn total(&self) -> Decimal {
        self.iter().map(|(_, v)| v).sum()
    }
}

impl Default for Allocations {
    fn default() -> Self {
        Self {
            heavy_rail: Decimal::new(293, 0),
            bus_improvements: Decimal::new(176, 0),
            ev_infrastructure: Decimal::new(100, 0),
            domestic_aviation: Decimal::new(36, 0),
        }
    }
}

/// A full policy configuration, the sole input of a projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfiguration {
    pub allocations: Allocations,
    pub biofuels_enabled: bool,
    pub work_from_home_enabled: bool,
    /// Congestion charge in currency units, `[0, 20]`.
    pub congestion_charge: u32,
    /// Per-vehicle BEV grant, `[0, 10000]` in steps of 10.
    pub bev_grant_per_vehicle: u32,
    /// Lifts the budget ceiling for exploratory use.
    pub sandbox_mode: bool,
}

impl Default for PolicyConfiguration {
    fn default() -> Self {
        Self {
            allocations: Allocations::default(),
            biofuels_enabled: false,
            work_from_home_enabled: false,
            congestion_charge: 0,
            bev_grant_per_vehicle: 3500,
            sandbox_mode: false,
        }
    }
}

impl PolicyConfiguration {
    /// Budget ceiling in millions; `None` when sandbox mode makes it unbounded.
    pub fn budget_ceiling(&self) -> Option<Decimal> {
        if self.sandbox_mode {
            None
        } else {
            Some(ANNUAL_BUDGET)
        }
    }
}

/// Validation errors for policy inputs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// An allocation or toggle value lies outside its declared domain.
    #[error("{field} = {value} is outside its allowed range")]
    OutOfRangeInput { field: String, value: String },
    /// No charging points exist, so the BEV/charger ratio is undefined.
    #[error("BEV to charging point ratio is undefined with zero charging points")]
    DegenerateRatio,
}

fn out_of_range(field: impl Into<String>, value: impl fmt::Display) -> ValidationError {
    ValidationError::OutOfRangeInput {
        field: field.into(),
        value: value.to_string(),
    }
}

/// Validate a configuration against the declared input ranges.
pub fn validate_configuration(cfg: &PolicyConfiguration) -> Result<(), ValidationError> {
    for (category, amount) in cfg.allocations.iter() {
        if amount < Decimal::ZERO || amount > ALLOCATION_MAX {
            return Err(out_of_range(format!("allocations.{category:?}"), amount));
        }
    }
    if cfg.congestion_charge > CONGESTION_CHARGE_MAX {
        return Err(out_of_range("congestionCharge", cfg.congestion_charge));
    }
    if cfg.bev_grant_per_vehicle > BEV_GRANT_MAX || cfg.bev_grant_per_vehicle % BEV_GRANT_STEP != 0
    {
        return Err(out_of_range(
            "bevGrantPerVehicle",
            cfg.bev_grant_per_vehicle,
        ));
    }
    Ok(())
}

/// Clamp every field of a configuration into its declared range.
///
/// The BEV grant is clamped to `[0, 10000]` and then snapped down to the
/// nearest multiple of the grant step.
pub fn clamp_configuration(mut cfg: PolicyConfiguration) -> PolicyConfiguration {
    for category in PolicyCategory::ALL {
        let amount = cfg.allocations.get(category);
        let clamped = amount.clamp(Decimal::ZERO, ALLOCATION_MAX);
        if clamped != amount {
            debug!(%category, %amount, %clamped, "allocation clamped");
            cfg.allocations.set(category, clamped);
        }
    }
    cfg.congestion_charge = cfg.congestion_charge.min(CONGESTION_CHARGE_MAX);
    let grant = cfg.bev_grant_per_vehicle.min(BEV_GRANT_MAX);
    cfg.bev_grant_per_vehicle = grant - grant % BEV_GRANT_STEP;
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_is_baseline_and_valid() {
        let cfg = PolicyConfiguration::default();
        validate_configuration(&cfg).unwrap();
        assert_eq!(cfg.allocations.total(), Decimal::new(605, 0));
        assert_eq!(cfg.bev_grant_per_vehicle, 3500);
        assert_eq!(cfg.budget_ceiling(), Some(ANNUAL_BUDGET));
    }

    #[test]
    fn sandbox_has_no_ceiling() {
        let cfg = PolicyConfiguration {
            sandbox_mode: true,
            ..Default::default()
        };
        assert_eq!(cfg.budget_ceiling(), None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut cfg = PolicyConfiguration::default();
        cfg.allocations.heavy_rail = Decimal::new(301, 0);
        assert!(matches!(
            validate_configuration(&cfg),
            Err(ValidationError::OutOfRangeInput { .. })
        ));

        let mut cfg = PolicyConfiguration::default();
        cfg.allocations.bus_improvements = Decimal::new(-1, 0);
        assert!(validate_configuration(&cfg).is_err());

        let cfg = PolicyConfiguration {
            congestion_charge: 21,
            ..Default::default()
        };
        assert!(validate_configuration(&cfg).is_err());

        let cfg = PolicyConfiguration {
            bev_grant_per_vehicle: 3505,
            ..Default::default()
        };
        let err = validate_configuration(&cfg).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRangeInput {
                field: "bevGrantPerVehicle".into(),
                value: "3505".into()
            }
        );
    }

    #[test]
    fn clamp_brings_values_into_range() {
        let mut cfg = PolicyConfiguration {
            congestion_charge: 99,
            bev_grant_per_vehicle: 12_345,
            ..Default::default()
        };
        cfg.allocations.ev_infrastructure = Decimal::new(500, 0);
        cfg.allocations.domestic_aviation = Decimal::new(-20, 0);
        let c = clamp_configuration(cfg);
        assert_eq!(c.allocations.ev_infrastructure, ALLOCATION_MAX);
        assert_eq!(c.allocations.domestic_aviation, Decimal::ZERO);
        assert_eq!(c.congestion_charge, CONGESTION_CHARGE_MAX);
        assert_eq!(c.bev_grant_per_vehicle, BEV_GRANT_MAX);
        validate_configuration(&c).unwrap();
    }

    #[test]
    fn clamp_snaps_grant_to_step() {
        let cfg = PolicyConfiguration {
            bev_grant_per_vehicle: 3507,
            ..Default::default()
        };
        assert_eq!(clamp_configuration(cfg).bev_grant_per_vehicle, 3500);
    }

    #[test]
    fn scenario_uses_camel_case_keys() {
        let yaml = r#"
allocations:
  HeavyRail: 100
  BusImprovements: 50
  EvInfrastructure: 250
  DomesticAviation: 0
biofuelsEnabled: true
bevGrantPerVehicle: 5000
"#;
        let cfg: PolicyConfiguration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.allocations.ev_infrastructure, Decimal::new(250, 0));
        assert!(cfg.biofuels_enabled);
        assert!(!cfg.work_from_home_enabled);
        assert_eq!(cfg.bev_grant_per_vehicle, 5000);

        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"congestionCharge\":0"));
        let back: PolicyConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn partial_allocations_fill_from_baseline() {
        let yaml = r#"
allocations:
  EvInfrastructure: 250
"#;
        let cfg: PolicyConfiguration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.allocations.ev_infrastructure, Decimal::new(250, 0));
        assert_eq!(cfg.allocations.heavy_rail, Decimal::new(293, 0));
        assert_eq!(cfg.allocations.bus_improvements, Decimal::new(176, 0));
        assert_eq!(cfg.allocations.domestic_aviation, Decimal::new(36, 0));

        let empty: PolicyConfiguration = serde_yaml::from_str("biofuelsEnabled: true").unwrap();
        assert_eq!(empty.allocations, Allocations::default());
    }

    #[test]
    fn sector_labels_follow_chart_order() {
        let labels: Vec<_> = Sector::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels[2], "Light Vehicles");
        assert_eq!(labels.len(), 6);
    }

    proptest! {
        #[test]
        fn clamped_config_always_validates(hr in -1000i64..1000, ev in -1000i64..1000,
                                           charge in 0u32..1000, grant in 0u32..100_000) {
            let mut cfg = PolicyConfiguration { congestion_charge: charge, bev_grant_per_vehicle: grant, ..Default::default() };
            cfg.allocations.heavy_rail = Decimal::new(hr, 0);
            cfg.allocations.ev_infrastructure = Decimal::new(ev, 0);
            prop_assert!(validate_configuration(&clamp_configuration(cfg)).is_ok());
        }

        #[test]
        fn in_range_config_is_unchanged_by_clamp(a in 0i64..=300, b in 0i64..=300,
                                                 charge in 0u32..=20, steps in 0u32..=1000) {
            let mut cfg = PolicyConfiguration { congestion_charge: charge, bev_grant_per_vehicle: steps * 10, ..Default::default() };
            cfg.allocations.bus_improvements = Decimal::new(a, 0);
            cfg.allocations.domestic_aviation = Decimal::new(b, 0);
            prop_assert_eq!(clamp_configuration(cfg.clone()), cfg);
        }
    }
}
