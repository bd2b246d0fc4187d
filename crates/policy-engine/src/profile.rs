//! Versioned constant sets for the cost and feasibility pipeline.
//!
//! Two revisions of the model disagree on how the BEV grant halves: the
//! first halves the fleet response itself, the current one keeps the full
//! fleet and halves the share of buyers who claim. They also use different
//! ideal fleet sizes. Each revision is kept as a named profile rather than
//! merged.

use policy_core::BEV_GRANT_MAX;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest charging point unit cost a profile may declare, in currency units.
const MAX_UNIT_COST: u32 = 1_000_000;
/// Largest reference fleet or charger count.
const MAX_REFERENCE_COUNT: u32 = 10_000_000;
/// Largest fixed cost or budget, in millions.
const MAX_MONEY_MILLIONS: u32 = 1_000_000;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("unknown formula profile: {0}")]
    Unknown(String),
    #[error("invalid profile: {0}")]
    Invalid(String),
}

/// Constants driving the cost and feasibility pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormulaProfile {
    pub name: String,
    /// EV-infrastructure allocation (millions) that buys the reference charger count.
    pub reference_ev_allocation: Decimal,
    pub reference_charging_points: u32,
    /// Installed cost per charging point, in currency units.
    pub charging_point_unit_cost: Decimal,
    /// Administrative overhead as a fraction of allocated spend.
    pub admin_rate: Decimal,
    /// Grant that produces the reference BEV fleet.
    pub reference_grant: u32,
    pub reference_bev_fleet: u32,
    /// Grant above this has no further effect on fleet size.
    pub grant_cap: u32,
    /// Fraction of the linear fleet response that materialises.
    pub fleet_response_share: Decimal,
    /// Fraction of new BEV buyers that claim the grant.
    pub grant_claim_share: Decimal,
    pub biofuels_cost: Decimal,
    pub annual_budget: Decimal,
    /// Ideal BEVs per charging point is `ideal_bev_fleet / reference_charging_points`.
    pub ideal_bev_fleet: u32,
    /// Accepted relative deviation from the ideal ratio.
    pub ratio_tolerance: f64,
}

impl FormulaProfile {
    pub const CANONICAL: &'static str = "canonical";
    pub const FIRST_REVISION: &'static str = "first-revision";

    /// Current model: full fleet response, half of buyers claim the grant.
    pub fn canonical() -> Self {
        Self {
            name: Self::CANONICAL.to_string(),
            reference_ev_allocation: Decimal::new(100, 0),
            reference_charging_points: 2400,
            charging_point_unit_cost: Decimal::new(2000, 0),
            admin_rate: Decimal::new(10, 2),
            reference_grant: 3500,
            reference_bev_fleet: 73_000,
            grant_cap: 10_000,
            fleet_response_share: Decimal::ONE,
            grant_claim_share: Decimal::new(5, 1),
            biofuels_cost: Decimal::new(100, 0),
            annual_budget: policy_core::ANNUAL_BUDGET,
            ideal_bev_fleet: 67_000,
            ratio_tolerance: 0.2,
        }
    }

    /// Earlier revision: halved fleet response, every buyer claims.
    pub fn first_revision() -> Self {
        Self {
            name: Self::FIRST_REVISION.to_string(),
            fleet_response_share: Decimal::new(5, 1),
            grant_claim_share: Decimal::ONE,
            ideal_bev_fleet: 36_500,
            ..Self::canonical()
        }
    }

    pub fn by_name(name: &str) -> Result<Self, ProfileError> {
        match name {
            Self::CANONICAL => Ok(Self::canonical()),
            Self::FIRST_REVISION => Ok(Self::first_revision()),
            other => Err(ProfileError::Unknown(other.to_string())),
        }
    }

    /// Parse and sanity-check a profile from YAML.
    pub fn from_yaml_str(text: &str) -> Result<Self, ProfileError> {
        let profile: FormulaProfile =
            serde_yaml::from_str(text).map_err(|e| ProfileError::Invalid(e.to_string()))?;
        profile.check()?;
        Ok(profile)
    }

    /// Reject profiles whose constants are negative or large enough to
    /// overflow the cost pipeline over the declared input ranges.
    pub fn check(&self) -> Result<(), ProfileError> {
        let max_money = Decimal::from(MAX_MONEY_MILLIONS);
        if self.reference_ev_allocation < Decimal::ONE
            || self.reference_ev_allocation > policy_core::ALLOCATION_MAX
        {
            return Err(ProfileError::Invalid(
                "reference_ev_allocation must be within [1, 300]".into(),
            ));
        }
        if self.reference_grant == 0 || self.reference_charging_points == 0 {
            return Err(ProfileError::Invalid(
                "reference grant and charging points must be > 0".into(),
            ));
        }
        if self.reference_grant > BEV_GRANT_MAX || self.grant_cap > BEV_GRANT_MAX {
            return Err(ProfileError::Invalid(format!(
                "reference_grant and grant_cap must be <= {BEV_GRANT_MAX}"
            )));
        }
        if self.reference_charging_points > MAX_REFERENCE_COUNT
            || self.reference_bev_fleet > MAX_REFERENCE_COUNT
            || self.ideal_bev_fleet > MAX_REFERENCE_COUNT
        {
            return Err(ProfileError::Invalid(format!(
                "reference counts must be <= {MAX_REFERENCE_COUNT}"
            )));
        }
        if self.charging_point_unit_cost < Decimal::ZERO
            || self.charging_point_unit_cost > Decimal::from(MAX_UNIT_COST)
        {
            return Err(ProfileError::Invalid(format!(
                "charging_point_unit_cost must be within [0, {MAX_UNIT_COST}]"
            )));
        }
        for (field, amount) in [
            ("biofuels_cost", self.biofuels_cost),
            ("annual_budget", self.annual_budget),
        ] {
            if amount < Decimal::ZERO || amount > max_money {
                return Err(ProfileError::Invalid(format!(
                    "{field} must be within [0, {MAX_MONEY_MILLIONS}]"
                )));
            }
        }
        if !(self.ratio_tolerance.is_finite() && (0.0..1.0).contains(&self.ratio_tolerance)) {
            return Err(ProfileError::Invalid(
                "ratio_tolerance must be within [0,1)".into(),
            ));
        }
        for share in [
            self.admin_rate,
            self.fleet_response_share,
            self.grant_claim_share,
        ] {
            if share < Decimal::ZERO || share > Decimal::ONE {
                return Err(ProfileError::Invalid(
                    "admin_rate and shares must be within [0,1]".into(),
                ));
            }
        }
        Ok(())
    }

    /// Ideal number of BEVs per charging point.
    pub fn ideal_ratio(&self) -> f64 {
        f64::from(self.ideal_bev_fleet) / f64::from(self.reference_charging_points)
    }
}

impl Default for FormulaProfile {
    fn default() -> Self {
        Self::canonical()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_profiles_resolve() {
        assert_eq!(FormulaProfile::by_name("canonical").unwrap(), FormulaProfile::canonical());
        assert_eq!(
            FormulaProfile::by_name("first-revision").unwrap().ideal_bev_fleet,
            36_500
        );
        assert!(matches!(
            FormulaProfile::by_name("nope"),
            Err(ProfileError::Unknown(_))
        ));
    }

    #[test]
    fn ideal_ratio_values() {
        assert!((FormulaProfile::canonical().ideal_ratio() - 27.916_666).abs() < 1e-5);
        assert!((FormulaProfile::first_revision().ideal_ratio() - 15.208_333).abs() < 1e-5);
    }

    #[test]
    fn yaml_roundtrip_and_check() {
        let text = serde_yaml::to_string(&FormulaProfile::first_revision()).unwrap();
        let back = FormulaProfile::from_yaml_str(&text).unwrap();
        assert_eq!(back, FormulaProfile::first_revision());

        let bad = text.replace("ratio_tolerance: 0.2", "ratio_tolerance: 1.5");
        assert!(matches!(
            FormulaProfile::from_yaml_str(&bad),
            Err(ProfileError::Invalid(_))
        ));
    }

    fn rejected(edit: impl FnOnce(&mut FormulaProfile)) -> bool {
        let mut p = FormulaProfile::canonical();
        edit(&mut p);
        matches!(p.check(), Err(ProfileError::Invalid(_)))
    }

    #[test]
    fn built_in_profiles_pass_checks() {
        FormulaProfile::canonical().check().unwrap();
        FormulaProfile::first_revision().check().unwrap();
    }

    #[test]
    fn rejects_negative_money_and_rates() {
        assert!(rejected(|p| p.charging_point_unit_cost = Decimal::new(-1, 0)));
        assert!(rejected(|p| p.admin_rate = Decimal::new(-1, 2)));
        assert!(rejected(|p| p.admin_rate = Decimal::new(15, 1)));
        assert!(rejected(|p| p.biofuels_cost = Decimal::new(-100, 0)));
        assert!(rejected(|p| p.annual_budget = Decimal::new(-1, 0)));
    }

    #[test]
    fn rejects_magnitudes_that_overflow_costs() {
        assert!(rejected(|p| p.grant_cap = BEV_GRANT_MAX + 1));
        assert!(rejected(|p| p.reference_bev_fleet = u32::MAX));
        assert!(rejected(|p| p.reference_ev_allocation = Decimal::new(1, 28)));
        assert!(rejected(|p| p.biofuels_cost = Decimal::MAX));

        let mut doc = serde_yaml::to_value(FormulaProfile::canonical()).unwrap();
        doc["charging_point_unit_cost"] =
            serde_yaml::Value::String("79000000000000000000000000000".into());
        let huge = serde_yaml::to_string(&doc).unwrap();
        assert!(matches!(
            FormulaProfile::from_yaml_str(&huge),
            Err(ProfileError::Invalid(_))
        ));
    }
}
