//! Reduction of the pool state to total carbon and nitrogen mass.
//!
//! Which pools count towards the totals depends on the feature flags:
//!
//! - litter carbon is only part of the system when the litter pool is enabled
//! - nitrogen is only tracked when the nitrogen cycle is enabled. Otherwise the
//!   total is exactly zero, which means "not tracked".
//!
//! Plant nitrogen is implied by the plant carbon pools through their C:N
//! ratios. The pending wood storage adjustment is carbon only; it is the one
//! place where `plant_wood_c` is used without it.

use crate::parameters::{FeatureFlags, Stoichiometry};
use crate::pools::PoolSet;
use crate::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Total mass of each tracked element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MassTotals {
    /// unit: g C m-2
    pub carbon: FloatValue,
    /// unit: g N m-2
    pub nitrogen: FloatValue,
}

/// The individual nitrogen terms that make up the nitrogen total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NitrogenBreakdown {
    pub wood: FloatValue,
    pub leaf: FloatValue,
    pub fine_root: FloatValue,
    pub coarse_root: FloatValue,
    pub soil: FloatValue,
    pub litter: FloatValue,
    pub mineral: FloatValue,
}

impl NitrogenBreakdown {
    pub fn total(&self) -> FloatValue {
        self.wood
            + self.leaf
            + self.fine_root
            + self.coarse_root
            + self.soil
            + self.litter
            + self.mineral
    }
}

/// Total carbon in the system.
pub fn total_carbon(pools: &PoolSet, features: FeatureFlags) -> FloatValue {
    let mut carbon = pools.plant_c() + pools.soil_c;
    if features.litter_pool {
        carbon += pools.litter_c;
    }
    carbon
}

/// Nitrogen held in each pool, with plant nitrogen derived from carbon.
///
/// Computed regardless of the nitrogen cycle flag; callers decide whether it
/// is part of the system.
pub fn nitrogen_breakdown(pools: &PoolSet, stoichiometry: &Stoichiometry) -> NitrogenBreakdown {
    NitrogenBreakdown {
        wood: pools.plant_wood_c / stoichiometry.wood_cn,
        leaf: pools.plant_leaf_c / stoichiometry.leaf_cn,
        fine_root: pools.fine_root_c / stoichiometry.fine_root_cn,
        coarse_root: pools.coarse_root_c / stoichiometry.coarse_root_cn(),
        soil: pools.soil_org_n,
        litter: pools.litter_n,
        mineral: pools.min_n,
    }
}

/// Total nitrogen in the system, or `0.0` when the nitrogen cycle is off.
pub fn total_nitrogen(
    pools: &PoolSet,
    stoichiometry: &Stoichiometry,
    features: FeatureFlags,
) -> FloatValue {
    if features.nitrogen_cycle {
        nitrogen_breakdown(pools, stoichiometry).total()
    } else {
        0.0
    }
}

/// Total carbon and nitrogen mass for the current pool state.
pub fn mass_totals(
    pools: &PoolSet,
    stoichiometry: &Stoichiometry,
    features: FeatureFlags,
) -> MassTotals {
    MassTotals {
        carbon: total_carbon(pools, features),
        nitrogen: total_nitrogen(pools, stoichiometry, features),
    }
}
