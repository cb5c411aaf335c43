//! Carbon and nitrogen stocks of a site.
//!
//! All pools are stored as mass per unit area (g C m-2 or g N m-2). The pools
//! are owned by the host simulation; the balance machinery only ever reads them.

use crate::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// The set of carbon and nitrogen pools tracked for a site.
///
/// Nitrogen held by the living plant is not stored explicitly. It is implied
/// by the plant carbon pools through the [`Stoichiometry`](crate::parameters::Stoichiometry)
/// C:N ratios.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSet {
    /// Plant wood carbon
    /// unit: g C m-2
    pub plant_wood_c: FloatValue,
    /// Pending adjustment to wood carbon that has not yet been moved into
    /// `plant_wood_c`. Counted as carbon but carries no implied nitrogen.
    /// unit: g C m-2
    pub plant_wood_c_storage_delta: FloatValue,
    /// Plant leaf carbon
    /// unit: g C m-2
    pub plant_leaf_c: FloatValue,
    /// Fine root carbon
    /// unit: g C m-2
    pub fine_root_c: FloatValue,
    /// Coarse root carbon
    /// unit: g C m-2
    pub coarse_root_c: FloatValue,
    /// Soil organic carbon
    /// unit: g C m-2
    pub soil_c: FloatValue,
    /// Litter carbon, only part of the system when the litter pool is enabled
    /// unit: g C m-2
    pub litter_c: FloatValue,
    /// Soil organic nitrogen
    /// unit: g N m-2
    pub soil_org_n: FloatValue,
    /// Litter nitrogen
    /// unit: g N m-2
    pub litter_n: FloatValue,
    /// Soil mineral nitrogen
    /// unit: g N m-2
    pub min_n: FloatValue,
}

impl PoolSet {
    /// Carbon held in living plant tissue, including the pending wood adjustment.
    pub fn plant_c(&self) -> FloatValue {
        self.plant_wood_c
            + self.plant_wood_c_storage_delta
            + self.plant_leaf_c
            + self.fine_root_c
            + self.coarse_root_c
    }
}
