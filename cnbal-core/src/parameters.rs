//! Balance parameters
//!
//! Stoichiometry used to derive plant nitrogen from plant carbon, and the
//! runtime feature flags that decide which pools and fluxes take part in the
//! balance.

use crate::errors::{CNBalError, CNBalResult};
use crate::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Fixed C:N ratios of the plant carbon pools.
///
/// Coarse roots share the wood ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stoichiometry {
    /// C:N ratio of wood and coarse roots
    /// unit: g C / g N
    /// default: 330.0
    pub wood_cn: FloatValue,

    /// C:N ratio of leaves
    /// unit: g C / g N
    /// default: 30.0
    pub leaf_cn: FloatValue,

    /// C:N ratio of fine roots
    /// unit: g C / g N
    /// default: 50.0
    pub fine_root_cn: FloatValue,
}

impl Default for Stoichiometry {
    fn default() -> Self {
        Self {
            wood_cn: 330.0,
            leaf_cn: 30.0,
            fine_root_cn: 50.0,
        }
    }
}

impl Stoichiometry {
    /// C:N ratio used for coarse roots.
    pub fn coarse_root_cn(&self) -> FloatValue {
        self.wood_cn
    }

    /// Check that every ratio can be divided by.
    pub fn validate(&self) -> CNBalResult<()> {
        for (name, value) in [
            ("wood_cn", self.wood_cn),
            ("leaf_cn", self.leaf_cn),
            ("fine_root_cn", self.fine_root_cn),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CNBalError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("C:N ratio must be finite and positive, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// Runtime switches that change which pools and fluxes are part of the system.
///
/// These may be changed between runs, so consumers read them at every use
/// rather than caching them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Litter is tracked as a separate pool
    pub litter_pool: bool,
    /// The nitrogen cycle is simulated
    pub nitrogen_cycle: bool,
}

impl FeatureFlags {
    pub fn new(litter_pool: bool, nitrogen_cycle: bool) -> Self {
        Self {
            litter_pool,
            nitrogen_cycle,
        }
    }
}
