//! Site model parameters
//!
//! Rate constants for the reference site model. Rates are per day at the
//! reference temperature and are scaled by a Q10 temperature response.

use cnbal_core::errors::{CNBalError, CNBalResult};
use cnbal_core::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for the reference site model.
///
/// # Carbon Flows
///
/// ```text
///                 GPP
///   Atmosphere ---------> [PLANT: wood, leaf, fine root, coarse root]
///        ^                        |
///        | R_a, R_litter, R_soil  | turnover
///        |                        v
///        +------------------- [LITTER] ---> [SOIL]
/// ```
///
/// Without the litter pool, plant turnover goes straight to soil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteParameters {
    /// Maximum gross photosynthesis at full light and canopy
    /// unit: g C m-2 day-1
    /// default: 8.0
    pub gpp_max: FloatValue,

    /// PAR at which photosynthesis reaches half of its maximum
    /// unit: mol m-2 day-1
    /// default: 20.0
    pub par_half_saturation: FloatValue,

    /// Leaf carbon at which photosynthesis reaches half of its maximum
    /// unit: g C m-2
    /// default: 50.0
    pub leaf_c_half_saturation: FloatValue,

    /// Respiration and decomposition increase per 10 degC warming
    /// unit: dimensionless
    /// default: 2.0
    pub q10: FloatValue,

    /// Temperature at which the base rates apply
    /// unit: degC
    /// default: 20.0
    pub reference_temperature: FloatValue,

    /// Maintenance respiration rates
    /// unit: day-1
    pub leaf_resp_rate: FloatValue,
    pub wood_resp_rate: FloatValue,
    pub fine_root_resp_rate: FloatValue,
    pub coarse_root_resp_rate: FloatValue,

    /// Fractions of NPP allocated to each plant pool. Must sum to one.
    /// unit: dimensionless
    pub frac_wood: FloatValue,
    pub frac_leaf: FloatValue,
    pub frac_fine_root: FloatValue,
    pub frac_coarse_root: FloatValue,

    /// Turnover rates of the plant pools
    /// unit: day-1
    pub wood_turnover: FloatValue,
    pub leaf_turnover: FloatValue,
    pub fine_root_turnover: FloatValue,
    pub coarse_root_turnover: FloatValue,

    /// Litter decomposition rate
    /// unit: day-1
    /// default: 0.01
    pub litter_decomp_rate: FloatValue,

    /// Fraction of decomposed litter respired (the rest moves to soil)
    /// unit: dimensionless
    /// default: 0.5
    pub litter_resp_frac: FloatValue,

    /// Soil organic matter decomposition rate
    /// unit: day-1
    /// default: 0.0001
    pub soil_decomp_rate: FloatValue,

    /// Fraction of mineral nitrogen leached
    /// unit: day-1
    /// default: 0.001
    pub n_leaching_rate: FloatValue,

    /// Fraction of mineral nitrogen volatilised
    /// unit: day-1
    /// default: 0.0005
    pub n_volatilization_rate: FloatValue,

    /// Biological nitrogen fixation added to mineral nitrogen
    /// unit: g N m-2 day-1
    /// default: 0.0
    pub n_fixation_rate: FloatValue,
}

impl Default for SiteParameters {
    fn default() -> Self {
        Self {
            gpp_max: 8.0,
            par_half_saturation: 20.0,
            leaf_c_half_saturation: 50.0,
            q10: 2.0,
            reference_temperature: 20.0,

            leaf_resp_rate: 0.005,
            wood_resp_rate: 0.00005,
            fine_root_resp_rate: 0.003,
            coarse_root_resp_rate: 0.0001,

            frac_wood: 0.3,
            frac_leaf: 0.3,
            frac_fine_root: 0.25,
            frac_coarse_root: 0.15,

            wood_turnover: 0.0001,
            leaf_turnover: 0.003,
            fine_root_turnover: 0.002,
            coarse_root_turnover: 0.0002,

            litter_decomp_rate: 0.01,
            litter_resp_frac: 0.5,
            soil_decomp_rate: 0.0001,

            n_leaching_rate: 0.001,
            n_volatilization_rate: 0.0005,
            n_fixation_rate: 0.0,
        }
    }
}

impl SiteParameters {
    /// Temperature multiplier applied to respiration and decomposition.
    pub fn temperature_factor(&self, tair: FloatValue) -> FloatValue {
        self.q10.powf((tair - self.reference_temperature) / 10.0)
    }

    pub fn allocation_sum(&self) -> FloatValue {
        self.frac_wood + self.frac_leaf + self.frac_fine_root + self.frac_coarse_root
    }

    pub fn validate(&self) -> CNBalResult<()> {
        let non_negative = [
            ("gpp_max", self.gpp_max),
            ("par_half_saturation", self.par_half_saturation),
            ("leaf_c_half_saturation", self.leaf_c_half_saturation),
            ("q10", self.q10),
            ("leaf_resp_rate", self.leaf_resp_rate),
            ("wood_resp_rate", self.wood_resp_rate),
            ("fine_root_resp_rate", self.fine_root_resp_rate),
            ("coarse_root_resp_rate", self.coarse_root_resp_rate),
            ("frac_wood", self.frac_wood),
            ("frac_leaf", self.frac_leaf),
            ("frac_fine_root", self.frac_fine_root),
            ("frac_coarse_root", self.frac_coarse_root),
            ("wood_turnover", self.wood_turnover),
            ("leaf_turnover", self.leaf_turnover),
            ("fine_root_turnover", self.fine_root_turnover),
            ("coarse_root_turnover", self.coarse_root_turnover),
            ("litter_decomp_rate", self.litter_decomp_rate),
            ("litter_resp_frac", self.litter_resp_frac),
            ("soil_decomp_rate", self.soil_decomp_rate),
            ("n_leaching_rate", self.n_leaching_rate),
            ("n_volatilization_rate", self.n_volatilization_rate),
            ("n_fixation_rate", self.n_fixation_rate),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("must be finite and >= 0, got {}", value)));
            }
        }
        if self.litter_resp_frac > 1.0 {
            return Err(invalid(
                "litter_resp_frac",
                format!("must be <= 1, got {}", self.litter_resp_frac),
            ));
        }
        let sum = self.allocation_sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(invalid(
                "frac_wood",
                format!("allocation fractions must sum to 1, got {}", sum),
            ));
        }
        Ok(())
    }
}

fn invalid(name: &str, reason: String) -> CNBalError {
    CNBalError::InvalidParameter {
        name: name.to_string(),
        reason,
    }
}
