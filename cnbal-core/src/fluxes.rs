//! Rates of carbon and nitrogen movement for the current step.
//!
//! Fluxes are rates (g m-2 day-1). They are converted to mass by multiplying
//! with the step length.

use crate::timestep::FloatValue;
use serde::{Deserialize, Serialize};

/// Fluxes computed by the host for the current step.
///
/// Only the fluxes crossing the system boundary take part in the balance.
/// The creation/turnover rates move mass between pools and are kept for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FluxSet {
    // Carbon entering or leaving the system
    /// Gross photosynthesis (GPP)
    pub photosynthesis: FloatValue,
    /// Aboveground autotrophic respiration
    pub r_veg: FloatValue,
    /// Fine root respiration
    pub r_fine_root: FloatValue,
    /// Coarse root respiration
    pub r_coarse_root: FloatValue,
    /// Heterotrophic (soil) respiration
    pub r_soil: FloatValue,
    /// Litter respiration, only counted when the litter pool is enabled
    pub r_litter: FloatValue,
    /// Carbon added by agronomic events (e.g. planting)
    pub event_input_c: FloatValue,
    /// Carbon removed by agronomic events (e.g. harvest)
    pub event_output_c: FloatValue,

    // Nitrogen entering or leaving the system
    pub n_leaching: FloatValue,
    pub n_volatilization: FloatValue,
    /// Biological nitrogen fixation. Not yet part of the nitrogen balance.
    pub n_fixation: FloatValue,
    /// Nitrogen added by agronomic events (e.g. fertilisation)
    pub event_input_n: FloatValue,
    /// Nitrogen removed by agronomic events
    pub event_output_n: FloatValue,

    // Internal transfers
    pub wood_creation: FloatValue,
    pub leaf_creation: FloatValue,
    pub fine_root_creation: FloatValue,
    pub coarse_root_creation: FloatValue,
    pub wood_litter: FloatValue,
    pub leaf_litter: FloatValue,
    pub fine_root_loss: FloatValue,
    pub coarse_root_loss: FloatValue,
}

impl FluxSet {
    /// Autotrophic respiration summed over all plant components.
    pub fn autotrophic_respiration(&self) -> FloatValue {
        self.r_veg + self.r_fine_root + self.r_coarse_root
    }
}
