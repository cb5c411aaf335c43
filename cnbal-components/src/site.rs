//! Reference site model
//!
//! A deliberately simple carbon/nitrogen site model used to drive the
//! conservation tracker. Every flux it computes is applied to the pools with
//! explicit Euler integration, so in exact arithmetic the pools change by
//! exactly the boundary fluxes times the step length.
//!
//! # What This Component Does
//!
//! 1. Computes GPP from light and leaf carbon
//! 2. Computes maintenance respiration for each plant pool
//! 3. Allocates NPP to wood, leaf, fine root and coarse root
//! 4. Turns plant biomass over into litter (or soil without a litter pool)
//! 5. Decomposes litter and soil organic matter
//! 6. With the nitrogen cycle: plant uptake, mineralisation, leaching,
//!    volatilisation and fixation of mineral nitrogen
//! 7. Applies scheduled agronomic events
//!
//! Nitrogen fixation is added to mineral nitrogen but is not yet a counted
//! input of the nitrogen balance, so a non-zero fixation rate shows up as a
//! nitrogen discrepancy.

use crate::climate::ClimateStep;
use crate::events::{EventAction, EventSchedule};
use crate::model::StepModel;
use crate::parameters::SiteParameters;
use cnbal_core::errors::{CNBalError, CNBalResult};
use cnbal_core::fluxes::FluxSet;
use cnbal_core::parameters::{FeatureFlags, Stoichiometry};
use cnbal_core::pools::PoolSet;
use cnbal_core::state::SiteState;
use cnbal_core::timestep::FloatValue;
use log::warn;
use serde::{Deserialize, Serialize};

/// Internal flows between pools that are not part of [`FluxSet`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Transfers {
    litter_to_soil_c: FloatValue,
    // Nitrogen
    plant_uptake_n: FloatValue,
    plant_loss_n: FloatValue,
    litter_decomp_n: FloatValue,
    litter_to_min_n: FloatValue,
    litter_to_soil_n: FloatValue,
    mineralization_n: FloatValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteModel {
    parameters: SiteParameters,
    stoichiometry: Stoichiometry,
    features: FeatureFlags,
    pools: PoolSet,
    fluxes: FluxSet,
    events: EventSchedule,
}

impl SiteModel {
    /// Create a model without scheduled events.
    pub fn new(
        parameters: SiteParameters,
        stoichiometry: Stoichiometry,
        features: FeatureFlags,
        pools: PoolSet,
    ) -> CNBalResult<Self> {
        parameters.validate()?;
        stoichiometry.validate()?;
        Ok(Self {
            parameters,
            stoichiometry,
            features,
            pools,
            fluxes: FluxSet::default(),
            events: EventSchedule::default(),
        })
    }

    pub fn with_events(self, events: EventSchedule) -> Self {
        Self { events, ..self }
    }

    pub fn events(&self) -> &EventSchedule {
        &self.events
    }

    /// Change the feature flags, e.g. before starting another run.
    pub fn set_features(&mut self, features: FeatureFlags) {
        self.features = features;
    }

    /// Compute all rates from the current pools and climate.
    ///
    /// Overwrites the flux set; event fluxes are cleared.
    fn compute_fluxes(&mut self, climate: &ClimateStep) -> Transfers {
        let p = &self.parameters;
        let pools = &self.pools;
        let f_t = p.temperature_factor(climate.tair);

        let light = if climate.par > 0.0 {
            climate.par / (climate.par + p.par_half_saturation)
        } else {
            0.0
        };
        let canopy = if pools.plant_leaf_c > 0.0 {
            pools.plant_leaf_c / (pools.plant_leaf_c + p.leaf_c_half_saturation)
        } else {
            0.0
        };

        let mut fluxes = FluxSet {
            photosynthesis: p.gpp_max * light * canopy,
            r_veg: (p.leaf_resp_rate * pools.plant_leaf_c + p.wood_resp_rate * pools.plant_wood_c)
                * f_t,
            r_fine_root: p.fine_root_resp_rate * pools.fine_root_c * f_t,
            r_coarse_root: p.coarse_root_resp_rate * pools.coarse_root_c * f_t,
            r_soil: p.soil_decomp_rate * pools.soil_c * f_t,
            wood_litter: p.wood_turnover * pools.plant_wood_c,
            leaf_litter: p.leaf_turnover * pools.plant_leaf_c,
            fine_root_loss: p.fine_root_turnover * pools.fine_root_c,
            coarse_root_loss: p.coarse_root_turnover * pools.coarse_root_c,
            ..Default::default()
        };

        // NPP may be negative, in which case the plant pools shrink
        let npp = fluxes.photosynthesis - fluxes.autotrophic_respiration();
        fluxes.wood_creation = npp * p.frac_wood;
        fluxes.leaf_creation = npp * p.frac_leaf;
        fluxes.fine_root_creation = npp * p.frac_fine_root;
        fluxes.coarse_root_creation = npp * p.frac_coarse_root;

        let mut transfers = Transfers::default();
        if self.features.litter_pool {
            let decomposed = p.litter_decomp_rate * pools.litter_c * f_t;
            fluxes.r_litter = decomposed * p.litter_resp_frac;
            transfers.litter_to_soil_c = decomposed - fluxes.r_litter;
        }

        if self.features.nitrogen_cycle {
            let s = &self.stoichiometry;
            transfers.plant_uptake_n = fluxes.wood_creation / s.wood_cn
                + fluxes.leaf_creation / s.leaf_cn
                + fluxes.fine_root_creation / s.fine_root_cn
                + fluxes.coarse_root_creation / s.coarse_root_cn();
            transfers.plant_loss_n = fluxes.wood_litter / s.wood_cn
                + fluxes.leaf_litter / s.leaf_cn
                + fluxes.fine_root_loss / s.fine_root_cn
                + fluxes.coarse_root_loss / s.coarse_root_cn();
            if self.features.litter_pool {
                transfers.litter_decomp_n = p.litter_decomp_rate * pools.litter_n * f_t;
                transfers.litter_to_min_n = transfers.litter_decomp_n * p.litter_resp_frac;
                transfers.litter_to_soil_n = transfers.litter_decomp_n - transfers.litter_to_min_n;
            }
            transfers.mineralization_n = p.soil_decomp_rate * pools.soil_org_n * f_t;

            fluxes.n_leaching = p.n_leaching_rate * pools.min_n;
            fluxes.n_volatilization = p.n_volatilization_rate * pools.min_n;
            fluxes.n_fixation = p.n_fixation_rate;
        }

        self.fluxes = fluxes;
        transfers
    }

    /// Integrate the current fluxes over `length` days.
    fn apply_fluxes(&mut self, transfers: &Transfers, length: FloatValue) {
        let f = &self.fluxes;
        let pools = &mut self.pools;

        pools.plant_wood_c += (f.wood_creation - f.wood_litter) * length;
        pools.plant_leaf_c += (f.leaf_creation - f.leaf_litter) * length;
        pools.fine_root_c += (f.fine_root_creation - f.fine_root_loss) * length;
        pools.coarse_root_c += (f.coarse_root_creation - f.coarse_root_loss) * length;

        let plant_loss_c = f.wood_litter + f.leaf_litter + f.fine_root_loss + f.coarse_root_loss;
        if self.features.litter_pool {
            pools.litter_c += (plant_loss_c - transfers.litter_to_soil_c - f.r_litter) * length;
            pools.soil_c += (transfers.litter_to_soil_c - f.r_soil) * length;
        } else {
            pools.soil_c += (plant_loss_c - f.r_soil) * length;
        }

        if self.features.nitrogen_cycle {
            pools.min_n += (transfers.mineralization_n + transfers.litter_to_min_n + f.n_fixation
                - transfers.plant_uptake_n
                - f.n_leaching
                - f.n_volatilization)
                * length;
            if self.features.litter_pool {
                pools.litter_n += (transfers.plant_loss_n - transfers.litter_decomp_n) * length;
                pools.soil_org_n +=
                    (transfers.litter_to_soil_n - transfers.mineralization_n) * length;
            } else {
                pools.soil_org_n += (transfers.plant_loss_n - transfers.mineralization_n) * length;
            }
        }
    }

    /// Apply a single event, recording its boundary flows as rates.
    fn apply_event(&mut self, action: &EventAction, length: FloatValue) {
        let s = &self.stoichiometry;
        let features = self.features;
        let pools = &mut self.pools;
        let fluxes = &mut self.fluxes;

        match *action {
            EventAction::Planting {
                wood_c,
                leaf_c,
                fine_root_c,
                coarse_root_c,
            } => {
                pools.plant_wood_c += wood_c;
                pools.plant_leaf_c += leaf_c;
                pools.fine_root_c += fine_root_c;
                pools.coarse_root_c += coarse_root_c;
                fluxes.event_input_c += (wood_c + leaf_c + fine_root_c + coarse_root_c) / length;
                if features.nitrogen_cycle {
                    let n = wood_c / s.wood_cn
                        + leaf_c / s.leaf_cn
                        + fine_root_c / s.fine_root_cn
                        + coarse_root_c / s.coarse_root_cn();
                    fluxes.event_input_n += n / length;
                }
            }
            EventAction::Harvest {
                fraction_removed,
                fraction_to_litter,
            } => {
                let removed_wood = pools.plant_wood_c * fraction_removed;
                let removed_leaf = pools.plant_leaf_c * fraction_removed;
                let litter_wood = pools.plant_wood_c * fraction_to_litter;
                let litter_leaf = pools.plant_leaf_c * fraction_to_litter;
                let litter_fine = pools.fine_root_c * fraction_to_litter;
                let litter_coarse = pools.coarse_root_c * fraction_to_litter;

                pools.plant_wood_c -= removed_wood + litter_wood;
                pools.plant_leaf_c -= removed_leaf + litter_leaf;
                pools.fine_root_c -= litter_fine;
                pools.coarse_root_c -= litter_coarse;

                let litter_c = litter_wood + litter_leaf + litter_fine + litter_coarse;
                let litter_n = litter_wood / s.wood_cn
                    + litter_leaf / s.leaf_cn
                    + litter_fine / s.fine_root_cn
                    + litter_coarse / s.coarse_root_cn();
                if features.litter_pool {
                    pools.litter_c += litter_c;
                    pools.litter_n += litter_n;
                } else {
                    pools.soil_c += litter_c;
                    pools.soil_org_n += litter_n;
                }

                fluxes.event_output_c += (removed_wood + removed_leaf) / length;
                if features.nitrogen_cycle {
                    let n = removed_wood / s.wood_cn + removed_leaf / s.leaf_cn;
                    fluxes.event_output_n += n / length;
                }
            }
            EventAction::Fertilization {
                org_c,
                org_n,
                min_n,
            } => {
                if features.litter_pool {
                    pools.litter_c += org_c;
                    pools.litter_n += org_n;
                } else {
                    pools.soil_c += org_c;
                    pools.soil_org_n += org_n;
                }
                pools.min_n += min_n;
                fluxes.event_input_c += org_c / length;
                if features.nitrogen_cycle {
                    fluxes.event_input_n += (org_n + min_n) / length;
                }
            }
        }
    }
}

impl SiteState for SiteModel {
    fn pools(&self) -> &PoolSet {
        &self.pools
    }

    fn fluxes(&self) -> &FluxSet {
        &self.fluxes
    }

    fn stoichiometry(&self) -> &Stoichiometry {
        &self.stoichiometry
    }

    fn features(&self) -> FeatureFlags {
        self.features
    }
}

#[typetag::serde]
impl StepModel for SiteModel {
    fn update(&mut self, climate: &ClimateStep) -> CNBalResult<()> {
        let length = climate.length;
        if !length.is_finite() || length < 0.0 {
            return Err(CNBalError::InvalidTimestep(length));
        }
        for (name, value) in [("tair", climate.tair), ("par", climate.par)] {
            if !value.is_finite() {
                return Err(CNBalError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("climate driver must be finite, got {}", value),
                });
            }
        }

        let transfers = self.compute_fluxes(climate);
        if length == 0.0 {
            // Nothing moves; due events wait for the next step with a length
            if self.events.has_due(&climate.time) {
                warn!(
                    "Deferring events due at {} until the next step with a non-zero length",
                    climate.time
                );
            }
            return Ok(());
        }

        self.apply_fluxes(&transfers, length);
        for action in self.events.take_due(&climate.time) {
            self.apply_event(&action, length);
        }
        Ok(())
    }
}
