//! The seam between the simulation loop and a site model.

use crate::climate::ClimateStep;
use cnbal_core::errors::CNBalResult;
use cnbal_core::state::SiteState;
use std::fmt::Debug;

/// A site model that computes fluxes and applies them to its pools.
///
/// The simulation loop snapshots the model (through [`SiteState`]) before and
/// after each call to [`update`](StepModel::update), so `update` must leave
/// the fluxes it applied readable afterwards.
#[typetag::serde]
pub trait StepModel: SiteState + Debug + Send {
    /// Advance the model by one climate step.
    fn update(&mut self, climate: &ClimateStep) -> CNBalResult<()>;
}
