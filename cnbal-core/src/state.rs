//! Read-only view of a site used by the balance machinery.

use crate::fluxes::FluxSet;
use crate::parameters::{FeatureFlags, Stoichiometry};
use crate::pools::PoolSet;

/// Everything the balance check needs to read from the host simulation.
///
/// Implemented by the host's site model. The tracker calls these accessors at
/// every snapshot, so changes to the feature flags between steps are honoured.
pub trait SiteState {
    fn pools(&self) -> &PoolSet;
    fn fluxes(&self) -> &FluxSet;
    fn stoichiometry(&self) -> &Stoichiometry;
    fn features(&self) -> FeatureFlags;
}

/// Borrowed [`SiteState`] for hosts that keep pools, fluxes and parameters
/// in separate places.
#[derive(Debug, Clone, Copy)]
pub struct SiteView<'a> {
    pub pools: &'a PoolSet,
    pub fluxes: &'a FluxSet,
    pub stoichiometry: &'a Stoichiometry,
    pub features: FeatureFlags,
}

impl<'a> SiteView<'a> {
    pub fn new(
        pools: &'a PoolSet,
        fluxes: &'a FluxSet,
        stoichiometry: &'a Stoichiometry,
        features: FeatureFlags,
    ) -> Self {
        Self {
            pools,
            fluxes,
            stoichiometry,
            features,
        }
    }
}

impl SiteState for SiteView<'_> {
    fn pools(&self) -> &PoolSet {
        self.pools
    }

    fn fluxes(&self) -> &FluxSet {
        self.fluxes
    }

    fn stoichiometry(&self) -> &Stoichiometry {
        self.stoichiometry
    }

    fn features(&self) -> FeatureFlags {
        self.features
    }
}
