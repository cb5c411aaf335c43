//! Site configuration loaded from TOML.
//!
//! ```toml
//! [balance.features]
//! litter_pool = true
//! nitrogen_cycle = true
//!
//! [parameters]
//! gpp_max = 6.0
//!
//! [initial_pools]
//! plant_wood_c = 5000.0
//! soil_c = 10000.0
//!
//! [[events]]
//! year = 2020
//! day = 200
//! action = { kind = "harvest", fraction_removed = 0.5 }
//! ```

use crate::events::{EventSchedule, ScheduledEvent};
use crate::parameters::SiteParameters;
use crate::simulation::Simulation;
use crate::site::SiteModel;
use cnbal_core::config::BalanceConfig;
use cnbal_core::errors::CNBalResult;
use cnbal_core::pools::PoolSet;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub balance: BalanceConfig,
    pub parameters: SiteParameters,
    pub initial_pools: PoolSet,
    pub events: Vec<ScheduledEvent>,
}

impl SiteConfig {
    pub fn from_toml_str(content: &str) -> CNBalResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> CNBalResult<Self> {
        let path = path.as_ref();
        info!("Loading site configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> CNBalResult<()> {
        self.balance.validate()?;
        self.parameters.validate()?;
        for event in &self.events {
            event.action.validate()?;
        }
        Ok(())
    }

    /// Build the site model described by this configuration.
    pub fn build_model(&self) -> CNBalResult<SiteModel> {
        let model = SiteModel::new(
            self.parameters.clone(),
            self.balance.stoichiometry.clone(),
            self.balance.features,
            self.initial_pools.clone(),
        )?;
        Ok(model.with_events(EventSchedule::new(self.events.clone())?))
    }

    /// Build a simulation of the configured site using the configured policy.
    pub fn build_simulation(&self) -> CNBalResult<Simulation> {
        let model = self.build_model()?;
        Ok(Simulation::new(Box::new(model), self.balance.policy.clone()))
    }
}
