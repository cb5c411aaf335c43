//! Reference site model and simulation loop for `cnbal`.
//!
//! The site model here is intentionally simple. Its job is to drive the
//! conservation tracker the same way a full ecosystem model would:
//!
//! - `site`: pools, flux computation and flux application
//! - `events`: planting, harvest and fertilisation scheduled by day
//! - `simulation`: the step loop that wraps every model update in a mass
//!   balance check
//! - `config`: TOML site configuration

pub mod climate;
pub mod config;
pub mod events;
pub mod model;
pub mod parameters;
pub mod simulation;
pub mod site;
