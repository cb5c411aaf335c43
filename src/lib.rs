//! Carbon and nitrogen mass-balance verification for terrestrial ecosystem
//! simulations.
//!
//! This crate bundles the workspace members:
//!
//! - [`balance`]: mass aggregation, the per-step conservation tracker and the
//!   discrepancy reporter
//! - [`components`]: a reference site model and the simulation loop that
//!   wraps every step in a balance check

pub use cnbal_components as components;
pub use cnbal_core as balance;

pub use cnbal_components::simulation::{RunSummary, Simulation};
pub use cnbal_core::reporter::{BalancePolicy, ConservationViolation, Discrepancy, Element};
pub use cnbal_core::state::{SiteState, SiteView};
pub use cnbal_core::tracker::BalanceTracker;
