//! Carbon and nitrogen mass-balance verification.
//!
//! After every step of an ecosystem simulation the change in total stored
//! mass must equal the boundary inputs minus outputs integrated over the step.
//! This crate measures the residual and reports it:
//!
//! - [`aggregator`]: reduces the pools to total carbon and nitrogen
//! - [`tracker`]: records pre/post totals and boundary flows for a step
//! - [`reporter`]: applies the tolerance and policy and logs violations
//!
//! The host simulation exposes its pools, fluxes and parameters through the
//! [`state::SiteState`] trait.

pub mod aggregator;
pub mod config;
pub mod errors;
pub mod fluxes;
pub mod parameters;
pub mod pools;
pub mod reporter;
pub mod state;
pub mod timestep;
pub mod tracker;
