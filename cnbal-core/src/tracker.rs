//! Conservation tracker
//!
//! Mass balance check for a single simulation step:
//!
//! $$X_t - X_{t-1} = inputs - outputs$$
//!
//! i.e. the pool delta (`post - pre`) must match the system delta
//! (`inputs - outputs`) up to [`BALANCE_TOLERANCE`](crate::reporter::BALANCE_TOLERANCE).
//!
//! The host drives the tracker once per step, in this order:
//!
//! 1. [`BalanceTracker::snapshot_before`] before any pool is mutated
//! 2. the host applies its fluxes to the pools
//! 3. [`BalanceTracker::snapshot_after_and_accumulate`] with the step length
//! 4. [`BalanceTracker::compare`]
//!
//! The tracker computes nothing on its own and holds no references to the
//! host, so each simulation owns its own tracker.

use crate::aggregator::{mass_totals, nitrogen_breakdown, MassTotals, NitrogenBreakdown};
use crate::reporter::{clamp_discrepancy, Discrepancy};
use crate::state::SiteState;
use crate::timestep::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nitrogen fixation input counted in the balance.
///
/// Fixation is computed by the site model but is not yet part of the
/// nitrogen inputs; replace this term with `fluxes.n_fixation` once the
/// nitrogen accounting is complete.
pub const UNTRACKED_FIXATION: FloatValue = 0.0;

/// Pre/post totals, step inputs/outputs and the resulting discrepancies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceTracker {
    // Carbon balance
    pub pre_total_c: FloatValue,
    pub post_total_c: FloatValue,
    pub inputs_c: FloatValue,
    pub outputs_c: FloatValue,

    // Nitrogen balance
    pub pre_total_n: FloatValue,
    pub post_total_n: FloatValue,
    pub inputs_n: FloatValue,
    pub outputs_n: FloatValue,

    // Checks
    pub delta_c: FloatValue,
    pub delta_n: FloatValue,
}

impl BalanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record the pool totals before the step's fluxes are applied.
    pub fn snapshot_before<S: SiteState + ?Sized>(&mut self, site: &S) {
        let totals = Self::totals(site);
        self.pre_total_c = totals.carbon;
        self.pre_total_n = totals.nitrogen;
    }

    /// Record the pool totals after the step and integrate the boundary
    /// fluxes over `elapsed`.
    pub fn snapshot_after_and_accumulate<S: SiteState + ?Sized>(
        &mut self,
        site: &S,
        elapsed: FloatValue,
    ) {
        let totals = Self::totals(site);
        self.post_total_c = totals.carbon;
        self.post_total_n = totals.nitrogen;

        let features = site.features();
        let fluxes = site.fluxes();

        // CARBON
        let inputs_c = fluxes.photosynthesis + fluxes.event_input_c;
        let mut outputs_c = fluxes.r_veg
            + fluxes.r_fine_root
            + fluxes.r_coarse_root
            + fluxes.r_soil
            + fluxes.event_output_c;
        if features.litter_pool {
            outputs_c += fluxes.r_litter;
        }
        self.inputs_c = inputs_c * elapsed;
        self.outputs_c = outputs_c * elapsed;

        // NITROGEN
        if features.nitrogen_cycle {
            let inputs_n = UNTRACKED_FIXATION + fluxes.event_input_n;
            let outputs_n = fluxes.n_leaching + fluxes.n_volatilization + fluxes.event_output_n;
            self.inputs_n = inputs_n * elapsed;
            self.outputs_n = outputs_n * elapsed;
        } else {
            self.inputs_n = 0.0;
            self.outputs_n = 0.0;
        }
    }

    /// Compute and store the clamped discrepancies for the step.
    pub fn compare(&mut self) -> Discrepancy {
        let pool_c_delta = self.post_total_c - self.pre_total_c;
        let system_c_delta = self.inputs_c - self.outputs_c;
        self.delta_c = clamp_discrepancy(pool_c_delta - system_c_delta);

        let pool_n_delta = self.post_total_n - self.pre_total_n;
        let system_n_delta = self.inputs_n - self.outputs_n;
        self.delta_n = clamp_discrepancy(pool_n_delta - system_n_delta);

        self.discrepancy()
    }

    /// The discrepancies from the last [`compare`](Self::compare).
    pub fn discrepancy(&self) -> Discrepancy {
        Discrepancy {
            carbon: self.delta_c,
            nitrogen: self.delta_n,
        }
    }

    /// Snapshot of the record together with a per-pool breakdown of `site`.
    pub fn diagnostics<S: SiteState + ?Sized>(
        &self,
        site: &S,
        elapsed: FloatValue,
    ) -> BalanceDiagnostics {
        let pools = site.pools();
        let fluxes = site.fluxes();
        let stoichiometry = site.stoichiometry();

        let carbon = PoolBreakdown {
            wood: pools.plant_wood_c,
            leaf: pools.plant_leaf_c,
            fine_root: pools.fine_root_c,
            coarse_root: pools.coarse_root_c,
            soil: pools.soil_c,
            litter: pools.litter_c,
        };
        let creation = PoolBreakdown {
            wood: fluxes.wood_creation * elapsed,
            leaf: fluxes.leaf_creation * elapsed,
            fine_root: fluxes.fine_root_creation * elapsed,
            coarse_root: fluxes.coarse_root_creation * elapsed,
            ..Default::default()
        };
        let loss = PoolBreakdown {
            wood: fluxes.wood_litter * elapsed,
            leaf: fluxes.leaf_litter * elapsed,
            fine_root: fluxes.fine_root_loss * elapsed,
            coarse_root: fluxes.coarse_root_loss * elapsed,
            ..Default::default()
        };

        BalanceDiagnostics {
            tracker: self.clone(),
            carbon,
            nitrogen: nitrogen_breakdown(pools, stoichiometry),
            creation,
            loss,
        }
    }

    fn totals<S: SiteState + ?Sized>(site: &S) -> MassTotals {
        mass_totals(site.pools(), site.stoichiometry(), site.features())
    }
}

/// Carbon per plant/soil compartment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PoolBreakdown {
    pub wood: FloatValue,
    pub leaf: FloatValue,
    pub fine_root: FloatValue,
    pub coarse_root: FloatValue,
    pub soil: FloatValue,
    pub litter: FloatValue,
}

/// Everything needed to debug a failing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceDiagnostics {
    pub tracker: BalanceTracker,
    pub carbon: PoolBreakdown,
    pub nitrogen: NitrogenBreakdown,
    /// Carbon moved into each plant pool during the step
    pub creation: PoolBreakdown,
    /// Carbon lost from each plant pool during the step
    pub loss: PoolBreakdown,
}

impl fmt::Display for BalanceDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.tracker;
        writeln!(
            f,
            "preC {:10.6} postC {:10.6} inC {:10.6} outC {:10.6} pDelta {:10.6} sDelta {:10.6} delta {:10.6}",
            t.pre_total_c,
            t.post_total_c,
            t.inputs_c,
            t.outputs_c,
            t.post_total_c - t.pre_total_c,
            t.inputs_c - t.outputs_c,
            t.delta_c
        )?;
        let c = &self.carbon;
        writeln!(
            f,
            "  C:        wood {:10.6} leaf {:10.6} fine {:10.6} coarse {:10.6} soil {:10.6} litter {:10.6}",
            c.wood, c.leaf, c.fine_root, c.coarse_root, c.soil, c.litter
        )?;
        for (label, p) in [("creation:", &self.creation), ("loss:    ", &self.loss)] {
            writeln!(
                f,
                "  {} wood {:10.6} leaf {:10.6} fine {:10.6} coarse {:10.6}",
                label, p.wood, p.leaf, p.fine_root, p.coarse_root
            )?;
        }
        writeln!(
            f,
            "preN {:10.6} postN {:10.6} inN {:10.6} outN {:10.6} pDelta {:10.6} sDelta {:10.6} delta {:10.6}",
            t.pre_total_n,
            t.post_total_n,
            t.inputs_n,
            t.outputs_n,
            t.post_total_n - t.pre_total_n,
            t.inputs_n - t.outputs_n,
            t.delta_n
        )?;
        let n = &self.nitrogen;
        write!(
            f,
            "  N:        wood {:10.6} leaf {:10.6} fine {:10.6} coarse {:10.6} soil {:10.6} litter {:10.6} min {:10.6}",
            n.wood, n.leaf, n.fine_root, n.coarse_root, n.soil, n.litter, n.mineral
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluxes::FluxSet;
    use crate::parameters::{FeatureFlags, Stoichiometry};
    use crate::pools::PoolSet;
    use crate::state::SiteView;

    fn scenario_pools() -> PoolSet {
        PoolSet {
            plant_wood_c: 100.0,
            plant_leaf_c: 20.0,
            fine_root_c: 10.0,
            coarse_root_c: 15.0,
            soil_c: 500.0,
            litter_c: 0.0,
            ..Default::default()
        }
    }

    fn scenario_fluxes() -> FluxSet {
        FluxSet {
            photosynthesis: 2.0,
            r_veg: 0.5,
            r_fine_root: 0.1,
            r_coarse_root: 0.1,
            r_soil: 0.3,
            r_litter: 0.0,
            ..Default::default()
        }
    }

    /// Run one step, mutating soil carbon by `soil_change`.
    fn run_step(soil_change: FloatValue) -> BalanceTracker {
        let stoichiometry = Stoichiometry::default();
        let features = FeatureFlags::new(true, false);
        let fluxes = scenario_fluxes();
        let mut pools = scenario_pools();
        let mut tracker = BalanceTracker::new();

        tracker.snapshot_before(&SiteView::new(&pools, &fluxes, &stoichiometry, features));
        pools.soil_c += soil_change;
        tracker.snapshot_after_and_accumulate(
            &SiteView::new(&pools, &fluxes, &stoichiometry, features),
            1.0,
        );
        tracker.compare();
        tracker
    }

    #[test]
    fn test_consistent_step_balances() {
        // Inputs 2.0, outputs 1.0, so the pools must gain 1.0
        let tracker = run_step(1.0);
        assert!((tracker.inputs_c - 2.0).abs() < 1e-12);
        assert!((tracker.outputs_c - 1.0).abs() < 1e-12);
        assert_eq!(tracker.delta_c, 0.0);
        assert_eq!(tracker.delta_n, 0.0);
    }

    #[test]
    fn test_injected_error_is_measured() {
        let tracker = run_step(2.0);
        assert!(
            (tracker.delta_c - 1.0).abs() < 1e-12,
            "Expected delta of 1.0, got {}",
            tracker.delta_c
        );
    }

    #[test]
    fn test_zero_elapsed_time() {
        let stoichiometry = Stoichiometry::default();
        let features = FeatureFlags::new(true, true);
        let fluxes = scenario_fluxes();
        let pools = scenario_pools();
        let view = SiteView::new(&pools, &fluxes, &stoichiometry, features);
        let mut tracker = BalanceTracker::new();

        tracker.snapshot_before(&view);
        tracker.snapshot_after_and_accumulate(&view, 0.0);
        let discrepancy = tracker.compare();

        assert_eq!(tracker.inputs_c, 0.0);
        assert_eq!(tracker.outputs_c, 0.0);
        assert_eq!(discrepancy.carbon, 0.0);
        assert_eq!(discrepancy.nitrogen, 0.0);
    }

    #[test]
    fn test_zero_elapsed_time_with_mutation_is_flagged() {
        let stoichiometry = Stoichiometry::default();
        let features = FeatureFlags::new(false, false);
        let fluxes = scenario_fluxes();
        let mut pools = scenario_pools();
        let mut tracker = BalanceTracker::new();

        tracker.snapshot_before(&SiteView::new(&pools, &fluxes, &stoichiometry, features));
        pools.plant_leaf_c += 0.5;
        tracker.snapshot_after_and_accumulate(
            &SiteView::new(&pools, &fluxes, &stoichiometry, features),
            0.0,
        );
        assert_eq!(tracker.compare().carbon, 0.5);
    }

    #[test]
    fn test_litter_respiration_only_with_litter_pool() {
        let stoichiometry = Stoichiometry::default();
        let fluxes = FluxSet {
            r_litter: 0.4,
            ..Default::default()
        };
        let pools = scenario_pools();
        let mut tracker = BalanceTracker::new();

        tracker.snapshot_after_and_accumulate(
            &SiteView::new(&pools, &fluxes, &stoichiometry, FeatureFlags::new(false, false)),
            1.0,
        );
        assert_eq!(tracker.outputs_c, 0.0);

        tracker.snapshot_after_and_accumulate(
            &SiteView::new(&pools, &fluxes, &stoichiometry, FeatureFlags::new(true, false)),
            1.0,
        );
        assert!((tracker.outputs_c - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_nitrogen_fluxes_scaled_by_elapsed() {
        let stoichiometry = Stoichiometry::default();
        let fluxes = FluxSet {
            n_leaching: 0.01,
            n_volatilization: 0.02,
            event_input_n: 0.5,
            event_output_n: 0.1,
            ..Default::default()
        };
        let pools = scenario_pools();
        let mut tracker = BalanceTracker::new();
        tracker.snapshot_after_and_accumulate(
            &SiteView::new(&pools, &fluxes, &stoichiometry, FeatureFlags::new(false, true)),
            0.5,
        );
        assert!((tracker.inputs_n - 0.25).abs() < 1e-12);
        assert!((tracker.outputs_n - 0.065).abs() < 1e-12);
    }

    #[test]
    fn test_fixation_not_counted() {
        let stoichiometry = Stoichiometry::default();
        let fluxes = FluxSet {
            n_fixation: 3.0,
            ..Default::default()
        };
        let pools = scenario_pools();
        let mut tracker = BalanceTracker::new();
        tracker.snapshot_after_and_accumulate(
            &SiteView::new(&pools, &fluxes, &stoichiometry, FeatureFlags::new(false, true)),
            1.0,
        );
        assert_eq!(tracker.inputs_n, 0.0);
    }

    #[test]
    fn test_nitrogen_disabled_zeroes_flows() {
        let stoichiometry = Stoichiometry::default();
        let fluxes = FluxSet {
            n_leaching: 1.0,
            event_input_n: 1.0,
            ..Default::default()
        };
        let pools = scenario_pools();
        let mut tracker = BalanceTracker {
            inputs_n: 9.0,
            outputs_n: 9.0,
            ..Default::default()
        };
        tracker.snapshot_after_and_accumulate(
            &SiteView::new(&pools, &fluxes, &stoichiometry, FeatureFlags::new(false, false)),
            1.0,
        );
        assert_eq!(tracker.inputs_n, 0.0);
        assert_eq!(tracker.outputs_n, 0.0);
        assert_eq!(tracker.post_total_n, 0.0);
    }

    #[test]
    fn test_reset_zeroes_all_fields() {
        let mut tracker = run_step(2.0);
        assert_ne!(tracker, BalanceTracker::default());
        tracker.reset();
        assert_eq!(tracker, BalanceTracker::default());
    }

    #[test]
    fn test_diagnostics_display() {
        let stoichiometry = Stoichiometry::default();
        let fluxes = FluxSet {
            wood_creation: 0.25,
            ..scenario_fluxes()
        };
        let pools = scenario_pools();
        let view = SiteView::new(&pools, &fluxes, &stoichiometry, FeatureFlags::new(true, true));
        let tracker = run_step(2.0);
        let diagnostics = tracker.diagnostics(&view, 2.0);

        assert_eq!(diagnostics.creation.wood, 0.5);
        assert_eq!(diagnostics.carbon.soil, 500.0);
        let text = diagnostics.to_string();
        assert!(text.starts_with("preC"), "{}", text);
        assert!(text.contains("creation:"));
        assert!(text.contains("min"));
    }
}
