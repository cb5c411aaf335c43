//! Step-level scenarios driving the tracker and reporter directly, the way a
//! host without the reference site model would.

use cnbal_core::aggregator::{mass_totals, total_carbon, total_nitrogen};
use cnbal_core::fluxes::FluxSet;
use cnbal_core::parameters::{FeatureFlags, Stoichiometry};
use cnbal_core::pools::PoolSet;
use cnbal_core::reporter::{BalancePolicy, DiscrepancyReporter, Element};
use cnbal_core::state::SiteView;
use cnbal_core::timestep::{FloatValue, StepTime};
use cnbal_core::tracker::BalanceTracker;
use proptest::prelude::*;

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

fn scenario_fluxes(r_soil: FloatValue) -> FluxSet {
    FluxSet {
        photosynthesis: 2.0,
        r_veg: 0.5,
        r_fine_root: 0.1,
        r_coarse_root: 0.1,
        r_soil,
        r_litter: 0.0,
        ..Default::default()
    }
}

/// Run one step of the scenario: litter on, nitrogen off, one day long.
fn run_scenario(fluxes: &FluxSet, soil_change: FloatValue) -> (BalanceTracker, Vec<Element>) {
    let stoichiometry = Stoichiometry::default();
    let features = FeatureFlags::new(true, false);
    let mut pools = scenario_pools();
    let mut tracker = BalanceTracker::new();
    tracker.reset();

    tracker.snapshot_before(&SiteView::new(&pools, fluxes, &stoichiometry, features));
    pools.soil_c += soil_change;
    tracker.snapshot_after_and_accumulate(
        &SiteView::new(&pools, fluxes, &stoichiometry, features),
        1.0,
    );
    let discrepancy = tracker.compare();

    let reporter = DiscrepancyReporter::new(BalancePolicy::default());
    let outcome = reporter.report(discrepancy, StepTime::new(2020, 1, 0.0));
    let failed = outcome.failures.iter().map(|v| v.element).collect();
    (tracker, failed)
}

#[test]
fn test_matching_mutation_balances() {
    // Inputs 2.0, outputs 0.5 + 0.1 + 0.1 + 0.3 = 1.0
    let (tracker, failed) = run_scenario(&scenario_fluxes(0.3), 1.0);
    assert_eq!(tracker.delta_c, 0.0);
    assert_eq!(tracker.delta_n, 0.0);
    assert!(failed.is_empty());
}

#[test]
fn test_injected_soil_error_is_reported() {
    // Outputs 0.9, so the fluxes imply a net gain of 1.1
    let fluxes = scenario_fluxes(0.2);
    let (tracker, failed) = run_scenario(&fluxes, 1.1);
    assert_eq!(tracker.delta_c, 0.0);
    assert!(failed.is_empty());

    let (tracker, failed) = run_scenario(&fluxes, 2.0);
    assert!(
        (tracker.delta_c - 0.9).abs() < 1e-12,
        "Expected +0.9, got {}",
        tracker.delta_c
    );
    assert_eq!(failed, vec![Element::Carbon]);
}

#[test]
fn test_lost_mass_has_negative_sign() {
    let (tracker, failed) = run_scenario(&scenario_fluxes(0.3), 0.5);
    assert!((tracker.delta_c + 0.5).abs() < 1e-12);
    assert_eq!(failed, vec![Element::Carbon]);
}

#[test]
fn test_feature_flags_read_at_each_snapshot() {
    // Enabling the litter pool between snapshots brings its carbon into the system
    let stoichiometry = Stoichiometry::default();
    let fluxes = FluxSet::default();
    let pools = PoolSet {
        litter_c: 7.0,
        ..scenario_pools()
    };
    let mut tracker = BalanceTracker::new();

    let without_litter = FeatureFlags::new(false, false);
    let with_litter = FeatureFlags::new(true, false);
    tracker.snapshot_before(&SiteView::new(&pools, &fluxes, &stoichiometry, without_litter));
    tracker.snapshot_after_and_accumulate(
        &SiteView::new(&pools, &fluxes, &stoichiometry, with_litter),
        1.0,
    );
    assert_eq!(tracker.compare().carbon, 7.0);
}

#[derive(Debug, Clone)]
struct Step {
    pools: PoolSet,
    fluxes: FluxSet,
    elapsed: FloatValue,
    features: FeatureFlags,
}

fn arb_step() -> impl Strategy<Value = Step> {
    let pools = prop::array::uniform10(0.0..1.0e4f64);
    let fluxes = prop::array::uniform13(0.0..10.0f64);
    (pools, fluxes, 0.0..2.0f64, any::<bool>(), any::<bool>()).prop_map(
        |(p, f, elapsed, litter_pool, nitrogen_cycle)| Step {
            pools: PoolSet {
                plant_wood_c: p[0],
                plant_wood_c_storage_delta: p[1] / 100.0,
                plant_leaf_c: p[2],
                fine_root_c: p[3],
                coarse_root_c: p[4],
                soil_c: p[5],
                litter_c: p[6],
                soil_org_n: p[7] / 10.0,
                litter_n: p[8] / 10.0,
                min_n: p[9] / 100.0,
            },
            fluxes: FluxSet {
                photosynthesis: f[0],
                r_veg: f[1],
                r_fine_root: f[2],
                r_coarse_root: f[3],
                r_soil: f[4],
                r_litter: f[5],
                event_input_c: f[6],
                event_output_c: f[7],
                n_leaching: f[8] / 100.0,
                n_volatilization: f[9] / 100.0,
                n_fixation: f[10] / 100.0,
                event_input_n: f[11] / 100.0,
                event_output_n: f[12] / 100.0,
                ..Default::default()
            },
            elapsed,
            features: FeatureFlags::new(litter_pool, nitrogen_cycle),
        },
    )
}

/// Apply the boundary fluxes of `step` to its pools the way a correct host would.
fn apply(step: &Step) -> PoolSet {
    let f = &step.fluxes;
    let dt = step.elapsed;
    let mut pools = step.pools.clone();

    // Plant growth goes through the storage delta, which carries no nitrogen
    pools.plant_wood_c_storage_delta += (f.photosynthesis - f.autotrophic_respiration()) * dt;
    pools.soil_c += (f.event_input_c - f.event_output_c - f.r_soil) * dt;
    if step.features.litter_pool {
        pools.litter_c -= f.r_litter * dt;
    }
    pools.min_n += (f.event_input_n - f.n_leaching - f.n_volatilization - f.event_output_n) * dt;
    pools
}

proptest! {
    #[test]
    fn prop_consistent_steps_always_balance(step in arb_step()) {
        let stoichiometry = Stoichiometry::default();
        let after = apply(&step);
        let mut tracker = BalanceTracker::new();

        let before = SiteView::new(&step.pools, &step.fluxes, &stoichiometry, step.features);
        tracker.snapshot_before(&before);
        tracker.snapshot_after_and_accumulate(
            &SiteView::new(&after, &step.fluxes, &stoichiometry, step.features),
            step.elapsed,
        );
        let discrepancy = tracker.compare();

        prop_assert_eq!(discrepancy.carbon, 0.0);
        prop_assert_eq!(discrepancy.nitrogen, 0.0);
    }

    #[test]
    fn prop_zero_time_without_mutation_balances(step in arb_step()) {
        let stoichiometry = Stoichiometry::default();
        let view = SiteView::new(&step.pools, &step.fluxes, &stoichiometry, step.features);
        let mut tracker = BalanceTracker::new();

        tracker.snapshot_before(&view);
        tracker.snapshot_after_and_accumulate(&view, 0.0);
        let discrepancy = tracker.compare();

        prop_assert_eq!(discrepancy.carbon, 0.0);
        prop_assert_eq!(discrepancy.nitrogen, 0.0);
    }

    #[test]
    fn prop_nitrogen_zero_when_disabled(step in arb_step()) {
        let stoichiometry = Stoichiometry::default();
        let features = FeatureFlags::new(step.features.litter_pool, false);
        prop_assert_eq!(total_nitrogen(&step.pools, &stoichiometry, features), 0.0);
        prop_assert_eq!(mass_totals(&step.pools, &stoichiometry, features).nitrogen, 0.0);
    }

    #[test]
    fn prop_litter_toggle_adds_litter_carbon(step in arb_step()) {
        let without = total_carbon(&step.pools, FeatureFlags::new(false, false));
        let with = total_carbon(&step.pools, FeatureFlags::new(true, false));
        prop_assert!((with - without - step.pools.litter_c).abs() < 1e-9);
    }
}
