//! Simulation loop with a per-step mass balance check.
//!
//! Each call to [`Simulation::step`] runs the check around the model update:
//!
//! 1. snapshot the pool totals
//! 2. let the model compute and apply its fluxes
//! 3. snapshot again and integrate the boundary fluxes over the step
//! 4. compare and report
//!
//! Every simulation owns its own [`BalanceTracker`], so independent
//! simulations can run side by side (including on separate threads).

use crate::climate::ClimateStep;
use crate::model::StepModel;
use cnbal_core::errors::CNBalResult;
use cnbal_core::reporter::{BalanceOutcome, BalancePolicy, DiscrepancyReporter, Element};
use cnbal_core::timestep::FloatValue;
use cnbal_core::tracker::BalanceTracker;
use log::debug;
use serde::{Deserialize, Serialize};

/// Aggregate balance statistics over a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub steps: usize,
    pub carbon_failures: usize,
    pub nitrogen_failures: usize,
    /// Violations computed but not treated as failures
    pub suppressed: usize,
    pub max_abs_delta_c: FloatValue,
    pub max_abs_delta_n: FloatValue,
}

impl RunSummary {
    pub fn passed(&self) -> bool {
        self.carbon_failures == 0 && self.nitrogen_failures == 0
    }

    fn record(&mut self, outcome: &BalanceOutcome) {
        self.steps += 1;
        for failure in &outcome.failures {
            match failure.element {
                Element::Carbon => self.carbon_failures += 1,
                Element::Nitrogen => self.nitrogen_failures += 1,
            }
        }
        self.suppressed += outcome.suppressed.len();
        self.max_abs_delta_c = max_abs(self.max_abs_delta_c, outcome.discrepancy.carbon);
        self.max_abs_delta_n = max_abs(self.max_abs_delta_n, outcome.discrepancy.nitrogen);
    }
}

/// Like `f64::max` on magnitudes, except that NaN is sticky.
fn max_abs(current: FloatValue, delta: FloatValue) -> FloatValue {
    if current.is_nan() || delta.is_nan() {
        FloatValue::NAN
    } else {
        current.max(delta.abs())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Simulation {
    model: Box<dyn StepModel>,
    tracker: BalanceTracker,
    reporter: DiscrepancyReporter,
}

impl Simulation {
    pub fn new(model: Box<dyn StepModel>, policy: BalancePolicy) -> Self {
        let mut tracker = BalanceTracker::new();
        tracker.reset();
        Self {
            model,
            tracker,
            reporter: DiscrepancyReporter::new(policy),
        }
    }

    pub fn model(&self) -> &dyn StepModel {
        &*self.model
    }

    pub fn model_mut(&mut self) -> &mut dyn StepModel {
        &mut *self.model
    }

    pub fn tracker(&self) -> &BalanceTracker {
        &self.tracker
    }

    pub fn policy(&self) -> &BalancePolicy {
        self.reporter.policy()
    }

    /// Zero the balance record, e.g. before starting an independent run.
    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    /// Advance the model one step and check the mass balance of that step.
    ///
    /// Returns an error if the model rejects the step or if the policy asks
    /// for failures to abort the run.
    pub fn step(&mut self, climate: &ClimateStep) -> CNBalResult<BalanceOutcome> {
        self.tracker.snapshot_before(&*self.model);
        self.model.update(climate)?;
        self.tracker
            .snapshot_after_and_accumulate(&*self.model, climate.length);

        let discrepancy = self.tracker.compare();
        let outcome = self.reporter.report(discrepancy, climate.time);
        if !outcome.passed() {
            debug!(
                "{}",
                self.tracker.diagnostics(&*self.model, climate.length)
            );
        }
        self.reporter.escalate(&outcome)?;
        Ok(outcome)
    }

    /// Run every step in `climate`, stopping at the first error.
    pub fn run<'a>(
        &mut self,
        climate: impl IntoIterator<Item = &'a ClimateStep>,
    ) -> CNBalResult<RunSummary> {
        let mut summary = RunSummary::default();
        for step in climate {
            let outcome = self.step(step)?;
            summary.record(&outcome);
        }
        Ok(summary)
    }
}
