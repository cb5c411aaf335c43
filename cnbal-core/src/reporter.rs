//! Discrepancy reporting
//!
//! Turns the per-step discrepancies computed by the
//! [`BalanceTracker`](crate::tracker::BalanceTracker) into diagnostics.
//!
//! A non-zero discrepancy is a [`ConservationViolation`]. Whether it counts as a
//! failure is decided by the [`BalancePolicy`]. Nitrogen violations are
//! suppressed by default because the nitrogen accounting is known to be
//! incomplete (fixation is not yet an input), but they are still computed,
//! logged at debug level and returned to the caller.
//!
//! Failures never stop the simulation on their own. A host that wants a hard
//! stop enables [`BalancePolicy::abort_on_failure`] and calls
//! [`DiscrepancyReporter::escalate`].

use crate::errors::{CNBalError, CNBalResult};
use crate::timestep::{FloatValue, StepTime};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrepancies smaller than this in magnitude are clamped to exactly zero.
pub const BALANCE_TOLERANCE: FloatValue = 1e-8;

/// Clamp cancellation noise (including negative zero) to `0.0`.
///
/// Values at or above the tolerance are returned unchanged, sign included.
pub fn clamp_discrepancy(delta: FloatValue) -> FloatValue {
    if delta.abs() < BALANCE_TOLERANCE {
        0.0
    } else {
        delta
    }
}

/// The element whose balance is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Carbon,
    Nitrogen,
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Carbon => write!(f, "Carbon"),
            Element::Nitrogen => write!(f, "Nitrogen"),
        }
    }
}

/// Clamped residuals of a single step.
///
/// `delta = (post - pre) - (inputs - outputs)`. Positive means the pools
/// gained more mass than the fluxes account for.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Discrepancy {
    pub carbon: FloatValue,
    pub nitrogen: FloatValue,
}

impl Discrepancy {
    pub fn get(&self, element: Element) -> FloatValue {
        match element {
            Element::Carbon => self.carbon,
            Element::Nitrogen => self.nitrogen,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.carbon == 0.0 && self.nitrogen == 0.0
    }
}

/// A step whose observed pool change disagreed with its fluxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConservationViolation {
    pub element: Element,
    /// Clamped discrepancy for the step, sign preserved
    pub delta: FloatValue,
    pub time: StepTime,
}

impl fmt::Display for ConservationViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} balance check failed (delta={:8.4}, {})",
            self.element, self.delta, self.time
        )?;
        // `{:#}` also prints the unrounded residual
        if f.alternate() {
            write!(f, " [delta={:e}]", self.delta)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConservationViolation {}

/// How violations are treated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancePolicy {
    /// Carbon violations count as failures
    /// default: true
    pub fail_on_carbon_violation: bool,

    /// Nitrogen violations count as failures
    /// default: false (nitrogen fixation is not yet accounted for)
    pub fail_on_nitrogen_violation: bool,

    /// Convert failures into an error in [`DiscrepancyReporter::escalate`]
    /// default: false
    pub abort_on_failure: bool,
}

impl Default for BalancePolicy {
    fn default() -> Self {
        Self {
            fail_on_carbon_violation: true,
            fail_on_nitrogen_violation: false,
            abort_on_failure: false,
        }
    }
}

impl BalancePolicy {
    /// Policy that stops on any carbon or nitrogen violation.
    pub fn strict() -> Self {
        Self {
            fail_on_carbon_violation: true,
            fail_on_nitrogen_violation: true,
            abort_on_failure: true,
        }
    }

    pub fn fails_on(&self, element: Element) -> bool {
        match element {
            Element::Carbon => self.fail_on_carbon_violation,
            Element::Nitrogen => self.fail_on_nitrogen_violation,
        }
    }
}

/// Result of reporting one step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceOutcome {
    pub discrepancy: Discrepancy,
    /// Violations that the policy treats as failures
    pub failures: Vec<ConservationViolation>,
    /// Violations that were computed and logged but not treated as failures
    pub suppressed: Vec<ConservationViolation>,
}

impl BalanceOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn violation(&self, element: Element) -> Option<&ConservationViolation> {
        self.failures
            .iter()
            .chain(self.suppressed.iter())
            .find(|v| v.element == element)
    }
}

/// Applies the [`BalancePolicy`] to per-step discrepancies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscrepancyReporter {
    policy: BalancePolicy,
}

impl DiscrepancyReporter {
    pub fn new(policy: BalancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &BalancePolicy {
        &self.policy
    }

    /// Classify and log the discrepancies of the step at `time`.
    ///
    /// Incoming values are clamped again so that raw residuals can be passed
    /// straight in.
    pub fn report(&self, discrepancy: Discrepancy, time: StepTime) -> BalanceOutcome {
        let discrepancy = Discrepancy {
            carbon: clamp_discrepancy(discrepancy.carbon),
            nitrogen: clamp_discrepancy(discrepancy.nitrogen),
        };
        let mut outcome = BalanceOutcome {
            discrepancy,
            ..Default::default()
        };

        for element in [Element::Carbon, Element::Nitrogen] {
            let delta = discrepancy.get(element);
            // NaN compares unequal to zero and is reported like any other residual
            if delta != 0.0 {
                let violation = ConservationViolation {
                    element,
                    delta,
                    time,
                };
                if self.policy.fails_on(element) {
                    error!("{:#}", violation);
                    outcome.failures.push(violation);
                } else {
                    debug!("{:#} (suppressed)", violation);
                    outcome.suppressed.push(violation);
                }
            }
        }

        outcome
    }

    /// Turn the first failure into an error when the policy asks for it.
    pub fn escalate(&self, outcome: &BalanceOutcome) -> CNBalResult<()> {
        if !self.policy.abort_on_failure {
            return Ok(());
        }
        match outcome.failures.first() {
            Some(violation) => {
                error!("Exiting");
                Err(CNBalError::ConservationViolation(*violation))
            }
            None => Ok(()),
        }
    }
}
