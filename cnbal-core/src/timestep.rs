//! Time coordinates used to label diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Floating point type used for all pool, flux and time quantities.
pub type FloatValue = f64;

/// Simulation time coordinates of a single step.
///
/// These are only used to label diagnostics so that a failing step can be
/// reproduced. The step length lives with the host, not here.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StepTime {
    pub year: i32,
    /// Day of year
    pub day: i32,
    /// Fractional time of day
    pub time: FloatValue,
}

impl StepTime {
    pub fn new(year: i32, day: i32, time: FloatValue) -> Self {
        Self { year, day, time }
    }
}

impl fmt::Display for StepTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Y: {} D: {} T: {:4.2}", self.year, self.day, self.time)
    }
}
