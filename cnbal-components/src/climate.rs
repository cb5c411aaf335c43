//! Climate drivers for a single step.

use cnbal_core::timestep::{FloatValue, StepTime};
use serde::{Deserialize, Serialize};

/// Meteorological forcing and timing of one model step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateStep {
    pub time: StepTime,
    /// Step length
    /// unit: day
    pub length: FloatValue,
    /// Mean air temperature
    /// unit: degC
    pub tair: FloatValue,
    /// Photosynthetically active radiation
    /// unit: mol m-2 day-1
    pub par: FloatValue,
}

impl ClimateStep {
    /// A whole-day step starting at midnight.
    pub fn daily(year: i32, day: i32, tair: FloatValue, par: FloatValue) -> Self {
        Self {
            time: StepTime::new(year, day, 0.0),
            length: 1.0,
            tair,
            par,
        }
    }

    pub fn with_length(self, length: FloatValue) -> Self {
        Self { length, ..self }
    }
}
