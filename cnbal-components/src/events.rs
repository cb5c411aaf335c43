//! Scheduled agronomic events.
//!
//! Events move mass across the system boundary in discrete amounts. The site
//! model converts each amount into an event flux rate (`amount / step length`)
//! so that the balance check sees it like any other boundary flux.

use cnbal_core::errors::{CNBalError, CNBalResult};
use cnbal_core::timestep::{FloatValue, StepTime};
use serde::{Deserialize, Serialize};

/// What happens when an event fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventAction {
    /// Add new plant carbon. Nitrogen is implied by the plant C:N ratios.
    Planting {
        #[serde(default)]
        wood_c: FloatValue,
        #[serde(default)]
        leaf_c: FloatValue,
        #[serde(default)]
        fine_root_c: FloatValue,
        #[serde(default)]
        coarse_root_c: FloatValue,
    },
    /// Remove a fraction of aboveground biomass from the site and move a
    /// further fraction of all plant biomass to litter.
    Harvest {
        fraction_removed: FloatValue,
        #[serde(default)]
        fraction_to_litter: FloatValue,
    },
    /// Add organic and mineral fertiliser.
    Fertilization {
        #[serde(default)]
        org_c: FloatValue,
        #[serde(default)]
        org_n: FloatValue,
        #[serde(default)]
        min_n: FloatValue,
    },
}

impl EventAction {
    pub fn validate(&self) -> CNBalResult<()> {
        let amounts: Vec<(&str, FloatValue)> = match self {
            EventAction::Planting {
                wood_c,
                leaf_c,
                fine_root_c,
                coarse_root_c,
            } => vec![
                ("wood_c", *wood_c),
                ("leaf_c", *leaf_c),
                ("fine_root_c", *fine_root_c),
                ("coarse_root_c", *coarse_root_c),
            ],
            EventAction::Harvest {
                fraction_removed,
                fraction_to_litter,
            } => {
                if fraction_removed + fraction_to_litter > 1.0 {
                    return Err(CNBalError::InvalidParameter {
                        name: "fraction_removed".to_string(),
                        reason: format!(
                            "harvest fractions must not exceed 1, got {}",
                            fraction_removed + fraction_to_litter
                        ),
                    });
                }
                vec![
                    ("fraction_removed", *fraction_removed),
                    ("fraction_to_litter", *fraction_to_litter),
                ]
            }
            EventAction::Fertilization { org_c, org_n, min_n } => {
                vec![("org_c", *org_c), ("org_n", *org_n), ("min_n", *min_n)]
            }
        };
        for (name, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(CNBalError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("event amounts must be finite and >= 0, got {}", value),
                });
            }
        }
        Ok(())
    }
}

/// An action bound to the day it fires on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub year: i32,
    pub day: i32,
    pub action: EventAction,
}

impl ScheduledEvent {
    pub fn new(year: i32, day: i32, action: EventAction) -> Self {
        Self { year, day, action }
    }

    fn is_due(&self, time: &StepTime) -> bool {
        (self.year, self.day) <= (time.year, time.day)
    }
}

/// Events in firing order with a cursor past those already applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventSchedule {
    events: Vec<ScheduledEvent>,
    next: usize,
}

impl EventSchedule {
    pub fn new(mut events: Vec<ScheduledEvent>) -> CNBalResult<Self> {
        for event in &events {
            event.action.validate()?;
        }
        // Stable so that same-day events keep their configured order
        events.sort_by_key(|e| (e.year, e.day));
        Ok(Self { events, next: 0 })
    }

    /// Take every event due at or before `time`.
    pub fn take_due(&mut self, time: &StepTime) -> Vec<EventAction> {
        let start = self.next;
        while self.next < self.events.len() && self.events[self.next].is_due(time) {
            self.next += 1;
        }
        self.events[start..self.next]
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }

    /// Whether any pending event is due at or before `time`.
    pub fn has_due(&self, time: &StepTime) -> bool {
        self.pending().first().is_some_and(|e| e.is_due(time))
    }

    /// Events that have not fired yet.
    pub fn pending(&self) -> &[ScheduledEvent] {
        &self.events[self.next..]
    }

    /// Make every event pending again.
    pub fn rewind(&mut self) {
        self.next = 0;
    }
}
