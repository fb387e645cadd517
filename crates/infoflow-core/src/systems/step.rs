//! Step Bookkeeping
//!
//! The step clock and the fault list checked after every step.

use bevy_ecs::prelude::*;

use crate::output::stats::StepTally;

/// Resource: Current step number. Step 0 is the initial state.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationClock {
    pub current_step: u64,
}

/// Resource: Inconsistencies observed by systems during the current step.
///
/// A non-empty list after a step is fatal for the run.
#[derive(Resource, Debug, Default)]
pub struct StepFaults(Vec<String>);

impl StepFaults {
    pub fn push(&mut self, fault: impl Into<String>) {
        self.0.push(fault.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Removes and joins every recorded fault.
    pub fn drain_message(&mut self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.0).join("; "))
    }
}

/// Advances the clock and clears per-step counters.
pub fn begin_step(
    mut clock: ResMut<SimulationClock>,
    mut tally: ResMut<StepTally>,
    mut faults: ResMut<StepFaults>,
) {
    clock.current_step += 1;
    tally.reset();
    faults.0.clear();
}
