//! Forward "definitely initialized" dataflow over pseudocode.
//!
//! States are per tracked variable. A write initializes; at join points the
//! states of all reached predecessors are met, so a variable is initialized
//! after a merge only if it is initialized on every incoming path. Loops are
//! handled by iterating a worklist until the per-instruction states stop
//! changing; the lattice has height 2 so this terminates quickly.

use crate::error::{CheckerError, CheckerResult};
use crate::flow::instructions::{InstructionId, InstructionKind, Pseudocode};
use fixedbitset::FixedBitSet;
use ktc_common::limits::DATAFLOW_ITERATION_FACTOR;
use ktc_common::{SmartMap, merge_maps_into_first};
use ktc_solver::CallableId;
use tracing::{debug, trace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InitState {
    Uninitialized,
    Initialized,
    /// Initialized on some incoming paths only.
    Unknown,
}

impl InitState {
    #[must_use]
    pub fn meet(self, other: InitState) -> InitState {
        if self == other { self } else { InitState::Unknown }
    }

    pub fn is_initialized(self) -> bool {
        self == InitState::Initialized
    }
}

pub type InitStates = SmartMap<CallableId, InitState>;

/// Enter and exit states of every reachable instruction.
pub struct VariableInitializers {
    enter: Vec<Option<InitStates>>,
    exit: Vec<Option<InitStates>>,
    exit_instruction: InstructionId,
}

impl VariableInitializers {
    /// Run the analysis. Without `initial`, every tracked variable starts
    /// uninitialized; variables `initial` does not mention are added as such.
    pub fn compute(
        pseudocode: &Pseudocode,
        tracked: &[CallableId],
        initial: Option<&InitStates>,
    ) -> CheckerResult<Self> {
        let count = pseudocode.len();
        let mut start = initial.cloned().unwrap_or_default();
        for &variable in tracked {
            if !start.contains_key(&variable) {
                start.insert(variable, InitState::Uninitialized);
            }
        }

        let mut enter: Vec<Option<InitStates>> = vec![None; count];
        let mut exit: Vec<Option<InitStates>> = vec![None; count];
        let mut queued = FixedBitSet::with_capacity(count);
        let mut worklist = Vec::new();
        if count > 0 {
            worklist.push(pseudocode.enter());
            queued.insert(pseudocode.enter().index());
        }

        let budget = (count + 1) * DATAFLOW_ITERATION_FACTOR * (tracked.len() + 1);
        let mut iterations = 0usize;

        while let Some(id) = worklist.pop() {
            queued.set(id.index(), false);
            iterations += 1;
            if iterations > budget {
                return Err(CheckerError::DataflowDiverged { iterations });
            }
            let Some(instruction) = pseudocode.instruction(id) else {
                continue;
            };

            let in_state = if id == pseudocode.enter() {
                start.clone()
            } else {
                let mut merged: Option<InitStates> = None;
                for previous in &instruction.previous {
                    let Some(state) = exit.get(previous.index()).and_then(Option::as_ref) else {
                        continue;
                    };
                    match merged.as_mut() {
                        None => merged = Some(state.clone()),
                        Some(acc) => merge_maps_into_first(acc, state, |a, b| a.meet(*b)),
                    }
                }
                merged.unwrap_or_default()
            };

            let mut out_state = in_state.clone();
            if let InstructionKind::WriteValue {
                target: Some(variable),
                ..
            } = instruction.kind
                && let Some(state) = out_state.get_mut(&variable)
            {
                *state = InitState::Initialized;
            }

            enter[id.index()] = Some(in_state);
            if exit[id.index()].as_ref() != Some(&out_state) {
                exit[id.index()] = Some(out_state);
                for &next in &instruction.next {
                    if !queued.contains(next.index()) {
                        queued.insert(next.index());
                        worklist.push(next);
                    }
                }
            } else {
                trace!(instruction = id.0, "state unchanged");
            }
        }

        debug!(
            instructions = count,
            tracked = tracked.len(),
            iterations,
            "initialization dataflow stabilized"
        );
        Ok(Self {
            enter,
            exit,
            exit_instruction: pseudocode.exit(),
        })
    }

    /// States on entry to `id`; `None` for dead instructions.
    pub fn enter_data(&self, id: InstructionId) -> Option<&InitStates> {
        self.enter.get(id.index()).and_then(Option::as_ref)
    }

    pub fn exit_data(&self, id: InstructionId) -> Option<&InitStates> {
        self.exit.get(id.index()).and_then(Option::as_ref)
    }

    pub fn state_at_enter(&self, id: InstructionId, variable: CallableId) -> Option<InitState> {
        self.enter_data(id).and_then(|states| states.get(&variable)).copied()
    }

    /// States on normal completion of the subroutine; `None` if it never
    /// completes normally.
    pub fn exit_state(&self) -> Option<&InitStates> {
        self.enter_data(self.exit_instruction)
    }
}

#[cfg(test)]
#[path = "../../tests/initialization_tests.rs"]
mod tests;
