use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::{
    automaton::{Input, Output, State, Transducer, TransitionSystem, retain_keys},
    error::MachineError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MooreState {
    pub output: Output,
    pub transitions: HashMap<Input, State>,
}

impl MooreState {
    pub fn new(output: impl Into<Output>) -> Self {
        MooreState {
            output: output.into(),
            transitions: HashMap::new(),
        }
    }
}

/// A Moore machine: the output is a function of the current state alone.
///
/// Same totality and closure invariants as
/// [`MealyMachine`](crate::automaton::mealy::MealyMachine), plus one output
/// per state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MooreMachine {
    states: HashMap<State, MooreState>,
}

impl MooreMachine {
    pub fn new() -> Self {
        MooreMachine::default()
    }

    /// Declares `state` with `output`, or updates the output of an existing
    /// state. Returns the previous output, if any.
    pub fn set_output(
        &mut self,
        state: impl Into<State>,
        output: impl Into<Output>,
    ) -> Option<Output> {
        let output = output.into();
        match self.states.entry(state.into()) {
            hashbrown::hash_map::Entry::Occupied(mut entry) => {
                Some(std::mem::replace(&mut entry.get_mut().output, output))
            }
            hashbrown::hash_map::Entry::Vacant(entry) => {
                entry.insert(MooreState::new(output));
                None
            }
        }
    }

    /// Sets the transition of `from` on `input`. A state that was not declared
    /// before gets an empty output. Returns the replaced target, if any.
    pub fn add_transition(
        &mut self,
        from: impl Into<State>,
        input: impl Into<Input>,
        target: impl Into<State>,
    ) -> Option<State> {
        self.states
            .entry(from.into())
            .or_default()
            .transitions
            .insert(input.into(), target.into())
    }

    pub fn get_state(&self, state: &str) -> Option<&MooreState> {
        self.states.get(state)
    }

    pub fn output(&self, state: &str) -> Option<&Output> {
        self.states.get(state).map(|s| &s.output)
    }

    pub fn transition(&self, state: &str, input: &str) -> Option<&State> {
        self.states.get(state)?.transitions.get(input)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&State, &MooreState)> {
        self.states.iter()
    }
}

impl TransitionSystem for MooreMachine {
    fn states(&self) -> impl Iterator<Item = &State> {
        self.states.keys()
    }

    fn successors(&self, state: &str) -> impl Iterator<Item = &State> {
        self.states
            .get(state)
            .into_iter()
            .flat_map(|s| s.transitions.values())
    }

    fn labeled_successors(&self, state: &str) -> impl Iterator<Item = (&Input, &State)> {
        self.states
            .get(state)
            .into_iter()
            .flat_map(|s| s.transitions.iter())
    }

    fn contains_state(&self, state: &str) -> bool {
        self.states.contains_key(state)
    }

    fn state_count(&self) -> usize {
        self.states.len()
    }

    fn node_label(&self, state: &str) -> String {
        match self.output(state) {
            Some(output) => format!("{state}/{output}"),
            None => state.to_string(),
        }
    }

    fn retain_states(self, keep: &HashSet<State>) -> Self {
        MooreMachine {
            states: retain_keys(self.states, keep),
        }
    }
}

impl Transducer for MooreMachine {
    /// Reports the output of every state entered after consuming an input.
    /// The output of `start` itself is not part of the result, which lines
    /// the sequence up with the equivalent Mealy machine.
    fn run<'w>(
        &self,
        start: &str,
        word: impl IntoIterator<Item = &'w str>,
    ) -> Result<Vec<Output>, MachineError> {
        let mut name = start;
        let mut current = self
            .states
            .get(start)
            .ok_or_else(|| MachineError::UnknownStartState(start.to_string()))?;
        let mut outputs = vec![];

        for input in word {
            let target = current
                .transitions
                .get(input)
                .ok_or_else(|| MachineError::UnknownInput(input.to_string()))?;

            current = self.states.get(target).ok_or_else(|| {
                MachineError::UnreachableReference {
                    state: name.to_string(),
                    input: input.to_string(),
                    target: target.clone(),
                }
            })?;
            outputs.push(current.output.clone());
            name = target.as_str();
        }

        Ok(outputs)
    }
}
