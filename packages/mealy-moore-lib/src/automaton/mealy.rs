use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::{
    automaton::{Input, Output, State, Transducer, TransitionSystem, retain_keys},
    error::MachineError,
};

/// The edge label of a Mealy machine: where to go and what to emit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MealyTransition {
    pub target: State,
    pub output: Output,
}

impl MealyTransition {
    pub fn new(target: impl Into<State>, output: impl Into<Output>) -> Self {
        MealyTransition {
            target: target.into(),
            output: output.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealyState {
    pub transitions: HashMap<Input, MealyTransition>,
}

/// A Mealy machine: the output is a function of the current state and the
/// input, so it lives on the transition.
///
/// Invariants (checked by [`TransitionSystem::check_well_formed`], not on
/// every insert):
/// - every state has exactly one transition per input of the alphabet,
/// - every transition target is itself a state of the machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealyMachine {
    states: HashMap<State, MealyState>,
}

impl MealyMachine {
    pub fn new() -> Self {
        MealyMachine::default()
    }

    /// Declares a state without transitions. Returns false if the state
    /// already existed.
    pub fn add_state(&mut self, state: impl Into<State>) -> bool {
        let state = state.into();
        if self.states.contains_key(&state) {
            return false;
        }
        self.states.insert(state, MealyState::default());
        true
    }

    /// Sets the transition of `from` on `input`, declaring `from` if needed.
    /// Returns the transition that was replaced, if any.
    pub fn add_transition(
        &mut self,
        from: impl Into<State>,
        input: impl Into<Input>,
        transition: MealyTransition,
    ) -> Option<MealyTransition> {
        self.states
            .entry(from.into())
            .or_default()
            .transitions
            .insert(input.into(), transition)
    }

    pub fn get_state(&self, state: &str) -> Option<&MealyState> {
        self.states.get(state)
    }

    pub fn transition(&self, state: &str, input: &str) -> Option<&MealyTransition> {
        self.states.get(state)?.transitions.get(input)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&State, &MealyState)> {
        self.states.iter()
    }
}

impl TransitionSystem for MealyMachine {
    fn states(&self) -> impl Iterator<Item = &State> {
        self.states.keys()
    }

    fn successors(&self, state: &str) -> impl Iterator<Item = &State> {
        self.states
            .get(state)
            .into_iter()
            .flat_map(|s| s.transitions.values().map(|t| &t.target))
    }

    fn labeled_successors(&self, state: &str) -> impl Iterator<Item = (&Input, &State)> {
        self.states
            .get(state)
            .into_iter()
            .flat_map(|s| s.transitions.iter().map(|(input, t)| (input, &t.target)))
    }

    fn contains_state(&self, state: &str) -> bool {
        self.states.contains_key(state)
    }

    fn state_count(&self) -> usize {
        self.states.len()
    }

    fn edge_label(&self, state: &str, input: &str) -> String {
        match self.transition(state, input) {
            Some(transition) => format!("{input}/{}", transition.output),
            None => input.to_string(),
        }
    }

    fn retain_states(self, keep: &HashSet<State>) -> Self {
        MealyMachine {
            states: retain_keys(self.states, keep),
        }
    }
}

impl Transducer for MealyMachine {
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
            let transition = current
                .transitions
                .get(input)
                .ok_or_else(|| MachineError::UnknownInput(input.to_string()))?;
            outputs.push(transition.output.clone());

            current = self.states.get(&transition.target).ok_or_else(|| {
                MachineError::UnreachableReference {
                    state: name.to_string(),
                    input: input.to_string(),
                    target: transition.target.clone(),
                }
            })?;
            name = transition.target.as_str();
        }

        Ok(outputs)
    }
}
