use std::fmt::Display;

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::MachineError;

pub mod algorithms;
pub mod mealy;
pub mod moore;
pub mod table;

/// Opaque state identifier as it appears in the table header.
pub type State = String;
/// Label of one row of the transition table.
pub type Input = String;
/// Output symbol, attached to a transition (Mealy) or a state (Moore).
pub type Output = String;

/// The two table flavours this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    Mealy,
    Moore,
}

impl Display for MachineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineKind::Mealy => write!(f, "Mealy"),
            MachineKind::Moore => write!(f, "Moore"),
        }
    }
}

/// The part of a machine that only knows "a state has transitions to other
/// states". Everything graph shaped (reachability, pruning, graphviz) is
/// written against this trait so it works for both machine kinds.
pub trait TransitionSystem: Sized {
    /// Iterates over all states, in no particular order.
    fn states(&self) -> impl Iterator<Item = &State>;

    /// Iterates over the targets of all transitions leaving `state`. Yields
    /// nothing for an unknown state.
    fn successors(&self, state: &str) -> impl Iterator<Item = &State>;

    /// Iterates over `(input, target)` for every transition leaving `state`.
    fn labeled_successors(&self, state: &str) -> impl Iterator<Item = (&Input, &State)>;

    fn contains_state(&self, state: &str) -> bool;

    fn state_count(&self) -> usize;

    /// The sorted, deduplicated set of inputs used anywhere in the machine.
    fn alphabet(&self) -> Vec<&Input> {
        self.states()
            .flat_map(|state| self.labeled_successors(state).map(|(input, _)| input))
            .sorted()
            .dedup()
            .collect()
    }

    /// Verifies totality (every state has a transition for every input of
    /// the alphabet) and closure (every target is a state). Errors name the
    /// lexicographically smallest offending state and input.
    fn check_well_formed(&self) -> Result<(), MachineError> {
        let alphabet = self.alphabet();

        for state in self.states().sorted() {
            let transitions: HashMap<&Input, &State> = self.labeled_successors(state).collect();

            for input in &alphabet {
                let Some(target) = transitions.get(input) else {
                    return Err(MachineError::MissingTransition {
                        state: state.clone(),
                        input: (*input).clone(),
                    });
                };

                if !self.contains_state(target) {
                    return Err(MachineError::UnreachableReference {
                        state: state.clone(),
                        input: (*input).clone(),
                        target: (*target).clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Label of a state in graph renderings.
    fn node_label(&self, state: &str) -> String {
        state.to_string()
    }

    /// Label of the transition leaving `state` on `input` in graph renderings.
    fn edge_label(&self, _state: &str, input: &str) -> String {
        input.to_string()
    }

    /// Builds a new machine that only contains the states in `keep`.
    /// Transitions are kept as they are, so `keep` must be closed under
    /// successors for the result to be well formed.
    fn retain_states(self, keep: &HashSet<State>) -> Self;
}

/// A machine that maps input words to output words.
pub trait Transducer: TransitionSystem {
    /// Drives the machine from `start` over `word` and returns one output per
    /// consumed input.
    fn run<'w>(
        &self,
        start: &str,
        word: impl IntoIterator<Item = &'w str>,
    ) -> Result<Vec<Output>, MachineError>;
}

/// Keeps the entries of a state map whose key is in `keep`. Shared by the
/// `retain_states` implementations.
pub(crate) fn retain_keys<V>(
    states: HashMap<State, V>,
    keep: &HashSet<State>,
) -> HashMap<State, V> {
    states
        .into_iter()
        .filter(|(name, _)| keep.contains(name))
        .collect()
}

/// A machine together with its start state. The table format can not encode
/// the start state once states are re-sorted, so this is what gets exported
/// when the start state has to survive a round trip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initialized<M> {
    pub machine: M,
    pub start: State,
}

impl<M> Initialized<M> {
    pub fn new(machine: M, start: State) -> Self {
        Self { machine, start }
    }

    pub fn into_parts(self) -> (M, State) {
        (self.machine, self.start)
    }
}

impl<M: Serialize + DeserializeOwned> Initialized<M> {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
