use thiserror::Error;

use crate::automaton::{Input, MachineKind, State};

/// Everything that can go wrong while reading, transforming or writing a
/// machine. Line and column numbers are 1-based and refer to the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("{kind} table needs at least {needed} non-empty lines, found {found}")]
    EmptyInput {
        kind: MachineKind,
        needed: usize,
        found: usize,
    },

    #[error("line {line}: header does not declare any state")]
    NoStates { line: usize },

    #[error("line {line}: state `{state}` is declared more than once")]
    DuplicateState { state: State, line: usize },

    #[error("line {line}: input `{input}` already has a row")]
    DuplicateInput { input: Input, line: usize },

    #[error("line {line}: expected {expected} cells, found {found}")]
    ColumnCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}, column {column}: cell `{cell}` is not of the form `<state>/<output>`")]
    MalformedCell {
        line: usize,
        column: usize,
        cell: String,
    },

    #[error("unknown conversion `{0}`, expected `mealy-to-moore` or `moore-to-mealy`")]
    UnknownSelector(String),

    #[error("state `{state}` goes to undeclared state `{target}` on input `{input}`")]
    UnreachableReference {
        state: State,
        input: Input,
        target: State,
    },

    #[error("state `{state}` has no transition for input `{input}`")]
    MissingTransition { state: State, input: Input },

    #[error("start state `{0}` is not a state of the machine")]
    UnknownStartState(State),

    #[error("input `{0}` is not part of the alphabet")]
    UnknownInput(Input),

    #[error("`{field}` contains the reserved character {character:?}")]
    ReservedCharacter { field: String, character: char },

    #[error("state splitting needs {required} states, but the limit is {limit}")]
    StateLimitExceeded { limit: usize, required: usize },
}
