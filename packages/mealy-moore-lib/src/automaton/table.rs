//! Semicolon separated transition tables.
//!
//! Mealy:
//! ```text
//! ;S0;S1;S2
//! a;S1/x;S0/y;S2/x
//! b;S2/y;S1/x;S0/y
//! ```
//!
//! Moore (first line holds the state outputs):
//! ```text
//! ;x;y;x
//! ;S0;S1;S2
//! a;S1;S0;S2
//! b;S2;S1;S0
//! ```
//!
//! The first declared state is the start state. Serialization sorts states and
//! inputs, so the start state has to be tracked next to the table.

use std::iter::once;

use hashbrown::HashSet;
use itertools::Itertools;

use crate::{
    automaton::{
        MachineKind, State, TransitionSystem,
        mealy::{MealyMachine, MealyTransition},
        moore::MooreMachine,
    },
    error::MachineError,
};

const FIELD_SEPARATOR: char = ';';
/// Characters no field may contain when written, the parser would split on
/// them.
const RESERVED: [char; 3] = [FIELD_SEPARATOR, '\n', '\r'];
/// Separates next state and output inside a Mealy cell. Only the first
/// occurrence counts, so outputs may contain it but state names may not.
const CELL_SEPARATOR: char = '/';

pub trait TableFormat: Sized {
    const KIND: MachineKind;

    /// Parses a table and returns the machine together with its start state.
    fn parse_table(text: &str) -> Result<(Self, State), MachineError>;

    /// Renders the machine with states and inputs in lexicographic order.
    fn to_table(&self) -> Result<String, MachineError>;
}

pub fn parse_mealy(text: &str) -> Result<(MealyMachine, State), MachineError> {
    MealyMachine::parse_table(text)
}

pub fn serialize_mealy(machine: &MealyMachine) -> Result<String, MachineError> {
    machine.to_table()
}

pub fn parse_moore(text: &str) -> Result<(MooreMachine, State), MachineError> {
    MooreMachine::parse_table(text)
}

pub fn serialize_moore(machine: &MooreMachine) -> Result<String, MachineError> {
    machine.to_table()
}

/// A non-blank source line with its 1-based line number.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    number: usize,
    text: &'a str,
}

impl<'a> Line<'a> {
    fn label(&self) -> &'a str {
        self.text
            .split(FIELD_SEPARATOR)
            .next()
            .unwrap_or_default()
    }

    /// All fields after the leading label field.
    fn cells(&self) -> Vec<&'a str> {
        self.text.split(FIELD_SEPARATOR).skip(1).collect()
    }
}

fn content_lines(text: &str) -> Vec<Line<'_>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| Line {
            number: i + 1,
            text: line,
        })
        .collect()
}

fn require_lines<'a>(
    text: &'a str,
    kind: MachineKind,
    needed: usize,
) -> Result<Vec<Line<'a>>, MachineError> {
    let lines = content_lines(text);
    if lines.len() < needed {
        return Err(MachineError::EmptyInput {
            kind,
            needed,
            found: lines.len(),
        });
    }
    Ok(lines)
}

fn parse_states<'a>(line: &Line<'a>) -> Result<Vec<&'a str>, MachineError> {
    let states = line.cells();
    if states.is_empty() {
        return Err(MachineError::NoStates { line: line.number });
    }

    let mut seen = HashSet::new();
    for state in &states {
        if !seen.insert(*state) {
            return Err(MachineError::DuplicateState {
                state: state.to_string(),
                line: line.number,
            });
        }
    }

    Ok(states)
}

/// One body row: the input label and one cell per declared state.
#[derive(Debug)]
struct Row<'a> {
    line: usize,
    input: &'a str,
    cells: Vec<&'a str>,
}

fn parse_rows<'a>(body: &[Line<'a>], state_count: usize) -> Result<Vec<Row<'a>>, MachineError> {
    let mut inputs = HashSet::new();
    let mut rows = Vec::with_capacity(body.len());

    for line in body {
        let input = line.label();
        let cells = line.cells();

        if cells.len() != state_count {
            return Err(MachineError::ColumnCountMismatch {
                line: line.number,
                expected: state_count,
                found: cells.len(),
            });
        }

        if !inputs.insert(input) {
            return Err(MachineError::DuplicateInput {
                input: input.to_string(),
                line: line.number,
            });
        }

        rows.push(Row {
            line: line.number,
            input,
            cells,
        });
    }

    Ok(rows)
}

fn check_declared(
    declared: &HashSet<&str>,
    state: &str,
    input: &str,
    target: &str,
) -> Result<(), MachineError> {
    if declared.contains(target) {
        Ok(())
    } else {
        Err(MachineError::UnreachableReference {
            state: state.to_string(),
            input: input.to_string(),
            target: target.to_string(),
        })
    }
}

fn check_field(field: &str, reserved: &[char]) -> Result<(), MachineError> {
    match field.chars().find(|c| reserved.contains(c)) {
        Some(character) => Err(MachineError::ReservedCharacter {
            field: field.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

fn check_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> Result<(), MachineError> {
    fields
        .into_iter()
        .try_for_each(|field| check_field(field, &RESERVED))
}

fn header_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    format!("{}\n", once("").chain(fields).join(";"))
}

impl TableFormat for MealyMachine {
    const KIND: MachineKind = MachineKind::Mealy;

    fn parse_table(text: &str) -> Result<(Self, State), MachineError> {
        let lines = require_lines(text, Self::KIND, 1)?;
        let states = parse_states(&lines[0])?;
        let declared: HashSet<&str> = states.iter().copied().collect();
        let rows = parse_rows(&lines[1..], states.len())?;

        let mut machine = MealyMachine::new();
        for state in &states {
            machine.add_state(*state);
        }

        for row in rows {
            for (column, (state, cell)) in states.iter().zip(&row.cells).enumerate() {
                let Some((target, output)) = cell.split_once(CELL_SEPARATOR) else {
                    return Err(MachineError::MalformedCell {
                        line: row.line,
                        // the label field is column 1
                        column: column + 2,
                        cell: cell.to_string(),
                    });
                };
                check_declared(&declared, state, row.input, target)?;
                machine.add_transition(*state, row.input, MealyTransition::new(target, output));
            }
        }

        Ok((machine, states[0].to_string()))
    }

    fn to_table(&self) -> Result<String, MachineError> {
        self.check_well_formed()?;

        let states = self.iter().sorted_by(|a, b| a.0.cmp(b.0)).collect_vec();
        check_fields(states.iter().map(|(name, _)| name.as_str()))?;
        let mut table = header_line(states.iter().map(|(name, _)| name.as_str()));

        for input in self.alphabet() {
            check_field(input, &RESERVED)?;
            let cells = states
                .iter()
                .map(|(_, state)| {
                    let transition = &state.transitions[input];
                    // the target ends at the first separator, the output may contain more
                    check_field(&transition.target, &[CELL_SEPARATOR])?;
                    check_field(&transition.output, &RESERVED)?;
                    Ok(format!(
                        "{}{CELL_SEPARATOR}{}",
                        transition.target, transition.output
                    ))
                })
                .collect::<Result<Vec<_>, MachineError>>()?
                .join(";");
            table.push_str(&format!("{input};{cells}\n"));
        }

        Ok(table)
    }
}

impl TableFormat for MooreMachine {
    const KIND: MachineKind = MachineKind::Moore;

    fn parse_table(text: &str) -> Result<(Self, State), MachineError> {
        let lines = require_lines(text, Self::KIND, 2)?;
        let outputs = lines[0].cells();
        let states = parse_states(&lines[1])?;

        if outputs.len() != states.len() {
            return Err(MachineError::ColumnCountMismatch {
                line: lines[0].number,
                expected: states.len(),
                found: outputs.len(),
            });
        }

        let declared: HashSet<&str> = states.iter().copied().collect();
        let rows = parse_rows(&lines[2..], states.len())?;

        let mut machine = MooreMachine::new();
        for (state, output) in states.iter().zip(outputs) {
            machine.set_output(*state, output);
        }

        for row in rows {
            for (state, target) in states.iter().zip(&row.cells) {
                check_declared(&declared, state, row.input, target)?;
                machine.add_transition(*state, row.input, *target);
            }
        }

        Ok((machine, states[0].to_string()))
    }

    fn to_table(&self) -> Result<String, MachineError> {
        self.check_well_formed()?;

        let states = self.iter().sorted_by(|a, b| a.0.cmp(b.0)).collect_vec();
        check_fields(states.iter().map(|(name, _)| name.as_str()))?;
        check_fields(states.iter().map(|(_, state)| state.output.as_str()))?;
        let mut table = header_line(states.iter().map(|(_, state)| state.output.as_str()));
        table.push_str(&header_line(states.iter().map(|(name, _)| name.as_str())));

        for input in self.alphabet() {
            check_field(input, &RESERVED)?;
            let cells = states
                .iter()
                .map(|(_, state)| state.transitions[input].as_str())
                .join(";");
            table.push_str(&format!("{input};{cells}\n"));
        }

        Ok(table)
    }
}

#[test]
fn test_parse_mealy_example() {
    let text = ";S0;S1;S2\na;S1/x;S0/y;S2/x\nb;S2/y;S1/x;S0/y\n";
    let (mealy, start) = parse_mealy(text).unwrap();

    assert_eq!(start, "S0");
    assert_eq!(
        mealy.transition("S1", "a"),
        Some(&MealyTransition::new("S0", "y"))
    );
    assert_eq!(
        mealy.transition("S2", "b"),
        Some(&MealyTransition::new("S0", "y"))
    );
}

#[test]
fn test_mealy_cell_splits_on_first_slash() {
    let (mealy, _) = parse_mealy(";A\nx;A/1/2\n").unwrap();
    assert_eq!(mealy.transition("A", "x").unwrap().output, "1/2");
}

#[test]
fn test_serialize_mealy_sorts_states_and_inputs() {
    let text = ";S1;S0\nb;S0/y;S1/x\na;S1/x;S0/y\n";
    let (mealy, start) = parse_mealy(text).unwrap();

    assert_eq!(start, "S1");
    assert_eq!(
        serialize_mealy(&mealy).unwrap(),
        ";S0;S1\na;S0/y;S1/x\nb;S1/x;S0/y\n"
    );
}

#[test]
fn test_parse_moore_example() {
    let text = ";x;y;x\n;S0;S1;S2\na;S1;S0;S2\nb;S2;S1;S0\n";
    let (moore, start) = parse_moore(text).unwrap();

    assert_eq!(start, "S0");
    assert_eq!(moore.output("S1").map(String::as_str), Some("y"));
    assert_eq!(moore.transition("S2", "b").map(String::as_str), Some("S0"));
    assert_eq!(serialize_moore(&moore).unwrap(), text);
}

#[test]
fn test_crlf_and_blank_lines() {
    let (moore, _) = parse_moore(";1;0\r\n;A;B\r\n\r\n0;B;A\r\n1;A;B\r\n").unwrap();
    assert_eq!(moore.transition("A", "0").map(String::as_str), Some("B"));
}

#[test]
fn test_empty_input() {
    assert_eq!(
        parse_mealy("\n  \n"),
        Err(MachineError::EmptyInput {
            kind: MachineKind::Mealy,
            needed: 1,
            found: 0
        })
    );
    assert!(matches!(
        parse_moore(""),
        Err(MachineError::EmptyInput { found: 0, .. })
    ));
}

#[test]
fn test_malformed_cell() {
    assert_eq!(
        parse_mealy(";S0;S1\na;S1;S0/y\n"),
        Err(MachineError::MalformedCell {
            line: 2,
            column: 2,
            cell: "S1".into()
        })
    );
}

#[test]
fn test_row_too_short() {
    assert_eq!(
        parse_moore(";1;0\n;A;B\n0;B\n"),
        Err(MachineError::ColumnCountMismatch {
            line: 3,
            expected: 2,
            found: 1
        })
    );
}

#[test]
fn test_duplicate_state_and_input() {
    assert_eq!(
        parse_mealy(";A;A\na;A/1;A/1\n"),
        Err(MachineError::DuplicateState {
            state: "A".into(),
            line: 1
        })
    );
    assert_eq!(
        parse_mealy(";A\na;A/1\na;A/2\n"),
        Err(MachineError::DuplicateInput {
            input: "a".into(),
            line: 3
        })
    );
}

#[test]
fn test_undeclared_target() {
    assert_eq!(
        parse_moore(";1\n;A\n0;B\n"),
        Err(MachineError::UnreachableReference {
            state: "A".into(),
            input: "0".into(),
            target: "B".into()
        })
    );
}

#[test]
fn test_moore_outputs_shorter_than_states() {
    assert_eq!(
        parse_moore(";1\n;A;B\n0;B;A\n"),
        Err(MachineError::ColumnCountMismatch {
            line: 1,
            expected: 2,
            found: 1
        })
    );
}

#[test]
fn test_header_only_tables() {
    let (mealy, start) = parse_mealy(";A;B\n").unwrap();
    assert_eq!(start, "A");
    assert_eq!(mealy.state_count(), 2);
    assert_eq!(serialize_mealy(&mealy).unwrap(), ";A;B\n");

    let (moore, _) = parse_moore(";x;y\n;A;B\n").unwrap();
    assert_eq!(moore.output("B").map(String::as_str), Some("y"));
    assert_eq!(serialize_moore(&moore).unwrap(), ";x;y\n;A;B\n");
}

#[test]
fn test_serialize_rejects_reserved_characters() {
    let mut mealy = MealyMachine::new();
    mealy.add_transition("A", "a;b", MealyTransition::new("A", "x"));
    assert_eq!(
        serialize_mealy(&mealy),
        Err(MachineError::ReservedCharacter {
            field: "a;b".into(),
            character: ';'
        })
    );

    let mut mealy = MealyMachine::new();
    mealy.add_transition("A/B", "a", MealyTransition::new("A/B", "x"));
    assert_eq!(
        serialize_mealy(&mealy),
        Err(MachineError::ReservedCharacter {
            field: "A/B".into(),
            character: '/'
        })
    );

    let mut moore = MooreMachine::new();
    moore.set_output("A", "line\nbreak");
    moore.add_transition("A", "a", "A");
    assert_eq!(
        serialize_moore(&moore),
        Err(MachineError::ReservedCharacter {
            field: "line\nbreak".into(),
            character: '\n'
        })
    );
}

#[test]
fn test_slashes_allowed_where_unambiguous() {
    // Mealy outputs and Moore states may contain the cell separator
    let (mealy, _) = parse_mealy(";A\nx;A/1/2\n").unwrap();
    assert_eq!(serialize_mealy(&mealy).unwrap(), ";A\nx;A/1/2\n");

    let (moore, _) = parse_moore(";0\n;A/B\nx;A/B\n").unwrap();
    assert_eq!(serialize_moore(&moore).unwrap(), ";0\n;A/B\nx;A/B\n");
}
