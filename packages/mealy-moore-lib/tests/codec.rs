use mealy_moore_lib::{
    automaton::{
        MachineKind, Transducer,
        mealy::MealyMachine,
        moore::MooreMachine,
        table::{parse_mealy, parse_moore, serialize_mealy, serialize_moore},
    },
    error::MachineError,
};

const MEALY: &str = r#"
;S0;S1;S2
a;S1/x;S0/y;S2/x
b;S2/y;S1/x;S0/y
"#;

const MOORE: &str = r#"
;1;0
;A;B
0;B;A
1;A;B
"#;

#[test]
fn mealy_example() {
    let (mealy, start) = parse_mealy(MEALY).unwrap();
    assert_eq!(start, "S0");

    let outputs = mealy.run("S0", ["a", "a", "b", "b"]).unwrap();
    assert_eq!(outputs, vec!["x", "y", "y", "y"]);

    assert_eq!(serialize_mealy(&mealy).unwrap(), MEALY.trim_start());
}

#[test]
fn moore_example() {
    let (moore, start) = parse_moore(MOORE).unwrap();
    assert_eq!(start, "A");
    assert_eq!(moore.run("A", ["0", "0", "1"]).unwrap(), vec!["0", "1", "1"]);
    assert_eq!(serialize_moore(&moore).unwrap(), MOORE.trim_start());
}

#[test]
fn serialization_sorts_states_and_inputs() {
    let (mealy, start) = parse_mealy(";S1;S0\nz;S0/x;S1/y\na;S1/q;S1/r\n").unwrap();
    assert_eq!(start, "S1");
    assert_eq!(
        serialize_mealy(&mealy).unwrap(),
        ";S0;S1\na;S1/r;S1/q\nz;S1/y;S0/x\n"
    );
}

#[test]
fn row_with_extra_field() {
    assert_eq!(
        parse_mealy(";A\nx;A/0;A/1\n"),
        Err(MachineError::ColumnCountMismatch {
            line: 2,
            expected: 1,
            found: 2
        })
    );
}

#[test]
fn header_without_states() {
    assert_eq!(
        parse_mealy("A B\nx;A/0\n"),
        Err(MachineError::NoStates { line: 1 })
    );
}

#[test]
fn too_few_lines() {
    assert_eq!(
        parse_moore(";1;0\n"),
        Err(MachineError::EmptyInput {
            kind: MachineKind::Moore,
            needed: 2,
            found: 1
        })
    );
    assert_eq!(
        parse_mealy("\n\n"),
        Err(MachineError::EmptyInput {
            kind: MachineKind::Mealy,
            needed: 1,
            found: 0
        })
    );
}

#[test]
fn machines_without_inputs_round_trip() {
    let mut mealy = MealyMachine::new();
    mealy.add_state("A");
    let text = serialize_mealy(&mealy).unwrap();
    assert_eq!(text, ";A\n");
    assert_eq!(parse_mealy(&text).unwrap(), (mealy, "A".to_string()));

    let mut moore = MooreMachine::new();
    moore.set_output("A", "x");
    let text = serialize_moore(&moore).unwrap();
    assert_eq!(text, ";x\n;A\n");
    assert_eq!(parse_moore(&text).unwrap(), (moore, "A".to_string()));
}
