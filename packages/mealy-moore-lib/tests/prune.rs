use itertools::Itertools;
use mealy_moore_lib::{
    automaton::{
        TransitionSystem,
        algorithms::{prune, reachable_states},
        mealy::{MealyMachine, MealyTransition},
        moore::MooreMachine,
        table::{parse_moore, serialize_moore},
    },
    error::MachineError,
};

#[test]
fn prune_keeps_states_reachable_by_any_input() {
    let (moore, start) = parse_moore(";1;0\n;A;B\n0;B;A\n1;A;B\n").unwrap();

    let pruned = prune(moore.clone(), &start).unwrap();
    assert_eq!(pruned, moore);
}

#[test]
fn prune_removes_unreachable_states() {
    let (moore, start) = parse_moore(";1;0;1\n;A;B;C\n0;B;A;A\n1;A;B;C\n").unwrap();

    let pruned = prune(moore, &start).unwrap();
    assert_eq!(pruned.states().sorted().collect_vec(), vec!["A", "B"]);
    assert_eq!(
        serialize_moore(&pruned).unwrap(),
        ";1;0\n;A;B\n0;B;A\n1;A;B\n"
    );
}

#[test]
fn prune_is_idempotent() {
    let (moore, start) = parse_moore(";1;0;1;0\n;A;B;C;D\nx;B;B;D;A\n").unwrap();

    let once = prune(moore, &start).unwrap();
    let twice = prune(once.clone(), &start).unwrap();
    assert_eq!(once, twice);
    assert_eq!(once.state_count(), 2);
}

#[test]
fn prune_unknown_start() {
    let (moore, _) = parse_moore(";1;0\n;A;B\n0;B;A\n").unwrap();
    assert_eq!(
        prune(moore, "Z"),
        Err(MachineError::UnknownStartState("Z".into()))
    );
}

#[test]
fn prune_rejects_partial_machine() {
    let mut mealy = MealyMachine::new();
    mealy.add_transition("a", "x", MealyTransition::new("b", "0"));
    mealy.add_transition("b", "y", MealyTransition::new("a", "1"));

    assert_eq!(
        prune(mealy, "a"),
        Err(MachineError::MissingTransition {
            state: "a".into(),
            input: "y".into()
        })
    );
}

#[test]
fn reachable_includes_start_without_transitions() {
    let mut moore = MooreMachine::new();
    moore.set_output("lonely", "1");

    let reachable = reachable_states(&moore, "lonely").unwrap();
    assert_eq!(reachable.len(), 1);
    assert!(reachable.contains("lonely"));
}
