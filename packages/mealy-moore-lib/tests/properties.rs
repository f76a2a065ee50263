//! Property-based tests over randomly generated total machines.

use mealy_moore_lib::{
    automaton::{
        TransitionSystem,
        algorithms::{prune, reachable_states},
        mealy::{MealyMachine, MealyTransition},
        moore::MooreMachine,
        table::TableFormat,
    },
    config::SplitConfig,
    convert::{mealy_to_moore, moore_to_mealy},
    validation::same_output,
};
use proptest::prelude::*;

const START: &str = "s0";

prop_compose! {
    fn arbitrary_mealy()(states in 1usize..6, inputs in 1usize..4)(
        cells in prop::collection::vec((0..states, 0usize..3), states * inputs),
        inputs in Just(inputs),
    ) -> MealyMachine {
        let mut mealy = MealyMachine::new();
        for (i, (target, output)) in cells.into_iter().enumerate() {
            mealy.add_transition(
                format!("s{}", i / inputs),
                format!("i{}", i % inputs),
                MealyTransition::new(format!("s{target}"), format!("o{output}")),
            );
        }
        mealy
    }
}

prop_compose! {
    fn arbitrary_moore()(states in 1usize..6, inputs in 1usize..4)(
        outputs in prop::collection::vec(0usize..3, states),
        targets in prop::collection::vec(0..states, states * inputs),
        inputs in Just(inputs),
    ) -> MooreMachine {
        let mut moore = MooreMachine::new();
        for (i, output) in outputs.into_iter().enumerate() {
            moore.set_output(format!("s{i}"), format!("o{output}"));
        }
        for (i, target) in targets.into_iter().enumerate() {
            moore.add_transition(
                format!("s{}", i / inputs),
                format!("i{}", i % inputs),
                format!("s{target}"),
            );
        }
        moore
    }
}

proptest! {
    #[test]
    fn mealy_table_round_trip(mealy in arbitrary_mealy()) {
        let (parsed, start) = MealyMachine::parse_table(&mealy.to_table().unwrap()).unwrap();
        prop_assert_eq!(start, START);
        prop_assert_eq!(parsed, mealy);
    }

    #[test]
    fn moore_table_round_trip(moore in arbitrary_moore()) {
        let (parsed, start) = MooreMachine::parse_table(&moore.to_table().unwrap()).unwrap();
        prop_assert_eq!(start, START);
        prop_assert_eq!(parsed, moore);
    }

    #[test]
    fn prune_is_idempotent(moore in arbitrary_moore()) {
        let once = prune(moore, START).unwrap();
        let twice = prune(once.clone(), START).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prune_keeps_exactly_the_reachable_states(moore in arbitrary_moore()) {
        let reachable = reachable_states(&moore, START).unwrap();
        let pruned = prune(moore.clone(), START).unwrap();

        prop_assert_eq!(pruned.state_count(), reachable.len());
        prop_assert!(pruned.states().all(|state| reachable.contains(state)));
        prop_assert!(pruned.check_well_formed().is_ok());
        prop_assert!(same_output(&moore, START, &pruned, START, 3));
    }

    #[test]
    fn moore_to_mealy_preserves_outputs(moore in arbitrary_moore()) {
        let mealy = moore_to_mealy(&moore).unwrap();
        prop_assert_eq!(mealy.state_count(), moore.state_count());
        prop_assert!(same_output(&moore, START, &mealy, START, 4));
    }

    #[test]
    fn mealy_to_moore_preserves_outputs(mealy in arbitrary_mealy()) {
        let (moore, start) = mealy_to_moore(&mealy, START, &SplitConfig::default()).unwrap();
        prop_assert!(moore.check_well_formed().is_ok());
        prop_assert!(same_output(&mealy, START, &moore, &start, 4));
    }
}
