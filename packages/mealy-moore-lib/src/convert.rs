use std::{fmt::Display, iter::once, str::FromStr};

use hashbrown::{HashMap, HashSet};
use itertools::Itertools;

use crate::{
    automaton::{
        Initialized, MachineKind, State, TransitionSystem,
        algorithms::{prune, reachable_states, to_graphviz},
        mealy::{MealyMachine, MealyState, MealyTransition},
        moore::MooreMachine,
        table::TableFormat,
    },
    config::{ConversionMode, ConverterConfig, SplitConfig},
    error::MachineError,
};

/// Relabels every transition with the output of its target state. The state
/// set is unchanged.
pub fn moore_to_mealy(moore: &MooreMachine) -> Result<MealyMachine, MachineError> {
    moore.check_well_formed()?;

    let mut mealy = MealyMachine::new();
    for (name, state) in moore.iter() {
        mealy.add_state(name.clone());

        for (input, target) in &state.transitions {
            let output = moore
                .output(target)
                .ok_or_else(|| MachineError::UnreachableReference {
                    state: name.clone(),
                    input: input.clone(),
                    target: target.clone(),
                })?;
            mealy.add_transition(
                name.clone(),
                input.clone(),
                MealyTransition::new(target.clone(), output.clone()),
            );
        }
    }

    Ok(mealy)
}

/// Splits every reachable Mealy state into one Moore state per output on its
/// incoming transitions. The start state additionally gets a variant carrying
/// the configured start output, which becomes the start of the Moore machine.
///
/// Split states are named `<prefix><n>`: the start variant is number 0, the
/// others follow in ascending `(state, output)` order. The prefix may not
/// contain `;`, `/` or line breaks. Returns the Moore machine and its start
/// state.
pub fn mealy_to_moore(
    mealy: &MealyMachine,
    start: &str,
    config: &SplitConfig,
) -> Result<(MooreMachine, State), MachineError> {
    mealy.check_well_formed()?;
    let prefix = config.get_state_prefix();
    if let Some(character) = prefix.chars().find(|c| matches!(c, ';' | '/' | '\n' | '\r')) {
        return Err(MachineError::ReservedCharacter {
            field: prefix.clone(),
            character,
        });
    }
    let reachable = reachable_states(mealy, start)?;

    let sources: HashMap<&str, &MealyState> = mealy
        .iter()
        .filter(|(name, _)| reachable.contains(*name))
        .map(|(name, state)| (name.as_str(), state))
        .collect();

    let start_variant = (start, config.get_start_output().as_str());
    let mut variants = HashSet::new();
    variants.insert(start_variant);
    for state in sources.values() {
        for transition in state.transitions.values() {
            variants.insert((transition.target.as_str(), transition.output.as_str()));
        }
    }

    if let Some(limit) = *config.get_max_states()
        && variants.len() > limit
    {
        return Err(MachineError::StateLimitExceeded {
            limit,
            required: variants.len(),
        });
    }

    let ordered = once(start_variant)
        .chain(variants.into_iter().filter(|v| *v != start_variant).sorted())
        .collect_vec();
    let names: HashMap<(&str, &str), State> = ordered
        .iter()
        .enumerate()
        .map(|(i, variant)| (*variant, format!("{prefix}{i}")))
        .collect();

    let mut moore = MooreMachine::new();
    for variant in &ordered {
        let (state, output) = *variant;
        let name = &names[variant];
        tracing::trace!(%name, origin = %state, %output, "split state");

        moore.set_output(name.clone(), output);
        for (input, transition) in &sources[state].transitions {
            let target = &names[&(transition.target.as_str(), transition.output.as_str())];
            moore.add_transition(name.clone(), input.clone(), target.clone());
        }
    }

    tracing::debug!(
        mealy_states = sources.len(),
        moore_states = moore.state_count(),
        "split Mealy states"
    );

    Ok((moore, names[&start_variant].clone()))
}

/// The conversion selector accepted at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    MealyToMoore,
    MooreToMealy,
}

impl ConversionKind {
    pub fn source(&self) -> MachineKind {
        match self {
            ConversionKind::MealyToMoore => MachineKind::Mealy,
            ConversionKind::MooreToMealy => MachineKind::Moore,
        }
    }
}

impl FromStr for ConversionKind {
    type Err = MachineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mealy-to-moore" => Ok(ConversionKind::MealyToMoore),
            "moore-to-mealy" => Ok(ConversionKind::MooreToMealy),
            _ => Err(MachineError::UnknownSelector(s.to_string())),
        }
    }
}

impl Display for ConversionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionKind::MealyToMoore => write!(f, "mealy-to-moore"),
            ConversionKind::MooreToMealy => write!(f, "moore-to-mealy"),
        }
    }
}

/// The machine a conversion ended up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertedMachine {
    Mealy(MealyMachine),
    Moore(MooreMachine),
}

impl ConvertedMachine {
    pub fn kind(&self) -> MachineKind {
        match self {
            ConvertedMachine::Mealy(_) => MachineKind::Mealy,
            ConvertedMachine::Moore(_) => MachineKind::Moore,
        }
    }

    pub fn state_count(&self) -> usize {
        match self {
            ConvertedMachine::Mealy(m) => m.state_count(),
            ConvertedMachine::Moore(m) => m.state_count(),
        }
    }

    pub fn to_table(&self) -> Result<String, MachineError> {
        match self {
            ConvertedMachine::Mealy(m) => m.to_table(),
            ConvertedMachine::Moore(m) => m.to_table(),
        }
    }

    pub fn to_graphviz(&self, start: &str) -> Result<String, MachineError> {
        match self {
            ConvertedMachine::Mealy(m) => to_graphviz(m, start),
            ConvertedMachine::Moore(m) => to_graphviz(m, start),
        }
    }

    /// Serializes the machine together with `start`, see [`Initialized`].
    pub fn to_json(&self, start: &str) -> anyhow::Result<String> {
        match self {
            ConvertedMachine::Mealy(m) => {
                Initialized::new(m.clone(), start.to_string()).to_json()
            }
            ConvertedMachine::Moore(m) => {
                Initialized::new(m.clone(), start.to_string()).to_json()
            }
        }
    }
}

/// Result of [`Converter::convert`]. The table in `text` is sorted, so the
/// start state is only known through `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub start: State,
    pub machine: ConvertedMachine,
}

/// Text to text conversion driven by a [`ConversionKind`] and a
/// [`ConverterConfig`].
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Self {
        Converter { config }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn convert(&self, text: &str, kind: ConversionKind) -> Result<Conversion, MachineError> {
        let mode = *self.config.get_mode();
        let _span = tracing::debug_span!("convert", %kind, %mode).entered();

        let (machine, start) = match (kind, mode) {
            (ConversionKind::MealyToMoore, ConversionMode::Convert) => {
                let (mealy, start) = MealyMachine::parse_table(text)?;
                tracing::info!(states = mealy.state_count(), %start, "parsed Mealy machine");
                let (moore, start) = mealy_to_moore(&mealy, &start, self.config.get_split())?;
                (ConvertedMachine::Moore(moore), start)
            }
            (ConversionKind::MealyToMoore, ConversionMode::Normalize) => {
                let (mealy, start) = MealyMachine::parse_table(text)?;
                tracing::info!(states = mealy.state_count(), %start, "parsed Mealy machine");
                (ConvertedMachine::Mealy(mealy), start)
            }
            (ConversionKind::MooreToMealy, ConversionMode::Convert) => {
                let (mut moore, start) = MooreMachine::parse_table(text)?;
                tracing::info!(states = moore.state_count(), %start, "parsed Moore machine");
                if *self.config.get_prune_unreachable() {
                    moore = prune(moore, &start)?;
                }
                (ConvertedMachine::Mealy(moore_to_mealy(&moore)?), start)
            }
            (ConversionKind::MooreToMealy, ConversionMode::Normalize) => {
                let (moore, start) = MooreMachine::parse_table(text)?;
                tracing::info!(states = moore.state_count(), %start, "parsed Moore machine");
                (ConvertedMachine::Moore(prune(moore, &start)?), start)
            }
        };

        let text = machine.to_table()?;
        tracing::info!(
            kind = %machine.kind(),
            states = machine.state_count(),
            %start,
            "conversion done"
        );

        Ok(Conversion {
            text,
            start,
            machine,
        })
    }
}

#[test]
fn test_conversion_kind_from_str() {
    assert_eq!(
        "mealy-to-moore".parse::<ConversionKind>(),
        Ok(ConversionKind::MealyToMoore)
    );
    assert_eq!(
        "moore-to-mealy".parse::<ConversionKind>(),
        Ok(ConversionKind::MooreToMealy)
    );
    assert_eq!(
        "mealy-to-mealy".parse::<ConversionKind>(),
        Err(MachineError::UnknownSelector("mealy-to-mealy".into()))
    );
    assert_eq!(ConversionKind::MooreToMealy.to_string(), "moore-to-mealy");
}

#[test]
fn test_split_names_start_variant_first() {
    // a -> b always outputs 1, b -> a always outputs 0
    let mut mealy = MealyMachine::new();
    mealy.add_transition("a", "x", MealyTransition::new("b", "1"));
    mealy.add_transition("b", "x", MealyTransition::new("a", "0"));

    let (moore, start) = mealy_to_moore(&mealy, "a", &SplitConfig::default()).unwrap();

    // start variant (a, ""), then (a, 0), (b, 1)
    assert_eq!(start, "q0");
    assert_eq!(moore.state_count(), 3);
    assert_eq!(moore.output("q0").map(String::as_str), Some(""));
    assert_eq!(moore.output("q1").map(String::as_str), Some("0"));
    assert_eq!(moore.output("q2").map(String::as_str), Some("1"));
    assert_eq!(moore.transition("q0", "x").map(String::as_str), Some("q2"));
    assert_eq!(moore.transition("q2", "x").map(String::as_str), Some("q1"));
    assert_eq!(moore.transition("q1", "x").map(String::as_str), Some("q2"));
}

#[test]
fn test_start_output_merges_with_incoming_output() {
    let mut mealy = MealyMachine::new();
    mealy.add_transition("a", "x", MealyTransition::new("a", "1"));

    let config = SplitConfig::default().with_start_output("1".into());
    let (moore, start) = mealy_to_moore(&mealy, "a", &config).unwrap();

    assert_eq!(start, "q0");
    assert_eq!(moore.state_count(), 1);
    assert_eq!(moore.transition("q0", "x").map(String::as_str), Some("q0"));
}
