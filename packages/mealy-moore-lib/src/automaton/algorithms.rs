use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::{Dfs, EdgeRef},
};

use crate::{
    automaton::{State, TransitionSystem},
    error::MachineError,
};

/// The transition relation of a machine as a petgraph graph. Nodes carry the
/// state name, edges the input symbol. States and edges are added in sorted
/// order, so node indices are deterministic for a given machine.
#[derive(Debug, Clone)]
pub struct TransitionGraph<'a> {
    pub graph: DiGraph<&'a str, &'a str>,
    indices: HashMap<&'a str, NodeIndex>,
}

impl<'a> TransitionGraph<'a> {
    /// Transitions to states outside the machine are dropped; run
    /// [`TransitionSystem::check_well_formed`] first to reject them.
    pub fn new<M: TransitionSystem>(machine: &'a M) -> Self {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();

        let states = machine.states().sorted().collect_vec();
        for &state in &states {
            indices.insert(state.as_str(), graph.add_node(state.as_str()));
        }

        for &state in &states {
            let from = indices[state.as_str()];
            for (input, target) in machine.labeled_successors(state).sorted() {
                if let Some(to) = indices.get(target.as_str()) {
                    graph.add_edge(from, *to, input.as_str());
                }
            }
        }

        TransitionGraph { graph, indices }
    }

    pub fn index(&self, state: &str) -> Option<NodeIndex> {
        self.indices.get(state).copied()
    }
}

/// Computes every state reachable from `start` via zero or more transitions,
/// regardless of input. `start` itself is always part of the result.
pub fn reachable_states<M: TransitionSystem>(
    machine: &M,
    start: &str,
) -> Result<HashSet<State>, MachineError> {
    let graph = TransitionGraph::new(machine);
    let start_index = graph
        .index(start)
        .ok_or_else(|| MachineError::UnknownStartState(start.to_string()))?;

    let mut reachable = HashSet::new();
    let mut dfs = Dfs::new(&graph.graph, start_index);
    while let Some(node) = dfs.next(&graph.graph) {
        reachable.insert(graph.graph[node].to_string());
    }

    Ok(reachable)
}

/// Removes every state not reachable from `start`, together with its
/// transitions. The machine must be well formed. Pruning twice with the same
/// start is the same as pruning once.
pub fn prune<M: TransitionSystem>(machine: M, start: &str) -> Result<M, MachineError> {
    machine.check_well_formed()?;

    let reachable = reachable_states(&machine, start)?;
    let before = machine.state_count();
    let pruned = machine.retain_states(&reachable);

    tracing::debug!(
        start,
        before,
        after = pruned.state_count(),
        "removed unreachable states"
    );

    Ok(pruned)
}

/// Renders the machine as a graphviz digraph with an arrow into `start`.
pub fn to_graphviz<M: TransitionSystem>(
    machine: &M,
    start: &str,
) -> Result<String, MachineError> {
    let graph = TransitionGraph::new(machine);
    if graph.index(start).is_none() {
        return Err(MachineError::UnknownStartState(start.to_string()));
    }

    let mut dot = String::new();
    dot.push_str("digraph finite_state_machine {\n");
    dot.push_str("fontname=\"Helvetica,Arial,sans-serif\"\n");
    dot.push_str("node [fontname=\"Helvetica,Arial,sans-serif\"]\n");
    dot.push_str("edge [fontname=\"Helvetica,Arial,sans-serif\"]\n");
    dot.push_str("rankdir=LR;\n");
    dot.push_str("node [shape=point,label=\"\"]START\n");
    dot.push_str("node [shape = circle];\n");
    dot.push_str(&format!("START -> {:?};\n", start));

    for node in graph.graph.node_indices() {
        let state = graph.graph[node];
        dot.push_str(&format!(
            "{:?} [ label={:?} ];\n",
            state,
            machine.node_label(state)
        ));
    }

    for edge in graph.graph.edge_references() {
        let source = graph.graph[edge.source()];
        let target = graph.graph[edge.target()];
        dot.push_str(&format!(
            "{:?} -> {:?} [ label={:?} ];\n",
            source,
            target,
            machine.edge_label(source, edge.weight())
        ));
    }

    dot.push_str("}\n");

    Ok(dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::moore::MooreMachine;

    fn chain() -> MooreMachine {
        // A -> B -> C, D -> A, D is unreachable from A
        let mut moore = MooreMachine::new();
        for (state, target) in [("A", "B"), ("B", "C"), ("C", "C"), ("D", "A")] {
            moore.set_output(state, "0");
            moore.add_transition(state, "x", target);
        }
        moore
    }

    #[test]
    fn reachable_from_start() {
        let moore = chain();
        let mut reachable = reachable_states(&moore, "A").unwrap().into_iter().collect_vec();
        reachable.sort();
        assert_eq!(reachable, vec!["A", "B", "C"]);

        let reachable = reachable_states(&moore, "C").unwrap();
        assert_eq!(reachable.len(), 1);
    }

    #[test]
    fn unknown_start() {
        assert_eq!(
            reachable_states(&chain(), "Z"),
            Err(MachineError::UnknownStartState("Z".into()))
        );
    }

    #[test]
    fn graph_indices_are_sorted() {
        let moore = chain();
        let graph = TransitionGraph::new(&moore);
        assert_eq!(graph.index("A"), Some(NodeIndex::new(0)));
        assert_eq!(graph.index("D"), Some(NodeIndex::new(3)));
        assert_eq!(graph.graph.edge_count(), 4);
    }

    #[test]
    fn graphviz_mentions_start_and_edges() {
        let dot = to_graphviz(&chain(), "A").unwrap();
        assert!(dot.contains("START -> \"A\";"));
        assert!(dot.contains("\"D\" -> \"A\" [ label=\"x\" ];"));
        assert!(dot.contains("\"B\" [ label=\"B/0\" ];"));
    }
}
