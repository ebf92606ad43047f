use itertools::Itertools;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::automaton::{bdd::Bit, dfa::Dfa};

/// Inspection helpers for [Dfa]s. These are meant for debugging and do not
/// take part in any decision procedure.
pub trait DfaExport {
    fn to_dot(&self, print_sink: bool) -> String;
    fn to_graph(&self) -> DiGraph<bool, String>;
    fn strongly_connected_components(&self) -> Vec<Vec<usize>>;
    fn dump_bdd(&self) -> String;
}

impl DfaExport for Dfa {
    fn to_dot(&self, print_sink: bool) -> String {
        let sink = self.sink();
        let hidden = |state: usize| !print_sink && Some(state) == sink;

        let mut dot = String::new();
        dot.push_str("digraph finite_state_machine {\n");
        dot.push_str("fontname=\"Helvetica,Arial,sans-serif\"\n");
        dot.push_str("node [fontname=\"Helvetica,Arial,sans-serif\"]\n");
        dot.push_str("edge [fontname=\"Helvetica,Arial,sans-serif\"]\n");
        dot.push_str("rankdir=LR;\n");
        dot.push_str("node [shape=point,label=\"\"]START\n");

        dot.push_str(&format!(
            "node [shape = doublecircle]; {};\n",
            self.accepting_states().iter().join(" ")
        ));
        dot.push_str("node [shape = circle];\n");
        dot.push_str(&format!("START -> {};\n", self.start()));

        for state in 0..self.state_count() {
            if hidden(state) {
                continue;
            }
            dot.push_str(&format!("{} [ label=\"{}\" ];\n", state, state));
        }

        for state in 0..self.state_count() {
            if hidden(state) {
                continue;
            }

            let grouped = self
                .paths(state)
                .into_iter()
                .filter(|(_, target)| !hidden(*target))
                .into_group_map_by(|(_, target)| *target);

            for (target, paths) in grouped.into_iter().sorted_by_key(|(t, _)| *t) {
                let label = paths
                    .iter()
                    .map(|(pattern, _)| Bit::pattern_to_string(pattern))
                    .join("\\n");
                dot.push_str(&format!("{} -> {} [ label=\"{}\" ];\n", state, target, label));
            }
        }

        dot.push_str("}\n");
        dot
    }

    /// Node weights are the acceptance flags, edge weights the patterns.
    fn to_graph(&self) -> DiGraph<bool, String> {
        let mut graph = DiGraph::with_capacity(self.state_count(), 0);
        for state in 0..self.state_count() {
            graph.add_node(self.is_accepting(state));
        }

        for state in 0..self.state_count() {
            for (pattern, target) in self.paths(state) {
                graph.add_edge(
                    NodeIndex::new(state),
                    NodeIndex::new(target),
                    Bit::pattern_to_string(&pattern),
                );
            }
        }

        graph
    }

    fn strongly_connected_components(&self) -> Vec<Vec<usize>> {
        petgraph::algo::tarjan_scc(&self.to_graph())
            .into_iter()
            .map(|component| component.into_iter().map(|n| n.index()).sorted().collect())
            .collect()
    }

    fn dump_bdd(&self) -> String {
        (0..self.state_count())
            .map(|state| {
                format!(
                    "state {}{}:\n{}",
                    state,
                    if self.is_accepting(state) { " (accepting)" } else { "" },
                    self.bdd().dump(self.transitions(state))
                )
            })
            .join("\n")
    }
}
