use crate::{LayoutArc, WorkGraph};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use petri_net::ArcId;
use std::collections::HashSet;
use tracing::{debug, trace};

struct Search {
    visited: HashSet<NodeIndex>,
    on_stack: HashSet<NodeIndex>,
    feedback: Vec<(NodeIndex, NodeIndex, LayoutArc)>,
}

/// Make the graph acyclic by reversing every back edge found by a depth-first
/// search started from each unvisited node in insertion order
///
/// Back edges are removed from the graph as soon as they are found and added
/// back with swapped endpoints once the search is over. Arcs are tracked by
/// edge index, so parallel arcs are handled one by one.
///
/// Returns the origins of the reversed arcs, in discovery order.
pub(crate) fn break_cycles(graph: &mut WorkGraph) -> Vec<ArcId> {
    let mut search = Search {
        visited: HashSet::new(),
        on_stack: HashSet::new(),
        feedback: Vec::new(),
    };

    let roots: Vec<NodeIndex> = graph.node_indices().collect();
    for root in roots {
        search.visit(graph, root);
    }

    let mut reversed = Vec::with_capacity(search.feedback.len());
    for (from, to, mut arc) in search.feedback {
        arc.reversed = !arc.reversed;
        reversed.push(arc.origin);
        graph.add_edge(to, from, arc);
    }

    debug!("Reversed {} arcs to break cycles", reversed.len());
    reversed
}

impl Search {
    fn visit(&mut self, graph: &mut WorkGraph, node: NodeIndex) {
        if !self.visited.insert(node) {
            return;
        }
        self.on_stack.insert(node);

        for edge in outgoing_arcs(graph, node) {
            let Some((_, target)) = graph.edge_endpoints(edge) else {
                continue;
            };

            if self.on_stack.contains(&target) {
                if let Some(arc) = graph.remove_edge(edge) {
                    trace!("Back edge {} from {node:?} to {target:?}", arc.origin);
                    self.feedback.push((node, target, arc));
                }
            } else if !self.visited.contains(&target) {
                self.visit(graph, target);
            }
        }

        self.on_stack.remove(&node);
    }
}

/// Outgoing edges of a node, in the insertion order of their persistent arcs
fn outgoing_arcs(graph: &WorkGraph, node: NodeIndex) -> Vec<EdgeIndex> {
    let mut edges: Vec<_> = graph
        .edges_directed(node, Direction::Outgoing)
        .map(|edge| (edge.weight().origin, edge.id()))
        .collect();
    edges.sort();
    edges.into_iter().map(|(_, edge)| edge).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::working_copy;
    use petgraph::algo::is_cyclic_directed;
    use petgraph::visit::IntoEdgeReferences;
    use petri_net::{NodeId, PetriNet};
    use test_log::test;

    fn net_with_arcs(nodes: &[&str], arcs: &[(&str, &str)]) -> PetriNet {
        let mut net = PetriNet::new();
        for id in nodes {
            net.add_transition(*id, None).unwrap();
        }
        for (from, to) in arcs {
            net.add_arc(*from, *to, 1).unwrap();
        }
        net
    }

    fn arcs(graph: &WorkGraph) -> Vec<&LayoutArc> {
        graph
            .edge_indices()
            .filter_map(|edge| graph.edge_weight(edge))
            .collect()
    }

    fn endpoints(graph: &WorkGraph) -> Vec<(ArcId, NodeId, NodeId)> {
        let mut arcs: Vec<_> = graph
            .edge_references()
            .map(|edge| {
                (
                    edge.weight().origin,
                    graph[edge.source()].id.clone(),
                    graph[edge.target()].id.clone(),
                )
            })
            .collect();
        arcs.sort();
        arcs
    }

    #[test]
    fn test_three_cycle_reverses_one_arc() {
        let net = net_with_arcs(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let mut graph = working_copy(&net).unwrap();

        let reversed = break_cycles(&mut graph);

        assert_eq!(reversed, vec![ArcId(2)]);
        assert!(!is_cyclic_directed(&graph));
        assert_eq!(
            endpoints(&graph),
            vec![
                (ArcId(0), "a".into(), "b".into()),
                (ArcId(1), "b".into(), "c".into()),
                (ArcId(2), "a".into(), "c".into()),
            ]
        );
    }

    #[test]
    fn test_acyclic_graph_is_untouched() {
        let net = net_with_arcs(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("a", "d")],
        );
        let mut graph = working_copy(&net).unwrap();
        let before = endpoints(&graph);

        assert!(break_cycles(&mut graph).is_empty());
        assert_eq!(endpoints(&graph), before);
    }

    #[test]
    fn test_parallel_back_edges_are_reversed_individually() {
        // Two distinct arcs b -> a close the same cycle; a third arc c -> a
        // leaves a node that is not on the stack and must stay as is.
        let net = net_with_arcs(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "a"), ("b", "a"), ("c", "a")],
        );
        let mut graph = working_copy(&net).unwrap();

        let reversed = break_cycles(&mut graph);

        assert_eq!(reversed, vec![ArcId(1), ArcId(2)]);
        assert_eq!(graph.edge_count(), 4);
        assert!(!is_cyclic_directed(&graph));
        assert!(arcs(&graph)
            .iter()
            .filter(|arc| arc.origin == ArcId(3))
            .all(|arc| !arc.reversed));
    }

    #[test]
    fn test_reversed_arcs_were_back_edges() {
        // Two interleaved cycles sharing node b
        let net = net_with_arcs(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("b", "d"), ("d", "b")],
        );
        let mut graph = working_copy(&net).unwrap();

        let reversed = break_cycles(&mut graph);

        assert_eq!(reversed, vec![ArcId(2), ArcId(4)]);
        assert!(!is_cyclic_directed(&graph));
        let flagged: Vec<ArcId> = arcs(&graph)
            .iter()
            .filter(|arc| arc.reversed)
            .map(|arc| arc.origin)
            .collect();
        assert_eq!(flagged.len(), 2);
    }

    #[test]
    fn test_disconnected_components() {
        let net = net_with_arcs(
            &["a", "b", "x", "y"],
            &[("a", "b"), ("b", "a"), ("x", "y"), ("y", "x")],
        );
        let mut graph = working_copy(&net).unwrap();

        assert_eq!(break_cycles(&mut graph), vec![ArcId(1), ArcId(3)]);
        assert!(!is_cyclic_directed(&graph));
    }
}
