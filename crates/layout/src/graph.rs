use crate::LayeredLayoutError;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petri_net::{Arc, ArcId, Node, PetriNet, Point};
use std::collections::HashMap;
use tracing::{trace, warn};

/// Owned working copy of a net used for the duration of one layout run.
///
/// Node and edge indices stay valid when placeholders are inserted and
/// collapsed again, which is why a stable graph is used.
pub type WorkGraph = StableDiGraph<Node, LayoutArc>;

/// Arc of the working graph
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutArc {
    /// Arc of the persistent net this one was derived from
    pub origin: ArcId,
    pub weight: i32,
    pub anchors: Vec<Point>,
    /// Set when cycle breaking flipped the arc against its drawn direction
    pub reversed: bool,
}

impl LayoutArc {
    /// Copy of this arc for one segment of a placeholder chain
    pub fn segment(&self) -> Self {
        Self {
            anchors: Vec::new(),
            ..self.clone()
        }
    }
}

impl From<&Arc> for LayoutArc {
    fn from(arc: &Arc) -> Self {
        Self {
            origin: arc.id,
            weight: arc.weight,
            anchors: arc.anchors.clone(),
            reversed: false,
        }
    }
}

/// Snapshot the net into a [`WorkGraph`], keeping node and arc insertion order
///
/// Arcs whose endpoints are not part of the net are skipped.
///
/// # Errors
/// Returns an error if the net contains a self-loop
pub fn working_copy(net: &PetriNet) -> Result<WorkGraph, LayeredLayoutError> {
    let mut graph = WorkGraph::with_capacity(net.nodes().len(), net.arcs().len());
    let mut indices: HashMap<_, NodeIndex> = HashMap::new();

    for node in net.nodes() {
        let index = graph.add_node(node.clone());
        indices.insert(node.id.clone(), index);
    }

    for arc in net.arcs() {
        if arc.is_self_loop() {
            return Err(LayeredLayoutError::SelfLoop {
                arc: arc.id,
                node: arc.from.clone(),
            });
        }

        let (Some(&from), Some(&to)) = (indices.get(&arc.from), indices.get(&arc.to)) else {
            warn!("Skipping {} between {} and {}: unknown endpoint", arc.id, arc.from, arc.to);
            continue;
        };
        graph.add_edge(from, to, LayoutArc::from(arc));
    }

    trace!(
        "Working copy with {} nodes and {} arcs",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use petri_net::NodeId;
    use test_log::test;

    #[test]
    fn test_working_copy_rejects_self_loops() {
        let mut net = PetriNet::new();
        net.add_transition("t", None).unwrap();
        let arc = net.add_arc("t", "t", 1).unwrap();

        assert_eq!(
            working_copy(&net).unwrap_err(),
            LayeredLayoutError::SelfLoop {
                arc,
                node: NodeId::from("t"),
            }
        );
    }

    #[test]
    fn test_working_copy_keeps_parallel_arcs() {
        let mut net = PetriNet::new();
        net.add_place("p", None, 0).unwrap();
        net.add_transition("t", None).unwrap();
        net.add_arc("p", "t", 1).unwrap();
        net.add_arc("p", "t", 2).unwrap();

        let graph = working_copy(&net).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        let weights: Vec<i32> = graph
            .edge_indices()
            .filter_map(|e| graph.edge_weight(e))
            .map(|arc| arc.weight)
            .collect();
        assert_eq!(weights, vec![1, 2]);
    }
}
