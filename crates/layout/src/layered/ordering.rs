use super::crossings::{count_crossings, minimize_crossings};
use super::LayeredGraph;
use crate::WorkGraph;
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::Direction;
use petri_net::Node;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Barycenter sweeps without improvement tolerated before giving up
const MAX_STALE_SWEEPS: usize = 4;

/// Predecessor and successor lists of every node, derived from the arcs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjacency {
    predecessors: HashMap<NodeIndex, Vec<NodeIndex>>,
    successors: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl Adjacency {
    /// Rebuild the maps from the current arcs of the graph
    pub fn from_graph(graph: &WorkGraph) -> Self {
        Self::from_pairs(
            graph
                .edge_indices()
                .filter_map(|edge| graph.edge_endpoints(edge)),
        )
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (NodeIndex, NodeIndex)>) -> Self {
        let mut adjacency = Self::default();
        for (from, to) in pairs {
            adjacency.predecessors.entry(to).or_default().push(from);
            adjacency.successors.entry(from).or_default().push(to);
        }
        adjacency
    }

    /// Origins of the arcs ending at `node`, empty for an unknown node
    pub fn predecessors(&self, node: NodeIndex) -> &[NodeIndex] {
        self.predecessors.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Destinations of the arcs leaving `node`, empty for an unknown node
    pub fn successors(&self, node: NodeIndex) -> &[NodeIndex] {
        self.successors.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn neighbors(&self, node: NodeIndex, direction: Direction) -> &[NodeIndex] {
        match direction {
            Direction::Incoming => self.predecessors(node),
            Direction::Outgoing => self.successors(node),
        }
    }
}

/// Replace every arc spanning more than one layer by a chain of unit arcs
/// through placeholder nodes, one per intermediate layer
///
/// The replaced arc is removed by edge index; each segment carries the
/// original arc's origin and weight. Placeholders are appended to their
/// layer. Returns the number of placeholders inserted.
pub(crate) fn insert_placeholders(graph: &mut WorkGraph, layers: &mut LayeredGraph) -> usize {
    let edges: Vec<EdgeIndex> = graph.edge_indices().collect();
    let mut count = 0;

    for edge in edges {
        let Some((from, to)) = graph.edge_endpoints(edge) else {
            continue;
        };
        let (Some(from_layer), Some(to_layer)) = (layers.layer_of(from), layers.layer_of(to))
        else {
            continue;
        };
        if to_layer <= from_layer + 1 {
            continue;
        }
        let Some(arc) = graph.remove_edge(edge) else {
            continue;
        };

        trace!(
            "Expanding {} across layers {from_layer}..{to_layer}",
            arc.origin
        );
        let mut previous = from;
        for layer in from_layer + 1..to_layer {
            let placeholder = graph.add_node(Node::placeholder(format!("placeholder-{count}")));
            count += 1;
            layers.push(layer, placeholder);
            graph.add_edge(previous, placeholder, arc.segment());
            previous = placeholder;
        }
        graph.add_edge(previous, to, arc.segment());
    }

    debug!("Inserted {count} placeholders");
    count
}

/// Order the nodes of each layer to reduce arc crossings
///
/// Alternates downward sweeps (each layer sorted by the mean position of its
/// predecessors) and upward sweeps (by successors), keeping the best ordering
/// seen. Stops after `max_sweeps` sweeps, once no crossing is left, or after
/// a few sweeps without improvement. Adjacent swaps then refine the result.
///
/// Returns the number of crossings of the final ordering.
pub(crate) fn order_vertices(
    adjacency: &Adjacency,
    layers: &mut LayeredGraph,
    max_sweeps: usize,
    max_transpose_iterations: usize,
) -> usize {
    let mut best = layers.layers.clone();
    let mut best_crossings = count_crossings(adjacency, &best);
    let mut stale = 0;

    for sweep in 0..max_sweeps {
        if best_crossings == 0 {
            break;
        }

        let direction = if sweep % 2 == 0 {
            Direction::Incoming
        } else {
            Direction::Outgoing
        };
        barycenter_sweep(adjacency, &mut layers.layers, direction);

        let crossings = count_crossings(adjacency, &layers.layers);
        trace!("Sweep {sweep} ({direction:?}): {crossings} crossings");
        if crossings < best_crossings {
            best.clone_from(&layers.layers);
            best_crossings = crossings;
            stale = 0;
        } else {
            stale += 1;
            if stale >= MAX_STALE_SWEEPS {
                break;
            }
        }
    }

    let (ordered, crossings) = minimize_crossings(adjacency, best, max_transpose_iterations);
    layers.layers = ordered;
    debug!("Vertex ordering done with {crossings} crossings");
    crossings
}

/// Sort every layer by the barycenter of its neighbours in the previous
/// layer of the sweep
///
/// `Direction::Incoming` sweeps from the first layer down using
/// predecessors, `Direction::Outgoing` from the last layer up using
/// successors.
fn barycenter_sweep(adjacency: &Adjacency, layers: &mut [Vec<NodeIndex>], direction: Direction) {
    let len = layers.len();
    match direction {
        Direction::Incoming => {
            for i in 1..len {
                let reference = positions(&layers[i - 1]);
                sort_by_barycenter(adjacency, &mut layers[i], &reference, direction);
            }
        }
        Direction::Outgoing => {
            for i in (0..len.saturating_sub(1)).rev() {
                let reference = positions(&layers[i + 1]);
                sort_by_barycenter(adjacency, &mut layers[i], &reference, direction);
            }
        }
    }
}

fn positions(layer: &[NodeIndex]) -> HashMap<NodeIndex, usize> {
    layer.iter().enumerate().map(|(i, &node)| (node, i)).collect()
}

/// Mean position of the neighbours of `node` found in the reference layer
fn barycenter(
    adjacency: &Adjacency,
    node: NodeIndex,
    reference: &HashMap<NodeIndex, usize>,
    direction: Direction,
) -> Option<f32> {
    let mut sum = 0.0;
    let mut count = 0;
    for neighbor in adjacency.neighbors(node, direction) {
        if let Some(&pos) = reference.get(neighbor) {
            sum += pos as f32;
            count += 1;
        }
    }

    if count > 0 {
        Some(sum / count as f32)
    } else {
        None
    }
}

/// Stable sort of a layer by barycenter; nodes without neighbours in the
/// reference layer keep their current position as key
fn sort_by_barycenter(
    adjacency: &Adjacency,
    layer: &mut Vec<NodeIndex>,
    reference: &HashMap<NodeIndex, usize>,
    direction: Direction,
) {
    let mut keyed: Vec<(f32, NodeIndex)> = layer
        .iter()
        .enumerate()
        .map(|(i, &node)| {
            let key = barycenter(adjacency, node, reference, direction).unwrap_or(i as f32);
            (key, node)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    *layer = keyed.into_iter().map(|(_, node)| node).collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::working_copy;
    use crate::{ExplicitLayering, LayerAssigner};
    use petgraph::visit::{EdgeRef, IntoEdgeReferences};
    use petri_net::{ArcId, PetriNet};
    use test_log::test;

    fn long_arc_net() -> PetriNet {
        let mut net = PetriNet::new();
        net.add_place("p1", None, 0).unwrap();
        net.add_transition("t1", None).unwrap();
        net.add_arc("p1", "t1", 7).unwrap();
        net
    }

    #[test]
    fn test_insert_placeholders_for_long_arc() {
        let mut graph = working_copy(&long_arc_net()).unwrap();
        let layering = ExplicitLayering::new().with("p1", 0).with("t1", 3);
        let mut layers = layering.assign_layers(&graph).unwrap();
        layers.validate(&graph).unwrap();

        assert_eq!(insert_placeholders(&mut graph, &mut layers), 2);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3);
        for layer in [1, 2] {
            let nodes = layers.layer(layer);
            assert_eq!(nodes.len(), 1);
            assert!(graph[nodes[0]].is_placeholder());
        }
        for edge in graph.edge_references() {
            let from = layers.layer_of(edge.source()).unwrap();
            let to = layers.layer_of(edge.target()).unwrap();
            assert_eq!(to, from + 1);
            assert_eq!(edge.weight().origin, ArcId(0));
            assert_eq!(edge.weight().weight, 7);
        }
    }

    #[test]
    fn test_parallel_long_arcs_get_their_own_chain() {
        let mut net = long_arc_net();
        net.add_arc("p1", "t1", 2).unwrap();
        let mut graph = working_copy(&net).unwrap();
        let layering = ExplicitLayering::new().with("p1", 0).with("t1", 2);
        let mut layers = layering.assign_layers(&graph).unwrap();

        assert_eq!(insert_placeholders(&mut graph, &mut layers), 2);
        assert_eq!(layers.layer(1).len(), 2);
        assert_eq!(graph.edge_count(), 4);

        let adjacency = Adjacency::from_graph(&graph);
        let p1 = layers.layer(0)[0];
        assert_eq!(adjacency.successors(p1).len(), 2);
        for &placeholder in layers.layer(1) {
            assert_eq!(adjacency.predecessors(placeholder), &[p1]);
            assert_eq!(adjacency.successors(placeholder).len(), 1);
        }
    }

    #[test]
    fn test_unit_arcs_are_untouched() {
        let mut graph = working_copy(&long_arc_net()).unwrap();
        let layering = ExplicitLayering::new().with("p1", 0).with("t1", 1);
        let mut layers = layering.assign_layers(&graph).unwrap();

        assert_eq!(insert_placeholders(&mut graph, &mut layers), 0);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_barycenter_untangles_crossing_pair() {
        // a -> d and b -> c cross when both layers keep insertion order
        let mut net = PetriNet::new();
        for id in ["a", "b", "c", "d"] {
            net.add_transition(id, None).unwrap();
        }
        net.add_arc("a", "d", 1).unwrap();
        net.add_arc("b", "c", 1).unwrap();
        let graph = working_copy(&net).unwrap();
        let layering = ExplicitLayering::new()
            .with("a", 0)
            .with("b", 0)
            .with("c", 1)
            .with("d", 1);
        let mut layers = layering.assign_layers(&graph).unwrap();
        let adjacency = Adjacency::from_graph(&graph);

        assert_eq!(count_crossings(&adjacency, layers.layers()), 1);
        assert_eq!(order_vertices(&adjacency, &mut layers, 24, 10), 0);

        let lower: Vec<&str> = layers
            .layer(1)
            .iter()
            .map(|&n| graph[n].id.0.as_str())
            .collect();
        assert_eq!(lower, vec!["d", "c"]);
    }

    #[test]
    fn test_ordering_keeps_layer_membership() {
        // Complete bipartite K(3,3) always has crossings; ordering must not
        // move nodes between layers or lose any.
        let mut net = PetriNet::new();
        for id in ["p0", "p1", "p2"] {
            net.add_place(id, None, 0).unwrap();
        }
        for id in ["t0", "t1", "t2"] {
            net.add_transition(id, None).unwrap();
        }
        for p in ["p0", "p1", "p2"] {
            for t in ["t0", "t1", "t2"] {
                net.add_arc(p, t, 1).unwrap();
            }
        }
        let graph = working_copy(&net).unwrap();
        let layering: ExplicitLayering = ["p0", "p1", "p2"]
            .into_iter()
            .map(|p| (p, 0))
            .chain(["t0", "t1", "t2"].into_iter().map(|t| (t, 1)))
            .collect();
        let mut layers = layering.assign_layers(&graph).unwrap();
        let adjacency = Adjacency::from_graph(&graph);
        let before = count_crossings(&adjacency, layers.layers());

        let crossings = order_vertices(&adjacency, &mut layers, 24, 10);

        assert!(crossings <= before);
        assert_eq!(crossings, count_crossings(&adjacency, layers.layers()));
        for layer in layers.layers() {
            assert_eq!(layer.len(), 3);
        }
        for node in graph.node_indices() {
            let layer = layers.layer_of(node).unwrap();
            assert!(layers.layer(layer).contains(&node));
        }
    }

    #[test]
    fn test_sort_by_barycenter_is_stable_for_unconnected_nodes() {
        let n = NodeIndex::new;
        let adjacency = Adjacency::from_pairs([(n(10), n(2))]);
        let reference = positions(&[n(10)]);
        let mut layer = vec![n(0), n(1), n(2)];

        sort_by_barycenter(&adjacency, &mut layer, &reference, Direction::Incoming);

        // n(2) has barycenter 0.0 and ties with n(0), which keeps its slot
        assert_eq!(layer, vec![n(0), n(2), n(1)]);
    }
}
