use crate::{LayeredLayoutError, WorkGraph};
use petgraph::algo::toposort;
use petgraph::stable_graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use petri_net::NodeId;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Nodes of the working graph partitioned into ordered layers
///
/// Every node belongs to exactly one layer, and every arc points from a
/// lower layer to a strictly higher one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayeredGraph {
    pub(crate) layers: Vec<Vec<NodeIndex>>,
    index: HashMap<NodeIndex, usize>,
}

impl LayeredGraph {
    /// Create an empty layering with the given number of layers
    pub fn with_layer_count(count: usize) -> Self {
        Self {
            layers: vec![Vec::new(); count],
            index: HashMap::new(),
        }
    }

    /// Append a node at the end of a layer, creating missing layers
    pub fn push(&mut self, layer: usize, node: NodeIndex) {
        if layer >= self.layers.len() {
            self.layers.resize(layer + 1, Vec::new());
        }
        self.layers[layer].push(node);
        self.index.insert(node, layer);
    }

    /// Number of layers, empty ones included
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Nodes of a layer in order, empty for an unknown layer
    pub fn layer(&self, layer: usize) -> &[NodeIndex] {
        self.layers.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn layers(&self) -> &[Vec<NodeIndex>] {
        &self.layers
    }

    /// Layer of a node, `None` for a node that is not part of the layering
    pub fn layer_of(&self, node: NodeIndex) -> Option<usize> {
        self.index.get(&node).copied()
    }

    /// Position of a node within its layer
    pub fn position_of(&self, node: NodeIndex) -> Option<usize> {
        let layer = self.layer_of(node)?;
        self.layers[layer].iter().position(|&n| n == node)
    }

    /// Largest number of nodes found in a single layer
    pub fn max_occupancy(&self) -> usize {
        self.layers.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check the layering against the working graph
    ///
    /// Nodes that are no longer part of the graph are dropped with a warning.
    ///
    /// # Errors
    /// Returns an error if a node is missing or listed twice, or if an arc
    /// does not point to a strictly higher layer
    pub(crate) fn validate(&mut self, graph: &WorkGraph) -> Result<(), LayeredLayoutError> {
        let mut seen: HashMap<NodeIndex, usize> = HashMap::new();
        for (layer_index, layer) in self.layers.iter_mut().enumerate() {
            layer.retain(|&node| {
                let known = graph.contains_node(node);
                if !known {
                    warn!("Dropping stale node {node:?} from layer {layer_index}");
                }
                known
            });
            for &node in layer.iter() {
                if seen.insert(node, layer_index).is_some() {
                    return Err(LayeredLayoutError::DuplicateLayer(graph[node].id.clone()));
                }
            }
        }

        if let Some(node) = graph.node_indices().find(|node| !seen.contains_key(node)) {
            return Err(LayeredLayoutError::MissingLayer(graph[node].id.clone()));
        }

        for edge in graph.edge_indices() {
            let Some((from, to)) = graph.edge_endpoints(edge) else {
                continue;
            };
            let (from_layer, to_layer) = (seen[&from], seen[&to]);
            if to_layer <= from_layer {
                return Err(LayeredLayoutError::ArcSpan {
                    arc: graph[edge].origin,
                    from: graph[from].id.clone(),
                    from_layer,
                    to: graph[to].id.clone(),
                    to_layer,
                });
            }
        }

        self.index = seen;
        Ok(())
    }
}

impl From<Vec<Vec<NodeIndex>>> for LayeredGraph {
    fn from(layers: Vec<Vec<NodeIndex>>) -> Self {
        let index = layers
            .iter()
            .enumerate()
            .flat_map(|(layer, nodes)| nodes.iter().map(move |&node| (node, layer)))
            .collect();
        Self { layers, index }
    }
}

/// Partitions the nodes of an acyclic working graph into layers
///
/// The layout engine checks the returned layering before using it, so an
/// implementation only has to make a best effort.
pub trait LayerAssigner {
    /// # Errors
    /// Returns an error if no layering can be produced for the graph
    fn assign_layers(&self, graph: &WorkGraph) -> Result<LayeredGraph, LayeredLayoutError>;
}

/// Assign layers to nodes based on topological order
///
/// Uses a two-pass approach to minimize arc lengths:
/// - First pass: assign each node to the layer after its predecessors
/// - Second pass: move nodes closer to their successors when possible
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestPathLayering;

impl LayerAssigner for LongestPathLayering {
    fn assign_layers(&self, graph: &WorkGraph) -> Result<LayeredGraph, LayeredLayoutError> {
        let topo_order = toposort(graph, None).map_err(|cycle| {
            LayeredLayoutError::GraphHasCycle(graph[cycle.node_id()].id.clone())
        })?;
        let mut layer_map: HashMap<NodeIndex, usize> = HashMap::new();

        // First pass: forward, assign each node to layer after its predecessors
        for &node in &topo_order {
            let max_pred_layer = graph
                .edges_directed(node, Direction::Incoming)
                .map(|edge| layer_map.get(&edge.source()).map_or(0, |layer| layer + 1))
                .max()
                .unwrap_or(0);
            layer_map.insert(node, max_pred_layer);
        }

        // Second pass: backward, move nodes closer to their successors
        for &node in topo_order.iter().rev() {
            let layer = layer_map.get(&node).copied().unwrap_or(0);
            let Some(min_succ_layer) = graph
                .edges_directed(node, Direction::Outgoing)
                .filter_map(|edge| layer_map.get(&edge.target()).copied())
                .min()
            else {
                continue;
            };

            if min_succ_layer > layer + 1 {
                layer_map.insert(node, min_succ_layer - 1);
            }
        }

        // Group nodes by layer, keeping insertion order within a layer
        let layer_count = layer_map.values().max().map_or(0, |max| max + 1);
        let mut layers = LayeredGraph::with_layer_count(layer_count);
        for node in graph.node_indices() {
            if let Some(&layer) = layer_map.get(&node) {
                layers.push(layer, node);
            }
        }

        trace!("Longest path layering: {:?}", layers.layers);
        Ok(layers)
    }
}

/// Layering supplied by the caller, by node identifier
///
/// Layers between the ones used are kept, empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitLayering(pub HashMap<NodeId, usize>);

impl ExplicitLayering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, node: impl Into<NodeId>, layer: usize) -> Self {
        self.0.insert(node.into(), layer);
        self
    }
}

impl<N: Into<NodeId>> FromIterator<(N, usize)> for ExplicitLayering {
    fn from_iter<I: IntoIterator<Item = (N, usize)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(node, layer)| (node.into(), layer))
                .collect(),
        )
    }
}

impl LayerAssigner for ExplicitLayering {
    fn assign_layers(&self, graph: &WorkGraph) -> Result<LayeredGraph, LayeredLayoutError> {
        let mut layers = LayeredGraph::default();
        for node in graph.node_indices() {
            let id = &graph[node].id;
            let layer = self
                .0
                .get(id)
                .ok_or_else(|| LayeredLayoutError::MissingLayer(id.clone()))?;
            layers.push(*layer, node);
        }
        Ok(layers)
    }
}
