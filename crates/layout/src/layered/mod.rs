mod crossings;
mod cycles;
mod layers;
mod ordering;
mod positions;

use crate::graph::working_copy;
use crate::{LayoutEngine, WorkGraph};
use petri_net::{ArcId, NetError, NodeId, PetriNet, Point};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

pub use layers::{ExplicitLayering, LayerAssigner, LayeredGraph, LongestPathLayering};
pub use ordering::Adjacency;

use cycles::break_cycles;
use ordering::{insert_placeholders, order_vertices};
use positions::{assign_coordinates, Grid};

/// Errors that can occur during layered layout computation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayeredLayoutError {
    /// The layer assigner was handed a graph that still contains a cycle
    #[error("graph contains a cycle at node {0}")]
    GraphHasCycle(NodeId),

    #[error("{arc} is a self-loop on {node}")]
    SelfLoop { arc: ArcId, node: NodeId },

    #[error("node {0} has no layer")]
    MissingLayer(NodeId),

    #[error("node {0} is assigned to more than one layer")]
    DuplicateLayer(NodeId),

    #[error("{arc} goes from {from} (layer {from_layer}) to {to} (layer {to_layer})")]
    ArcSpan {
        arc: ArcId,
        from: NodeId,
        from_layer: usize,
        to: NodeId,
        to_layer: usize,
    },

    /// Placeholder chains are built with one arc on each side; anything
    /// else is a defect of the expansion step
    #[error("placeholder {node} has {incoming} incoming and {outgoing} outgoing arcs")]
    PlaceholderDegree {
        node: NodeId,
        incoming: usize,
        outgoing: usize,
    },

    #[error(transparent)]
    Net(#[from] NetError),
}

/// Size of the drawing area, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1140.0,
            height: 400.0,
        }
    }
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Canvas of the render target, or the default size when there is no
    /// render target yet or it has no area
    pub fn from_render_target(size: Option<(f32, f32)>) -> Self {
        match size {
            Some((width, height)) if width > 0.0 && height > 0.0 => Self::new(width, height),
            _ => Self::default(),
        }
    }
}

/// Inclusive range a computed spacing is clamped to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRange {
    pub min: f32,
    pub max: f32,
}

impl SizeRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp a value to the range; `min` wins if the range is inverted
    pub fn clamp(&self, value: f32) -> f32 {
        value.min(self.max).max(self.min)
    }
}

/// Direction in which layers advance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    /// Layers are columns, arcs flow from left to right
    #[default]
    LeftToRight,
    /// Layers are rows, arcs flow from top to bottom
    TopToBottom,
}

impl Orientation {
    /// Canvas point for a distance along the layer axis and across it
    pub fn point(self, along: f32, across: f32) -> Point {
        let point = Point::new(along, across);
        match self {
            Orientation::LeftToRight => point,
            Orientation::TopToBottom => point.transposed(),
        }
    }
}

/// Configuration for the layered (Sugiyama-style) layout
#[derive(Debug, Clone)]
pub struct LayeredLayout {
    /// Drawing area the layout is fitted into
    pub canvas: Canvas,

    pub orientation: Orientation,

    /// Bounds for the distance between two layers
    pub column_size: SizeRange,

    /// Bounds for the distance between two nodes of a layer
    pub row_size: SizeRange,

    /// Maximum barycenter sweeps for crossing reduction
    pub max_ordering_sweeps: usize,

    /// Maximum passes of adjacent swaps after the barycenter sweeps
    pub max_transpose_iterations: usize,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            orientation: Orientation::default(),
            column_size: SizeRange::new(100.0, 300.0),
            row_size: SizeRange::new(50.0, 100.0),
            max_ordering_sweeps: 24,
            max_transpose_iterations: 10,
        }
    }
}

impl LayeredLayout {
    /// Create a new layered layout for the given canvas
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            ..Default::default()
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    fn grid(&self) -> Grid {
        Grid {
            canvas: self.canvas,
            orientation: self.orientation,
            column_size: self.column_size,
            row_size: self.row_size,
        }
    }
}

/// Layer structure that can be cached and reused
///
/// Holds the acyclic working graph with long arcs already expanded through
/// placeholder nodes, and the ordered layers.
#[derive(Debug, Clone)]
pub struct Layers {
    /// Working graph, placeholders included
    pub(crate) graph: WorkGraph,

    /// Nodes organized into ordered layers
    pub nodes: LayeredGraph,

    /// Predecessors and successors in the expanded graph
    pub adjacency: Adjacency,

    /// Arcs flipped to break cycles
    pub reversed: Vec<ArcId>,

    /// Number of placeholder nodes inserted
    pub placeholders: usize,

    /// Number of arc crossings (quality metric)
    pub crossings: usize,
}

impl Layers {
    pub fn graph(&self) -> &WorkGraph {
        &self.graph
    }
}

/// Result of a layout run, to be applied to the net it was computed from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// Position of every place and transition
    pub positions: HashMap<NodeId, Point>,

    /// Bend points of every arc, from its source to its destination
    pub anchors: HashMap<ArcId, Vec<Point>>,

    /// Arcs that were laid out against their direction to break cycles
    pub reversed: Vec<ArcId>,

    pub layer_count: usize,

    pub crossings: usize,
}

impl Layout {
    pub fn position(&self, node: &NodeId) -> Option<Point> {
        self.positions.get(node).copied()
    }

    pub fn anchors(&self, arc: ArcId) -> Option<&[Point]> {
        self.anchors.get(&arc).map(Vec::as_slice)
    }

    /// Write positions and anchors into the net
    ///
    /// Every node and arc is looked up before anything is written, so the
    /// net is left untouched when the layout does not match it.
    ///
    /// # Errors
    /// Returns an error if the net lacks a node or arc of the layout
    pub fn apply_to(&self, net: &mut PetriNet) -> Result<(), LayeredLayoutError> {
        if let Some(id) = self.positions.keys().find(|id| !net.contains_node(id)) {
            return Err(NetError::UnknownNode(id.clone()).into());
        }
        if let Some(&id) = self.anchors.keys().find(|&&id| net.arc(id).is_none()) {
            return Err(NetError::UnknownArc(id).into());
        }

        for (id, &position) in &self.positions {
            net.set_position(id, position)?;
        }
        for (&id, anchors) in &self.anchors {
            net.set_anchors(id, anchors.clone())?;
        }
        Ok(())
    }
}

impl LayeredLayout {
    /// Compute layer structure (expensive, cache this)
    ///
    /// Breaks cycles, asks the assigner for layers, expands long arcs and
    /// orders every layer. It only depends on the net structure, not on the
    /// canvas.
    ///
    /// # Errors
    /// Returns an error if the net contains a self-loop or the layering is
    /// invalid
    pub fn compute_layers<A>(
        &self,
        net: &PetriNet,
        assigner: &A,
    ) -> Result<Layers, LayeredLayoutError>
    where
        A: LayerAssigner + ?Sized,
    {
        let mut graph = working_copy(net)?;
        let reversed = break_cycles(&mut graph);

        let mut nodes = assigner.assign_layers(&graph)?;
        nodes.validate(&graph)?;

        let placeholders = insert_placeholders(&mut graph, &mut nodes);
        let adjacency = Adjacency::from_graph(&graph);
        let crossings = order_vertices(
            &adjacency,
            &mut nodes,
            self.max_ordering_sweeps,
            self.max_transpose_iterations,
        );

        debug!(
            "{} layers, {placeholders} placeholders, {crossings} crossings",
            nodes.len()
        );
        Ok(Layers {
            graph,
            nodes,
            adjacency,
            reversed,
            placeholders,
            crossings,
        })
    }

    /// Compute positions from cached layers (cheap, rerun when the canvas
    /// changes)
    ///
    /// # Errors
    /// Returns an error if a placeholder chain is malformed
    pub fn compute_positions(&self, layers: &Layers) -> Result<Layout, LayeredLayoutError> {
        let mut graph = layers.graph.clone();
        let placed = assign_coordinates(&mut graph, &layers.nodes, &self.grid())?;

        let positions = placed
            .into_iter()
            .filter_map(|(node, point)| graph.node_weight(node).map(|n| (n.id.clone(), point)))
            .collect();

        let anchors = graph
            .edge_indices()
            .filter_map(|edge| graph.edge_weight(edge))
            .map(|arc| {
                let mut anchors = arc.anchors.clone();
                if arc.reversed {
                    anchors.reverse();
                }
                (arc.origin, anchors)
            })
            .collect();

        Ok(Layout {
            positions,
            anchors,
            reversed: layers.reversed.clone(),
            layer_count: layers.nodes.len(),
            crossings: layers.crossings,
        })
    }

    /// Run the whole pipeline with a caller-supplied layering
    ///
    /// # Errors
    /// See [`LayeredLayout::compute_layers`] and
    /// [`LayeredLayout::compute_positions`]
    pub fn layout_with<A>(&self, net: &PetriNet, assigner: &A) -> Result<Layout, LayeredLayoutError>
    where
        A: LayerAssigner + ?Sized,
    {
        let layers = self.compute_layers(net, assigner)?;
        self.compute_positions(&layers)
    }
}

// Implement LayoutEngine for nets, with the default layering
impl<'a> LayoutEngine<&'a PetriNet> for LayeredLayout {
    type Error = LayeredLayoutError;

    fn layout(&self, net: &'a PetriNet) -> Result<Layout, Self::Error> {
        self.layout_with(net, &LongestPathLayering)
    }
}
