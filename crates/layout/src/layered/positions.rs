use super::{Canvas, LayeredGraph, LayeredLayoutError, Orientation, SizeRange};
use crate::{LayoutArc, WorkGraph};
use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use petri_net::Point;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Spacing rules for coordinate assignment
#[derive(Debug, Clone, Copy)]
pub(crate) struct Grid {
    pub canvas: Canvas,
    pub orientation: Orientation,
    pub column_size: SizeRange,
    pub row_size: SizeRange,
}

/// Assign canvas coordinates to every node and collapse placeholder chains
///
/// Layers become evenly spaced columns (rows when laid out top to bottom),
/// and the nodes of a layer are centered across the canvas. Each placeholder
/// is replaced by a bend point on the arc it was carrying.
///
/// Returns the position of every real node.
///
/// # Errors
/// Returns an error if a placeholder does not have exactly one incoming and
/// one outgoing arc
pub(crate) fn assign_coordinates(
    graph: &mut WorkGraph,
    layers: &LayeredGraph,
    grid: &Grid,
) -> Result<HashMap<NodeIndex, Point>, LayeredLayoutError> {
    let (along_extent, across_extent) = match grid.orientation {
        Orientation::LeftToRight => (grid.canvas.width, grid.canvas.height),
        Orientation::TopToBottom => (grid.canvas.height, grid.canvas.width),
    };
    let column_size = grid
        .column_size
        .clamp(along_extent / layers.len().max(1) as f32);
    let row_size = grid
        .row_size
        .clamp(across_extent / layers.max_occupancy().max(1) as f32);
    debug!("Column size {column_size}, row size {row_size}");

    // Anchors are recomputed from scratch on every run
    let edges: Vec<EdgeIndex> = graph.edge_indices().collect();
    for edge in edges {
        if let Some(arc) = graph.edge_weight_mut(edge) {
            arc.anchors.clear();
        }
    }

    let mut positions = HashMap::new();
    for (layer_index, layer) in layers.layers().iter().enumerate() {
        // The layers are zero-indexed, columns are not
        let column = (layer_index + 1) as f32;
        let along = column_size * column - column_size / 2.0;
        let mut across =
            across_extent / 2.0 - row_size * layer.len().saturating_sub(1) as f32 / 2.0;

        for &node in layer {
            let point = grid.orientation.point(along, across);
            across += row_size;

            let Some(is_placeholder) = graph.node_weight(node).map(|n| n.is_placeholder()) else {
                continue;
            };
            if is_placeholder {
                replace_placeholder(graph, node, point)?;
            } else if let Some(weight) = graph.node_weight_mut(node) {
                weight.position = point;
                positions.insert(node, point);
            }
        }
    }

    Ok(positions)
}

/// Merge the two arcs around a placeholder into one arc bending at `point`
fn replace_placeholder(
    graph: &mut WorkGraph,
    node: NodeIndex,
    point: Point,
) -> Result<(), LayeredLayoutError> {
    let incoming: Vec<(EdgeIndex, NodeIndex)> = graph
        .edges_directed(node, Direction::Incoming)
        .map(|edge| (edge.id(), edge.source()))
        .collect();
    let outgoing: Vec<(EdgeIndex, NodeIndex)> = graph
        .edges_directed(node, Direction::Outgoing)
        .map(|edge| (edge.id(), edge.target()))
        .collect();

    let degree_error = || LayeredLayoutError::PlaceholderDegree {
        node: graph[node].id.clone(),
        incoming: incoming.len(),
        outgoing: outgoing.len(),
    };
    let (&[(input, source)], &[(output, target)]) = (incoming.as_slice(), outgoing.as_slice())
    else {
        return Err(degree_error());
    };
    let error = degree_error();

    let input_arc = graph.remove_edge(input).ok_or_else(|| error.clone())?;
    let output_arc = graph.remove_edge(output).ok_or(error)?;

    let mut anchors = input_arc.anchors;
    anchors.push(point);
    anchors.extend(output_arc.anchors);

    graph.remove_node(node);
    trace!(
        "Collapsed placeholder of {} into {} anchors",
        input_arc.origin,
        anchors.len()
    );
    graph.add_edge(
        source,
        target,
        LayoutArc {
            anchors,
            ..input_arc
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::working_copy;
    use crate::layered::ordering::insert_placeholders;
    use crate::{ExplicitLayering, LayerAssigner};
    use petgraph::visit::IntoEdgeReferences;
    use petri_net::{ArcId, Node, PetriNet};
    use test_log::test;

    fn grid(width: f32, height: f32) -> Grid {
        Grid {
            canvas: Canvas::new(width, height),
            orientation: Orientation::LeftToRight,
            column_size: SizeRange::new(100.0, 300.0),
            row_size: SizeRange::new(50.0, 100.0),
        }
    }

    fn expanded(net: &PetriNet, layering: &ExplicitLayering) -> (WorkGraph, LayeredGraph) {
        let mut graph = working_copy(net).unwrap();
        let mut layers = layering.assign_layers(&graph).unwrap();
        layers.validate(&graph).unwrap();
        insert_placeholders(&mut graph, &mut layers);
        (graph, layers)
    }

    fn position_of(graph: &WorkGraph, positions: &HashMap<NodeIndex, Point>, id: &str) -> Point {
        let node = graph
            .node_indices()
            .find(|&n| graph[n].id.0 == id)
            .unwrap();
        positions[&node]
    }

    #[test]
    fn test_long_arc_collapses_into_bend_points() {
        let mut net = PetriNet::new();
        net.add_place("p1", None, 0).unwrap();
        net.add_transition("t1", None).unwrap();
        net.add_arc("p1", "t1", 4).unwrap();
        let layering = ExplicitLayering::new().with("p1", 0).with("t1", 3);
        let (mut graph, layers) = expanded(&net, &layering);

        let positions = assign_coordinates(&mut graph, &layers, &grid(1140.0, 400.0)).unwrap();

        assert_eq!(position_of(&graph, &positions, "p1"), Point::new(142.5, 200.0));
        assert_eq!(position_of(&graph, &positions, "t1"), Point::new(997.5, 200.0));
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let arc = graph.edge_references().next().unwrap();
        assert_eq!(arc.weight().origin, ArcId(0));
        assert_eq!(arc.weight().weight, 4);
        assert_eq!(
            arc.weight().anchors,
            vec![Point::new(427.5, 200.0), Point::new(712.5, 200.0)]
        );
        assert_eq!(graph[arc.source()].id.0, "p1");
        assert_eq!(graph[arc.target()].id.0, "t1");
    }

    #[test]
    fn test_layer_is_centered_vertically() {
        let mut net = PetriNet::new();
        for id in ["a", "b", "c"] {
            net.add_place(id, None, 0).unwrap();
        }
        let layering: ExplicitLayering = [("a", 0), ("b", 0), ("c", 0)].into_iter().collect();
        let (mut graph, layers) = expanded(&net, &layering);

        let positions = assign_coordinates(&mut graph, &layers, &grid(1140.0, 400.0)).unwrap();

        // A single layer gets the widest column, three nodes share 400px
        assert_eq!(position_of(&graph, &positions, "a"), Point::new(150.0, 100.0));
        assert_eq!(position_of(&graph, &positions, "b"), Point::new(150.0, 200.0));
        assert_eq!(position_of(&graph, &positions, "c"), Point::new(150.0, 300.0));
    }

    #[test]
    fn test_sizes_are_clamped_on_small_canvas() {
        let mut net = PetriNet::new();
        for id in ["a", "b"] {
            net.add_place(id, None, 0).unwrap();
        }
        let layering: ExplicitLayering = [("a", 0), ("b", 1)].into_iter().collect();
        let (mut graph, layers) = expanded(&net, &layering);

        let positions = assign_coordinates(&mut graph, &layers, &grid(100.0, 40.0)).unwrap();

        assert_eq!(position_of(&graph, &positions, "a"), Point::new(50.0, 20.0));
        assert_eq!(position_of(&graph, &positions, "b"), Point::new(150.0, 20.0));
    }

    #[test]
    fn test_top_to_bottom_swaps_axes() {
        let mut net = PetriNet::new();
        net.add_place("p", None, 0).unwrap();
        net.add_transition("t", None).unwrap();
        net.add_arc("p", "t", 1).unwrap();
        let layering = ExplicitLayering::new().with("p", 0).with("t", 1);
        let (mut graph, layers) = expanded(&net, &layering);
        let grid = Grid {
            orientation: Orientation::TopToBottom,
            ..grid(1140.0, 400.0)
        };

        let positions = assign_coordinates(&mut graph, &layers, &grid).unwrap();

        // 400 / 2 layers = 200 per row, centered across 1140px
        assert_eq!(position_of(&graph, &positions, "p"), Point::new(570.0, 100.0));
        assert_eq!(position_of(&graph, &positions, "t"), Point::new(570.0, 300.0));
    }

    #[test]
    fn test_stale_anchors_are_cleared() {
        let mut net = PetriNet::new();
        net.add_place("p", None, 0).unwrap();
        net.add_transition("t", None).unwrap();
        let arc = net.add_arc("p", "t", 1).unwrap();
        net.set_anchors(arc, vec![Point::new(1.0, 1.0)]).unwrap();
        let layering = ExplicitLayering::new().with("p", 0).with("t", 1);
        let (mut graph, layers) = expanded(&net, &layering);

        assign_coordinates(&mut graph, &layers, &grid(1140.0, 400.0)).unwrap();

        assert!(graph.edge_references().all(|e| e.weight().anchors.is_empty()));
    }

    #[test]
    fn test_placeholder_with_two_successors_is_rejected() {
        let mut graph = WorkGraph::default();
        let a = graph.add_node(Node::place("a", None, 0));
        let dummy = graph.add_node(Node::placeholder("placeholder-0"));
        let b = graph.add_node(Node::transition("b", None));
        let c = graph.add_node(Node::transition("c", None));
        let arc = |id| LayoutArc {
            origin: ArcId(id),
            weight: 1,
            anchors: Vec::new(),
            reversed: false,
        };
        graph.add_edge(a, dummy, arc(0));
        graph.add_edge(dummy, b, arc(0));
        graph.add_edge(dummy, c, arc(1));
        let layers = LayeredGraph::from(vec![vec![a], vec![dummy], vec![b, c]]);

        assert_eq!(
            assign_coordinates(&mut graph, &layers, &grid(1140.0, 400.0)).unwrap_err(),
            LayeredLayoutError::PlaceholderDegree {
                node: "placeholder-0".into(),
                incoming: 1,
                outgoing: 2,
            }
        );
    }
}
