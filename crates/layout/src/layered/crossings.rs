use super::ordering::Adjacency;
use petgraph::stable_graph::NodeIndex;
use std::collections::HashMap;

/// Minimize arc crossings by swapping adjacent nodes in layers
///
/// Greedy local search: a swap is kept only when it strictly reduces the
/// crossings around the layer, and the search stops after a pass without
/// any kept swap or after `max_iterations` passes.
pub(crate) fn minimize_crossings(
    adjacency: &Adjacency,
    mut layers: Vec<Vec<NodeIndex>>,
    max_iterations: usize,
) -> (Vec<Vec<NodeIndex>>, usize) {
    for _ in 0..max_iterations {
        let mut improved = false;

        for layer_index in 0..layers.len() {
            let layer_len = layers[layer_index].len();
            for i in 0..layer_len.saturating_sub(1) {
                let crossings_before = crossings_around(adjacency, &layers, layer_index);
                layers[layer_index].swap(i, i + 1);
                let crossings_after = crossings_around(adjacency, &layers, layer_index);

                if crossings_after < crossings_before {
                    improved = true;
                } else {
                    // Swap back if no improvement
                    layers[layer_index].swap(i, i + 1);
                }
            }
        }

        if !improved {
            break;
        }
    }

    let crossings = count_crossings(adjacency, &layers);
    (layers, crossings)
}

/// Count the number of arc crossings in the current ordering
pub(crate) fn count_crossings(adjacency: &Adjacency, layers: &[Vec<NodeIndex>]) -> usize {
    (0..layers.len().saturating_sub(1))
        .map(|i| count_between(adjacency, &layers[i], &layers[i + 1]))
        .sum()
}

/// Crossings on both sides of a layer, the only ones a swap inside it changes
fn crossings_around(adjacency: &Adjacency, layers: &[Vec<NodeIndex>], layer_index: usize) -> usize {
    let mut crossings = 0;
    if layer_index > 0 {
        crossings += count_between(adjacency, &layers[layer_index - 1], &layers[layer_index]);
    }
    if layer_index + 1 < layers.len() {
        crossings += count_between(adjacency, &layers[layer_index], &layers[layer_index + 1]);
    }
    crossings
}

/// Count crossings between arcs going from `upper` to `lower`
///
/// Two arcs cross when their endpoints appear in opposite orders in the two
/// layers. Arcs sharing an endpoint never cross.
fn count_between(adjacency: &Adjacency, upper: &[NodeIndex], lower: &[NodeIndex]) -> usize {
    let lower_positions: HashMap<NodeIndex, usize> =
        lower.iter().enumerate().map(|(i, &node)| (node, i)).collect();

    let mut segments = Vec::new();
    for (upper_pos, &node) in upper.iter().enumerate() {
        for target in adjacency.successors(node) {
            if let Some(&lower_pos) = lower_positions.get(target) {
                segments.push((upper_pos, lower_pos));
            }
        }
    }

    let mut crossings = 0;
    for (idx, &(u1, l1)) in segments.iter().enumerate() {
        for &(u2, l2) in &segments[idx + 1..] {
            if (u1 < u2 && l1 > l2) || (u1 > u2 && l1 < l2) {
                crossings += 1;
            }
        }
    }
    crossings
}
