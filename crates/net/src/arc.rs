use crate::{NodeId, Point};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Identity of an arc. Two arcs between the same pair of nodes have
/// different ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display("arc#{_0}")]
pub struct ArcId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub id: ArcId,
    pub from: NodeId,
    pub to: NodeId,
    pub weight: i32,
    /// Bend points between `from` and `to`, in drawing order
    #[serde(default)]
    pub anchors: Vec<Point>,
}

impl Arc {
    pub fn new(id: ArcId, from: NodeId, to: NodeId, weight: i32) -> Self {
        Self {
            id,
            from,
            to,
            weight,
            anchors: Vec::new(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Full polyline from `from` through every anchor to `to`
    pub fn polyline(&self, from: Point, to: Point) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.anchors.len() + 2);
        points.push(from);
        points.extend_from_slice(&self.anchors);
        points.push(to);
        points
    }
}
