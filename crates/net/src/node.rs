use crate::{ArcId, Point};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Stable identifier of a place or transition, chosen by the editor
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
pub struct NodeId(pub String);

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Variant-specific payload of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Place {
        tokens: u32,
    },
    Transition {
        /// Arcs ending at this transition, in insertion order
        pre_arcs: Vec<ArcId>,
        /// Arcs leaving this transition, in insertion order
        post_arcs: Vec<ArcId>,
    },
    /// Layout-only node carrying a long arc through an intermediate layer.
    /// Never stored in a [`crate::PetriNet`].
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: Option<String>,
    pub position: Point,
    pub kind: NodeKind,
}

impl Node {
    pub fn place(id: impl Into<NodeId>, label: Option<String>, tokens: u32) -> Self {
        Self {
            id: id.into(),
            label,
            position: Point::zero(),
            kind: NodeKind::Place { tokens },
        }
    }

    pub fn transition(id: impl Into<NodeId>, label: Option<String>) -> Self {
        Self {
            id: id.into(),
            label,
            position: Point::zero(),
            kind: NodeKind::Transition {
                pre_arcs: Vec::new(),
                post_arcs: Vec::new(),
            },
        }
    }

    pub fn placeholder(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            label: None,
            position: Point::zero(),
            kind: NodeKind::Placeholder,
        }
    }

    pub fn is_place(&self) -> bool {
        matches!(self.kind, NodeKind::Place { .. })
    }

    pub fn is_transition(&self) -> bool {
        matches!(self.kind, NodeKind::Transition { .. })
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, NodeKind::Placeholder)
    }

    /// Token count of a place, `None` for other variants
    pub fn tokens(&self) -> Option<u32> {
        match self.kind {
            NodeKind::Place { tokens } => Some(tokens),
            _ => None,
        }
    }
}
