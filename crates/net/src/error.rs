use crate::{ArcId, NodeId};
use thiserror::Error;

/// Errors raised when editing a [`crate::PetriNet`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetError {
    #[error("a node with id {0} already exists")]
    DuplicateNode(NodeId),

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("an arc with id {0} already exists")]
    DuplicateArc(ArcId),

    #[error("unknown {0}")]
    UnknownArc(ArcId),

    #[error("{arc} has no anchor at index {index}")]
    UnknownAnchor { arc: ArcId, index: usize },

    #[error("placeholder {0} cannot be stored in a net")]
    Placeholder(NodeId),
}
