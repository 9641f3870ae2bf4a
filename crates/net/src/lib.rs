//! Place/transition net model
//!
//! The [`PetriNet`] is the persistent model edited by the user. The layout
//! engine only ever reads it and hands back positions and anchors that are
//! applied in one go.

mod arc;
mod error;
mod geometry;
mod net;
mod node;

pub use arc::{Arc, ArcId};
pub use error::NetError;
pub use geometry::Point;
pub use net::PetriNet;
pub use node::{Node, NodeId, NodeKind};
