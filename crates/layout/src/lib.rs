//! Layered layout for Petri nets
//!
//! This crate computes a Sugiyama-style drawing of a [`PetriNet`]: cycles
//! are broken by reversing back edges, nodes are assigned to layers, long
//! arcs are carried through the intermediate layers by placeholder nodes,
//! each layer is ordered to reduce crossings, and finally layers and nodes
//! are spread over the canvas. Placeholders become bend points of the arc
//! they were carrying.
//!
//! The net is never modified while the layout runs. The resulting
//! [`Layout`] is applied afterwards in one step.
//!
//! # Example
//!
//! ```
//! use petri_layout::{Canvas, LayeredLayout, LayoutEngine};
//! use petri_net::PetriNet;
//!
//! // Create a net
//! let mut net = PetriNet::new();
//! net.add_place("p1", None, 1).unwrap();
//! net.add_transition("t1", None).unwrap();
//! net.add_place("p2", None, 0).unwrap();
//! net.add_arc("p1", "t1", 1).unwrap();
//! net.add_arc("t1", "p2", 1).unwrap();
//!
//! // Create a layout engine for the drawing area
//! let engine = LayeredLayout::new(Canvas::new(1140.0, 400.0));
//!
//! // Use the LayoutEngine trait (simple, single-phase):
//! let layout = engine.layout(&net).unwrap();
//!
//! // Or directly by calling each step for better control
//! let layers = engine
//!     .compute_layers(&net, &petri_layout::LongestPathLayering)
//!     .unwrap();
//! let layout = engine.compute_positions(&layers).unwrap();
//!
//! layout.apply_to(&mut net).unwrap();
//! ```

mod engine;
mod graph;

pub mod layered;

// Re-export core types and traits
pub use engine::LayoutEngine;
pub use graph::{working_copy, LayoutArc, WorkGraph};

// Re-export the net model used at the boundaries
pub use petri_net::{ArcId, NodeId, PetriNet, Point};

// Re-export layered layout types
pub use layered::{
    Adjacency, Canvas, ExplicitLayering, LayerAssigner, LayeredGraph, LayeredLayout,
    LayeredLayoutError, Layers, Layout, LongestPathLayering, Orientation, SizeRange,
};
