use crate::Layout;

/// A layout engine that can compute positions for the nodes and arcs of a net
///
/// This trait is generic over the graph type `G`, allowing different layout
/// engines to work with different inputs:
/// - Layered layouts implement `LayoutEngine<&PetriNet>`
/// - Other layouts can specify their own graph requirements
pub trait LayoutEngine<G> {
    type Error;

    /// Compute node positions and arc anchors for the given graph
    ///
    /// # Errors
    /// Returns an error if the layout computation fails (e.g., the graph
    /// contains a self-loop, or a layering constraint is violated)
    fn layout(&self, graph: G) -> Result<Layout, Self::Error>;
}
