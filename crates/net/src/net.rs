use crate::{Arc, ArcId, NetError, Node, NodeId, NodeKind, Point};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The persistent model edited by the user: places, transitions and the arcs
/// between them.
///
/// Nodes and arcs keep their insertion order, which the layout engine relies
/// on to produce deterministic results.
///
/// A deserialized net goes through the same checks as one built with
/// [`PetriNet::add_place`], [`PetriNet::add_transition`] and
/// [`PetriNet::add_arc`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNet")]
pub struct PetriNet {
    nodes: Vec<Node>,
    arcs: Vec<Arc>,
    /// Id of the next arc. Only ever grows, so removed ids are not reused.
    next_arc: u64,
}

/// Serialized form of a [`PetriNet`], validated on conversion
#[derive(Deserialize)]
struct RawNet {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    arcs: Vec<Arc>,
    #[serde(default)]
    next_arc: u64,
}

impl TryFrom<RawNet> for PetriNet {
    type Error = NetError;

    fn try_from(raw: RawNet) -> Result<Self, Self::Error> {
        let mut net = PetriNet::new();
        for mut node in raw.nodes {
            // Rebuilt from the arcs below
            if let NodeKind::Transition {
                pre_arcs,
                post_arcs,
            } = &mut node.kind
            {
                pre_arcs.clear();
                post_arcs.clear();
            }
            net.insert_node(node)?;
        }
        for arc in raw.arcs {
            net.insert_arc(arc)?;
        }
        net.next_arc = net.next_arc.max(raw.next_arc);

        debug!(
            "Loaded net with {} nodes and {} arcs",
            net.nodes.len(),
            net.arcs.len()
        );
        Ok(net)
    }
}

impl PetriNet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_place(
        &mut self,
        id: impl Into<NodeId>,
        label: Option<String>,
        tokens: u32,
    ) -> Result<&mut Node, NetError> {
        self.insert_node(Node::place(id, label, tokens))
    }

    pub fn add_transition(
        &mut self,
        id: impl Into<NodeId>,
        label: Option<String>,
    ) -> Result<&mut Node, NetError> {
        self.insert_node(Node::transition(id, label))
    }

    fn insert_node(&mut self, node: Node) -> Result<&mut Node, NetError> {
        if node.is_placeholder() {
            return Err(NetError::Placeholder(node.id));
        }
        if self.contains_node(&node.id) {
            return Err(NetError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        let index = self.nodes.len() - 1;
        Ok(&mut self.nodes[index])
    }

    /// Connect two existing nodes, returning the identity of the new arc
    pub fn add_arc(
        &mut self,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        weight: i32,
    ) -> Result<ArcId, NetError> {
        let id = ArcId(self.next_arc);
        self.insert_arc(Arc::new(id, from.into(), to.into(), weight))?;
        Ok(id)
    }

    fn insert_arc(&mut self, arc: Arc) -> Result<(), NetError> {
        if self.arc(arc.id).is_some() {
            return Err(NetError::DuplicateArc(arc.id));
        }
        for id in [&arc.from, &arc.to] {
            if !self.contains_node(id) {
                return Err(NetError::UnknownNode(id.clone()));
            }
        }

        if let Some(NodeKind::Transition { post_arcs, .. }) = self.kind_mut(&arc.from) {
            post_arcs.push(arc.id);
        }
        if let Some(NodeKind::Transition { pre_arcs, .. }) = self.kind_mut(&arc.to) {
            pre_arcs.push(arc.id);
        }
        self.next_arc = self.next_arc.max(arc.id.0 + 1);
        self.arcs.push(arc);
        Ok(())
    }

    pub fn remove_arc(&mut self, id: ArcId) -> Result<Arc, NetError> {
        let index = self
            .arcs
            .iter()
            .position(|arc| arc.id == id)
            .ok_or(NetError::UnknownArc(id))?;
        let arc = self.arcs.remove(index);

        for node in &mut self.nodes {
            if let NodeKind::Transition {
                pre_arcs,
                post_arcs,
            } = &mut node.kind
            {
                pre_arcs.retain(|&a| a != id);
                post_arcs.retain(|&a| a != id);
            }
        }
        Ok(arc)
    }

    /// Remove a node together with every arc touching it
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, NetError> {
        let index = self
            .nodes
            .iter()
            .position(|node| &node.id == id)
            .ok_or_else(|| NetError::UnknownNode(id.clone()))?;

        let attached: Vec<ArcId> = self
            .arcs
            .iter()
            .filter(|arc| &arc.from == id || &arc.to == id)
            .map(|arc| arc.id)
            .collect();
        debug!("Removing {id} and {} attached arcs", attached.len());
        for arc in attached {
            self.remove_arc(arc)?;
        }

        Ok(self.nodes.remove(index))
    }

    pub fn remove_anchor(&mut self, arc: ArcId, index: usize) -> Result<Point, NetError> {
        let target = self.arc_mut(arc).ok_or(NetError::UnknownArc(arc))?;
        if index >= target.anchors.len() {
            return Err(NetError::UnknownAnchor { arc, index });
        }
        Ok(target.anchors.remove(index))
    }

    pub fn set_position(&mut self, id: &NodeId, position: Point) -> Result<(), NetError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|node| &node.id == id)
            .ok_or_else(|| NetError::UnknownNode(id.clone()))?;
        node.position = position;
        Ok(())
    }

    pub fn set_anchors(&mut self, id: ArcId, anchors: Vec<Point>) -> Result<(), NetError> {
        let arc = self.arc_mut(id).ok_or(NetError::UnknownArc(id))?;
        arc.anchors = anchors;
        Ok(())
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn arc(&self, id: ArcId) -> Option<&Arc> {
        self.arcs.iter().find(|arc| arc.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn places(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_place())
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_transition())
    }

    /// Arcs ending at the given node, in insertion order
    pub fn pre_arcs<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Arc> + 'a {
        self.arcs.iter().filter(move |arc| &arc.to == id)
    }

    /// Arcs leaving the given node, in insertion order
    pub fn post_arcs<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Arc> + 'a {
        self.arcs.iter().filter(move |arc| &arc.from == id)
    }

    fn arc_mut(&mut self, id: ArcId) -> Option<&mut Arc> {
        self.arcs.iter_mut().find(|arc| arc.id == id)
    }

    fn kind_mut(&mut self, id: &NodeId) -> Option<&mut NodeKind> {
        self.nodes
            .iter_mut()
            .find(|node| &node.id == id)
            .map(|node| &mut node.kind)
    }
}
