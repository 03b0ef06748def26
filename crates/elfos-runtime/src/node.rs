//! The node composition tree.
//!
//! A [`Node`] is a vertex in a strict tree built once at configuration time
//! and torn down only at process shutdown — no dynamic re-parenting.  Each
//! node owns one [`State`] scope, and the tree keeps a lock-step invariant:
//! a node's parent link and its state's parent-scope link always point to
//! the same ancestor.  Both links are created together in
//! [`NodeTree::add_child`], which is the only way to grow the tree.

use elfos_state::{SharedArena, State};

/// Index of a node inside a [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A vertex in the control hierarchy.
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    /// Ordered children, in configuration order.
    pub children: Vec<NodeId>,
    state: State,
    /// Ids of the components attached to this node.
    pub components: Vec<String>,
}

impl Node {
    /// This node's scope handle (its "world model").
    pub fn state(&self) -> &State {
        &self.state
    }
}

/// The strict tree of control nodes sharing one state arena.
pub struct NodeTree {
    arena: SharedArena,
    nodes: Vec<Node>,
}

impl NodeTree {
    /// Create a tree with its root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        let arena = SharedArena::new();
        let root_name = root_name.into();
        let state = arena.root(root_name.clone());
        Self {
            arena,
            nodes: vec![Node {
                name: root_name,
                parent: None,
                children: Vec::new(),
                state,
                components: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Add a child under `parent`, chaining the child's state scope to the
    /// parent's in the same step.
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let state = self.arena.child_of(self.nodes[parent.0].state(), name.clone());
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            parent: Some(parent),
            children: Vec::new(),
            state,
            components: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn state(&self, id: NodeId) -> &State {
        self.nodes[id.0].state()
    }

    /// Record that a component belongs to `id` (for diagnostics).
    pub fn attach_component(&mut self, id: NodeId, component_id: impl Into<String>) {
        self.nodes[id.0].components.push(component_id.into());
    }

    /// Find a node by name (names are unique per configuration).
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.name == name)
            .map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Verify the node/scope lock-step invariant over the whole tree.
    ///
    /// Holds by construction; exposed so tests and the factory can assert
    /// it after assembly.
    pub fn check_lockstep(&self) -> bool {
        self.nodes.iter().all(|node| {
            let state_parent = node.state.parent_id();
            match node.parent {
                None => state_parent.is_none(),
                Some(parent) => state_parent == Some(self.nodes[parent.0].state().id()),
            }
        })
    }
}
