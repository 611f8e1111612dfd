use crate::NodeHandle;
use crate::transform::Transform;

/// What a node represents in the loaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// Plain grouping / transform node.
    #[default]
    Group,
    /// Node carrying a [`Mesh`](crate::Mesh) component.
    Mesh,
    /// Skeleton joint.
    Bone,
}

/// A scene node containing hierarchy and transform data only.
///
/// Names, meshes and skins live in the [`Scene`](crate::Scene)'s component
/// maps, keyed by the node's handle.
#[derive(Debug, Clone)]
pub struct Node {
    // === Core Hierarchy ===
    /// Parent node handle (None for root nodes)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles, in asset order
    pub(crate) children: Vec<NodeHandle>,

    /// Local transform
    pub transform: Transform,
    pub kind: NodeKind,
}

impl Node {
    /// Creates a group node with identity transform.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kind(NodeKind::Group)
    }

    #[must_use]
    pub fn with_kind(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Child handles in asset order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
