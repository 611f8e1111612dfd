use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Quat, Vec3};
use slotmap::{SecondaryMap, SlotMap, SparseSecondaryMap};
use smallvec::SmallVec;

use crate::mesh::{Mesh, MorphTargets};
use crate::node::{Node, NodeKind};
use crate::skeleton::Skeleton;
use crate::{NodeHandle, SkeletonKey};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Scene graph container.
///
/// Pure data: hierarchy in `nodes`, components in maps keyed by node handle.
/// The animation engine reads names and meshes, and writes local transforms
/// and morph influences; it never creates or destroys nodes.
///
/// Handles from two scenes can compare equal; `id` tells the scenes apart.
#[derive(Debug)]
pub struct Scene {
    pub id: u32,

    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // === Components ===
    pub names: SecondaryMap<NodeHandle, String>,
    pub meshes: SparseSecondaryMap<NodeHandle, Mesh>,
    pub skins: SlotMap<SkeletonKey, Skeleton>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            names: SecondaryMap::new(),
            meshes: SparseSecondaryMap::new(),
            skins: SlotMap::with_key(),
        }
    }

    /// Starts building a node.
    pub fn build_node(&'_ mut self, name: &str) -> NodeBuilder<'_> {
        NodeBuilder::new(self, name)
    }

    /// Adds a node as a new root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Adds an unnamed root group node.
    pub fn create_node(&mut self) -> NodeHandle {
        self.add_node(Node::new())
    }

    /// Adds a named root node of the given kind.
    pub fn create_node_with_name(&mut self, name: &str, kind: NodeKind) -> NodeHandle {
        let handle = self.add_node(Node::with_kind(kind));
        self.names.insert(handle, name.to_string());
        handle
    }

    pub fn add_to_parent(&mut self, child: Node, parent: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
            if let Some(c) = self.nodes.get_mut(handle) {
                c.parent = Some(parent);
            }
        } else {
            log::error!("Parent node not found; adding child as root");
            self.root_nodes.push(handle);
        }
        handle
    }

    /// Re-parents `child` under `parent`, appending it to the child list.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            log::error!("Node not found during attach!");
            return;
        }

        self.detach(child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
    }

    fn detach(&mut self, child: NodeHandle) {
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child) {
            self.root_nodes.remove(i);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
    }

    /// Removes a node, its subtree and all their components.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        self.detach(handle);

        let doomed = self.descendants(handle);
        for h in doomed {
            self.names.remove(h);
            self.meshes.remove(h);
            self.nodes.remove(h);
        }
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // === Names ===

    #[must_use]
    pub fn get_name(&self, handle: NodeHandle) -> Option<&str> {
        self.names.get(handle).map(String::as_str)
    }

    pub fn set_name(&mut self, handle: NodeHandle, name: &str) {
        if self.nodes.contains_key(handle) {
            self.names.insert(handle, name.to_string());
        }
    }

    /// First node (pre-order over all roots) with exactly this name.
    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeHandle> {
        self.root_nodes
            .iter()
            .flat_map(|&root| self.descendants(root))
            .find(|&h| self.get_name(h) == Some(name))
    }

    // === Meshes ===

    /// Adds a named root node carrying `mesh`.
    pub fn add_mesh(&mut self, name: &str, mesh: Mesh) -> NodeHandle {
        let handle = self.create_node_with_name(name, NodeKind::Mesh);
        self.meshes.insert(handle, mesh);
        handle
    }

    /// Attaches a mesh component to an existing node and tags it as a mesh.
    pub fn set_mesh(&mut self, handle: NodeHandle, mesh: Mesh) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.kind = NodeKind::Mesh;
            self.meshes.insert(handle, mesh);
        }
    }

    #[inline]
    #[must_use]
    pub fn get_mesh(&self, handle: NodeHandle) -> Option<&Mesh> {
        self.meshes.get(handle)
    }

    #[inline]
    pub fn get_mesh_mut(&mut self, handle: NodeHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle)
    }

    /// Morph target capability of a node: `Some` only for mesh nodes that
    /// carry a morph dictionary.
    #[must_use]
    pub fn morph_targets(&self, handle: NodeHandle) -> Option<&MorphTargets> {
        self.meshes.get(handle)?.morph_targets.as_ref()
    }

    pub fn morph_targets_mut(&mut self, handle: NodeHandle) -> Option<&mut MorphTargets> {
        self.meshes.get_mut(handle)?.morph_targets.as_mut()
    }

    // === Skeletons ===

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skins.insert(skeleton)
    }

    #[must_use]
    pub fn get_skeleton(&self, key: SkeletonKey) -> Option<&Skeleton> {
        self.skins.get(key)
    }

    /// Bone capability: tagged as a bone, or listed as a joint of any skeleton.
    #[must_use]
    pub fn is_bone(&self, handle: NodeHandle) -> bool {
        match self.nodes.get(handle) {
            Some(node) if node.kind == NodeKind::Bone => true,
            Some(_) => self.skins.values().any(|s| s.contains(handle)),
            None => false,
        }
    }

    // === Traversal ===

    /// Visits `root` and its subtree in pre-order, children in stored order.
    ///
    /// Iterative; each reachable node is visited exactly once on a tree.
    pub fn traverse<F>(&self, root: NodeHandle, mut visitor: F)
    where
        F: FnMut(NodeHandle, &Node),
    {
        let mut stack: SmallVec<[NodeHandle; 32]> = SmallVec::new();
        stack.push(root);

        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            visitor(handle, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Pre-order handles of `root` and its subtree.
    #[must_use]
    pub fn descendants(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        self.traverse(root, |h, _| out.push(h));
        out
    }

    /// Visits every root in insertion order, each in pre-order.
    pub fn traverse_all<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeHandle, &Node),
    {
        for &root in &self.root_nodes {
            self.traverse(root, &mut visitor);
        }
    }
}

/// Fluent node construction, finished with [`build`](Self::build).
pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    name: String,
    node: Node,
    mesh: Option<Mesh>,
    parent: Option<NodeHandle>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene, name: &str) -> Self {
        Self {
            scene,
            name: name.to_string(),
            node: Node::new(),
            mesh: None,
            parent: None,
        }
    }

    // === Configuration ===

    #[must_use]
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.node.kind = kind;
        self
    }

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.node.transform.position = Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.node.transform.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, s: f32) -> Self {
        self.node.transform.scale = Vec3::splat(s);
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attaches a mesh component; the node becomes a [`NodeKind::Mesh`].
    #[must_use]
    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.node.kind = NodeKind::Mesh;
        self.mesh = Some(mesh);
        self
    }

    /// Shorthand for `with_kind(NodeKind::Bone)`.
    #[must_use]
    pub fn as_bone(self) -> Self {
        self.with_kind(NodeKind::Bone)
    }

    // === Finish ===

    /// Inserts the node and returns its handle. Without a parent it becomes
    /// a root.
    pub fn build(self) -> NodeHandle {
        let handle = match self.parent {
            Some(parent) => self.scene.add_to_parent(self.node, parent),
            None => self.scene.add_node(self.node),
        };
        self.scene.names.insert(handle, self.name);
        if let Some(mesh) = self.mesh {
            self.scene.meshes.insert(handle, mesh);
        }
        handle
    }
}
