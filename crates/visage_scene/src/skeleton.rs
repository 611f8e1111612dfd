use crate::NodeHandle;

/// Ordered joint list shared by the skinned meshes of one asset.
///
/// Joints are ordinary scene nodes; listing a node here is what makes it a
/// bone even when the loader tagged it as a plain group.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub name: String,
    /// Joints in skin order.
    pub bones: Vec<NodeHandle>,
    /// Index into `bones` of the root joint (usually 0).
    pub root_bone_index: usize,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str, bones: Vec<NodeHandle>) -> Self {
        Self {
            name: name.to_string(),
            bones,
            root_bone_index: 0,
        }
    }

    #[must_use]
    pub fn root_bone(&self) -> Option<NodeHandle> {
        self.bones.get(self.root_bone_index).copied()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.bones.contains(&handle)
    }
}
