use std::fmt;

use visage_rig::{ChannelMap, RigBinding};

/// Mechanism used to express mouth movement for the bound asset.
///
/// Chosen once per bind; exactly one tier is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Drive the head mesh's morph influences.
    Morph,
    /// Rotate and scale the jaw bone.
    Bone,
    /// Oscillate the whole avatar root.
    MeshTransform,
}

impl Tier {
    /// Morph if a head mesh is bound with at least one mapped channel, else
    /// bone if a jaw bone is bound, else mesh-transform.
    #[must_use]
    pub fn select(binding: &RigBinding, channels: &ChannelMap) -> Self {
        if binding.head_mesh.is_some() && !channels.is_empty() {
            Tier::Morph
        } else if binding.jaw_bone.is_some() {
            Tier::Bone
        } else {
            Tier::MeshTransform
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Morph => "morph",
            Tier::Bone => "bone",
            Tier::MeshTransform => "mesh-transform",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
