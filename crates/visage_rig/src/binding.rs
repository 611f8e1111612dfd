use visage_scene::{NodeHandle, Scene};

use crate::synonyms::Role;

/// Resolved mapping from animation roles to scene nodes.
///
/// Every field is independently optional; handles are weak in the sense that
/// they are only meaningful for the scene the binding was resolved against.
/// A binding is built once per asset and replaced wholesale on asset swap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RigBinding {
    /// Node the resolution started from (the avatar root).
    pub root: Option<NodeHandle>,

    pub head_mesh: Option<NodeHandle>,
    pub head_bone: Option<NodeHandle>,
    pub jaw_bone: Option<NodeHandle>,
    pub left_eye_bone: Option<NodeHandle>,
    pub right_eye_bone: Option<NodeHandle>,
    pub left_upper_arm: Option<NodeHandle>,
    pub right_upper_arm: Option<NodeHandle>,
    pub left_fore_arm: Option<NodeHandle>,
    pub right_fore_arm: Option<NodeHandle>,

    /// All hair meshes, in traversal order.
    pub hair_meshes: Vec<NodeHandle>,
}

impl RigBinding {
    /// Node bound to a singleton role. Always `None` for [`Role::Hair`].
    #[must_use]
    pub fn get(&self, role: Role) -> Option<NodeHandle> {
        match role {
            Role::Head => self.head_mesh,
            Role::HeadBone => self.head_bone,
            Role::Jaw => self.jaw_bone,
            Role::EyeLeft => self.left_eye_bone,
            Role::EyeRight => self.right_eye_bone,
            Role::UpperArmLeft => self.left_upper_arm,
            Role::UpperArmRight => self.right_upper_arm,
            Role::ForeArmLeft => self.left_fore_arm,
            Role::ForeArmRight => self.right_fore_arm,
            Role::Hair => None,
        }
    }

    pub(crate) fn slot_mut(&mut self, role: Role) -> Option<&mut Option<NodeHandle>> {
        match role {
            Role::Head => Some(&mut self.head_mesh),
            Role::HeadBone => Some(&mut self.head_bone),
            Role::Jaw => Some(&mut self.jaw_bone),
            Role::EyeLeft => Some(&mut self.left_eye_bone),
            Role::EyeRight => Some(&mut self.right_eye_bone),
            Role::UpperArmLeft => Some(&mut self.left_upper_arm),
            Role::UpperArmRight => Some(&mut self.right_upper_arm),
            Role::ForeArmLeft => Some(&mut self.left_fore_arm),
            Role::ForeArmRight => Some(&mut self.right_fore_arm),
            Role::Hair => None,
        }
    }

    /// Bound singleton roles in [`Role::ALL`] order.
    pub fn bound_roles(&self) -> impl Iterator<Item = (Role, NodeHandle)> + '_ {
        Role::ALL
            .iter()
            .filter_map(|&role| self.get(role).map(|h| (role, h)))
    }

    #[must_use]
    pub fn bound_count(&self) -> usize {
        self.bound_roles().count()
    }

    /// `true` when nothing at all was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound_count() == 0 && self.hair_meshes.is_empty()
    }

    /// `(role label, node name)` pairs, `-` standing in for unnamed nodes.
    #[must_use]
    pub fn describe(&self, scene: &Scene) -> Vec<(String, String)> {
        self.bound_roles()
            .map(|(role, h)| {
                (
                    role.label().to_string(),
                    scene.get_name(h).unwrap_or("-").to_string(),
                )
            })
            .collect()
    }
}
