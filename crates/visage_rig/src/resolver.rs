use visage_scene::{NodeHandle, Scene};

use crate::binding::RigBinding;
use crate::synonyms::{Role, SynonymTable};

pub struct RigResolver;

/// Head mesh candidates, one per evidence tier.
#[derive(Default)]
struct HeadCandidates {
    /// Name or material matched the head rule.
    explicit: Option<NodeHandle>,
    /// Morph dictionary contains a mouth/jaw/viseme key.
    signal: Option<NodeHandle>,
    /// Most morph targets seen so far, with its count.
    largest: Option<(NodeHandle, usize)>,
}

impl HeadCandidates {
    fn pick(&self) -> Option<NodeHandle> {
        self.explicit
            .or(self.signal)
            .or(self.largest.map(|(h, _)| h))
    }
}

impl RigResolver {
    /// Walks the subtree under `root` once, in pre-order, and binds every
    /// role it can recognise.
    ///
    /// - Bones (tagged, or listed in a skeleton) claim the first role in
    ///   [`Role::BONE_ROLES`] whose rule matches their name; the first
    ///   matching bone wins each role.
    /// - Meshes whose name or material matches the hair rule are collected.
    /// - The head mesh is the first mesh with morph targets whose name or
    ///   material matches the head rule; failing that, the first mesh with a
    ///   mouth-like morph key; failing that, the mesh with the most morph
    ///   targets (earliest on ties).
    ///
    /// Reads the scene only. Resolving the same graph twice yields equal
    /// bindings.
    #[must_use]
    pub fn resolve(scene: &Scene, root: NodeHandle, table: &SynonymTable) -> RigBinding {
        let mut binding = RigBinding {
            root: scene.get_node(root).map(|_| root),
            ..Default::default()
        };
        let mut head = HeadCandidates::default();

        scene.traverse(root, |handle, _node| {
            let name = scene.get_name(handle).unwrap_or_default().to_lowercase();

            if let Some(mesh) = scene.get_mesh(handle) {
                let material = mesh
                    .material
                    .as_deref()
                    .unwrap_or_default()
                    .to_lowercase();
                let matches = |role: Role| {
                    let rule = table.role_rule(role);
                    rule.matches(&name) || rule.matches(&material)
                };

                if matches(Role::Hair) {
                    log::debug!("rig: '{name}' -> hair");
                    binding.hair_meshes.push(handle);
                    return;
                }

                let Some(morphs) = mesh.morph_targets.as_ref().filter(|m| !m.is_empty()) else {
                    return;
                };

                if head.explicit.is_none() && matches(Role::Head) {
                    log::debug!("rig: '{name}' -> head (name/material)");
                    head.explicit = Some(handle);
                }
                if head.signal.is_none()
                    && morphs
                        .iter()
                        .any(|(key, _)| table.is_head_signal(&key.to_lowercase()))
                {
                    head.signal = Some(handle);
                }
                if head.largest.is_none_or(|(_, count)| morphs.len() > count) {
                    head.largest = Some((handle, morphs.len()));
                }
                return;
            }

            if scene.is_bone(handle)
                && let Some((role, _)) = table.classify(&name, &Role::BONE_ROLES)
                && let Some(slot) = binding.slot_mut(role)
                && slot.is_none()
            {
                log::debug!("rig: '{name}' -> {role}");
                *slot = Some(handle);
            }
        });

        binding.head_mesh = head.pick();
        binding
    }
}
