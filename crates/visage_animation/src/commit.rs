//! Blend/commit stage.
//!
//! Writes the smoothed values of the current frame into the scene according
//! to the active [`Tier`]. Bone rotations are composed onto the base pose
//! captured at bind time, so nothing accumulates across frames.

use glam::{EulerRot, Quat, Vec3};
use smallvec::SmallVec;
use visage_rig::{Channel, ChannelMap, RigBinding};
use visage_scene::{NodeHandle, Scene, Transform};

use crate::config::AnimationConfig;
use crate::driver::SmoothedValues;
use crate::profile::ArmPose;
use crate::tier::Tier;

/// Local transforms of the animated nodes as they were at bind time.
#[derive(Debug, Clone, Default)]
pub struct BasePose {
    entries: SmallVec<[(NodeHandle, Transform); 9]>,
}

impl BasePose {
    /// Snapshots the current local transform of each existing node.
    pub fn capture(scene: &Scene, handles: impl IntoIterator<Item = NodeHandle>) -> Self {
        let mut entries = SmallVec::new();
        for handle in handles {
            if let Some(node) = scene.get_node(handle)
                && !entries.iter().any(|(h, _)| *h == handle)
            {
                entries.push((handle, node.transform));
            }
        }
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, handle: NodeHandle) -> Option<Transform> {
        self.entries
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, t)| *t)
    }

    /// Writes every captured transform back.
    pub fn restore(&self, scene: &mut Scene) {
        for (handle, transform) in &self.entries {
            if let Some(node) = scene.get_node_mut(*handle) {
                node.transform = *transform;
            }
        }
    }
}

/// Everything resolved for one bound asset. Replaced as a whole on rebind.
#[derive(Debug, Clone)]
pub struct BoundRig {
    /// [`Scene::id`] of the scene the handles belong to.
    pub scene_id: u32,
    pub binding: RigBinding,
    pub channels: ChannelMap,
    pub tier: Tier,
    pub base: BasePose,
    /// Root transform before the profile offset was applied.
    pub loaded_root: Option<Transform>,
}

impl BoundRig {
    /// Writes the base pose back, then the root's transform from before the
    /// profile offset.
    pub fn restore(&self, scene: &mut Scene) {
        self.base.restore(scene);
        if let (Some(root), Some(loaded)) = (self.binding.root, self.loaded_root)
            && let Some(node) = scene.get_node_mut(root)
        {
            node.transform = loaded;
        }
    }

    /// Whether blinking is expressed through morph targets.
    #[must_use]
    pub fn has_blink_morphs(&self) -> bool {
        self.tier == Tier::Morph
            && (self.channels.contains(Channel::BlinkLeft) || self.channels.contains(Channel::BlinkRight))
    }
}

/// Applies one frame of smoothed values to the scene.
pub fn commit(
    scene: &mut Scene,
    rig: &BoundRig,
    smoothed: &SmoothedValues,
    config: &AnimationConfig,
    arm_pose: Option<&ArmPose>,
) {
    match rig.tier {
        Tier::Morph => commit_morphs(scene, rig, smoothed),
        Tier::Bone => commit_jaw(scene, rig, smoothed, config),
        Tier::MeshTransform => {}
    }
    commit_eyes(scene, rig, smoothed);
    commit_head(scene, rig, smoothed);
    if let Some(pose) = arm_pose {
        commit_arms(scene, &rig.binding, pose);
    }
}

fn commit_morphs(scene: &mut Scene, rig: &BoundRig, smoothed: &SmoothedValues) {
    let Some(head) = rig.binding.head_mesh else {
        return;
    };
    let Some(morphs) = scene.morph_targets_mut(head) else {
        return;
    };
    rig.channels.assert_matches(head, morphs.len());

    for (channel, index) in rig.channels.iter() {
        morphs.set_influence(index, smoothed.channel(channel));
    }
}

fn commit_jaw(scene: &mut Scene, rig: &BoundRig, smoothed: &SmoothedValues, config: &AnimationConfig) {
    let Some(jaw) = rig.binding.jaw_bone else {
        return;
    };
    let Some(base) = rig.base.get(jaw) else {
        return;
    };
    let fallback = &config.fallback;
    let amplitude = config.speech.amplitude;
    let open = if amplitude > 0.0 {
        smoothed.jaw / amplitude
    } else {
        0.0
    };
    let width = 1.0 + fallback.jaw_wide_scale * smoothed.wide - fallback.jaw_pucker_scale * smoothed.pucker;

    write(scene, jaw, |t| {
        t.rotation = base.rotation * Quat::from_rotation_x(fallback.jaw_max_angle * open);
        t.scale = base.scale * Vec3::new(width, 1.0, 1.0);
    });
}

fn commit_eyes(scene: &mut Scene, rig: &BoundRig, smoothed: &SmoothedValues) {
    let look = Quat::from_euler(EulerRot::XYZ, smoothed.eyes.x, smoothed.eyes.y, 0.0);
    let lid = if rig.has_blink_morphs() {
        1.0
    } else {
        1.0 - smoothed.blink
    };

    for eye in [rig.binding.left_eye_bone, rig.binding.right_eye_bone]
        .into_iter()
        .flatten()
    {
        let Some(base) = rig.base.get(eye) else {
            continue;
        };
        write(scene, eye, |t| {
            t.rotation = base.rotation * look;
            t.scale = base.scale * Vec3::new(1.0, lid, 1.0);
        });
    }
}

fn commit_head(scene: &mut Scene, rig: &BoundRig, smoothed: &SmoothedValues) {
    let h = smoothed.head;
    let look = Quat::from_euler(EulerRot::XYZ, h.x, h.y, h.z);

    if let Some(bone) = rig.binding.head_bone
        && let Some(base) = rig.base.get(bone)
    {
        write(scene, bone, |t| t.rotation = base.rotation * look);
    }

    let Some(root) = rig.binding.root else {
        return;
    };
    let Some(base) = rig.base.get(root) else {
        return;
    };
    let mut target = base;
    if rig.binding.head_bone.is_none() {
        target.rotation = target.rotation * look;
    }
    if rig.tier == Tier::MeshTransform {
        let body = smoothed.body;
        target.scale.y *= body.scale_y;
        target.position.y += body.bob;
        target.rotation = target.rotation * Quat::from_rotation_z(body.roll);
    }
    write(scene, root, |t| *t = target);
}

fn commit_arms(scene: &mut Scene, binding: &RigBinding, pose: &ArmPose) {
    let arms = [
        (binding.left_upper_arm, ArmPose::left_rotation(pose.upper_arm)),
        (binding.right_upper_arm, ArmPose::right_rotation(pose.upper_arm)),
        (binding.left_fore_arm, ArmPose::left_rotation(pose.fore_arm)),
        (binding.right_fore_arm, ArmPose::right_rotation(pose.fore_arm)),
    ];
    for (handle, rotation) in arms {
        let Some(handle) = handle else {
            continue;
        };
        write(scene, handle, |t| t.rotation = rotation);
    }
}

fn write(scene: &mut Scene, handle: NodeHandle, f: impl FnOnce(&mut Transform)) {
    if let Some(node) = scene.get_node_mut(handle) {
        f(&mut node.transform);
    }
}
