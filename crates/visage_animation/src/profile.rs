//! Per-avatar configuration.
//!
//! One [`AvatarProfile`] replaces what used to be a hand-written animation
//! component per asset: transform offsets, an optional arm rest pose, extra
//! synonyms and animation constants. Every field has a default, so `{}` is a
//! valid profile.
//!
//! ```json
//! {
//!   "name": "robo-face",
//!   "root_offset": { "position": [0.0, -1.4, 0.0], "scale": [1.2, 1.2, 1.2] },
//!   "arm_pose": {},
//!   "synonyms": { "roles": { "head": ["Body_Main"] } },
//!   "animation": { "blink": { "seed": 42 } }
//! }
//! ```

use std::f32::consts::FRAC_PI_3;
use std::path::Path;

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use visage_core::{Result, VisageError};
use visage_rig::SynonymOverrides;
use visage_scene::Transform;

use crate::config::{AnimationConfig, finite};

/// Transform offset composed onto the avatar root when it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootOffset {
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for RootOffset {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl RootOffset {
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// `loaded` with this offset applied: positions add, rotations and
    /// scales multiply.
    #[must_use]
    pub fn apply(&self, loaded: Transform) -> Transform {
        let offset = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Transform {
            position: loaded.position + self.position,
            rotation: loaded.rotation * offset,
            scale: loaded.scale * self.scale,
        }
    }
}

/// Relaxed arm rest pose, as XYZ Euler angles for the left side. The right
/// side mirrors it as `(x, -y, -z)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmPose {
    pub upper_arm: Vec3,
    pub fore_arm: Vec3,
}

impl Default for ArmPose {
    fn default() -> Self {
        Self {
            upper_arm: Vec3::new(0.8, -0.2, FRAC_PI_3 - 1.0),
            fore_arm: Vec3::new(0.4, 0.0, -0.6),
        }
    }
}

impl ArmPose {
    #[must_use]
    pub fn left_rotation(euler: Vec3) -> Quat {
        Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
    }

    #[must_use]
    pub fn right_rotation(euler: Vec3) -> Quat {
        Quat::from_euler(EulerRot::XYZ, euler.x, -euler.y, -euler.z)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvatarProfile {
    pub name: String,
    pub root_offset: RootOffset,
    pub arm_pose: Option<ArmPose>,
    pub synonyms: SynonymOverrides,
    pub animation: AnimationConfig,
}

impl AvatarProfile {
    /// Parses and validates a JSON profile.
    pub fn from_json(text: &str) -> Result<Self> {
        let profile: Self = serde_json::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reads, parses and validates a JSON profile file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let profile = Self::from_json(&text)?;
        log::info!("Loaded avatar profile '{}' from {}", profile.name, path.display());
        Ok(profile)
    }

    /// Rejects values the engine cannot animate with.
    pub fn validate(&self) -> Result<()> {
        let offset = &self.root_offset;
        for (field, v) in [
            ("root_offset.position", offset.position),
            ("root_offset.rotation", offset.rotation),
            ("root_offset.scale", offset.scale),
        ] {
            for c in v.to_array() {
                finite(field, c)?;
            }
        }
        if offset.scale.to_array().contains(&0.0) {
            return Err(VisageError::invalid_profile(
                "root_offset.scale",
                "scale components must be non-zero",
            ));
        }
        if let Some(pose) = &self.arm_pose {
            for c in pose.upper_arm.to_array().into_iter().chain(pose.fore_arm.to_array()) {
                finite("arm_pose", c)?;
            }
        }
        self.animation.validate()
    }
}
