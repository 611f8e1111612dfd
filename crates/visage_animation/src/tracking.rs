use glam::{Vec2, Vec3};

use crate::config::TrackingConfig;

/// Rotation offsets produced by head/eye tracking.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackingBias {
    /// Head `(pitch, yaw, roll)` in radians.
    pub head: Vec3,
    /// Eye `(pitch, yaw)` in radians.
    pub eyes: Vec2,
}

/// Linear "look toward the face" term plus the slow idle wobble, plus the
/// speech bob while speaking.
#[must_use]
pub fn tracking_bias(config: &TrackingConfig, face: Vec2, t: f32, speaking: bool) -> TrackingBias {
    let bob = if speaking {
        config.speech_bob.sample(t)
    } else {
        0.0
    };

    let yaw = config.yaw_gain * face.x + config.wobble_yaw.sample(t);
    let pitch = config.pitch_gain * face.y + config.wobble_pitch.sample(t) + bob;
    let roll = config.wobble_roll.sample(t);

    TrackingBias {
        head: Vec3::new(pitch, yaw, roll),
        eyes: Vec2::new(config.eye_pitch_gain * face.y, config.eye_yaw_gain * face.x),
    }
}
