//! Tunable animation constants.
//!
//! Every section deserialises with `#[serde(default)]`, so an avatar profile
//! only needs to name the values it changes.

use serde::{Deserialize, Serialize};
use visage_core::{Result, VisageError};

// ============================================================================
// Building blocks
// ============================================================================

/// `amplitude · sin(frequency · t + phase)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillator {
    pub amplitude: f32,
    pub frequency: f32,
    #[serde(default)]
    pub phase: f32,
}

impl Oscillator {
    #[must_use]
    pub const fn new(amplitude: f32, frequency: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn sample(&self, t: f32) -> f32 {
        self.amplitude * (self.frequency * t + self.phase).sin()
    }

    fn validate(&self, field: &str) -> Result<()> {
        finite(field, self.amplitude)?;
        finite(field, self.frequency)?;
        finite(field, self.phase)
    }
}

/// One sinusoid of the jaw waveform: frequency is `ratio · base_frequency`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveComponent {
    pub ratio: f32,
    #[serde(default)]
    pub phase: f32,
    pub weight: f32,
}

impl WaveComponent {
    #[must_use]
    pub const fn new(ratio: f32, phase: f32, weight: f32) -> Self {
        Self {
            ratio,
            phase,
            weight,
        }
    }
}

/// Lip shape waveform: `gain · |sin(ratio · base_frequency · t + phase)|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeWave {
    pub ratio: f32,
    pub phase: f32,
    pub gain: f32,
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Syllable rate in rad/s.
    pub base_frequency: f32,
    /// Peak jaw opening.
    pub amplitude: f32,
    /// Phrasing, syllable and micro-movement components.
    pub components: Vec<WaveComponent>,
    /// Frequency of the wide/pucker selector.
    pub shape_frequency: f32,
    /// Selector values above this pick the wide shape.
    pub shape_threshold: f32,
    pub wide: ShapeWave,
    pub pucker: ShapeWave,
    /// Bias applied to the shape that was not selected.
    pub off_shape_bias: f32,
    /// Resting smile level.
    pub smile_base: f32,
    /// Slow breathing term on top of `smile_base`.
    pub smile_breathe: Oscillator,
    /// Added to the smile while speaking.
    pub speaking_smile: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_frequency: 8.0,
            amplitude: 0.6,
            components: vec![
                WaveComponent::new(0.18, 0.0, 0.35),
                WaveComponent::new(1.0, 0.0, 1.0),
                WaveComponent::new(2.7, 1.3, 0.2),
                WaveComponent::new(4.3, 2.1, 0.1),
            ],
            shape_frequency: 4.0,
            shape_threshold: 0.0,
            wide: ShapeWave {
                ratio: 0.9,
                phase: 2.0,
                gain: 0.5,
            },
            pucker: ShapeWave {
                ratio: 0.7,
                phase: 1.0,
                gain: 0.4,
            },
            off_shape_bias: 0.3,
            smile_base: 0.05,
            smile_breathe: Oscillator::new(0.02, 0.5),
            speaking_smile: 0.15,
        }
    }
}

impl SpeechConfig {
    fn validate(&self) -> Result<()> {
        finite("animation.speech.base_frequency", self.base_frequency)?;
        non_negative("animation.speech.amplitude", self.amplitude)?;
        if self.components.is_empty() {
            return Err(VisageError::invalid_profile(
                "animation.speech.components",
                "at least one waveform component is required",
            ));
        }
        for c in &self.components {
            finite("animation.speech.components.ratio", c.ratio)?;
            finite("animation.speech.components.phase", c.phase)?;
            non_negative("animation.speech.components.weight", c.weight)?;
        }
        if self.components.iter().map(|c| c.weight).sum::<f32>() <= 0.0 {
            return Err(VisageError::invalid_profile(
                "animation.speech.components",
                "component weights must not all be zero",
            ));
        }
        finite("animation.speech.shape_frequency", self.shape_frequency)?;
        finite("animation.speech.shape_threshold", self.shape_threshold)?;
        for (field, w) in [("animation.speech.wide", &self.wide), ("animation.speech.pucker", &self.pucker)] {
            finite(field, w.ratio)?;
            finite(field, w.phase)?;
            non_negative(field, w.gain)?;
        }
        unit("animation.speech.off_shape_bias", self.off_shape_bias)?;
        finite("animation.speech.smile_base", self.smile_base)?;
        self.smile_breathe.validate("animation.speech.smile_breathe")?;
        finite("animation.speech.speaking_smile", self.speaking_smile)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Nominal per-tick timer increment (seconds).
    pub step: f32,
    /// Length of one blink envelope (seconds).
    pub duration: f32,
    /// Lower bound of the uniform interval draw (inclusive).
    pub interval_min: f32,
    /// Upper bound of the uniform interval draw (exclusive).
    pub interval_max: f32,
    /// Peak blink target.
    pub strength: f32,
    /// Fixed RNG seed for reproducible blink timing.
    pub seed: Option<u64>,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            step: 1.0 / 60.0,
            duration: 0.3,
            interval_min: 2.0,
            interval_max: 6.0,
            strength: 0.8,
            seed: None,
        }
    }
}

impl BlinkConfig {
    fn validate(&self) -> Result<()> {
        positive("animation.blink.step", self.step)?;
        positive("animation.blink.duration", self.duration)?;
        positive("animation.blink.interval_min", self.interval_min)?;
        finite("animation.blink.interval_max", self.interval_max)?;
        if self.interval_max <= self.interval_min {
            return Err(VisageError::invalid_profile(
                "animation.blink.interval_max",
                format!(
                    "must exceed interval_min ({} <= {})",
                    self.interval_max, self.interval_min
                ),
            ));
        }
        unit("animation.blink.strength", self.strength)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Head yaw per unit of horizontal face offset.
    pub yaw_gain: f32,
    /// Head pitch per unit of vertical face offset (negative: look up at a
    /// face above centre).
    pub pitch_gain: f32,
    pub eye_yaw_gain: f32,
    pub eye_pitch_gain: f32,
    pub wobble_yaw: Oscillator,
    pub wobble_pitch: Oscillator,
    pub wobble_roll: Oscillator,
    /// Pitch nod applied only while speaking.
    pub speech_bob: Oscillator,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            yaw_gain: 0.35,
            pitch_gain: -0.25,
            eye_yaw_gain: 0.5,
            eye_pitch_gain: -0.3,
            wobble_yaw: Oscillator::new(0.01, 0.5),
            wobble_pitch: Oscillator::new(0.015, 0.7),
            wobble_roll: Oscillator::new(0.01, 0.3),
            speech_bob: Oscillator::new(0.02, 6.0),
        }
    }
}

impl TrackingConfig {
    fn validate(&self) -> Result<()> {
        finite("animation.tracking.yaw_gain", self.yaw_gain)?;
        finite("animation.tracking.pitch_gain", self.pitch_gain)?;
        finite("animation.tracking.eye_yaw_gain", self.eye_yaw_gain)?;
        finite("animation.tracking.eye_pitch_gain", self.eye_pitch_gain)?;
        self.wobble_yaw.validate("animation.tracking.wobble_yaw")?;
        self.wobble_pitch.validate("animation.tracking.wobble_pitch")?;
        self.wobble_roll.validate("animation.tracking.wobble_roll")?;
        self.speech_bob.validate("animation.tracking.speech_bob")
    }
}

/// Exponential smoothing factors, each in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Lip/jaw channels while speaking.
    pub speech: f32,
    /// Lip/jaw channels relaxing while idle.
    pub relax: f32,
    pub blink: f32,
    /// Smile and mesh-transform return to rest.
    pub idle: f32,
    /// Head and eye tracking.
    pub tracking: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            speech: 0.25,
            relax: 0.15,
            blink: 0.15,
            idle: 0.12,
            tracking: 0.1,
        }
    }
}

impl SmoothingConfig {
    fn validate(&self) -> Result<()> {
        alpha("animation.smoothing.speech", self.speech)?;
        alpha("animation.smoothing.relax", self.relax)?;
        alpha("animation.smoothing.blink", self.blink)?;
        alpha("animation.smoothing.idle", self.idle)?;
        alpha("animation.smoothing.tracking", self.tracking)
    }
}

/// Constants for the bone and mesh-transform tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Jaw rotation about local X at full opening (radians).
    pub jaw_max_angle: f32,
    /// Jaw X-scale gain for the wide shape.
    pub jaw_wide_scale: f32,
    /// Jaw X-scale loss for the pucker shape.
    pub jaw_pucker_scale: f32,
    /// Peak extra Y-scale of the avatar root while speaking.
    pub mesh_scale_amplitude: f32,
    /// Vertical bob of the avatar root while speaking.
    pub mesh_bob_amplitude: f32,
    pub mesh_roll: Oscillator,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            jaw_max_angle: 0.15,
            jaw_wide_scale: 0.5,
            jaw_pucker_scale: 0.5,
            mesh_scale_amplitude: 0.02,
            mesh_bob_amplitude: 0.01,
            mesh_roll: Oscillator::new(0.02, 2.0),
        }
    }
}

impl FallbackConfig {
    fn validate(&self) -> Result<()> {
        finite("animation.fallback.jaw_max_angle", self.jaw_max_angle)?;
        finite("animation.fallback.jaw_wide_scale", self.jaw_wide_scale)?;
        finite("animation.fallback.jaw_pucker_scale", self.jaw_pucker_scale)?;
        finite("animation.fallback.mesh_scale_amplitude", self.mesh_scale_amplitude)?;
        finite("animation.fallback.mesh_bob_amplitude", self.mesh_bob_amplitude)?;
        self.mesh_roll.validate("animation.fallback.mesh_roll")
    }
}

/// All animation constants of one avatar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub speech: SpeechConfig,
    pub blink: BlinkConfig,
    pub tracking: TrackingConfig,
    pub smoothing: SmoothingConfig,
    pub fallback: FallbackConfig,
}

impl AnimationConfig {
    pub fn validate(&self) -> Result<()> {
        self.speech.validate()?;
        self.blink.validate()?;
        self.tracking.validate()?;
        self.smoothing.validate()?;
        self.fallback.validate()
    }
}

// ============================================================================
// Checks
// ============================================================================

pub(crate) fn finite(field: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(VisageError::invalid_profile(field, format!("{value} is not finite")))
    }
}

fn non_negative(field: &str, value: f32) -> Result<()> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(VisageError::invalid_profile(field, format!("{value} is negative")));
    }
    Ok(())
}

fn positive(field: &str, value: f32) -> Result<()> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(VisageError::invalid_profile(field, format!("{value} must be > 0")));
    }
    Ok(())
}

fn unit(field: &str, value: f32) -> Result<()> {
    finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(VisageError::invalid_profile(field, format!("{value} is outside [0, 1]")));
    }
    Ok(())
}

fn alpha(field: &str, value: f32) -> Result<()> {
    finite(field, value)?;
    if value <= 0.0 || value > 1.0 {
        return Err(VisageError::invalid_profile(field, format!("{value} is outside (0, 1]")));
    }
    Ok(())
}
