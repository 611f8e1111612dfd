//! Synthetic speech waveform.
//!
//! Pure functions of elapsed time: the same `t` always yields the same
//! shape. Nothing here is derived from audio.

use crate::config::{ShapeWave, SpeechConfig};

/// Which lip shape the selector currently favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LipShape {
    #[default]
    Wide,
    Pucker,
}

/// The few scalars every speech channel is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouthShape {
    /// Jaw opening in `[0, amplitude]`.
    pub jaw: f32,
    pub wide: f32,
    pub pucker: f32,
    pub selected: LipShape,
}

impl MouthShape {
    pub const CLOSED: Self = Self {
        jaw: 0.0,
        wide: 0.0,
        pucker: 0.0,
        selected: LipShape::Wide,
    };
}

/// Jaw waveform: normalised weighted sum of `|sin|` components, clamped to
/// `[0, 1]` and scaled by the amplitude.
#[must_use]
pub fn jaw_open(config: &SpeechConfig, t: f32) -> f32 {
    let base = config.base_frequency;
    let (sum, total) = config
        .components
        .iter()
        .fold((0.0_f32, 0.0_f32), |(sum, total), c| {
            (
                sum + c.weight * (base * c.ratio * t + c.phase).sin().abs(),
                total + c.weight,
            )
        });
    if total <= 0.0 {
        return 0.0;
    }
    config.amplitude * (sum / total).clamp(0.0, 1.0)
}

/// Full mouth shape at time `t` while speaking.
#[must_use]
pub fn mouth_shape(config: &SpeechConfig, t: f32) -> MouthShape {
    let base = config.base_frequency;
    let selector = (config.shape_frequency * t).sin();
    let selected = if selector > config.shape_threshold {
        LipShape::Wide
    } else {
        LipShape::Pucker
    };
    let (wide_bias, pucker_bias) = match selected {
        LipShape::Wide => (1.0, config.off_shape_bias),
        LipShape::Pucker => (config.off_shape_bias, 1.0),
    };

    let wave = |w: &ShapeWave| w.gain * (w.ratio * base * t + w.phase).sin().abs();

    MouthShape {
        jaw: jaw_open(config, t),
        wide: wave(&config.wide) * wide_bias,
        pucker: wave(&config.pucker) * pucker_bias,
        selected,
    }
}
