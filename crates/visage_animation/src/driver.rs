//! Per-frame target generation.
//!
//! [`AnimationDriver::drive`] reads the settled [`AnimationState`], advances
//! the blink clock, and produces a [`FrameTargets`] record. It never touches
//! the scene; smoothing and writes happen in the commit stage.

use glam::{Vec2, Vec3};
use visage_rig::Channel;

use crate::blink::{BlinkClock, BlinkCycle};
use crate::config::{AnimationConfig, SmoothingConfig};
use crate::tracking::{TrackingBias, tracking_bias};
use crate::values::{Blend, approach};
use crate::waveform::{MouthShape, mouth_shape};

/// Driver state machine. Transitions are immediate; outputs are smoothed
/// downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Speaking,
}

/// Coarse whole-avatar motion used by the mesh-transform tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMotion {
    /// Multiplier on the root's Y scale.
    pub scale_y: f32,
    /// Offset added to the root's Y position.
    pub bob: f32,
    /// Extra roll about Z (radians).
    pub roll: f32,
}

impl BodyMotion {
    pub const REST: Self = Self {
        scale_y: 1.0,
        bob: 0.0,
        roll: 0.0,
    };

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.scale_y.is_finite() && self.bob.is_finite() && self.roll.is_finite()
    }
}

impl Default for BodyMotion {
    fn default() -> Self {
        Self::REST
    }
}

impl Blend for BodyMotion {
    fn blend(start: Self, end: Self, t: f32) -> Self {
        Self {
            scale_y: f32::blend(start.scale_y, end.scale_y, t),
            bob: f32::blend(start.bob, end.bob, t),
            roll: f32::blend(start.roll, end.roll, t),
        }
    }
}

/// Everything the driver wants the avatar to look like this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTargets {
    pub state: DriverState,
    /// Target per semantic channel, indexed by [`Channel::index`].
    pub channels: [f32; Channel::COUNT],
    pub shape: MouthShape,
    /// Blink target (intensity × strength), shared by both eyes.
    pub blink: f32,
    pub tracking: TrackingBias,
    pub body: BodyMotion,
}

impl Default for FrameTargets {
    fn default() -> Self {
        Self {
            state: DriverState::Idle,
            channels: [0.0; Channel::COUNT],
            shape: MouthShape::CLOSED,
            blink: 0.0,
            tracking: TrackingBias::default(),
            body: BodyMotion::REST,
        }
    }
}

impl FrameTargets {
    #[inline]
    #[must_use]
    pub fn channel(&self, channel: Channel) -> f32 {
        self.channels[channel.index()]
    }

    /// `true` if no target is NaN or infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.channels.iter().all(|v| v.is_finite())
            && self.shape.jaw.is_finite()
            && self.shape.wide.is_finite()
            && self.shape.pucker.is_finite()
            && self.blink.is_finite()
            && self.tracking.head.is_finite()
            && self.tracking.eyes.is_finite()
            && self.body.is_finite()
    }
}

/// Last committed value of everything that is smoothed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedValues {
    pub channels: [f32; Channel::COUNT],
    pub jaw: f32,
    pub wide: f32,
    pub pucker: f32,
    pub blink: f32,
    pub head: Vec3,
    pub eyes: Vec2,
    pub body: BodyMotion,
}

impl Default for SmoothedValues {
    fn default() -> Self {
        Self {
            channels: [0.0; Channel::COUNT],
            jaw: 0.0,
            wide: 0.0,
            pucker: 0.0,
            blink: 0.0,
            head: Vec3::ZERO,
            eyes: Vec2::ZERO,
            body: BodyMotion::REST,
        }
    }
}

impl SmoothedValues {
    #[inline]
    #[must_use]
    pub fn channel(&self, channel: Channel) -> f32 {
        self.channels[channel.index()]
    }

    /// One smoothing step of every value toward `targets`.
    pub fn approach(&mut self, targets: &FrameTargets, smoothing: &SmoothingConfig) {
        let speaking = targets.state == DriverState::Speaking;
        for channel in Channel::ALL {
            let i = channel.index();
            approach(
                &mut self.channels[i],
                targets.channels[i],
                channel_alpha(channel, speaking, smoothing),
            );
        }

        let lip = lip_alpha(speaking, smoothing);
        approach(&mut self.jaw, targets.shape.jaw, lip);
        approach(&mut self.wide, targets.shape.wide, lip);
        approach(&mut self.pucker, targets.shape.pucker, lip);
        approach(&mut self.blink, targets.blink, smoothing.blink);
        approach(&mut self.head, targets.tracking.head, smoothing.tracking);
        approach(&mut self.eyes, targets.tracking.eyes, smoothing.tracking);

        let body = if speaking { smoothing.speech } else { smoothing.idle };
        approach(&mut self.body, targets.body, body);
    }
}

fn lip_alpha(speaking: bool, smoothing: &SmoothingConfig) -> f32 {
    if speaking {
        smoothing.speech
    } else {
        smoothing.relax
    }
}

/// Smoothing factor for one channel in the given state.
#[must_use]
pub fn channel_alpha(channel: Channel, speaking: bool, smoothing: &SmoothingConfig) -> f32 {
    match channel {
        Channel::BlinkLeft | Channel::BlinkRight => smoothing.blink,
        Channel::Smile => smoothing.idle,
        _ => lip_alpha(speaking, smoothing),
    }
}

/// Signal-driven state plus everything carried from one frame to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub is_speaking: bool,
    /// Normalised face position, each axis in `[-1, 1]`.
    pub face_position: Vec2,
    /// Seconds since engine construction.
    pub elapsed_time: f32,
    pub blink: BlinkClock,
    pub smoothed: SmoothedValues,
}

impl AnimationState {
    #[must_use]
    pub fn new(blink: BlinkClock) -> Self {
        Self {
            is_speaking: false,
            face_position: Vec2::ZERO,
            elapsed_time: 0.0,
            blink,
            smoothed: SmoothedValues::default(),
        }
    }
}

/// Consonant viseme gains relative to the derived scalars.
const CONSONANTS: [(Channel, Source, f32); 8] = [
    (Channel::VisemeCH, Source::Jaw, 0.3),
    (Channel::VisemeDD, Source::Jaw, 0.4),
    (Channel::VisemeKK, Source::Jaw, 0.2),
    (Channel::VisemeTH, Source::Jaw, 0.3),
    (Channel::VisemeFF, Source::Wide, 0.3),
    (Channel::VisemeSS, Source::Wide, 0.2),
    (Channel::VisemePP, Source::Pucker, 0.5),
    (Channel::VisemeRR, Source::Pucker, 0.4),
];

#[derive(Clone, Copy)]
enum Source {
    Jaw,
    Wide,
    Pucker,
}

/// Stateful per-frame target generator.
#[derive(Debug)]
pub struct AnimationDriver {
    config: AnimationConfig,
    blink: BlinkCycle,
    state: DriverState,
}

impl AnimationDriver {
    #[must_use]
    pub fn new(config: AnimationConfig) -> Self {
        let blink = BlinkCycle::new(config.blink.clone());
        Self {
            config,
            blink,
            state: DriverState::Idle,
        }
    }

    /// Fresh animation state with a newly drawn blink interval.
    pub fn initial_state(&mut self) -> AnimationState {
        AnimationState::new(self.blink.start())
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Computes this frame's targets from `anim`, advancing its blink clock.
    pub fn drive(&mut self, anim: &mut AnimationState) -> FrameTargets {
        let next = if anim.is_speaking {
            DriverState::Speaking
        } else {
            DriverState::Idle
        };
        if next != self.state {
            log::debug!("driver: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
        let speaking = next == DriverState::Speaking;
        let t = anim.elapsed_time;
        let speech = &self.config.speech;

        let blink = self.blink.advance(&mut anim.blink) * self.config.blink.strength;

        let shape = if speaking {
            mouth_shape(speech, t)
        } else {
            MouthShape::CLOSED
        };

        let mut channels = [0.0; Channel::COUNT];
        let mut set = |c: Channel, v: f32| channels[c.index()] = v;

        for c in [Channel::JawOpen, Channel::MouthOpen, Channel::VisemeAA] {
            set(c, shape.jaw);
        }
        for c in [Channel::VisemeE, Channel::VisemeI, Channel::VisemeWide] {
            set(c, shape.wide);
        }
        for c in [Channel::VisemeO, Channel::VisemeU, Channel::VisemePucker] {
            set(c, shape.pucker);
        }
        for (c, source, gain) in CONSONANTS {
            let v = match source {
                Source::Jaw => shape.jaw,
                Source::Wide => shape.wide,
                Source::Pucker => shape.pucker,
            };
            set(c, v * gain);
        }
        set(Channel::VisemeSil, 0.0);
        set(Channel::BlinkLeft, blink);
        set(Channel::BlinkRight, blink);

        let smile_extra = if speaking { speech.speaking_smile } else { 0.0 };
        set(
            Channel::Smile,
            speech.smile_base + speech.smile_breathe.sample(t) + smile_extra,
        );

        let tracking = tracking_bias(&self.config.tracking, anim.face_position, t, speaking);
        let body = if speaking {
            self.body_motion(t)
        } else {
            BodyMotion::REST
        };

        FrameTargets {
            state: next,
            channels,
            shape,
            blink,
            tracking,
            body,
        }
    }

    fn body_motion(&self, t: f32) -> BodyMotion {
        let base = self.config.speech.base_frequency;
        let fallback = &self.config.fallback;
        BodyMotion {
            scale_y: 1.0 + fallback.mesh_scale_amplitude * (base * t).sin().abs(),
            bob: fallback.mesh_bob_amplitude * (0.5 * base * t).sin(),
            roll: fallback.mesh_roll.sample(t),
        }
    }
}
