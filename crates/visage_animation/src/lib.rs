//! Procedural facial animation.
//!
//! Drives a bound avatar from two signals, "is speaking" and a normalised
//! face position, using synthetic waveforms and exponential smoothing:
//!
//! - [`waveform`]: jaw and lip-shape scalars while speaking
//! - [`blink`]: randomised blink cycle
//! - [`tracking`]: head/eye look-toward bias with idle wobble
//! - [`driver`]: per-frame target generation and the smoothed state
//! - [`commit`]: writes into the scene for the active [`Tier`]
//! - [`engine`]: [`AvatarEngine`], the host-facing entry point

pub mod blink;
pub mod commit;
pub mod config;
pub mod driver;
pub mod engine;
pub mod profile;
pub mod signals;
pub mod tier;
pub mod tracking;
pub mod values;
pub mod waveform;

pub use blink::{BlinkClock, BlinkCycle};
pub use commit::{BasePose, BoundRig};
pub use config::{
    AnimationConfig, BlinkConfig, FallbackConfig, Oscillator, ShapeWave, SmoothingConfig,
    SpeechConfig, TrackingConfig, WaveComponent,
};
pub use driver::{
    AnimationDriver, AnimationState, BodyMotion, DriverState, FrameTargets, SmoothedValues,
};
pub use engine::AvatarEngine;
pub use profile::{ArmPose, AvatarProfile, RootOffset};
pub use signals::{FacePosition, Signal, SignalReceiver, SignalSender, signal_channel};
pub use tier::Tier;
pub use tracking::TrackingBias;
pub use values::Blend;
pub use waveform::{LipShape, MouthShape};
