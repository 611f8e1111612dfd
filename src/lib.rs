#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Rig resolution and procedural facial animation for third-party avatars.
//!
//! Re-exports the member crates:
//!
//! - [`visage_core`]: errors and diagnostics
//! - [`visage_scene`]: the scene graph the engine reads and writes
//! - [`visage_rig`]: synonym table, rig resolver, channel map
//! - [`visage_animation`]: driver, commit stage, profile and [`AvatarEngine`]

pub use visage_animation;
pub use visage_core;
pub use visage_rig;
pub use visage_scene;

pub use visage_animation::{AvatarEngine, AvatarProfile, Signal, SignalSender, Tier};
pub use visage_core::{DiagnosticReport, DiagnosticsReader, Result, VisageError};
pub use visage_rig::{Channel, ChannelMap, RigBinding, RigResolver, Role, SynonymTable};
pub use visage_scene::{Mesh, MorphTargets, Node, NodeHandle, NodeKind, Scene, Skeleton, Transform};

/// Math types used throughout the public API.
pub use glam;
