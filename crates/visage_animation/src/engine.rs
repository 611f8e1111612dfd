//! Avatar Engine
//!
//! [`AvatarEngine`] ties the pieces together for one avatar:
//!
//! - **Bind**: resolve the rig, build the channel map, select the tier and
//!   capture the base pose. Runs once per asset, off the per-frame path.
//! - **Tick**: drain signals, advance time, generate targets, smooth, and
//!   write into the scene.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut engine = AvatarEngine::new(AvatarProfile::default())?;
//! engine.bind(&mut scene, avatar_root);
//!
//! let signals = engine.signals();
//! std::thread::spawn(move || signals.speak_start());
//!
//! loop {
//!     engine.tick(&mut scene, dt);
//!     // ... render scene ...
//! }
//! ```
//!
//! The engine is single-threaded: every write into the scene happens inside
//! [`tick`](AvatarEngine::tick) on the caller's thread. Only signal senders
//! and diagnostics readers cross threads.

use visage_core::{DiagnosticReport, DiagnosticSink, DiagnosticsReader, Result};
use visage_rig::{ChannelMap, RigResolver, SynonymTable};
use visage_scene::{NodeHandle, Scene};

use crate::commit::{BasePose, BoundRig, commit};
use crate::driver::{AnimationDriver, AnimationState, FrameTargets};
use crate::profile::AvatarProfile;
use crate::signals::{Signal, SignalReceiver, SignalSender, signal_channel};
use crate::tier::Tier;

pub struct AvatarEngine {
    profile: AvatarProfile,
    table: SynonymTable,
    driver: AnimationDriver,
    state: AnimationState,
    rig: Option<BoundRig>,

    sender: SignalSender,
    receiver: SignalReceiver,
    diagnostics: DiagnosticSink,

    last_targets: FrameTargets,
}

impl AvatarEngine {
    /// Validates `profile` and creates an unbound engine with the clock at 0.
    pub fn new(profile: AvatarProfile) -> Result<Self> {
        profile.validate()?;

        let table = SynonymTable::with_overrides(&profile.synonyms);
        let mut driver = AnimationDriver::new(profile.animation.clone());
        let state = driver.initial_state();
        let (sender, receiver) = signal_channel();

        Ok(Self {
            profile,
            table,
            driver,
            state,
            rig: None,
            sender,
            receiver,
            diagnostics: DiagnosticSink::new(),
            last_targets: FrameTargets::default(),
        })
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Binds the avatar rooted at `root`, replacing any previous binding.
    ///
    /// Applies the profile's root offset and captures the base pose. When the
    /// previous binding started from the same root, its pose is restored
    /// first, so rebinding never stacks offsets. Smoothed values restart from
    /// rest.
    pub fn bind(&mut self, scene: &mut Scene, root: NodeHandle) {
        if let Some(previous) = self.rig.take()
            && previous.scene_id == scene.id
            && previous.binding.root == Some(root)
        {
            previous.restore(scene);
        }

        let binding = RigResolver::resolve(scene, root, &self.table);
        let channels = binding
            .head_mesh
            .map(|head| ChannelMap::build(scene, head, &self.table))
            .unwrap_or_default();
        let tier = Tier::select(&binding, &channels);

        let loaded_root = binding
            .root
            .and_then(|r| scene.get_node(r))
            .map(|n| n.transform);
        if let (Some(r), Some(loaded)) = (binding.root, loaded_root)
            && !self.profile.root_offset.is_identity()
            && let Some(node) = scene.get_node_mut(r)
        {
            node.transform = self.profile.root_offset.apply(loaded);
        }

        let base = BasePose::capture(
            scene,
            [
                binding.root,
                binding.head_bone,
                binding.jaw_bone,
                binding.left_eye_bone,
                binding.right_eye_bone,
                binding.left_upper_arm,
                binding.right_upper_arm,
                binding.left_fore_arm,
                binding.right_fore_arm,
            ]
            .into_iter()
            .flatten(),
        );

        let report = DiagnosticReport {
            tier: tier.label().to_string(),
            roles: binding.describe(scene),
            hair_count: binding.hair_meshes.len(),
            channels: channels.labels(),
            morph_count: channels.target_count(),
        };

        log::info!(
            "Bound avatar '{}': tier={}, {} roles, {} channels",
            self.profile.name,
            tier,
            binding.bound_count(),
            channels.len()
        );

        self.state.smoothed = Default::default();
        self.rig = Some(BoundRig {
            scene_id: scene.id,
            binding,
            channels,
            tier,
            base,
            loaded_root,
        });
        self.diagnostics.publish(report);
    }

    /// Discards the current binding, restoring the bound nodes' transforms
    /// (root without the profile offset).
    pub fn unbind(&mut self, scene: &mut Scene) {
        let Some(rig) = self.rig.take() else {
            return;
        };
        if rig.scene_id == scene.id {
            rig.restore(scene);
        } else {
            log::warn!("Unbinding against scene {} but the rig belongs to scene {}", scene.id, rig.scene_id);
        }
        self.diagnostics.clear();
        log::info!("Unbound avatar '{}'", self.profile.name);
    }

    /// Drops the current binding without touching any scene, for when the
    /// asset's scene has already been discarded.
    pub fn discard(&mut self) {
        if self.rig.take().is_some() {
            self.diagnostics.clear();
        }
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    /// Advances the engine by `dt` seconds and writes the frame into `scene`.
    pub fn tick(&mut self, scene: &mut Scene, dt: f32) {
        let pending: Vec<Signal> = self.receiver.drain().collect();
        for signal in pending {
            self.apply(signal);
        }

        if dt.is_finite() && dt > 0.0 {
            self.state.elapsed_time += dt;
        } else if !dt.is_finite() || dt < 0.0 {
            log::warn!("Ignoring invalid frame delta {dt}");
        }

        let targets = self.driver.drive(&mut self.state);
        self.state
            .smoothed
            .approach(&targets, &self.profile.animation.smoothing);

        if let Some(rig) = &self.rig {
            commit(
                scene,
                rig,
                &self.state.smoothed,
                &self.profile.animation,
                self.profile.arm_pose.as_ref(),
            );
        }
        self.last_targets = targets;
    }

    /// Applies a signal immediately, as a plain state write.
    pub fn apply(&mut self, signal: Signal) {
        let Some(signal) = signal.sanitized() else {
            return;
        };
        match signal {
            Signal::SpeakStart => self.state.is_speaking = true,
            Signal::SpeakStop => self.state.is_speaking = false,
            Signal::FaceTrack(p) => {
                self.state.face_position.x = p.x;
                self.state.face_position.y = p.y;
            }
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// A new sender feeding this engine.
    #[must_use]
    pub fn signals(&self) -> SignalSender {
        self.sender.clone()
    }

    /// Read-only diagnostics handle.
    #[must_use]
    pub fn diagnostics(&self) -> DiagnosticsReader {
        self.diagnostics.reader()
    }

    #[must_use]
    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    /// Targets computed by the most recent tick.
    #[must_use]
    pub fn last_targets(&self) -> &FrameTargets {
        &self.last_targets
    }

    #[must_use]
    pub fn rig(&self) -> Option<&BoundRig> {
        self.rig.as_ref()
    }

    /// Active tier, `None` while unbound.
    #[must_use]
    pub fn tier(&self) -> Option<Tier> {
        self.rig.as_ref().map(|r| r.tier)
    }

    #[must_use]
    pub fn profile(&self) -> &AvatarProfile {
        &self.profile
    }

    #[must_use]
    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }
}
