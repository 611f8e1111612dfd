//! Avatar Engine Tests
//!
//! End-to-end tests over synthetic avatars:
//! - Tier selection and per-tier output
//! - Rebinding, unbinding and the root offset
//! - Signal delivery across threads and input sanitising
//! - Robustness against unbound ticks, bad frame deltas and vanished nodes

use std::f32::consts::PI;

use glam::{EulerRot, Quat, Vec2, Vec3};
use visage::visage_animation::{ArmPose, BlinkConfig, Signal};
use visage::{
    AvatarEngine, AvatarProfile, Channel, Mesh, MorphTargets, NodeHandle, Scene, Skeleton, Tier,
};

const EPSILON: f32 = 1e-4;
const FRAME: f32 = 1.0 / 60.0;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn seeded_profile() -> AvatarProfile {
    let mut profile = AvatarProfile {
        name: "test".into(),
        ..Default::default()
    };
    profile.animation.blink = BlinkConfig {
        seed: Some(9),
        ..BlinkConfig::default()
    };
    profile
}

// ============================================================================
// Synthetic avatars
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Morph,
    Bone,
    Mesh,
}

struct Avatar {
    root: NodeHandle,
    head_bone: NodeHandle,
    jaw: Option<NodeHandle>,
    left_eye: Option<NodeHandle>,
    left_upper_arm: NodeHandle,
    head_mesh: Option<NodeHandle>,
}

const MORPHS: [&str; 6] = [
    "eyeBlinkLeft",
    "eyeBlinkRight",
    "jawOpen",
    "mouthSmile",
    "mouthPucker",
    "viseme_aa",
];

fn build_avatar(scene: &mut Scene, kind: Kind) -> Avatar {
    let root = scene
        .build_node("Avatar")
        .with_position(0.0, 0.5, 0.0)
        .build();
    let hips = scene.build_node("mixamorig:Hips").as_bone().with_parent(root).build();
    let head_bone = scene.build_node("mixamorig:Head").as_bone().with_parent(hips).build();
    let left_upper_arm = scene.build_node("mixamorig:LeftArm").as_bone().with_parent(hips).build();
    let mut bones = vec![hips, head_bone, left_upper_arm];

    let (jaw, left_eye) = if kind == Kind::Mesh {
        (None, None)
    } else {
        let jaw = scene.build_node("CC_Base_JawRoot").with_parent(head_bone).build();
        let left = scene.build_node("CC_Base_L_Eye").with_parent(head_bone).build();
        let right = scene.build_node("CC_Base_R_Eye").with_parent(head_bone).build();
        bones.extend([jaw, left, right]);
        (Some(jaw), Some(left))
    };
    let skin = scene.add_skeleton(Skeleton::new("Armature", bones));

    scene
        .build_node("Wolf3D_Body")
        .with_parent(root)
        .with_mesh(Mesh::new().with_skin(skin))
        .build();

    let head_mesh = (kind == Kind::Morph).then(|| {
        scene
            .build_node("Wolf3D_Head")
            .with_parent(root)
            .with_mesh(Mesh::new().with_morph_targets(MorphTargets::new(MORPHS)))
            .build()
    });

    Avatar {
        root,
        head_bone,
        jaw,
        left_eye,
        left_upper_arm,
        head_mesh,
    }
}

fn influence(scene: &Scene, mesh: NodeHandle, name: &str) -> f32 {
    let morphs = scene.morph_targets(mesh).unwrap();
    morphs.influence(morphs.index_of(name).unwrap()).unwrap()
}

// ============================================================================
// Morph tier
// ============================================================================

#[test]
fn morph_tier_binds_and_reports() {
    init_logger();
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();

    engine.bind(&mut scene, avatar.root);

    assert_eq!(engine.tier(), Some(Tier::Morph));
    let rig = engine.rig().unwrap();
    assert_eq!(rig.binding.head_mesh, avatar.head_mesh);
    assert_eq!(rig.binding.jaw_bone, avatar.jaw);
    assert_eq!(rig.channels.get(Channel::JawOpen), Some(2));

    let report = engine.diagnostics().snapshot().unwrap();
    assert_eq!(report.tier, "morph");
    assert_eq!(report.role("head"), Some("Wolf3D_Head"));
    assert_eq!(report.role("jaw"), Some("CC_Base_JawRoot"));
    assert_eq!(report.morph_count, MORPHS.len());
    assert!(report.channels.iter().any(|c| c == "blinkLeft"));
}

#[test]
fn first_speaking_frame_writes_quarter_of_peak() {
    let profile = AvatarProfile::from_json(
        r#"{
            "name": "single",
            "animation": {
                "speech": { "components": [ { "ratio": 1.0, "weight": 1.0 } ] },
                "blink": { "seed": 3 }
            }
        }"#,
    )
    .unwrap();

    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let head = avatar.head_mesh.unwrap();
    let mut engine = AvatarEngine::new(profile).unwrap();
    engine.bind(&mut scene, avatar.root);

    engine.signals().speak_start();
    engine.tick(&mut scene, PI / 16.0);

    assert!(engine.state().is_speaking);
    assert!(approx(engine.last_targets().channel(Channel::JawOpen), 0.6));
    assert!(approx(influence(&scene, head, "jawOpen"), 0.15));
    assert!(approx(influence(&scene, head, "viseme_aa"), 0.15));
    assert_eq!(influence(&scene, head, "eyeBlinkLeft"), 0.0);
    assert!(influence(&scene, head, "mouthSmile") > 0.0);
}

#[test]
fn two_key_dictionary_scenario() {
    let mut profile = seeded_profile();
    profile.animation.speech.components = vec![visage::visage_animation::WaveComponent::new(1.0, 0.0, 1.0)];

    let mut scene = Scene::new();
    let root = scene.build_node("Avatar").build();
    let face = scene
        .build_node("Face")
        .with_parent(root)
        .with_mesh(Mesh::new().with_morph_targets(MorphTargets::from_dictionary([
            ("jawOpen", 0),
            ("mouthSmile", 1),
        ])))
        .build();

    let mut engine = AvatarEngine::new(profile).unwrap();
    engine.bind(&mut scene, root);
    assert_eq!(engine.tier(), Some(Tier::Morph));

    engine.apply(Signal::SpeakStart);
    engine.tick(&mut scene, 0.19635);
    assert!(approx(influence(&scene, face, "jawOpen"), 0.15));

    engine.apply(Signal::SpeakStop);
    for _ in 0..10 {
        engine.tick(&mut scene, FRAME);
    }
    assert!(approx(influence(&scene, face, "jawOpen"), 0.15 * 0.85_f32.powi(10)));
}

#[test]
fn morph_tier_relaxes_after_speech() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let head = avatar.head_mesh.unwrap();
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);

    engine.apply(Signal::SpeakStart);
    let mut peak = 0.0_f32;
    for _ in 0..120 {
        engine.tick(&mut scene, FRAME);
        peak = peak.max(influence(&scene, head, "jawOpen"));
    }
    assert!(peak > 0.1);

    engine.apply(Signal::SpeakStop);
    for _ in 0..120 {
        engine.tick(&mut scene, FRAME);
    }
    assert!(influence(&scene, head, "jawOpen") < 1e-3);
}

#[test]
fn blink_morphs_leave_eye_scale_alone() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let eye = avatar.left_eye.unwrap();
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);

    for _ in 0..(60 * 8) {
        engine.tick(&mut scene, FRAME);
        assert_eq!(scene.get_node(eye).unwrap().transform.scale.y, 1.0);
    }
}

// ============================================================================
// Bone tier
// ============================================================================

#[test]
fn bone_tier_jaw_stays_in_bounds() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Bone);
    let jaw = avatar.jaw.unwrap();
    let eye = avatar.left_eye.unwrap();
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);
    assert_eq!(engine.tier(), Some(Tier::Bone));

    engine.signals().speak_start();
    let mut opened = false;
    let mut blinked = false;
    for _ in 0..(60 * 8) {
        engine.tick(&mut scene, FRAME);
        let t = scene.get_node(jaw).unwrap().transform;
        let (x, y, z) = t.rotation.to_euler(EulerRot::XYZ);
        assert!((-EPSILON..=0.15 + EPSILON).contains(&x), "jaw angle {x}");
        assert!(approx(y, 0.0) && approx(z, 0.0));
        assert!((0.8..=1.25).contains(&t.scale.x), "jaw width {}", t.scale.x);
        opened |= x > 0.02;

        let lid = scene.get_node(eye).unwrap().transform.scale.y;
        assert!((0.2 - EPSILON..=1.0).contains(&lid), "lid {lid}");
        blinked |= lid < 0.9;
    }
    assert!(opened);
    // Default intervals are under 6 s, so at least one blink in 8 s.
    assert!(blinked);
}

#[test]
fn bone_tier_jaw_closes_when_idle() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Bone);
    let jaw = avatar.jaw.unwrap();
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);

    engine.apply(Signal::SpeakStart);
    for _ in 0..60 {
        engine.tick(&mut scene, FRAME);
    }
    engine.apply(Signal::SpeakStop);
    for _ in 0..180 {
        engine.tick(&mut scene, FRAME);
    }
    let t = scene.get_node(jaw).unwrap().transform;
    assert!(t.rotation.abs_diff_eq(Quat::IDENTITY, 1e-3));
    assert!(approx(t.scale.x, 1.0));
}

// ============================================================================
// Mesh-transform tier
// ============================================================================

#[test]
fn mesh_tier_animates_root_within_bounds() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Mesh);
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);
    assert_eq!(engine.tier(), Some(Tier::MeshTransform));

    engine.apply(Signal::SpeakStart);
    let mut moved = false;
    for _ in 0..240 {
        engine.tick(&mut scene, FRAME);
        let t = scene.get_node(avatar.root).unwrap().transform;
        assert!(t.is_finite());
        assert!((1.0 - EPSILON..=1.02 + EPSILON).contains(&t.scale.y));
        assert!((t.position.y - 0.5).abs() <= 0.01 + EPSILON);
        moved |= t.scale.y > 1.001;
    }
    assert!(moved);
}

#[test]
fn empty_subtree_degrades_to_mesh_tier() {
    let mut scene = Scene::new();
    let root = scene.build_node("Prop").build();
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();

    engine.bind(&mut scene, root);
    assert_eq!(engine.tier(), Some(Tier::MeshTransform));

    engine.apply(Signal::SpeakStart);
    engine.apply(Signal::face_track(0.5, 0.5));
    for _ in 0..60 {
        engine.tick(&mut scene, FRAME);
    }
    let t = scene.get_node(root).unwrap().transform;
    assert!(t.is_finite());
    // No head bone: the root carries the look rotation.
    assert!(!t.rotation.abs_diff_eq(Quat::IDENTITY, 1e-3));
}

// ============================================================================
// Binding lifecycle
// ============================================================================

#[test]
fn rebind_replaces_binding_and_resets_smoothing() {
    let mut first = Scene::new();
    let a = build_avatar(&mut first, Kind::Morph);
    let mut second = Scene::new();
    let b = build_avatar(&mut second, Kind::Mesh);

    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    let reader = engine.diagnostics();
    engine.bind(&mut first, a.root);
    engine.apply(Signal::SpeakStart);
    for _ in 0..30 {
        engine.tick(&mut first, FRAME);
    }
    assert!(engine.state().smoothed.jaw > 0.0);

    engine.bind(&mut second, b.root);
    let rig = engine.rig().unwrap();
    assert_eq!(rig.tier, Tier::MeshTransform);
    assert_eq!(rig.binding.root, Some(b.root));
    assert_eq!(rig.binding.head_mesh, None);
    assert!(rig.channels.is_empty());
    assert_eq!(engine.state().smoothed.jaw, 0.0);
    assert_eq!(reader.snapshot().unwrap().tier, "mesh-transform");

    // Speaking state survives the swap.
    assert!(engine.state().is_speaking);
    engine.tick(&mut second, FRAME);

    // The first scene's handles are never written into the second scene.
    assert_eq!(a.root, b.root);
    let root = second.get_node(b.root).unwrap().transform;
    assert!(root.is_finite());
    assert!((root.position.y - 0.5).abs() <= 0.01 + EPSILON);
}

#[test]
fn unbind_restores_pose_and_clears_diagnostics() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Bone);
    let mut profile = seeded_profile();
    profile.root_offset.position = Vec3::new(0.0, -1.0, 0.0);
    profile.root_offset.scale = Vec3::splat(2.0);

    let mut engine = AvatarEngine::new(profile).unwrap();
    engine.bind(&mut scene, avatar.root);

    let root = scene.get_node(avatar.root).unwrap().transform;
    assert!(approx(root.position.y, -0.5));
    assert_eq!(root.scale, Vec3::splat(2.0));

    engine.apply(Signal::face_track(1.0, -1.0));
    engine.apply(Signal::SpeakStart);
    for _ in 0..60 {
        engine.tick(&mut scene, FRAME);
    }
    let head = scene.get_node(avatar.head_bone).unwrap().transform;
    assert!(head.rotation.angle_between(Quat::IDENTITY) > 0.05);

    engine.unbind(&mut scene);

    assert!(engine.rig().is_none());
    assert!(engine.diagnostics().snapshot().is_none());
    assert_eq!(scene.get_node(avatar.head_bone).unwrap().transform.rotation, Quat::IDENTITY);
    assert_eq!(scene.get_node(avatar.jaw.unwrap()).unwrap().transform.scale, Vec3::ONE);
    let root = scene.get_node(avatar.root).unwrap().transform;
    assert_eq!(root.position, Vec3::new(0.0, 0.5, 0.0));
    assert_eq!(root.scale, Vec3::ONE);
}

#[test]
fn unbind_restores_arm_rest_pose() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let profile = AvatarProfile {
        arm_pose: Some(ArmPose::default()),
        ..seeded_profile()
    };
    let mut engine = AvatarEngine::new(profile).unwrap();
    engine.bind(&mut scene, avatar.root);
    engine.tick(&mut scene, FRAME);
    let posed = scene.get_node(avatar.left_upper_arm).unwrap().transform.rotation;
    assert!(!posed.abs_diff_eq(Quat::IDENTITY, 1e-3));

    engine.unbind(&mut scene);
    assert_eq!(
        scene.get_node(avatar.left_upper_arm).unwrap().transform.rotation,
        Quat::IDENTITY
    );
}

#[test]
fn rebinding_same_root_does_not_stack_offset() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Bone);
    let mut profile = seeded_profile();
    profile.root_offset.position = Vec3::new(0.0, -1.0, 0.0);
    profile.arm_pose = Some(ArmPose::default());
    let mut engine = AvatarEngine::new(profile).unwrap();

    engine.bind(&mut scene, avatar.root);
    engine.apply(Signal::SpeakStart);
    engine.apply(Signal::face_track(1.0, 1.0));
    for _ in 0..30 {
        engine.tick(&mut scene, FRAME);
    }

    engine.bind(&mut scene, avatar.root);
    let root = scene.get_node(avatar.root).unwrap().transform;
    assert!(approx(root.position.y, -0.5));
    assert_eq!(root.rotation, Quat::IDENTITY);
    assert_eq!(scene.get_node(avatar.head_bone).unwrap().transform.rotation, Quat::IDENTITY);
    assert_eq!(scene.get_node(avatar.jaw.unwrap()).unwrap().transform.scale, Vec3::ONE);

    engine.unbind(&mut scene);
    let root = scene.get_node(avatar.root).unwrap().transform;
    assert_eq!(root.position, Vec3::new(0.0, 0.5, 0.0));
    assert_eq!(
        scene.get_node(avatar.left_upper_arm).unwrap().transform.rotation,
        Quat::IDENTITY
    );
}

#[test]
fn discard_drops_binding_without_scene() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);
    drop(scene);

    engine.discard();
    assert!(engine.tier().is_none());
    assert_eq!(engine.diagnostics().text(), "unbound");
}

#[test]
fn tick_while_unbound_only_advances_time() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let before = scene.get_node(avatar.head_bone).unwrap().transform;
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();

    engine.apply(Signal::face_track(1.0, 1.0));
    for _ in 0..30 {
        engine.tick(&mut scene, FRAME);
    }
    assert!(approx(engine.state().elapsed_time, 0.5));
    assert_eq!(scene.get_node(avatar.head_bone).unwrap().transform, before);
}

// ============================================================================
// Arms
// ============================================================================

#[test]
fn arm_pose_is_applied_when_configured() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);

    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);
    engine.tick(&mut scene, FRAME);
    assert_eq!(
        scene.get_node(avatar.left_upper_arm).unwrap().transform.rotation,
        Quat::IDENTITY
    );

    let profile = AvatarProfile {
        arm_pose: Some(ArmPose::default()),
        ..seeded_profile()
    };
    let mut engine = AvatarEngine::new(profile).unwrap();
    engine.bind(&mut scene, avatar.root);
    engine.tick(&mut scene, FRAME);

    let expected = ArmPose::left_rotation(ArmPose::default().upper_arm);
    let actual = scene.get_node(avatar.left_upper_arm).unwrap().transform.rotation;
    assert!(actual.abs_diff_eq(expected, EPSILON));
}

// ============================================================================
// Signals and robustness
// ============================================================================

#[test]
fn signals_from_another_thread_arrive_on_next_tick() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);

    let sender = engine.signals();
    std::thread::spawn(move || {
        sender.face_track(0.25, -0.5);
        sender.speak_start();
    })
    .join()
    .unwrap();

    assert!(!engine.state().is_speaking);
    engine.tick(&mut scene, FRAME);
    assert!(engine.state().is_speaking);
    assert_eq!(engine.state().face_position, Vec2::new(0.25, -0.5));
}

#[test]
fn last_signal_in_a_frame_wins() {
    let mut scene = Scene::new();
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    let sender = engine.signals();

    sender.speak_start();
    sender.speak_stop();
    sender.send_json(r#"{"type":"face_track","data":{"x":0.1,"y":0.2}}"#).unwrap();
    sender.send_json(r#"{"type":"face_track","data":{"x":-0.3,"y":0.4}}"#).unwrap();
    engine.tick(&mut scene, FRAME);

    assert!(!engine.state().is_speaking);
    assert_eq!(engine.state().face_position, Vec2::new(-0.3, 0.4));
}

#[test]
fn out_of_range_face_positions_are_clamped_and_nan_dropped() {
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();

    engine.apply(Signal::face_track(2.5, -7.0));
    assert_eq!(engine.state().face_position, Vec2::new(1.0, -1.0));

    engine.apply(Signal::face_track(f32::NAN, 0.0));
    assert_eq!(engine.state().face_position, Vec2::new(1.0, -1.0));
}

#[test]
fn invalid_frame_delta_is_ignored() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);

    engine.tick(&mut scene, 0.5);
    for dt in [f32::NAN, f32::INFINITY, -1.0, 0.0] {
        engine.tick(&mut scene, dt);
        assert_eq!(engine.state().elapsed_time, 0.5);
    }
    assert!(engine.last_targets().is_finite());
}

#[test]
fn removed_head_mesh_does_not_break_tick() {
    let mut scene = Scene::new();
    let avatar = build_avatar(&mut scene, Kind::Morph);
    let mut engine = AvatarEngine::new(seeded_profile()).unwrap();
    engine.bind(&mut scene, avatar.root);

    scene.remove_node(avatar.head_mesh.unwrap());
    engine.apply(Signal::SpeakStart);
    for _ in 0..30 {
        engine.tick(&mut scene, FRAME);
    }
    assert!(scene.get_node(avatar.head_bone).unwrap().transform.is_finite());
}

#[test]
fn invalid_profile_is_rejected() {
    let mut profile = seeded_profile();
    profile.animation.smoothing.speech = 0.0;
    assert!(AvatarEngine::new(profile).is_err());
}
