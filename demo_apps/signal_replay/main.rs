//! Replays a timed signal script against a synthetic avatar at 60 fps and
//! prints what the engine drives.
//!
//! ```text
//! signal_replay [--tier morph|bone|mesh] [--profile profile.json] [--script script.txt]
//! ```
//!
//! Script lines are `<seconds> <json signal>`; `#` starts a comment.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use visage::glam::EulerRot;
use visage::visage_animation::Tier;
use visage::{
    AvatarEngine, AvatarProfile, Channel, Mesh, MorphTargets, NodeHandle, Scene, Skeleton,
};

const FRAME: f32 = 1.0 / 60.0;
const REPORT_EVERY: u32 = 15;

const DEFAULT_SCRIPT: &str = r#"
# seconds  signal
0.0 {"type":"face_track","data":{"x":0.4,"y":-0.2}}
0.5 {"type":"speak_start"}
2.5 {"type":"speak_stop"}
3.0 {"type":"face_track","data":{"x":-0.6,"y":0.3}}
3.5 {"type":"speak_start"}
4.5 {"type":"speak_stop"}
"#;

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum AvatarKind {
    Morph,
    Bone,
    Mesh,
}

#[derive(Parser, Debug)]
#[command(name = "signal_replay", version, about, long_about = None)]
struct Args {
    /// Which fallback tier the synthetic avatar exercises
    #[arg(short, long = "tier", value_enum, default_value_t = AvatarKind::Morph)]
    kind: AvatarKind,

    /// Avatar profile JSON
    #[arg(short, long)]
    profile: Option<PathBuf>,

    /// Signal script (`<seconds> <json signal>` per line)
    #[arg(short, long)]
    script: Option<PathBuf>,
}

fn parse_script(text: &str) -> anyhow::Result<Vec<(f32, String)>> {
    let mut events = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (at, json) = line
            .split_once(char::is_whitespace)
            .with_context(|| format!("line {}: expected '<seconds> <json>'", n + 1))?;
        let at: f32 = at
            .parse()
            .with_context(|| format!("line {}: bad time '{at}'", n + 1))?;
        events.push((at, json.trim().to_string()));
    }
    events.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(events)
}

/// A small humanoid: skeleton with head, jaw, eyes and arms, plus meshes
/// according to `kind`.
fn build_avatar(scene: &mut Scene, kind: AvatarKind) -> NodeHandle {
    let root = scene.build_node("Avatar").build();
    let armature = scene.build_node("Armature").with_parent(root).build();

    let hips = scene.build_node("mixamorig:Hips").as_bone().with_parent(armature).build();
    let spine = scene.build_node("mixamorig:Spine").as_bone().with_parent(hips).build();
    let neck = scene.build_node("mixamorig:Neck").as_bone().with_parent(spine).build();
    let head = scene
        .build_node("mixamorig:Head")
        .as_bone()
        .with_parent(neck)
        .with_position(0.0, 0.1, 0.0)
        .build();
    let mut bones = vec![hips, spine, neck, head];

    if kind != AvatarKind::Mesh {
        for name in ["CC_Base_JawRoot", "CC_Base_L_Eye", "CC_Base_R_Eye"] {
            bones.push(scene.build_node(name).as_bone().with_parent(head).build());
        }
    }
    for side in ["Left", "Right"] {
        let arm = scene
            .build_node(&format!("mixamorig:{side}Arm"))
            .as_bone()
            .with_parent(spine)
            .build();
        let fore = scene
            .build_node(&format!("mixamorig:{side}ForeArm"))
            .as_bone()
            .with_parent(arm)
            .build();
        bones.extend([arm, fore]);
    }
    let skin = scene.add_skeleton(Skeleton::new("Armature", bones));

    scene
        .build_node("Wolf3D_Body")
        .with_parent(root)
        .with_mesh(Mesh::new().with_material("Wolf3D_Body").with_skin(skin))
        .build();
    scene
        .build_node("Wolf3D_Hair")
        .with_parent(root)
        .with_mesh(Mesh::new().with_material("Wolf3D_Hair").with_skin(skin))
        .build();

    if kind == AvatarKind::Morph {
        let morphs = MorphTargets::new([
            "eyeBlinkLeft",
            "eyeBlinkRight",
            "jawOpen",
            "mouthSmile",
            "mouthPucker",
            "mouthStretchLeft",
            "viseme_sil",
            "viseme_aa",
            "viseme_O",
            "viseme_PP",
        ]);
        scene
            .build_node("Wolf3D_Head")
            .with_parent(root)
            .with_mesh(
                Mesh::new()
                    .with_material("Wolf3D_Skin")
                    .with_morph_targets(morphs)
                    .with_skin(skin),
            )
            .build();
    }

    root
}

/// Mouth value as the active tier expresses it.
fn mouth_readout(engine: &AvatarEngine, scene: &Scene) -> String {
    let Some(rig) = engine.rig() else {
        return "unbound".into();
    };
    match rig.tier {
        Tier::Morph => {
            let value = rig.binding.head_mesh.and_then(|head| {
                let index = rig.channels.get(Channel::JawOpen)?;
                scene.morph_targets(head)?.influence(index)
            });
            format!("jawOpen={:.3}", value.unwrap_or_default())
        }
        Tier::Bone => {
            let angle = rig
                .binding
                .jaw_bone
                .and_then(|j| scene.get_node(j))
                .map(|n| n.transform.rotation.to_euler(EulerRot::XYZ).0);
            format!("jawAngle={:.3}", angle.unwrap_or_default())
        }
        Tier::MeshTransform => {
            let scale = rig
                .binding
                .root
                .and_then(|r| scene.get_node(r))
                .map(|n| n.transform.scale.y);
            format!("rootScaleY={:.4}", scale.unwrap_or(1.0))
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let profile = match &args.profile {
        Some(path) => AvatarProfile::load(path)?,
        None => AvatarProfile {
            name: "synthetic".into(),
            arm_pose: Some(Default::default()),
            ..Default::default()
        },
    };
    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => DEFAULT_SCRIPT.to_string(),
    };
    let events = parse_script(&script)?;

    let mut scene = Scene::new();
    let root = build_avatar(&mut scene, args.kind);

    let mut engine = AvatarEngine::new(profile)?;
    engine.bind(&mut scene, root);
    println!("{}", engine.diagnostics().text());

    let sender = engine.signals();
    let end = events.last().map_or(0.0, |e| e.0) + 1.0;
    let mut next = 0;
    let mut time = 0.0_f32;
    let mut frame = 0_u32;

    while time < end {
        while let Some((at, json)) = events.get(next)
            && *at <= time
        {
            if let Err(err) = sender.send_json(json) {
                log::warn!("Skipping script event at {at}s: {err}");
            }
            next += 1;
        }

        engine.tick(&mut scene, FRAME);
        time += FRAME;
        frame += 1;

        if frame % REPORT_EVERY == 0 {
            let state = engine.state();
            let head = state.smoothed.head;
            println!(
                "t={:5.2} speaking={:5} {} blink={:.3} smile={:.3} head=({:+.3}, {:+.3}, {:+.3})",
                state.elapsed_time,
                state.is_speaking,
                mouth_readout(&engine, &scene),
                state.smoothed.blink,
                state.smoothed.channel(Channel::Smile),
                head.x,
                head.y,
                head.z,
            );
        }
    }

    engine.unbind(&mut scene);
    Ok(())
}
