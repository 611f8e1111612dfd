//! Rig Resolver Tests
//!
//! Tests for:
//! - Role binding on common naming conventions (Character Creator, Mixamo)
//! - Head mesh priority: name/material > mouth-like morph key > morph count
//! - First-match-wins for singleton roles, ordered collection for hair
//! - Idempotence and absence of side effects

use visage::visage_rig::SynonymOverrides;
use visage::{
    Mesh, MorphTargets, NodeHandle, NodeKind, RigBinding, RigResolver, Role, Scene, Skeleton,
    SynonymTable,
};

fn morph_mesh(names: &[&str]) -> Mesh {
    Mesh::new().with_morph_targets(MorphTargets::new(names.iter().copied()))
}

fn bone(scene: &mut Scene, name: &str, parent: NodeHandle) -> NodeHandle {
    scene.build_node(name).as_bone().with_parent(parent).build()
}

/// Character Creator style avatar.
fn cc_avatar(scene: &mut Scene) -> NodeHandle {
    let root = scene.build_node("Avatar").build();
    let hips = bone(scene, "CC_Base_Hip", root);
    let neck = bone(scene, "CC_Base_NeckTwist01", hips);
    let head = bone(scene, "CC_Base_Head", neck);
    bone(scene, "CC_Base_JawRoot", head);
    bone(scene, "CC_Base_L_Eye", head);
    bone(scene, "CC_Base_R_Eye", head);
    let l_up = bone(scene, "CC_Base_L_Upperarm", hips);
    bone(scene, "CC_Base_L_UpperarmTwist01", l_up);
    bone(scene, "CC_Base_L_Forearm", l_up);
    let r_up = bone(scene, "CC_Base_R_Upperarm", hips);
    bone(scene, "CC_Base_R_Forearm", r_up);

    scene
        .build_node("CC_Base_Body")
        .with_parent(root)
        .with_mesh(morph_mesh(&["Mouth_Open", "Eye_Blink_L", "Eye_Blink_R", "Mouth_Smile"]).with_material("Std_Skin_Head"))
        .build();
    scene
        .build_node("CC_Base_Eye")
        .with_parent(root)
        .with_mesh(Mesh::new())
        .build();
    scene
        .build_node("Short_Hair")
        .with_parent(root)
        .with_mesh(Mesh::new().with_material("Hair_Transparency"))
        .build();
    root
}

fn name_of(scene: &Scene, handle: Option<NodeHandle>) -> Option<&str> {
    handle.and_then(|h| scene.get_name(h))
}

// ============================================================================
// Role binding
// ============================================================================

#[test]
fn resolves_character_creator_rig() {
    let mut scene = Scene::new();
    let root = cc_avatar(&mut scene);
    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());

    assert_eq!(b.root, Some(root));
    assert_eq!(name_of(&scene, b.head_mesh), Some("CC_Base_Body"));
    assert_eq!(name_of(&scene, b.head_bone), Some("CC_Base_Head"));
    assert_eq!(name_of(&scene, b.jaw_bone), Some("CC_Base_JawRoot"));
    assert_eq!(name_of(&scene, b.left_eye_bone), Some("CC_Base_L_Eye"));
    assert_eq!(name_of(&scene, b.right_eye_bone), Some("CC_Base_R_Eye"));
    assert_eq!(name_of(&scene, b.left_upper_arm), Some("CC_Base_L_Upperarm"));
    assert_eq!(name_of(&scene, b.right_upper_arm), Some("CC_Base_R_Upperarm"));
    assert_eq!(name_of(&scene, b.left_fore_arm), Some("CC_Base_L_Forearm"));
    assert_eq!(name_of(&scene, b.right_fore_arm), Some("CC_Base_R_Forearm"));
    assert_eq!(b.hair_meshes.len(), 1);
    assert_eq!(b.get(Role::Jaw), b.jaw_bone);
    assert_eq!(b.get(Role::Hair), None);
}

#[test]
fn resolves_mixamo_skeleton_joints() {
    let mut scene = Scene::new();
    let root = scene.build_node("Armature").build();
    // glTF joints are plain nodes; the skeleton makes them bones.
    let names = [
        "mixamorig:Hips",
        "mixamorig:Neck",
        "mixamorig:Head",
        "mixamorig:HeadTop_End",
        "mixamorig:LeftEye",
        "mixamorig:RightEye",
        "mixamorig:LeftArm",
        "mixamorig:LeftForeArm",
        "mixamorig:RightArm",
        "mixamorig:RightForeArm",
    ];
    let joints: Vec<_> = names
        .iter()
        .map(|n| scene.build_node(n).with_parent(root).build())
        .collect();
    scene.add_skeleton(Skeleton::new("mixamo", joints));

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(name_of(&scene, b.head_bone), Some("mixamorig:Head"));
    assert_eq!(name_of(&scene, b.left_eye_bone), Some("mixamorig:LeftEye"));
    assert_eq!(name_of(&scene, b.right_eye_bone), Some("mixamorig:RightEye"));
    assert_eq!(name_of(&scene, b.left_upper_arm), Some("mixamorig:LeftArm"));
    assert_eq!(name_of(&scene, b.left_fore_arm), Some("mixamorig:LeftForeArm"));
    assert_eq!(name_of(&scene, b.right_upper_arm), Some("mixamorig:RightArm"));
    assert_eq!(name_of(&scene, b.right_fore_arm), Some("mixamorig:RightForeArm"));
    assert_eq!(b.jaw_bone, None);
    assert_eq!(b.head_mesh, None);
}

#[test]
fn group_nodes_never_bind_bone_roles() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    scene.build_node("Jaw").with_parent(root).build();

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.jaw_bone, None);
}

#[test]
fn first_matching_bone_wins() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    let first = bone(&mut scene, "Jaw_Main", root);
    bone(&mut scene, "Chin", root);

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.jaw_bone, Some(first));
}

#[test]
fn upper_jaw_is_not_a_jaw() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    bone(&mut scene, "UpperJaw", root);
    let lower = bone(&mut scene, "LowerJaw", root);

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.jaw_bone, Some(lower));
}

#[test]
fn side_prefixes_bind_eyes_and_arms() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    let l_eye = bone(&mut scene, "L_Eye", root);
    let r_eye = bone(&mut scene, "R_Eye", root);
    let l_up = bone(&mut scene, "L_UpperArm", root);
    let r_up = bone(&mut scene, "R_UpperArm", root);
    let l_fore = bone(&mut scene, "L_ForeArm", l_up);
    let r_fore = bone(&mut scene, "rig:R_ForeArm", r_up);

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.left_eye_bone, Some(l_eye));
    assert_eq!(b.right_eye_bone, Some(r_eye));
    assert_eq!(b.left_upper_arm, Some(l_up));
    assert_eq!(b.right_upper_arm, Some(r_up));
    assert_eq!(b.left_fore_arm, Some(l_fore));
    assert_eq!(b.right_fore_arm, Some(r_fore));
}

#[test]
fn side_prefix_needs_a_word_boundary() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    // "Model_R_Eye" contains "l_" inside a word; it is a right eye.
    let eye = bone(&mut scene, "Model_R_Eye", root);

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.left_eye_bone, None);
    assert_eq!(b.right_eye_bone, Some(eye));
}

#[test]
fn hair_meshes_collected_in_order() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    let a = scene.build_node("Hair_Back").with_parent(root).with_mesh(Mesh::new()).build();
    let b = scene
        .build_node("Mesh_012")
        .with_parent(root)
        .with_mesh(Mesh::new().with_material("Ponytail_Mat"))
        .build();
    let c = scene.build_node("Bangs").with_parent(root).with_mesh(Mesh::new()).build();

    let binding = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(binding.hair_meshes, vec![a, b, c]);
}

// ============================================================================
// Head mesh priority
// ============================================================================

#[test]
fn named_head_beats_larger_mesh() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    scene
        .build_node("Body")
        .with_parent(root)
        .with_mesh(morph_mesh(&["a", "b", "c", "d", "e", "f"]))
        .build();
    let head = scene
        .build_node("Wolf3D_Head")
        .with_parent(root)
        .with_mesh(morph_mesh(&["jawOpen"]))
        .build();

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.head_mesh, Some(head));
}

#[test]
fn material_match_counts_as_explicit() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    scene
        .build_node("Mesh_A")
        .with_parent(root)
        .with_mesh(morph_mesh(&["mouthOpen", "x", "y", "z"]))
        .build();
    let face = scene
        .build_node("Mesh_B")
        .with_parent(root)
        .with_mesh(morph_mesh(&["k"]).with_material("FaceSkin"))
        .build();

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.head_mesh, Some(face));
}

#[test]
fn mouth_signal_beats_morph_count() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    scene
        .build_node("Mesh_0")
        .with_parent(root)
        .with_mesh(morph_mesh(&["Fat", "Thin", "Tall", "Short"]))
        .build();
    let mouthy = scene
        .build_node("Mesh_1")
        .with_parent(root)
        .with_mesh(morph_mesh(&["MouthOpen"]))
        .build();

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.head_mesh, Some(mouthy));
}

#[test]
fn morph_count_fallback_prefers_earliest_on_ties() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    let first = scene
        .build_node("Mesh_0")
        .with_parent(root)
        .with_mesh(morph_mesh(&["k1", "k2"]))
        .build();
    scene
        .build_node("Mesh_1")
        .with_parent(root)
        .with_mesh(morph_mesh(&["k3", "k4"]))
        .build();
    scene
        .build_node("Mesh_2")
        .with_parent(root)
        .with_mesh(morph_mesh(&["k5"]))
        .build();

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.head_mesh, Some(first));
}

#[test]
fn named_head_without_morphs_is_not_a_head() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    scene.build_node("Head").with_parent(root).with_mesh(Mesh::new()).build();

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.head_mesh, None);
}

#[test]
fn hair_is_never_the_head() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    let hair = scene
        .build_node("HeadHair")
        .with_parent(root)
        .with_mesh(morph_mesh(&["mouthOpen"]))
        .build();

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.head_mesh, None);
    assert_eq!(b.hair_meshes, vec![hair]);
}

#[test]
fn profile_fragments_extend_head_rule() {
    let mut scene = Scene::new();
    let root = scene.build_node("root").build();
    scene
        .build_node("Mesh_0")
        .with_parent(root)
        .with_mesh(morph_mesh(&["mouthOpen", "a", "b"]))
        .build();
    let custom = scene
        .build_node("Kao")
        .with_parent(root)
        .with_mesh(morph_mesh(&["x"]))
        .build();

    let mut overrides = SynonymOverrides::default();
    overrides.roles.insert(Role::Head, vec!["kao".into()]);
    let b = RigResolver::resolve(&scene, root, &SynonymTable::with_overrides(&overrides));
    assert_eq!(b.head_mesh, Some(custom));
}

// ============================================================================
// Idempotence & side effects
// ============================================================================

#[test]
fn resolve_is_idempotent() {
    let mut scene = Scene::new();
    let root = cc_avatar(&mut scene);
    let table = SynonymTable::standard();

    let first = RigResolver::resolve(&scene, root, &table);
    let second = RigResolver::resolve(&scene, root, &table);
    assert_eq!(first, second);
}

#[test]
fn resolve_does_not_touch_the_scene() {
    let mut scene = Scene::new();
    let root = cc_avatar(&mut scene);
    let before: Vec<_> = scene
        .descendants(root)
        .into_iter()
        .map(|h| {
            let n = scene.get_node(h).unwrap();
            (h, n.transform, n.kind, scene.get_mesh(h).and_then(|m| m.material.clone()))
        })
        .collect();

    let _ = RigResolver::resolve(&scene, root, &SynonymTable::standard());

    for (h, transform, kind, material) in before {
        let n = scene.get_node(h).unwrap();
        assert_eq!(n.transform, transform);
        assert_eq!(n.kind, kind);
        assert_eq!(scene.get_mesh(h).and_then(|m| m.material.clone()), material);
    }
}

#[test]
fn empty_avatar_binds_nothing() {
    let mut scene = Scene::new();
    let root = scene.create_node_with_name("Empty", NodeKind::Group);

    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());
    assert_eq!(b.root, Some(root));
    assert_eq!(b.bound_count(), 0);
    assert!(b.hair_meshes.is_empty());
    assert_eq!(
        b,
        RigBinding {
            root: Some(root),
            ..Default::default()
        }
    );
}

#[test]
fn describe_lists_bound_roles_with_names() {
    let mut scene = Scene::new();
    let root = cc_avatar(&mut scene);
    let b = RigResolver::resolve(&scene, root, &SynonymTable::standard());

    let described = b.describe(&scene);
    assert_eq!(described.len(), b.bound_count());
    assert_eq!(described[0], ("head".to_string(), "CC_Base_Body".to_string()));
    assert!(described.contains(&("jaw".to_string(), "CC_Base_JawRoot".to_string())));
}
