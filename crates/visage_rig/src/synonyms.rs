//! Declarative synonym table.
//!
//! Every animatable role and semantic channel owns one [`NameRule`]: exact
//! names, ordered `contains` patterns and veto fragments. All matching goes
//! through [`NameRule::rank`], so matching policy lives in data and can be
//! tested without a scene.
//!
//! Matching is case-insensitive. A lower [`MatchRank`] is a better match:
//! any exact name beats any pattern, and earlier patterns beat later ones.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Roles and channels
// ============================================================================

/// Animatable role a scene node can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Mesh carrying the facial morph targets.
    Head,
    /// Neck/head bone receiving head-tracking rotation.
    HeadBone,
    Jaw,
    EyeLeft,
    EyeRight,
    UpperArmLeft,
    UpperArmRight,
    ForeArmLeft,
    ForeArmRight,
    /// Set-valued: every matching mesh is kept.
    Hair,
}

impl Role {
    pub const COUNT: usize = 10;

    pub const ALL: [Role; Self::COUNT] = [
        Role::Head,
        Role::HeadBone,
        Role::Jaw,
        Role::EyeLeft,
        Role::EyeRight,
        Role::UpperArmLeft,
        Role::UpperArmRight,
        Role::ForeArmLeft,
        Role::ForeArmRight,
        Role::Hair,
    ];

    /// Bone roles in classification order: a bone claims the first role
    /// here whose rule matches, so specific roles come before generic ones.
    pub const BONE_ROLES: [Role; 8] = [
        Role::Jaw,
        Role::EyeLeft,
        Role::EyeRight,
        Role::ForeArmLeft,
        Role::ForeArmRight,
        Role::UpperArmLeft,
        Role::UpperArmRight,
        Role::HeadBone,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Role::Head => "head",
            Role::HeadBone => "headBone",
            Role::Jaw => "jaw",
            Role::EyeLeft => "eyeLeft",
            Role::EyeRight => "eyeRight",
            Role::UpperArmLeft => "upperArmLeft",
            Role::UpperArmRight => "upperArmRight",
            Role::ForeArmLeft => "foreArmLeft",
            Role::ForeArmRight => "foreArmRight",
            Role::Hair => "hair",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Semantic animation channel, independent of any asset's morph naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    JawOpen,
    MouthOpen,
    BlinkLeft,
    BlinkRight,
    Smile,
    VisemeAA,
    VisemeE,
    VisemeI,
    VisemeO,
    VisemeU,
    VisemeWide,
    VisemePucker,
    VisemeCH,
    VisemeDD,
    VisemeFF,
    VisemeKK,
    VisemePP,
    VisemeSS,
    VisemeTH,
    VisemeRR,
    VisemeSil,
}

impl Channel {
    pub const COUNT: usize = 21;

    pub const ALL: [Channel; Self::COUNT] = [
        Channel::JawOpen,
        Channel::MouthOpen,
        Channel::BlinkLeft,
        Channel::BlinkRight,
        Channel::Smile,
        Channel::VisemeAA,
        Channel::VisemeE,
        Channel::VisemeI,
        Channel::VisemeO,
        Channel::VisemeU,
        Channel::VisemeWide,
        Channel::VisemePucker,
        Channel::VisemeCH,
        Channel::VisemeDD,
        Channel::VisemeFF,
        Channel::VisemeKK,
        Channel::VisemePP,
        Channel::VisemeSS,
        Channel::VisemeTH,
        Channel::VisemeRR,
        Channel::VisemeSil,
    ];

    /// Position in [`Channel::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Channel::JawOpen => "jawOpen",
            Channel::MouthOpen => "mouthOpen",
            Channel::BlinkLeft => "blinkLeft",
            Channel::BlinkRight => "blinkRight",
            Channel::Smile => "smile",
            Channel::VisemeAA => "visemeAA",
            Channel::VisemeE => "visemeE",
            Channel::VisemeI => "visemeI",
            Channel::VisemeO => "visemeO",
            Channel::VisemeU => "visemeU",
            Channel::VisemeWide => "visemeWide",
            Channel::VisemePucker => "visemePucker",
            Channel::VisemeCH => "visemeCH",
            Channel::VisemeDD => "visemeDD",
            Channel::VisemeFF => "visemeFF",
            Channel::VisemeKK => "visemeKK",
            Channel::VisemePP => "visemePP",
            Channel::VisemeSS => "visemeSS",
            Channel::VisemeTH => "visemeTH",
            Channel::VisemeRR => "visemeRR",
            Channel::VisemeSil => "visemeSil",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_blink(self) -> bool {
        matches!(self, Channel::BlinkLeft | Channel::BlinkRight)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Quality of a match; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchRank {
    Exact,
    /// Index of the first `contains` pattern that matched.
    Pattern(usize),
}

/// Ordered matching rule for one role or channel.
///
/// Stored lowercase; callers pass lowercase text to [`rank`](Self::rank).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRule {
    exact: Vec<String>,
    /// Each pattern matches when all its fragments are present.
    contains: Vec<Vec<String>>,
    /// Any of these vetoes a pattern match. Exact names are never vetoed.
    exclude: Vec<String>,
}

impl NameRule {
    #[must_use]
    pub fn new(exact: &[&str], contains: &[&[&str]], exclude: &[&str]) -> Self {
        Self {
            exact: exact.iter().map(|s| s.to_lowercase()).collect(),
            contains: contains
                .iter()
                .map(|p| p.iter().map(|s| s.to_lowercase()).collect())
                .collect(),
            exclude: exclude.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Appends a single-fragment pattern after the existing ones.
    pub fn push_fragment(&mut self, fragment: &str) {
        let fragment = fragment.to_lowercase();
        if !fragment.is_empty() {
            self.contains.push(vec![fragment]);
        }
    }

    pub fn push_exact(&mut self, name: &str) {
        let name = name.to_lowercase();
        if !name.is_empty() {
            self.exact.push(name);
        }
    }

    /// Ranks `text` (already lowercase) against this rule.
    #[must_use]
    pub fn rank(&self, text: &str) -> Option<MatchRank> {
        if text.is_empty() {
            return None;
        }
        if self.exact.iter().any(|e| e == text) {
            return Some(MatchRank::Exact);
        }
        if self.exclude.iter().any(|x| has_fragment(text, x)) {
            return None;
        }
        self.contains
            .iter()
            .position(|pattern| pattern.iter().all(|f| has_fragment(text, f)))
            .map(MatchRank::Pattern)
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.rank(text).is_some()
    }
}

/// Substring test. A leading `^` anchors the fragment to the start of the
/// text or to just after a non-alphanumeric separator (`l_eye`, `rig:l_eye`,
/// but not `model_r_eye`).
fn has_fragment(text: &str, fragment: &str) -> bool {
    let Some(anchored) = fragment.strip_prefix('^') else {
        return text.contains(fragment);
    };
    text.match_indices(anchored).any(|(at, _)| {
        text[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}

/// Extra fragments supplied by an avatar profile, appended to the standard
/// rules.
///
/// Role entries become single-fragment `contains` patterns; channel entries
/// become extra exact morph names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymOverrides {
    pub roles: BTreeMap<Role, Vec<String>>,
    pub channels: BTreeMap<Channel, Vec<String>>,
}

impl SynonymOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.values().all(Vec::is_empty) && self.channels.values().all(Vec::is_empty)
    }
}

// ============================================================================
// Table
// ============================================================================

/// Complete matching data for roles, channels and the head-like morph signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    roles: Vec<NameRule>,
    channels: Vec<NameRule>,
    /// Morph keys containing any of these make a mesh look like a head.
    head_signal: Vec<String>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self::standard()
    }
}

const SIDE_LEFT: [&str; 4] = ["left", "_l", ".l", "^l_"];
const SIDE_RIGHT: [&str; 4] = ["right", "_r", ".r", "^r_"];
/// Vetoes for the opposite side: its word and its anchored prefix.
const NOT_LEFT: [&str; 2] = ["right", "^r_"];
const NOT_RIGHT: [&str; 2] = ["left", "^l_"];

fn sided(stems: &[&str], sides: &[&str]) -> Vec<Vec<String>> {
    stems
        .iter()
        .flat_map(|stem| sides.iter().map(move |side| vec![(*stem).to_string(), (*side).to_string()]))
        .collect()
}

fn sided_rule(stems: &[&str], sides: &[&str], exclude: &[&str]) -> NameRule {
    NameRule {
        exact: Vec::new(),
        contains: sided(stems, sides),
        exclude: exclude.iter().map(|s| (*s).to_string()).collect(),
    }
}

impl SynonymTable {
    /// The built-in table covering ARKit, Ready Player Me / Oculus visemes,
    /// VRM, VRChat/MMD, Mixamo and Character Creator naming.
    #[must_use]
    pub fn standard() -> Self {
        let eye_excl = ["lash", "lid", "brow", "occlusion", "tearline", "cornea"];
        let upper_excl = ["twist", "fore", "lower", "hand", "finger"];
        let fore_excl = ["twist", "hand", "finger"];
        let arm: &[&str] = &["upperarm", "upper_arm", "arm"];
        let fore: &[&str] = &["forearm", "fore_arm", "lowerarm", "lower_arm"];

        let roles = Role::ALL
            .iter()
            .map(|role| match role {
                Role::Head => NameRule::new(
                    &[],
                    &[&["head"], &["face"], &["skin_head"]],
                    &["hair", "eyelash", "brow", "teeth", "tongue", "occlusion", "tearline"],
                ),
                Role::HeadBone => NameRule::new(&[], &[&["head"]], &["end", "top", "nub"]),
                Role::Jaw => NameRule::new(&[], &[&["jaw"], &["chin"]], &["upper"]),
                Role::EyeLeft => {
                    sided_rule(&["eye"], &SIDE_LEFT, &[&eye_excl[..], &NOT_LEFT].concat())
                }
                Role::EyeRight => {
                    sided_rule(&["eye"], &SIDE_RIGHT, &[&eye_excl[..], &NOT_RIGHT].concat())
                }
                Role::UpperArmLeft => {
                    sided_rule(arm, &SIDE_LEFT, &[&upper_excl[..], &NOT_LEFT].concat())
                }
                Role::UpperArmRight => {
                    sided_rule(arm, &SIDE_RIGHT, &[&upper_excl[..], &NOT_RIGHT].concat())
                }
                Role::ForeArmLeft => {
                    sided_rule(fore, &SIDE_LEFT, &[&fore_excl[..], &NOT_LEFT].concat())
                }
                Role::ForeArmRight => {
                    sided_rule(fore, &SIDE_RIGHT, &[&fore_excl[..], &NOT_RIGHT].concat())
                }
                Role::Hair => NameRule::new(
                    &[],
                    &[&["hair"], &["bang"], &["ponytail"], &["obj_default"]],
                    &[],
                ),
            })
            .collect();

        let channels = Channel::ALL.iter().map(|c| standard_channel_rule(*c)).collect();

        Self {
            roles,
            channels,
            head_signal: ["mouth", "jaw", "viseme", "lip"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Standard table plus profile overrides.
    #[must_use]
    pub fn with_overrides(overrides: &SynonymOverrides) -> Self {
        let mut table = Self::standard();
        table.apply_overrides(overrides);
        table
    }

    pub fn apply_overrides(&mut self, overrides: &SynonymOverrides) {
        for (role, fragments) in &overrides.roles {
            let rule = &mut self.roles[*role as usize];
            for f in fragments {
                rule.push_fragment(f);
            }
        }
        for (channel, names) in &overrides.channels {
            let rule = &mut self.channels[channel.index()];
            for n in names {
                rule.push_exact(n);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn role_rule(&self, role: Role) -> &NameRule {
        &self.roles[role as usize]
    }

    #[inline]
    #[must_use]
    pub fn channel_rule(&self, channel: Channel) -> &NameRule {
        &self.channels[channel.index()]
    }

    /// Classifies lowercase `text` against `candidates`, returning the first
    /// candidate (in the given order) whose rule matches.
    #[must_use]
    pub fn classify(&self, text: &str, candidates: &[Role]) -> Option<(Role, MatchRank)> {
        candidates
            .iter()
            .find_map(|&role| self.role_rule(role).rank(text).map(|rank| (role, rank)))
    }

    /// Whether a lowercase morph key hints at a face (mouth, jaw, visemes).
    #[must_use]
    pub fn is_head_signal(&self, morph_key: &str) -> bool {
        self.head_signal.iter().any(|f| morph_key.contains(f.as_str()))
    }
}

fn viseme_rule(exact: &[&str], code: &str) -> NameRule {
    NameRule::new(exact, &[&["viseme", code]], &[])
}

fn standard_channel_rule(channel: Channel) -> NameRule {
    let blink_excl_left = ["right", "_r", "mouth", "brow"];
    let blink_excl_right = ["left", "_l", "mouth", "brow"];

    match channel {
        Channel::JawOpen => NameRule::new(
            &["jawopen", "jaw_open", "jaw open", "fcl_mth_a_jaw"],
            &[&["jaw", "open"], &["jaw", "down"]],
            &["forward", "left", "right"],
        ),
        Channel::MouthOpen => NameRule::new(
            &["mouthopen", "mouth_open", "mouth open", "fcl_mth_open"],
            &[&["mouth", "open"], &["mth", "open"]],
            &[],
        ),
        Channel::BlinkLeft => NameRule::new(
            &[
                "eyeblinkleft",
                "eyeblink_l",
                "blink_left",
                "blink_l",
                "eye_blink_l",
                "fcl_eye_close_l",
                "eyes_closed_l",
            ],
            &[
                &["blink", "left"],
                &["blink", "_l"],
                &["close", "left"],
                &["close", "_l"],
                &["blink"],
                &["eyes_closed"],
                &["eyesclosed"],
                &["eye_close"],
            ],
            &blink_excl_left,
        ),
        Channel::BlinkRight => NameRule::new(
            &[
                "eyeblinkright",
                "eyeblink_r",
                "blink_right",
                "blink_r",
                "eye_blink_r",
                "fcl_eye_close_r",
                "eyes_closed_r",
            ],
            &[
                &["blink", "right"],
                &["blink", "_r"],
                &["close", "right"],
                &["close", "_r"],
                &["blink"],
                &["eyes_closed"],
                &["eyesclosed"],
                &["eye_close"],
            ],
            &blink_excl_right,
        ),
        Channel::Smile => NameRule::new(
            &["mouthsmile", "mouth_smile", "smile", "fcl_mth_joy", "happy"],
            &[&["mouth", "smile"], &["smile"], &["joy"], &["happy"]],
            &["eye", "brow"],
        ),
        Channel::VisemeAA => NameRule::new(
            &["viseme_aa", "vrc.v_aa", "v_aa", "aa", "a", "fcl_mth_a", "mouth_a"],
            &[&["viseme", "aa"], &["mth_a"]],
            &[],
        ),
        Channel::VisemeE => NameRule::new(
            &["viseme_e", "vrc.v_e", "v_e", "ee", "e", "fcl_mth_e", "mouth_e"],
            &[&["viseme_e"], &["mth_e"]],
            &[],
        ),
        Channel::VisemeI => NameRule::new(
            &["viseme_i", "vrc.v_ih", "v_ih", "ih", "i", "fcl_mth_i", "mouth_i"],
            &[&["viseme_i"], &["v_ih"], &["mth_i"]],
            &[],
        ),
        Channel::VisemeO => NameRule::new(
            &["viseme_o", "vrc.v_oh", "v_oh", "oh", "o", "fcl_mth_o", "mouth_o"],
            &[&["viseme_o"], &["v_oh"], &["mth_o"]],
            &[],
        ),
        Channel::VisemeU => NameRule::new(
            &["viseme_u", "vrc.v_ou", "v_ou", "ou", "u", "fcl_mth_u", "mouth_u"],
            &[&["viseme_u"], &["v_ou"], &["mth_u"]],
            &[],
        ),
        Channel::VisemeWide => NameRule::new(
            &["mouthstretch", "mouth_stretch", "mouthwide", "mouth_wide"],
            &[&["mouth", "stretch"], &["mouth", "wide"], &["wide"]],
            &["eye"],
        ),
        Channel::VisemePucker => NameRule::new(
            &["mouthpucker", "mouth_pucker", "mouthfunnel", "mouth_funnel"],
            &[&["pucker"], &["funnel"], &["kiss"]],
            &[],
        ),
        Channel::VisemeCH => viseme_rule(&["viseme_ch", "vrc.v_ch", "v_ch"], "ch"),
        Channel::VisemeDD => viseme_rule(&["viseme_dd", "vrc.v_dd", "v_dd"], "dd"),
        Channel::VisemeFF => viseme_rule(&["viseme_ff", "vrc.v_ff", "v_ff"], "ff"),
        Channel::VisemeKK => viseme_rule(&["viseme_kk", "vrc.v_kk", "v_kk"], "kk"),
        Channel::VisemePP => viseme_rule(&["viseme_pp", "vrc.v_pp", "v_pp"], "pp"),
        Channel::VisemeSS => viseme_rule(&["viseme_ss", "vrc.v_ss", "v_ss"], "ss"),
        Channel::VisemeTH => viseme_rule(&["viseme_th", "vrc.v_th", "v_th"], "th"),
        Channel::VisemeRR => viseme_rule(&["viseme_rr", "vrc.v_rr", "v_rr"], "rr"),
        Channel::VisemeSil => viseme_rule(&["viseme_sil", "vrc.v_sil", "v_sil", "sil"], "sil"),
    }
}
