//! Rig discovery for loosely standardised character assets.
//!
//! [`RigResolver`] walks a loaded [`Scene`](visage_scene::Scene) once and
//! produces a [`RigBinding`]; [`ChannelMap`] then maps the head mesh's raw
//! morph names onto semantic [`Channel`]s. Both consult the same
//! [`SynonymTable`].

pub mod binding;
pub mod channels;
pub mod resolver;
pub mod synonyms;

pub use binding::RigBinding;
pub use channels::ChannelMap;
pub use resolver::RigResolver;
pub use synonyms::{Channel, MatchRank, NameRule, Role, SynonymOverrides, SynonymTable};
