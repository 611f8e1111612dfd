use smallvec::SmallVec;
use visage_scene::{MorphTargets, NodeHandle, Scene};

use crate::synonyms::{Channel, MatchRank, SynonymTable};

/// Semantic channel → morph index for one specific head mesh.
///
/// Channels the asset does not provide are simply absent. Entries are kept in
/// [`Channel::ALL`] order. Indices are only valid for the mesh the map was
/// built from; [`assert_matches`](Self::assert_matches) guards that.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMap {
    mesh: Option<NodeHandle>,
    target_count: usize,
    entries: SmallVec<[(Channel, usize); 16]>,
}

impl ChannelMap {
    /// Builds the map for the head mesh `mesh`. A node without the morph
    /// capability yields an empty map.
    #[must_use]
    pub fn build(scene: &Scene, mesh: NodeHandle, table: &SynonymTable) -> Self {
        let mut map = scene
            .morph_targets(mesh)
            .map(|morphs| Self::from_morph_targets(morphs, table))
            .unwrap_or_default();
        map.mesh = Some(mesh);
        map
    }

    /// Builds the map from a bare morph dictionary.
    ///
    /// Matches are assigned best first: exact names before fragment matches,
    /// earlier fragment patterns before later ones, then channel order, then
    /// the lowest morph index. A morph key claimed by one channel is not
    /// handed to another, so a channel that loses its best key falls back to
    /// its next match. The two blink channels are the exception and may share
    /// one bilateral key.
    #[must_use]
    pub fn from_morph_targets(morphs: &MorphTargets, table: &SynonymTable) -> Self {
        let mut candidates: Vec<(MatchRank, Channel, usize)> = Vec::new();
        for (name, index) in morphs.iter() {
            let key = name.to_lowercase();
            for channel in Channel::ALL {
                if let Some(rank) = table.channel_rule(channel).rank(&key) {
                    candidates.push((rank, channel, index));
                }
            }
        }
        candidates.sort_unstable();

        let mut entries: SmallVec<[(Channel, usize); 16]> = SmallVec::new();
        for (_, channel, index) in candidates {
            if entries.iter().any(|(c, _)| *c == channel) {
                continue;
            }
            let shared = entries
                .iter()
                .any(|(c, i)| *i == index && !(c.is_blink() && channel.is_blink()));
            if shared {
                continue;
            }
            entries.push((channel, index));
        }
        entries.sort_unstable_by_key(|(c, _)| c.index());

        Self {
            mesh: None,
            target_count: morphs.len(),
            entries,
        }
    }

    #[must_use]
    pub fn get(&self, channel: Channel) -> Option<usize> {
        self.entries
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, i)| *i)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, channel: Channel) -> bool {
        self.get(channel).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, usize)> + '_ {
        self.entries.iter().copied()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Head mesh this map was built for.
    #[inline]
    #[must_use]
    pub fn mesh(&self) -> Option<NodeHandle> {
        self.mesh
    }

    /// Morph target count of the mesh at build time.
    #[inline]
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Labels of the mapped channels, in channel order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(c, _)| c.label().to_string())
            .collect()
    }

    /// Panics if the map is used against a mesh other than the one it was
    /// built from, or if that mesh's influence array changed length.
    pub fn assert_matches(&self, mesh: NodeHandle, influence_count: usize) {
        assert!(
            self.mesh == Some(mesh),
            "channel map built for {:?} used against {:?}",
            self.mesh,
            mesh
        );
        assert!(
            influence_count == self.target_count,
            "channel map built for {} morph targets, mesh now has {}",
            self.target_count,
            influence_count
        );
    }
}
