use rustc_hash::FxHashMap;

use crate::SkeletonKey;

/// Morph target capability of a mesh.
///
/// Holds the asset's morph-target dictionary (name → index, names unique per
/// mesh) and the live influence array, one weight per target. Influences are
/// conceptually in `[0, 1]` but are not clamped here.
#[derive(Debug, Clone, Default)]
pub struct MorphTargets {
    /// Index → name. `None` for indices the asset left unnamed.
    names: Vec<Option<String>>,
    lookup: FxHashMap<String, usize>,
    influences: Vec<f32>,
}

impl MorphTargets {
    /// Builds the dictionary from names listed in index order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_dictionary(
            names
                .into_iter()
                .enumerate()
                .map(|(index, name)| (name, index)),
        )
    }

    /// Builds the dictionary from `(name, index)` pairs, as exported by
    /// loaders that keep a `targetNames` → index map. Indices may be sparse;
    /// the influence array covers `0..=max_index`.
    pub fn from_dictionary<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut names: Vec<Option<String>> = Vec::new();
        let mut lookup = FxHashMap::default();

        for (name, index) in entries {
            let name = name.into();
            if index >= names.len() {
                names.resize(index + 1, None);
            }
            if lookup.contains_key(&name) {
                log::warn!("Duplicate morph target name '{name}' (index {index}); keeping the first");
                continue;
            }
            lookup.insert(name.clone(), index);
            names[index] = Some(name);
        }

        let influences = vec![0.0; names.len()];
        Self {
            names,
            lookup,
            influences,
        }
    }

    /// Number of influence slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.influences.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.influences.is_empty()
    }

    /// Exact (case-sensitive) dictionary lookup.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).and_then(|n| n.as_deref())
    }

    /// Iterates `(name, index)` in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.names
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_deref().map(|n| (n, i)))
    }

    #[inline]
    #[must_use]
    pub fn influences(&self) -> &[f32] {
        &self.influences
    }

    #[inline]
    pub fn influences_mut(&mut self) -> &mut [f32] {
        &mut self.influences
    }

    #[inline]
    #[must_use]
    pub fn influence(&self, index: usize) -> Option<f32> {
        self.influences.get(index).copied()
    }

    /// Writes one influence. Returns `false` if `index` is out of range.
    pub fn set_influence(&mut self, index: usize, value: f32) -> bool {
        match self.influences.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

/// Mesh component attached to a [`NodeKind::Mesh`](crate::NodeKind) node.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Name of the bound material, if the asset provides one.
    pub material: Option<String>,
    /// Morph target capability. `None` when the mesh has no morph targets.
    pub morph_targets: Option<MorphTargets>,
    /// Skin binding.
    pub skin: Option<SkeletonKey>,
}

impl Mesh {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    #[must_use]
    pub fn with_morph_targets(mut self, morph_targets: MorphTargets) -> Self {
        self.morph_targets = Some(morph_targets);
        self
    }

    #[must_use]
    pub fn with_skin(mut self, skin: SkeletonKey) -> Self {
        self.skin = Some(skin);
        self
    }

    /// Number of morph targets, 0 without the capability.
    #[must_use]
    pub fn morph_count(&self) -> usize {
        self.morph_targets.as_ref().map_or(0, MorphTargets::len)
    }
}
