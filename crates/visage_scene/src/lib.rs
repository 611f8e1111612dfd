//! Minimal scene graph consumed by the Visage rig resolver and animation
//! engine.
//!
//! - [`Scene`]: node storage, hierarchy and component maps
//! - [`Node`]: hierarchy + local [`Transform`]
//! - [`Mesh`] / [`MorphTargets`]: mesh component and its morph capability
//! - [`Skeleton`]: ordered joint list for skinned meshes
//!
//! Asset loading and rendering are not part of this crate; loaders populate
//! a [`Scene`] through its construction helpers.

pub mod mesh;
pub mod node;
pub mod scene;
pub mod skeleton;
pub mod transform;

pub use mesh::{Mesh, MorphTargets};
pub use node::{Node, NodeKind};
pub use scene::{NodeBuilder, Scene};
pub use skeleton::Skeleton;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to a node in a [`Scene`].
    pub struct NodeHandle;
    pub struct SkeletonKey;
}
