//! Level-of-detail selection for clipmapped terrain.
//!
//! The terrain is a square of `terrain_size_meters` covered by a static [`Quadtree`]. Every node is drawn with the same unit
//! [`TileMesh`], scaled to the node's size by its [`DrawInstance`]. Each frame the [`LodSelector`] walks the tree from the
//! root and keeps splitting nodes while the eye is close enough for their LOD, so the terrain is drawn with small tiles
//! nearby and large tiles far away, without gaps or overlaps.

mod config;
mod instance;
mod material;
mod mesh;
mod quadtree;
mod select;

pub use config::*;
pub use instance::*;
pub use material::*;
pub use mesh::*;
pub use quadtree::*;
pub use select::*;

// Re-exports.
pub use clipterra_core as core;
pub use clipterra_core::glam;
