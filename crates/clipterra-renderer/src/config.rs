use crate::QuadtreeError;

use serde::{Deserialize, Serialize};

/// Terrain dimensions and LOD tuning. All distances are in meters.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct LodConfig {
    pub terrain_size_meters: f32,
    /// Vertical extent of every node's bounds, and the scale applied to sampled heights.
    pub terrain_height_meters: f32,
    /// Size of the smallest (leaf) tiles. `terrain_size_meters / tile_size_meters` must be a power of two.
    pub tile_size_meters: f32,
    /// Quads per side of the tile mesh.
    pub tile_quad_count: u32,
    /// The distance within which nodes of LOD 0 are split, before biasing.
    pub lod0_distance: f32,
    /// Each unit of bias doubles every split distance.
    pub lod_bias: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            terrain_size_meters: 8192.0,
            terrain_height_meters: 32.0,
            tile_size_meters: 64.0,
            tile_quad_count: 32,
            lod0_distance: 64.0,
            lod_bias: 2.0,
        }
    }
}

impl LodConfig {
    /// Checks everything except the power-of-two relation of the sizes, which [`Quadtree::build`](crate::Quadtree::build)
    /// checks.
    pub fn validate(&self) -> Result<(), QuadtreeError> {
        for (what, value) in [
            ("terrain size", self.terrain_size_meters),
            ("tile size", self.tile_size_meters),
            ("lod0 distance", self.lod0_distance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(QuadtreeError::InvalidSize { what, value });
            }
        }
        if !(self.terrain_height_meters.is_finite() && self.terrain_height_meters >= 0.0) {
            return Err(QuadtreeError::InvalidSize {
                what: "terrain height",
                value: self.terrain_height_meters,
            });
        }
        if !self.lod_bias.is_finite() {
            return Err(QuadtreeError::NonFiniteBias(self.lod_bias));
        }
        if self.tile_quad_count == 0 {
            return Err(QuadtreeError::ZeroQuadCount);
        }
        Ok(())
    }
}
