//! Clipmapped terrain: a streamed virtual texture per surface attribute, drawn over a quadtree of LOD tiles.
//!
//! [`Terrain`] ties together the [`clipterra_renderer::LodSelector`], which decides which tiles to draw, and one
//! [`clipterra_map::Clipmap`] per streamed texture, which keeps the texels around the eye resident on the GPU.

mod config;
mod draw;
mod terrain;

pub use config::{Config, NamedClipmapConfig};
pub use draw::{DrawSubmitter, RecordedDraw, RecordedDraws};
pub use terrain::{directory_store, FrameReport, Terrain};

// Re-exports.
pub use clipterra_map as map;
pub use clipterra_renderer as renderer;

use clipterra_map::ClipmapError;
use clipterra_renderer::QuadtreeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error(transparent)]
    Lod(#[from] QuadtreeError),
    #[error("clipmap {name:?}: {source}")]
    Clipmap { name: String, source: ClipmapError },
}
