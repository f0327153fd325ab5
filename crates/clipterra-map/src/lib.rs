//! The clipterra virtual texture streaming model.
//!
//! # Virtual Texture
//!
//! A virtual texture is a very large texture (`virtual_size_texels` on a side) that is stored on disk as a mip pyramid of
//! square tiles. Only a small window of each mip level is ever resident on the GPU.
//!
//! # Clip Levels
//!
//! Each resident window is a [`ClipLevel`](crate::ClipLevel): a `clip_tile_count × clip_tile_count` square of tiles centered
//! on the observer, clamped to the level's tile grid. All levels share one layered GPU texture, one layer per level. Level 0
//! is the finest; every coarser level covers twice the area with the same number of tiles.
//!
//! ## Toroidal Addressing
//!
//! Tile `(x, y)` always lands in slot `(x mod clip_tile_count, y mod clip_tile_count)`. When the window slides, the tiles
//! leaving one edge occupy exactly the slots needed by the tiles entering on the opposite edge, so loading a new tile evicts
//! the old one by overwriting it. The GPU samples the layer with wraparound addressing.
//!
//! ## Slot Generations
//!
//! Loads complete asynchronously and in no particular order. Every slot carries a generation counter that is bumped each
//! time the slot is reassigned to a new tile. A request remembers the generation it was issued under, and its completion is
//! only copied to the GPU if the generation still matches.
//!
//! # Deferred Release
//!
//! Tile copies are asynchronous on the GPU, so the CPU-side tile buffers must outlive them. All buffers copied in a frame
//! are parked behind a single fence created after the last copy, and dropped once that fence has passed.

mod address;
mod clipmap;
mod config;
mod fence;
mod gpu;
mod loader;
mod store;
mod tile;

pub use address::*;
pub use clipmap::*;
pub use config::*;
pub use fence::*;
pub use gpu::*;
pub use loader::*;
pub use store::*;
pub use tile::*;

// Re-exports.
pub use clipterra_core as core;
pub use clipterra_core::glam;
