use crate::core::glam::UVec2;
use crate::core::units::TexelUnits;
use crate::{TexelFormat, TileImage};

/// Everything a backend needs to allocate the layered clip texture of one clipmap.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClipArrayDesc {
    pub label: String,
    /// Width and height of every layer.
    pub size: TexelUnits<u32>,
    /// One layer per clip level.
    pub layers: u32,
    pub format: TexelFormat,
}

/// A point in the GPU command stream. Once it has passed, all work submitted before it has finished executing.
pub trait GpuFence {
    /// Must not block.
    fn has_passed(&self) -> bool;
}

/// The GPU services the clipmap depends on.
///
/// The clip texture must be sampled with wraparound (repeat) addressing, since the clip window is stored toroidally.
pub trait GpuBackend {
    type Texture;
    type Fence: GpuFence;

    fn create_clip_array(&mut self, desc: &ClipArrayDesc) -> Self::Texture;

    /// Enqueue an asynchronous copy of the whole `tile` into `layer` at `origin`. The copy may read `tile` at any point
    /// until a fence inserted after this call has passed.
    fn copy_tile(
        &mut self,
        texture: &Self::Texture,
        layer: u32,
        origin: TexelUnits<UVec2>,
        tile: &TileImage,
    );

    /// Fill a `extent × extent` square with the backend's placeholder value.
    fn clear_region(
        &mut self,
        texture: &Self::Texture,
        layer: u32,
        origin: TexelUnits<UVec2>,
        extent: TexelUnits<u32>,
    );

    fn insert_fence(&mut self) -> Self::Fence;
}
