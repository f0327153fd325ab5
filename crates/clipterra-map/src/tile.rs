use serde::{Deserialize, Serialize};

/// Texel layouts a tile (and the clip texture array) can have. All tiles of one clipmap share the format of the first tile.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TexelFormat {
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    R16Unorm,
    Rgba16Unorm,
    R32Float,
}

impl TexelFormat {
    pub const fn bytes_per_texel(&self) -> usize {
        match self {
            Self::R8Unorm => 1,
            Self::Rg8Unorm | Self::R16Unorm => 2,
            Self::Rgba8Unorm | Self::Rgba8UnormSrgb | Self::R32Float => 4,
            Self::Rgba16Unorm => 8,
        }
    }
}

/// A decoded tile living in CPU memory. Row 0 is the bottom row of the tile, matching the tile grid's `y` axis.
///
/// Dropping a `TileImage` frees its texels, so it must be kept alive until the GPU has consumed any copy made from it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub format: TexelFormat,
    pub texels: Vec<u8>,
}

impl TileImage {
    pub fn new(width: u32, height: u32, format: TexelFormat, texels: Vec<u8>) -> Self {
        debug_assert_eq!(
            texels.len(),
            width as usize * height as usize * format.bytes_per_texel()
        );
        Self {
            width,
            height,
            format,
            texels,
        }
    }

    /// A tile with every texel byte set to `value`.
    pub fn filled(width: u32, height: u32, format: TexelFormat, value: u8) -> Self {
        let len = width as usize * height as usize * format.bytes_per_texel();
        Self::new(width, height, format, vec![value; len])
    }

    pub fn row_pitch(&self) -> usize {
        self.width as usize * self.format.bytes_per_texel()
    }

    pub fn byte_len(&self) -> usize {
        self.texels.len()
    }
}
