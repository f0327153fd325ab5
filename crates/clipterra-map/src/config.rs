use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Describes one virtual texture and how it is streamed. Tile size is not configured; it is read from the first tile.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ClipmapConfig {
    /// Prefix of every tile locator.
    pub texture_root: String,
    pub virtual_size_texels: u32,
    pub clip_size_texels: u32,
    pub loader: LoaderConfig,
}

impl Default for ClipmapConfig {
    fn default() -> Self {
        Self {
            texture_root: String::new(),
            virtual_size_texels: 16 * 1024,
            clip_size_texels: 2048,
            loader: LoaderConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// How many times a failed tile fetch is retried before the slot is marked missing.
    pub max_retries: u32,
    /// The delay before the first retry. Each subsequent retry doubles it.
    pub retry_backoff_frames: u32,
    /// Requests still outstanding after this many frames are abandoned and treated as failed.
    pub request_timeout_frames: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff_frames: 2,
            request_timeout_frames: 300,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ConfigError {
    #[error("{what} must be nonzero")]
    ZeroSize { what: &'static str },
    #[error("tiles must be square, got {width}x{height}")]
    NonSquareTile { width: u32, height: u32 },
    #[error("{what} ({size}) is not a multiple of the tile size ({tile_size})")]
    NotTileMultiple {
        what: &'static str,
        size: u32,
        tile_size: u32,
    },
    #[error("clip size ({clip_size}) must be smaller than the virtual size ({virtual_size})")]
    ClipNotSmaller { clip_size: u32, virtual_size: u32 },
    #[error("virtual size ({virtual_size}) / clip size ({clip_size}) is not a power of two")]
    RatioNotPowerOfTwo { virtual_size: u32, clip_size: u32 },
}

/// The validated, immutable shape of a clipmap.
///
/// Guarantees:
/// - `virtual_size = virtual_tile_count * tile_size`
/// - `clip_size = clip_tile_count * tile_size`
/// - `virtual_size = clip_size * 2^level_count`, with `level_count >= 1`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClipmapLayout {
    virtual_size_texels: u32,
    clip_size_texels: u32,
    tile_size_texels: u32,
    virtual_tile_count: u32,
    clip_tile_count: u32,
    level_count: u32,
}

impl ClipmapLayout {
    pub fn new(
        virtual_size_texels: u32,
        clip_size_texels: u32,
        tile_size_texels: u32,
    ) -> Result<Self, ConfigError> {
        for (what, size) in [
            ("virtual size", virtual_size_texels),
            ("clip size", clip_size_texels),
            ("tile size", tile_size_texels),
        ] {
            if size == 0 {
                return Err(ConfigError::ZeroSize { what });
            }
        }
        for (what, size) in [
            ("virtual size", virtual_size_texels),
            ("clip size", clip_size_texels),
        ] {
            if size % tile_size_texels != 0 {
                return Err(ConfigError::NotTileMultiple {
                    what,
                    size,
                    tile_size: tile_size_texels,
                });
            }
        }
        if clip_size_texels >= virtual_size_texels {
            return Err(ConfigError::ClipNotSmaller {
                clip_size: clip_size_texels,
                virtual_size: virtual_size_texels,
            });
        }
        let ratio = virtual_size_texels / clip_size_texels;
        if virtual_size_texels % clip_size_texels != 0 || !ratio.is_power_of_two() {
            return Err(ConfigError::RatioNotPowerOfTwo {
                virtual_size: virtual_size_texels,
                clip_size: clip_size_texels,
            });
        }

        Ok(Self {
            virtual_size_texels,
            clip_size_texels,
            tile_size_texels,
            virtual_tile_count: virtual_size_texels / tile_size_texels,
            clip_tile_count: clip_size_texels / tile_size_texels,
            level_count: ratio.trailing_zeros(),
        })
    }

    #[inline]
    pub fn virtual_size_texels(&self) -> u32 {
        self.virtual_size_texels
    }

    #[inline]
    pub fn clip_size_texels(&self) -> u32 {
        self.clip_size_texels
    }

    #[inline]
    pub fn tile_size_texels(&self) -> u32 {
        self.tile_size_texels
    }

    #[inline]
    pub fn virtual_tile_count(&self) -> u32 {
        self.virtual_tile_count
    }

    #[inline]
    pub fn clip_tile_count(&self) -> u32 {
        self.clip_tile_count
    }

    /// Also the number of layers in the clip texture array.
    #[inline]
    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    /// The side length of the tile grid at `level`.
    #[inline]
    pub fn grid_size(&self, level: u32) -> u32 {
        self.virtual_tile_count >> level
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
