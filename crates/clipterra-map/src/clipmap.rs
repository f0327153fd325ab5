mod level;

pub use level::*;

use crate::core::glam::Vec2;
use crate::core::units::TexelUnits;
use crate::{
    tile_file_locator, AssetStore, ClipArrayDesc, ClipmapConfig, ClipmapLayout, Completion, ConfigError,
    FenceReleaseQueue, FetchError, GpuBackend, TexelFormat, TileAddress, TileImage, TileLoader,
};

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ClipmapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to fetch bootstrap tile {locator}: {source}")]
    Bootstrap { locator: String, source: FetchError },
    #[error("tile {address:?} is {width}x{height}, but every tile must be {expected}x{expected}")]
    TileSizeMismatch {
        address: TileAddress,
        expected: u32,
        width: u32,
        height: u32,
    },
    #[error("tile {address:?} has format {found:?}, but the clip texture is {expected:?}")]
    TileFormatMismatch {
        address: TileAddress,
        expected: TexelFormat,
        found: TexelFormat,
    },
}

/// What happened during one [`Clipmap::tick`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClipmapFrameStats {
    /// Tile buffers dropped because their fence passed.
    pub released: usize,
    /// Tiles copied into the clip texture.
    pub copied: usize,
    /// Completions (and retries) dropped because their slot was reassigned.
    pub stale: usize,
    /// Failed fetches that were reissued.
    pub retried: usize,
    /// Slots that gave up and were cleared to the placeholder.
    pub missing: usize,
    /// New tiles requested by the window update.
    pub requested: usize,
    /// Whether this frame's copies were put behind a new fence.
    pub fenced: bool,
}

/// A streamed virtual texture: one [`ClipLevel`] per layer of a GPU texture array, fed by a [`TileLoader`].
pub struct Clipmap<S, G: GpuBackend> {
    layout: ClipmapLayout,
    format: TexelFormat,
    texture: G::Texture,
    levels: Vec<ClipLevel>,
    loader: TileLoader<S>,
    release_queue: FenceReleaseQueue<G::Fence, TileImage>,
}

impl<S: AssetStore, G: GpuBackend> Clipmap<S, G> {
    /// Fetches the first tile of the finest level (blocking) to learn the tile size and texel format, then allocates the
    /// clip texture array. Nothing is requested until the first [`tick`](Self::tick).
    pub fn new(config: &ClipmapConfig, store: S, gpu: &mut G) -> Result<Self, ClipmapError> {
        let locator = tile_file_locator(&config.texture_root, 0, 0, 0);
        let first = store
            .fetch_blocking(&locator)
            .map_err(|source| ClipmapError::Bootstrap {
                locator: locator.clone(),
                source,
            })?;
        if first.width != first.height {
            return Err(ConfigError::NonSquareTile {
                width: first.width,
                height: first.height,
            }
            .into());
        }

        let layout = ClipmapLayout::new(
            config.virtual_size_texels,
            config.clip_size_texels,
            first.width,
        )?;
        let texture = gpu.create_clip_array(&ClipArrayDesc {
            label: format!("clipmap {}", config.texture_root),
            size: TexelUnits(layout.clip_size_texels()),
            layers: layout.level_count(),
            format: first.format,
        });
        let levels = (0..layout.level_count())
            .map(|i| ClipLevel::new(i, layout.grid_size(i), layout.clip_tile_count()))
            .collect();

        log::info!(
            "Created clipmap {:?}: {} levels of {}x{} tiles, {} texels per tile, {:?}",
            config.texture_root,
            layout.level_count(),
            layout.clip_tile_count(),
            layout.clip_tile_count(),
            layout.tile_size_texels(),
            first.format,
        );

        Ok(Self {
            layout,
            format: first.format,
            texture,
            levels,
            loader: TileLoader::new(store, config.texture_root.clone(), layout, config.loader),
            release_queue: FenceReleaseQueue::new(),
        })
    }

    /// Runs one frame of streaming for an observer at `norm` (in `[0, 1]²` of the virtual texture):
    ///
    /// 1. drop tile buffers whose fence has passed
    /// 2. copy completed tiles into the clip texture, or schedule retries for failed ones
    /// 3. reissue retries whose backoff has elapsed
    /// 4. slide every level's window and request the tiles that entered it
    /// 5. fence this frame's copies
    ///
    /// An `Err` means a tile violated the clipmap's layout, which the caller should treat as fatal.
    pub fn tick(&mut self, norm: Vec2, gpu: &mut G) -> Result<ClipmapFrameStats, ClipmapError> {
        let mut stats = ClipmapFrameStats::default();
        self.loader.begin_frame();

        stats.released = self.release_passed();
        self.apply_completions(gpu, &mut stats)?;
        self.issue_due_retries(&mut stats);
        stats.requested = self.update_tiles(norm);
        stats.fenced = self.submit_fence(gpu);

        Ok(stats)
    }

    /// Slides each level's window toward `norm`, coarsest level first, and requests the tiles that entered it. Returns the
    /// number of requests.
    pub fn update_tiles(&mut self, norm: Vec2) -> usize {
        let mut num_requested = 0;
        for level in self.levels.iter_mut().rev() {
            let requests = level.update(norm);
            if !requests.is_empty() {
                log::debug!(
                    "Clip level {} moved to {:?}; requesting {} tiles",
                    level.index(),
                    level.loaded_region(),
                    requests.len()
                );
            }
            num_requested += requests.len();
            for request in requests {
                self.loader.load_async(request);
            }
        }
        num_requested
    }

    /// Drops the tile buffers of every fence that has passed.
    pub fn release_passed(&mut self) -> usize {
        self.release_queue.release_passed()
    }

    /// Fences all tile copies enqueued since the last fence. Returns `false` if there weren't any.
    pub fn submit_fence(&mut self, gpu: &mut G) -> bool {
        self.release_queue.submit(|| gpu.insert_fence())
    }

    fn apply_completions(
        &mut self,
        gpu: &mut G,
        stats: &mut ClipmapFrameStats,
    ) -> Result<(), ClipmapError> {
        let tile_size = self.layout.tile_size_texels();

        for Completion { request, result } in self.loader.drain() {
            let level = &mut self.levels[request.address.level as usize];
            if !level.is_current(request.slot, request.generation) {
                stats.stale += 1;
                continue;
            }

            let origin = TexelUnits(request.slot.into_inner() * tile_size);
            match result {
                Ok(tile) => {
                    check_tile(request.address, &tile, tile_size, self.format)?;
                    gpu.copy_tile(&self.texture, request.address.level, origin, &tile);
                    level.mark_resident(request.slot);
                    self.release_queue.stage(tile);
                    stats.copied += 1;
                }
                Err(error) => {
                    if self.loader.schedule_retry(request) {
                        log::warn!(
                            "Failed to load tile {:?} (attempt {}): {}; retrying",
                            request.address,
                            request.attempt,
                            error
                        );
                    } else {
                        log::warn!(
                            "Giving up on tile {:?} after {} attempts: {}",
                            request.address,
                            request.attempt + 1,
                            error
                        );
                        level.mark_missing(request.slot);
                        gpu.clear_region(&self.texture, request.address.level, origin, TexelUnits(tile_size));
                        stats.missing += 1;
                    }
                }
            }
        }

        if stats.stale > 0 {
            log::debug!("Dropped {} stale tile completions", stats.stale);
        }

        Ok(())
    }

    fn issue_due_retries(&mut self, stats: &mut ClipmapFrameStats) {
        for request in self.loader.take_due_retries() {
            if self.levels[request.address.level as usize].is_current(request.slot, request.generation) {
                self.loader.load_async(request);
                stats.retried += 1;
            } else {
                stats.stale += 1;
            }
        }
    }

    pub fn layout(&self) -> &ClipmapLayout {
        &self.layout
    }

    pub fn format(&self) -> TexelFormat {
        self.format
    }

    pub fn texture(&self) -> &G::Texture {
        &self.texture
    }

    /// Finest level first.
    pub fn levels(&self) -> &[ClipLevel] {
        &self.levels
    }

    pub fn loader(&self) -> &TileLoader<S> {
        &self.loader
    }

    pub fn release_queue(&self) -> &FenceReleaseQueue<G::Fence, TileImage> {
        &self.release_queue
    }
}

fn check_tile(
    address: TileAddress,
    tile: &TileImage,
    tile_size: u32,
    format: TexelFormat,
) -> Result<(), ClipmapError> {
    if tile.width != tile_size || tile.height != tile_size {
        return Err(ClipmapError::TileSizeMismatch {
            address,
            expected: tile_size,
            width: tile.width,
            height: tile.height,
        });
    }
    if tile.format != format {
        return Err(ClipmapError::TileFormatMismatch {
            address,
            expected: format,
            found: tile.format,
        });
    }
    Ok(())
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
