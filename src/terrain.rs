use crate::{Config, DrawSubmitter, NamedClipmapConfig, TerrainError};

use clipterra_map::core::geometry::Frustum;
use clipterra_map::glam::{Mat4, Vec2, Vec3};
use clipterra_map::{AssetStore, Clipmap, ClipmapFrameStats, DirectoryTileSource, GpuBackend, ThreadedAssetStore};
use clipterra_renderer::{DrawInstance, LodConfig, LodSelector, TerrainMaterial, TileMesh};
use std::path::Path;

/// A [`ThreadedAssetStore`] reading the PNG tiles of `clipmap` from under `base_dir`.
pub fn directory_store(
    base_dir: impl AsRef<Path>,
    clipmap: &NamedClipmapConfig,
    num_workers: usize,
) -> std::io::Result<ThreadedAssetStore<DirectoryTileSource>> {
    let base_dir = base_dir.as_ref();
    let source = if clipmap.srgb {
        DirectoryTileSource::new(base_dir)
    } else {
        DirectoryTileSource::linear(base_dir)
    };
    ThreadedAssetStore::new(source, num_workers)
}

/// What one [`Terrain::frame`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub instance_count: usize,
    pub draw_count: usize,
    /// In configuration order.
    pub clipmaps: Vec<(String, ClipmapFrameStats)>,
}

struct NamedClipmap<S, G: GpuBackend> {
    name: String,
    clipmap: Clipmap<S, G>,
}

pub struct Terrain<S, G: GpuBackend> {
    lod: LodConfig,
    selector: LodSelector,
    mesh: TileMesh,
    materials: Vec<TerrainMaterial>,
    clipmaps: Vec<NamedClipmap<S, G>>,
    instances: Vec<DrawInstance>,
}

impl<S: AssetStore, G: GpuBackend> Terrain<S, G> {
    /// Builds the quadtree and tile mesh, then bootstraps every clipmap with a store made by `make_store`. This blocks on
    /// the first tile of each clipmap.
    pub fn new(
        config: &Config,
        mut make_store: impl FnMut(&NamedClipmapConfig) -> S,
        gpu: &mut G,
    ) -> Result<Self, TerrainError> {
        let lod = config.terrain;
        let selector = LodSelector::from_config(&lod)?;
        let mesh = TileMesh::new(lod.tile_quad_count, lod.terrain_height_meters);

        let mut clipmaps = Vec::with_capacity(config.clipmaps.len());
        for named in config.clipmaps.iter() {
            let clipmap = Clipmap::new(&named.clipmap, make_store(named), gpu).map_err(|source| {
                TerrainError::Clipmap {
                    name: named.name.clone(),
                    source,
                }
            })?;
            clipmaps.push(NamedClipmap {
                name: named.name.clone(),
                clipmap,
            });
        }

        let mut materials: Vec<TerrainMaterial> = config
            .materials
            .iter()
            .map(|m| TerrainMaterial::new(m, &lod))
            .collect();
        for material in materials.iter_mut() {
            for named in clipmaps.iter() {
                material.bind_clipmap(&named.name, named.clipmap.layout().level_count());
            }
        }

        log::info!(
            "Terrain ready: {}m with {}m tiles, {} clipmaps, {} materials",
            lod.terrain_size_meters,
            lod.tile_size_meters,
            clipmaps.len(),
            materials.len()
        );

        Ok(Self {
            lod,
            selector,
            mesh,
            materials,
            clipmaps,
            instances: Vec::new(),
        })
    }

    /// The eye's XZ position in `[0, 1]²` of the terrain, which is also its position in every virtual texture.
    pub fn normalized_eye(&self, eye: Vec3) -> Vec2 {
        Vec2::new(eye.x, eye.z) / self.lod.terrain_size_meters
    }

    /// Selects this frame's tiles, streams every clipmap toward the eye, and submits one instanced draw per material.
    pub fn frame(
        &mut self,
        eye: Vec3,
        view_projection: Mat4,
        gpu: &mut G,
        submitter: &mut impl DrawSubmitter,
    ) -> Result<FrameReport, TerrainError> {
        let frustum = Frustum::from_view_projection(view_projection);
        self.selector.select_visible(eye, &frustum, &mut self.instances);

        let norm = self.normalized_eye(eye);
        let mut report = FrameReport {
            instance_count: self.instances.len(),
            ..Default::default()
        };
        for named in self.clipmaps.iter_mut() {
            let stats = named
                .clipmap
                .tick(norm, gpu)
                .map_err(|source| TerrainError::Clipmap {
                    name: named.name.clone(),
                    source,
                })?;
            report.clipmaps.push((named.name.clone(), stats));
        }

        for material in self.materials.iter() {
            submitter.draw_instanced(material, &self.mesh, &self.instances);
            report.draw_count += 1;
        }

        log::trace!("Terrain frame: {:?}", report);

        Ok(report)
    }

    /// The instances drawn by the last frame.
    pub fn instances(&self) -> &[DrawInstance] {
        &self.instances
    }

    pub fn clipmap(&self, name: &str) -> Option<&Clipmap<S, G>> {
        self.clipmaps
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.clipmap)
    }

    pub fn materials(&self) -> &[TerrainMaterial] {
        &self.materials
    }

    pub fn mesh(&self) -> &TileMesh {
        &self.mesh
    }

    pub fn selector(&self) -> &LodSelector {
        &self.selector
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use crate::RecordedDraws;

    use clipterra_map::core::units::TexelUnits;
    use clipterra_map::glam::UVec2;
    use clipterra_map::{
        ClipArrayDesc, ClipmapConfig, ClipmapError, FetchCallback, FetchResult, GpuFence, TexelFormat,
        TileImage,
    };
    use std::time::Duration;

    /// Serves every tile immediately, all with the same size and format.
    struct InstantStore {
        tile_size: u32,
        format: TexelFormat,
    }

    impl AssetStore for InstantStore {
        fn fetch_blocking(&self, _locator: &str) -> FetchResult {
            Ok(TileImage::filled(self.tile_size, self.tile_size, self.format, 7))
        }

        fn fetch_async(&self, locator: String, on_complete: FetchCallback) {
            on_complete(self.fetch_blocking(&locator));
        }
    }

    struct NeverFence;

    impl GpuFence for NeverFence {
        fn has_passed(&self) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct CountingGpu {
        arrays: Vec<ClipArrayDesc>,
        copies: usize,
        fences: usize,
    }

    impl GpuBackend for CountingGpu {
        type Texture = usize;
        type Fence = NeverFence;

        fn create_clip_array(&mut self, desc: &ClipArrayDesc) -> usize {
            self.arrays.push(desc.clone());
            self.arrays.len() - 1
        }

        fn copy_tile(&mut self, _texture: &usize, _layer: u32, _origin: TexelUnits<UVec2>, _tile: &TileImage) {
            self.copies += 1;
        }

        fn clear_region(&mut self, _texture: &usize, _layer: u32, _origin: TexelUnits<UVec2>, _extent: TexelUnits<u32>) {}

        fn insert_fence(&mut self) -> NeverFence {
            self.fences += 1;
            NeverFence
        }
    }

    fn small_config() -> Config {
        let clipmap = |name: &str, srgb| NamedClipmapConfig {
            name: name.into(),
            srgb,
            clipmap: ClipmapConfig {
                texture_root: format!("{}_Mipmaps", name),
                virtual_size_texels: 1024,
                clip_size_texels: 256,
                ..Default::default()
            },
        };
        Config {
            terrain: LodConfig {
                terrain_size_meters: 1024.0,
                tile_size_meters: 64.0,
                tile_quad_count: 8,
                ..Default::default()
            },
            clipmaps: vec![clipmap("albedo", true), clipmap("height", false)],
            ..Default::default()
        }
    }

    fn make_store(named: &NamedClipmapConfig) -> InstantStore {
        InstantStore {
            tile_size: 128,
            format: if named.srgb {
                TexelFormat::Rgba8UnormSrgb
            } else {
                TexelFormat::R16Unorm
            },
        }
    }

    #[test]
    fn frame_draws_every_material_and_streams_every_clipmap() {
        let mut gpu = CountingGpu::default();
        let mut terrain = Terrain::new(&small_config(), make_store, &mut gpu).unwrap();
        assert_eq!(gpu.arrays.len(), 2);
        assert_eq!(gpu.arrays[1].format, TexelFormat::R16Unorm);
        for material in terrain.materials() {
            assert_eq!(material.clipmap("height").map(|b| b.layer_count), Some(2));
        }

        let eye = Vec3::new(512.0, 40.0, 512.0);
        let view = Mat4::look_at_rh(eye, eye + Vec3::new(0.0, -1.0, 0.01), Vec3::Y);
        let projection = Mat4::perspective_rh(90f32.to_radians(), 1.0, 0.1, 10000.0);
        let view_projection = projection * view;
        let mut draws = RecordedDraws::default();

        // Tiles requested by the first frame complete immediately and are copied on the second.
        let report = terrain.frame(eye, view_projection, &mut gpu, &mut draws).unwrap();
        assert_eq!(report.clipmaps.len(), 2);
        assert!(report.clipmaps.iter().all(|(_, s)| s.requested == 8 && s.copied == 0));
        assert!(report.instance_count > 0);
        assert_eq!(report.draw_count, 2);

        let report = terrain.frame(eye, view_projection, &mut gpu, &mut draws).unwrap();
        assert!(report.clipmaps.iter().all(|(_, s)| s.requested == 0 && s.copied == 8));
        assert_eq!(gpu.copies, 16);
        assert_eq!(gpu.fences, 2);

        assert_eq!(draws.draws.len(), 4);
        assert_eq!(draws.draws[3].material, "debug");
        assert!(draws.draws[3].debug_view);
        assert_eq!(draws.draws[3].instances, terrain.instances());
    }

    #[test]
    fn eye_is_normalized_by_terrain_size() {
        let mut gpu = CountingGpu::default();
        let terrain = Terrain::new(&small_config(), make_store, &mut gpu).unwrap();
        assert_eq!(terrain.normalized_eye(Vec3::new(256.0, 99.0, 768.0)), Vec2::new(0.25, 0.75));
        let albedo = terrain.clipmap("albedo").unwrap();
        assert_eq!(albedo.layout().clip_tile_count(), 2);
        assert!(terrain.clipmap("normal").is_none());
    }

    #[test]
    fn bad_clipmap_is_named_in_error() {
        let mut gpu = CountingGpu::default();
        let result = Terrain::new(
            &small_config(),
            |named| InstantStore {
                tile_size: if named.name == "height" { 96 } else { 128 },
                format: TexelFormat::R8Unorm,
            },
            &mut gpu,
        );
        match result {
            Err(TerrainError::Clipmap { name, source }) => {
                assert_eq!(name, "height");
                assert!(matches!(source, ClipmapError::Config(_)));
            }
            _ => panic!("expected a clipmap error"),
        }
    }

    #[test]
    fn streams_tiles_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let named = NamedClipmapConfig {
            name: "height".into(),
            srgb: false,
            clipmap: ClipmapConfig {
                texture_root: "Height_Mipmaps".into(),
                virtual_size_texels: 64,
                clip_size_texels: 32,
                ..Default::default()
            },
        };
        // Level 0 is a 4x4 grid of 16 texel tiles.
        for y in 0..4 {
            for x in 0..4 {
                let locator = clipterra_map::tile_file_locator("Height_Mipmaps", 0, x, y);
                let path = dir.path().join(locator.trim_start_matches('/'));
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                let tile: image::ImageBuffer<image::Luma<u16>, Vec<u16>> =
                    image::ImageBuffer::from_pixel(16, 16, image::Luma([0x4000]));
                tile.save(&path).unwrap();
            }
        }

        let store = directory_store(dir.path(), &named, 2).unwrap();
        let mut gpu = CountingGpu::default();
        let mut clipmap = Clipmap::new(&named.clipmap, store, &mut gpu).unwrap();
        assert_eq!(clipmap.format(), TexelFormat::R16Unorm);
        assert_eq!(clipmap.layout().level_count(), 1);

        let stats = clipmap.tick(Vec2::splat(0.5), &mut gpu).unwrap();
        assert_eq!(stats.requested, 4);

        let mut copied = 0;
        for _ in 0..500 {
            copied += clipmap.tick(Vec2::splat(0.5), &mut gpu).unwrap().copied;
            if copied == 4 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(copied, 4);
    }
}
