use crate::LodConfig;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A material the terrain is drawn with once per frame.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub name: String,
    /// Draw with the debug visualization instead of shading.
    pub debug_view: bool,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            name: "terrain".into(),
            debug_view: false,
        }
    }
}

/// Scalar uniform block shared by all terrain materials.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainMaterialParams {
    pub height_scale: f32,
    pub terrain_size: f32,
    pub tile_size: f32,
    pub debug_view: u32,
}

/// A clipmap texture array a material samples, by name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClipmapBinding {
    pub name: String,
    pub layer_count: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TerrainMaterial {
    pub name: String,
    pub params: TerrainMaterialParams,
    pub clipmaps: Vec<ClipmapBinding>,
}

impl TerrainMaterial {
    pub fn new(config: &MaterialConfig, lod: &LodConfig) -> Self {
        Self {
            name: config.name.clone(),
            params: TerrainMaterialParams {
                height_scale: lod.terrain_height_meters,
                terrain_size: lod.terrain_size_meters,
                tile_size: lod.tile_size_meters,
                debug_view: config.debug_view as u32,
            },
            clipmaps: Vec::new(),
        }
    }

    /// Binds (or rebinds) the clipmap called `name`.
    pub fn bind_clipmap(&mut self, name: &str, layer_count: u32) {
        if let Some(binding) = self.clipmaps.iter_mut().find(|b| b.name == name) {
            binding.layer_count = layer_count;
        } else {
            self.clipmaps.push(ClipmapBinding {
                name: name.to_owned(),
                layer_count,
            });
        }
    }

    pub fn clipmap(&self, name: &str) -> Option<&ClipmapBinding> {
        self.clipmaps.iter().find(|b| b.name == name)
    }

    pub fn is_debug_view(&self) -> bool {
        self.params.debug_view != 0
    }

    pub fn params_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.params)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
