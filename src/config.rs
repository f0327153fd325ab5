use crate::TerrainError;

use clipterra_map::ClipmapConfig;
use clipterra_renderer::{LodConfig, MaterialConfig};
use serde::{Deserialize, Serialize};

/// One streamed texture of the terrain.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct NamedClipmapConfig {
    /// The name materials bind the clipmap's texture array by.
    pub name: String,
    /// Whether 8-bit color tiles hold sRGB data.
    pub srgb: bool,
    pub clipmap: ClipmapConfig,
}

impl Default for NamedClipmapConfig {
    fn default() -> Self {
        Self {
            name: "albedo".into(),
            srgb: true,
            clipmap: ClipmapConfig {
                texture_root: "Albedo_Mipmaps".into(),
                ..Default::default()
            },
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub terrain: LodConfig,
    pub clipmaps: Vec<NamedClipmapConfig>,
    pub materials: Vec<MaterialConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            terrain: LodConfig::default(),
            clipmaps: vec![
                NamedClipmapConfig::default(),
                NamedClipmapConfig {
                    name: "height".into(),
                    srgb: false,
                    clipmap: ClipmapConfig {
                        texture_root: "Height_Mipmaps".into(),
                        ..Default::default()
                    },
                },
            ],
            materials: vec![
                MaterialConfig::default(),
                MaterialConfig {
                    name: "debug".into(),
                    debug_view: true,
                },
            ],
        }
    }
}

impl Config {
    pub fn read_file(path: &str) -> Result<Self, TerrainError> {
        let reader = std::fs::File::open(path)?;

        Ok(ron::de::from_reader(reader)?)
    }

    pub fn from_ron(text: &str) -> Result<Self, TerrainError> {
        Ok(ron::from_str(text)?)
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

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = Config::from_ron(
            r#"(
                terrain: (terrain_size_meters: 4096.0, lod_bias: 1.5),
                clipmaps: [
                    (name: "albedo", clipmap: (texture_root: "Textures/Albedo_Mipmaps", clip_size_texels: 1024)),
                ],
            )"#,
        )
        .unwrap();

        assert_eq!(config.terrain.terrain_size_meters, 4096.0);
        assert_eq!(config.terrain.lod_bias, 1.5);
        assert_eq!(config.terrain.tile_size_meters, 64.0);
        assert_eq!(config.clipmaps.len(), 1);
        assert_eq!(config.clipmaps[0].clipmap.clip_size_texels, 1024);
        assert_eq!(config.clipmaps[0].clipmap.virtual_size_texels, 16 * 1024);
        assert_eq!(config.clipmaps[0].clipmap.loader.max_retries, 3);
        assert!(config.clipmaps[0].srgb);
        assert_eq!(config.materials.len(), 2);
    }

    #[test]
    fn read_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terrain.ron");
        let config = Config::default();
        std::fs::write(&path, ron::to_string(&config).unwrap()).unwrap();
        assert_eq!(Config::read_file(path.to_str().unwrap()).unwrap(), config);
    }

    #[test]
    fn bad_files_are_errors() {
        assert!(matches!(
            Config::read_file("/definitely/not/here.ron"),
            Err(TerrainError::Io(_))
        ));
        assert!(matches!(
            Config::from_ron("(terrain: oops)"),
            Err(TerrainError::Parse(_))
        ));
    }
}
