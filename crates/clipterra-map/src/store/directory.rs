use super::{FetchError, FetchResult, TileSource};
use crate::{TexelFormat, TileImage};

use image::{DynamicImage, GenericImageView, ImageError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads PNG tiles from a directory tree laid out as `{base}/{texture_root}/Mip_{lod}/tile_{lod}_{x}_{y}.png`.
#[derive(Clone, Debug)]
pub struct DirectoryTileSource {
    base_dir: PathBuf,
    srgb: bool,
}

impl DirectoryTileSource {
    /// 8-bit color tiles are treated as sRGB.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            srgb: true,
        }
    }

    /// 8-bit color tiles are treated as linear data (e.g. normal maps).
    pub fn linear(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            srgb: false,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_of(&self, locator: &str) -> PathBuf {
        self.base_dir.join(locator.trim_start_matches('/'))
    }

    fn convert(&self, locator: &str, image: DynamicImage) -> FetchResult {
        // Files store the top row first; tiles store the bottom row first.
        let image = image.flipv();
        let (width, height) = image.dimensions();

        let (format, texels) = match image {
            DynamicImage::ImageLuma8(buffer) => (TexelFormat::R8Unorm, buffer.into_raw()),
            DynamicImage::ImageLumaA8(buffer) => (TexelFormat::Rg8Unorm, buffer.into_raw()),
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => {
                let format = if self.srgb {
                    TexelFormat::Rgba8UnormSrgb
                } else {
                    TexelFormat::Rgba8Unorm
                };
                (format, image.to_rgba8().into_raw())
            }
            DynamicImage::ImageLuma16(buffer) => (
                TexelFormat::R16Unorm,
                bytemuck::cast_slice::<u16, u8>(buffer.as_raw().as_slice()).to_vec(),
            ),
            DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => (
                TexelFormat::Rgba16Unorm,
                bytemuck::cast_slice::<u16, u8>(image.to_rgba16().as_raw().as_slice()).to_vec(),
            ),
            DynamicImage::ImageRgba32F(buffer) => {
                // Only the red channel of float images is kept (height data).
                let reds: Vec<f32> = buffer.pixels().map(|p| p.0[0]).collect();
                (TexelFormat::R32Float, bytemuck::cast_slice::<f32, u8>(&reds).to_vec())
            }
            other => {
                return Err(FetchError::UnsupportedLayout {
                    locator: locator.to_owned(),
                    layout: format!("{:?}", other.color()),
                })
            }
        };

        Ok(TileImage::new(width, height, format, texels))
    }
}

impl TileSource for DirectoryTileSource {
    fn read(&self, locator: &str) -> FetchResult {
        let path = self.path_of(locator);
        let image = image::open(&path).map_err(|e| match e {
            ImageError::IoError(io) if io.kind() == ErrorKind::NotFound => {
                FetchError::NotFound(locator.to_owned())
            }
            ImageError::IoError(io) => FetchError::Io {
                locator: locator.to_owned(),
                message: io.to_string(),
            },
            other => FetchError::Decode {
                locator: locator.to_owned(),
                message: other.to_string(),
            },
        })?;

        self.convert(locator, image)
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
    use crate::tile_file_locator;

    use image::{ImageBuffer, Luma, Rgba};
    use std::fs;

    #[test]
    fn reads_tiles_bottom_row_first() {
        let dir = tempfile::tempdir().unwrap();
        let locator = tile_file_locator("albedo", 0, 1, 2);
        let path = dir.path().join(locator.trim_start_matches('/'));
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        // Top row red, bottom row blue.
        let image = ImageBuffer::from_fn(2, 2, |_x, y| {
            if y == 0 {
                Rgba([255u8, 0, 0, 255])
            } else {
                Rgba([0u8, 0, 255, 255])
            }
        });
        image.save(&path).unwrap();

        let source = DirectoryTileSource::new(dir.path());
        let tile = source.read(&locator).unwrap();
        assert_eq!((tile.width, tile.height), (2, 2));
        assert_eq!(tile.format, TexelFormat::Rgba8UnormSrgb);
        assert_eq!(&tile.texels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&tile.texels[8..12], &[255, 0, 0, 255]);
    }

    #[test]
    fn sixteen_bit_height_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("height.png");
        let image: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_pixel(4, 4, Luma([0x1234]));
        image.save(&path).unwrap();

        let tile = DirectoryTileSource::linear(dir.path())
            .read("/height.png")
            .unwrap();
        assert_eq!(tile.format, TexelFormat::R16Unorm);
        assert_eq!(tile.byte_len(), 4 * 4 * 2);
        assert_eq!(tile.row_pitch(), 8);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectoryTileSource::new(dir.path());
        assert_eq!(
            source.read("nope/Mip_0/tile_0_0_0.png"),
            Err(FetchError::NotFound("nope/Mip_0/tile_0_0_0.png".to_owned()))
        );
    }
}
