use crate::core::glam::UVec2;

/// A tile of the virtual texture at `level`, in the level's tile grid. `y` grows upwards.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TileAddress {
    pub level: u32,
    pub x: u32,
    pub y: u32,
}

impl TileAddress {
    pub fn new(level: u32, x: u32, y: u32) -> Self {
        Self { level, x, y }
    }

    /// Tile files are stored top row first, so the file's `y` is flipped relative to the grid.
    pub fn file_coordinates(&self, grid_size: u32) -> UVec2 {
        UVec2::new(self.x, grid_size - self.y - 1)
    }

    /// The asset locator of this tile, given the side length of its level's tile grid.
    pub fn locator(&self, texture_root: &str, grid_size: u32) -> String {
        let file = self.file_coordinates(grid_size);
        tile_file_locator(texture_root, self.level, file.x, file.y)
    }
}

/// `{root}/Mip_{lod}/tile_{lod}_{x}_{y}.png`, where `(x, y)` are already in file coordinates.
pub fn tile_file_locator(texture_root: &str, lod: u32, x: u32, y: u32) -> String {
    format!("{texture_root}/Mip_{lod}/tile_{lod}_{x}_{y}.png")
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
