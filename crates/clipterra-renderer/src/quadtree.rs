use crate::core::geometry::Aabb;
use crate::core::glam::Vec3;

use thiserror::Error;

/// A quadtree of this depth already has ~22 million nodes.
pub const MAX_LOD_COUNT: u32 = 12;

#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum QuadtreeError {
    #[error("{what} must be positive and finite, got {value}")]
    InvalidSize { what: &'static str, value: f32 },
    #[error("terrain size {size} is not a power-of-two multiple of the tile size {leaf_size}")]
    NotPowerOfTwo { size: f32, leaf_size: f32 },
    #[error("{lod_count} LODs exceeds the maximum of {}", MAX_LOD_COUNT)]
    TooDeep { lod_count: u32 },
    #[error("lod bias must be finite, got {0}")]
    NonFiniteBias(f32),
    #[error("tile quad count must be nonzero")]
    ZeroQuadCount,
}

/// Index of a node in its [`Quadtree`]'s arena.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub const ROOT: Self = Self(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadtreeNode {
    /// The corner with the least X and Z. Y is the terrain origin's.
    pub min: Vec3,
    pub size: f32,
    /// `log2(size / leaf_size) - 1`, so leaves are `-1` and the root is `lod_count - 1`.
    pub lod: i32,
    pub bounds: Aabb,
    /// Quadrants ordered `(-x, -z)`, `(+x, -z)`, `(-x, +z)`, `(+x, +z)`.
    pub children: Option<[NodeIndex; 4]>,
}

impl QuadtreeNode {
    fn new(min: Vec3, size: f32, height: f32, lod: i32) -> Self {
        Self {
            min,
            size,
            lod,
            bounds: Aabb::from_min_and_shape(min, Vec3::new(size, height, size)),
            children: None,
        }
    }

    #[inline]
    pub fn half_size(&self) -> f32 {
        0.5 * self.size
    }

    /// The center of the node's XZ footprint, at the height of `min`.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.min + Vec3::new(self.half_size(), 0.0, self.half_size())
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A complete quadtree over a square terrain. Built once, then only read.
///
/// Nodes are stored in a flat arena and refer to their children by [`NodeIndex`]. Every node either has four children of
/// half its size or is a leaf of `leaf_size`.
#[derive(Clone, Debug)]
pub struct Quadtree {
    nodes: Vec<QuadtreeNode>,
    lod_count: u32,
    leaf_size: f32,
}

impl Quadtree {
    pub fn build(origin: Vec3, size: f32, height: f32, leaf_size: f32) -> Result<Self, QuadtreeError> {
        for (what, value) in [("terrain size", size), ("tile size", leaf_size)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(QuadtreeError::InvalidSize { what, value });
            }
        }
        if !(height.is_finite() && height >= 0.0) {
            return Err(QuadtreeError::InvalidSize {
                what: "terrain height",
                value: height,
            });
        }

        let ratio = size / leaf_size;
        let max_ratio = (1u32 << MAX_LOD_COUNT) as f32;
        if ratio < 1.0 || ratio.fract() != 0.0 || !(ratio as u64).is_power_of_two() {
            return Err(QuadtreeError::NotPowerOfTwo { size, leaf_size });
        }
        if ratio > max_ratio {
            return Err(QuadtreeError::TooDeep {
                lod_count: (ratio as u64).trailing_zeros(),
            });
        }
        let lod_count = (ratio as u32).trailing_zeros();

        // (4^(lod_count + 1) - 1) / 3
        let num_nodes = ((1usize << (2 * (lod_count + 1))) - 1) / 3;
        let mut nodes = Vec::with_capacity(num_nodes);
        nodes.push(QuadtreeNode::new(origin, size, height, lod_count as i32 - 1));

        let mut pending = vec![NodeIndex::ROOT];
        while let Some(parent) = pending.pop() {
            let node = nodes[parent.index()];
            if node.lod < 0 {
                continue;
            }

            let half = node.half_size();
            let x = Vec3::new(half, 0.0, 0.0);
            let z = Vec3::new(0.0, 0.0, half);
            let first = nodes.len() as u32;
            let children = [
                NodeIndex(first),
                NodeIndex(first + 1),
                NodeIndex(first + 2),
                NodeIndex(first + 3),
            ];
            for min in [node.min, node.min + x, node.min + z, node.min + x + z] {
                nodes.push(QuadtreeNode::new(min, half, height, node.lod - 1));
            }
            nodes[parent.index()].children = Some(children);
            pending.extend_from_slice(&children);
        }
        debug_assert_eq!(nodes.len(), num_nodes);

        log::info!(
            "Built terrain quadtree: {} LODs, {} nodes, {}m leaves",
            lod_count,
            nodes.len(),
            leaf_size
        );

        Ok(Self {
            nodes,
            lod_count,
            leaf_size,
        })
    }

    #[inline]
    pub fn root(&self) -> &QuadtreeNode {
        &self.nodes[0]
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &QuadtreeNode {
        &self.nodes[index.index()]
    }

    pub fn nodes(&self) -> &[QuadtreeNode] {
        &self.nodes
    }

    pub fn leaves(&self) -> impl Iterator<Item = &QuadtreeNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// `log2(size / leaf_size)`. Zero when the whole terrain is a single leaf.
    pub fn lod_count(&self) -> u32 {
        self.lod_count
    }

    pub fn leaf_size(&self) -> f32 {
        self.leaf_size
    }

    pub fn size(&self) -> f32 {
        self.root().size
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
