use crate::core::geometry::Frustum;
use crate::core::glam::Vec3;
use crate::{DrawInstance, LodConfig, NodeIndex, Quadtree, QuadtreeError, QuadtreeNode};

use smallvec::SmallVec;

/// Chooses which quadtree nodes to draw for an eye position.
///
/// A node is split into its children while the eye is within its LOD distance:
///
/// ```text
/// horizontal_distance(eye, center) - size / 2 < 2^(lod + lod_bias) * lod0_distance
/// ```
///
/// so the selected nodes always tile the whole terrain exactly once. Only the nodes that end up selected are culled.
#[derive(Clone, Debug)]
pub struct LodSelector {
    quadtree: Quadtree,
    lod0_distance: f32,
    lod_bias: f32,
}

impl LodSelector {
    pub fn new(quadtree: Quadtree, lod0_distance: f32, lod_bias: f32) -> Result<Self, QuadtreeError> {
        if !(lod0_distance.is_finite() && lod0_distance > 0.0) {
            return Err(QuadtreeError::InvalidSize {
                what: "lod0 distance",
                value: lod0_distance,
            });
        }
        if !lod_bias.is_finite() {
            return Err(QuadtreeError::NonFiniteBias(lod_bias));
        }
        Ok(Self {
            quadtree,
            lod0_distance,
            lod_bias,
        })
    }

    /// Builds the quadtree for a terrain with its minimum corner at the origin.
    pub fn from_config(config: &LodConfig) -> Result<Self, QuadtreeError> {
        config.validate()?;
        let quadtree = Quadtree::build(
            Vec3::ZERO,
            config.terrain_size_meters,
            config.terrain_height_meters,
            config.tile_size_meters,
        )?;
        Self::new(quadtree, config.lod0_distance, config.lod_bias)
    }

    pub fn quadtree(&self) -> &Quadtree {
        &self.quadtree
    }

    /// `2^(lod + lod_bias) * lod0_distance`
    #[inline]
    pub fn lod_distance(&self, lod: i32) -> f32 {
        (lod as f32 + self.lod_bias).exp2() * self.lod0_distance
    }

    #[inline]
    pub fn should_subdivide(&self, eye: Vec3, node: &QuadtreeNode) -> bool {
        let offset = eye - node.center();
        let distance = offset.x.hypot(offset.z);
        distance - node.half_size() < self.lod_distance(node.lod)
    }

    /// Replaces the contents of `out` with an instance for every selected node whose bounds intersect `frustum`.
    pub fn select_visible(&self, eye: Vec3, frustum: &Frustum, out: &mut Vec<DrawInstance>) {
        out.clear();
        self.select(eye, |node| frustum.intersects_aabb(&node.bounds), out);
    }

    /// Like [`select_visible`](Self::select_visible), without culling.
    pub fn select_all(&self, eye: Vec3, out: &mut Vec<DrawInstance>) {
        out.clear();
        self.select(eye, |_| true, out);
    }

    fn select(&self, eye: Vec3, mut is_visible: impl FnMut(&QuadtreeNode) -> bool, out: &mut Vec<DrawInstance>) {
        let mut stack: SmallVec<[NodeIndex; 64]> = SmallVec::new();
        stack.push(NodeIndex::ROOT);
        while let Some(index) = stack.pop() {
            let node = self.quadtree.node(index);
            if let Some(children) = node.children {
                if self.should_subdivide(eye, node) {
                    stack.extend_from_slice(&children);
                    continue;
                }
            }
            if is_visible(node) {
                out.push(DrawInstance::from_node(node));
            }
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
