use crate::core::glam::{Mat4, Quat, Vec3};
use crate::core::static_assertions::const_assert_eq;
use crate::QuadtreeNode;

use bytemuck::{Pod, Zeroable};
use std::mem;

/// Places one copy of the unit tile mesh. Rebuilt from scratch every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawInstance {
    pub translation: Vec3,
    pub scale: Vec3,
}

impl DrawInstance {
    /// Covers the node's footprint. Height is applied by the material, so Y is not scaled.
    pub fn from_node(node: &QuadtreeNode) -> Self {
        Self {
            translation: node.min,
            scale: Vec3::new(node.size, 1.0, node.size),
        }
    }

    /// `translate * scale`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, Quat::IDENTITY, self.translation)
    }

    /// Area of the XZ footprint.
    pub fn footprint_area(&self) -> f32 {
        self.scale.x * self.scale.z
    }

    pub fn to_raw(&self) -> DrawInstanceRaw {
        DrawInstanceRaw {
            model: self.to_matrix().to_cols_array_2d(),
        }
    }
}

/// GPU layout of a [`DrawInstance`]: a column-major model matrix.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct DrawInstanceRaw {
    pub model: [[f32; 4]; 4],
}

const_assert_eq!(mem::size_of::<DrawInstanceRaw>(), 64);

/// Packs `instances` for upload as a vertex or storage buffer.
pub fn instance_bytes(instances: &[DrawInstance]) -> Vec<u8> {
    let raw: Vec<DrawInstanceRaw> = instances.iter().map(DrawInstance::to_raw).collect();
    bytemuck::cast_slice(&raw).to_vec()
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
