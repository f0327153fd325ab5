use crate::core::geometry::Aabb;
use crate::core::glam::Vec3;

/// The unit grid mesh drawn for every terrain tile: `quad_count × quad_count` quads spanning `[0, 1]` in X and Z, flat at
/// `y = 0`. Vertices are displaced by the height clipmap when drawn, so the bounds extend up to the terrain height.
#[derive(Clone, Debug, PartialEq)]
pub struct TileMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub bounds: Aabb,
}

impl TileMesh {
    pub fn new(quad_count: u32, height: f32) -> Self {
        let side = quad_count + 1;
        let num_vertices = (side * side) as usize;
        let step = (quad_count as f32).recip();

        let mut positions = Vec::with_capacity(num_vertices);
        let mut uvs = Vec::with_capacity(num_vertices);
        for z in 0..side {
            for x in 0..side {
                let u = x as f32 * step;
                let v = z as f32 * step;
                positions.push([u, 0.0, v]);
                uvs.push([u, v]);
            }
        }

        //  d---c
        //  |  /|
        //  | / |
        //  |/  |
        //  a---b
        let mut indices = Vec::with_capacity((quad_count * quad_count * 6) as usize);
        for z in 0..quad_count {
            for x in 0..quad_count {
                let a = z * side + x;
                let b = a + 1;
                let c = b + side;
                let d = a + side;
                indices.extend_from_slice(&[a, d, b, b, d, c]);
            }
        }

        let bounds_size = Vec3::new(1.0, height, 1.0);
        Self {
            positions,
            normals: vec![[0.0, 1.0, 0.0]; num_vertices],
            uvs,
            indices,
            bounds: Aabb::from_min_and_shape(Vec3::ZERO, bounds_size),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
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
    fn counts() {
        let mesh = TileMesh::new(32, 32.0);
        assert_eq!(mesh.vertex_count(), 33 * 33);
        assert_eq!(mesh.uvs.len(), 33 * 33);
        assert_eq!(mesh.normals.len(), 33 * 33);
        assert_eq!(mesh.triangle_count(), 32 * 32 * 2);
        assert!(mesh.indices.iter().all(|i| (*i as usize) < mesh.vertex_count()));
        assert_eq!(mesh.positions[33 * 33 - 1], [1.0, 0.0, 1.0]);
        assert_eq!(mesh.bounds.max, Vec3::new(1.0, 32.0, 1.0));
    }

    #[test]
    fn triangles_face_up() {
        let mesh = TileMesh::new(4, 1.0);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.positions[i as usize]));
            let normal = (b - a).cross(c - a);
            assert!(normal.y > 0.0);
            assert_eq!(normal.x, 0.0);
            assert_eq!(normal.z, 0.0);
        }
    }
}
