//! Square expansion.
//!
//! Squares are normally expanded on the GPU. These CPU versions decode the
//! same layout into corners, triangle lists, and the voxel cells a square
//! covers.

use glam::{IVec3, Vec3};

use crate::core::{Axis, FaceNormal, Square};

/// Unit vector along `axis`.
fn unit(axis: Axis) -> IVec3 {
    let mut v = IVec3::ZERO;
    v[axis.index()] = 1;
    v
}

/// The four world-space corners of a square, counter-clockwise seen from
/// the side its normal points to.
pub fn square_corners(square: Square) -> [Vec3; 4] {
    let f = square.decode();
    let axis = f.normal.axis();
    let origin = Vec3::from_array(f.position.map(|c| c as f32));
    let w = unit(axis.width_axis()).as_vec3() * f.width as f32;
    let h = unit(axis.height_axis()).as_vec3() * f.height as f32;
    let out = IVec3::from_array(f.normal.direction()).as_vec3();

    if w.cross(h).dot(out) > 0.0 {
        [origin, origin + w, origin + w + h, origin + h]
    } else {
        [origin, origin + h, origin + w + h, origin + w]
    }
}

/// World voxel cells whose face the square draws.
///
/// A positive face lies on the far side of its voxel, so its cells sit one
/// step back along the normal.
pub fn covered_cells(square: Square) -> impl Iterator<Item = IVec3> {
    let f = square.decode();
    let axis = f.normal.axis();
    let mut base = IVec3::from_array(f.position.map(|c| c as i32));
    if f.normal.is_positive() {
        base -= unit(axis);
    }
    let (w_step, h_step) = (unit(axis.width_axis()), unit(axis.height_axis()));

    (0..f.height as i32).flat_map(move |j| (0..f.width as i32).map(move |i| base + w_step * i + h_step * j))
}

/// Flat triangle-list geometry.
#[derive(Clone, Debug, Default)]
pub struct ExpandedMesh {
    /// Vertex positions (xyz, 3 floats per vertex).
    pub positions: Vec<f32>,
    /// Vertex normals (xyz, 3 floats per vertex).
    pub normals: Vec<f32>,
    /// Color id per vertex.
    pub colors: Vec<u32>,
    /// Triangle indices (3 per triangle).
    pub indices: Vec<u32>,
}

impl ExpandedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Expand squares into 4 vertices and 2 triangles each.
pub fn expand_squares(squares: &[Square]) -> ExpandedMesh {
    let mut mesh = ExpandedMesh {
        positions: Vec::with_capacity(squares.len() * 12),
        normals: Vec::with_capacity(squares.len() * 12),
        colors: Vec::with_capacity(squares.len() * 4),
        indices: Vec::with_capacity(squares.len() * 6),
    };

    for &square in squares {
        let base = mesh.vertex_count() as u32;
        let normal: FaceNormal = square.normal();
        let n = IVec3::from_array(normal.direction()).as_vec3();

        for corner in square_corners(square) {
            mesh.positions.extend_from_slice(&corner.to_array());
            mesh.normals.extend_from_slice(&n.to_array());
            mesh.colors.push(square.color() as u32);
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    mesh
}
