//! Meshing pipeline.
//!
//! For every chunk of a region, and every 64-high window of that chunk:
//! 1. Occupancy rows and side flags ([`build_solid_rows`])
//! 2. Face planes per normal and material ([`build_face_planes`])
//! 3. Greedy merge of each plane into squares, grouped into one
//!    [`VoxelMesh`] per normal
//!
//! Chunks are independent, so the region runs on the rayon pool when the
//! config allows it. Per-chunk results are stitched back in chunk order, so
//! the output does not depend on scheduling.

use std::ops::Range;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

use bytemuck::{Pod, Zeroable};
use glam::{UVec3, Vec3};
use rayon::prelude::*;

use crate::columns::ColumnStore;
use crate::config::{EdgeBehavior, MesherConfig};
use crate::coord::{ChunkCoord, ChunkRegion};
use crate::core::{FaceNormal, FacePlanes, SolidRows, Square, CHUNK_SIZE};
use crate::cull::build_face_planes;
use crate::error::MeshError;
use crate::merge::{greedy_merge_plane, PlaneRect};
use crate::palette::MaterialPalette;
use crate::solid::build_solid_rows;
use crate::stats::MeshStats;

/// Bits of the square count in a [`MeshData`] record.
pub const MESH_COUNT_BITS: u32 = 29;
/// Largest square count a [`MeshData`] record can hold.
pub const MAX_MESH_SQUARES: u32 = (1 << MESH_COUNT_BITS) - 1;

const NORMAL_BITS: u32 = 32 - MESH_COUNT_BITS;

/// Squares of one chunk window facing one direction, with their bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelMesh {
    origin: UVec3,
    normal: FaceNormal,
    start_square: u32,
    square_count: u32,
    // Chunk-local bounds, empty (min > max) until the first square.
    min: UVec3,
    max: UVec3,
}

impl VoxelMesh {
    /// Empty mesh whose squares will start at `start_square` in the output.
    pub fn new(normal: FaceNormal, chunk: ChunkCoord, start_y: u32, start_square: u32) -> Self {
        Self {
            origin: chunk.origin_world(start_y),
            normal,
            start_square,
            square_count: 0,
            min: UVec3::splat(CHUNK_SIZE as u32),
            max: UVec3::ZERO,
        }
    }

    /// Place a plane rectangle at `depth` and pack it.
    ///
    /// Positive faces sit on the far side of their voxel, so their depth
    /// coordinate is one past the voxel. The bounds only grow once the square
    /// has been packed successfully.
    pub fn add(&mut self, rect: PlaneRect, depth: u32, color: u8) -> Result<Square, MeshError> {
        let axis = self.normal.axis();
        let (w, h) = (axis.width_axis().index(), axis.height_axis().index());

        let mut min = UVec3::ZERO;
        min[w] = rect.x;
        min[h] = rect.y;
        min[axis.index()] = depth + self.normal.is_positive() as u32;
        let mut max = min;
        max[w] += rect.width;
        max[h] += rect.height;

        let position = self.origin + min;
        let square = Square::new(position.to_array(), rect.width, rect.height, self.normal, color)?;

        self.min = self.min.min(min);
        self.max = self.max.max(max);
        self.square_count += 1;
        Ok(square)
    }

    #[inline]
    pub fn normal(&self) -> FaceNormal {
        self.normal
    }

    /// World position of the chunk window's minimum corner.
    #[inline]
    pub fn origin(&self) -> UVec3 {
        self.origin
    }

    #[inline]
    pub fn square_count(&self) -> u32 {
        self.square_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.square_count == 0
    }

    #[inline]
    pub fn start_square(&self) -> u32 {
        self.start_square
    }

    /// Index range of this mesh's squares in the output buffer.
    pub fn squares(&self) -> Range<usize> {
        let start = self.start_square as usize;
        start..start + self.square_count as usize
    }

    /// Chunk-local `(min, max)` corners of all added squares.
    pub fn bounds(&self) -> Option<(UVec3, UVec3)> {
        (!self.is_empty()).then_some((self.min, self.max))
    }

    /// World-space center of the bounding box.
    pub fn center(&self) -> Vec3 {
        self.origin.as_vec3() + (self.min.as_vec3() + self.max.as_vec3()) / 2.0
    }

    /// Half the bounding box extent.
    pub fn half_size(&self) -> Vec3 {
        (self.max.as_vec3() - self.min.as_vec3()).max(Vec3::ZERO) / 2.0
    }

    fn rebase(&mut self, offset: u32) {
        self.start_square += offset;
    }
}

/// GPU record for frustum culling one [`VoxelMesh`].
///
/// # Layout
/// - `center`: world-space box center
/// - `normal_and_count`: normal id in bits 0-2, square count in bits 3-31
/// - `half_size`: half the box extent
/// - `start_square`: first square of the mesh in the square buffer
///
/// 32 bytes, two `vec3 + u32` pairs, matching std430 packing.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshData {
    pub center: [f32; 3],
    pub normal_and_count: u32,
    pub half_size: [f32; 3],
    pub start_square: u32,
}

impl MeshData {
    pub fn from_mesh(mesh: &VoxelMesh) -> Result<Self, MeshError> {
        if mesh.square_count() > MAX_MESH_SQUARES {
            return Err(MeshError::MeshRecordOverflow { square_count: mesh.square_count() });
        }
        Ok(Self {
            center: mesh.center().to_array(),
            normal_and_count: mesh.normal() as u32 | (mesh.square_count() << NORMAL_BITS),
            half_size: mesh.half_size().to_array(),
            start_square: mesh.start_square(),
        })
    }

    /// Normal id, `None` for padding records.
    pub fn normal(&self) -> Option<FaceNormal> {
        if self.square_count() == 0 {
            return None;
        }
        FaceNormal::from_id(self.normal_and_count & ((1 << NORMAL_BITS) - 1))
    }

    #[inline]
    pub fn square_count(&self) -> u32 {
        self.normal_and_count >> NORMAL_BITS
    }
}

/// Squares and meshes of a meshing run.
#[derive(Clone, Debug, Default)]
pub struct MeshOutput {
    /// Packed squares, each mesh's squares contiguous.
    pub squares: Vec<Square>,
    /// Meshes in chunk order, then window, then normal.
    pub meshes: Vec<VoxelMesh>,
    pub stats: MeshStats,
}

impl MeshOutput {
    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    /// Squares belonging to `mesh`.
    pub fn squares_of(&self, mesh: &VoxelMesh) -> &[Square] {
        &self.squares[mesh.squares()]
    }

    /// Square buffer as raw words, ready for upload.
    pub fn square_words(&self) -> &[u32] {
        bytemuck::cast_slice(&self.squares)
    }

    /// One culling record per mesh.
    pub fn mesh_data(&self) -> Result<Vec<MeshData>, MeshError> {
        self.meshes.iter().map(MeshData::from_mesh).collect()
    }

    /// Culling records padded with empty ones to a multiple of `group_size`,
    /// so a compute pass can run whole workgroups.
    pub fn padded_mesh_data(&self, group_size: usize) -> Result<Vec<MeshData>, MeshError> {
        let mut data = self.mesh_data()?;
        let group_size = group_size.max(1);
        let padded = data.len().div_ceil(group_size) * group_size;
        data.resize(padded, MeshData::zeroed());
        Ok(data)
    }

    /// Append `other`, shifting its square ranges past our squares.
    fn append(&mut self, mut other: MeshOutput) -> Result<(), MeshError> {
        let offset = square_offset(self.squares.len())?;
        for mesh in &mut other.meshes {
            mesh.rebase(offset);
        }
        self.squares.append(&mut other.squares);
        self.meshes.append(&mut other.meshes);
        self.stats.accumulate(&other.stats);
        Ok(())
    }
}

fn square_offset(len: usize) -> Result<u32, MeshError> {
    u32::try_from(len).map_err(|_| MeshError::MeshRecordOverflow { square_count: u32::MAX })
}

/// Reusable per-worker buffers for meshing one chunk.
pub struct ChunkScratch {
    solid: SolidRows,
    planes: FacePlanes,
    palette: MaterialPalette,
}

impl ChunkScratch {
    pub fn new() -> Self {
        Self {
            solid: SolidRows::new(),
            planes: FacePlanes::new(),
            palette: MaterialPalette::new(),
        }
    }
}

impl Default for ChunkScratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Start heights of the 64-high windows covering a chunk's stored voxels.
///
/// Windows start at the lowest stored voxel (air included); an empty chunk
/// has none.
pub fn chunk_windows(store: &ColumnStore, chunk: ChunkCoord) -> Vec<i32> {
    let Some((min_y, max_y)) = store.chunk_height_range(chunk) else {
        return Vec::new();
    };
    let window = CHUNK_SIZE as i32;
    let count = (max_y - min_y) / window + 1;
    (0..count).map(|k| min_y + k * window).collect()
}

/// Mesh one chunk. Square ranges in the result start at 0.
pub fn mesh_chunk(
    store: &ColumnStore,
    chunk: ChunkCoord,
    edge: EdgeBehavior,
    scratch: &mut ChunkScratch,
) -> Result<MeshOutput, MeshError> {
    let mut output = MeshOutput::default();
    let windows = chunk_windows(store, chunk);
    if windows.is_empty() {
        return Ok(output);
    }

    let ChunkScratch { solid, planes, palette } = scratch;
    palette.rebuild(store.chunk_entries(chunk));

    for &start_y in &windows {
        build_solid_rows(store, chunk, start_y, edge, solid);
        build_face_planes(store, chunk, start_y, solid, palette, planes);
        output.stats.visible_faces += planes.total_faces();
        if palette.is_empty() {
            continue;
        }

        for normal in FaceNormal::ALL {
            let start_square = square_offset(output.squares.len())?;
            let mut mesh = VoxelMesh::new(normal, chunk, start_y as u32, start_square);

            for material in 0..palette.len() {
                let color = palette.material(material);
                for depth in 0..CHUNK_SIZE {
                    let squares = &mut output.squares;
                    greedy_merge_plane(planes.plane_mut(normal, material, depth), |rect| {
                        squares.push(mesh.add(rect, depth as u32, color)?);
                        Ok::<(), MeshError>(())
                    })?;
                }
            }

            if !mesh.is_empty() {
                output.stats.squares_per_normal[normal.index()] += mesh.square_count() as usize;
                output.meshes.push(mesh);
            }
        }
    }

    output.stats.chunks_meshed = 1;
    output.stats.windows_meshed = windows.len();
    output.stats.square_count = output.squares.len();
    output.stats.mesh_count = output.meshes.len();

    log::debug!(
        "chunk ({}, {}): {} windows, {} squares, {} meshes",
        chunk.x,
        chunk.z,
        windows.len(),
        output.squares.len(),
        output.meshes.len()
    );

    Ok(output)
}

/// Mesh every chunk of `region`.
///
/// The result is identical whether or not `config.parallel` is set.
///
/// # Example
/// ```
/// use terrain_mesher::{mesh_region, ChunkRegion, ColumnEntry, ColumnStore, MesherConfig, WorldDims};
///
/// let dims = WorldDims::new(1).unwrap();
/// let store = ColumnStore::from_fn(dims, |x, z| {
///     if (x, z) == (8, 8) { vec![ColumnEntry::new(3, 1)] } else { Vec::new() }
/// })
/// .unwrap();
///
/// let output = mesh_region(&store, ChunkRegion::whole_world(dims), &MesherConfig::default()).unwrap();
/// assert_eq!(output.squares.len(), 6);
/// assert_eq!(output.meshes.len(), 6);
/// ```
pub fn mesh_region(
    store: &ColumnStore,
    region: ChunkRegion,
    config: &MesherConfig,
) -> Result<MeshOutput, MeshError> {
    region.validate(store.dims())?;

    #[cfg(not(target_arch = "wasm32"))]
    let start = Instant::now();

    let chunks: Vec<ChunkCoord> = region.chunks().collect();
    let edge = config.edge_behavior;

    let parts: Vec<MeshOutput> = if config.parallel {
        chunks
            .par_iter()
            .map_init(ChunkScratch::new, |scratch, &chunk| mesh_chunk(store, chunk, edge, scratch))
            .collect::<Result<_, _>>()?
    } else {
        let mut scratch = ChunkScratch::new();
        chunks
            .iter()
            .map(|&chunk| mesh_chunk(store, chunk, edge, &mut scratch))
            .collect::<Result<_, _>>()?
    };

    let mut output = MeshOutput::default();
    for part in parts {
        output.append(part)?;
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        output.stats.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    }

    log::info!(
        target: "perf",
        "ms={:.2} mesh_region chunks={}/{} windows={} faces={} squares={} meshes={} merge_efficiency={:.3}",
        output.stats.elapsed_ms,
        output.stats.chunks_meshed,
        chunks.len(),
        output.stats.windows_meshed,
        output.stats.visible_faces,
        output.stats.square_count,
        output.stats.mesh_count,
        output.stats.merge_efficiency()
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{ColumnEntry, WorldDims};

    fn store_from(horizontal_chunks: u32, voxels: &[(u32, i32, u32, u8)]) -> ColumnStore {
        let dims = WorldDims::new(horizontal_chunks).unwrap();
        ColumnStore::from_fn(dims, |x, z| {
            voxels
                .iter()
                .filter(|v| (v.0, v.2) == (x, z))
                .map(|v| ColumnEntry::new(v.1, v.3))
                .collect()
        })
        .unwrap()
    }

    #[test]
    fn mesh_add_positions_and_bounds() {
        let mut mesh = VoxelMesh::new(FaceNormal::PosY, ChunkCoord::new(1, 2), 10, 0);
        let square = mesh.add(PlaneRect { x: 3, y: 4, width: 2, height: 5 }, 7, 9).unwrap();

        let f = square.decode();
        // +Y: x = col, z = row, y = depth + 1.
        assert_eq!(f.position, [64 + 3, 10 + 8, 128 + 4]);
        assert_eq!((f.width, f.height, f.color), (2, 5, 9));
        assert_eq!(mesh.bounds(), Some((UVec3::new(3, 8, 4), UVec3::new(5, 8, 9))));
        assert_eq!(mesh.center(), Vec3::new(64.0 + 4.0, 18.0, 128.0 + 6.5));
        assert_eq!(mesh.half_size(), Vec3::new(1.0, 0.0, 2.5));
    }

    #[test]
    fn mesh_add_negative_face_stays_on_voxel() {
        let mut mesh = VoxelMesh::new(FaceNormal::NegX, ChunkCoord::ZERO, 0, 0);
        let f = mesh.add(PlaneRect { x: 1, y: 2, width: 1, height: 1 }, 5, 1).unwrap().decode();
        // -X: x = depth, y = col, z = row.
        assert_eq!(f.position, [5, 1, 2]);
    }

    #[test]
    fn failed_add_leaves_mesh_unchanged() {
        let mut mesh = VoxelMesh::new(FaceNormal::PosY, ChunkCoord::ZERO, 500, 0);
        let err = mesh.add(PlaneRect { x: 0, y: 0, width: 1, height: 1 }, 20, 1).unwrap_err();
        assert!(matches!(err, MeshError::SquareFieldOverflow { field: "y", .. }));
        assert!(mesh.is_empty());
        assert_eq!(mesh.bounds(), None);
    }

    #[test]
    fn mesh_data_packing() {
        let mut mesh = VoxelMesh::new(FaceNormal::NegZ, ChunkCoord::ZERO, 0, 12);
        mesh.add(PlaneRect { x: 0, y: 0, width: 4, height: 2 }, 3, 1).unwrap();
        mesh.add(PlaneRect { x: 0, y: 2, width: 4, height: 2 }, 3, 1).unwrap();

        let data = MeshData::from_mesh(&mesh).unwrap();
        assert_eq!(data.normal_and_count, 5 | (2 << 3));
        assert_eq!(data.normal(), Some(FaceNormal::NegZ));
        assert_eq!(data.square_count(), 2);
        assert_eq!(data.start_square, 12);
        // -Z: y = col, x = row, z = depth.
        assert_eq!(data.center, [2.0, 2.0, 3.0]);
        assert_eq!(data.half_size, [2.0, 2.0, 0.0]);
        assert_eq!(std::mem::size_of::<MeshData>(), 32);
    }

    #[test]
    fn padded_mesh_data_rounds_up() {
        let store = store_from(1, &[(4, 0, 4, 1)]);
        let output = mesh_region(&store, ChunkRegion::whole_world(store.dims()), &MesherConfig::open_edges()).unwrap();
        assert_eq!(output.meshes.len(), 6);

        let padded = output.padded_mesh_data(4).unwrap();
        assert_eq!(padded.len(), 8);
        assert_eq!(padded[7], MeshData::zeroed());
        assert_eq!(padded[7].normal(), None);
        assert_eq!(output.padded_mesh_data(0).unwrap().len(), 6);
        assert_eq!(output.padded_mesh_data(6).unwrap().len(), 6);
    }

    #[test]
    fn windows_cover_stored_range() {
        let store = store_from(1, &[(0, 5, 0, 1), (9, 200, 9, 1)]);
        assert_eq!(chunk_windows(&store, ChunkCoord::ZERO), vec![5, 69, 133, 197]);

        let single = store_from(1, &[(0, 64, 0, 0)]);
        assert_eq!(chunk_windows(&single, ChunkCoord::ZERO), vec![64]);

        let empty = store_from(1, &[]);
        assert!(chunk_windows(&empty, ChunkCoord::ZERO).is_empty());
    }

    #[test]
    fn empty_chunk_meshes_nothing() {
        let store = store_from(1, &[]);
        let output = mesh_chunk(&store, ChunkCoord::ZERO, EdgeBehavior::Open, &mut ChunkScratch::new()).unwrap();
        assert!(output.is_empty());
        assert!(output.meshes.is_empty());
        assert_eq!(output.stats.chunks_meshed, 0);
    }

    #[test]
    fn squares_grouped_by_mesh() {
        let store = store_from(1, &[(1, 1, 1, 2), (1, 2, 1, 3), (5, 1, 5, 2)]);
        let output =
            mesh_chunk(&store, ChunkCoord::ZERO, EdgeBehavior::Open, &mut ChunkScratch::new()).unwrap();

        let mut next = 0;
        for mesh in &output.meshes {
            assert_eq!(mesh.start_square() as usize, next);
            assert!(output.squares_of(mesh).iter().all(|s| s.normal() == mesh.normal()));
            next += mesh.square_count() as usize;
        }
        assert_eq!(next, output.squares.len());
        assert_eq!(output.stats.square_count, output.squares.len());
        assert_eq!(output.stats.squares_per_normal.iter().sum::<usize>(), output.squares.len());
    }

    #[test]
    fn tall_column_spans_windows() {
        let column: Vec<(u32, i32, u32, u8)> = (0..130).map(|y| (3, y, 3, 1)).collect();
        let store = store_from(1, &column);
        let output =
            mesh_chunk(&store, ChunkCoord::ZERO, EdgeBehavior::Open, &mut ChunkScratch::new()).unwrap();

        assert_eq!(output.stats.windows_meshed, 3);
        // One top, one bottom. Window seams are hidden by the Y side flags.
        assert_eq!(output.stats.squares_per_normal[FaceNormal::PosY.index()], 1);
        assert_eq!(output.stats.squares_per_normal[FaceNormal::NegY.index()], 1);
        // Each side face is split at the window seams: 64 + 64 + 2.
        assert_eq!(output.stats.squares_per_normal[FaceNormal::PosX.index()], 3);

        let top = output.squares.iter().find(|s| s.normal() == FaceNormal::PosY).unwrap();
        assert_eq!(top.decode().position, [3, 130, 3]);
    }

    #[test]
    fn region_rejects_out_of_world() {
        let store = store_from(1, &[]);
        let err = mesh_region(&store, ChunkRegion::new(0, 0, 2, 1), &MesherConfig::default()).unwrap_err();
        assert!(matches!(err, MeshError::RegionOutOfBounds { .. }));
    }
}
