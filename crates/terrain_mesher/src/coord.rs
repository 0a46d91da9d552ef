//! Chunk coordinates and region selection on the horizontal chunk grid.

use glam::UVec3;

use crate::columns::WorldDims;
use crate::core::CHUNK_SIZE;
use crate::error::MeshError;

/// Chunk coordinate in chunk-space (not voxel-space).
///
/// Terrain chunks tile the world horizontally only; the vertical extent of a
/// chunk is split into windows while meshing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ChunkCoord {
    pub x: u32,
    pub z: u32,
}

impl ChunkCoord {
    /// Origin chunk at (0, 0).
    pub const ZERO: ChunkCoord = ChunkCoord { x: 0, z: 0 };

    pub const fn new(x: u32, z: u32) -> Self {
        Self { x, z }
    }

    /// Neighbor offset by `(dx, dz)`, or `None` past the world edge.
    ///
    /// # Example
    /// ```
    /// use terrain_mesher::{ChunkCoord, WorldDims};
    ///
    /// let dims = WorldDims::new(2).unwrap();
    /// assert_eq!(ChunkCoord::new(0, 0).offset(1, 0, dims), Some(ChunkCoord::new(1, 0)));
    /// assert_eq!(ChunkCoord::new(0, 0).offset(-1, 0, dims), None);
    /// assert_eq!(ChunkCoord::new(1, 1).offset(0, 1, dims), None);
    /// ```
    pub fn offset(&self, dx: i32, dz: i32, dims: WorldDims) -> Option<ChunkCoord> {
        let x = self.x.checked_add_signed(dx)?;
        let z = self.z.checked_add_signed(dz)?;
        let n = ChunkCoord { x, z };
        dims.contains_chunk(n).then_some(n)
    }

    /// World voxel position of the chunk's minimum corner at height `start_y`.
    pub fn origin_world(&self, start_y: u32) -> UVec3 {
        UVec3::new(self.x * CHUNK_SIZE as u32, start_y, self.z * CHUNK_SIZE as u32)
    }
}

/// Rectangular block of chunks meshed in one call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkRegion {
    pub start_x: u32,
    pub start_z: u32,
    pub size_x: u32,
    pub size_z: u32,
}

impl ChunkRegion {
    pub const fn new(start_x: u32, start_z: u32, size_x: u32, size_z: u32) -> Self {
        Self { start_x, start_z, size_x, size_z }
    }

    /// Region covering every chunk of the world.
    pub fn whole_world(dims: WorldDims) -> Self {
        let n = dims.horizontal_chunks();
        Self::new(0, 0, n, n)
    }

    /// Check that the region lies inside the world. Empty regions are valid.
    pub fn validate(&self, dims: WorldDims) -> Result<(), MeshError> {
        let n = dims.horizontal_chunks() as u64;
        let end_x = self.start_x as u64 + self.size_x as u64;
        let end_z = self.start_z as u64 + self.size_z as u64;
        if end_x > n || end_z > n {
            return Err(MeshError::RegionOutOfBounds {
                start_x: self.start_x,
                start_z: self.start_z,
                size_x: self.size_x,
                size_z: self.size_z,
                horizontal_chunks: dims.horizontal_chunks(),
            });
        }
        Ok(())
    }

    pub fn chunk_count(&self) -> usize {
        self.size_x as usize * self.size_z as usize
    }

    /// Chunks in processing order: rows of increasing z, x increasing within a row.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        (self.start_z..self.start_z + self.size_z).flat_map(move |z| {
            (self.start_x..self.start_x + self.size_x).map(move |x| ChunkCoord::new(x, z))
        })
    }
}
