//! Binary-plane greedy meshing of sparse column terrain.
//!
//! Terrain is stored as sparse vertical columns of `(y, material)` voxels.
//! The mesher works one 64×64 chunk window at a time, building 64-bit
//! occupancy rows, culling hidden faces with shifts and masks, and merging
//! visible faces into rectangles packed into two `u32` words each.
//!
//! # Example
//!
//! ```
//! use terrain_mesher::{mesh_region, ChunkRegion, ColumnStore, MesherConfig, WorldDims};
//!
//! let dims = WorldDims::new(1).unwrap();
//! let size = dims.horizontal_size();
//! // Flat ground at y = 4, material 2.
//! let store = ColumnStore::from_heightmap(dims, &vec![4; size * size], &vec![2; size * size]).unwrap();
//!
//! let output = mesh_region(&store, ChunkRegion::whole_world(dims), &MesherConfig::default()).unwrap();
//! assert_eq!(output.squares.len(), 1); // One 64×64 top face
//! assert_eq!(output.squares[0].decode().width, 64);
//! ```

pub mod columns;
pub mod config;
pub mod coord;
pub mod core;
pub mod cull;
pub mod error;
pub mod expand;
pub mod merge;
pub mod mesh;
pub mod palette;
pub mod solid;
pub mod stats;

// Re-export primary types
pub use crate::core::{
    Axis,
    FaceNormal,
    FacePlanes,
    SetBits,
    SideFlags,
    SolidRows,
    Square,
    SquareFields,
    // Constants
    CHUNK_AREA, CHUNK_SIZE, FACE_COUNT,
    MAX_SQUARE_SIDE, MAX_SQUARE_X, MAX_SQUARE_Y, MAX_SQUARE_Z,
};
pub use crate::columns::{
    ColumnEntry, ColumnStore, WorldDims,
    MATERIAL_INVISIBLE, MAX_HORIZONTAL_CHUNKS, MAX_VOXEL_Y,
};
pub use crate::config::{EdgeBehavior, MesherConfig};
pub use crate::coord::{ChunkCoord, ChunkRegion};
pub use crate::error::MeshError;
pub use crate::palette::MaterialPalette;
pub use crate::stats::MeshStats;

// Re-export main entry points
pub use crate::mesh::{mesh_chunk, mesh_region, ChunkScratch, MeshData, MeshOutput, VoxelMesh};
pub use crate::expand::{covered_cells, expand_squares, square_corners};
