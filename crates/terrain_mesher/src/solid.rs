//! Occupancy rows for one chunk window.
//!
//! A window is the 64-voxel vertical slice `[start_y, start_y + 64)` of a
//! chunk. Voxels inside it set one bit on each axis. Solidity just outside
//! it goes into side flags instead:
//! - the voxels directly below and above the window fill the Y sides
//! - the edge columns of the four horizontal neighbors fill the X and Z sides
//!
//! Without a neighbor (world edge) the side follows [`EdgeBehavior`].

use crate::columns::{entries_in_range, ColumnStore};
use crate::config::EdgeBehavior;
use crate::coord::ChunkCoord;
use crate::core::{Axis, SideFlags, SolidRows, CHUNK_SIZE};

const LAST: usize = CHUNK_SIZE - 1;

/// One horizontal seam of a chunk.
#[derive(Clone, Copy, Debug)]
struct Seam {
    axis: Axis,
    /// Neighbor offset along `axis`.
    step: i32,
}

const SEAMS: [Seam; 4] = [
    Seam { axis: Axis::X, step: -1 },
    Seam { axis: Axis::X, step: 1 },
    Seam { axis: Axis::Z, step: -1 },
    Seam { axis: Axis::Z, step: 1 },
];

impl Seam {
    fn neighbor(self, chunk: ChunkCoord, store: &ColumnStore) -> Option<ChunkCoord> {
        match self.axis {
            Axis::X => chunk.offset(self.step, 0, store.dims()),
            _ => chunk.offset(0, self.step, store.dims()),
        }
    }

    /// Chunk-local `(x, z)` of the neighbor column facing `lane`.
    fn neighbor_column(self, lane: usize) -> (usize, usize) {
        let edge = if self.step < 0 { LAST } else { 0 };
        match self.axis {
            Axis::X => (edge, lane),
            _ => (lane, edge),
        }
    }

    fn flag(self, side: &mut SideFlags) -> &mut bool {
        if self.step < 0 {
            &mut side.before
        } else {
            &mut side.after
        }
    }
}

/// Fill `solid` for the window of `chunk` starting at `start_y`.
///
/// `solid` is cleared first. Every stored voxel counts as solid, including
/// invisible material 0.
pub fn build_solid_rows(
    store: &ColumnStore,
    chunk: ChunkCoord,
    start_y: i32,
    edge: EdgeBehavior,
    solid: &mut SolidRows,
) {
    solid.clear();
    let window = CHUNK_SIZE as i32;

    // Own columns, plus one voxel of context above and below.
    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            let column = store.chunk_column(chunk, x, z);
            for entry in entries_in_range(column, start_y - 1..start_y + window + 1) {
                match entry.y - start_y {
                    -1 => solid.side_mut(Axis::Y, x, z).before = true,
                    ly if ly == window => solid.side_mut(Axis::Y, x, z).after = true,
                    ly => solid.set_solid(x, ly as usize, z),
                }
            }
        }
    }

    for seam in SEAMS {
        stitch_seam(store, chunk, start_y, edge, seam, solid);
    }
}

/// Copy a neighbor's facing edge column into the side flags of one seam.
///
/// X and Z rows both run along Y, so the flag for window height `ly` at
/// `lane` lives at `side(axis, ly, lane)`.
fn stitch_seam(
    store: &ColumnStore,
    chunk: ChunkCoord,
    start_y: i32,
    edge: EdgeBehavior,
    seam: Seam,
    solid: &mut SolidRows,
) {
    let Some(neighbor) = seam.neighbor(chunk, store) else {
        if edge.is_solid() {
            for lane in 0..CHUNK_SIZE {
                for ly in 0..CHUNK_SIZE {
                    *seam.flag(solid.side_mut(seam.axis, ly, lane)) = true;
                }
            }
        }
        return;
    };

    for lane in 0..CHUNK_SIZE {
        let (x, z) = seam.neighbor_column(lane);
        let column = store.chunk_column(neighbor, x, z);
        for entry in entries_in_range(column, start_y..start_y + CHUNK_SIZE as i32) {
            let ly = (entry.y - start_y) as usize;
            *seam.flag(solid.side_mut(seam.axis, ly, lane)) = true;
        }
    }
}
