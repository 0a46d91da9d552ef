//! Bitwise face culling.
//!
//! A face is visible where a voxel is solid and its neighbor in that direction
//! is not. Along an occupancy row the neighbor is the next bit, so one shift
//! and mask tests 64 voxels at once. The bit past either end comes from the
//! row's side flags.
//!
//! Exposed bits are sorted into per-material face planes for the greedy merge.

use crate::columns::ColumnStore;
use crate::coord::ChunkCoord;
use crate::core::{Axis, FaceNormal, FacePlanes, SetBits, SolidRows, CHUNK_SIZE};
use crate::palette::MaterialPalette;

const FIRST_BIT: u64 = 1;
const LAST_BIT: u64 = 1 << (CHUNK_SIZE - 1);

/// Solid bits of `row` whose `+depth` neighbor is empty.
///
/// `after` is the solidity just past bit 63.
///
/// ```
/// # use terrain_mesher::cull::exposed_positive;
/// assert_eq!(exposed_positive(0b0110, false), 0b0100);
/// assert_eq!(exposed_positive(1 << 63, true), 0);
/// ```
#[inline]
pub fn exposed_positive(row: u64, after: bool) -> u64 {
    let beyond = if after { LAST_BIT } else { 0 };
    row & !((row >> 1) | beyond)
}

/// Solid bits of `row` whose `-depth` neighbor is empty.
///
/// `before` is the solidity just before bit 0.
#[inline]
pub fn exposed_negative(row: u64, before: bool) -> u64 {
    let beyond = if before { FIRST_BIT } else { 0 };
    row & !((row << 1) | beyond)
}

/// Mark every visible face of one chunk window in `planes`.
///
/// Faces of invisible material 0 are dropped. `planes` is reset to the
/// palette's material count first.
pub fn build_face_planes(
    store: &ColumnStore,
    chunk: ChunkCoord,
    start_y: i32,
    solid: &SolidRows,
    palette: &MaterialPalette,
    planes: &mut FacePlanes,
) {
    planes.reset(palette.len());
    if palette.is_empty() {
        return;
    }

    let dims = store.dims();
    for axis in Axis::ALL {
        let pos_normal = FaceNormal::new(axis, true);
        let neg_normal = FaceNormal::new(axis, false);

        for h in 0..CHUNK_SIZE {
            for w in 0..CHUNK_SIZE {
                let row = solid.row(axis, w, h);
                if row == 0 {
                    continue;
                }
                let side = solid.side(axis, w, h);

                let faces = [
                    (pos_normal, exposed_positive(row, side.after)),
                    (neg_normal, exposed_negative(row, side.before)),
                ];
                for (normal, exposed) in faces {
                    for depth in SetBits::new(exposed) {
                        let depth = depth as usize;
                        let mut p = [0usize; 3];
                        p[axis.index()] = depth;
                        p[axis.width_axis().index()] = w;
                        p[axis.height_axis().index()] = h;

                        let column = dims.column_index(chunk, p[0], p[2]);
                        let Some(material) = store.material_at(column, start_y + p[1] as i32) else {
                            continue;
                        };
                        if let Some(index) = palette.index_of(material) {
                            planes.mark(normal, index, depth, h, w);
                        }
                    }
                }
            }
        }
    }
}
