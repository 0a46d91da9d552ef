//! Sparse column store: the terrain input format.
//!
//! Every world `(x, z)` column is a run of `(y, material)` entries sorted by
//! strictly increasing `y`. Runs sit back to back in one flat array; a start
//! offset table (`columns + 1` entries, the last one being the total length)
//! locates each run. Columns are ordered chunk by chunk:
//!
//! ```text
//! column = (chunk_x + chunk_z * horizontal_chunks) * CHUNK_AREA + x_in_chunk + z_in_chunk * CHUNK_SIZE
//! ```
//!
//! so the columns of one chunk are contiguous.
//!
//! Material 0 is invisible: it is solid for face culling but never drawn.
//! Heights missing from a run are air.

use std::ops::Range;

use crate::coord::ChunkCoord;
use crate::core::{CHUNK_AREA, CHUNK_SIZE, MAX_SQUARE_X, MAX_SQUARE_Y};
use crate::error::MeshError;

/// Invisible material. Hides neighboring faces without producing any of its own.
pub const MATERIAL_INVISIBLE: u8 = 0;

/// Largest world size in chunks. A +X face on the far edge must still fit 13 bits.
pub const MAX_HORIZONTAL_CHUNKS: u32 = MAX_SQUARE_X / CHUNK_SIZE as u32;

/// Largest voxel height. A +Y face on top of it must still fit 9 bits.
pub const MAX_VOXEL_Y: i32 = MAX_SQUARE_Y as i32 - 1;

/// World size, in chunks per side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldDims {
    horizontal_chunks: u32,
}

impl WorldDims {
    pub fn new(horizontal_chunks: u32) -> Result<Self, MeshError> {
        if !(1..=MAX_HORIZONTAL_CHUNKS).contains(&horizontal_chunks) {
            return Err(MeshError::InvalidWorldSize {
                horizontal_chunks,
                max: MAX_HORIZONTAL_CHUNKS,
            });
        }
        Ok(Self { horizontal_chunks })
    }

    #[inline]
    pub fn horizontal_chunks(&self) -> u32 {
        self.horizontal_chunks
    }

    /// World edge length in voxels.
    #[inline]
    pub fn horizontal_size(&self) -> usize {
        self.horizontal_chunks as usize * CHUNK_SIZE
    }

    #[inline]
    pub fn column_count(&self) -> usize {
        self.horizontal_size() * self.horizontal_size()
    }

    #[inline]
    pub fn contains_chunk(&self, chunk: ChunkCoord) -> bool {
        chunk.x < self.horizontal_chunks && chunk.z < self.horizontal_chunks
    }

    /// Index of the first column of `chunk`.
    #[inline]
    pub fn chunk_base(&self, chunk: ChunkCoord) -> usize {
        (chunk.x as usize + chunk.z as usize * self.horizontal_chunks as usize) * CHUNK_AREA
    }

    /// Storage index of chunk-local column `(x, z)`.
    #[inline]
    pub fn column_index(&self, chunk: ChunkCoord, x: usize, z: usize) -> usize {
        debug_assert!(x < CHUNK_SIZE && z < CHUNK_SIZE, "Coordinates out of bounds");
        self.chunk_base(chunk) + x + z * CHUNK_SIZE
    }

    /// Storage index of world column `(x, z)`.
    #[inline]
    pub fn world_column_index(&self, x: usize, z: usize) -> usize {
        let chunk = ChunkCoord::new((x / CHUNK_SIZE) as u32, (z / CHUNK_SIZE) as u32);
        self.column_index(chunk, x % CHUNK_SIZE, z % CHUNK_SIZE)
    }
}

/// One stored voxel of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColumnEntry {
    pub y: i32,
    pub material: u8,
}

impl ColumnEntry {
    pub const fn new(y: i32, material: u8) -> Self {
        Self { y, material }
    }
}

/// Entries of a sorted column with `y` inside `range`.
#[inline]
pub fn entries_in_range(column: &[ColumnEntry], range: Range<i32>) -> &[ColumnEntry] {
    let start = column.partition_point(|e| e.y < range.start);
    let end = column.partition_point(|e| e.y < range.end);
    &column[start..end.max(start)]
}

/// Check an offset table against `len` data items before anything is sliced:
/// one offset per column plus the end, non-decreasing, ending at `len`.
fn check_index(dims: WorldDims, index: &[u32], len: usize) -> Result<(), MeshError> {
    let expected = dims.column_count() + 1;
    if index.len() != expected {
        return Err(MeshError::IndexLength { expected, actual: index.len() });
    }
    if let Some((column, span)) = index.windows(2).enumerate().find(|(_, s)| s[0] > s[1]) {
        return Err(MeshError::IndexNotMonotonic { column, start: span[0], end: span[1] });
    }
    let end = index[expected - 1] as usize;
    if end != len {
        return Err(MeshError::IndexEndMismatch { end, len });
    }
    Ok(())
}

/// Validated, immutable sparse terrain.
#[derive(Clone, Debug)]
pub struct ColumnStore {
    dims: WorldDims,
    entries: Vec<ColumnEntry>,
    /// `index[i]..index[i + 1]` are the entries of column `i`.
    index: Vec<u32>,
}

impl ColumnStore {
    /// Build from entries and an entry-offset table, validating both.
    pub fn new(dims: WorldDims, entries: Vec<ColumnEntry>, index: Vec<u32>) -> Result<Self, MeshError> {
        check_index(dims, &index, entries.len())?;

        for (column, span) in index.windows(2).enumerate() {
            let (start, stop) = (span[0] as usize, span[1] as usize);
            let column_entries = entries
                .get(start..stop)
                .ok_or(MeshError::IndexEndMismatch { end: stop, len: entries.len() })?;
            let mut previous: Option<i32> = None;
            for entry in column_entries {
                if !(0..=MAX_VOXEL_Y).contains(&entry.y) {
                    return Err(MeshError::HeightOutOfRange { column, y: entry.y, max: MAX_VOXEL_Y });
                }
                if previous.is_some_and(|p| p >= entry.y) {
                    return Err(MeshError::UnsortedColumn { column, y: entry.y });
                }
                previous = Some(entry.y);
            }
        }

        Ok(Self { dims, entries, index })
    }

    /// Build from the interleaved wire format: `words` alternates `y, material`,
    /// and `index` holds word offsets (every column spans an even count).
    pub fn from_interleaved(dims: WorldDims, words: &[i32], index: &[u32]) -> Result<Self, MeshError> {
        check_index(dims, index, words.len())?;

        let mut entries = Vec::with_capacity(words.len() / 2);
        let mut entry_index = Vec::with_capacity(index.len());
        entry_index.push(index[0] / 2);
        for (column, span) in index.windows(2).enumerate() {
            let (start, stop) = (span[0], span[1]);
            if start % 2 != 0 {
                return Err(MeshError::OddColumnOffset { column, offset: start });
            }
            let len = (stop - start) as usize;
            if len % 2 != 0 {
                return Err(MeshError::OddColumnSpan { column, len });
            }
            let column_words = words
                .get(start as usize..stop as usize)
                .ok_or(MeshError::IndexEndMismatch { end: stop as usize, len: words.len() })?;
            for pair in column_words.chunks_exact(2) {
                let material = u8::try_from(pair[1])
                    .map_err(|_| MeshError::MaterialOutOfRange { column, value: pair[1] })?;
                entries.push(ColumnEntry::new(pair[0], material));
            }
            entry_index.push(stop / 2);
        }

        // Leading words before the first column are never addressed.
        let skipped = entry_index[0];
        if skipped != 0 {
            entry_index.iter_mut().for_each(|i| *i -= skipped);
        }

        Self::new(dims, entries, entry_index)
    }

    /// Build by asking `column(world_x, world_z)` for each column's entries.
    pub fn from_fn<F>(dims: WorldDims, mut column: F) -> Result<Self, MeshError>
    where
        F: FnMut(u32, u32) -> Vec<ColumnEntry>,
    {
        let n = dims.horizontal_chunks();
        let mut entries = Vec::new();
        let mut index = Vec::with_capacity(dims.column_count() + 1);

        for chunk_z in 0..n {
            for chunk_x in 0..n {
                for z in 0..CHUNK_SIZE as u32 {
                    for x in 0..CHUNK_SIZE as u32 {
                        index.push(entries.len() as u32);
                        let world_x = chunk_x * CHUNK_SIZE as u32 + x;
                        let world_z = chunk_z * CHUNK_SIZE as u32 + z;
                        entries.extend(column(world_x, world_z));
                    }
                }
            }
        }
        index.push(entries.len() as u32);

        Self::new(dims, entries, index)
    }

    /// Encode a surface heightmap.
    ///
    /// `heights` and `materials` are row-major (`x + z * horizontal_size`).
    /// Each column stores its surface voxel plus invisible filler down to the
    /// lowest neighboring surface, so exposed cliff sides are closed off
    /// without storing the ground below.
    pub fn from_heightmap(dims: WorldDims, heights: &[i32], materials: &[u8]) -> Result<Self, MeshError> {
        let size = dims.horizontal_size();
        for len in [heights.len(), materials.len()] {
            if len != size * size {
                return Err(MeshError::HeightmapSize { expected: size * size, actual: len });
            }
        }

        let height_at = |x: usize, z: usize| heights[x + z * size];
        Self::from_fn(dims, |x, z| {
            let (x, z) = (x as usize, z as usize);
            let y = height_at(x, z);

            let mut lowest = y - 1;
            if x > 0 {
                lowest = lowest.min(height_at(x - 1, z));
            }
            if x + 1 < size {
                lowest = lowest.min(height_at(x + 1, z));
            }
            if z > 0 {
                lowest = lowest.min(height_at(x, z - 1));
            }
            if z + 1 < size {
                lowest = lowest.min(height_at(x, z + 1));
            }

            let mut column: Vec<ColumnEntry> = (lowest.max(0)..y)
                .map(|filler| ColumnEntry::new(filler, MATERIAL_INVISIBLE))
                .collect();
            column.push(ColumnEntry::new(y, materials[x + z * size]));
            column
        })
    }

    #[inline]
    pub fn dims(&self) -> WorldDims {
        self.dims
    }

    /// Total stored voxels.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries of column `column` (storage index).
    #[inline]
    pub fn column(&self, column: usize) -> &[ColumnEntry] {
        &self.entries[self.index[column] as usize..self.index[column + 1] as usize]
    }

    /// Entries of chunk-local column `(x, z)`.
    #[inline]
    pub fn chunk_column(&self, chunk: ChunkCoord, x: usize, z: usize) -> &[ColumnEntry] {
        self.column(self.dims.column_index(chunk, x, z))
    }

    /// All entries of a chunk, column after column.
    pub fn chunk_entries(&self, chunk: ChunkCoord) -> &[ColumnEntry] {
        let base = self.dims.chunk_base(chunk);
        &self.entries[self.index[base] as usize..self.index[base + CHUNK_AREA] as usize]
    }

    /// Lowest and highest stored `y` of a chunk, or `None` for an empty chunk.
    pub fn chunk_height_range(&self, chunk: ChunkCoord) -> Option<(i32, i32)> {
        self.chunk_entries(chunk).iter().fold(None, |range, e| match range {
            None => Some((e.y, e.y)),
            Some((lo, hi)) => Some((lo.min(e.y), hi.max(e.y))),
        })
    }

    /// Material stored at height `y` of a column, `None` for air.
    #[inline]
    pub fn material_at(&self, column: usize, y: i32) -> Option<u8> {
        let entries = self.column(column);
        entries
            .binary_search_by_key(&y, |e| e.y)
            .ok()
            .map(|i| entries[i].material)
    }
}
