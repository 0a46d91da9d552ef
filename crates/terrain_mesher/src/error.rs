//! Error types for terrain meshing.
//!
//! Every condition here is a local data invariant violation. None are transient:
//! the caller must supply corrected input.

use thiserror::Error;

/// Errors raised while validating input or encoding output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// World size outside what the packed positions can address.
    #[error("horizontal chunk count {horizontal_chunks} outside 1..={max}")]
    InvalidWorldSize { horizontal_chunks: u32, max: u32 },

    /// Column index table has the wrong number of entries.
    #[error("column index has {actual} entries, expected {expected}")]
    IndexLength { expected: usize, actual: usize },

    /// A column ends before it starts.
    #[error("column {column} index decreases ({start} > {end})")]
    IndexNotMonotonic { column: usize, start: u32, end: u32 },

    /// The last index entry does not match the data length.
    #[error("column index ends at {end} but column data holds {len} entries")]
    IndexEndMismatch { end: usize, len: usize },

    /// Interleaved column starts between a `y` and its material.
    #[error("column {column} starts at word {offset}, expected an even offset")]
    OddColumnOffset { column: usize, offset: u32 },

    /// Interleaved column spans an odd number of words.
    #[error("column {column} spans {len} words, expected an even count")]
    OddColumnSpan { column: usize, len: usize },

    /// Column heights are not strictly increasing.
    #[error("column {column} is not strictly increasing at y = {y}")]
    UnsortedColumn { column: usize, y: i32 },

    /// Voxel height cannot be encoded.
    #[error("column {column} has voxel at y = {y}, outside 0..={max}")]
    HeightOutOfRange { column: usize, y: i32, max: i32 },

    /// Material word does not fit the 8-bit color field.
    #[error("column {column} has material {value}, outside 0..=255")]
    MaterialOutOfRange { column: usize, value: i32 },

    /// Heightmap or material map does not cover the world.
    #[error("heightmap has {actual} cells, expected {expected}")]
    HeightmapSize { expected: usize, actual: usize },

    /// Region selection leaves the world.
    #[error("region {size_x}x{size_z} at chunk ({start_x}, {start_z}) exceeds {horizontal_chunks}x{horizontal_chunks} world")]
    RegionOutOfBounds {
        start_x: u32,
        start_z: u32,
        size_x: u32,
        size_z: u32,
        horizontal_chunks: u32,
    },

    /// A square field does not fit its packed width.
    #[error("square {field} = {value} outside encodable range (max {max})")]
    SquareFieldOverflow { field: &'static str, value: u32, max: u32 },

    /// Packed normal id is not one of the six orientations.
    #[error("invalid normal id {0}")]
    InvalidNormal(u32),

    /// Mesh holds more squares than the 29-bit count field.
    #[error("mesh square count {square_count} exceeds 29-bit field")]
    MeshRecordOverflow { square_count: u32 },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
