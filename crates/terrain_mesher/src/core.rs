//! Core type definitions for the terrain mesher.

use bytemuck::{Pod, Zeroable};

use crate::error::MeshError;

/// Chunk edge length in voxels.
/// One occupancy row is a `u64`, so a chunk window is exactly 64 deep on every axis.
pub const CHUNK_SIZE: usize = 64;
/// Words in one axis of occupancy rows, or in one face plane stack (64 × 64 = 4096).
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;
/// Number of face orientations.
pub const FACE_COUNT: usize = 6;

/// Bit widths of the packed [`Square`] fields.
pub const SQUARE_X_BITS: u32 = 13;
pub const SQUARE_Z_BITS: u32 = 13;
pub const SQUARE_Y_BITS: u32 = 9;
pub const SQUARE_SIZE_BITS: u32 = 6;
pub const SQUARE_NORMAL_BITS: u32 = 3;
pub const SQUARE_COLOR_BITS: u32 = 8;

/// Largest encodable positions.
pub const MAX_SQUARE_X: u32 = (1 << SQUARE_X_BITS) - 1;
pub const MAX_SQUARE_Y: u32 = (1 << SQUARE_Y_BITS) - 1;
pub const MAX_SQUARE_Z: u32 = (1 << SQUARE_Z_BITS) - 1;
/// Largest rectangle side (stored as side - 1).
pub const MAX_SQUARE_SIDE: u32 = 1 << SQUARE_SIZE_BITS;

// Low word: x | z.
const SQUARE_Z_SHIFT: u32 = SQUARE_X_BITS;
// High word: y | width-1 | height-1 | normal | color.
const SQUARE_WIDTH_SHIFT: u32 = SQUARE_Y_BITS;
const SQUARE_HEIGHT_SHIFT: u32 = SQUARE_WIDTH_SHIFT + SQUARE_SIZE_BITS;
const SQUARE_NORMAL_SHIFT: u32 = SQUARE_HEIGHT_SHIFT + SQUARE_SIZE_BITS;
const SQUARE_COLOR_SHIFT: u32 = SQUARE_NORMAL_SHIFT + SQUARE_NORMAL_BITS;

const fn field_mask(bits: u32) -> u32 {
    (1 << bits) - 1
}

/// World axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Axis that runs along the bits of a plane row for faces on this axis.
    ///
    /// - X faces: rows run along Y
    /// - Y faces: rows run along X
    /// - Z faces: rows run along Y
    #[inline]
    pub const fn width_axis(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
            Axis::Z => Axis::Y,
        }
    }

    /// Axis that selects the row inside a plane for faces on this axis.
    #[inline]
    pub const fn height_axis(self) -> Axis {
        match self {
            Axis::X => Axis::Z,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

/// Face orientation. The discriminant is the 3-bit normal id stored in a [`Square`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceNormal {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl FaceNormal {
    pub const ALL: [FaceNormal; FACE_COUNT] = [
        FaceNormal::PosX,
        FaceNormal::NegX,
        FaceNormal::PosY,
        FaceNormal::NegY,
        FaceNormal::PosZ,
        FaceNormal::NegZ,
    ];

    #[inline]
    pub const fn new(axis: Axis, positive: bool) -> Self {
        match (axis, positive) {
            (Axis::X, true) => FaceNormal::PosX,
            (Axis::X, false) => FaceNormal::NegX,
            (Axis::Y, true) => FaceNormal::PosY,
            (Axis::Y, false) => FaceNormal::NegY,
            (Axis::Z, true) => FaceNormal::PosZ,
            (Axis::Z, false) => FaceNormal::NegZ,
        }
    }

    /// Look up a normal from its packed id.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn axis(self) -> Axis {
        match self {
            FaceNormal::PosX | FaceNormal::NegX => Axis::X,
            FaceNormal::PosY | FaceNormal::NegY => Axis::Y,
            FaceNormal::PosZ | FaceNormal::NegZ => Axis::Z,
        }
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        (self as u8) & 1 == 0
    }

    /// Unit vector pointing out of the face.
    pub const fn direction(self) -> [i32; 3] {
        let sign = if self.is_positive() { 1 } else { -1 };
        match self.axis() {
            Axis::X => [sign, 0, 0],
            Axis::Y => [0, sign, 0],
            Axis::Z => [0, 0, sign],
        }
    }
}

/// Iterator over the set bit positions of a word, lowest first.
///
/// Costs one step per set bit rather than one per bit position.
#[derive(Clone, Copy, Debug)]
pub struct SetBits(u64);

impl SetBits {
    #[inline]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }
}

impl Iterator for SetBits {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

/// One merged rectangular face, bit-packed into two 32-bit words for instanced rendering.
///
/// # Layout
/// `data1`:
/// - Bits 0-12: X position (0-8191)
/// - Bits 13-25: Z position (0-8191)
/// - Bits 26-31: Reserved
///
/// `data2`:
/// - Bits 0-8: Y position (0-511)
/// - Bits 9-14: Width (1-64, stored as 0-63)
/// - Bits 15-20: Height (1-64, stored as 0-63)
/// - Bits 21-23: Normal id (0-5)
/// - Bits 24-31: Color / material id (0-255)
///
/// The position is the face's minimum corner in world voxel coordinates. Width runs
/// along [`Axis::width_axis`] and height along [`Axis::height_axis`] of the normal's axis.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Square {
    data1: u32,
    data2: u32,
}

/// Unpacked fields of a [`Square`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquareFields {
    pub position: [u32; 3],
    pub width: u32,
    pub height: u32,
    pub normal: FaceNormal,
    pub color: u8,
}

fn check_field(field: &'static str, value: u32, max: u32) -> Result<u32, MeshError> {
    if value > max {
        return Err(MeshError::SquareFieldOverflow { field, value, max });
    }
    Ok(value)
}

fn check_side(field: &'static str, value: u32) -> Result<u32, MeshError> {
    if value == 0 || value > MAX_SQUARE_SIDE {
        return Err(MeshError::SquareFieldOverflow { field, value, max: MAX_SQUARE_SIDE });
    }
    Ok(value - 1)
}

impl Square {
    /// Pack a rectangle. Every field is range-checked; nothing is truncated.
    pub fn new(
        position: [u32; 3],
        width: u32,
        height: u32,
        normal: FaceNormal,
        color: u8,
    ) -> Result<Self, MeshError> {
        let x = check_field("x", position[0], MAX_SQUARE_X)?;
        let y = check_field("y", position[1], MAX_SQUARE_Y)?;
        let z = check_field("z", position[2], MAX_SQUARE_Z)?;
        let w = check_side("width", width)?;
        let h = check_side("height", height)?;

        Ok(Self {
            data1: x | (z << SQUARE_Z_SHIFT),
            data2: y
                | (w << SQUARE_WIDTH_SHIFT)
                | (h << SQUARE_HEIGHT_SHIFT)
                | ((normal as u32) << SQUARE_NORMAL_SHIFT)
                | ((color as u32) << SQUARE_COLOR_SHIFT),
        })
    }

    /// Both words as one `u64` (`data1` in the low half).
    #[inline]
    pub fn to_bits(self) -> u64 {
        self.data1 as u64 | ((self.data2 as u64) << 32)
    }

    /// Rebuild a square from [`Square::to_bits`] output.
    ///
    /// Rejects reserved bits and normal ids above 5.
    pub fn from_bits(bits: u64) -> Result<Self, MeshError> {
        let data1 = bits as u32;
        let data2 = (bits >> 32) as u32;
        let normal = (data2 >> SQUARE_NORMAL_SHIFT) & field_mask(SQUARE_NORMAL_BITS);
        if FaceNormal::from_id(normal).is_none() {
            return Err(MeshError::InvalidNormal(normal));
        }
        if data1 >> (SQUARE_X_BITS + SQUARE_Z_BITS) != 0 {
            return Err(MeshError::SquareFieldOverflow {
                field: "reserved",
                value: data1 >> (SQUARE_X_BITS + SQUARE_Z_BITS),
                max: 0,
            });
        }
        Ok(Self { data1, data2 })
    }

    /// The two raw words as uploaded to the GPU.
    #[inline]
    pub fn words(self) -> [u32; 2] {
        [self.data1, self.data2]
    }

    /// Unpack all fields.
    pub fn decode(self) -> SquareFields {
        let x = self.data1 & field_mask(SQUARE_X_BITS);
        let z = (self.data1 >> SQUARE_Z_SHIFT) & field_mask(SQUARE_Z_BITS);
        let y = self.data2 & field_mask(SQUARE_Y_BITS);
        let w = (self.data2 >> SQUARE_WIDTH_SHIFT) & field_mask(SQUARE_SIZE_BITS);
        let h = (self.data2 >> SQUARE_HEIGHT_SHIFT) & field_mask(SQUARE_SIZE_BITS);
        let normal = (self.data2 >> SQUARE_NORMAL_SHIFT) & field_mask(SQUARE_NORMAL_BITS);
        let color = (self.data2 >> SQUARE_COLOR_SHIFT) & field_mask(SQUARE_COLOR_BITS);

        SquareFields {
            position: [x, y, z],
            width: w + 1,
            height: h + 1,
            // Constructors only ever store ids 0-5.
            normal: FaceNormal::ALL[normal as usize],
            color: color as u8,
        }
    }

    #[inline]
    pub fn normal(self) -> FaceNormal {
        self.decode().normal
    }

    #[inline]
    pub fn color(self) -> u8 {
        (self.data2 >> SQUARE_COLOR_SHIFT) as u8
    }
}

/// Solidity just outside both ends of an occupancy row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SideFlags {
    /// Voxel before bit 0 is solid.
    pub before: bool,
    /// Voxel after bit 63 is solid.
    pub after: bool,
}

/// Occupancy rows for one chunk window, one set per axis.
///
/// Memory layout:
/// - `rows[axis * CHUNK_AREA + w + h * CHUNK_SIZE]`, bit `d` set when the voxel at
///   depth `d` along `axis` is solid. `w` and `h` are the coordinates on
///   [`Axis::width_axis`] and [`Axis::height_axis`].
/// - `sides` uses the same indexing.
///
/// The same voxel contributes one bit to each of the three axes.
#[derive(Clone)]
pub struct SolidRows {
    rows: Vec<u64>,
    sides: Vec<SideFlags>,
}

impl SolidRows {
    /// Create zeroed rows on the heap (~96KB rows + 12KB sides).
    pub fn new() -> Self {
        Self {
            rows: vec![0u64; 3 * CHUNK_AREA],
            sides: vec![SideFlags::default(); 3 * CHUNK_AREA],
        }
    }

    #[inline]
    pub const fn index(axis: Axis, w: usize, h: usize) -> usize {
        axis.index() * CHUNK_AREA + w + h * CHUNK_SIZE
    }

    /// Mark the voxel at chunk-local `(x, y, z)` solid on all three axes.
    ///
    /// # Panics
    /// Debug panics if coordinates are out of bounds.
    #[inline]
    pub fn set_solid(&mut self, x: usize, y: usize, z: usize) {
        debug_assert!(x < CHUNK_SIZE && y < CHUNK_SIZE && z < CHUNK_SIZE, "Coordinates out of bounds");
        let p = [x, y, z];
        for axis in Axis::ALL {
            let w = p[axis.width_axis().index()];
            let h = p[axis.height_axis().index()];
            self.rows[Self::index(axis, w, h)] |= 1u64 << p[axis.index()];
        }
    }

    #[inline]
    pub fn is_solid(&self, x: usize, y: usize, z: usize) -> bool {
        (self.rows[Self::index(Axis::Y, x, z)] >> y) & 1 != 0
    }

    #[inline]
    pub fn row(&self, axis: Axis, w: usize, h: usize) -> u64 {
        self.rows[Self::index(axis, w, h)]
    }

    #[inline]
    pub fn side(&self, axis: Axis, w: usize, h: usize) -> SideFlags {
        self.sides[Self::index(axis, w, h)]
    }

    #[inline]
    pub fn side_mut(&mut self, axis: Axis, w: usize, h: usize) -> &mut SideFlags {
        &mut self.sides[Self::index(axis, w, h)]
    }

    /// Count solid voxels (each voxel counted once, via the Y rows).
    pub fn solid_count(&self) -> usize {
        self.rows[Self::index(Axis::Y, 0, 0)..][..CHUNK_AREA]
            .iter()
            .map(|row| row.count_ones() as usize)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|&row| row == 0)
    }

    /// Reset rows and sides for the next window.
    pub fn clear(&mut self) {
        self.rows.fill(0);
        self.sides.fill(SideFlags::default());
    }
}

impl Default for SolidRows {
    fn default() -> Self {
        Self::new()
    }
}

/// Face planes for one chunk window.
///
/// `words[normal * CHUNK_AREA * materials + material * CHUNK_AREA + depth * CHUNK_SIZE + row]`,
/// bit `col` set when a face of that material and orientation must be drawn at
/// `(col, row)` of the plane at `depth`.
#[derive(Clone, Default)]
pub struct FacePlanes {
    words: Vec<u64>,
    material_count: usize,
}

impl FacePlanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero and resize for `material_count` dense material indices.
    pub fn reset(&mut self, material_count: usize) {
        self.words.clear();
        self.words.resize(FACE_COUNT * material_count * CHUNK_AREA, 0);
        self.material_count = material_count;
    }

    #[inline]
    pub fn material_count(&self) -> usize {
        self.material_count
    }

    #[inline]
    fn offset(&self, normal: FaceNormal, material: usize, depth: usize) -> usize {
        debug_assert!(material < self.material_count && depth < CHUNK_SIZE);
        (normal.index() * self.material_count + material) * CHUNK_AREA + depth * CHUNK_SIZE
    }

    /// The `CHUNK_SIZE` rows of one plane.
    #[inline]
    pub fn plane(&self, normal: FaceNormal, material: usize, depth: usize) -> &[u64] {
        let start = self.offset(normal, material, depth);
        &self.words[start..start + CHUNK_SIZE]
    }

    #[inline]
    pub fn plane_mut(&mut self, normal: FaceNormal, material: usize, depth: usize) -> &mut [u64] {
        let start = self.offset(normal, material, depth);
        &mut self.words[start..start + CHUNK_SIZE]
    }

    #[inline]
    pub fn mark(&mut self, normal: FaceNormal, material: usize, depth: usize, row: usize, col: usize) {
        let start = self.offset(normal, material, depth);
        self.words[start + row] |= 1u64 << col;
    }

    /// Visible faces of one orientation.
    pub fn faces_for(&self, normal: FaceNormal) -> usize {
        let len = self.material_count * CHUNK_AREA;
        self.words[normal.index() * len..][..len]
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum()
    }

    /// Count total visible faces.
    pub fn total_faces(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
