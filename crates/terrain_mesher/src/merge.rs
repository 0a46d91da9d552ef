//! Greedy rectangle extraction from one face plane.
//!
//! Rows are scanned top to bottom. In each row the lowest run of set bits
//! fixes a rectangle's width, then the rectangle grows down through every
//! following row that still holds that whole run. Consumed bits are cleared,
//! so no cell is covered twice. Width is always maximized before height.

use crate::core::CHUNK_SIZE;

/// Rectangle in plane coordinates: `x` is the bit (column), `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaneRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PlaneRect {
    /// Bits covered in each of the rectangle's rows.
    #[inline]
    pub fn row_mask(&self) -> u64 {
        run_mask(self.x, self.width)
    }

    /// Set the rectangle's bits in `plane`.
    pub fn rasterize(&self, plane: &mut [u64]) {
        let mask = self.row_mask();
        let rows = self.y as usize..(self.y + self.height) as usize;
        plane[rows].iter_mut().for_each(|row| *row |= mask);
    }

    #[inline]
    pub fn area(&self) -> u32 {
        self.width * self.height
    }
}

/// `width` consecutive bits starting at bit `x`.
///
/// ```
/// # use terrain_mesher::merge::run_mask;
/// assert_eq!(run_mask(2, 3), 0b11100);
/// assert_eq!(run_mask(0, 64), u64::MAX);
/// ```
#[inline]
pub fn run_mask(x: u32, width: u32) -> u64 {
    debug_assert!(width >= 1 && x + width <= CHUNK_SIZE as u32);
    if width >= u64::BITS {
        u64::MAX
    } else {
        ((1u64 << width) - 1) << x
    }
}

/// Extract rectangles covering exactly the set bits of `plane`.
///
/// Rectangles are emitted in row-major order of their top-left corner. The
/// plane is all zero afterwards. The first error returned by `emit` stops the
/// scan and is passed through. `plane` holds at most [`CHUNK_SIZE`] rows and
/// no rectangle is taller than that.
pub fn greedy_merge_plane<E, F>(plane: &mut [u64], mut emit: F) -> Result<(), E>
where
    F: FnMut(PlaneRect) -> Result<(), E>,
{
    debug_assert!(plane.len() <= CHUNK_SIZE, "plane has {} rows", plane.len());
    let rows = plane.len();

    for y in 0..rows {
        let mut row = plane[y];
        let mut x = 0u32;

        while row != 0 {
            // Skip to the next run.
            let gap = row.trailing_zeros();
            row >>= gap;
            x += gap;

            let width = (!row).trailing_zeros();
            let mask = run_mask(x, width);

            let mut height = 1;
            while y + height < rows && height < CHUNK_SIZE && plane[y + height] & mask == mask {
                plane[y + height] &= !mask;
                height += 1;
            }

            emit(PlaneRect {
                x,
                y: y as u32,
                width,
                height: height as u32,
            })?;

            row = row.checked_shr(width).unwrap_or(0);
            x += width;
        }

        plane[y] = 0;
    }

    Ok(())
}

/// Rectangles of a plane, leaving the plane untouched.
pub fn plane_rects(plane: &[u64]) -> Vec<PlaneRect> {
    let mut scratch = plane.to_vec();
    let mut rects = Vec::new();
    let _ = greedy_merge_plane::<std::convert::Infallible, _>(&mut scratch, |rect| {
        rects.push(rect);
        Ok(())
    });
    rects
}
