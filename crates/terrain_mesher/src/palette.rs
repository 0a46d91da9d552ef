//! Per-chunk material compaction.
//!
//! Face planes are allocated per material, so only the materials a chunk
//! actually contains get a plane stack. The palette maps each visible
//! material id to a dense index in ascending id order.

use crate::columns::{ColumnEntry, MATERIAL_INVISIBLE};

/// Material id to dense plane index, rebuilt for every chunk.
///
/// # Examples
/// ```
/// # use terrain_mesher::{ColumnEntry, MaterialPalette};
/// let mut palette = MaterialPalette::new();
/// palette.rebuild(&[ColumnEntry::new(0, 7), ColumnEntry::new(1, 0), ColumnEntry::new(2, 3)]);
///
/// assert_eq!(palette.materials(), &[3, 7]);
/// assert_eq!(palette.index_of(7), Some(1));
/// assert_eq!(palette.index_of(0), None);
/// ```
#[derive(Clone)]
pub struct MaterialPalette {
    lookup: [Option<u8>; 256],
    materials: Vec<u8>,
}

impl MaterialPalette {
    pub fn new() -> Self {
        Self {
            lookup: [None; 256],
            materials: Vec::new(),
        }
    }

    /// Collect the visible materials of `entries`. Invisible material 0 never
    /// gets an index.
    pub fn rebuild(&mut self, entries: &[ColumnEntry]) {
        let mut present = [false; 256];
        for entry in entries {
            present[entry.material as usize] = true;
        }
        present[MATERIAL_INVISIBLE as usize] = false;

        self.lookup = [None; 256];
        self.materials.clear();
        for (id, &p) in present.iter().enumerate() {
            if p {
                self.lookup[id] = Some(self.materials.len() as u8);
                self.materials.push(id as u8);
            }
        }
    }

    /// Dense index of `material`, `None` if absent or invisible.
    #[inline]
    pub fn index_of(&self, material: u8) -> Option<usize> {
        self.lookup[material as usize].map(usize::from)
    }

    /// Material id at dense `index`.
    #[inline]
    pub fn material(&self, index: usize) -> u8 {
        self.materials[index]
    }

    /// Visible materials in ascending order.
    pub fn materials(&self) -> &[u8] {
        &self.materials
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self::new()
    }
}
