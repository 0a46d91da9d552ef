//! Statistics for a meshing run.

use crate::core::FACE_COUNT;

/// Counters from meshing a region, or one chunk of it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshStats {
    /// Chunks that held at least one stored voxel.
    pub chunks_meshed: usize,
    /// Vertical windows processed across those chunks.
    pub windows_meshed: usize,
    /// Visible unit faces before merging.
    pub visible_faces: usize,
    /// Squares emitted.
    pub square_count: usize,
    /// Squares per normal id.
    pub squares_per_normal: [usize; FACE_COUNT],
    /// Meshes emitted.
    pub mesh_count: usize,
    /// Wall time of the run (milliseconds). Zero where no clock is available.
    pub elapsed_ms: f64,
}

impl MeshStats {
    /// Fraction of unit faces removed by merging (1.0 = perfect, 0.0 = none).
    pub fn merge_efficiency(&self) -> f32 {
        if self.visible_faces > 0 {
            1.0 - (self.square_count as f32 / self.visible_faces as f32)
        } else {
            0.0
        }
    }

    /// Add another run's counters. Elapsed time is not summed.
    pub fn accumulate(&mut self, other: &MeshStats) {
        self.chunks_meshed += other.chunks_meshed;
        self.windows_meshed += other.windows_meshed;
        self.visible_faces += other.visible_faces;
        self.square_count += other.square_count;
        self.mesh_count += other.mesh_count;
        for (total, n) in self.squares_per_normal.iter_mut().zip(other.squares_per_normal) {
            *total += n;
        }
    }

    /// Check if any geometry was produced.
    pub fn any_squares(&self) -> bool {
        self.square_count > 0
    }
}
