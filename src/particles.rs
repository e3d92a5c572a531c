//! Particle records and the per-cell particle index.
//!
//! Kill marks a particle inactive without moving memory; `compress`
//! performs the single physical compaction at the end of a pass.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::flags::FlagGrid;

/// One particle record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Particle {
    /// Position in grid units
    pub position: Vec3,
    /// Inactive particles are skipped by kernels and removed on compress
    pub active: bool,
}

/// Indexable particle collection with deferred compaction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParticleSystem {
    list: Vec<Particle>,
    compressions: u32,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            list: Vec::with_capacity(capacity),
            compressions: 0,
        }
    }

    /// Add an active particle at `position` (grid units).
    pub fn spawn(&mut self, position: Vec3) {
        self.list.push(Particle {
            position,
            active: true,
        });
    }

    /// Number of records, including killed ones not yet compacted.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    #[inline]
    pub fn is_active(&self, idx: usize) -> bool {
        self.list[idx].active
    }

    #[inline]
    pub fn position(&self, idx: usize) -> Vec3 {
        self.list[idx].position
    }

    /// Mark a particle for removal.
    #[inline]
    pub fn kill(&mut self, idx: usize) {
        self.list[idx].active = false;
    }

    /// Number of active records.
    pub fn active_count(&self) -> usize {
        self.list.iter().filter(|p| p.active).count()
    }

    /// Physically remove killed records. Indices held by callers are
    /// invalid afterwards.
    pub fn compress(&mut self) {
        self.list.retain(|p| p.active);
        self.compressions += 1;
    }

    /// How many times `compress` has run. Test hook.
    pub fn compressions(&self) -> u32 {
        self.compressions
    }
}

/// Cell-to-particle lookup built by counting sort over flattened cell
/// indices. `starts[c]` is the offset of cell c's first particle in
/// `entries`; the entries of cell c end where cell c+1 begins.
#[derive(Clone, Debug, Default)]
pub struct CellParticleIndex {
    starts: Vec<u32>,
    entries: Vec<u32>,
}

impl CellParticleIndex {
    /// Build the index for the active particles inside the domain.
    /// Inactive and out-of-bounds particles are left out.
    pub fn build(parts: &ParticleSystem, flags: &FlagGrid) -> Self {
        let num_cells = flags.size_x() * flags.size_y() * flags.size_z();
        let mut counts = vec![0u32; num_cells];
        let cell_for = |pos: Vec3| -> Option<usize> {
            let (i, j, k) = flags.cell_of(pos);
            let k = if flags.is_3d() { k } else { 0 };
            if flags.is_in_bounds(i, j, k, 0) {
                Some(flags.cell_index(i as usize, j as usize, k as usize))
            } else {
                None
            }
        };
        for idx in 0..parts.len() {
            if !parts.is_active(idx) {
                continue;
            }
            if let Some(c) = cell_for(parts.position(idx)) {
                counts[c] += 1;
            }
        }
        let mut starts = vec![0u32; num_cells];
        let mut total = 0u32;
        for c in 0..num_cells {
            starts[c] = total;
            total += counts[c];
        }
        let mut entries = vec![0u32; total as usize];
        let mut cursor = starts.clone();
        for idx in 0..parts.len() {
            if !parts.is_active(idx) {
                continue;
            }
            if let Some(c) = cell_for(parts.position(idx)) {
                entries[cursor[c] as usize] = idx as u32;
                cursor[c] += 1;
            }
        }
        Self { starts, entries }
    }

    /// Particle indices binned into the given flattened cell.
    pub fn cell_particles(&self, cell: usize) -> &[u32] {
        let start = self.starts[cell] as usize;
        let end = if cell + 1 < self.starts.len() {
            self.starts[cell + 1] as usize
        } else {
            self.entries.len()
        };
        &self.entries[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_then_compress() {
        let mut parts = ParticleSystem::new();
        parts.spawn(Vec3::new(0.5, 0.5, 0.0));
        parts.spawn(Vec3::new(1.5, 0.5, 0.0));
        parts.spawn(Vec3::new(2.5, 0.5, 0.0));
        parts.kill(1);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.active_count(), 2);
        parts.compress();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts.compressions(), 1);
        assert_eq!(parts.position(1), Vec3::new(2.5, 0.5, 0.0));
    }

    #[test]
    fn test_index_bins_by_cell() {
        let flags = FlagGrid::new(4, 4, 1);
        let mut parts = ParticleSystem::new();
        parts.spawn(Vec3::new(1.2, 1.8, 0.0));
        parts.spawn(Vec3::new(2.5, 2.5, 0.0));
        parts.spawn(Vec3::new(1.9, 1.1, 0.0));
        let index = CellParticleIndex::build(&parts, &flags);
        let c = flags.cell_index(1, 1, 0);
        let mut in_cell: Vec<u32> = index.cell_particles(c).to_vec();
        in_cell.sort_unstable();
        assert_eq!(in_cell, vec![0, 2]);
        assert_eq!(index.cell_particles(flags.cell_index(2, 2, 0)), &[1]);
        assert!(index.cell_particles(flags.cell_index(0, 0, 0)).is_empty());
    }

    #[test]
    fn test_index_skips_inactive_and_outside() {
        let flags = FlagGrid::new(4, 4, 1);
        let mut parts = ParticleSystem::new();
        parts.spawn(Vec3::new(1.5, 1.5, 0.0));
        parts.spawn(Vec3::new(-2.0, 1.5, 0.0));
        parts.spawn(Vec3::new(1.5, 1.5, 0.0));
        parts.kill(2);
        let index = CellParticleIndex::build(&parts, &flags);
        assert_eq!(index.cell_particles(flags.cell_index(1, 1, 0)), &[0]);
    }

    #[test]
    fn test_last_cell_range() {
        let flags = FlagGrid::new(2, 2, 1);
        let mut parts = ParticleSystem::new();
        parts.spawn(Vec3::new(1.5, 1.5, 0.0));
        parts.spawn(Vec3::new(1.5, 1.5, 0.0));
        let index = CellParticleIndex::build(&parts, &flags);
        assert_eq!(index.cell_particles(flags.cell_index(1, 1, 0)).len(), 2);
    }
}
