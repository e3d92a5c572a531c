//! Solver context: domain dimensions, grid spacing, timestep.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::flags::FlagGrid;
use crate::grid::{Grid, RealGrid, Vec3Grid};
use crate::mac::MacGrid;

/// Owns the domain parameters that scale force kernels and allocates
/// dimension-matched grids.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Solver {
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
    /// Cell size in world units
    pub dx: f32,
    /// Timestep in seconds
    pub dt: f32,
}

impl Solver {
    /// Create a solver context. Use `size_z == 1` for 2D domains.
    pub fn new(size_x: usize, size_y: usize, size_z: usize, dx: f32) -> Self {
        assert!(dx > 0.0, "cell size must be positive, got {}", dx);
        Self {
            size_x,
            size_y,
            size_z,
            dx,
            dt: 1.0 / 60.0,
        }
    }

    #[inline]
    pub fn is_3d(&self) -> bool {
        self.size_z > 1
    }

    pub fn alloc_real(&self) -> RealGrid {
        Grid::new(self.size_x, self.size_y, self.size_z, 0.0)
    }

    pub fn alloc_vec3(&self) -> Vec3Grid {
        Grid::new(self.size_x, self.size_y, self.size_z, Vec3::ZERO)
    }

    pub fn alloc_flags(&self) -> FlagGrid {
        FlagGrid::new(self.size_x, self.size_y, self.size_z)
    }

    pub fn alloc_mac(&self) -> MacGrid {
        MacGrid::new(self.size_x, self.size_y, self.size_z)
    }
}
