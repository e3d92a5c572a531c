//! Cell classification flags.
//!
//! Each cell carries an `i32` bitmask. The base types FLUID, OBSTACLE and
//! EMPTY are mutually exclusive in well-formed grids; INFLOW, OUTFLOW and
//! STICK are modifier bits that combine with a base type.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Bitmask cell-type grid.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlagGrid {
    grid: Grid<i32>,
}

impl FlagGrid {
    /// Cell contains fluid.
    pub const FLUID: i32 = 1;
    /// Cell is a solid obstacle.
    pub const OBSTACLE: i32 = 2;
    /// Cell is open air.
    pub const EMPTY: i32 = 4;
    /// Cell is a velocity source.
    pub const INFLOW: i32 = 8;
    /// Cell drains fluid out of the domain.
    pub const OUTFLOW: i32 = 16;
    /// Obstacle cell with a no-slip tangential condition.
    pub const STICK: i32 = 128;

    /// Create a flag grid with every cell set to `EMPTY`.
    pub fn new(size_x: usize, size_y: usize, size_z: usize) -> Self {
        Self {
            grid: Grid::new(size_x, size_y, size_z, Self::EMPTY),
        }
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.grid.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.grid.size_y
    }

    #[inline]
    pub fn size_z(&self) -> usize {
        self.grid.size_z
    }

    #[inline]
    pub fn is_3d(&self) -> bool {
        self.grid.is_3d()
    }

    /// Flat index of cell (i, j, k).
    #[inline]
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        self.grid.index(i, j, k)
    }

    /// Raw bitmask at cell (i, j, k).
    #[inline]
    pub fn raw(&self, i: usize, j: usize, k: usize) -> i32 {
        self.grid.get(i, j, k)
    }

    /// Overwrite the bitmask at cell (i, j, k).
    #[inline]
    pub fn set_raw(&mut self, i: usize, j: usize, k: usize, flags: i32) {
        self.grid.set(i, j, k, flags);
    }

    #[inline]
    pub fn is_fluid(&self, i: usize, j: usize, k: usize) -> bool {
        self.raw(i, j, k) & Self::FLUID != 0
    }

    #[inline]
    pub fn is_obstacle(&self, i: usize, j: usize, k: usize) -> bool {
        self.raw(i, j, k) & Self::OBSTACLE != 0
    }

    #[inline]
    pub fn is_empty(&self, i: usize, j: usize, k: usize) -> bool {
        self.raw(i, j, k) & Self::EMPTY != 0
    }

    #[inline]
    pub fn is_inflow(&self, i: usize, j: usize, k: usize) -> bool {
        self.raw(i, j, k) & Self::INFLOW != 0
    }

    #[inline]
    pub fn is_outflow(&self, i: usize, j: usize, k: usize) -> bool {
        self.raw(i, j, k) & Self::OUTFLOW != 0
    }

    #[inline]
    pub fn is_stick(&self, i: usize, j: usize, k: usize) -> bool {
        self.raw(i, j, k) & Self::STICK != 0
    }

    /// Bounds test with margin, forwarded from the underlying grid.
    #[inline]
    pub fn is_in_bounds(&self, i: i32, j: i32, k: i32, bnd: i32) -> bool {
        self.grid.is_in_bounds(i, j, k, bnd)
    }

    /// Cell containing a position given in grid units.
    #[inline]
    pub fn cell_of(&self, pos: Vec3) -> (i32, i32, i32) {
        (
            pos.x.floor() as i32,
            pos.y.floor() as i32,
            pos.z.floor() as i32,
        )
    }

    /// Whether the cell containing a grid-space position is outflow.
    /// Positions outside the domain report false.
    pub fn is_outflow_at(&self, pos: Vec3) -> bool {
        let (i, j, k) = self.cell_of(pos);
        let k = if self.is_3d() { k } else { 0 };
        if !self.is_in_bounds(i, j, k, 0) {
            return false;
        }
        self.is_outflow(i as usize, j as usize, k as usize)
    }

    /// Wall the domain border with OBSTACLE to a depth of `wall_width`
    /// cells and set the interior to EMPTY. In 2D the z axis gets no wall.
    pub fn initialize_domain(&mut self, wall_width: usize) {
        let (sx, sy, sz) = (self.size_x(), self.size_y(), self.size_z());
        let is3d = self.is_3d();
        let w = wall_width;
        for k in 0..sz {
            for j in 0..sy {
                for i in 0..sx {
                    let mut wall = i < w || j < w || i >= sx - w || j >= sy - w;
                    if is3d {
                        wall = wall || k < w || k >= sz - w;
                    }
                    let t = if wall { Self::OBSTACLE } else { Self::EMPTY };
                    self.set_raw(i, j, k, t);
                }
            }
        }
    }
}
