//! Dense grid storage for solver fields.
//!
//! A grid is a row-major 3D lattice over scalar, vector, or flag values.
//! 2D domains are represented with `size_z == 1`; kernels treat the z axis
//! as degenerate in that case.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Dense row-major grid over `T`, addressable by integer cell coordinate.
///
/// Grids are allocated once per domain and never resized during a step.
/// Callers are responsible for passing dimension-matched grids into
/// kernels; the kernels index without per-cell dimension checks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid<T> {
    /// Number of cells in X direction
    pub size_x: usize,
    /// Number of cells in Y direction
    pub size_y: usize,
    /// Number of cells in Z direction (1 for 2D domains)
    pub size_z: usize,
    /// Cell values, row-major: index = (k * size_y + j) * size_x + i
    pub data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Create a grid filled with `value`.
    pub fn new(size_x: usize, size_y: usize, size_z: usize, value: T) -> Self {
        assert!(
            size_x >= 1 && size_y >= 1 && size_z >= 1,
            "grid dimensions must be at least 1, got {}x{}x{}",
            size_x,
            size_y,
            size_z
        );
        Self {
            size_x,
            size_y,
            size_z,
            data: vec![value; size_x * size_y * size_z],
        }
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: T) {
        let n = self.data.len();
        self.data.clear();
        self.data.resize(n, value);
    }
}

impl<T> Grid<T> {
    /// Flat index of cell (i, j, k).
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.size_y + j) * self.size_x + i
    }

    /// Total number of cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.size_x * self.size_y * self.size_z
    }

    /// Whether this grid spans a 3D domain.
    #[inline]
    pub fn is_3d(&self) -> bool {
        self.size_z > 1
    }

    /// Bounds test with a margin of `bnd` cells on every axis.
    ///
    /// For 2D grids the z coordinate must be exactly 0; the margin applies
    /// to the x and y axes only.
    #[inline]
    pub fn is_in_bounds(&self, i: i32, j: i32, k: i32, bnd: i32) -> bool {
        let mut ok = i >= bnd
            && j >= bnd
            && i < self.size_x as i32 - bnd
            && j < self.size_y as i32 - bnd;
        if self.is_3d() {
            ok = ok && k >= bnd && k < self.size_z as i32 - bnd;
        } else {
            ok = ok && k == 0;
        }
        ok
    }

    /// Swap storage with another grid of identical dimensions.
    pub fn swap(&mut self, other: &mut Self) {
        assert!(
            self.size_x == other.size_x
                && self.size_y == other.size_y
                && self.size_z == other.size_z,
            "cannot swap grids of different dimensions"
        );
        std::mem::swap(&mut self.data, &mut other.data);
    }
}

impl<T: Copy> Grid<T> {
    /// Value at cell (i, j, k).
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> T {
        self.data[self.index(i, j, k)]
    }

    /// Mutable reference to cell (i, j, k).
    #[inline]
    pub fn get_mut(&mut self, i: usize, j: usize, k: usize) -> &mut T {
        let idx = self.index(i, j, k);
        &mut self.data[idx]
    }

    /// Set cell (i, j, k) to `value`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: T) {
        let idx = self.index(i, j, k);
        self.data[idx] = value;
    }
}

/// Scalar field (density, signed distance, masks).
pub type RealGrid = Grid<f32>;

/// Cell-centered vector field (forces, curl).
pub type Vec3Grid = Grid<Vec3>;
