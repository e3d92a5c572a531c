//! Staggered (MAC) velocity grid.
//!
//! Each component grid shares the domain dimensions: `u(i, j, k)` is the
//! x-velocity at the lower x-face of cell (i, j, k), and likewise for v
//! and w. 2D domains keep `w` allocated; kernels force it to zero.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::grid::RealGrid;

/// Face-staggered velocity field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MacGrid {
    pub u: RealGrid,
    pub v: RealGrid,
    pub w: RealGrid,
}

impl MacGrid {
    /// Create a zero velocity field over the given domain.
    pub fn new(size_x: usize, size_y: usize, size_z: usize) -> Self {
        Self {
            u: RealGrid::new(size_x, size_y, size_z, 0.0),
            v: RealGrid::new(size_x, size_y, size_z, 0.0),
            w: RealGrid::new(size_x, size_y, size_z, 0.0),
        }
    }

    #[inline]
    pub fn size_x(&self) -> usize {
        self.u.size_x
    }

    #[inline]
    pub fn size_y(&self) -> usize {
        self.u.size_y
    }

    #[inline]
    pub fn size_z(&self) -> usize {
        self.u.size_z
    }

    #[inline]
    pub fn is_3d(&self) -> bool {
        self.u.is_3d()
    }

    /// Component triple at cell (i, j, k), without interpolation.
    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Vec3 {
        Vec3::new(self.u.get(i, j, k), self.v.get(i, j, k), self.w.get(i, j, k))
    }

    /// Overwrite all three face components stored at cell (i, j, k).
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: Vec3) {
        self.u.set(i, j, k, value.x);
        self.v.set(i, j, k, value.y);
        self.w.set(i, j, k, value.z);
    }

    /// Full velocity vector interpolated to the lower x-face of cell
    /// (i, j, k). Requires `i >= 1` and, in 3D, `k <= size_z - 2`.
    #[inline]
    pub fn at_mac_x(&self, i: usize, j: usize, k: usize) -> Vec3 {
        let x = self.u.get(i, j, k);
        let y = 0.25
            * (self.v.get(i, j, k)
                + self.v.get(i - 1, j, k)
                + self.v.get(i, j + 1, k)
                + self.v.get(i - 1, j + 1, k));
        let z = if self.is_3d() {
            0.25 * (self.w.get(i, j, k)
                + self.w.get(i - 1, j, k)
                + self.w.get(i, j, k + 1)
                + self.w.get(i - 1, j, k + 1))
        } else {
            0.0
        };
        Vec3::new(x, y, z)
    }

    /// Full velocity vector interpolated to the lower y-face of cell
    /// (i, j, k). Requires `j >= 1` and, in 3D, `k <= size_z - 2`.
    #[inline]
    pub fn at_mac_y(&self, i: usize, j: usize, k: usize) -> Vec3 {
        let x = 0.25
            * (self.u.get(i, j, k)
                + self.u.get(i, j - 1, k)
                + self.u.get(i + 1, j, k)
                + self.u.get(i + 1, j - 1, k));
        let y = self.v.get(i, j, k);
        let z = if self.is_3d() {
            0.25 * (self.w.get(i, j, k)
                + self.w.get(i, j - 1, k)
                + self.w.get(i, j, k + 1)
                + self.w.get(i, j - 1, k + 1))
        } else {
            0.0
        };
        Vec3::new(x, y, z)
    }

    /// Full velocity vector interpolated to the lower z-face of cell
    /// (i, j, k). 3D only; requires `k >= 1`.
    #[inline]
    pub fn at_mac_z(&self, i: usize, j: usize, k: usize) -> Vec3 {
        let x = 0.25
            * (self.u.get(i, j, k)
                + self.u.get(i, j, k - 1)
                + self.u.get(i + 1, j, k)
                + self.u.get(i + 1, j, k - 1));
        let y = 0.25
            * (self.v.get(i, j, k)
                + self.v.get(i, j, k - 1)
                + self.v.get(i, j + 1, k)
                + self.v.get(i, j + 1, k - 1));
        let z = self.w.get(i, j, k);
        Vec3::new(x, y, z)
    }

    /// Swap storage with another velocity field of identical dimensions.
    pub fn swap(&mut self, other: &mut Self) {
        self.u.swap(&mut other.u);
        self.v.swap(&mut other.v);
        self.w.swap(&mut other.w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_components() {
        let mut vel = MacGrid::new(4, 4, 4);
        vel.set(2, 1, 3, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(vel.get(2, 1, 3), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(vel.u.get(2, 1, 3), 1.0);
    }

    #[test]
    fn test_at_mac_x_uniform_field() {
        let mut vel = MacGrid::new(4, 4, 4);
        vel.u.fill(1.0);
        vel.v.fill(2.0);
        vel.w.fill(3.0);
        let s = vel.at_mac_x(2, 1, 1);
        assert!((s.x - 1.0).abs() < 1e-6);
        assert!((s.y - 2.0).abs() < 1e-6);
        assert!((s.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_at_mac_x_2d_zero_z() {
        let mut vel = MacGrid::new(4, 4, 1);
        vel.w.fill(9.0);
        let s = vel.at_mac_x(2, 1, 0);
        assert_eq!(s.z, 0.0, "2D face samples must carry no z component");
    }

    #[test]
    fn test_at_mac_z_uniform_field() {
        let mut vel = MacGrid::new(4, 4, 4);
        vel.u.fill(1.0);
        vel.v.fill(2.0);
        vel.w.fill(3.0);
        let s = vel.at_mac_z(1, 1, 2);
        assert!((s - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }
}
