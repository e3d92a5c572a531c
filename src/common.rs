//! Shared field operators: cell-centered resampling, curl, magnitude.

use glam::Vec3;

use crate::grid::{RealGrid, Vec3Grid};
use crate::kernel::apply_to_grid;
use crate::mac::MacGrid;

/// Resample a staggered velocity field to cell centers.
///
/// Writes the interior (one-cell margin); border cells keep their previous
/// values. 2D leaves z at zero.
pub fn get_centered(center: &mut Vec3Grid, vel: &MacGrid) {
    let is3d = vel.is_3d();
    apply_to_grid(center, 1, |i, j, k, out| {
        let x = 0.5 * (vel.u.get(i, j, k) + vel.u.get(i + 1, j, k));
        let y = 0.5 * (vel.v.get(i, j, k) + vel.v.get(i, j + 1, k));
        let z = if is3d {
            0.5 * (vel.w.get(i, j, k) + vel.w.get(i, j, k + 1))
        } else {
            0.0
        };
        *out = Vec3::new(x, y, z);
    });
}

/// Central-difference curl of a cell-centered vector field.
///
/// In 2D only the z component of the curl is nonzero; the x and y
/// components stay at zero.
pub fn curl(center: &Vec3Grid, dst: &mut Vec3Grid) {
    let is3d = center.is_3d();
    apply_to_grid(dst, 1, |i, j, k, out| {
        let mut c = Vec3::new(
            0.0,
            0.0,
            0.5 * ((center.get(i + 1, j, k).y - center.get(i - 1, j, k).y)
                - (center.get(i, j + 1, k).x - center.get(i, j - 1, k).x)),
        );
        if is3d {
            c.x = 0.5
                * ((center.get(i, j + 1, k).z - center.get(i, j - 1, k).z)
                    - (center.get(i, j, k + 1).y - center.get(i, j, k - 1).y));
            c.y = 0.5
                * ((center.get(i, j, k + 1).x - center.get(i, j, k - 1).x)
                    - (center.get(i + 1, j, k).z - center.get(i - 1, j, k).z));
        }
        *out = c;
    });
}

/// Per-cell Euclidean norm of a vector field.
pub fn grid_norm(norm: &mut RealGrid, src: &Vec3Grid) {
    apply_to_grid(norm, 0, |i, j, k, out| {
        *out = src.get(i, j, k).length();
    });
}
