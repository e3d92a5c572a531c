//! Parallel kernel dispatch.
//!
//! Grid kernels are partitioned along the outermost axis (k, or j for 2D
//! domains) into slabs that run on the rayon pool; the inner loops stay
//! serial. Each axis iterates `[bnd, size - bnd)`. Slabs never synchronize
//! with each other, so per-cell closures must only write the cell they are
//! handed.

use rayon::prelude::*;

use crate::grid::Grid;
use crate::mac::MacGrid;

/// Run `op(i, j, k, &mut cell)` over every interior cell of `out`.
pub fn apply_to_grid<T, F>(out: &mut Grid<T>, bnd: usize, op: F)
where
    T: Send,
    F: Fn(usize, usize, usize, &mut T) + Send + Sync,
{
    let (sx, sy, sz) = (out.size_x, out.size_y, out.size_z);
    log::trace!("grid kernel dispatch: {}x{}x{} bnd={}", sx, sy, sz, bnd);
    if sz > 1 {
        out.data
            .par_chunks_mut(sx * sy)
            .enumerate()
            .for_each(|(k, slab)| {
                if k < bnd || k >= sz - bnd {
                    return;
                }
                for j in bnd..sy - bnd {
                    for i in bnd..sx - bnd {
                        op(i, j, k, &mut slab[j * sx + i]);
                    }
                }
            });
    } else {
        out.data.par_chunks_mut(sx).enumerate().for_each(|(j, row)| {
            if j < bnd || j >= sy - bnd {
                return;
            }
            for i in bnd..sx - bnd {
                op(i, j, 0, &mut row[i]);
            }
        });
    }
}

/// Run `op(i, j, k, &mut u, &mut v, &mut w)` over every interior cell of a
/// staggered velocity field, handing the closure the three face components
/// stored at that cell.
pub fn apply_to_mac<F>(vel: &mut MacGrid, bnd: usize, op: F)
where
    F: Fn(usize, usize, usize, &mut f32, &mut f32, &mut f32) + Send + Sync,
{
    let (sx, sy, sz) = (vel.size_x(), vel.size_y(), vel.size_z());
    let is3d = sz > 1;
    log::trace!("mac kernel dispatch: {}x{}x{} bnd={}", sx, sy, sz, bnd);
    let slab = if is3d { sx * sy } else { sx };
    vel.u
        .data
        .par_chunks_mut(slab)
        .zip(vel.v.data.par_chunks_mut(slab))
        .zip(vel.w.data.par_chunks_mut(slab))
        .enumerate()
        .for_each(|(outer, ((us, vs), ws))| {
            if is3d {
                let k = outer;
                if k < bnd || k >= sz - bnd {
                    return;
                }
                for j in bnd..sy - bnd {
                    for i in bnd..sx - bnd {
                        let c = j * sx + i;
                        op(i, j, k, &mut us[c], &mut vs[c], &mut ws[c]);
                    }
                }
            } else {
                let j = outer;
                if j < bnd || j >= sy - bnd {
                    return;
                }
                for i in bnd..sx - bnd {
                    op(i, j, 0, &mut us[i], &mut vs[i], &mut ws[i]);
                }
            }
        });
}
