//! External force kernels: body forces, buoyancy, vorticity confinement.
//!
//! Forces write velocity faces by the donor rule: a face updates when the
//! lower neighbor is fluid, or the cell itself is fluid and the neighbor is
//! empty. Obstacle faces never move.

use glam::Vec3;

use crate::common::{curl, get_centered, grid_norm};
use crate::flags::FlagGrid;
use crate::grid::{RealGrid, Vec3Grid};
use crate::kernel::apply_to_mac;
use crate::mac::MacGrid;
use crate::solver::Solver;

/// Apply a per-cell vector force field to the velocity.
///
/// `include` suppresses the update wherever the mask is positive. With
/// `is_mac` the force grid is read as face-staggered; otherwise it is
/// cell-centered and averaged onto faces. `additive` accumulates instead
/// of overwriting.
pub fn apply_force_field(
    flags: &FlagGrid,
    vel: &mut MacGrid,
    force: &Vec3Grid,
    include: Option<&RealGrid>,
    additive: bool,
    is_mac: bool,
) {
    let is3d = flags.is_3d();
    apply_to_mac(vel, 1, |i, j, k, u, v, w| {
        let cur_fluid = flags.is_fluid(i, j, k);
        let cur_empty = flags.is_empty(i, j, k);
        if !cur_fluid && !cur_empty {
            return;
        }
        if let Some(mask) = include {
            if mask.get(i, j, k) > 0.0 {
                return;
            }
        }
        let fx = if is_mac {
            force.get(i, j, k).x
        } else {
            0.5 * (force.get(i - 1, j, k).x + force.get(i, j, k).x)
        };
        let fy = if is_mac {
            force.get(i, j, k).y
        } else {
            0.5 * (force.get(i, j - 1, k).y + force.get(i, j, k).y)
        };
        if flags.is_fluid(i - 1, j, k) || (cur_fluid && flags.is_empty(i - 1, j, k)) {
            *u = if additive { *u + fx } else { fx };
        }
        if flags.is_fluid(i, j - 1, k) || (cur_fluid && flags.is_empty(i, j - 1, k)) {
            *v = if additive { *v + fy } else { fy };
        }
        if is3d && (flags.is_fluid(i, j, k - 1) || (cur_fluid && flags.is_empty(i, j, k - 1))) {
            let fz = if is_mac {
                force.get(i, j, k).z
            } else {
                0.5 * (force.get(i, j, k - 1).z + force.get(i, j, k).z)
            };
            *w = if additive { *w + fz } else { fz };
        }
    });
}

/// Apply a uniform force vector to the velocity.
///
/// `exclude` suppresses the update wherever the mask is negative.
pub fn apply_force(
    flags: &FlagGrid,
    vel: &mut MacGrid,
    force: Vec3,
    exclude: Option<&RealGrid>,
    additive: bool,
) {
    let is3d = flags.is_3d();
    apply_to_mac(vel, 1, |i, j, k, u, v, w| {
        let cur_fluid = flags.is_fluid(i, j, k);
        let cur_empty = flags.is_empty(i, j, k);
        if !cur_fluid && !cur_empty {
            return;
        }
        if let Some(mask) = exclude {
            if mask.get(i, j, k) < 0.0 {
                return;
            }
        }
        if flags.is_fluid(i - 1, j, k) || (cur_fluid && flags.is_empty(i - 1, j, k)) {
            *u = if additive { *u + force.x } else { force.x };
        }
        if flags.is_fluid(i, j - 1, k) || (cur_fluid && flags.is_empty(i, j - 1, k)) {
            *v = if additive { *v + force.y } else { force.y };
        }
        if is3d && (flags.is_fluid(i, j, k - 1) || (cur_fluid && flags.is_empty(i, j, k - 1))) {
            *w = if additive { *w + force.z } else { force.z };
        }
    });
}

/// Accumulate gravity scaled to grid units: `g * dt / dx`.
pub fn add_gravity(
    solver: &Solver,
    flags: &FlagGrid,
    vel: &mut MacGrid,
    gravity: Vec3,
    exclude: Option<&RealGrid>,
) {
    let f = gravity * solver.dt / solver.dx;
    apply_force(flags, vel, f, exclude, true);
}

/// Accumulate gravity already expressed in grid units: `g * dt`.
pub fn add_gravity_no_scale(
    solver: &Solver,
    flags: &FlagGrid,
    vel: &mut MacGrid,
    gravity: Vec3,
    exclude: Option<&RealGrid>,
) {
    let f = gravity * solver.dt;
    apply_force(flags, vel, f, exclude, true);
}

/// Accumulate a force field into the velocity.
pub fn add_force_field(
    flags: &FlagGrid,
    vel: &mut MacGrid,
    force: &Vec3Grid,
    region: Option<&RealGrid>,
    is_mac: bool,
) {
    apply_force_field(flags, vel, force, region, true, is_mac);
}

/// Overwrite velocity faces from a force field. Idempotent.
pub fn set_force_field(
    flags: &FlagGrid,
    vel: &mut MacGrid,
    force: &Vec3Grid,
    region: Option<&RealGrid>,
    is_mac: bool,
) {
    apply_force_field(flags, vel, force, region, false, is_mac);
}

/// Buoyancy from a scalar density-like factor.
///
/// The face force is the factor averaged across the two adjacent cells,
/// scaled by `-g * dt / dx * coefficient`. Only fluid-fluid faces update.
pub fn add_buoyancy(
    solver: &Solver,
    flags: &FlagGrid,
    factor: &RealGrid,
    vel: &mut MacGrid,
    gravity: Vec3,
    coefficient: f32,
) {
    let strength = -gravity * solver.dt / solver.dx * coefficient;
    let is3d = flags.is_3d();
    apply_to_mac(vel, 1, |i, j, k, u, v, w| {
        if !flags.is_fluid(i, j, k) {
            return;
        }
        if flags.is_fluid(i - 1, j, k) {
            *u += 0.5 * strength.x * (factor.get(i, j, k) + factor.get(i - 1, j, k));
        }
        if flags.is_fluid(i, j - 1, k) {
            *v += 0.5 * strength.y * (factor.get(i, j, k) + factor.get(i, j - 1, k));
        }
        if is3d && flags.is_fluid(i, j, k - 1) {
            *w += 0.5 * strength.z * (factor.get(i, j, k) + factor.get(i, j, k - 1));
        }
    });
}

/// Seed an initial velocity without ever pushing a face past the target.
///
/// Per face, the cell-centered source field is averaged onto the face and
/// added, then clamped so the result never exceeds the larger (or falls
/// below the smaller, for negative targets) of the old velocity and the
/// target itself.
pub fn set_initial_velocity(flags: &FlagGrid, vel: &mut MacGrid, invel: &Vec3Grid) {
    let is3d = flags.is_3d();
    let clamped = |old: f32, target: f32| -> f32 {
        let sum = old + target;
        if target > 0.0 {
            sum.min(old.max(target))
        } else {
            sum.max(old.min(target))
        }
    };
    apply_to_mac(vel, 1, |i, j, k, u, v, w| {
        let cur_fluid = flags.is_fluid(i, j, k);
        let cur_empty = flags.is_empty(i, j, k);
        if !cur_fluid && !cur_empty {
            return;
        }
        if flags.is_fluid(i - 1, j, k) || (cur_fluid && flags.is_empty(i - 1, j, k)) {
            let fx = 0.5 * (invel.get(i - 1, j, k).x + invel.get(i, j, k).x);
            *u = clamped(*u, fx);
        }
        if flags.is_fluid(i, j - 1, k) || (cur_fluid && flags.is_empty(i, j - 1, k)) {
            let fy = 0.5 * (invel.get(i, j - 1, k).y + invel.get(i, j, k).y);
            *v = clamped(*v, fy);
        }
        if is3d && (flags.is_fluid(i, j, k - 1) || (cur_fluid && flags.is_empty(i, j, k - 1))) {
            let fz = 0.5 * (invel.get(i, j, k - 1).z + invel.get(i, j, k).z);
            *w = clamped(*w, fz);
        }
    });
}

/// Vorticity confinement: re-inject rotational motion lost to the coarse
/// grid. The confinement force is `strength * n x omega`, where omega is
/// the curl of the centered velocity and n the normalized gradient of its
/// magnitude. Flat vorticity fields produce zero force.
pub fn vorticity_confinement(vel: &mut MacGrid, flags: &FlagGrid, strength: f32) {
    let (sx, sy, sz) = (vel.size_x(), vel.size_y(), vel.size_z());
    let is3d = vel.is_3d();
    let mut center = Vec3Grid::new(sx, sy, sz, Vec3::ZERO);
    let mut curl_grid = Vec3Grid::new(sx, sy, sz, Vec3::ZERO);
    let mut norm = RealGrid::new(sx, sy, sz, 0.0);
    let mut force = Vec3Grid::new(sx, sy, sz, Vec3::ZERO);

    get_centered(&mut center, vel);
    curl(&center, &mut curl_grid);
    grid_norm(&mut norm, &curl_grid);

    crate::kernel::apply_to_grid(&mut force, 1, |i, j, k, out| {
        let grad = 0.5
            * Vec3::new(
                norm.get(i + 1, j, k) - norm.get(i - 1, j, k),
                norm.get(i, j + 1, k) - norm.get(i, j - 1, k),
                if is3d {
                    norm.get(i, j, k + 1) - norm.get(i, j, k - 1)
                } else {
                    0.0
                },
            );
        let n = grad.normalize_or_zero();
        *out = strength * n.cross(curl_grid.get(i, j, k));
    });

    apply_force_field(flags, vel, &force, None, true, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fluid_box(sx: usize, sy: usize, sz: usize) -> FlagGrid {
        let mut flags = FlagGrid::new(sx, sy, sz);
        flags.initialize_domain(1);
        let kz = if sz > 1 { 1..sz - 1 } else { 0..1 };
        for k in kz {
            for j in 1..sy - 1 {
                for i in 1..sx - 1 {
                    flags.set_raw(i, j, k, FlagGrid::FLUID);
                }
            }
        }
        flags
    }

    #[test]
    fn test_uniform_force_fluid_faces() {
        let flags = fluid_box(6, 6, 6);
        let mut vel = MacGrid::new(6, 6, 6);
        apply_force(&flags, &mut vel, Vec3::new(0.0, -1.0, 0.0), None, true);
        // Face between two fluid cells moves.
        assert_eq!(vel.v.get(2, 3, 2), -1.0);
        // Face into the obstacle wall stays.
        assert_eq!(vel.v.get(2, 1, 2), 0.0);
    }

    #[test]
    fn test_exclude_mask_blocks_update() {
        let flags = fluid_box(6, 6, 1);
        let mut vel = MacGrid::new(6, 6, 1);
        let mut mask = RealGrid::new(6, 6, 1, 1.0);
        mask.set(3, 3, 0, -1.0);
        apply_force(&flags, &mut vel, Vec3::new(1.0, 0.0, 0.0), Some(&mask), true);
        assert_eq!(vel.u.get(3, 3, 0), 0.0, "excluded cell kept its faces");
        assert_eq!(vel.u.get(2, 3, 0), 1.0);
    }

    #[test]
    fn test_include_mask_blocks_force_field() {
        let flags = fluid_box(6, 6, 1);
        let mut vel = MacGrid::new(6, 6, 1);
        let force = Vec3Grid::new(6, 6, 1, Vec3::new(2.0, 0.0, 0.0));
        let mut mask = RealGrid::new(6, 6, 1, 0.0);
        mask.set(3, 3, 0, 1.0);
        apply_force_field(&flags, &mut vel, &force, Some(&mask), true, true);
        assert_eq!(vel.u.get(3, 3, 0), 0.0);
        assert_eq!(vel.u.get(2, 3, 0), 2.0);
    }

    #[test]
    fn test_gravity_scaling() {
        let mut solver = Solver::new(6, 6, 1, 0.5);
        solver.dt = 0.1;
        let flags = fluid_box(6, 6, 1);
        let mut vel = MacGrid::new(6, 6, 1);
        add_gravity(&solver, &flags, &mut vel, Vec3::new(0.0, -10.0, 0.0), None);
        // -10 * 0.1 / 0.5 = -2
        assert!((vel.v.get(2, 3, 0) + 2.0).abs() < 1e-6);
        let mut vel2 = MacGrid::new(6, 6, 1);
        add_gravity_no_scale(&solver, &flags, &mut vel2, Vec3::new(0.0, -10.0, 0.0), None);
        assert!((vel2.v.get(2, 3, 0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_buoyancy_fluid_fluid_only() {
        let solver = Solver::new(6, 6, 1, 1.0);
        let mut flags = fluid_box(6, 6, 1);
        flags.set_raw(2, 3, 0, FlagGrid::EMPTY);
        let mut density = RealGrid::new(6, 6, 1, 0.0);
        density.fill(1.0);
        let mut vel = MacGrid::new(6, 6, 1);
        add_buoyancy(
            &solver,
            &flags,
            &density,
            &mut vel,
            Vec3::new(0.0, -1.0, 0.0),
            1.0,
        );
        // Face between fluid (3,3) and fluid (3,2) gets the upward push.
        let s = solver.dt;
        assert!((vel.v.get(3, 3, 0) - s).abs() < 1e-6);
        // Face above the empty cell does not.
        assert_eq!(vel.v.get(2, 4, 0), 0.0);
    }

    #[test]
    fn test_initial_velocity_clamps() {
        let flags = fluid_box(6, 6, 1);
        let mut vel = MacGrid::new(6, 6, 1);
        let invel = Vec3Grid::new(6, 6, 1, Vec3::new(2.0, 0.0, 0.0));
        set_initial_velocity(&flags, &mut vel, &invel);
        assert!((vel.u.get(3, 3, 0) - 2.0).abs() < 1e-6);
        // A second application does not stack past the target.
        set_initial_velocity(&flags, &mut vel, &invel);
        assert!((vel.u.get(3, 3, 0) - 2.0).abs() < 1e-6);
        // A face already faster than the target keeps its speed.
        vel.u.set(3, 3, 0, 5.0);
        set_initial_velocity(&flags, &mut vel, &invel);
        assert!((vel.u.get(3, 3, 0) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_confinement_zero_on_still_fluid() {
        let flags = fluid_box(6, 6, 6);
        let mut vel = MacGrid::new(6, 6, 6);
        vorticity_confinement(&mut vel, &flags, 0.5);
        for &x in vel.u.data.iter().chain(&vel.v.data).chain(&vel.w.data) {
            assert_eq!(x, 0.0, "still fluid must stay still");
        }
    }
}
