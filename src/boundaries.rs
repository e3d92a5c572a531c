//! Boundary-condition kernels: open boundaries, outflow reset, inflow
//! pinning, and wall conditions (sharp and distance-field based).

use glam::{BVec3, Vec3};
use thiserror::Error;

use crate::flags::FlagGrid;
use crate::grid::RealGrid;
use crate::kernel::apply_to_mac;
use crate::mac::MacGrid;
use crate::particles::{CellParticleIndex, ParticleSystem};

/// Boundary descriptor parse failures. Fatal configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoundaryError {
    #[error("invalid axis character '{0}' in boundary descriptor, expected one of xyzXYZ")]
    InvalidAxisChar(char),
}

/// Parse a face descriptor over the alphabet `xyzXYZ`. Lowercase marks the
/// lower face of an axis open, uppercase the upper face.
pub fn parse_open_bound(desc: &str) -> Result<(BVec3, BVec3), BoundaryError> {
    let mut lower = BVec3::FALSE;
    let mut upper = BVec3::FALSE;
    for c in desc.chars() {
        match c {
            'x' => lower.x = true,
            'y' => lower.y = true,
            'z' => lower.z = true,
            'X' => upper.x = true,
            'Y' => upper.y = true,
            'Z' => upper.z = true,
            _ => return Err(BoundaryError::InvalidAxisChar(c)),
        }
    }
    Ok((lower, upper))
}

/// Reclassify obstacle cells near the designated open faces.
///
/// A cell switches type only when it sits inside an open band and, on
/// every axis, is either in an open band or strictly inside the domain
/// shell. Corner cells bordering a closed face therefore stay obstacle,
/// so an open face never punches through a nominally closed wall.
///
/// `cell_type` defaults to `OUTFLOW | EMPTY`. An empty descriptor is a
/// no-op.
pub fn set_open_bound(
    flags: &mut FlagGrid,
    b_width: usize,
    desc: &str,
    cell_type: Option<i32>,
) -> Result<(), BoundaryError> {
    let (lower, upper) = parse_open_bound(desc)?;
    if desc.is_empty() {
        return Ok(());
    }
    let new_type = cell_type.unwrap_or(FlagGrid::OUTFLOW | FlagGrid::EMPTY);
    let (sx, sy, sz) = (flags.size_x(), flags.size_y(), flags.size_z());
    let is3d = flags.is_3d();
    let bw = b_width;
    let band = |lo: bool, up: bool, c: usize, size: usize| -> (bool, bool) {
        (lo && c <= bw, up && c + bw + 1 >= size)
    };
    let inner = |c: usize, size: usize| c > 0 && c + 1 < size;
    for k in 0..sz {
        for j in 0..sy {
            for i in 0..sx {
                if !flags.is_obstacle(i, j, k) {
                    continue;
                }
                let (lo_x, up_x) = band(lower.x, upper.x, i, sx);
                let (lo_y, up_y) = band(lower.y, upper.y, j, sy);
                let (lo_z, up_z) = if is3d {
                    band(lower.z, upper.z, k, sz)
                } else {
                    (false, false)
                };
                let in_band =
                    lo_x || up_x || lo_y || up_y || (is3d && (lo_z || up_z));
                let qual_x = lo_x || up_x || inner(i, sx);
                let qual_y = lo_y || up_y || inner(j, sy);
                let qual_z = !is3d || lo_z || up_z || inner(k, sz);
                if in_band && qual_x && qual_y && qual_z {
                    flags.set_raw(i, j, k, new_type);
                }
            }
        }
    }
    Ok(())
}

/// Drain fluid presence from outflow cells.
///
/// Every outflow cell becomes empty (fluid bit cleared, outflow bit
/// retained so the cell keeps draining). A supplied level set resets to
/// 0.5, a supplied scalar field to 0. Particles inside outflow cells are
/// killed, through the cell index when given or an O(N) position scan
/// otherwise; the particle system compacts exactly once at the end.
pub fn reset_outflow(
    flags: &mut FlagGrid,
    mut phi: Option<&mut RealGrid>,
    mut parts: Option<&mut ParticleSystem>,
    mut real: Option<&mut RealGrid>,
    index: Option<&CellParticleIndex>,
) {
    if parts.is_some() && index.is_none() && (phi.is_some() || real.is_some()) {
        log::warn!("outflow reset: no particle index supplied, falling back to full scan");
    }
    let (sx, sy, sz) = (flags.size_x(), flags.size_y(), flags.size_z());
    for k in 0..sz {
        for j in 0..sy {
            for i in 0..sx {
                if !flags.is_outflow(i, j, k) {
                    continue;
                }
                let raw = flags.raw(i, j, k);
                flags.set_raw(i, j, k, (raw | FlagGrid::EMPTY) & !FlagGrid::FLUID);
                if let Some(phi) = phi.as_deref_mut() {
                    phi.set(i, j, k, 0.5);
                }
                if let Some(real) = real.as_deref_mut() {
                    real.set(i, j, k, 0.0);
                }
                if let (Some(parts), Some(index)) = (parts.as_deref_mut(), index) {
                    let cell = flags.cell_index(i, j, k);
                    for &p in index.cell_particles(cell) {
                        parts.kill(p as usize);
                    }
                }
            }
        }
    }
    if let Some(parts) = parts.as_deref_mut() {
        if index.is_none() {
            for idx in 0..parts.len() {
                if parts.is_active(idx) && flags.is_outflow_at(parts.position(idx)) {
                    parts.kill(idx);
                }
            }
        }
        parts.compress();
    }
}

/// Pin the velocity to `value` on the two face layers nearest one domain
/// boundary per descriptor character (alphabet as in [`parse_open_bound`]).
///
/// Characters are applied as they are parsed; an invalid character aborts
/// the call, leaving earlier characters applied.
pub fn set_inflow_bcs(vel: &mut MacGrid, dir: &str, value: Vec3) -> Result<(), BoundaryError> {
    let (sx, sy, sz) = (vel.size_x(), vel.size_y(), vel.size_z());
    let is3d = vel.is_3d();
    for c in dir.chars() {
        let (dim, upper) = match c {
            'x' => (0, false),
            'y' => (1, false),
            'z' => (2, false),
            'X' => (0, true),
            'Y' => (1, true),
            'Z' => (2, true),
            _ => return Err(BoundaryError::InvalidAxisChar(c)),
        };
        let size = [sx, sy, sz][dim];
        let p0 = if upper { size - 1 } else { 0 };
        for layer in [p0, p0 + 1] {
            if layer >= size {
                continue;
            }
            let zval = if is3d { value.z } else { 0.0 };
            match dim {
                0 => {
                    for k in 0..sz {
                        for j in 0..sy {
                            vel.set(layer, j, k, Vec3::new(value.x, value.y, zval));
                        }
                    }
                }
                1 => {
                    for k in 0..sz {
                        for i in 0..sx {
                            vel.set(i, layer, k, Vec3::new(value.x, value.y, zval));
                        }
                    }
                }
                _ => {
                    for j in 0..sy {
                        for i in 0..sx {
                            vel.set(i, j, layer, Vec3::new(value.x, value.y, zval));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// Enforce wall boundary conditions on the velocity.
///
/// Without `phi_obs`, the sharp variant redirects faces shared with an
/// obstacle cell to the obstacle velocity (zero when absent), forces z to
/// zero on 2D domains, and zeroes tangential components next to stick
/// cells. With `phi_obs`, the fractional variant projects the normal
/// component out of each face near the obstacle surface, using a
/// four-sample face-averaged gradient of the distance field as the
/// surface normal. The fractional pass writes to a scratch grid and swaps
/// it in; cells without a full one-cell halo keep their copied velocity.
pub fn set_wall_bcs(
    flags: &FlagGrid,
    vel: &mut MacGrid,
    obvel: Option<&MacGrid>,
    phi_obs: Option<&RealGrid>,
) {
    match phi_obs {
        None => set_wall_bcs_sharp(flags, vel, obvel),
        Some(phi) => set_wall_bcs_frac(flags, vel, obvel, phi),
    }
}

fn set_wall_bcs_sharp(flags: &FlagGrid, vel: &mut MacGrid, obvel: Option<&MacGrid>) {
    let is3d = flags.is_3d();
    let (sx, sy, sz) = (flags.size_x(), flags.size_y(), flags.size_z());
    apply_to_mac(vel, 0, |i, j, k, u, v, w| {
        let cur_fluid = flags.is_fluid(i, j, k);
        let cur_obs = flags.is_obstacle(i, j, k);
        if !cur_fluid && !cur_obs {
            return;
        }
        let bcs = match obvel {
            Some(ov) => ov.get(i, j, k),
            None => Vec3::ZERO,
        };
        if i > 0 && flags.is_obstacle(i - 1, j, k) {
            *u = bcs.x;
        }
        if i > 0 && cur_obs && flags.is_fluid(i - 1, j, k) {
            *u = bcs.x;
        }
        if j > 0 && flags.is_obstacle(i, j - 1, k) {
            *v = bcs.y;
        }
        if j > 0 && cur_obs && flags.is_fluid(i, j - 1, k) {
            *v = bcs.y;
        }
        if !is3d {
            *w = 0.0;
        } else {
            if k > 0 && flags.is_obstacle(i, j, k - 1) {
                *w = bcs.z;
            }
            if k > 0 && cur_obs && flags.is_fluid(i, j, k - 1) {
                *w = bcs.z;
            }
        }
        if cur_fluid {
            if (i > 0 && flags.is_stick(i - 1, j, k))
                || (i + 1 < sx && flags.is_stick(i + 1, j, k))
            {
                *v = 0.0;
                *w = 0.0;
            }
            if (j > 0 && flags.is_stick(i, j - 1, k))
                || (j + 1 < sy && flags.is_stick(i, j + 1, k))
            {
                *u = 0.0;
                *w = 0.0;
            }
            if is3d
                && ((k > 0 && flags.is_stick(i, j, k - 1))
                    || (k + 1 < sz && flags.is_stick(i, j, k + 1)))
            {
                *u = 0.0;
                *v = 0.0;
            }
        }
    });
}

fn set_wall_bcs_frac(
    flags: &FlagGrid,
    vel: &mut MacGrid,
    obvel: Option<&MacGrid>,
    phi_obs: &RealGrid,
) {
    let is3d = phi_obs.is_3d();
    let mut target = MacGrid::new(vel.size_x(), vel.size_y(), vel.size_z());
    {
        let vel = &*vel;
        apply_to_mac(&mut target, 0, |i, j, k, tu, tv, tw| {
            *tu = vel.u.get(i, j, k);
            *tv = vel.v.get(i, j, k);
            *tw = vel.w.get(i, j, k);
            let cur_fluid = flags.is_fluid(i, j, k);
            let cur_obs = flags.is_obstacle(i, j, k);
            if !cur_fluid && !cur_obs {
                return;
            }
            if !flags.is_in_bounds(i as i32, j as i32, k as i32, 1) {
                return;
            }

            // x face
            if cur_obs || flags.is_obstacle(i - 1, j, k) {
                let tmp1 = 0.5 * (phi_obs.get(i, j, k) + phi_obs.get(i - 1, j, k));
                let mut tmp2 = 0.5 * (phi_obs.get(i, j + 1, k) + phi_obs.get(i - 1, j + 1, k));
                let phi1 = 0.5 * (tmp1 + tmp2);
                tmp2 = 0.5 * (phi_obs.get(i, j - 1, k) + phi_obs.get(i - 1, j - 1, k));
                let phi2 = 0.5 * (tmp1 + tmp2);
                let mut dphi = Vec3::new(
                    phi_obs.get(i, j, k) - phi_obs.get(i - 1, j, k),
                    phi1 - phi2,
                    0.0,
                );
                if is3d {
                    tmp2 = 0.5 * (phi_obs.get(i, j, k + 1) + phi_obs.get(i - 1, j, k + 1));
                    let phi3 = 0.5 * (tmp1 + tmp2);
                    tmp2 = 0.5 * (phi_obs.get(i, j, k - 1) + phi_obs.get(i - 1, j, k - 1));
                    let phi4 = 0.5 * (tmp1 + tmp2);
                    dphi.z = phi3 - phi4;
                }
                let n = dphi.normalize_or_zero();
                let vel_mac = vel.at_mac_x(i, j, k);
                *tu = vel_mac.x - n.dot(vel_mac) * n.x;
                if let Some(ov) = obvel {
                    *tu += n.dot(ov.at_mac_x(i, j, k)) * n.x;
                }
            }

            // y face
            if cur_obs || flags.is_obstacle(i, j - 1, k) {
                let tmp1 = 0.5 * (phi_obs.get(i, j, k) + phi_obs.get(i, j - 1, k));
                let mut tmp2 = 0.5 * (phi_obs.get(i + 1, j, k) + phi_obs.get(i + 1, j - 1, k));
                let phi1 = 0.5 * (tmp1 + tmp2);
                tmp2 = 0.5 * (phi_obs.get(i - 1, j, k) + phi_obs.get(i - 1, j - 1, k));
                let phi2 = 0.5 * (tmp1 + tmp2);
                let mut dphi = Vec3::new(
                    phi1 - phi2,
                    phi_obs.get(i, j, k) - phi_obs.get(i, j - 1, k),
                    0.0,
                );
                if is3d {
                    tmp2 = 0.5 * (phi_obs.get(i, j, k + 1) + phi_obs.get(i, j - 1, k + 1));
                    let phi3 = 0.5 * (tmp1 + tmp2);
                    tmp2 = 0.5 * (phi_obs.get(i, j, k - 1) + phi_obs.get(i, j - 1, k - 1));
                    let phi4 = 0.5 * (tmp1 + tmp2);
                    dphi.z = phi3 - phi4;
                }
                let n = dphi.normalize_or_zero();
                let vel_mac = vel.at_mac_y(i, j, k);
                *tv = vel_mac.y - n.dot(vel_mac) * n.y;
                if let Some(ov) = obvel {
                    *tv += n.dot(ov.at_mac_y(i, j, k)) * n.y;
                }
            }

            // z face
            if is3d && (cur_obs || flags.is_obstacle(i, j, k - 1)) {
                let tmp1 = 0.5 * (phi_obs.get(i, j, k) + phi_obs.get(i, j, k - 1));
                let mut tmp2 = 0.5 * (phi_obs.get(i + 1, j, k) + phi_obs.get(i + 1, j, k - 1));
                let phi1 = 0.5 * (tmp1 + tmp2);
                tmp2 = 0.5 * (phi_obs.get(i - 1, j, k) + phi_obs.get(i - 1, j, k - 1));
                let phi2 = 0.5 * (tmp1 + tmp2);
                tmp2 = 0.5 * (phi_obs.get(i, j + 1, k) + phi_obs.get(i, j + 1, k - 1));
                let phi3 = 0.5 * (tmp1 + tmp2);
                tmp2 = 0.5 * (phi_obs.get(i, j - 1, k) + phi_obs.get(i, j - 1, k - 1));
                let phi4 = 0.5 * (tmp1 + tmp2);
                let dphi = Vec3::new(
                    phi1 - phi2,
                    phi3 - phi4,
                    phi_obs.get(i, j, k) - phi_obs.get(i, j, k - 1),
                );
                let n = dphi.normalize_or_zero();
                let vel_mac = vel.at_mac_z(i, j, k);
                *tw = vel_mac.z - n.dot(vel_mac) * n.z;
                if let Some(ov) = obvel {
                    *tw += n.dot(ov.at_mac_z(i, j, k)) * n.z;
                }
            }
        });
    }
    vel.swap(&mut target);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor() {
        let (lo, up) = parse_open_bound("xY").unwrap();
        assert!(lo.x && !lo.y && !lo.z);
        assert!(!up.x && up.y && !up.z);
        assert_eq!(
            parse_open_bound("xq"),
            Err(BoundaryError::InvalidAxisChar('q'))
        );
    }

    #[test]
    fn test_open_bound_default_type() {
        let mut flags = FlagGrid::new(4, 4, 1);
        for j in 0..4 {
            for i in 0..4 {
                flags.set_raw(i, j, 0, FlagGrid::OBSTACLE);
            }
        }
        set_open_bound(&mut flags, 1, "x", None).unwrap();
        for j in [1, 2] {
            for i in [0, 1] {
                assert!(flags.is_outflow(i, j, 0), "({},{}) should be outflow", i, j);
                assert!(flags.is_empty(i, j, 0));
            }
        }
        // Closed-face corners stay walls.
        for j in [0, 3] {
            for i in 0..4 {
                assert!(flags.is_obstacle(i, j, 0));
            }
        }
    }

    #[test]
    fn test_open_bound_empty_descriptor_noop() {
        let mut flags = FlagGrid::new(4, 4, 1);
        flags.initialize_domain(1);
        let before: Vec<i32> = (0..4)
            .flat_map(|j| (0..4).map(move |i| (i, j)))
            .map(|(i, j)| flags.raw(i, j, 0))
            .collect();
        set_open_bound(&mut flags, 1, "", None).unwrap();
        let after: Vec<i32> = (0..4)
            .flat_map(|j| (0..4).map(move |i| (i, j)))
            .map(|(i, j)| flags.raw(i, j, 0))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_inflow_pins_two_layers() {
        let mut vel = MacGrid::new(5, 5, 1);
        set_inflow_bcs(&mut vel, "x", Vec3::new(2.0, 1.0, 7.0)).unwrap();
        for j in 0..5 {
            assert_eq!(vel.u.get(0, j, 0), 2.0);
            assert_eq!(vel.u.get(1, j, 0), 2.0);
            assert_eq!(vel.v.get(0, j, 0), 1.0);
            assert_eq!(vel.w.get(0, j, 0), 0.0, "2D keeps z at zero");
        }
        assert_eq!(vel.u.get(2, 2, 0), 0.0);
    }

    #[test]
    fn test_inflow_upper_face_single_layer() {
        let mut vel = MacGrid::new(5, 5, 1);
        set_inflow_bcs(&mut vel, "X", Vec3::new(-1.0, 0.0, 0.0)).unwrap();
        for j in 0..5 {
            assert_eq!(vel.u.get(4, j, 0), -1.0);
            assert_eq!(vel.u.get(3, j, 0), 0.0);
        }
    }

    #[test]
    fn test_inflow_invalid_char() {
        let mut vel = MacGrid::new(4, 4, 1);
        assert_eq!(
            set_inflow_bcs(&mut vel, "w", Vec3::ZERO),
            Err(BoundaryError::InvalidAxisChar('w'))
        );
    }
}
