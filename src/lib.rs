//! Force and boundary-condition kernels for a staggered-grid
//! incompressible-flow solver.
//!
//! The crate provides the per-step physics passes that sit between
//! advection and pressure projection: body forces (gravity, buoyancy,
//! vorticity confinement), open/inflow/outflow boundary maintenance, and
//! wall conditions in both a sharp flag-based and a sub-cell
//! distance-field-based variant. All kernels operate in place on grids
//! owned by the caller and run slab-parallel on the rayon pool.
//!
//! ```
//! use glam::Vec3;
//! use stagflow::{boundaries, forces, FlagGrid, Solver};
//!
//! let solver = Solver::new(16, 16, 16, 1.0 / 16.0);
//! let mut flags = solver.alloc_flags();
//! let mut vel = solver.alloc_mac();
//!
//! flags.initialize_domain(1);
//! for k in 1..8 {
//!     for j in 1..8 {
//!         for i in 1..8 {
//!             flags.set_raw(i, j, k, FlagGrid::FLUID);
//!         }
//!     }
//! }
//!
//! forces::add_gravity(&solver, &flags, &mut vel, Vec3::new(0.0, -9.81, 0.0), None);
//! boundaries::set_wall_bcs(&flags, &mut vel, None, None);
//! ```

pub mod boundaries;
pub mod common;
pub mod flags;
pub mod forces;
pub mod grid;
pub mod kernel;
pub mod mac;
pub mod particles;
pub mod solver;

pub use boundaries::BoundaryError;
pub use flags::FlagGrid;
pub use grid::{Grid, RealGrid, Vec3Grid};
pub use mac::MacGrid;
pub use particles::{CellParticleIndex, ParticleSystem};
pub use solver::Solver;
