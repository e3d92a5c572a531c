use criterion::{criterion_group, criterion_main, Criterion};
use glam::Vec3;
use stagflow::{boundaries, forces, FlagGrid, Solver};

fn bench_domain() -> (Solver, FlagGrid) {
    let solver = Solver::new(64, 64, 64, 1.0 / 64.0);
    let mut flags = solver.alloc_flags();
    flags.initialize_domain(1);
    for k in 1..32 {
        for j in 1..32 {
            for i in 1..63 {
                flags.set_raw(i, j, k, FlagGrid::FLUID);
            }
        }
    }
    (solver, flags)
}

fn bench_add_gravity(c: &mut Criterion) {
    let (solver, flags) = bench_domain();
    let mut vel = solver.alloc_mac();
    c.bench_function("add_gravity 64^3", |b| {
        b.iter(|| {
            forces::add_gravity(&solver, &flags, &mut vel, Vec3::new(0.0, -9.81, 0.0), None);
        })
    });
}

fn bench_wall_bcs(c: &mut Criterion) {
    let (solver, flags) = bench_domain();
    let mut vel = solver.alloc_mac();
    vel.u.fill(1.0);
    vel.v.fill(-0.5);
    c.bench_function("set_wall_bcs sharp 64^3", |b| {
        b.iter(|| {
            boundaries::set_wall_bcs(&flags, &mut vel, None, None);
        })
    });
}

fn bench_confinement(c: &mut Criterion) {
    let (solver, flags) = bench_domain();
    let mut vel = solver.alloc_mac();
    for (idx, u) in vel.u.data.iter_mut().enumerate() {
        *u = (idx % 13) as f32 * 0.1;
    }
    c.bench_function("vorticity_confinement 64^3", |b| {
        b.iter(|| {
            forces::vorticity_confinement(&mut vel, &flags, 0.2);
        })
    });
}

criterion_group!(benches, bench_add_gravity, bench_wall_bcs, bench_confinement);
criterion_main!(benches);
