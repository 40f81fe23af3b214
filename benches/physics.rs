//! Benchmarks for kinema solvers.

use criterion::{criterion_group, criterion_main, Criterion};
use kinema::*;

fn bench_cloth(c: &mut Criterion) {
    c.bench_function("cloth_20x20_60_steps", |b| {
        b.iter(|| {
            let config = ClothConfig::default().with_size(20, 20);
            let mut cloth: Cloth<Vec2<f32>> = Cloth::new(Vec2::new(0.0, 0.0), &config).unwrap();
            let solver_config = SolverConfig::new()
                .with_gravity(Vec2::new(0.0, -9.81))
                .with_iterations(4);
            for _ in 0..60 {
                cloth.step(1.0 / 60.0, Vec2::new(1.0, 0.0), &solver_config, &mut NoOpStepObserver);
            }
            cloth.positions()
        });
    });
}

fn bench_softbody(c: &mut Criterion) {
    c.bench_function("softbody_circle_32_60_steps", |b| {
        b.iter(|| {
            let mut body = SoftBody::circle(Vec2::new(0.0f32, 5.0), 2.0, 32, &SoftBodyConfig::default()).unwrap();
            body.set_bounds(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 20.0), 0.3).unwrap();
            let config = SolverConfig::new()
                .with_gravity(Vec2::new(0.0, -9.81))
                .with_iterations(8);
            for _ in 0..60 {
                body.step(1.0 / 60.0, Vec2::zero(), &config, &mut NoOpStepObserver);
            }
            body.positions()
        });
    });
}

fn bench_fluid(c: &mut Criterion) {
    let mut group = c.benchmark_group("fluid_400_particles_10_steps");
    for (name, search) in [("brute_force", NeighborSearch::BruteForce), ("grid", NeighborSearch::Grid)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let config = FluidConfig::default().with_neighbor_search(search);
                let mut fluid: Fluid<f32> = Fluid::new(config).unwrap();
                fluid.spawn_block(Vec2::new(1.0, 1.0), 20, 20, 0.5).unwrap();
                for _ in 0..10 {
                    fluid.step(1.0 / 120.0, Vec2::zero(), &mut NoOpStepObserver);
                }
                fluid.positions()
            });
        });
    }
    group.finish();
}

fn bench_ik(c: &mut Criterion) {
    c.bench_function("ik_8_bones_60_targets", |b| {
        b.iter(|| {
            let segments = [IkSegment::new(1.0f32).with_limits(-1.2, 1.2); 8];
            let mut chain = IkChain::new(Vec2::new(0.0, 0.0), &segments).unwrap();
            let config = IkConfig::default();
            for i in 0..60 {
                let t = i as f32 * 0.1;
                chain.solve(Vec2::new(t.cos() * 5.0, t.sin() * 5.0), &config, &mut NoOpStepObserver);
            }
            chain.end_effector()
        });
    });
}

fn bench_ragdoll(c: &mut Criterion) {
    c.bench_function("ragdoll_humanoid_120_steps", |b| {
        b.iter(|| {
            let mut doll: Ragdoll<f32> = Ragdoll::humanoid(Vec2::new(0.0, 2.0), RagdollConfig::new()).unwrap();
            doll.apply_impulse(HumanoidPart::Torso.index(), Vec2::new(10.0, 0.0));
            for _ in 0..120 {
                doll.step(1.0 / 60.0, Vec2::zero(), &mut NoOpStepObserver);
            }
            doll.parts()[0].position
        });
    });
}

criterion_group!(benches, bench_cloth, bench_softbody, bench_fluid, bench_ik, bench_ragdoll);
criterion_main!(benches);
