//! Benchmarks for subdivision.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{Point3, Vector2};
use quadling::prelude::*;

fn create_grid_seed(n: usize) -> Mesh {
    let mut coord = Vec::with_capacity((n + 1) * (n + 1));
    let mut texco = Vec::with_capacity((n + 1) * (n + 1));

    for j in 0..=n {
        for i in 0..=n {
            coord.push(Point3::new(i as f32, j as f32, 0.0));
            texco.push(Vector2::new(i as f32 / n as f32, j as f32 / n as f32));
        }
    }

    let mut fvert = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            let a = (j * (n + 1) + i) as u32;
            let w = (n + 1) as u32;
            fvert.push([a, a + 1, a + 1 + w, a + w]);
        }
    }
    let fuvs = fvert.clone();

    Mesh::new(coord, texco, fvert, fuvs).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let seed = create_grid_seed(50);

    c.bench_function("subdivide_grid_50x50", |b| {
        b.iter(|| subdivide(&seed, None, &SubdivideOptions::default()).unwrap());
    });
}

fn bench_update_positions(c: &mut Criterion) {
    let mut seed = create_grid_seed(50);
    let mut refined = subdivide(&seed, None, &SubdivideOptions::default()).unwrap();

    // Perturb once so the update is not a no-op on an all-flat grid.
    let mut coord = seed.coords().to_vec();
    for (i, p) in coord.iter_mut().enumerate() {
        p.z = (i % 7) as f32 * 0.1;
    }
    seed.set_coord(coord).unwrap();

    c.bench_function("update_positions_grid_50x50", |b| {
        b.iter(|| refined.update_positions(&seed).unwrap());
    });
}

fn bench_weight_lift(c: &mut Criterion) {
    let seed = create_grid_seed(50);
    let refined = subdivide(&seed, None, &SubdivideOptions::default()).unwrap();
    let weights: Vec<f32> = (0..seed.num_vertices()).map(|i| (i % 13) as f32 / 13.0).collect();

    c.bench_function("lift_weights_grid_50x50", |b| {
        b.iter(|| refined.lift(&weights));
    });
}

criterion_group!(benches, bench_build, bench_update_positions, bench_weight_lift);
criterion_main!(benches);
