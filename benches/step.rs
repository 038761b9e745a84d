use criterion::{Criterion, black_box, criterion_group, criterion_main};

use flurry::{Preset, Scene, SimulationConfig};

fn warmed(preset: Preset) -> Scene {
    let mut scene = Scene::from_config(&SimulationConfig::preset(preset)).unwrap();
    for frame in 0..600 {
        scene.advance(frame as f64 / 60.0);
    }
    scene
}

fn bench_step(c: &mut Criterion) {
    for preset in [Preset::Magnets, Preset::Magnets3d, Preset::Swarm] {
        let mut scene = warmed(preset);
        let mut now = 10.0;
        c.bench_function(&format!("advance/{:?}", preset), |b| {
            b.iter(|| {
                now += 1.0 / 60.0;
                black_box(scene.advance(now))
            })
        });
    }
}

fn bench_snapshot(c: &mut Criterion) {
    let scene = warmed(Preset::Magnets);
    c.bench_function("snapshot/Magnets", |b| b.iter(|| black_box(scene.snapshot())));
}

criterion_group!(benches, bench_step, bench_snapshot);
criterion_main!(benches);
