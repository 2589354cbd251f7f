use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use maze_builder::animation::{ConstructionSequencer, Curve, Scheduler, Tween};
use maze_builder::config::BuildConfig;
use maze_builder::driver::run_to_completion;
use maze_builder::maze::generate;

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for size in [10u32, 50, 99] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| generate(black_box(size), black_box(size), black_box(42)))
        });
    }
    group.finish();
}

fn bench_tween_ticks(c: &mut Criterion) {
    c.bench_function("tick_1000_tweens", |b| {
        b.iter(|| {
            let scheduler = Scheduler::new();
            let values: Vec<_> = (0..1000)
                .map(|_| std::rc::Rc::new(std::cell::Cell::new(0.0f32)))
                .collect();
            let mut tweens: Vec<_> = values
                .iter()
                .map(|v| Tween::bound(&scheduler, v.clone(), Curve::EaseOutBack))
                .collect();
            for tween in &mut tweens {
                tween.start(1.0, Duration::from_millis(100)).expect("valid tween");
            }
            for _ in 0..8 {
                scheduler.tick(black_box(Duration::from_millis(16)));
            }
        })
    });
}

fn bench_full_construction(c: &mut Criterion) {
    c.bench_function("construct_20x20_instant", |b| {
        let config = BuildConfig::builder()
            .time_scale(0.0)
            .build()
            .expect("valid config");
        b.iter(|| {
            let scheduler = Scheduler::new();
            let sequencer = ConstructionSequencer::new(&scheduler, config.clone());
            sequencer
                .request_generation(20, 20, black_box(7))
                .expect("valid request");
            run_to_completion(&scheduler, &sequencer, Duration::from_millis(16), 10_000)
        })
    });
}

criterion_group!(
    benches,
    bench_generation,
    bench_tween_ticks,
    bench_full_construction
);
criterion_main!(benches);
