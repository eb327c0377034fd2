//! Criterion benchmarks for the per-frame hot path
//!
//! Covers: feature extraction, detector evaluation, and the combined
//! extract + evaluate step a capture loop runs for every frame.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use motion_map::gesture::{GestureDetector, GestureLibrary};
use motion_map::pose::{FeatureExtractor, PoseFrame};
use std::collections::HashSet;

#[path = "../tests/common/mod.rs"]
mod common;

use common::Pose;

fn walking_sequence(len: u64) -> Vec<PoseFrame> {
    (0..len)
        .map(|i| {
            let pose = if i % 2 == 0 {
                Pose::neutral().left_knee_up()
            } else {
                Pose::neutral()
            };
            pose.frame(i * 33)
        })
        .collect()
}

fn bench_extract(c: &mut Criterion) {
    let extractor = FeatureExtractor::default();
    let frame = Pose::neutral().frame(0);

    c.bench_function("feature_extract", |b| {
        b.iter(|| extractor.extract(black_box(&frame)))
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let extractor = FeatureExtractor::default();
    let state = extractor.extract(&Pose::neutral().left_knee_up().frame(0));
    let Ok(state) = state else { return };
    let disabled = HashSet::new();

    c.bench_function("detector_evaluate", |b| {
        let mut detector = GestureDetector::new(GestureLibrary::default());
        b.iter(|| detector.evaluate(black_box(&state), &disabled))
    });
}

fn bench_frame_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_pipeline");
    let extractor = FeatureExtractor::default();
    let disabled = HashSet::new();

    for len in [30u64, 300, 1800] {
        let frames = walking_sequence(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &frames, |b, frames| {
            b.iter(|| {
                let mut detector = GestureDetector::new(GestureLibrary::default());
                let mut fired = 0usize;
                for frame in frames {
                    if let Ok(state) = extractor.extract(frame) {
                        fired += detector.evaluate(&state, &disabled).len();
                    }
                }
                black_box(fired)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract, bench_evaluate, bench_frame_pipeline);
criterion_main!(benches);
