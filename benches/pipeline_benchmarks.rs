//! Benchmarks for per-frame processing and text conversion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgb, RgbImage};
use signease::{
    config::MotionConfig,
    constants::{LEFT_MOUTH_CORNER_INDEX, LOWER_LIP_INDEX, RIGHT_MOUTH_CORNER_INDEX, UPPER_LIP_INDEX},
    landmarks::{FaceLandmarks, Point2, ScriptedLandmarks},
    lip_reading::LipReader,
    motion_heuristic::MotionHeuristicReader,
    text_to_asl::translate,
    utils::image_conversion::rgb_to_nhwc,
};
use std::time::{Duration, Instant};

fn mouth(openness: f64) -> Option<FaceLandmarks> {
    Some(FaceLandmarks::from_indexed([
        (UPPER_LIP_INDEX, Point2::new(0.5, 0.5)),
        (LOWER_LIP_INDEX, Point2::new(0.5, 0.5 + openness * 0.2)),
        (LEFT_MOUTH_CORNER_INDEX, Point2::new(0.4, 0.55)),
        (RIGHT_MOUTH_CORNER_INDEX, Point2::new(0.6, 0.55)),
    ]))
}

fn benchmark_lip_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("lip_reader");
    let frame = RgbImage::new(640, 480);
    let openness: Vec<f64> = (0..300).map(|i| 0.3 + 0.1 * (f64::from(i) * 0.5).sin()).collect();

    group.bench_function("ingest_300_frames", |b| {
        b.iter(|| {
            let mut reader = LipReader::new(Box::new(ScriptedLandmarks::new(openness.iter().map(|&o| mouth(o)))));
            let start = Instant::now();
            for i in 0..openness.len() {
                black_box(reader.ingest_frame_at(&frame, start + Duration::from_millis(33 * i as u64)));
            }
        });
    });

    group.finish();
}

fn benchmark_preprocessing(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocessing");
    let frame = RgbImage::from_fn(640, 480, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));

    for size in [192u32, 640] {
        group.bench_with_input(BenchmarkId::new("rgb_to_nhwc", size), &size, |b, &size| {
            b.iter(|| black_box(rgb_to_nhwc(black_box(&frame), size)));
        });
    }

    let clip: Vec<RgbImage> = (0..30u8)
        .map(|i| RgbImage::from_pixel(320, 240, Rgb([i * 8, i * 8, i * 8])))
        .collect();
    let mut motion = MotionHeuristicReader::seeded(MotionConfig::default(), 7);
    group.bench_function("motion_heuristic_30", |b| {
        b.iter(|| black_box(motion.predict(black_box(&clip))));
    });

    group.finish();
}

fn benchmark_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_to_asl");
    for text in [
        "hello",
        "Hi, nice to meet you! How are you?",
        "good morning thank you see you again please help me go home",
    ] {
        group.bench_with_input(BenchmarkId::new("translate", text.len()), &text, |b, text| {
            b.iter(|| black_box(translate(black_box(text))));
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_lip_reader, benchmark_preprocessing, benchmark_translate);
criterion_main!(benches);
