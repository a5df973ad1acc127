//! Benchmarks for shot grouping, spike analysis, and a synthetic full run.
//!
//! Run with: cargo bench
//!
//! The FFmpeg benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{
    hint::black_box,
    path::{Path, PathBuf},
};

use criterion::Criterion;
use image::DynamicImage;
use shotreel::{
    AudioSpikeAnalyzer, BattingZone, BoundingBox, Detection, DetectionTrack, FfmpegLogLevel,
    MediaFile, MediaSink, MediaSource, OutputSegment, RunConfig, ShotError, ShotPipeline,
    merge_events,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// Silent frames over a soundtrack that is loud every seventh second.
struct BenchSource {
    duration: f64,
    path: PathBuf,
}

impl MediaSource for BenchSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, _timestamp: f64) -> Result<DynamicImage, ShotError> {
        Ok(DynamicImage::new_rgb8(8, 8))
    }

    fn audio_samples(
        &mut self,
        start: f64,
        end: f64,
        sample_rate: u32,
    ) -> Result<Vec<f32>, ShotError> {
        let center = ((start + end) / 2.0).round() as u64;
        let amplitude = if center % 7 == 0 { 0.8 } else { 0.1 };
        let count = ((end - start) * sample_rate as f64) as usize;
        Ok(vec![amplitude; count])
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

struct NullSink;

impl MediaSink for NullSink {
    fn cut(&mut self, _: &Path, _: &OutputSegment, _: &Path) -> Result<(), ShotError> {
        Ok(())
    }
}

fn benchmark_merge(criterion: &mut Criterion) {
    // Bursts of three events every ten seconds over a two-hour match.
    let events: Vec<u64> = (0..720u64)
        .flat_map(|burst| [burst * 10, burst * 10 + 1, burst * 10 + 2])
        .collect();

    criterion.bench_function("merge 2160 raw events", |bencher| {
        bencher.iter(|| merge_events(black_box(&events), 2));
    });
}

fn benchmark_spike(criterion: &mut Criterion) {
    let analyzer = AudioSpikeAnalyzer::new(1.8);
    let mut source = BenchSource {
        duration: 600.0,
        path: PathBuf::from("bench.mp4"),
    };

    criterion.bench_function("spike check (synthetic audio)", |bencher| {
        bencher.iter(|| analyzer.is_spike(&mut source, black_box(70.0)).unwrap());
    });
}

fn benchmark_synthetic_run(criterion: &mut Criterion) {
    let dir = std::env::temp_dir().join("shotreel-bench");
    let zone = BattingZone::new(0, 0, 1000, 1000).unwrap();
    let config = RunConfig::new(2, 2.0, 2.0, 30.0, 1.8).unwrap();
    let pipeline = ShotPipeline::new(zone, config, &dir).unwrap();

    let mut track = DetectionTrack::new();
    for t in 0..300u64 {
        let y = if t % 7 == 0 { 400.0 } else { 300.0 };
        track.insert(
            t,
            vec![Detection::person(BoundingBox::new(480.0, y - 50.0, 520.0, y + 50.0), 0.9)],
        );
    }

    criterion.bench_function("pipeline run (300s synthetic)", |bencher| {
        bencher.iter(|| {
            let mut source = BenchSource {
                duration: 300.0,
                path: PathBuf::from("bench.mp4"),
            };
            pipeline
                .run(&mut source, &mut track, &mut NullSink)
                .unwrap()
        });
    });
}

fn benchmark_frame_decode(criterion: &mut Criterion) {
    shotreel::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    criterion.bench_function("decode frame at 3s", |bencher| {
        let mut source = MediaFile::open(SAMPLE_VIDEO).unwrap();
        bencher.iter(|| source.frame_at(black_box(3.0)).unwrap());
    });
}

criterion::criterion_group!(
    benches,
    benchmark_merge,
    benchmark_spike,
    benchmark_synthetic_run,
    benchmark_frame_decode,
);
criterion::criterion_main!(benches);
