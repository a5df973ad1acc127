//! Synthetic collaborators shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use image::DynamicImage;
use shotreel::{
    BattingZone, BoundingBox, Detection, DetectionTrack, MediaSink, MediaSource, OutputSegment,
    ProgressCallback, ProgressInfo, ShotError,
};

pub const FIXTURE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

pub const QUIET_AMPLITUDE: f32 = 0.1;
pub const LOUD_AMPLITUDE: f32 = 0.8;

/// A media source with blank frames and a constant-amplitude soundtrack
/// that is loud around a chosen set of seconds.
#[derive(Debug)]
pub struct SyntheticSource {
    duration: f64,
    loud_seconds: Vec<f64>,
    path: PathBuf,
    pub frame_requests: Vec<f64>,
    pub audio_requests: Vec<(f64, f64)>,
    pub fail_frame_at: Option<f64>,
}

impl SyntheticSource {
    pub fn new(duration: f64, loud_seconds: &[u64]) -> Self {
        Self {
            duration,
            loud_seconds: loud_seconds.iter().map(|&t| t as f64).collect(),
            path: PathBuf::from("synthetic.mp4"),
            frame_requests: Vec::new(),
            audio_requests: Vec::new(),
            fail_frame_at: None,
        }
    }

    fn amplitude(&self, start: f64, end: f64) -> f32 {
        let center = (start + end) / 2.0;
        if self
            .loud_seconds
            .iter()
            .any(|&loud| (center - loud).abs() < 0.5)
        {
            LOUD_AMPLITUDE
        } else {
            QUIET_AMPLITUDE
        }
    }
}

impl MediaSource for SyntheticSource {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, timestamp: f64) -> Result<DynamicImage, ShotError> {
        self.frame_requests.push(timestamp);
        if self.fail_frame_at == Some(timestamp) {
            return Err(ShotError::VideoDecodeError(format!(
                "synthetic failure at {timestamp}s"
            )));
        }
        Ok(DynamicImage::new_rgb8(4, 4))
    }

    fn audio_samples(
        &mut self,
        start: f64,
        end: f64,
        sample_rate: u32,
    ) -> Result<Vec<f32>, ShotError> {
        self.audio_requests.push((start, end));
        let count = (((end - start) * sample_rate as f64).round() as usize).max(1);
        let amplitude = self.amplitude(start, end);
        // Alternate sign so the signal looks like audio; energy is unaffected.
        Ok((0..count)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// A sink that records every cut and writes a placeholder file.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub cuts: Vec<(OutputSegment, PathBuf)>,
    /// 0-based cut index that fails.
    pub fail_on: Option<usize>,
}

impl MediaSink for RecordingSink {
    fn cut(
        &mut self,
        _source: &Path,
        segment: &OutputSegment,
        output: &Path,
    ) -> Result<(), ShotError> {
        if self.fail_on == Some(self.cuts.len()) {
            return Err(ShotError::ClipEncodeError("disk full".to_string()));
        }
        fs::write(output, format!("{:.1}-{:.1}", segment.start, segment.end))?;
        self.cuts.push((*segment, output.to_path_buf()));
        Ok(())
    }
}

/// Collects every report.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    infos: Mutex<Vec<ProgressInfo>>,
}

impl RecordingProgress {
    pub fn percents(&self) -> Vec<u8> {
        self.infos
            .lock()
            .unwrap()
            .iter()
            .map(|info| info.percent)
            .collect()
    }
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.infos.lock().unwrap().push(info.clone());
    }
}

pub fn zone() -> BattingZone {
    BattingZone::new(100, 100, 300, 300).unwrap()
}

/// A 20×40 person box centred on `(x, y)`.
pub fn person_at(x: f64, y: f64) -> Detection {
    Detection::person(BoundingBox::new(x - 10.0, y - 20.0, x + 10.0, y + 20.0), 0.9)
}

/// One in-zone person per second at the given vertical centres.
pub fn track_with_heights(heights: &BTreeMap<u64, f64>) -> DetectionTrack {
    let mut track = DetectionTrack::new();
    for (&t, &y) in heights {
        track.insert(t, vec![person_at(200.0, y)]);
    }
    track
}

/// Person at y=150 for 0..=2, y=200 for 3..=6 and y=150 for 7..=9: two
/// jumps of 50px, at 3s and 7s.
pub fn two_jump_track() -> DetectionTrack {
    let heights: BTreeMap<u64, f64> = (0..10)
        .map(|t| (t, if (3..7).contains(&t) { 200.0 } else { 150.0 }))
        .collect();
    track_with_heights(&heights)
}
