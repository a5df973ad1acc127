//! FFmpeg-backed source and clip writer tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`
//! and are skipped when they are missing.

use std::path::Path;

use shotreel::{
    ANALYSIS_SAMPLE_RATE, AudioSpikeAnalyzer, ClipOptions, ClipWriter, MediaFile, MediaSink,
    MediaSource, OutputSegment, VideoCodec,
};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

fn open_fixture() -> Option<MediaFile> {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return None;
    }
    Some(MediaFile::open(path).expect("Failed to open fixture"))
}

// ── MediaFile ──────────────────────────────────────────────────────

#[test]
fn metadata_describes_both_streams() {
    let Some(source) = open_fixture() else {
        return;
    };
    let metadata = source.metadata();

    assert!(metadata.duration > 1.0);
    assert_eq!(metadata.sampled_seconds(), metadata.duration.floor() as u64);

    let video = metadata.video.as_ref().expect("fixture has video");
    assert!(video.width > 0 && video.height > 0);
    assert!(video.frames_per_second > 0.0);

    let audio = metadata.audio.as_ref().expect("fixture has audio");
    assert!(audio.sample_rate > 0);
    assert!(audio.channels > 0);

    assert!(source.require_streams().is_ok());
    assert_eq!(source.path(), Path::new(sample_video_path()));
}

#[test]
fn frame_at_returns_full_resolution_rgb() {
    let Some(mut source) = open_fixture() else {
        return;
    };
    let (width, height) = {
        let video = source.metadata().video.as_ref().expect("fixture has video");
        (video.width, video.height)
    };

    for t in [0.0, 1.0, 2.5] {
        let frame = source.frame_at(t).unwrap();
        assert_eq!((frame.width(), frame.height()), (width, height));
    }
}

#[test]
fn frames_can_be_read_out_of_order() {
    let Some(mut source) = open_fixture() else {
        return;
    };
    let late = source.frame_at(3.0).unwrap().to_rgb8();
    let _early = source.frame_at(0.0).unwrap();
    let late_again = source.frame_at(3.0).unwrap().to_rgb8();
    assert_eq!(late.as_raw(), late_again.as_raw());
}

#[test]
fn audio_window_has_expected_length() {
    let Some(mut source) = open_fixture() else {
        return;
    };
    let channels = source
        .metadata()
        .audio
        .as_ref()
        .map(|audio| audio.channels as usize)
        .unwrap_or(1);

    let samples = source.audio_samples(1.0, 1.3, ANALYSIS_SAMPLE_RATE).unwrap();
    let frames = samples.len() / channels;
    let expected = (0.3 * ANALYSIS_SAMPLE_RATE as f64) as usize;
    assert!(
        frames.abs_diff(expected) < 256,
        "expected about {expected} frames, got {frames}"
    );
    assert!(samples.iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn empty_audio_window_is_empty() {
    let Some(mut source) = open_fixture() else {
        return;
    };
    assert!(source.audio_samples(2.0, 2.0, ANALYSIS_SAMPLE_RATE).unwrap().is_empty());
}

#[test]
fn audio_window_past_end_drains_decoder() {
    let Some(mut source) = open_fixture() else {
        return;
    };
    let duration = source.duration();
    let samples = source
        .audio_samples(duration - 0.2, duration + 1.0, ANALYSIS_SAMPLE_RATE)
        .unwrap();
    assert!(!samples.is_empty());
    assert!(samples.iter().all(|s| s.abs() <= 1.0));
}

#[test]
fn spike_analysis_runs_on_real_audio() {
    let Some(mut source) = open_fixture() else {
        return;
    };
    let analyzer = AudioSpikeAnalyzer::new(1.8);
    let energy = analyzer.energy(&mut source, 1.0).unwrap();
    assert!(energy >= 0.0);
    analyzer.is_spike(&mut source, 2.0).unwrap();
}

// ── ClipWriter ─────────────────────────────────────────────────────

#[test]
fn clip_writer_cuts_segment() {
    let Some(source) = open_fixture() else {
        return;
    };
    let duration = source.duration();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("shot_1.mp4");

    let segment = OutputSegment::around(0, 2, 1.0, 1.0, duration);
    let mut writer = ClipWriter::new(ClipOptions::default());
    writer
        .cut(Path::new(sample_video_path()), &segment, &output)
        .unwrap();

    let clip = MediaFile::open(&output).expect("clip should be readable");
    let metadata = clip.metadata();
    assert!(metadata.video.is_some());
    assert!(metadata.audio.is_some());
    assert!(
        (metadata.duration - segment.length()).abs() < 0.5,
        "clip lasts {}s, segment {}s",
        metadata.duration,
        segment.length()
    );
}

#[test]
fn clip_writer_cuts_segment_ending_at_media_end() {
    let Some(source) = open_fixture() else {
        return;
    };
    let duration = source.duration();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("shot_1.mp4");

    let last = duration.floor() as u64;
    let segment = OutputSegment::around(0, last, 1.0, 5.0, duration);
    assert_eq!(segment.end, duration);

    let mut writer = ClipWriter::new(ClipOptions::default());
    writer
        .cut(Path::new(sample_video_path()), &segment, &output)
        .unwrap();

    let clip = MediaFile::open(&output).unwrap();
    assert!(clip.metadata().video.is_some());
    assert!(clip.metadata().audio.is_some());
}

#[test]
fn clip_writer_honours_frame_rate() {
    let Some(source) = open_fixture() else {
        return;
    };
    let duration = source.duration();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("shot_1.mp4");

    let options = ClipOptions::default()
        .with_fps(15)
        .with_codec(VideoCodec::Mpeg4)
        .with_crf(None);
    let mut writer = ClipWriter::new(options);
    let segment = OutputSegment::around(0, 1, 1.0, 1.0, duration);
    writer
        .cut(Path::new(sample_video_path()), &segment, &output)
        .unwrap();

    let clip = MediaFile::open(&output).unwrap();
    let video = clip.metadata().video.as_ref().unwrap();
    assert!((video.frames_per_second - 15.0).abs() < 1.0);
}
