//! # shotreel
//!
//! Find batting shots in cricket footage and cut each one into its own clip.
//!
//! A shot is a second where the batter, tracked inside a fixed rectangular
//! batting zone, moves vertically by more than a threshold **and** the
//! soundtrack spikes above its local baseline (bat on ball). Nearby shot
//! seconds are merged into one group and every group becomes a short clip
//! centred on its middle event.
//!
//! Person detection is pluggable: anything implementing
//! [`DetectionProvider`] can feed bounding boxes to the pipeline. The
//! bundled [`DetectionTrack`] reads pre-computed detections from JSON.
//! Decoding and clip encoding go through FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next).
//!
//! ## Quick Start
//!
//! ```no_run
//! use shotreel::{
//!     BattingZone, ClipOptions, ClipWriter, DetectionTrack, MediaFile, RunConfig,
//!     ShotPipeline,
//! };
//!
//! let zone = BattingZone::new(420, 180, 860, 700).unwrap();
//! let config = RunConfig::new(2, 2.0, 2.0, 30.0, 1.8).unwrap();
//!
//! let mut source = MediaFile::open("match.mp4").unwrap();
//! let mut detections = DetectionTrack::load("detections.json").unwrap();
//! let mut writer = ClipWriter::new(ClipOptions::default());
//!
//! let summary = ShotPipeline::new(zone, config, "shots")
//!     .unwrap()
//!     .run(&mut source, &mut detections, &mut writer)
//!     .unwrap();
//!
//! for clip in &summary.clips {
//!     println!("{}: {:.1}s..{:.1}s", clip.path.display(), clip.segment.start, clip.segment.end);
//! }
//! ```
//!
//! ## Stages
//!
//! | Stage | Type | Progress |
//! |-------|------|----------|
//! | Scan each second | [`ShotEventDetector`] ([`MotionTracker`], [`AudioSpikeAnalyzer`]) | 0-70 |
//! | Merge raw events | [`merge_events`] | - |
//! | Cut clips | [`SegmentExtractor`] | 70-100 |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`ShotPipeline::run_async`] on Tokio's blocking pool |
//! | `full` | Enables every feature above |

pub mod audio;
pub mod clip;
pub mod config;
mod conversion;
pub mod detection;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod media;
pub mod merge;
pub mod metadata;
pub mod pipeline;
pub mod progress;
pub mod segment;
pub mod source;
#[cfg(feature = "async")]
pub mod task;
pub mod tracker;
pub mod zone;

pub use audio::{AudioSpikeAnalyzer, BASELINE_OFFSETS, ENERGY_WINDOW};
pub use clip::{ClipOptions, ClipWriter, VideoCodec};
pub use config::{PipelineOptions, RunConfig};
pub use detection::{
    BoundingBox, Detection, DetectionProvider, DetectionTrack, PERSON_LABEL, Point, SampledFrame,
};
pub use detector::{ShotEventDetector, sampled_seconds};
pub use error::ShotError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use media::{ANALYSIS_SAMPLE_RATE, MediaSink, MediaSource};
pub use merge::{ShotGroup, merge_events};
pub use metadata::{AudioMetadata, MediaMetadata, VideoMetadata};
pub use pipeline::{PipelineHandle, RunSummary, ShotPipeline};
pub use progress::{
    CancellationToken, ChannelProgress, ProgressCallback, ProgressInfo, ProgressReporter,
    SCAN_SHARE, Stage, extraction_percent, scan_percent,
};
pub use segment::{CLIP_PREFIX, OutputSegment, SegmentExtractor, WrittenClip};
pub use source::MediaFile;
#[cfg(feature = "async")]
pub use task::PipelineTask;
pub use tracker::{MotionTracker, Observation, StalenessPolicy};
pub use zone::{BattingZone, DEFAULT_ZONE_FILE};
