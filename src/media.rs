//! Media collaborator traits.
//!
//! The pipeline never talks to a codec library directly. It reads frames and
//! audio through [`MediaSource`] and writes clips through [`MediaSink`].
//! [`MediaFile`](crate::MediaFile) and [`ClipWriter`](crate::ClipWriter) are
//! the FFmpeg-backed implementations; tests substitute synthetic ones.

use std::path::Path;

use image::DynamicImage;

use crate::{error::ShotError, segment::OutputSegment};

/// Sample rate audio is analysed at, regardless of the source rate.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// Read access to a decoded video with an audio track.
pub trait MediaSource {
    /// Total duration in seconds (may be fractional).
    fn duration(&self) -> f64;

    /// Decode the frame shown at `timestamp` seconds.
    fn frame_at(&mut self, timestamp: f64) -> Result<DynamicImage, ShotError>;

    /// Decode audio in `[start, end)` seconds, resampled to `sample_rate`.
    ///
    /// Returns interleaved f32 samples in `[-1, 1]` across all channels.
    fn audio_samples(
        &mut self,
        start: f64,
        end: f64,
        sample_rate: u32,
    ) -> Result<Vec<f32>, ShotError>;

    /// Location of the source, handed to the [`MediaSink`] when cutting.
    fn path(&self) -> &Path;
}

/// Cuts and encodes a segment of a source into a standalone clip.
pub trait MediaSink {
    /// Encode `segment` of the media at `source` into `output`.
    ///
    /// Codec, container and frame rate are the sink's own configuration.
    fn cut(
        &mut self,
        source: &Path,
        segment: &OutputSegment,
        output: &Path,
    ) -> Result<(), ShotError>;
}
