//! Media metadata types.
//!
//! Metadata is read once when a [`MediaFile`](crate::MediaFile) is opened
//! and cached for its lifetime.

/// Container-level and per-stream metadata.
///
/// # Example
///
/// ```no_run
/// use shotreel::MediaFile;
///
/// let source = MediaFile::open("match.mp4").unwrap();
/// let metadata = source.metadata();
/// println!("{} seconds of {}", metadata.duration, metadata.format);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct MediaMetadata {
    /// Best video stream, if present.
    pub video: Option<VideoMetadata>,
    /// Best audio stream, if present.
    pub audio: Option<AudioMetadata>,
    /// Total duration in seconds.
    pub duration: f64,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}

impl MediaMetadata {
    /// Whole seconds the detector will sample.
    pub fn sampled_seconds(&self) -> u64 {
        crate::detector::sampled_seconds(self.duration)
    }
}

/// Metadata for a video stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second (approximate for variable frame rate).
    pub frames_per_second: f64,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
}

/// Metadata for an audio stream.
#[derive(Debug, Clone)]
#[must_use]
pub struct AudioMetadata {
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
    /// Codec name (e.g. `"aac"`).
    pub codec: String,
}
