//! Error types for the `shotreel` crate.
//!
//! This module defines [`ShotError`], the unified error type returned by all
//! fallible operations in the crate. Variants fall into three families:
//!
//! - **Preconditions**: detected before the scan starts (missing zone,
//!   malformed configuration, unreadable input, unwritable output).
//! - **Collaborator failures**: anything the detection provider, media
//!   source, or media sink reports. These abort the run immediately and are
//!   never retried.
//! - **Cancellation**: the run observed a cancelled
//!   [`CancellationToken`](crate::CancellationToken).
//!
//! An empty result (no shots found) is *not* an error.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `shotreel` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShotError {
    /// No batting zone record exists at the expected location.
    #[error("No batting zone configured at {path}; select a zone before running")]
    ZoneNotFound {
        /// Where the zone record was looked for.
        path: PathBuf,
    },

    /// The zone rectangle is malformed (`x1 > x2` or `y1 > y2`).
    #[error("Invalid batting zone ({x1}, {y1})-({x2}, {y2}): corners must satisfy x1 <= x2 and y1 <= y2")]
    InvalidZone {
        /// Left edge.
        x1: i64,
        /// Top edge.
        y1: i64,
        /// Right edge.
        x2: i64,
        /// Bottom edge.
        y2: i64,
    },

    /// A run configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaFile::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The output directory could not be created or written.
    #[error("Cannot use output directory {path}: {reason}")]
    OutputDirectory {
        /// The requested output directory.
        path: PathBuf,
        /// Underlying reason.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// The file does not contain an audio stream.
    #[error("No audio stream found in file")]
    NoAudioStream,

    /// The detection provider failed on a frame.
    #[error("Detection failed at {timestamp}s: {reason}")]
    Detection {
        /// Sampled second whose frame failed.
        timestamp: u64,
        /// Provider-supplied reason.
        reason: String,
    },

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// Audio data could not be decoded.
    #[error("Failed to decode audio: {0}")]
    AudioDecodeError(String),

    /// A clip could not be cut or encoded.
    #[error("Failed to encode clip: {0}")]
    ClipEncodeError(String),

    /// The requested timestamp lies outside the media.
    #[error("Invalid timestamp: {0}s")]
    InvalidTimestamp(f64),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A JSON record (zone file, detection track) could not be parsed or written.
    #[error("JSON error: {0}")]
    JsonError(#[from] JsonError),

    /// The run was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for ShotError {
    fn from(error: FfmpegError) -> Self {
        ShotError::FfmpegError(error.to_string())
    }
}

impl ShotError {
    /// Returns `true` for errors detected before any frame is scanned.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ShotError::ZoneNotFound { .. }
                | ShotError::InvalidZone { .. }
                | ShotError::InvalidConfig(_)
                | ShotError::FileOpen { .. }
                | ShotError::OutputDirectory { .. }
                | ShotError::NoVideoStream
                | ShotError::NoAudioStream
        )
    }
}
