//! Run configuration.
//!
//! [`RunConfig`] holds the detection parameters of a run. It is built and
//! validated once before the run starts and only read afterwards.
//! [`PipelineOptions`] is a builder that threads progress callbacks,
//! cancellation tokens, and output naming through the pipeline without
//! polluting every function signature.
//!
//! # Example
//!
//! ```
//! use shotreel::{CancellationToken, PipelineOptions, RunConfig};
//!
//! let config = RunConfig::new(2, 2.0, 2.0, 30.0, 1.8).unwrap();
//!
//! let token = CancellationToken::new();
//! let options = PipelineOptions::new()
//!     .with_cancellation(token.clone())
//!     .with_extension("mkv");
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::{
    error::ShotError,
    progress::{CancellationToken, NoOpProgress, ProgressCallback},
    tracker::StalenessPolicy,
};

/// Detection and segmentation parameters for one run.
///
/// Every numeric value is required; there are no built-in defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    /// Maximum seconds between consecutive raw events of one shot group.
    pub gap: u64,
    /// Seconds kept before a group's representative timestamp.
    pub pre_seconds: f64,
    /// Seconds kept after a group's representative timestamp.
    pub post_seconds: f64,
    /// Minimum vertical displacement in pixels that counts as movement.
    pub movement_threshold: f64,
    /// Energy multiple over the neighbourhood baseline that counts as a spike.
    pub audio_factor: f64,
    /// How the tracker treats a remembered centre across empty frames.
    pub staleness: StalenessPolicy,
}

impl RunConfig {
    /// Build and validate a configuration with the carry-forward tracker.
    ///
    /// # Errors
    ///
    /// Returns [`ShotError::InvalidConfig`] if any value is out of range.
    pub fn new(
        gap: u64,
        pre_seconds: f64,
        post_seconds: f64,
        movement_threshold: f64,
        audio_factor: f64,
    ) -> Result<Self, ShotError> {
        let config = Self {
            gap,
            pre_seconds,
            post_seconds,
            movement_threshold,
            audio_factor,
            staleness: StalenessPolicy::CarryForward,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the tracker staleness policy.
    #[must_use]
    pub fn with_staleness(mut self, staleness: StalenessPolicy) -> Self {
        self.staleness = staleness;
        self
    }

    /// Check every value is in range.
    ///
    /// An `audio_factor` of 1 or less is accepted but logged, since almost
    /// every second would then qualify as a spike.
    pub fn validate(&self) -> Result<(), ShotError> {
        check_non_negative("pre_seconds", self.pre_seconds)?;
        check_non_negative("post_seconds", self.post_seconds)?;

        if !(self.movement_threshold.is_finite() && self.movement_threshold > 0.0) {
            return Err(ShotError::InvalidConfig(format!(
                "movement_threshold must be a positive number of pixels, got {}",
                self.movement_threshold
            )));
        }
        if !(self.audio_factor.is_finite() && self.audio_factor > 0.0) {
            return Err(ShotError::InvalidConfig(format!(
                "audio_factor must be positive, got {}",
                self.audio_factor
            )));
        }
        if self.audio_factor <= 1.0 {
            log::warn!(
                "audio_factor {} <= 1 will flag most seconds as audio spikes",
                self.audio_factor
            );
        }
        Ok(())
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), ShotError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ShotError::InvalidConfig(format!(
            "{name} must be a non-negative number of seconds, got {value}"
        )))
    }
}

/// Operational settings for a run.
///
/// All fields have defaults: no progress callback, no cancellation, clips
/// written as `.mp4`.
#[derive(Clone)]
pub struct PipelineOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) extension: String,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("has_progress", &true)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("extension", &self.extension)
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            extension: "mp4".to_string(),
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token, checked once per sampled second and
    /// once per clip.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set the file extension of written clips (leading dot optional).
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// The clip file extension.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The attached cancellation token, if any.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
