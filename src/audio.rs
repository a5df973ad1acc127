//! Audio energy spike analysis.
//!
//! A bat striking a ball produces a short, loud crack. [`AudioSpikeAnalyzer`]
//! measures the mean energy of a small window around a timestamp and
//! compares it with the energy of the same window a second or two before and
//! after. A timestamp is a spike when it is louder than that neighbourhood
//! by more than the configured factor.
//!
//! # Example
//!
//! ```no_run
//! use shotreel::{AudioSpikeAnalyzer, MediaFile, ShotError};
//!
//! let mut source = MediaFile::open("match.mp4")?;
//! let analyzer = AudioSpikeAnalyzer::new(1.8);
//! if analyzer.is_spike(&mut source, 42.0)? {
//!     println!("something loud happened at 42s");
//! }
//! # Ok::<(), ShotError>(())
//! ```

use crate::{
    error::ShotError,
    media::{ANALYSIS_SAMPLE_RATE, MediaSource},
};

/// Half-width in seconds of the window energy is measured over.
pub const ENERGY_WINDOW: f64 = 0.15;

/// Offsets in seconds of the windows that form the baseline.
pub const BASELINE_OFFSETS: [f64; 4] = [-2.0, -1.0, 1.0, 2.0];

/// Compares local audio energy with its temporal neighbourhood.
///
/// Holds no state besides its factor; every query re-reads audio from the
/// source, so calls may happen in any order and repeat freely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSpikeAnalyzer {
    audio_factor: f64,
}

impl AudioSpikeAnalyzer {
    /// Create an analyzer that flags energy above `audio_factor` × baseline.
    pub fn new(audio_factor: f64) -> Self {
        Self { audio_factor }
    }

    /// The configured multiplier.
    pub fn audio_factor(&self) -> f64 {
        self.audio_factor
    }

    /// Mean squared amplitude over `[t - window, t + window]`, clamped to
    /// the media. An empty window has zero energy.
    pub fn energy<S: MediaSource + ?Sized>(
        &self,
        source: &mut S,
        timestamp: f64,
    ) -> Result<f64, ShotError> {
        let start = (timestamp - ENERGY_WINDOW).max(0.0);
        let end = (timestamp + ENERGY_WINDOW).min(source.duration());
        if end <= start {
            return Ok(0.0);
        }

        let samples = source.audio_samples(start, end, ANALYSIS_SAMPLE_RATE)?;
        Ok(mean_square(&samples))
    }

    /// Whether `timestamp` is louder than its neighbourhood by more than the
    /// configured factor.
    ///
    /// The baseline averages the energy at every offset that lands inside
    /// `[0, duration)`. With no such offset there is no baseline and the
    /// answer is `false`.
    pub fn is_spike<S: MediaSource + ?Sized>(
        &self,
        source: &mut S,
        timestamp: f64,
    ) -> Result<bool, ShotError> {
        let duration = source.duration();
        let neighbours: Vec<f64> = BASELINE_OFFSETS
            .iter()
            .map(|offset| timestamp + offset)
            .filter(|&t| t >= 0.0 && t < duration)
            .collect();

        if neighbours.is_empty() {
            log::debug!("No baseline window for {timestamp}s; not a spike");
            return Ok(false);
        }

        let current = self.energy(source, timestamp)?;
        let mut total = 0.0;
        for &t in &neighbours {
            total += self.energy(source, t)?;
        }
        let baseline = total / neighbours.len() as f64;

        log::debug!(
            "Audio at {timestamp}s: energy={current:.6}, baseline={baseline:.6}, factor={}",
            self.audio_factor
        );

        Ok(current > baseline * self.audio_factor)
    }
}

fn mean_square(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    sum / samples.len() as f64
}
