//! Raw shot event detection.
//!
//! [`ShotEventDetector`] samples one frame per whole second, tracks the
//! batter inside the zone, and emits the second as a raw shot event when a
//! large enough vertical movement coincides with an audio spike.

use crate::{
    audio::AudioSpikeAnalyzer,
    config::RunConfig,
    detection::{DetectionProvider, SampledFrame},
    error::ShotError,
    media::MediaSource,
    progress::{CancellationToken, ProgressReporter},
    tracker::{MotionTracker, Observation},
    zone::BattingZone,
};

/// Scans a source second by second for motion + audio coincidences.
#[derive(Debug, Clone, Copy)]
pub struct ShotEventDetector<'a> {
    zone: &'a BattingZone,
    config: &'a RunConfig,
}

impl<'a> ShotEventDetector<'a> {
    /// Create a detector for `zone` using the thresholds in `config`.
    pub fn new(zone: &'a BattingZone, config: &'a RunConfig) -> Self {
        Self { zone, config }
    }

    /// Visit every whole second `t` in `[0, floor(duration))` exactly once,
    /// in order, and return the seconds where a shot was detected.
    ///
    /// After each second the scan progress `floor(t / duration * 70)` is
    /// reported. The audio check only runs for seconds that already passed
    /// the movement check.
    ///
    /// # Errors
    ///
    /// Any source or provider error aborts the scan. A cancelled token
    /// yields [`ShotError::Cancelled`].
    pub fn scan<S, D>(
        &self,
        source: &mut S,
        provider: &mut D,
        reporter: &mut ProgressReporter,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Vec<u64>, ShotError>
    where
        S: MediaSource + ?Sized,
        D: DetectionProvider + ?Sized,
    {
        let duration = sampled_seconds(source.duration());
        let analyzer = AudioSpikeAnalyzer::new(self.config.audio_factor);
        let mut tracker = MotionTracker::new(self.zone, self.config.staleness);
        let mut events = Vec::new();

        log::info!("Scanning {duration} second(s) for shots");

        for t in 0..duration {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                log::info!("Scan cancelled at {t}s");
                return Err(ShotError::Cancelled);
            }

            let image = source.frame_at(t as f64)?;
            let frame = SampledFrame {
                timestamp: t,
                image,
            };
            let detections = provider.detect(&frame)?;

            let observation = tracker.observe(t, detections.iter().filter(|d| d.is_person()));
            if self.is_shot(source, &analyzer, t, &observation)? {
                log::debug!("Raw shot event at {t}s");
                events.push(t);
            }

            reporter.scan(t, duration);
        }

        log::info!("Scan found {} raw shot event(s)", events.len());
        Ok(events)
    }

    fn is_shot<S: MediaSource + ?Sized>(
        &self,
        source: &mut S,
        analyzer: &AudioSpikeAnalyzer,
        t: u64,
        observation: &Observation,
    ) -> Result<bool, ShotError> {
        let Some(displacement) = observation.displacement() else {
            return Ok(false);
        };
        if displacement <= self.config.movement_threshold {
            return Ok(false);
        }
        log::debug!("Movement of {displacement:.1}px at {t}s; checking audio");
        analyzer.is_spike(source, t as f64)
    }
}

/// Number of whole seconds sampled for a duration; a trailing fraction of a
/// second is never sampled.
pub fn sampled_seconds(duration: f64) -> u64 {
    if duration.is_finite() && duration > 0.0 {
        duration.floor() as u64
    } else {
        0
    }
}

