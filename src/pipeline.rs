//! The detection-and-segmentation pipeline.
//!
//! [`ShotPipeline`] owns the immutable inputs of a run (zone, parameters,
//! output directory, options) and drives three sequential passes:
//!
//! 1. scan every sampled second for raw shot events (0–70 %),
//! 2. merge raw events into shot groups,
//! 3. cut one clip per group (70–100 %).
//!
//! Runs either block the calling thread ([`run`](ShotPipeline::run)) or
//! execute on a dedicated worker thread ([`spawn`](ShotPipeline::spawn)),
//! which keeps an interactive caller responsive.
//!
//! # Example
//!
//! ```no_run
//! use shotreel::{
//!     BattingZone, ClipOptions, ClipWriter, DetectionTrack, MediaFile, RunConfig,
//!     ShotError, ShotPipeline,
//! };
//!
//! let zone = BattingZone::load("batting_zone.json")?;
//! let config = RunConfig::new(2, 2.0, 2.0, 30.0, 1.8)?;
//! let pipeline = ShotPipeline::new(zone, config, "shots")?;
//!
//! let mut source = MediaFile::open("match.mp4")?;
//! let mut detections = DetectionTrack::load("detections.json")?;
//! let mut writer = ClipWriter::new(ClipOptions::default());
//!
//! let summary = pipeline.run(&mut source, &mut detections, &mut writer)?;
//! println!("{} shot(s) saved", summary.clips.len());
//! # Ok::<(), ShotError>(())
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{self, Receiver},
    },
    thread::{self, JoinHandle},
};

use crate::{
    config::{PipelineOptions, RunConfig},
    detection::DetectionProvider,
    detector::ShotEventDetector,
    error::ShotError,
    media::{MediaSink, MediaSource},
    merge::{ShotGroup, merge_events},
    progress::{CancellationToken, ChannelProgress, ProgressInfo, ProgressReporter},
    segment::{SegmentExtractor, WrittenClip},
    zone::BattingZone,
};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Source duration in seconds.
    pub duration: f64,
    /// Seconds where motion and audio coincided, in increasing order.
    pub raw_events: Vec<u64>,
    /// Shot groups, in time order.
    pub groups: Vec<ShotGroup>,
    /// Clips written, one per group, in group order.
    pub clips: Vec<WrittenClip>,
}

/// A configured, immutable pipeline run description.
#[derive(Debug, Clone)]
pub struct ShotPipeline {
    zone: BattingZone,
    config: RunConfig,
    output_dir: PathBuf,
    options: PipelineOptions,
}

impl ShotPipeline {
    /// Describe a run writing clips into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ShotError::InvalidConfig`] if `config` does not validate.
    pub fn new<P: AsRef<Path>>(
        zone: BattingZone,
        config: RunConfig,
        output_dir: P,
    ) -> Result<Self, ShotError> {
        config.validate()?;
        Ok(Self {
            zone,
            config,
            output_dir: output_dir.as_ref().to_path_buf(),
            options: PipelineOptions::new(),
        })
    }

    /// Replace the operational options.
    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// The batting zone.
    pub fn zone(&self) -> &BattingZone {
        &self.zone
    }

    /// The run parameters.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// The operational options.
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Where clips are written.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Execute the run on the calling thread.
    ///
    /// The output directory is created before the scan starts. Zero shot
    /// groups is a normal outcome: the summary is empty and progress still
    /// reaches 100.
    ///
    /// # Errors
    ///
    /// - [`ShotError::OutputDirectory`] if the directory cannot be created.
    /// - Any collaborator error, unchanged. Clips already written remain.
    /// - [`ShotError::Cancelled`] if the token in the options is cancelled.
    pub fn run<S, D, K>(
        &self,
        source: &mut S,
        provider: &mut D,
        sink: &mut K,
    ) -> Result<RunSummary, ShotError>
    where
        S: MediaSource + ?Sized,
        D: DetectionProvider + ?Sized,
        K: MediaSink + ?Sized,
    {
        self.prepare_output_dir()?;

        let duration = source.duration();
        let cancellation = self.options.cancellation.as_ref();
        let mut reporter = ProgressReporter::new(Arc::clone(&self.options.progress));

        log::info!(
            "Detecting shots in {} ({duration:.2}s, zone {})",
            source.path().display(),
            self.zone
        );

        let raw_events = ShotEventDetector::new(&self.zone, &self.config).scan(
            source,
            provider,
            &mut reporter,
            cancellation,
        )?;

        log::info!("Merging shots");
        let groups = merge_events(&raw_events, self.config.gap);

        if self.options.is_cancelled() {
            return Err(ShotError::Cancelled);
        }

        log::info!("Saving {} clip(s) to {}", groups.len(), self.output_dir.display());
        let extractor = SegmentExtractor::new(
            self.config.pre_seconds,
            self.config.post_seconds,
            &self.output_dir,
            self.options.extension(),
        );
        let source_path = source.path().to_path_buf();
        let clips = extractor.extract(
            sink,
            &source_path,
            &groups,
            duration,
            &mut reporter,
            cancellation,
        )?;

        log::info!("Done. {} shot(s) saved", clips.len());

        Ok(RunSummary {
            duration,
            raw_events,
            groups,
            clips,
        })
    }

    /// Execute the run on a dedicated worker thread.
    ///
    /// Progress is delivered through [`PipelineHandle::progress`] in emission
    /// order, replacing any callback set in the options. The handle's
    /// [`cancel`](PipelineHandle::cancel) stops the run at the next sampled
    /// second or clip.
    pub fn spawn<S, D, K>(self, mut source: S, mut provider: D, mut sink: K) -> PipelineHandle
    where
        S: MediaSource + Send + 'static,
        D: DetectionProvider + Send + 'static,
        K: MediaSink + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let token = self.options.cancellation.clone().unwrap_or_default();

        let pipeline = Self {
            options: self
                .options
                .with_progress(Arc::new(ChannelProgress::new(sender)))
                .with_cancellation(token.clone()),
            ..self
        };

        let thread = thread::spawn(move || pipeline.run(&mut source, &mut provider, &mut sink));

        PipelineHandle {
            progress: receiver,
            cancellation: token,
            thread,
        }
    }

    fn prepare_output_dir(&self) -> Result<(), ShotError> {
        fs::create_dir_all(&self.output_dir).map_err(|error| ShotError::OutputDirectory {
            path: self.output_dir.clone(),
            reason: error.to_string(),
        })?;

        let metadata = fs::metadata(&self.output_dir)?;
        if metadata.permissions().readonly() {
            return Err(ShotError::OutputDirectory {
                path: self.output_dir.clone(),
                reason: "directory is read-only".to_string(),
            });
        }
        Ok(())
    }
}

/// A run executing on a worker thread.
pub struct PipelineHandle {
    progress: Receiver<ProgressInfo>,
    cancellation: CancellationToken,
    thread: JoinHandle<Result<RunSummary, ShotError>>,
}

impl PipelineHandle {
    /// Progress reports in emission order. The channel closes when the run
    /// ends.
    pub fn progress(&self) -> &Receiver<ProgressInfo> {
        &self.progress
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether the worker has finished.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the run to finish.
    ///
    /// A worker that panicked is reported as [`ShotError::Cancelled`].
    pub fn join(self) -> Result<RunSummary, ShotError> {
        self.thread.join().unwrap_or_else(|_| Err(ShotError::Cancelled))
    }
}
