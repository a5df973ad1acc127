//! Async pipeline runs.
//!
//! [`ShotPipeline::run_async`] executes a run with
//! `tokio::task::spawn_blocking`, so the decode-heavy scan never stalls the
//! runtime's worker threads. Progress arrives on an unbounded channel and
//! the result on a future.
//!
//! # Example
//!
//! ```no_run
//! use shotreel::{
//!     BattingZone, ClipOptions, ClipWriter, DetectionTrack, MediaFile, RunConfig,
//!     ShotError, ShotPipeline,
//! };
//!
//! # async fn example() -> Result<(), ShotError> {
//! let pipeline = ShotPipeline::new(
//!     BattingZone::load("batting_zone.json")?,
//!     RunConfig::new(2, 2.0, 2.0, 30.0, 1.8)?,
//!     "shots",
//! )?;
//! let mut task = pipeline.run_async(
//!     MediaFile::open("match.mp4")?,
//!     DetectionTrack::load("detections.json")?,
//!     ClipWriter::new(ClipOptions::default()),
//! );
//!
//! while let Some(info) = task.progress().recv().await {
//!     println!("{}%", info.percent);
//! }
//! let summary = task.await?;
//! println!("{} clip(s)", summary.clips.len());
//! # Ok(())
//! # }
//! ```

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

use crate::{
    detection::DetectionProvider,
    error::ShotError,
    media::{MediaSink, MediaSource},
    pipeline::{RunSummary, ShotPipeline},
    progress::{CancellationToken, ProgressCallback, ProgressInfo},
};

struct TokioProgress {
    sender: UnboundedSender<ProgressInfo>,
}

impl ProgressCallback for TokioProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let _ = self.sender.send(info.clone());
    }
}

/// A pipeline run executing on Tokio's blocking pool.
///
/// Resolves to the run's result. A task that panicked or was aborted by the
/// runtime resolves to [`ShotError::Cancelled`].
pub struct PipelineTask {
    progress: UnboundedReceiver<ProgressInfo>,
    cancellation: CancellationToken,
    handle: JoinHandle<Result<RunSummary, ShotError>>,
}

impl PipelineTask {
    /// Progress reports in emission order. Yields `None` once the run ends.
    pub fn progress(&mut self) -> &mut UnboundedReceiver<ProgressInfo> {
        &mut self.progress
    }

    /// Request cooperative cancellation.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}

impl Future for PipelineTask {
    type Output = Result<RunSummary, ShotError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Err(ShotError::Cancelled)))
    }
}

impl ShotPipeline {
    /// Execute the run on Tokio's blocking thread pool.
    ///
    /// Must be called from within a Tokio runtime. Any progress callback in
    /// the options is replaced by the task's channel.
    pub fn run_async<S, D, K>(self, mut source: S, mut provider: D, mut sink: K) -> PipelineTask
    where
        S: MediaSource + Send + 'static,
        D: DetectionProvider + Send + 'static,
        K: MediaSink + Send + 'static,
    {
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let cancellation = self.options().cancellation().cloned().unwrap_or_default();

        let options = self
            .options()
            .clone()
            .with_progress(Arc::new(TokioProgress { sender }))
            .with_cancellation(cancellation.clone());
        let pipeline = self.with_options(options);

        let handle = tokio::task::spawn_blocking(move || {
            pipeline.run(&mut source, &mut provider, &mut sink)
        });

        PipelineTask {
            progress: receiver,
            cancellation,
            handle,
        }
    }
}
