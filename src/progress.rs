//! Progress reporting and cancellation support.
//!
//! A run reports a single percentage that climbs from 0 to 100: the frame
//! scan covers 0–70 and clip extraction covers 70–100. This module provides
//! [`ProgressCallback`] for receiving those reports, [`ChannelProgress`] for
//! forwarding them across threads in order, [`ProgressReporter`] which owns
//! the arithmetic, and [`CancellationToken`] for cooperative cancellation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use shotreel::{PipelineOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] {}%", info.stage, info.percent);
//!     }
//! }
//!
//! let options = PipelineOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc::Sender,
};
use std::time::{Duration, Instant};

/// Share of the scale given to the frame scan.
pub const SCAN_SHARE: u8 = 70;

/// The pipeline stage a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Stage {
    /// Sampling frames and looking for motion + audio coincidences.
    Scanning,
    /// Cutting and encoding one clip per shot group.
    Extracting,
    /// All work finished.
    Done,
}

/// A snapshot of run progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Which stage produced this report.
    pub stage: Stage,
    /// Overall completion, `0..=100`, never lower than a previous report.
    pub percent: u8,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
}

/// Trait for receiving progress updates during a run.
///
/// Implementations must be [`Send`] and [`Sync`] because a run may execute
/// on a worker thread.
///
/// Progress callbacks are **infallible**; they observe but cannot halt the
/// run. Use [`CancellationToken`] for that.
pub trait ProgressCallback: Send + Sync {
    /// Called after every sampled second and every written clip.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Forwards every report into a channel, preserving emission order.
///
/// Pair it with a receiver on the thread that renders progress. A closed
/// receiver is ignored; the run keeps going.
pub struct ChannelProgress {
    sender: Sender<ProgressInfo>,
}

impl ChannelProgress {
    /// Wrap the sending half of a channel.
    pub fn new(sender: Sender<ProgressInfo>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let _ = self.sender.send(info.clone());
    }
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop the run at
/// the next sampled second or the next clip.
///
/// # Example
///
/// ```
/// use shotreel::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation. All clones observe it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps scan and extraction progress onto one 0–100 scale.
///
/// Percentages are clamped so that no report is lower than the one before
/// it.
pub struct ProgressReporter {
    callback: Arc<dyn ProgressCallback>,
    start_time: Instant,
    last_percent: u8,
}

impl ProgressReporter {
    /// Create a reporter that delivers to `callback`.
    pub fn new(callback: Arc<dyn ProgressCallback>) -> Self {
        Self {
            callback,
            start_time: Instant::now(),
            last_percent: 0,
        }
    }

    /// The last percentage delivered.
    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    /// Report that second `t` of `duration` sampled seconds has been scanned:
    /// `floor(t / duration * 70)`.
    pub fn scan(&mut self, timestamp: u64, duration: u64) {
        let percent = scan_percent(timestamp, duration);
        self.report(Stage::Scanning, percent);
    }

    /// Report that clip `index` (0-based) of `total` has been written:
    /// `70 + floor((index + 1) / total * 30)`.
    pub fn extraction(&mut self, index: usize, total: usize) {
        let percent = extraction_percent(index, total);
        self.report(Stage::Extracting, percent);
    }

    /// Report 100, unconditionally.
    pub fn finish(&mut self) {
        self.report(Stage::Done, 100);
    }

    fn report(&mut self, stage: Stage, percent: u8) {
        let percent = percent.min(100).max(self.last_percent);
        self.last_percent = percent;

        let info = ProgressInfo {
            stage,
            percent,
            elapsed: self.start_time.elapsed(),
        };
        self.callback.on_progress(&info);
    }
}

/// `floor(t / duration * 70)`, with an empty scan mapping to 0.
pub fn scan_percent(timestamp: u64, duration: u64) -> u8 {
    if duration == 0 {
        return 0;
    }
    ((timestamp as f64 / duration as f64) * SCAN_SHARE as f64) as u8
}

/// `70 + floor((index + 1) / total * 30)`, with no clips mapping to 100.
pub fn extraction_percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let share = (100 - SCAN_SHARE) as f64;
    SCAN_SHARE + (((index + 1) as f64 / total as f64) * share) as u8
}
