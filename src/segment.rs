//! Output segment computation and clip extraction.
//!
//! Each [`ShotGroup`] becomes one [`OutputSegment`] centred on the group's
//! representative timestamp and clamped to the media. The
//! [`SegmentExtractor`] then asks a [`MediaSink`] to cut and encode every
//! segment, in group order, as `shot_1`, `shot_2`, …

use std::path::{Path, PathBuf};

use crate::{
    error::ShotError,
    media::MediaSink,
    merge::ShotGroup,
    progress::{CancellationToken, ProgressReporter},
};

/// File name prefix of written clips.
pub const CLIP_PREFIX: &str = "shot_";

/// A time range to cut, in seconds.
///
/// Always satisfies `0 <= start <= end <= duration`. Segments of different
/// groups may overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSegment {
    /// 0-based position of the group this segment was built from.
    pub index: usize,
    /// Representative timestamp the segment is anchored on.
    pub anchor: u64,
    /// Start of the cut.
    pub start: f64,
    /// End of the cut.
    pub end: f64,
}

impl OutputSegment {
    /// Build the segment for group `index` anchored at `representative`:
    /// `start = max(0, rep - pre)`, `end = min(duration, rep + post)`.
    pub fn around(
        index: usize,
        representative: u64,
        pre_seconds: f64,
        post_seconds: f64,
        duration: f64,
    ) -> Self {
        let anchor = representative as f64;
        let end = (anchor + post_seconds).min(duration).max(0.0);
        let start = (anchor - pre_seconds).max(0.0).min(end);
        Self {
            index,
            anchor: representative,
            start,
            end,
        }
    }

    /// Length of the cut in seconds.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// `shot_<index + 1>`, the 1-based display name.
    pub fn file_stem(&self) -> String {
        format!("{CLIP_PREFIX}{}", self.index + 1)
    }
}

/// A clip that was successfully written.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenClip {
    /// The segment that was cut.
    pub segment: OutputSegment,
    /// Where the clip was written.
    pub path: PathBuf,
}

/// Turns shot groups into clips on disk.
#[derive(Debug, Clone)]
pub struct SegmentExtractor<'a> {
    pre_seconds: f64,
    post_seconds: f64,
    output_dir: &'a Path,
    extension: &'a str,
}

impl<'a> SegmentExtractor<'a> {
    /// Create an extractor writing `<output_dir>/shot_<n>.<extension>`.
    pub fn new(pre_seconds: f64, post_seconds: f64, output_dir: &'a Path, extension: &'a str) -> Self {
        Self {
            pre_seconds,
            post_seconds,
            output_dir,
            extension,
        }
    }

    /// Compute every segment without writing anything.
    pub fn plan(&self, groups: &[ShotGroup], duration: f64) -> Vec<OutputSegment> {
        groups
            .iter()
            .enumerate()
            .map(|(index, group)| {
                OutputSegment::around(
                    index,
                    group.representative(),
                    self.pre_seconds,
                    self.post_seconds,
                    duration,
                )
            })
            .collect()
    }

    /// Cut every group through `sink`, reporting progress after each clip
    /// and 100 at the end (also when there are no groups).
    ///
    /// # Errors
    ///
    /// The first sink error aborts the loop and is returned as-is; clips
    /// written before it stay on disk. A cancelled token yields
    /// [`ShotError::Cancelled`].
    pub fn extract<K: MediaSink + ?Sized>(
        &self,
        sink: &mut K,
        source: &Path,
        groups: &[ShotGroup],
        duration: f64,
        reporter: &mut ProgressReporter,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Vec<WrittenClip>, ShotError> {
        let segments = self.plan(groups, duration);
        let total = segments.len();
        let mut written = Vec::with_capacity(total);

        for segment in segments {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                log::info!("Extraction cancelled after {} clip(s)", written.len());
                return Err(ShotError::Cancelled);
            }

            let path = self
                .output_dir
                .join(format!("{}.{}", segment.file_stem(), self.extension));

            log::debug!(
                "Cutting {} [{:.2}s, {:.2}s] around {}s",
                path.display(),
                segment.start,
                segment.end,
                segment.anchor
            );
            sink.cut(source, &segment, &path)?;
            log::info!("Saved {}", path.display());

            reporter.extraction(segment.index, total);
            written.push(WrittenClip { segment, path });
        }

        reporter.finish();
        Ok(written)
    }
}
