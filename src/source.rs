//! FFmpeg-backed [`MediaSource`].
//!
//! [`MediaFile`] opens a container with `ffmpeg-next`, caches its metadata,
//! and serves the two reads the detector needs: a decoded RGB frame at a
//! timestamp, and a window of audio resampled to a fixed rate.
//!
//! Every read creates a fresh decoder and seeks to the nearest keyframe
//! before the requested time, so reads may happen in any order.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    format::{Pixel, Sample, context::Input, sample::Type as SampleType},
    frame::{Audio as AudioFrame, Video as VideoFrame},
    media::Type,
    software::{
        resampling::Context as ResamplingContext,
        scaling::{Context as ScalingContext, Flags as ScalingFlags},
    },
};
use image::{DynamicImage, RgbImage};

use crate::{
    conversion::{
        frame_to_rgb_buffer, pts_to_seconds, seconds_to_seek_timestamp,
        seconds_to_stream_timestamp,
    },
    error::ShotError,
    media::MediaSource,
    metadata::{AudioMetadata, MediaMetadata, VideoMetadata},
};

/// An opened media file.
///
/// # Example
///
/// ```no_run
/// use shotreel::{MediaFile, MediaSource, ShotError};
///
/// let mut source = MediaFile::open("match.mp4")?;
/// let frame = source.frame_at(10.0)?;
/// frame.save("frame_10s.png")?;
/// # Ok::<(), ShotError>(())
/// ```
pub struct MediaFile {
    input_context: Input,
    metadata: MediaMetadata,
    video_stream_index: Option<usize>,
    audio_stream_index: Option<usize>,
    file_path: PathBuf,
}

impl Debug for MediaFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("audio_stream_index", &self.audio_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl MediaFile {
    /// Open a media file and read its metadata.
    ///
    /// Initializes FFmpeg (idempotent) and locates the best video and audio
    /// streams. A file without one of them still opens; see
    /// [`require_streams`](MediaFile::require_streams).
    ///
    /// # Errors
    ///
    /// Returns [`ShotError::FileOpen`] if the file cannot be opened or its
    /// codec parameters cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ShotError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening media file: {}", file_path.display());

        let open_error = |reason: String| ShotError::FileOpen {
            path: file_path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            duration_microseconds as f64 / 1_000_000.0
        } else {
            0.0
        };
        let format = input_context.format().name().to_string();

        let mut video_stream_index = None;
        let mut video = None;
        if let Some(stream) = input_context.streams().best(Type::Video) {
            let index = stream.index();
            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().video())
                .map_err(|error| {
                    open_error(format!("Failed to create video decoder for stream {index}: {error}"))
                })?;

            let rate = stream.avg_frame_rate();
            let frames_per_second = if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            };

            video = Some(VideoMetadata {
                width: decoder.width(),
                height: decoder.height(),
                frames_per_second,
                codec: decoder
                    .codec()
                    .map(|codec| codec.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            });
            video_stream_index = Some(index);
        }

        let mut audio_stream_index = None;
        let mut audio = None;
        if let Some(stream) = input_context.streams().best(Type::Audio) {
            let index = stream.index();
            let decoder = CodecContext::from_parameters(stream.parameters())
                .and_then(|context| context.decoder().audio())
                .map_err(|error| {
                    open_error(format!("Failed to create audio decoder for stream {index}: {error}"))
                })?;

            audio = Some(AudioMetadata {
                sample_rate: decoder.rate(),
                channels: decoder.channels(),
                codec: decoder
                    .codec()
                    .map(|codec| codec.name().to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
            });
            audio_stream_index = Some(index);
        }

        log::info!(
            "Opened {} ({duration:.2}s, video={}, audio={})",
            file_path.display(),
            video.is_some(),
            audio.is_some()
        );

        Ok(Self {
            input_context,
            metadata: MediaMetadata {
                video,
                audio,
                duration,
                format,
            },
            video_stream_index,
            audio_stream_index,
            file_path,
        })
    }

    /// Cached metadata.
    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    /// Fail unless the file has both a video and an audio stream, which the
    /// detector needs.
    pub fn require_streams(&self) -> Result<(), ShotError> {
        if self.video_stream_index.is_none() {
            return Err(ShotError::NoVideoStream);
        }
        if self.audio_stream_index.is_none() {
            return Err(ShotError::NoAudioStream);
        }
        Ok(())
    }

    fn check_timestamp(&self, timestamp: f64) -> Result<(), ShotError> {
        if !timestamp.is_finite() || timestamp < 0.0 || timestamp > self.metadata.duration {
            return Err(ShotError::InvalidTimestamp(timestamp));
        }
        Ok(())
    }
}

impl MediaSource for MediaFile {
    fn duration(&self) -> f64 {
        self.metadata.duration
    }

    fn path(&self) -> &Path {
        &self.file_path
    }

    /// Seek to the keyframe before `timestamp`, decode forward, and return
    /// the first frame shown at or after it. Past the last frame, the last
    /// decoded frame is returned.
    fn frame_at(&mut self, timestamp: f64) -> Result<DynamicImage, ShotError> {
        self.check_timestamp(timestamp)?;
        let video_stream_index = self.video_stream_index.ok_or(ShotError::NoVideoStream)?;

        let stream = self
            .input_context
            .stream(video_stream_index)
            .ok_or(ShotError::NoVideoStream)?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| ShotError::VideoDecodeError(error.to_string()))?;

        let (width, height) = (decoder.width(), decoder.height());
        let mut scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let seek_target = seconds_to_seek_timestamp(timestamp);
        self.input_context.seek(seek_target, ..seek_target)?;
        let target_pts = seconds_to_stream_timestamp(timestamp, time_base);

        let mut decoded_frame = VideoFrame::empty();
        let mut rgb_frame = VideoFrame::empty();
        let mut last_frame: Option<VideoFrame> = None;

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != video_stream_index {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|error| ShotError::VideoDecodeError(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let pts = decoded_frame.timestamp().or(decoded_frame.pts()).unwrap_or(0);
                if pts >= target_pts {
                    scaler.run(&decoded_frame, &mut rgb_frame)?;
                    return rgb_frame_to_image(&rgb_frame, width, height);
                }
                last_frame = Some(decoded_frame.clone());
            }
        }

        decoder
            .send_eof()
            .map_err(|error| ShotError::VideoDecodeError(error.to_string()))?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            let pts = decoded_frame.timestamp().or(decoded_frame.pts()).unwrap_or(0);
            if pts >= target_pts {
                scaler.run(&decoded_frame, &mut rgb_frame)?;
                return rgb_frame_to_image(&rgb_frame, width, height);
            }
            last_frame = Some(decoded_frame.clone());
        }

        match last_frame {
            Some(frame) => {
                scaler.run(&frame, &mut rgb_frame)?;
                rgb_frame_to_image(&rgb_frame, width, height)
            }
            None => Err(ShotError::VideoDecodeError(format!(
                "No frame could be decoded at {timestamp}s"
            ))),
        }
    }

    /// Decode, resample to packed f32 at `sample_rate` keeping the source
    /// channel layout, and keep the samples whose time falls in
    /// `[start, end)`.
    fn audio_samples(
        &mut self,
        start: f64,
        end: f64,
        sample_rate: u32,
    ) -> Result<Vec<f32>, ShotError> {
        let audio_stream_index = self.audio_stream_index.ok_or(ShotError::NoAudioStream)?;
        if end <= start {
            return Ok(Vec::new());
        }
        self.check_timestamp(start)?;

        let stream = self
            .input_context
            .stream(audio_stream_index)
            .ok_or(ShotError::NoAudioStream)?;
        let time_base = stream.time_base();
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let mut decoder = decoder_context
            .decoder()
            .audio()
            .map_err(|error| ShotError::AudioDecodeError(error.to_string()))?;

        let mut resampler = ResamplingContext::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            Sample::F32(SampleType::Packed),
            decoder.channel_layout(),
            sample_rate,
        )
        .map_err(|error| {
            ShotError::AudioDecodeError(format!("Failed to create resampler: {error}"))
        })?;

        let seek_target = seconds_to_seek_timestamp(start);
        self.input_context.seek(seek_target, ..seek_target)?;

        let mut window = SampleWindow::new(start, end, sample_rate);
        let mut decoded_frame = AudioFrame::empty();
        let mut resampled_frame = AudioFrame::empty();

        for (stream, packet) in self.input_context.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|error| ShotError::AudioDecodeError(error.to_string()))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let frame_start = decoded_frame.pts().map(|pts| pts_to_seconds(pts, time_base));
                resampler
                    .run(&decoded_frame, &mut resampled_frame)
                    .map_err(|error| ShotError::AudioDecodeError(format!("Resample error: {error}")))?;
                window.push(frame_start, &resampled_frame);
            }

            if window.is_complete() {
                break;
            }
        }

        if !window.is_complete() {
            decoder
                .send_eof()
                .map_err(|error| ShotError::AudioDecodeError(error.to_string()))?;
            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                let frame_start = decoded_frame.pts().map(|pts| pts_to_seconds(pts, time_base));
                resampler
                    .run(&decoded_frame, &mut resampled_frame)
                    .map_err(|error| ShotError::AudioDecodeError(format!("Resample error: {error}")))?;
                window.push(frame_start, &resampled_frame);
            }
        }

        Ok(window.into_samples())
    }
}

/// Collects the interleaved samples that fall inside a time window.
struct SampleWindow {
    start: f64,
    end: f64,
    sample_rate: f64,
    cursor: Option<f64>,
    samples: Vec<f32>,
}

impl SampleWindow {
    fn new(start: f64, end: f64, sample_rate: u32) -> Self {
        Self {
            start,
            end,
            sample_rate: sample_rate as f64,
            cursor: None,
            samples: Vec::new(),
        }
    }

    fn is_complete(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor >= self.end)
    }

    fn push(&mut self, frame_start: Option<f64>, resampled: &AudioFrame) {
        let channels = resampled.channels() as usize;
        let sample_count = resampled.samples();
        let frame_start = frame_start.or(self.cursor).unwrap_or(self.start);
        self.cursor = Some(frame_start + sample_count as f64 / self.sample_rate);

        if channels == 0 || sample_count == 0 {
            return;
        }

        let data = resampled.data(0);
        let interleaved: &[f32] = unsafe {
            std::slice::from_raw_parts(data.as_ptr() as *const f32, sample_count * channels)
        };

        for (index, chunk) in interleaved.chunks_exact(channels).enumerate() {
            let time = frame_start + index as f64 / self.sample_rate;
            if time >= self.start && time < self.end {
                self.samples.extend_from_slice(chunk);
            }
        }
    }

    fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

fn rgb_frame_to_image(frame: &VideoFrame, width: u32, height: u32) -> Result<DynamicImage, ShotError> {
    let buffer = frame_to_rgb_buffer(frame, width, height);
    RgbImage::from_raw(width, height, buffer)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| {
            ShotError::VideoDecodeError("Decoded frame buffer has unexpected size".to_string())
        })
}
