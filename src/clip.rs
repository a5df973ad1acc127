//! Clip writer: cut a time range out of a media file and re-encode it.
//!
//! [`ClipWriter`] is the FFmpeg-backed [`MediaSink`]. Each cut opens the
//! source, seeks to the segment start, decodes video and audio up to the
//! segment end, and muxes a freshly encoded H.264 + AAC file whose
//! timestamps start at zero.
//!
//! # Example
//!
//! ```no_run
//! use shotreel::{ClipOptions, ClipWriter, MediaSink, OutputSegment, ShotError};
//!
//! let mut writer = ClipWriter::new(ClipOptions::default().with_fps(25));
//! let segment = OutputSegment::around(0, 42, 2.0, 2.0, 600.0);
//! writer.cut("match.mp4".as_ref(), &segment, "shots/shot_1.mp4".as_ref())?;
//! # Ok::<(), ShotError>(())
//! ```

use std::path::Path;

use ffmpeg_next::{
    ChannelLayout, Dictionary, Packet, Rational,
    codec::{Id, context::Context as CodecContext, decoder, encoder},
    format::{Flags as FormatFlags, Pixel, Sample, context::Output, sample::Type as SampleType},
    frame::{Audio as AudioFrame, Video as VideoFrame},
    media::Type,
    software::{
        resampling::Context as ResamplingContext,
        scaling::{Context as ScalingContext, Flags as ScalingFlags},
    },
};

use crate::{
    conversion::{pts_to_seconds, seconds_to_seek_timestamp},
    error::ShotError,
    media::MediaSink,
    segment::OutputSegment,
};

/// Output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoCodec {
    /// H.264 / AVC.
    #[default]
    H264,
    /// H.265 / HEVC.
    H265,
    /// MPEG-4 Part 2.
    Mpeg4,
}

impl VideoCodec {
    fn codec_id(self) -> Id {
        match self {
            VideoCodec::H264 => Id::H264,
            VideoCodec::H265 => Id::HEVC,
            VideoCodec::Mpeg4 => Id::MPEG4,
        }
    }

    fn supports_crf(self) -> bool {
        matches!(self, VideoCodec::H264 | VideoCodec::H265)
    }
}

/// Encoding settings for written clips.
#[derive(Debug, Clone)]
pub struct ClipOptions {
    /// Output frame rate (default: 30).
    pub fps: u32,
    /// Video codec (default: H.264).
    pub codec: VideoCodec,
    /// Constant Rate Factor, 0-51, lower is better (default: 23).
    pub crf: Option<u32>,
    /// AAC bitrate in bits per second (default: 128 000).
    pub audio_bitrate: usize,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            codec: VideoCodec::H264,
            crf: Some(23),
            audio_bitrate: 128_000,
        }
    }
}

impl ClipOptions {
    /// Set the output frame rate.
    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Set the video codec.
    #[must_use]
    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the CRF quality value. `None` uses the encoder default.
    #[must_use]
    pub fn with_crf(mut self, crf: Option<u32>) -> Self {
        self.crf = crf.map(|value| value.min(51));
        self
    }

    /// Set the audio bitrate.
    #[must_use]
    pub fn with_audio_bitrate(mut self, bitrate: usize) -> Self {
        self.audio_bitrate = bitrate;
        self
    }
}

/// FFmpeg-backed [`MediaSink`].
#[derive(Debug, Clone, Default)]
pub struct ClipWriter {
    options: ClipOptions,
}

impl ClipWriter {
    /// Create a writer with the given encoding settings.
    pub fn new(options: ClipOptions) -> Self {
        Self { options }
    }

    /// The encoding settings.
    pub fn options(&self) -> &ClipOptions {
        &self.options
    }
}

impl MediaSink for ClipWriter {
    fn cut(
        &mut self,
        source: &Path,
        segment: &OutputSegment,
        output: &Path,
    ) -> Result<(), ShotError> {
        log::debug!(
            "Cutting {:.2}s..{:.2}s of {} into {}",
            segment.start,
            segment.end,
            source.display(),
            output.display()
        );

        ffmpeg_next::init()?;
        let mut input = ffmpeg_next::format::input(&source).map_err(|error| ShotError::FileOpen {
            path: source.to_path_buf(),
            reason: error.to_string(),
        })?;

        let mut output_context = ffmpeg_next::format::output(&output)
            .map_err(|error| ShotError::ClipEncodeError(format!("cannot open output: {error}")))?;
        let global_header = output_context
            .format()
            .flags()
            .contains(FormatFlags::GLOBAL_HEADER);

        let mut video = match input.streams().best(Type::Video) {
            Some(stream) => VideoLane::open(
                &stream,
                &mut output_context,
                &self.options,
                global_header,
            )?,
            None => return Err(ShotError::NoVideoStream),
        };
        let mut audio = match input.streams().best(Type::Audio) {
            Some(stream) => Some(AudioLane::open(
                &stream,
                &mut output_context,
                &self.options,
                global_header,
            )?),
            None => None,
        };

        output_context
            .write_header()
            .map_err(|error| ShotError::ClipEncodeError(format!("cannot write header: {error}")))?;
        video.bind_output(&output_context);
        if let Some(audio) = audio.as_mut() {
            audio.bind_output(&output_context);
        }

        let seek_target = seconds_to_seek_timestamp(segment.start);
        input.seek(seek_target, ..seek_target)?;

        for (stream, packet) in input.packets() {
            let index = stream.index();
            if index == video.input_index && !video.finished {
                video.feed(&packet, segment, &mut output_context)?;
            } else if let Some(audio) = audio.as_mut()
                && index == audio.input_index
                && !audio.finished
            {
                audio.feed(&packet, segment, &mut output_context)?;
            }

            if video.finished && audio.as_ref().is_none_or(|audio| audio.finished) {
                break;
            }
        }

        video.finish(segment, &mut output_context)?;
        if let Some(audio) = audio.as_mut() {
            audio.finish(segment, &mut output_context)?;
        }

        output_context
            .write_trailer()
            .map_err(|error| ShotError::ClipEncodeError(format!("cannot write trailer: {error}")))?;

        log::debug!(
            "Wrote {} video frame(s) to {}",
            video.frames_written,
            output.display()
        );
        Ok(())
    }
}

fn write_packets<R>(
    receive: &mut R,
    packet: &mut Packet,
    output_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    output: &mut Output,
) -> Result<(), ShotError>
where
    R: FnMut(&mut Packet) -> bool,
{
    while receive(packet) {
        packet.set_stream(output_index);
        packet.rescale_ts(encoder_time_base, stream_time_base);
        packet
            .write_interleaved(output)
            .map_err(|error| ShotError::ClipEncodeError(format!("write packet failed: {error}")))?;
    }
    Ok(())
}

// ── Video ───────────────────────────────────────────────────────────

struct VideoLane {
    input_index: usize,
    output_index: usize,
    input_time_base: Rational,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    fps: f64,
    decoder: decoder::Video,
    encoder: encoder::Video,
    scaler: ScalingContext,
    decoded: VideoFrame,
    converted: VideoFrame,
    packet: Packet,
    last_index: Option<i64>,
    frames_written: u64,
    finished: bool,
}

impl VideoLane {
    fn open(
        stream: &ffmpeg_next::Stream,
        output: &mut Output,
        options: &ClipOptions,
        global_header: bool,
    ) -> Result<Self, ShotError> {
        let decoder = CodecContext::from_parameters(stream.parameters())?
            .decoder()
            .video()
            .map_err(|error| ShotError::VideoDecodeError(error.to_string()))?;
        let (width, height) = (decoder.width(), decoder.height());

        let codec_id = options.codec.codec_id();
        let codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            ShotError::ClipEncodeError(format!("codec {codec_id:?} not available"))
        })?;

        let mut output_stream = output
            .add_stream(codec)
            .map_err(|error| ShotError::ClipEncodeError(format!("cannot add stream: {error}")))?;
        let output_index = output_stream.index();
        let encoder_time_base = Rational::new(1, options.fps as i32);

        let mut context = CodecContext::from_parameters(output_stream.parameters())?
            .encoder()
            .video()
            .map_err(|error| ShotError::ClipEncodeError(format!("cannot open encoder: {error}")))?;
        context.set_width(width);
        context.set_height(height);
        context.set_format(Pixel::YUV420P);
        context.set_time_base(encoder_time_base);
        context.set_frame_rate(Some(Rational::new(options.fps as i32, 1)));
        if global_header {
            unsafe {
                (*context.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let mut codec_options = Dictionary::new();
        if let Some(crf) = options.crf
            && options.codec.supports_crf()
        {
            codec_options.set("crf", &crf.to_string());
        }
        let encoder = context
            .open_as_with(codec, codec_options)
            .map_err(|error| ShotError::ClipEncodeError(format!("cannot open encoder: {error}")))?;
        output_stream.set_parameters(&encoder);
        output_stream.set_time_base(encoder_time_base);

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        Ok(Self {
            input_index: stream.index(),
            output_index,
            input_time_base: stream.time_base(),
            encoder_time_base,
            stream_time_base: encoder_time_base,
            fps: options.fps as f64,
            decoder,
            encoder,
            scaler,
            decoded: VideoFrame::empty(),
            converted: VideoFrame::empty(),
            packet: Packet::empty(),
            last_index: None,
            frames_written: 0,
            finished: false,
        })
    }

    fn bind_output(&mut self, output: &Output) {
        if let Some(stream) = output.stream(self.output_index) {
            self.stream_time_base = stream.time_base();
        }
    }

    fn feed(
        &mut self,
        packet: &Packet,
        segment: &OutputSegment,
        output: &mut Output,
    ) -> Result<(), ShotError> {
        self.decoder
            .send_packet(packet)
            .map_err(|error| ShotError::VideoDecodeError(error.to_string()))?;
        self.drain_decoder(segment, output)
    }

    fn drain_decoder(&mut self, segment: &OutputSegment, output: &mut Output) -> Result<(), ShotError> {
        while self.decoder.receive_frame(&mut self.decoded).is_ok() {
            let Some(pts) = self.decoded.timestamp().or(self.decoded.pts()) else {
                continue;
            };
            let time = pts_to_seconds(pts, self.input_time_base);
            if time < segment.start {
                continue;
            }
            if time >= segment.end {
                self.finished = true;
                continue;
            }

            // Frames landing on an already-written output slot are dropped.
            let index = ((time - segment.start) * self.fps).round() as i64;
            if self.last_index.is_some_and(|last| index <= last) {
                continue;
            }
            self.last_index = Some(index);

            self.scaler.run(&self.decoded, &mut self.converted)?;
            self.converted.set_pts(Some(index));
            self.encoder
                .send_frame(&self.converted)
                .map_err(|error| ShotError::ClipEncodeError(format!("send_frame failed: {error}")))?;
            self.frames_written += 1;
            self.write_pending(output)?;
        }
        Ok(())
    }

    fn write_pending(&mut self, output: &mut Output) -> Result<(), ShotError> {
        let encoder = &mut self.encoder;
        write_packets(
            &mut |packet: &mut Packet| encoder.receive_packet(packet).is_ok(),
            &mut self.packet,
            self.output_index,
            self.encoder_time_base,
            self.stream_time_base,
            output,
        )
    }

    fn finish(&mut self, segment: &OutputSegment, output: &mut Output) -> Result<(), ShotError> {
        if !self.finished {
            self.decoder
                .send_eof()
                .map_err(|error| ShotError::VideoDecodeError(error.to_string()))?;
            self.drain_decoder(segment, output)?;
        }
        self.encoder
            .send_eof()
            .map_err(|error| ShotError::ClipEncodeError(format!("send_eof failed: {error}")))?;
        self.write_pending(output)
    }
}

// ── Audio ───────────────────────────────────────────────────────────

struct AudioLane {
    input_index: usize,
    output_index: usize,
    input_time_base: Rational,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    sample_rate: u32,
    channel_layout: ChannelLayout,
    frame_size: usize,
    decoder: decoder::Audio,
    encoder: encoder::Audio,
    resampler: ResamplingContext,
    decoded: AudioFrame,
    resampled: AudioFrame,
    packet: Packet,
    pending: Vec<Vec<f32>>,
    samples_written: i64,
    finished: bool,
}

impl AudioLane {
    fn open(
        stream: &ffmpeg_next::Stream,
        output: &mut Output,
        options: &ClipOptions,
        global_header: bool,
    ) -> Result<Self, ShotError> {
        let decoder = CodecContext::from_parameters(stream.parameters())?
            .decoder()
            .audio()
            .map_err(|error| ShotError::AudioDecodeError(error.to_string()))?;
        let sample_rate = decoder.rate();
        let channel_layout = decoder.channel_layout();
        let sample_format = Sample::F32(SampleType::Planar);

        let codec = ffmpeg_next::encoder::find(Id::AAC)
            .ok_or_else(|| ShotError::ClipEncodeError("AAC encoder not available".to_string()))?;
        let mut output_stream = output
            .add_stream(codec)
            .map_err(|error| ShotError::ClipEncodeError(format!("cannot add stream: {error}")))?;
        let output_index = output_stream.index();
        let encoder_time_base = Rational::new(1, sample_rate as i32);

        let mut context = CodecContext::new()
            .encoder()
            .audio()
            .map_err(|error| ShotError::ClipEncodeError(error.to_string()))?;
        context.set_rate(sample_rate as i32);
        context.set_channel_layout(channel_layout);
        context.set_format(sample_format);
        context.set_time_base(encoder_time_base);
        context.set_bit_rate(options.audio_bitrate);
        if global_header {
            unsafe {
                (*context.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = context
            .open_as(codec)
            .map_err(|error| ShotError::ClipEncodeError(format!("cannot open AAC encoder: {error}")))?;
        output_stream.set_parameters(&encoder);
        output_stream.set_time_base(encoder_time_base);

        let resampler = ResamplingContext::get(
            decoder.format(),
            decoder.channel_layout(),
            sample_rate,
            sample_format,
            channel_layout,
            sample_rate,
        )
        .map_err(|error| ShotError::ClipEncodeError(format!("cannot create resampler: {error}")))?;

        let frame_size = encoder.frame_size() as usize;
        let channels = decoder.channels() as usize;

        Ok(Self {
            input_index: stream.index(),
            output_index,
            input_time_base: stream.time_base(),
            encoder_time_base,
            stream_time_base: encoder_time_base,
            sample_rate,
            channel_layout,
            frame_size,
            decoder,
            encoder,
            resampler,
            decoded: AudioFrame::empty(),
            resampled: AudioFrame::empty(),
            packet: Packet::empty(),
            pending: vec![Vec::new(); channels.max(1)],
            samples_written: 0,
            finished: false,
        })
    }

    fn bind_output(&mut self, output: &Output) {
        if let Some(stream) = output.stream(self.output_index) {
            self.stream_time_base = stream.time_base();
        }
    }

    fn feed(
        &mut self,
        packet: &Packet,
        segment: &OutputSegment,
        output: &mut Output,
    ) -> Result<(), ShotError> {
        self.decoder
            .send_packet(packet)
            .map_err(|error| ShotError::AudioDecodeError(error.to_string()))?;
        self.drain_decoder(segment, output)
    }

    fn drain_decoder(&mut self, segment: &OutputSegment, output: &mut Output) -> Result<(), ShotError> {
        while self.decoder.receive_frame(&mut self.decoded).is_ok() {
            let Some(pts) = self.decoded.pts() else {
                continue;
            };
            let frame_start = pts_to_seconds(pts, self.input_time_base);
            if frame_start >= segment.end {
                self.finished = true;
                continue;
            }

            self.resampler
                .run(&self.decoded, &mut self.resampled)
                .map_err(|error| ShotError::ClipEncodeError(format!("resample failed: {error}")))?;
            self.buffer_window(frame_start, segment);
            self.encode_full_frames(output)?;
        }
        Ok(())
    }

    /// Append the part of the resampled frame inside the segment.
    fn buffer_window(&mut self, frame_start: f64, segment: &OutputSegment) {
        let samples = self.resampled.samples();
        let rate = self.sample_rate as f64;
        let first = ((segment.start - frame_start) * rate).ceil().max(0.0) as usize;
        let last = (((segment.end - frame_start) * rate).ceil().max(0.0) as usize).min(samples);
        if first >= last {
            return;
        }

        let planes = self.resampled.planes().min(self.pending.len());
        for (channel, buffer) in self.pending.iter_mut().enumerate().take(planes) {
            let plane: &[f32] = self.resampled.plane(channel);
            buffer.extend_from_slice(&plane[first..last.min(plane.len())]);
        }
    }

    fn encode_full_frames(&mut self, output: &mut Output) -> Result<(), ShotError> {
        let chunk = if self.frame_size == 0 {
            self.pending[0].len()
        } else {
            self.frame_size
        };
        while chunk > 0 && self.pending[0].len() >= chunk {
            self.encode_chunk(chunk, output)?;
        }
        Ok(())
    }

    fn encode_chunk(&mut self, count: usize, output: &mut Output) -> Result<(), ShotError> {
        let mut frame = AudioFrame::new(Sample::F32(SampleType::Planar), count, self.channel_layout);
        frame.set_rate(self.sample_rate);
        for (channel, buffer) in self.pending.iter_mut().enumerate() {
            let plane: &mut [f32] = frame.plane_mut(channel);
            plane[..count].copy_from_slice(&buffer[..count]);
            buffer.drain(..count);
        }
        frame.set_pts(Some(self.samples_written));
        self.samples_written += count as i64;

        self.encoder
            .send_frame(&frame)
            .map_err(|error| ShotError::ClipEncodeError(format!("audio send_frame failed: {error}")))?;
        self.write_pending(output)
    }

    fn write_pending(&mut self, output: &mut Output) -> Result<(), ShotError> {
        let encoder = &mut self.encoder;
        write_packets(
            &mut |packet: &mut Packet| encoder.receive_packet(packet).is_ok(),
            &mut self.packet,
            self.output_index,
            self.encoder_time_base,
            self.stream_time_base,
            output,
        )
    }

    fn finish(&mut self, segment: &OutputSegment, output: &mut Output) -> Result<(), ShotError> {
        if !self.finished {
            self.decoder
                .send_eof()
                .map_err(|error| ShotError::AudioDecodeError(error.to_string()))?;
            self.drain_decoder(segment, output)?;
        }
        let remaining = self.pending[0].len();
        if remaining > 0 {
            self.encode_chunk(remaining, output)?;
        }
        self.encoder
            .send_eof()
            .map_err(|error| ShotError::ClipEncodeError(format!("audio send_eof failed: {error}")))?;
        self.write_pending(output)
    }
}
