//! FFmpeg console verbosity.
//!
//! FFmpeg logs to stderr on its own, independently of the `log` facade used
//! by this crate. Decoding a long match recording at the default level can
//! print a warning per damaged packet; [`set_ffmpeg_log_level`] tunes that
//! without callers importing `ffmpeg-next`.
//!
//! ```no_run
//! use shotreel::FfmpegLogLevel;
//!
//! let level: FfmpegLogLevel = "error".parse().unwrap();
//! shotreel::set_ffmpeg_log_level(level);
//! ```

use std::{fmt, str::FromStr};

use ffmpeg_next::util::log::Level;

use crate::error::ShotError;

/// FFmpeg log level, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FfmpegLogLevel {
    /// Print nothing.
    Quiet,
    /// Only conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// FFmpeg's default.
    Warning,
    /// Informational messages.
    Info,
    /// Detailed informational messages.
    Verbose,
    /// Debugging output.
    Debug,
    /// Very verbose debugging output.
    Trace,
}

impl FfmpegLogLevel {
    /// Every level, most quiet first.
    pub const ALL: [FfmpegLogLevel; 9] = [
        FfmpegLogLevel::Quiet,
        FfmpegLogLevel::Panic,
        FfmpegLogLevel::Fatal,
        FfmpegLogLevel::Error,
        FfmpegLogLevel::Warning,
        FfmpegLogLevel::Info,
        FfmpegLogLevel::Verbose,
        FfmpegLogLevel::Debug,
        FfmpegLogLevel::Trace,
    ];

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }

    fn level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }
}

impl fmt::Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = ShotError;

    /// Case-insensitive; `warn` is accepted for `warning`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        if value == "warn" {
            return Ok(FfmpegLogLevel::Warning);
        }
        Self::ALL
            .into_iter()
            .find(|level| level.name() == value)
            .ok_or_else(|| {
                ShotError::InvalidConfig(format!(
                    "unknown FFmpeg log level '{value}' (expected one of: quiet, panic, fatal, \
                     error, warning, info, verbose, debug, trace)"
                ))
            })
    }
}

/// Set FFmpeg's own stderr verbosity. Does not affect `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    log::debug!("Setting FFmpeg log level to {level}");
    ffmpeg_next::util::log::set_level(level.level());
}
