use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use shotreel::{
    BattingZone, CLIP_PREFIX, ClipOptions, ClipWriter, DEFAULT_ZONE_FILE, DetectionTrack,
    FfmpegLogLevel, MediaFile, PipelineOptions, RunConfig, RunSummary, ShotPipeline, Stage,
    StalenessPolicy,
};

const CLI_AFTER_HELP: &str = "Examples:\n  shotreel zone set 420 180 860 700\n  shotreel detect match.mp4 --detections match.detections.json --out shots\n  shotreel detect match.mp4 --detections d.json --out shots --gap 3 --movement 25 --json\n  shotreel probe match.mp4 --json\n  shotreel completions zsh > _shotreel";

#[derive(Debug, Parser)]
#[command(
    name = "shotreel",
    version,
    about = "Detect batting shots in cricket footage and cut a clip around each one",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Print per-stage status messages.
    #[arg(long, global = true)]
    verbose: bool,

    /// Replace clips or zone files that already exist.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect shots and write one clip per shot.
    #[command(
        about = "Detect shots and cut clips",
        after_help = "Examples:\n  shotreel detect match.mp4 --detections d.json --out shots\n  shotreel detect match.mp4 --detections d.json --out shots --pre 3 --post 1 --adjacent-only"
    )]
    Detect {
        /// Input video file.
        input: PathBuf,
        /// JSON file of per-second person detections.
        #[arg(long)]
        detections: PathBuf,
        /// Output directory for clips.
        #[arg(long)]
        out: PathBuf,
        /// Batting zone file.
        #[arg(long, default_value = DEFAULT_ZONE_FILE)]
        zone: PathBuf,
        /// Maximum seconds between events of one shot.
        #[arg(long, default_value_t = 2)]
        gap: u64,
        /// Seconds kept before each shot.
        #[arg(long, default_value_t = 2.0)]
        pre: f64,
        /// Seconds kept after each shot.
        #[arg(long, default_value_t = 2.0)]
        post: f64,
        /// Minimum vertical movement in pixels.
        #[arg(long, default_value_t = 30.0)]
        movement: f64,
        /// Audio energy multiple over the neighbourhood baseline.
        #[arg(long, default_value_t = 1.8)]
        audio_factor: f64,
        /// Only compare against the batter position from the previous second.
        #[arg(long)]
        adjacent_only: bool,
        /// Clip frame rate.
        #[arg(long, default_value_t = 30)]
        fps: u32,
        /// Clip container extension.
        #[arg(long, default_value = "mp4")]
        ext: String,
        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Manage the batting zone file.
    #[command(about = "Manage the batting zone")]
    Zone {
        #[command(subcommand)]
        action: ZoneAction,
    },

    /// Print media metadata.
    #[command(
        about = "Print media metadata",
        visible_alias = "info",
        after_help = "Examples:\n  shotreel probe match.mp4\n  shotreel probe match.mp4 --json"
    )]
    Probe {
        /// Input media file.
        input: PathBuf,
        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
enum ZoneAction {
    /// Store a zone from its corner coordinates.
    Set {
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        #[arg(long, default_value = DEFAULT_ZONE_FILE)]
        file: PathBuf,
    },
    /// Store a zone from a rectangle selected on a scaled-down preview.
    Select {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        /// Preview scale relative to the source (e.g. 0.5).
        #[arg(long)]
        scale: f64,
        #[arg(long, default_value = DEFAULT_ZONE_FILE)]
        file: PathBuf,
    },
    /// Print the stored zone.
    Show {
        #[arg(long, default_value = DEFAULT_ZONE_FILE)]
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        shotreel::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn warn(message: String) {
    eprintln!("{} {}", "warning:".yellow().bold(), message.yellow());
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            warn(format!("overwriting {}", path.display()));
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

/// Clips from an earlier run that a new run would replace.
fn existing_clips(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut clips: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            let stem_matches = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.strip_prefix(CLIP_PREFIX))
                .is_some_and(|number| number.parse::<usize>().is_ok());
            let extension_matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            stem_matches && extension_matches
        })
        .collect();
    clips.sort();
    clips
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::Scanning => "scanning",
        Stage::Extracting => "saving clips",
        _ => "done",
    }
}

fn summary_json(summary: &RunSummary) -> serde_json::Value {
    json!({
        "duration_seconds": summary.duration,
        "raw_events": summary.raw_events,
        "shots": summary.groups.iter().zip(&summary.clips).map(|(group, clip)| json!({
            "events": group.events(),
            "representative": group.representative(),
            "start": clip.segment.start,
            "end": clip.segment.end,
            "path": clip.path.display().to_string(),
        })).collect::<Vec<_>>(),
    })
}

#[allow(clippy::too_many_arguments)]
fn detect(
    global: &GlobalOptions,
    input: PathBuf,
    detections: PathBuf,
    out: PathBuf,
    zone: PathBuf,
    config: RunConfig,
    fps: u32,
    ext: String,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let zone = BattingZone::load(&zone)?;
    let options = PipelineOptions::new().with_extension(&ext);

    let stale = existing_clips(&out, options.extension());
    if !stale.is_empty() {
        if global.overwrite {
            warn(format!(
                "{} existing clip(s) in {} may be replaced",
                stale.len(),
                out.display()
            ));
        } else {
            return Err(format!(
                "{} already contains {} (use --overwrite to replace)",
                out.display(),
                stale[0].display()
            )
            .into());
        }
    }

    let source = MediaFile::open(&input)?;
    source.require_streams()?;
    let track = DetectionTrack::load(&detections)?;
    let writer = ClipWriter::new(ClipOptions::default().with_fps(fps));

    if global.verbose {
        eprintln!(
            "{} {} ({:.1}s), zone {}, {} detection frame(s)",
            "input".cyan().bold(),
            input.display(),
            source.metadata().duration,
            zone,
            track.len()
        );
    }

    let pipeline = ShotPipeline::new(zone, config, &out)?.with_options(options);
    let handle = pipeline.spawn(source, track, writer);

    let progress_bar = if json {
        None
    } else {
        let bar = ProgressBar::new(100);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}% {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Some(bar)
    };

    let mut last_stage = None;
    for info in handle.progress().iter() {
        if global.verbose && last_stage != Some(info.stage) {
            if let Some(bar) = &progress_bar {
                bar.println(format!(
                    "{} {} after {:.1}s",
                    "stage".cyan().bold(),
                    stage_label(info.stage),
                    info.elapsed.as_secs_f64()
                ));
            }
            last_stage = Some(info.stage);
        }
        if let Some(bar) = &progress_bar {
            bar.set_position(u64::from(info.percent));
            bar.set_message(stage_label(info.stage));
        }
    }

    let result = handle.join();
    if let Some(bar) = &progress_bar {
        bar.finish_and_clear();
    }
    let summary = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
        return Ok(());
    }

    if summary.clips.is_empty() {
        warn("no shots detected".to_string());
        return Ok(());
    }
    for clip in &summary.clips {
        println!(
            "{} {} ({:.1}s..{:.1}s)",
            "saved".green().bold(),
            clip.path.display(),
            clip.segment.start,
            clip.segment.end
        );
    }
    println!(
        "{} {} shot(s) saved to {}",
        "success:".green().bold(),
        summary.clips.len(),
        out.display()
    );
    Ok(())
}

fn save_zone(
    zone: &BattingZone,
    file: &Path,
    overwrite: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    ensure_writable_path(file, overwrite)?;
    zone.save(file)?;
    println!("{} zone {zone} saved to {}", "success:".green().bold(), file.display());
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Detect {
            input,
            detections,
            out,
            zone,
            gap,
            pre,
            post,
            movement,
            audio_factor,
            adjacent_only,
            fps,
            ext,
            json,
        } => {
            let mut config = RunConfig::new(gap, pre, post, movement, audio_factor)?;
            if adjacent_only {
                config = config.with_staleness(StalenessPolicy::AdjacentOnly { max_age: 1 });
            }
            detect(&cli.global, input, detections, out, zone, config, fps, ext, json)?;
        }
        Commands::Zone { action } => match action {
            ZoneAction::Set { x1, y1, x2, y2, file } => {
                let zone = BattingZone::new(x1, y1, x2, y2)?;
                save_zone(&zone, &file, cli.global.overwrite)?;
            }
            ZoneAction::Select {
                x,
                y,
                width,
                height,
                scale,
                file,
            } => {
                let zone = BattingZone::from_selection(x, y, width, height, scale)?;
                save_zone(&zone, &file, cli.global.overwrite)?;
            }
            ZoneAction::Show { file, json } => {
                let zone = BattingZone::load(&file)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&zone)?);
                } else {
                    println!("Zone: {zone}");
                    println!("Size: {}x{}", zone.width(), zone.height());
                }
            }
        },
        Commands::Probe { input, json } => {
            let source = MediaFile::open(&input)?;
            let metadata = source.metadata();
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "duration_seconds": metadata.duration,
                    "sampled_seconds": metadata.sampled_seconds(),
                    "video": metadata.video.as_ref().map(|video| json!({
                        "width": video.width,
                        "height": video.height,
                        "fps": video.frames_per_second,
                        "codec": video.codec,
                    })),
                    "audio": metadata.audio.as_ref().map(|audio| json!({
                        "sample_rate": audio.sample_rate,
                        "channels": audio.channels,
                        "codec": audio.codec,
                    })),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Duration: {:.2}s", metadata.duration);
                if let Some(video) = &metadata.video {
                    println!(
                        "Video: {}x{} @ {:.2} fps [{}]",
                        video.width, video.height, video.frames_per_second, video.codec,
                    );
                }
                if let Some(audio) = &metadata.audio {
                    println!(
                        "Audio: {} Hz, {} ch [{}]",
                        audio.sample_rate, audio.channels, audio.codec,
                    );
                }
                if let Err(error) = source.require_streams() {
                    warn(format!("cannot detect shots in this file: {error}"));
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "shotreel", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, ZoneAction, existing_clips};

    #[test]
    fn detect_defaults_match_interactive_tool() {
        let cli = Cli::try_parse_from([
            "shotreel",
            "detect",
            "match.mp4",
            "--detections",
            "d.json",
            "--out",
            "shots",
        ])
        .unwrap();

        match cli.command {
            Commands::Detect {
                zone,
                gap,
                pre,
                post,
                movement,
                audio_factor,
                adjacent_only,
                fps,
                ext,
                json,
                ..
            } => {
                assert_eq!(zone.to_str(), Some("batting_zone.json"));
                assert_eq!(gap, 2);
                assert_eq!(pre, 2.0);
                assert_eq!(post, 2.0);
                assert_eq!(movement, 30.0);
                assert_eq!(audio_factor, 1.8);
                assert!(!adjacent_only);
                assert_eq!(fps, 30);
                assert_eq!(ext, "mp4");
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "shotreel",
            "zone",
            "show",
            "--verbose",
            "--log-level",
            "error",
        ])
        .unwrap();
        assert!(cli.global.verbose);
        assert_eq!(cli.global.log_level.as_deref(), Some("error"));
        assert!(matches!(
            cli.command,
            Commands::Zone {
                action: ZoneAction::Show { json: false, .. }
            }
        ));
    }

    #[test]
    fn detect_requires_detections_and_out() {
        assert!(Cli::try_parse_from(["shotreel", "detect", "match.mp4"]).is_err());
    }

    #[test]
    fn existing_clips_only_matches_numbered_shots() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["shot_1.mp4", "shot_2.MP4", "shot_x.mp4", "shot_3.mkv", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let clips = existing_clips(dir.path(), "mp4");
        let names: Vec<_> = clips
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect();
        assert_eq!(names, ["shot_1.mp4", "shot_2.MP4"]);
    }

    #[test]
    fn existing_clips_of_missing_dir_is_empty() {
        assert!(existing_clips("does/not/exist".as_ref(), "mp4").is_empty());
    }
}
