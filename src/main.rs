use anyhow::{Context, Result};
use beat_sync::analysis::{BackendChoice, Extraction, ExtractionConfig, Extractor};
use beat_sync::model::{MarkerType, TimelineMarker};
use beat_sync::source::{FileResolver, SUPPORTED_EXTENSIONS};
use beat_sync::sync::CategoryOffsets;
use beat_sync::{CancelToken, MarkerIndex, MarkerPipeline};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "beat-sync")]
#[command(about = "Extract audio timing markers and sync them to video frames", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Extraction backend
    #[arg(long, value_enum, default_value_t = BackendArg::Auto, global = true)]
    backend: BackendArg,

    /// Extraction configuration file (JSON, camelCase keys)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract markers from audio files or directories and print a JSON report
    Analyze {
        /// Audio files or directories to scan
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Worker threads (0 = one per core)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,
    },

    /// Print the frame-synchronized beat/onset/downbeat aggregate
    Frames {
        input: String,

        #[command(flatten)]
        timeline: TimelineArgs,
    },

    /// Run the per-frame queries for one frame
    Query {
        input: String,

        #[command(flatten)]
        timeline: TimelineArgs,

        /// Frame to query
        #[arg(long, allow_hyphen_values = true)]
        frame: i64,

        /// Tolerance / window radius in frames
        #[arg(long, default_value = "2")]
        tolerance: u32,

        /// Restrict queries to one marker type
        #[arg(long = "type")]
        marker_type: Option<MarkerType>,
    },
}

#[derive(clap::Args, Debug)]
struct TimelineArgs {
    /// Video frame rate
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Frame at which the audio starts
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    start_frame: i64,

    /// Frame offset applied to beats
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    beat_offset: i64,

    /// Frame offset applied to onsets
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    onset_offset: i64,

    /// Frame offset applied to downbeats
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    downbeat_offset: i64,
}

impl TimelineArgs {
    fn offsets(&self) -> CategoryOffsets {
        CategoryOffsets {
            beat: self.beat_offset,
            onset: self.onset_offset,
            downbeat: self.downbeat_offset,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Auto,
    Optimized,
    Fallback,
}

impl From<BackendArg> for BackendChoice {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendChoice::Auto,
            BackendArg::Optimized => BackendChoice::Optimized,
            BackendArg::Fallback => BackendChoice::Fallback,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match &args.config {
        Some(path) => {
            let path = PathBuf::from(shellexpand::tilde(path).as_ref());
            log::info!("Loading extraction config from {:?}", path);
            ExtractionConfig::from_json_file(&path)?
        }
        None => ExtractionConfig::default(),
    };

    let extractor = Extractor::new(args.backend.into(), config);
    log::info!("Using {} backend", extractor.backend_kind().name());

    let pipeline = MarkerPipeline::new(FileResolver::new(), extractor);

    match args.command {
        Command::Analyze { inputs, jobs } => analyze(&pipeline, &inputs, jobs),
        Command::Frames { input, timeline } => frames(&pipeline, &input, &timeline),
        Command::Query {
            input,
            timeline,
            frame,
            tolerance,
            marker_type,
        } => query(&pipeline, &input, &timeline, frame, tolerance, marker_type),
    }
}

fn analyze(pipeline: &MarkerPipeline<FileResolver>, inputs: &[String], jobs: usize) -> Result<()> {
    let sources = collect_sources(inputs);
    if sources.is_empty() {
        anyhow::bail!("No audio files found in {:?}", inputs);
    }
    log::info!("Analyzing {} source(s)", sources.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to build worker pool")?;

    let cancel = CancelToken::new();
    let reports: Vec<serde_json::Value> = pool.install(|| {
        sources
            .par_iter()
            .filter_map(|source| {
                let extraction = pipeline.markers(source, &cancel)?;
                Some(report(source, &extraction))
            })
            .collect()
    });

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}

fn frames(pipeline: &MarkerPipeline<FileResolver>, input: &str, timeline: &TimelineArgs) -> Result<()> {
    let index = build_index(pipeline, input, timeline)?;

    let output = json!({
        "source": input,
        "fps": timeline.fps,
        "startFrame": timeline.start_frame,
        "frames": index.frame_markers(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn query(
    pipeline: &MarkerPipeline<FileResolver>,
    input: &str,
    timeline: &TimelineArgs,
    frame: i64,
    tolerance: u32,
    marker_type: Option<MarkerType>,
) -> Result<()> {
    let index = build_index(pipeline, input, timeline)?;
    let window: Vec<&TimelineMarker> = index
        .markers_in_window(frame, tolerance)
        .into_iter()
        .filter(|m| marker_type.map_or(true, |t| m.marker_type == t))
        .collect();

    let output = json!({
        "frame": frame,
        "window": window,
        "near": index.has_marker_near(frame, marker_type, tolerance),
        "next": index.next_marker(frame, marker_type),
        "previous": index.previous_marker(frame, marker_type),
        "interpolate": index.interpolate(frame, marker_type.unwrap_or(MarkerType::Beat)),
        "nearest": index.nearest_frame(frame),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn build_index(
    pipeline: &MarkerPipeline<FileResolver>,
    input: &str,
    timeline: &TimelineArgs,
) -> Result<MarkerIndex> {
    let source = shellexpand::tilde(input).into_owned();

    if let Some(extraction) = pipeline.markers(&source, &CancelToken::new()) {
        if let Some(reason) = extraction.reason() {
            log::warn!("Markers for {} are degraded: {}", source, reason);
        }
    }

    pipeline
        .frame_index(
            &source,
            timeline.start_frame,
            timeline.fps,
            &timeline.offsets(),
            &CancelToken::new(),
        )
        .context("Extraction was cancelled")
}

fn report(source: &str, extraction: &Extraction) -> serde_json::Value {
    json!({
        "source": source,
        "analyzedAt": chrono::Utc::now().to_rfc3339(),
        "backend": extraction.backend,
        "status": extraction.status_name(),
        "reason": extraction.reason().map(|r| r.to_string()),
        "markers": extraction.markers,
    })
}

/// Expand inputs into audio file paths; directories are walked recursively
fn collect_sources(inputs: &[String]) -> Vec<String> {
    let mut sources = Vec::new();

    for input in inputs {
        let path = PathBuf::from(shellexpand::tilde(input).as_ref());

        if path.is_dir() {
            for entry in WalkDir::new(&path).follow_links(true).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && is_supported(entry.path()) {
                    sources.push(entry.path().to_string_lossy().into_owned());
                }
            }
        } else {
            sources.push(path.to_string_lossy().into_owned());
        }
    }

    sources.sort();
    sources.dedup();
    sources
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
