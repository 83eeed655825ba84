//! lipsync-batch: pair every audio clip with a video template and run
//! lip-sync inference on each pair.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::builder::RangedU64ValueParser;
use clap::Parser;

use lipsync_core::config::{load_settings, Settings};
use lipsync_core::logging::{init_tracing, init_tracing_with_file, LogConfig, LogLevel, RunLogger};
use lipsync_core::planner::TIMESTAMP_FORMAT;
use lipsync_core::runner::{preflight, prepare_output_dir, RunResult};
use lipsync_core::{BatchRunner, CombinationPlanner, InferenceSettings, PythonInference};

const DEFAULT_SETTINGS_PATH: &str = ".config/lipsync.toml";

#[derive(Parser, Debug)]
#[command(name = "lipsync-batch", version, about = "Batch lip-sync inference over audio/video pairs", long_about = None)]
struct Args {
    /// Directory containing video templates
    #[arg(long = "video_dir")]
    video_dir: Option<PathBuf>,

    /// Directory containing audio clips
    #[arg(long = "audio_dir")]
    audio_dir: Option<PathBuf>,

    /// Directory for generated videos
    #[arg(long = "output_dir")]
    output_dir: Option<PathBuf>,

    /// UNet config file
    #[arg(long = "config_path")]
    config_path: Option<PathBuf>,

    /// Inference checkpoint
    #[arg(long = "ckpt_path")]
    ckpt_path: Option<PathBuf>,

    /// Diffusion steps (expected 20-50)
    #[arg(long = "inference_steps")]
    inference_steps: Option<u32>,

    /// Guidance scale (expected 1.0-3.0)
    #[arg(long = "guidance_scale")]
    guidance_scale: Option<f64>,

    /// Process at most this many combinations
    #[arg(long = "max_combinations", value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    max_combinations: Option<usize>,

    /// Seed for video selection and inference
    #[arg(long = "random_seed")]
    random_seed: Option<u64>,

    /// Pick videos at random with replacement instead of cycling through them
    #[arg(long = "allow_repeat_videos")]
    allow_repeat_videos: bool,

    /// Enable DeepCache acceleration
    #[arg(long = "enable_deepcache", conflicts_with = "disable_deepcache")]
    enable_deepcache: bool,

    /// Disable DeepCache acceleration
    #[arg(long = "disable_deepcache")]
    disable_deepcache: bool,

    /// Settings file (created with defaults if missing, except on a dry run)
    #[arg(long = "settings", default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Python interpreter used for inference
    #[arg(long)]
    python: Option<String>,

    /// Working directory for the inference process (model repository root)
    #[arg(long = "working_dir")]
    working_dir: Option<PathBuf>,

    /// Print the planned commands without running inference
    #[arg(long = "dry_run")]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log_level")]
    log_level: Option<LogLevel>,
}

impl Args {
    /// Apply command-line overrides on top of the settings file.
    fn apply(&self, settings: &mut Settings) {
        if let Some(ref dir) = self.video_dir {
            settings.paths.video_dir = dir.clone();
        }
        if let Some(ref dir) = self.audio_dir {
            settings.paths.audio_dir = dir.clone();
        }
        if let Some(ref dir) = self.output_dir {
            settings.paths.output_dir = dir.clone();
        }
        if let Some(ref path) = self.config_path {
            settings.model.config_path = path.clone();
        }
        if let Some(ref path) = self.ckpt_path {
            settings.model.ckpt_path = path.clone();
        }
        if let Some(ref python) = self.python {
            settings.model.python = python.clone();
        }
        if let Some(ref dir) = self.working_dir {
            settings.model.working_dir = Some(dir.clone());
        }
        if let Some(steps) = self.inference_steps {
            settings.inference.inference_steps = steps;
        }
        if let Some(scale) = self.guidance_scale {
            settings.inference.guidance_scale = scale;
        }
        if self.enable_deepcache {
            settings.inference.enable_deepcache = true;
        }
        if self.disable_deepcache {
            settings.inference.enable_deepcache = false;
        }
        if let Some(max) = self.max_combinations {
            settings.batch.max_combinations = Some(max);
        }
        if let Some(seed) = self.random_seed {
            settings.batch.random_seed = Some(seed);
        }
        if self.allow_repeat_videos {
            settings.batch.allow_repeat_videos = true;
        }
        if let Some(level) = self.log_level {
            settings.logging.level = level;
        }
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // A dry run leaves the filesystem alone, settings file included
    let mut settings = load_settings(&args.settings, !args.dry_run)
        .with_context(|| format!("loading settings from {}", args.settings.display()))?;
    args.apply(&mut settings);

    let _guard = if args.dry_run {
        init_tracing(settings.logging.level);
        None
    } else {
        fs::create_dir_all(&settings.paths.logs_folder).with_context(|| {
            format!(
                "creating logs folder {}",
                settings.paths.logs_folder.display()
            )
        })?;
        Some(init_tracing_with_file(
            settings.logging.level,
            &settings.paths.logs_folder,
        ))
    };

    tracing::info!("lipsync-batch {}", lipsync_core::version());

    for warning in settings.range_warnings() {
        tracing::warn!("{}", warning);
    }

    let cwd = std::env::current_dir().context("reading current directory")?;
    let video_dir = absolute(&cwd, &settings.paths.video_dir);
    let audio_dir = absolute(&cwd, &settings.paths.audio_dir);
    let output_dir = absolute(&cwd, &settings.paths.output_dir);

    let inference_settings = InferenceSettings::from_settings(&settings);
    let working_dir = settings.model.working_dir.as_deref();

    if !args.dry_run {
        preflight(&inference_settings, working_dir).context("checking model files")?;
    }

    let planner = CombinationPlanner::new(settings.plan_options());
    let plan = planner
        .plan_dirs(&audio_dir, &video_dir)
        .context("planning combinations")?;

    println!("Audio directory: {}", audio_dir.display());
    println!("Video directory: {}", video_dir.display());
    println!("Output directory: {}", output_dir.display());
    println!(
        "Combinations: {} ({} video templates, {})",
        plan.total(),
        plan.videos().len(),
        plan.policy().describe()
    );
    println!(
        "Inference steps: {}, guidance scale: {}, DeepCache: {}",
        inference_settings.inference_steps,
        inference_settings.guidance_scale,
        if inference_settings.enable_deepcache {
            "on"
        } else {
            "off"
        }
    );

    let mut inference = PythonInference::from_settings(&settings.model);
    let runner = BatchRunner::new(inference_settings, &output_dir).with_progress_callback(
        Box::new(|done: usize, total: usize, result: &RunResult| {
            tracing::debug!(
                "Finished {}/{}: {} ({})",
                done,
                total,
                result.output_name,
                if result.is_success() { "ok" } else { "failed" }
            );
        }),
    );

    if args.dry_run {
        for combination in plan {
            let request = runner.request_for(&combination);
            println!(
                "[{}] {}",
                combination.index(),
                inference.command_line(&request)
            );
        }
        return Ok(());
    }

    prepare_output_dir(&output_dir).context("preparing output directory")?;

    let run_name = format!("batch_{}", Local::now().format(TIMESTAMP_FORMAT));
    let logger = RunLogger::new(
        run_name,
        &settings.paths.logs_folder,
        LogConfig::from(&settings.logging),
        Some(Box::new(|line: &str| println!("{}", line))),
    )
    .context("creating run log")?;

    let outcome = runner.run(plan, &mut inference, &logger);
    logger.close();

    println!();
    println!("{}", outcome.summary);

    let failures: Vec<_> = outcome.failures().collect();
    if !failures.is_empty() {
        println!("Failed combinations:");
        for result in failures {
            println!(
                "  {} + {}: {}",
                result.video_name,
                result.audio_name,
                result.error().unwrap_or("unknown error")
            );
        }
    }

    println!("Output directory: {}", output_dir.display());
    println!("Run log: {}", logger.log_path().display());

    Ok(())
}
