//! Batch runner: drives the generator over a plan.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rand::Rng;

use super::types::{InferenceSettings, ProgressCallback, RunOutcome, RunResult, RunSummary};
use crate::errors::{BatchError, BatchResult};
use crate::inference::{GenerationRequest, LipsyncGenerator};
use crate::logging::RunLogger;
use crate::planner::Combination;

/// Range of per-item seeds drawn when no fixed seed is configured.
const SEED_RANGE: std::ops::RangeInclusive<u64> = 1..=999_999;

/// Check that the model config and checkpoint exist.
///
/// Relative paths are resolved against `base_dir` (the inference working
/// directory) when given.
pub fn preflight(settings: &InferenceSettings, base_dir: Option<&Path>) -> BatchResult<()> {
    let resolve = |path: &Path| -> PathBuf {
        match base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    };

    let config = resolve(&settings.config_path);
    if !config.is_file() {
        return Err(BatchError::missing_model_file("UNet config", config));
    }

    let checkpoint = resolve(&settings.checkpoint_path);
    if !checkpoint.is_file() {
        return Err(BatchError::missing_model_file("Checkpoint", checkpoint));
    }

    Ok(())
}

/// Create the output directory if it doesn't exist.
pub fn prepare_output_dir(output_dir: &Path) -> BatchResult<()> {
    fs::create_dir_all(output_dir)
        .map_err(|e| BatchError::io(format!("creating {}", output_dir.display()), e))
}

/// Runs every combination of a plan through a generator, one at a time.
///
/// A failed item is logged and counted; the run always continues with the
/// next combination. There are no retries.
pub struct BatchRunner {
    settings: InferenceSettings,
    output_dir: PathBuf,
    progress_callback: Option<ProgressCallback>,
}

impl BatchRunner {
    pub fn new(settings: InferenceSettings, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings,
            output_dir: output_dir.into(),
            progress_callback: None,
        }
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build the generation request for one combination.
    pub fn request_for(&self, combination: &Combination) -> GenerationRequest {
        let seed = self
            .settings
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(SEED_RANGE));

        GenerationRequest {
            video_path: combination.video().path.clone(),
            audio_path: combination.audio().path.clone(),
            output_path: combination.output_file(&self.output_dir),
            config_path: self.settings.config_path.clone(),
            checkpoint_path: self.settings.checkpoint_path.clone(),
            inference_steps: self.settings.inference_steps,
            guidance_scale: self.settings.guidance_scale,
            seed,
            enable_deepcache: self.settings.enable_deepcache,
        }
    }

    /// Run all combinations and return per-item results plus the summary.
    pub fn run<I, G>(&self, combinations: I, generator: &mut G, logger: &RunLogger) -> RunOutcome
    where
        I: IntoIterator<Item = Combination>,
        I::IntoIter: ExactSizeIterator,
        G: LipsyncGenerator + ?Sized,
    {
        let combinations = combinations.into_iter();
        let total = combinations.len();
        let started = Instant::now();

        let mut outcome = RunOutcome {
            results: Vec::with_capacity(total),
            summary: RunSummary::default(),
        };

        logger.phase(&format!(
            "Processing {} combinations with {}",
            total,
            generator.name()
        ));

        for combination in combinations {
            let result = self.run_one(&combination, total, generator, logger);

            outcome.summary.record(&result);
            let done = outcome.summary.attempted;

            self.log_progress(logger, done, total, &outcome.summary, started.elapsed());

            if let Some(ref callback) = self.progress_callback {
                callback(done, total, &result);
            }

            outcome.results.push(result);
        }

        outcome.summary.elapsed = started.elapsed();

        tracing::info!(
            "Batch finished: {} attempted, {} succeeded, {} failed",
            outcome.summary.attempted,
            outcome.summary.succeeded,
            outcome.summary.failed
        );

        outcome
    }

    fn run_one<G>(
        &self,
        combination: &Combination,
        total: usize,
        generator: &mut G,
        logger: &RunLogger,
    ) -> RunResult
    where
        G: LipsyncGenerator + ?Sized,
    {
        let request = self.request_for(combination);

        logger.item(combination.index(), total, &combination.label());
        logger.info(&format!(
            "  Output: {} (seed {})",
            request.output_path.display(),
            request.seed
        ));

        logger.clear_tail();
        let item_started = Instant::now();

        match generator.generate(&request, logger) {
            Ok(output_path) => {
                logger.success(&format!("Generated {}", combination.output_name()));
                RunResult::success(combination, output_path, item_started.elapsed())
            }
            Err(e) => {
                let message = e.to_string();
                logger.error(&format!("{}: {}", combination.label(), message));
                logger.show_tail(combination.output_name());
                tracing::debug!(
                    "Combination {} ({}) failed: {}",
                    combination.index(),
                    combination.label(),
                    message
                );
                RunResult::failure(combination, message, item_started.elapsed())
            }
        }
    }

    fn log_progress(
        &self,
        logger: &RunLogger,
        done: usize,
        total: usize,
        summary: &RunSummary,
        elapsed: Duration,
    ) {
        let percent = if total == 0 {
            100
        } else {
            (done * 100 / total) as u32
        };
        logger.progress(percent);

        let remaining = estimate_remaining(elapsed, done, total);
        logger.info(&format!(
            "Successful: {}, Failed: {} | Elapsed: {:.1} min | Remaining: ~{:.1} min",
            summary.succeeded,
            summary.failed,
            elapsed.as_secs_f64() / 60.0,
            remaining.as_secs_f64() / 60.0
        ));
    }
}

/// Estimated time left, from the average time per finished item.
fn estimate_remaining(elapsed: Duration, done: usize, total: usize) -> Duration {
    if done == 0 || done >= total {
        return Duration::ZERO;
    }
    let average = elapsed.as_secs_f64() / done as f64;
    Duration::from_secs_f64(average * (total - done) as f64)
}
