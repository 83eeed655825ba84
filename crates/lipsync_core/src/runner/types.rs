//! Run driver data types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::config::Settings;
use crate::planner::Combination;

/// Progress callback invoked after every item.
///
/// Arguments: (items done, total items, result of the item just finished)
pub type ProgressCallback = Box<dyn Fn(usize, usize, &RunResult) + Send + Sync>;

/// Model parameters applied to every combination of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceSettings {
    pub config_path: PathBuf,
    pub checkpoint_path: PathBuf,
    pub inference_steps: u32,
    pub guidance_scale: f64,
    pub enable_deepcache: bool,
    /// Fixed sampling seed; a random one is drawn per item when unset.
    pub seed: Option<u64>,
}

impl InferenceSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            config_path: settings.model.config_path.clone(),
            checkpoint_path: settings.model.ckpt_path.clone(),
            inference_steps: settings.inference.inference_steps,
            guidance_scale: settings.inference.guidance_scale,
            enable_deepcache: settings.inference.enable_deepcache,
            seed: settings.batch.random_seed,
        }
    }
}

/// Outcome of one combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded { output_path: PathBuf },
    Failed { message: String },
}

/// Per-combination result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// 1-based position in the run.
    pub index: usize,
    pub video_name: String,
    pub audio_name: String,
    pub output_name: String,
    #[serde(flatten)]
    pub status: RunStatus,
    /// Wall time spent on this item.
    pub duration: Duration,
}

impl RunResult {
    pub fn success(combination: &Combination, output_path: PathBuf, duration: Duration) -> Self {
        Self::from_parts(combination, RunStatus::Succeeded { output_path }, duration)
    }

    pub fn failure(combination: &Combination, message: impl Into<String>, duration: Duration) -> Self {
        Self::from_parts(
            combination,
            RunStatus::Failed {
                message: message.into(),
            },
            duration,
        )
    }

    fn from_parts(combination: &Combination, status: RunStatus, duration: Duration) -> Self {
        Self {
            index: combination.index(),
            video_name: combination.video().file_name(),
            audio_name: combination.audio().file_name(),
            output_name: combination.output_name().to_string(),
            status,
            duration,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Succeeded { .. })
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        match &self.status {
            RunStatus::Succeeded { output_path } => Some(output_path),
            RunStatus::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            RunStatus::Succeeded { .. } => None,
            RunStatus::Failed { message } => Some(message),
        }
    }
}

/// Counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Record one finished item.
    pub fn record(&mut self, result: &RunResult) {
        self.attempted += 1;
        if result.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Percentage of attempted items that succeeded (0 when nothing ran).
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.attempted as f64 * 100.0
        }
    }

    pub fn average_per_item(&self) -> Option<Duration> {
        if self.attempted == 0 {
            None
        } else {
            Some(self.elapsed / self.attempted as u32)
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{}", rule)?;
        writeln!(f, "BATCH INFERENCE COMPLETED")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total combinations processed: {}", self.attempted)?;
        writeln!(f, "Successful: {}", self.succeeded)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Success rate: {:.1}%", self.success_rate())?;
        writeln!(f, "Total time: {:.1} minutes", self.elapsed.as_secs_f64() / 60.0)?;
        if let Some(average) = self.average_per_item() {
            writeln!(
                f,
                "Average time per combination: {:.1} seconds",
                average.as_secs_f64()
            )?;
        }
        write!(f, "{}", rule)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutcome {
    pub results: Vec<RunResult>,
    pub summary: RunSummary,
}

impl RunOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &RunResult> {
        self.results.iter().filter(|r| !r.is_success())
    }
}
