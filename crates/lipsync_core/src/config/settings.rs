//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Every field has a default, so a partial file is always usable.

use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::manager::{SettingsError, SettingsResult};
use crate::logging::LogLevel;
use crate::planner::PlanOptions;

/// Range of inference steps the model is tuned for.
pub const INFERENCE_STEPS_RANGE: RangeInclusive<u32> = 20..=50;

/// Range of guidance scales the model is tuned for.
pub const GUIDANCE_SCALE_RANGE: RangeInclusive<f64> = 1.0..=3.0;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Input, output and log directories.
    #[serde(default)]
    pub paths: PathSettings,

    /// Model files and the inference entry point.
    #[serde(default)]
    pub model: ModelSettings,

    /// Sampling parameters passed through to the model.
    #[serde(default)]
    pub inference: InferenceParams,

    /// Combination planning.
    #[serde(default)]
    pub batch: BatchSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Planner options derived from the `[batch]` section.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            seed: self.batch.random_seed,
            max_combinations: self.batch.max_combinations,
            allow_repeat_videos: self.batch.allow_repeat_videos,
            audio_extension: self.batch.audio_extension.clone(),
            video_extension: self.batch.video_extension.clone(),
        }
    }

    /// Reject values no run can use.
    ///
    /// `max_combinations = 0` would plan nothing; the CLI refuses it too.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.batch.max_combinations == Some(0) {
            return Err(SettingsError::InvalidValue {
                key: "batch.max_combinations",
                message: "must be at least 1 (omit it to process every audio file)".to_string(),
            });
        }
        Ok(())
    }

    /// Human-readable notes for values outside the model's expected ranges.
    ///
    /// These are advisory; the run proceeds with the given values.
    pub fn range_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !INFERENCE_STEPS_RANGE.contains(&self.inference.inference_steps) {
            warnings.push(format!(
                "inference_steps = {} is outside the expected range {}-{}",
                self.inference.inference_steps,
                INFERENCE_STEPS_RANGE.start(),
                INFERENCE_STEPS_RANGE.end()
            ));
        }

        if !GUIDANCE_SCALE_RANGE.contains(&self.inference.guidance_scale) {
            warnings.push(format!(
                "guidance_scale = {} is outside the expected range {:.1}-{:.1}",
                self.inference.guidance_scale,
                GUIDANCE_SCALE_RANGE.start(),
                GUIDANCE_SCALE_RANGE.end()
            ));
        }

        warnings
    }
}

/// Directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory containing video templates.
    #[serde(default = "default_video_dir")]
    pub video_dir: PathBuf,

    /// Directory containing audio clips.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// Output directory for generated videos.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: PathBuf,
}

fn default_video_dir() -> PathBuf {
    PathBuf::from("data/Video")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("data/Audio/spk_ganyu")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output/lipsync")
}

fn default_logs_folder() -> PathBuf {
    PathBuf::from(".logs")
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            video_dir: default_video_dir(),
            audio_dir: default_audio_dir(),
            output_dir: default_output_dir(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Model files and how to invoke the inference entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// UNet config file.
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,

    /// Inference checkpoint.
    #[serde(default = "default_ckpt_path")]
    pub ckpt_path: PathBuf,

    /// Python interpreter used to run the model.
    #[serde(default = "default_python")]
    pub python: String,

    /// Module run with `python -m`.
    #[serde(default = "default_module")]
    pub module: String,

    /// Working directory for the inference process (model repo root).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

fn default_config_path() -> PathBuf {
    PathBuf::from("configs/unet/stage2_512.yaml")
}

fn default_ckpt_path() -> PathBuf {
    PathBuf::from("checkpoints/latentsync_unet.pt")
}

fn default_python() -> String {
    "python".to_string()
}

fn default_module() -> String {
    "scripts.inference".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            ckpt_path: default_ckpt_path(),
            python: default_python(),
            module: default_module(),
            working_dir: None,
        }
    }
}

/// Sampling parameters, passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceParams {
    /// Number of diffusion steps.
    #[serde(default = "default_inference_steps")]
    pub inference_steps: u32,

    /// Classifier-free guidance scale.
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f64,

    /// Enable DeepCache acceleration.
    #[serde(default = "default_true")]
    pub enable_deepcache: bool,
}

fn default_true() -> bool {
    true
}

fn default_inference_steps() -> u32 {
    20
}

fn default_guidance_scale() -> f64 {
    1.5
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            inference_steps: default_inference_steps(),
            guidance_scale: default_guidance_scale(),
            enable_deepcache: true,
        }
    }
}

/// Combination planning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Keep only the first N combinations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_combinations: Option<usize>,

    /// Seed for video selection and per-item inference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,

    /// Draw videos with replacement instead of cycling through them.
    #[serde(default)]
    pub allow_repeat_videos: bool,

    /// Audio file extension.
    #[serde(default = "default_audio_extension")]
    pub audio_extension: String,

    /// Video file extension.
    #[serde(default = "default_video_extension")]
    pub video_extension: String,
}

fn default_audio_extension() -> String {
    "wav".to_string()
}

fn default_video_extension() -> String {
    "mp4".to_string()
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_combinations: None,
            random_seed: None,
            allow_repeat_videos: false,
            audio_extension: default_audio_extension(),
            video_extension: default_video_extension(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is unset.
    #[serde(default)]
    pub level: LogLevel,

    /// Hide inference process output unless an item fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of output lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: usize,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,
}

fn default_error_tail() -> usize {
    20
}

fn default_progress_step() -> u32 {
    10
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
        }
    }
}

/// Tables of the settings file, in the order they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Model,
    Inference,
    Batch,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Model,
        ConfigSection::Inference,
        ConfigSection::Batch,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Model => "model",
            ConfigSection::Inference => "inference",
            ConfigSection::Batch => "batch",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the section in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Input, output and log directories",
            ConfigSection::Model => "Model files and inference entry point",
            ConfigSection::Inference => "Sampling parameters passed to the model",
            ConfigSection::Batch => "Combination planning",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[inference]"));
        assert!(toml.contains("video_dir"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[paths]\noutput_dir = \"renders\"\n\n[batch]\nrandom_seed = 7\n";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.paths.output_dir, PathBuf::from("renders"));
        assert_eq!(parsed.batch.random_seed, Some(7));
        assert_eq!(parsed.paths.video_dir, PathBuf::from("data/Video"));
        assert_eq!(parsed.inference.inference_steps, 20);
        assert!(parsed.inference.enable_deepcache);
        assert!(!parsed.batch.allow_repeat_videos);
    }

    #[test]
    fn plan_options_mirror_batch_section() {
        let mut settings = Settings::default();
        settings.batch.random_seed = Some(3);
        settings.batch.max_combinations = Some(8);
        settings.batch.allow_repeat_videos = true;

        let options = settings.plan_options();
        assert_eq!(options.seed, Some(3));
        assert_eq!(options.max_combinations, Some(8));
        assert!(options.allow_repeat_videos);
        assert_eq!(options.audio_extension, "wav");
    }

    #[test]
    fn validate_rejects_zero_max_combinations() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.batch.max_combinations = Some(0);
        assert!(settings.validate().is_err());

        settings.batch.max_combinations = Some(1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn range_warnings_flag_out_of_range_values() {
        let mut settings = Settings::default();
        assert!(settings.range_warnings().is_empty());

        settings.inference.inference_steps = 80;
        settings.inference.guidance_scale = 0.5;
        let warnings = settings.range_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("inference_steps"));
        assert!(warnings[1].contains("guidance_scale"));
    }
}
