//! Configuration management for batch runs.
//!
//! This module provides:
//! - TOML-based settings with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Defaults for every missing key
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use lipsync_core::config::load_settings;
//!
//! let settings = load_settings(Path::new(".config/lipsync.toml"), true).unwrap();
//! println!("Audio dir: {}", settings.paths.audio_dir.display());
//! ```

mod manager;
mod settings;

pub use manager::{load_settings, ConfigManager, SettingsError, SettingsResult};
pub use settings::{
    BatchSettings, ConfigSection, InferenceParams, LoggingSettings, ModelSettings, PathSettings,
    Settings, GUIDANCE_SCALE_RANGE, INFERENCE_STEPS_RANGE,
};
