//! Parameters for a single generation call.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Everything the model needs to render one combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Video template.
    pub video_path: PathBuf,
    /// Driving audio.
    pub audio_path: PathBuf,
    /// Where the generated video should be written.
    pub output_path: PathBuf,
    /// UNet config file.
    pub config_path: PathBuf,
    /// Inference checkpoint.
    pub checkpoint_path: PathBuf,
    pub inference_steps: u32,
    pub guidance_scale: f64,
    /// Sampling seed for this item.
    pub seed: u64,
    pub enable_deepcache: bool,
}
