//! A single scheduled (video, audio) pairing.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::clock::TIMESTAMP_FORMAT;
use crate::media::{AudioAsset, VideoAsset};

/// Extension of generated videos.
const OUTPUT_EXTENSION: &str = "mp4";

/// One (video, audio) pairing scheduled for inference.
///
/// Immutable once created. The output name is derived from the asset base
/// names and the creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combination {
    index: usize,
    video: VideoAsset,
    audio: AudioAsset,
    timestamp: String,
    output_name: String,
}

impl Combination {
    /// Create a combination stamped with `created_at`.
    pub fn new(
        index: usize,
        video: VideoAsset,
        audio: AudioAsset,
        created_at: DateTime<Local>,
    ) -> Self {
        let timestamp = created_at.format(TIMESTAMP_FORMAT).to_string();
        let output_name = format!("{}_{}_{}", video.base_name, audio.base_name, timestamp);

        Self {
            index,
            video,
            audio,
            timestamp,
            output_name,
        }
    }

    /// 1-based position in the run.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn video(&self) -> &VideoAsset {
        &self.video
    }

    pub fn audio(&self) -> &AudioAsset {
        &self.audio
    }

    /// Creation timestamp as embedded in the output name.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// `{video_base}_{audio_base}_{timestamp}`.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Output file path under `output_dir`.
    pub fn output_file(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.{}", self.output_name, OUTPUT_EXTENSION))
    }

    /// Short label for log lines.
    pub fn label(&self) -> String {
        format!("{} + {}", self.video.file_name(), self.audio.file_name())
    }
}
