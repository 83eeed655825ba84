//! Audio and video asset types.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of media file taking part in a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Default file extension for this kind (without the dot).
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Audio => "wav",
            MediaKind::Video => "mp4",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// Derive the base name used in output file names.
pub(super) fn base_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unnamed".to_string())
}

/// Extension of the file, lowercased, without the dot.
fn format_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// An audio clip that drives one generated video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAsset {
    /// Full path to the audio file.
    pub path: PathBuf,
    /// File stem, used in output names.
    pub base_name: String,
    /// Container format (file extension).
    pub format: String,
}

impl AudioAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            base_name: base_name_of(&path),
            format: format_of(&path),
            path,
        }
    }

    /// File name for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.base_name.clone())
    }
}

/// A video template the model animates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoAsset {
    /// Full path to the video file.
    pub path: PathBuf,
    /// File stem, used in output names.
    pub base_name: String,
    /// Container format (file extension).
    pub format: String,
}

impl VideoAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            base_name: base_name_of(&path),
            format: format_of(&path),
            path,
        }
    }

    /// File name for display.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.base_name.clone())
    }
}
