//! Directory enumeration for audio and video inputs.
//!
//! Listings are filtered by extension and sorted by file name so that a seeded
//! plan does not depend on filesystem iteration order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::assets::{base_name_of, AudioAsset, MediaKind, VideoAsset};
use crate::errors::{BatchError, BatchResult};

/// Normalize a configured extension: strip a leading dot.
fn normalize_extension(extension: &str) -> &str {
    extension.trim_start_matches('.')
}

/// List regular files in `dir` whose extension matches, sorted by file name.
fn list_matching(kind: MediaKind, dir: &Path, extension: &str) -> BatchResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BatchError::directory_not_found(kind, dir));
    }

    let extension = normalize_extension(extension);
    let read_err = |e| BatchError::io(format!("reading {} directory", kind), e);

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(extension))
            .unwrap_or(false);

        if matches {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    if files.is_empty() {
        return Err(BatchError::no_input(kind, extension, dir));
    }

    check_unique_base_names(kind, &files)?;

    tracing::debug!(
        "Found {} {} files in {}",
        files.len(),
        kind,
        dir.display()
    );

    Ok(files)
}

/// Output names are built from base names, so `a.wav` and `a.WAV` can't both be used.
fn check_unique_base_names(kind: MediaKind, files: &[PathBuf]) -> BatchResult<()> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::with_capacity(files.len());
    for path in files {
        let base_name = base_name_of(path);
        if let Some(first) = seen.insert(base_name.clone(), path) {
            return Err(BatchError::duplicate_base_name(kind, base_name, first, path));
        }
    }
    Ok(())
}

/// Enumerate audio assets in `dir`.
///
/// Fails with `NoInput` when nothing matches and `DirectoryNotFound` when
/// `dir` is missing.
pub fn scan_audio(dir: &Path, extension: &str) -> BatchResult<Vec<AudioAsset>> {
    let files = list_matching(MediaKind::Audio, dir, extension)?;
    Ok(files.into_iter().map(AudioAsset::new).collect())
}

/// Enumerate video assets in `dir`.
pub fn scan_video(dir: &Path, extension: &str) -> BatchResult<Vec<VideoAsset>> {
    let files = list_matching(MediaKind::Video, dir, extension)?;
    Ok(files.into_iter().map(VideoAsset::new).collect())
}
