//! Media assets and directory enumeration.
//!
//! This module provides:
//! - `AudioAsset` / `VideoAsset`: files identified by path, named by stem
//! - `MediaKind`: which side of a combination an asset belongs to
//! - `scan_audio` / `scan_video`: sorted, extension-filtered directory listings

mod assets;
mod scan;

pub use assets::{AudioAsset, MediaKind, VideoAsset};
pub use scan::{scan_audio, scan_video};
