//! Combination planner and the lazy plan it produces.

use std::fmt;
use std::iter::FusedIterator;
use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::clock::{Clock, SystemClock};
use super::combination::Combination;
use super::selector::{SelectionPolicy, VideoSelector};
use crate::errors::{BatchError, BatchResult};
use crate::media::{scan_audio, scan_video, AudioAsset, MediaKind, VideoAsset};

/// Options controlling how combinations are planned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOptions {
    /// Seed for the selection generator. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Keep only the first N combinations.
    pub max_combinations: Option<usize>,
    /// Draw videos with replacement instead of cycling.
    pub allow_repeat_videos: bool,
    /// Audio file extension (without the dot).
    pub audio_extension: String,
    /// Video file extension (without the dot).
    pub video_extension: String,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            seed: None,
            max_combinations: None,
            allow_repeat_videos: false,
            audio_extension: MediaKind::Audio.default_extension().to_string(),
            video_extension: MediaKind::Video.default_extension().to_string(),
        }
    }
}

impl PlanOptions {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_combinations(mut self, max: usize) -> Self {
        self.max_combinations = Some(max);
        self
    }

    pub fn with_repeat_videos(mut self, allow: bool) -> Self {
        self.allow_repeat_videos = allow;
        self
    }

    /// Policy implied by `allow_repeat_videos`.
    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy::from_allow_repeats(self.allow_repeat_videos)
    }

    fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Builds plans from input directories or asset lists.
pub struct CombinationPlanner {
    options: PlanOptions,
    clock: Arc<dyn Clock>,
}

impl CombinationPlanner {
    pub fn new(options: PlanOptions) -> Self {
        Self {
            options,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp combinations.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Enumerate both directories and plan over the results.
    ///
    /// The audio directory is read first; if it holds no audio the video
    /// directory is never touched.
    pub fn plan_dirs(&self, audio_dir: &Path, video_dir: &Path) -> BatchResult<Combinations> {
        let audio = scan_audio(audio_dir, &self.options.audio_extension)?;
        let videos = scan_video(video_dir, &self.options.video_extension)?;

        tracing::info!(
            "Found {} audio files in {}, {} video files in {}",
            audio.len(),
            audio_dir.display(),
            videos.len(),
            video_dir.display()
        );

        self.plan(audio, videos)
    }

    /// Plan over already enumerated assets, in the order given.
    pub fn plan(
        &self,
        mut audio: Vec<AudioAsset>,
        videos: Vec<VideoAsset>,
    ) -> BatchResult<Combinations> {
        if audio.is_empty() {
            return Err(BatchError::empty_assets(
                MediaKind::Audio,
                &self.options.audio_extension,
            ));
        }
        if videos.is_empty() {
            return Err(BatchError::empty_assets(
                MediaKind::Video,
                &self.options.video_extension,
            ));
        }

        if let Some(max) = self.options.max_combinations {
            audio.truncate(max);
        }

        let policy = self.options.selection_policy();
        let mut rng = self.options.make_rng();
        let selector = VideoSelector::new(policy, videos.len(), &mut rng);

        tracing::debug!(
            "Planning {} combinations over {} videos ({})",
            audio.len(),
            videos.len(),
            policy.describe()
        );

        Ok(Combinations {
            total: audio.len(),
            emitted: 0,
            audio: audio.into_iter(),
            videos,
            selector,
            rng,
            clock: Arc::clone(&self.clock),
            policy,
        })
    }
}

/// Lazy, finite, non-restartable sequence of combinations.
///
/// Each combination is stamped with the clock at the moment it is pulled.
pub struct Combinations {
    total: usize,
    emitted: usize,
    audio: std::vec::IntoIter<AudioAsset>,
    videos: Vec<VideoAsset>,
    selector: VideoSelector,
    rng: StdRng,
    clock: Arc<dyn Clock>,
    policy: SelectionPolicy,
}

impl Combinations {
    /// Number of combinations the plan yields in total.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of combinations already yielded.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Video templates available to this plan.
    pub fn videos(&self) -> &[VideoAsset] {
        &self.videos
    }
}

impl Iterator for Combinations {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        let audio = self.audio.next()?;
        if self.selector.wraps_next() {
            tracing::info!(
                "All {} videos have been used, reusing them in the same order",
                self.videos.len()
            );
            tracing::debug!(
                "Video cycle: {}",
                self.videos
                    .iter()
                    .map(|v| v.file_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        let video_index = self.selector.next_index(&mut self.rng);
        self.emitted += 1;

        Some(Combination::new(
            self.emitted,
            self.videos[video_index].clone(),
            audio,
            self.clock.now(),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.emitted;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Combinations {}

impl FusedIterator for Combinations {}

impl fmt::Debug for Combinations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combinations")
            .field("total", &self.total)
            .field("emitted", &self.emitted)
            .field("videos", &self.videos.len())
            .field("policy", &self.policy)
            .finish()
    }
}
