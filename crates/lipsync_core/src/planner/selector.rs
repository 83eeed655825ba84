//! Video selection policies.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a video template is chosen for each audio clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Shuffle the videos once, then walk that order round-robin.
    ///
    /// Every video is used once before any video is used again; later
    /// cycles repeat the same order.
    Cycle,
    /// Draw uniformly with replacement for every clip.
    Random,
}

impl SelectionPolicy {
    pub fn from_allow_repeats(allow_repeat_videos: bool) -> Self {
        if allow_repeat_videos {
            SelectionPolicy::Random
        } else {
            SelectionPolicy::Cycle
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SelectionPolicy::Cycle => "shuffle once, then cycle through every video",
            SelectionPolicy::Random => "random video per audio file (repeats allowed)",
        }
    }
}

/// Selection state for one plan.
#[derive(Debug)]
pub(crate) enum VideoSelector {
    Random { video_count: usize },
    Cycle { order: Vec<usize>, cursor: usize },
}

impl VideoSelector {
    /// Build the selector. The cycle order is drawn here, before any pick.
    pub(crate) fn new(policy: SelectionPolicy, video_count: usize, rng: &mut StdRng) -> Self {
        debug_assert!(video_count > 0);
        match policy {
            SelectionPolicy::Random => VideoSelector::Random { video_count },
            SelectionPolicy::Cycle => {
                let mut order: Vec<usize> = (0..video_count).collect();
                order.shuffle(rng);
                VideoSelector::Cycle { order, cursor: 0 }
            }
        }
    }

    /// True when the next pick goes back to the start of the cycle order.
    pub(crate) fn wraps_next(&self) -> bool {
        match self {
            VideoSelector::Random { .. } => false,
            VideoSelector::Cycle { order, cursor } => *cursor > 0 && *cursor % order.len() == 0,
        }
    }

    /// Index of the video for the next audio clip.
    pub(crate) fn next_index(&mut self, rng: &mut StdRng) -> usize {
        match self {
            VideoSelector::Random { video_count } => rng.gen_range(0..*video_count),
            VideoSelector::Cycle { order, cursor } => {
                let index = order[*cursor % order.len()];
                *cursor += 1;
                index
            }
        }
    }
}
