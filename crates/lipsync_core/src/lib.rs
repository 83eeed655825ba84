//! Lipsync Core - batch orchestration for lip-sync video generation
//!
//! This crate pairs audio clips with video templates and drives an external
//! inference routine for every pair. It has no CLI dependencies and can be
//! embedded in other front ends.
//!
//! The flow is split in two halves:
//! - [`planner`] turns two directories into a lazy sequence of
//!   [`Combination`]s without side effects beyond reading directory entries.
//! - [`runner`] consumes that sequence, calls a [`LipsyncGenerator`] per item
//!   and aggregates a [`RunSummary`].

pub mod config;
pub mod errors;
pub mod inference;
pub mod logging;
pub mod media;
pub mod planner;
pub mod runner;

pub use errors::{BatchError, BatchResult, InferenceError};
pub use inference::{GenerationRequest, LipsyncGenerator, PythonInference};
pub use media::{AudioAsset, MediaKind, VideoAsset};
pub use planner::{
    Clock, Combination, CombinationPlanner, Combinations, PlanOptions, SelectionPolicy,
    SystemClock,
};
pub use runner::{BatchRunner, InferenceSettings, RunOutcome, RunResult, RunStatus, RunSummary};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
