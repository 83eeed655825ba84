//! Run driver for batch inference.
//!
//! Consumes a plan one combination at a time, calls the generator, and keeps
//! going when an item fails. Processing is strictly sequential: the model is a
//! single shared GPU resource.

mod batch;
mod types;

pub use batch::{preflight, prepare_output_dir, BatchRunner};
pub use types::{InferenceSettings, ProgressCallback, RunOutcome, RunResult, RunStatus, RunSummary};
