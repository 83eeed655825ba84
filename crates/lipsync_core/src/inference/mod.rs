//! Inference collaborator interface.
//!
//! The model itself lives outside this crate. The runner only needs one call:
//! turn a (video, audio) pair into an output file, or fail.

mod python;
mod request;

use std::path::PathBuf;

pub use python::PythonInference;
pub use request::GenerationRequest;

use crate::errors::InferenceError;
use crate::logging::RunLogger;

/// Something that can generate a lip-synced video for one pair.
///
/// Implementations may keep the model loaded between calls. Calls are never
/// made concurrently.
pub trait LipsyncGenerator {
    /// Short name for log lines.
    fn name(&self) -> &str;

    /// Generate `request.output_path` and return the path actually written.
    ///
    /// `logger` receives any process output for failure diagnosis.
    fn generate(
        &mut self,
        request: &GenerationRequest,
        logger: &RunLogger,
    ) -> Result<PathBuf, InferenceError>;
}
