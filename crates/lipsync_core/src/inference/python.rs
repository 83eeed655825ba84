//! Subprocess wrapper around the model's Python inference entry point.
//!
//! Runs `python -m scripts.inference ...` once per combination and maps the
//! process result onto [`InferenceError`].

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use super::request::GenerationRequest;
use super::LipsyncGenerator;
use crate::config::ModelSettings;
use crate::errors::InferenceError;
use crate::logging::RunLogger;

/// Generator that shells out to the Python inference module.
#[derive(Debug, Clone)]
pub struct PythonInference {
    python: String,
    module: String,
    working_dir: Option<PathBuf>,
}

impl PythonInference {
    pub fn new(python: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            module: module.into(),
            working_dir: None,
        }
    }

    /// Build from the `[model]` settings section.
    pub fn from_settings(model: &ModelSettings) -> Self {
        Self {
            python: model.python.clone(),
            module: model.module.clone(),
            working_dir: model.working_dir.clone(),
        }
    }

    /// Arguments passed after the interpreter.
    pub fn args(&self, request: &GenerationRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-m".into(),
            self.module.clone().into(),
            "--unet_config_path".into(),
            request.config_path.clone().into(),
            "--inference_ckpt_path".into(),
            request.checkpoint_path.clone().into(),
            "--video_path".into(),
            request.video_path.clone().into(),
            "--audio_path".into(),
            request.audio_path.clone().into(),
            "--video_out_path".into(),
            request.output_path.clone().into(),
            "--inference_steps".into(),
            request.inference_steps.to_string().into(),
            "--guidance_scale".into(),
            request.guidance_scale.to_string().into(),
            "--seed".into(),
            request.seed.to_string().into(),
        ];

        if request.enable_deepcache {
            args.push("--enable_deepcache".into());
        }

        args
    }

    /// Render the full command for logs and dry runs.
    pub fn command_line(&self, request: &GenerationRequest) -> String {
        let mut parts = vec![self.python.clone()];
        parts.extend(
            self.args(request)
                .iter()
                .map(|a| a.to_string_lossy().to_string()),
        );
        parts.join(" ")
    }

    fn feed_output(logger: &RunLogger, bytes: &[u8], is_stderr: bool) {
        for line in String::from_utf8_lossy(bytes).lines() {
            if !line.trim().is_empty() {
                logger.output_line(line, is_stderr);
            }
        }
    }
}

/// Last non-empty line of stderr, which is where Python puts the exception.
fn last_error_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "no error output".to_string())
}

/// Map an unsuccessful exit status; a process killed by a signal has no code.
fn exit_error(tool: String, status: ExitStatus, stderr: &[u8]) -> InferenceError {
    match status.code() {
        Some(code) => InferenceError::command_failed(tool, code, last_error_line(stderr)),
        None => InferenceError::other(format!("{} was terminated by a signal", tool)),
    }
}

impl LipsyncGenerator for PythonInference {
    fn name(&self) -> &str {
        &self.python
    }

    fn generate(
        &mut self,
        request: &GenerationRequest,
        logger: &RunLogger,
    ) -> Result<PathBuf, InferenceError> {
        let mut cmd = Command::new(&self.python);
        cmd.args(self.args(request));

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        logger.command(&self.command_line(request));
        tracing::debug!("Running: {}", self.command_line(request));

        let output = cmd.output().map_err(|e| InferenceError::Spawn {
            program: self.python.clone(),
            source: e,
        })?;

        Self::feed_output(logger, &output.stdout, false);
        Self::feed_output(logger, &output.stderr, true);

        if !output.status.success() {
            return Err(exit_error(
                format!("{} -m {}", self.python, self.module),
                output.status,
                &output.stderr,
            ));
        }

        let written = resolve_output(&request.output_path, self.working_dir.as_deref());
        if !written.exists() {
            return Err(InferenceError::MissingOutput { path: written });
        }

        Ok(written)
    }
}

/// Relative output paths are resolved against the process working directory.
fn resolve_output(output_path: &Path, working_dir: Option<&Path>) -> PathBuf {
    match working_dir {
        Some(dir) if output_path.is_relative() => dir.join(output_path),
        _ => output_path.to_path_buf(),
    }
}
