//! Logging types and configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::LoggingSettings;

/// Severity of a log line; also the default `tracing` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

/// How the run log behaves.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Keep inference output in the tail buffer only, and thin out progress lines.
    pub compact: bool,
    /// In compact mode, log progress only when it crosses a multiple of this.
    pub progress_step: u32,
    /// Inference output lines kept for the failure report.
    pub error_tail: usize,
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig::from(&LoggingSettings::default())
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level,
            compact: settings.compact,
            progress_step: settings.progress_step.max(1),
            error_tail: settings.error_tail,
            show_timestamps: true,
        }
    }
}

/// Receives every line written to the run log (console echo, tests).
pub type LogCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Markers put in front of run log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MessagePrefix {
    /// `$ python -m ...`
    Command,
    /// `=== Planning ===`
    Phase,
    /// `[3/10] host.mp4 + line.wav`
    Item { index: usize, total: usize },
    /// `[OK] ...`
    Success,
    /// `[FAILED] ...`
    Failed,
}

impl MessagePrefix {
    pub(crate) fn format(&self, message: &str) -> String {
        match self {
            MessagePrefix::Command => format!("$ {}", message),
            MessagePrefix::Phase => format!("=== {} ===", message),
            MessagePrefix::Item { index, total } => format!("[{}/{}] {}", index, total, message),
            MessagePrefix::Success => format!("[OK] {}", message),
            MessagePrefix::Failed => format!("[FAILED] {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_format() {
        assert_eq!(MessagePrefix::Phase.format("Plan"), "=== Plan ===");
        assert_eq!(
            MessagePrefix::Item { index: 3, total: 10 }.format("a.wav"),
            "[3/10] a.wav"
        );
        assert_eq!(MessagePrefix::Failed.format("boom"), "[FAILED] boom");
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn config_from_settings_clamps_step() {
        let mut settings = LoggingSettings::default();
        settings.progress_step = 0;
        let config = LogConfig::from(&settings);
        assert_eq!(config.progress_step, 1);
        assert_eq!(LogConfig::default().error_tail, 20);
    }
}
