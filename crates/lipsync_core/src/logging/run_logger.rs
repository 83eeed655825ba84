//! Per-run log: `<logs_folder>/batch_<timestamp>.log` plus a console echo.
//!
//! Inference output is kept in a bounded tail buffer and only written out when
//! an item fails, so a long run stays readable.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

pub struct RunLogger {
    log_path: PathBuf,
    file: Mutex<Option<BufWriter<File>>>,
    echo: Option<LogCallback>,
    config: LogConfig,
    tail: Mutex<VecDeque<String>>,
    last_progress: Mutex<Option<u32>>,
}

impl RunLogger {
    /// Create `<log_dir>/<run_name>.log`, creating `log_dir` if needed.
    pub fn new(
        run_name: impl AsRef<str>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        echo: Option<LogCallback>,
    ) -> io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(run_name.as_ref())));
        let file = File::create(&log_path)?;

        Ok(Self {
            log_path,
            file: Mutex::new(Some(BufWriter::new(file))),
            echo,
            tail: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
            last_progress: Mutex::new(None),
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn info(&self, message: &str) {
        self.emit(LogLevel::Info, message);
    }

    /// `[FAILED] message`
    pub fn error(&self, message: &str) {
        self.emit(LogLevel::Error, &MessagePrefix::Failed.format(message));
    }

    /// The command about to run; visible at debug level only.
    pub fn command(&self, command: &str) {
        self.emit(LogLevel::Debug, &MessagePrefix::Command.format(command));
    }

    pub fn phase(&self, phase_name: &str) {
        self.emit(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    /// Header line of one combination: `[index/total] message`.
    pub fn item(&self, index: usize, total: usize, message: &str) {
        self.emit(
            LogLevel::Info,
            &MessagePrefix::Item { index, total }.format(message),
        );
    }

    pub fn success(&self, message: &str) {
        self.emit(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log the run's completion percentage. Returns whether a line was written.
    ///
    /// In compact mode a line is written only when `percent` reaches a new
    /// multiple of `progress_step`, and always at 100.
    pub fn progress(&self, percent: u32) -> bool {
        if self.config.compact {
            let mut last = self.last_progress.lock();
            let step = self.config.progress_step.max(1);
            let crossed = match *last {
                None => true,
                Some(previous) => percent / step > previous / step,
            };
            if !crossed && percent < 100 {
                return false;
            }
            *last = Some(percent);
        }

        self.emit(LogLevel::Info, &format!("Progress: {}%", percent));
        true
    }

    /// One line of inference process output.
    ///
    /// Always kept in the tail; echoed at debug level outside compact mode.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        if self.config.error_tail > 0 {
            let mut tail = self.tail.lock();
            if tail.len() == self.config.error_tail {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }

        if !self.config.compact {
            let stream = if is_stderr { "[stderr] " } else { "" };
            self.emit(LogLevel::Debug, &format!("{}{}", stream, line));
        }
    }

    /// Write the buffered output of the failed item under a `[header/tail]` line.
    pub fn show_tail(&self, header: &str) {
        let lines: Vec<String> = self.tail.lock().drain(..).collect();
        if lines.is_empty() {
            return;
        }

        self.write_line(&format!("[{}/tail]", header));
        for line in &lines {
            self.write_line(&format!("  {}", line));
        }
    }

    pub fn clear_tail(&self) {
        self.tail.lock().clear();
    }

    /// Flush and close the log file. Later lines only reach the echo.
    pub fn close(&self) {
        if let Some(mut writer) = self.file.lock().take() {
            let _ = writer.flush();
        }
    }

    fn emit(&self, level: LogLevel, message: &str) {
        if level >= self.config.level {
            self.write_line(message);
        }
    }

    fn write_line(&self, message: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        };

        if let Some(writer) = self.file.lock().as_mut() {
            let _ = writeln!(writer, "{}", line);
        }
        if let Some(ref echo) = self.echo {
            echo(&line);
        }
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn quiet_config() -> LogConfig {
        LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        }
    }

    /// Echo callback collecting every line.
    fn collector() -> (LogCallback, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let callback: LogCallback = Box::new(move |line: &str| sink.lock().push(line.to_string()));
        (callback, lines)
    }

    #[test]
    fn writes_prefixed_lines_to_file() {
        let dir = tempdir().unwrap();
        let logger = RunLogger::new("batch_1", dir.path(), quiet_config(), None).unwrap();
        assert!(logger.log_path().ends_with("batch_1.log"));

        logger.phase("Planning");
        logger.item(1, 2, "v1.mp4 + a.wav");
        logger.error("v1.mp4 + a.wav: exit code 1");
        logger.close();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("=== Planning ==="));
        assert!(content.contains("[1/2] v1.mp4 + a.wav"));
        assert!(content.contains("[FAILED] v1.mp4 + a.wav"));
    }

    #[test]
    fn echo_respects_level() {
        let dir = tempdir().unwrap();
        let (callback, lines) = collector();
        let logger = RunLogger::new("batch", dir.path(), quiet_config(), Some(callback)).unwrap();

        logger.info("Message 1");
        logger.command("python -m scripts.inference");
        logger.success("done");

        assert_eq!(*lines.lock(), vec!["Message 1", "[OK] done"]);
    }

    #[test]
    fn compact_mode_filters_progress() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            compact: true,
            progress_step: 20,
            ..quiet_config()
        };
        let logger = RunLogger::new("batch", dir.path(), config, None).unwrap();

        assert!(logger.progress(5));
        assert!(!logger.progress(10));
        assert!(!logger.progress(15));
        assert!(logger.progress(20));
        assert!(!logger.progress(25));
        assert!(logger.progress(40));
        assert!(logger.progress(100));
    }

    #[test]
    fn tail_keeps_last_lines_and_prints_once() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            error_tail: 3,
            ..quiet_config()
        };
        let (callback, lines) = collector();
        let logger = RunLogger::new("batch", dir.path(), config, Some(callback)).unwrap();

        for i in 0..6 {
            logger.output_line(&format!("Line {}", i), true);
        }
        // Compact mode: nothing echoed yet
        assert!(lines.lock().is_empty());

        logger.show_tail("v1_a");
        assert_eq!(
            *lines.lock(),
            vec!["[v1_a/tail]", "  Line 3", "  Line 4", "  Line 5"]
        );

        logger.show_tail("v1_a");
        assert_eq!(lines.lock().len(), 4);
    }

    #[test]
    fn cleared_tail_prints_nothing() {
        let dir = tempdir().unwrap();
        let (callback, lines) = collector();
        let logger = RunLogger::new("batch", dir.path(), quiet_config(), Some(callback)).unwrap();

        logger.output_line("previous item output", false);
        logger.clear_tail();
        logger.show_tail("v1_b");
        assert!(lines.lock().is_empty());
    }

    #[test]
    fn sanitizes_filename() {
        assert_eq!(sanitize_filename("normal_name"), "normal_name");
        assert_eq!(sanitize_filename("has/slash"), "has_slash");
        assert_eq!(sanitize_filename("a<b>c"), "a_b_c");
    }
}
