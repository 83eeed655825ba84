//! Loading and writing the settings file.
//!
//! The file is always written whole, through a temp file that is renamed over
//! the target. Missing keys are filled with defaults on load.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::{ConfigSection, Settings};
use crate::errors::BatchResult;

/// Errors that can occur during settings file operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid setting {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("Settings file not found: {}", .0.display())]
    NotFound(PathBuf),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Owns the settings file path and the settings read from it.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Does not touch the file; call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Read the file without writing anything back.
    pub fn load(&mut self) -> SettingsResult<()> {
        if !self.config_path.exists() {
            return Err(SettingsError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        let (settings, _) = parse_and_check(&content)?;
        self.settings = settings;
        Ok(())
    }

    /// Read the file, writing a commented default file first if none exists.
    ///
    /// A file with missing keys is rewritten with the defaults filled in.
    pub fn load_or_create(&mut self) -> SettingsResult<()> {
        if !self.config_path.exists() {
            self.settings = Settings::default();
            self.save()?;
            tracing::info!("Created default settings at {}", self.config_path.display());
            return Ok(());
        }

        let content = fs::read_to_string(&self.config_path)?;
        let (settings, incomplete) = parse_and_check(&content)?;
        self.settings = settings;

        if incomplete {
            tracing::debug!(
                "Settings file {} was incomplete, rewriting with defaults",
                self.config_path.display()
            );
            self.save()?;
        }
        Ok(())
    }

    /// Write the current settings, with a comment above every table.
    pub fn save(&self) -> SettingsResult<()> {
        let mut output = String::from(
            "# Lipsync batch settings\n# Command-line flags override the values below.\n",
        );

        for section in ConfigSection::ALL {
            let body = match section {
                ConfigSection::Paths => toml::to_string_pretty(&self.settings.paths)?,
                ConfigSection::Model => toml::to_string_pretty(&self.settings.model)?,
                ConfigSection::Inference => toml::to_string_pretty(&self.settings.inference)?,
                ConfigSection::Batch => toml::to_string_pretty(&self.settings.batch)?,
                ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
            };
            output.push_str(&format!(
                "\n# {}\n[{}]\n{}",
                section.comment(),
                section.table_name(),
                body
            ));
        }

        self.atomic_write(&output)?;
        Ok(())
    }

    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Same directory so the rename stays on one filesystem
        let temp_path = self.config_path.with_extension("toml.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.config_path)
    }
}

/// Parse and validate; the flag is true when the file lacks keys that have defaults.
fn parse_and_check(content: &str) -> SettingsResult<(Settings, bool)> {
    let settings: Settings = toml::from_str(content)?;
    settings.validate()?;

    // Compare values, not text, so comments and layout don't count
    let on_disk: toml::Table = toml::from_str(content)?;
    let complete = toml::Value::try_from(&settings)?;
    let incomplete = complete != toml::Value::Table(on_disk);

    Ok((settings, incomplete))
}

/// Load the settings for one run.
///
/// With `create_missing` a default file is written when none exists. Without
/// it a missing file yields the defaults and nothing is written.
pub fn load_settings(path: &Path, create_missing: bool) -> BatchResult<Settings> {
    let mut manager = ConfigManager::new(path);

    if create_missing {
        manager.load_or_create()?;
    } else {
        match manager.load() {
            Ok(()) => {}
            Err(SettingsError::NotFound(_)) => {
                tracing::info!("No settings at {}, using defaults", path.display());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(manager.into_settings())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BatchError;
    use tempfile::tempdir;

    #[test]
    fn load_or_create_creates_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("lipsync.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[paths]"));
        assert!(content.contains("[model]"));
        assert!(content.contains("# Combination planning"));

        // Generated file parses back to the defaults
        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().inference.inference_steps, 20);
        assert!(!config_path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn load_or_create_fills_missing_sections() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lipsync.toml");
        fs::write(&config_path, "[inference]\nguidance_scale = 2.5\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().inference.guidance_scale, 2.5);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[batch]"));
        assert!(content.contains("guidance_scale = 2.5"));
    }

    #[test]
    fn complete_file_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lipsync.toml");

        ConfigManager::new(&config_path).load_or_create().unwrap();

        let mut content = fs::read_to_string(&config_path).unwrap();
        content.push_str("# local note\n");
        fs::write(&config_path, &content).unwrap();

        ConfigManager::new(&config_path).load_or_create().unwrap();
        assert!(fs::read_to_string(&config_path)
            .unwrap()
            .contains("# local note"));
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));
        assert!(matches!(manager.load(), Err(SettingsError::NotFound(_))));
    }

    #[test]
    fn zero_max_combinations_is_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lipsync.toml");
        fs::write(&config_path, "[batch]\nmax_combinations = 0\n").unwrap();

        let err = ConfigManager::new(&config_path).load().unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue {
                key: "batch.max_combinations",
                ..
            }
        ));

        let err = load_settings(&config_path, true).unwrap_err();
        assert!(matches!(err, BatchError::Settings(SettingsError::InvalidValue { .. })));
    }

    #[test]
    fn load_settings_without_create_writes_nothing() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("lipsync.toml");

        let settings = load_settings(&config_path, false).unwrap();
        assert_eq!(settings.inference.inference_steps, 20);
        assert!(!config_path.exists());
        assert!(!config_path.parent().unwrap().exists());

        load_settings(&config_path, true).unwrap();
        assert!(config_path.exists());
    }

    #[test]
    fn load_settings_reports_parse_errors_as_batch_errors() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("lipsync.toml");
        fs::write(&config_path, "[inference\n").unwrap();

        let err = load_settings(&config_path, false).unwrap_err();
        assert!(matches!(err, BatchError::Settings(SettingsError::ParseError(_))));
    }
}
