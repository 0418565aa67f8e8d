//! Logger configuration values

use super::error::{LoggerError, Result};
use super::format::FormatCache;
use super::level_gate::LevelGate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_DIRECTORY: &str = "logs";

/// 2 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Name of the active log file inside the log directory
pub const LOG_FILE_NAME: &str = "log.txt";

/// Where the file sink writes and when it rotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    pub directory: PathBuf,
    /// Rotation threshold in bytes; `0` disables rotation
    pub max_file_size: u64,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl FileSettings {
    pub fn new(directory: impl Into<PathBuf>, max_file_size: u64) -> Self {
        Self {
            directory: directory.into(),
            max_file_size,
        }
    }

    /// Path of the active log file: `<directory>/log.txt`
    pub fn log_path(&self) -> PathBuf {
        self.directory.join(LOG_FILE_NAME)
    }

    #[inline]
    pub fn rotation_enabled(&self) -> bool {
        self.max_file_size != 0
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Complete runtime configuration of a logger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerConfig {
    pub gate: LevelGate,
    pub file: FileSettings,
    pub format: FormatCache,
    /// Strip the directory part of source file names
    pub truncate_filenames: bool,
}

impl LoggerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.file.directory.as_os_str().is_empty() {
            return Err(LoggerError::config("FileSettings", "log directory must not be empty"));
        }
        Ok(())
    }
}
