//! Size-rotated log file appender
//!
//! The active file is always `<directory>/log.txt`. When it has grown past the
//! configured size, the next open renames it to `log.txt_N`, where `N` is the
//! smallest positive number not yet taken, and writing continues in a fresh
//! `log.txt`.

use crate::core::config::FileSettings;
use crate::core::error::{LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Highest suffix probed when looking for a free rotation name
pub const MAX_ROTATION_SUFFIX: u32 = 1024;

/// What happened to the active file when it was opened.
#[derive(Debug)]
pub enum RotationOutcome {
    /// File was below the threshold, absent, or rotation is disabled
    NotNeeded,
    /// Oversized file was renamed to the contained path
    Rotated(PathBuf),
    /// Rotation was needed but failed; writing continues in the oversized file
    Failed(LoggerError),
}

/// File sink with size-based rotation.
///
/// The file is only held open between [`open`](Self::open) and
/// [`close`](Self::close); the sync pipeline opens it per message, the async
/// worker per drained batch.
///
/// # Examples
///
/// ```no_run
/// use pipeline_logger::appenders::RotatingFileAppender;
/// use pipeline_logger::FileSettings;
///
/// let mut appender = RotatingFileAppender::new(FileSettings::new("logs", 2 * 1024 * 1024));
/// appender.append("first line").unwrap();
/// assert!(appender.path().ends_with("log.txt"));
/// ```
pub struct RotatingFileAppender {
    settings: FileSettings,
    max_suffix: u32,
    writer: Option<BufWriter<File>>,
}

impl RotatingFileAppender {
    pub fn new(settings: FileSettings) -> Self {
        Self {
            settings,
            max_suffix: MAX_ROTATION_SUFFIX,
            writer: None,
        }
    }

    /// Lower the rotation suffix bound (mostly useful for tests).
    #[must_use]
    pub fn with_max_rotation_suffix(mut self, max_suffix: u32) -> Self {
        self.max_suffix = max_suffix;
        self
    }

    pub fn settings(&self) -> &FileSettings {
        &self.settings
    }

    /// Replace directory and size limit; an open file is closed first.
    pub fn set_settings(&mut self, settings: FileSettings) -> Result<()> {
        let closed = self.close();
        self.settings = settings;
        closed
    }

    /// Path of the active log file
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.settings.log_path()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Rename the active file aside if it exceeds the size limit.
    ///
    /// Returns the new name of the rotated file, or `None` when no rotation
    /// was needed.
    pub fn rotate_if_needed(&self) -> Result<Option<PathBuf>> {
        if !self.settings.rotation_enabled() {
            return Ok(None);
        }

        let path = self.path();
        let size = match fs::metadata(&path) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LoggerError::io_operation(
                    "checking log file size",
                    format!("Cannot stat '{}'", path.display()),
                    e,
                ))
            }
        };

        if size <= self.settings.max_file_size {
            return Ok(None);
        }

        let target = self.free_rotation_path(&path)?;
        fs::rename(&path, &target).map_err(|e| {
            LoggerError::file_rotation(
                path.display().to_string(),
                format!("Failed to rename to '{}': {}", target.display(), e),
            )
        })?;

        Ok(Some(target))
    }

    /// Smallest `<path>_N` (1 ≤ N ≤ max suffix) that does not exist yet.
    fn free_rotation_path(&self, path: &Path) -> Result<PathBuf> {
        for suffix in 1..=self.max_suffix {
            let mut candidate = path.as_os_str().to_owned();
            candidate.push(format!("_{}", suffix));
            let candidate = PathBuf::from(candidate);
            if !candidate.exists() {
                return Ok(candidate);
            }
        }

        Err(LoggerError::rotation_exhausted(
            path.display().to_string(),
            self.max_suffix,
        ))
    }

    /// Rotate if needed, then open the active file for appending.
    ///
    /// A rotation failure is not an error: the outcome reports it and the
    /// oversized file is opened instead. Opening an already open appender
    /// does nothing.
    pub fn open(&mut self) -> Result<RotationOutcome> {
        if self.writer.is_some() {
            return Ok(RotationOutcome::NotNeeded);
        }

        let outcome = match self.rotate_if_needed() {
            Ok(Some(rotated)) => RotationOutcome::Rotated(rotated),
            Ok(None) => RotationOutcome::NotNeeded,
            Err(e) => RotationOutcome::Failed(e),
        };

        let directory = self.settings.directory();
        fs::create_dir_all(directory).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", directory.display()),
                e,
            )
        })?;

        let path = self.path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation(
                    "opening log file",
                    format!("Failed to open '{}'", path.display()),
                    e,
                )
            })?;

        self.writer = Some(BufWriter::new(file));
        Ok(outcome)
    }

    /// Write `line` plus a newline into the open file.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::other("log file is not open"))?;

        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Flush and release the file handle.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::io_operation(
                    "flushing log file",
                    format!("Failed to flush '{}'", self.settings.log_path().display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Open, write one line and close.
    pub fn append(&mut self, line: &str) -> Result<RotationOutcome> {
        let outcome = self.open()?;
        let written = self.write_line(line);
        let closed = self.close();
        written?;
        closed?;
        Ok(outcome)
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        // Best effort flush - ignore errors during drop
        let _ = self.close();
    }
}
