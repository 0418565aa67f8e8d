//! Process-wide current logger
//!
//! Passing a `Logger` explicitly is preferred. Where a global is unavoidable,
//! this slot provides one with an explicit lifecycle: nothing is installed
//! until [`init`] and [`shutdown`] removes it again.

use crate::core::{Logger, LoggerError, Result, DEFAULT_SHUTDOWN_TIMEOUT};
use parking_lot::RwLock;
use std::sync::Arc;

static CURRENT: RwLock<Option<Arc<Logger>>> = parking_lot::const_rwlock(None);

/// Install `logger` as the current logger; returns the one it replaces.
pub fn init(logger: Arc<Logger>) -> Option<Arc<Logger>> {
    CURRENT.write().replace(logger)
}

/// Current logger, or `None` with a diagnostic on standard error.
///
/// # Example
///
/// ```
/// use pipeline_logger::prelude::*;
/// use pipeline_logger::current;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .min_terminal_level(LogLevel::None)
///     .min_file_level(LogLevel::None)
///     .build()
///     .unwrap();
/// current::init(Arc::new(logger));
///
/// if let Some(logger) = current::get() {
///     logger.info("through the current logger");
/// }
/// current::shutdown();
/// ```
pub fn get() -> Option<Arc<Logger>> {
    let logger = CURRENT.read().clone();
    if logger.is_none() {
        eprintln!("[LOGGER ERROR] {}.", LoggerError::NoActiveLogger);
    }
    logger
}

/// Current logger, or [`LoggerError::NoActiveLogger`].
pub fn try_get() -> Result<Arc<Logger>> {
    CURRENT.read().clone().ok_or(LoggerError::NoActiveLogger)
}

pub fn is_initialized() -> bool {
    CURRENT.read().is_some()
}

/// Remove the current logger and drain its queue.
///
/// Returns `false` if no logger was installed or the drain timed out. Other
/// holders of the `Arc` keep a logger that no longer accepts messages.
pub fn shutdown() -> bool {
    let Some(logger) = CURRENT.write().take() else {
        return false;
    };
    logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT)
}
