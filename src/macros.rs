//! Logging macros for ergonomic log message formatting.
//!
//! These macros take a logger expression followed by `format!` arguments and
//! capture the call site: `file!()`, `line!()` and `module_path!()` (used as
//! the message context). Arguments are only formatted when
//! [`Logger::enabled`](crate::Logger::enabled) accepts the level.
//!
//! # Examples
//!
//! ```
//! use pipeline_logger::prelude::*;
//! use pipeline_logger::info;
//!
//! let logger = Logger::builder()
//!     .min_file_level(LogLevel::None)
//!     .build()
//!     .unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use pipeline_logger::prelude::*;
/// # let logger = Logger::builder().min_file_level(LogLevel::None).build().unwrap();
/// use pipeline_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        match (&$logger, $level) {
            (logger, level) => {
                let site = $crate::CallSite::new(file!(), line!(), "", module_path!());
                // Gated-out calls still go through `log` for metrics and
                // None-level diagnostics, but never format their arguments
                if logger.enabled(level) {
                    logger.log(level, site, format!($($arg)+))
                } else {
                    logger.log(level, site, ::std::string::String::new())
                }
            }
        }
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use pipeline_logger::prelude::*;
/// # let logger = Logger::builder().min_file_level(LogLevel::None).build().unwrap();
/// use pipeline_logger::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use pipeline_logger::prelude::*;
/// # let logger = Logger::builder().min_file_level(LogLevel::None).build().unwrap();
/// use pipeline_logger::warning;
/// warning!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{ChannelListener, LogLevel, Logger, LogsListener};
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_macros_capture_call_site() {
        let dir = tempdir().unwrap();
        let logger = Logger::builder()
            .min_terminal_level(LogLevel::None)
            .min_file_level(LogLevel::Debug)
            .log_directory(dir.path())
            .build()
            .unwrap();
        let listener = Arc::new(ChannelListener::new());
        let handle: Arc<dyn LogsListener> = listener.clone();
        logger.add_listener(&handle);

        log!(logger, LogLevel::Info, "plain");
        debug!(logger, "count: {}", 5);
        warning!(logger, "retry {} of {}", 1, 3);
        error!(logger, "code: {}", 500);
        info!(logger, "items: {}", 100);

        let messages: Vec<_> = std::iter::from_fn(|| listener.pop_message()).collect();
        let texts: Vec<&str> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["plain", "count: 5", "retry 1 of 3", "code: 500", "items: 100"]);

        let levels: Vec<LogLevel> = messages.iter().map(|m| m.level).collect();
        assert_eq!(
            levels,
            [LogLevel::Info, LogLevel::Debug, LogLevel::Warning, LogLevel::Error, LogLevel::Info]
        );

        assert!(messages[0].file.ends_with("macros.rs"));
        assert_eq!(messages[0].context, module_path!());
        assert!(messages[1].line > messages[0].line);
    }

    /// Display impl that counts how often it is formatted
    struct Formatted(Arc<AtomicUsize>);

    impl fmt::Display for Formatted {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fetch_add(1, Ordering::SeqCst);
            f.write_str("formatted")
        }
    }

    #[test]
    fn test_gated_macro_skips_formatting() {
        let logger = Logger::builder()
            .min_terminal_level(LogLevel::None)
            .min_file_level(LogLevel::None)
            .build()
            .unwrap();
        let count = Arc::new(AtomicUsize::new(0));

        debug!(logger, "{}", Formatted(Arc::clone(&count)));
        error!(logger, "{}", Formatted(Arc::clone(&count)));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(logger.metrics().filtered_count(), 2);
    }

    #[test]
    fn test_none_level_macro_still_reports_misuse() {
        let logger = Logger::builder()
            .min_terminal_level(LogLevel::None)
            .min_file_level(LogLevel::None)
            .build()
            .unwrap();
        let count = Arc::new(AtomicUsize::new(0));

        log!(logger, LogLevel::None, "{}", Formatted(Arc::clone(&count)));

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(logger.metrics().misuse_count(), 1);
    }
}
