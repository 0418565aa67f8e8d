//! # Pipeline Logger
//!
//! Leveled, template-formatted logging with two delivery disciplines:
//! synchronous (the caller writes) and asynchronous (a worker thread writes
//! queued messages in batches).
//!
//! ## Features
//!
//! - **Independent gates**: separate minimum levels for the terminal and the file
//! - **Compiled templates**: `%{DATETIME}`, `%{FILENAME}`, `%{LINE}`, `%{THREAD}`,
//!   `%{CONTEXT}`, `%{ERROR_CLASS}` and `%{MESSAGE}` placeholders, parsed once
//! - **Size rotation**: `logs/log.txt` is renamed to `log.txt_N` once it grows too large
//! - **Listeners**: weakly-held subscribers receive every accepted message
//!
//! ## Example
//!
//! ```no_run
//! use pipeline_logger::prelude::*;
//!
//! let logger = Logger::builder()
//!     .min_terminal_level(LogLevel::Warning)
//!     .min_file_level(LogLevel::Debug)
//!     .log_directory("logs")
//!     .async_mode()
//!     .build()
//!     .unwrap();
//!
//! logger.info("service started");
//! logger.wait_for_log_to_be_written();
//! ```

pub mod appenders;
pub mod core;
pub mod current;
pub mod macros;
pub mod stream;

pub mod prelude {
    pub use crate::appenders::{RotatingFileAppender, TerminalAppender};
    pub use crate::core::{
        CallSite, ChannelListener, DeliveryMode, FileSettings, FormatCache, LevelGate, LogLevel,
        Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, LogsListener, Message,
        Result, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::stream::LogStream;
}

pub use appenders::{RotatingFileAppender, RotationOutcome, TerminalAppender};
pub use crate::core::{
    current_thread_id, CallSite, ChannelListener, DeliveryMode, FileSettings, FormatCache,
    FormatToken, LevelGate, ListenerRegistry, LogLevel, Logger, LoggerBuilder, LoggerConfig,
    LoggerError, LoggerMetrics, LogsListener, Message, Renderer, Result, DEFAULT_FORMAT,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use stream::LogStream;
