//! Main logger implementation

use super::{
    async_pipeline::AsyncPipeline,
    config::{FileSettings, LoggerConfig},
    delivery::{DeliveryMode, DeliveryPipeline, PipelineCore, DEFAULT_SHUTDOWN_TIMEOUT},
    error::{LoggerError, Result},
    format::FormatCache,
    level_gate::LevelGate,
    listener::{ListenerRegistry, LogsListener},
    log_level::LogLevel,
    message::{CallSite, Message},
    metrics::{should_alert, LoggerMetrics},
    sync_pipeline::SyncPipeline,
};
use crate::appenders::TerminalAppender;
use crate::stream::LogStream;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Front end of the pipeline: gates, builds messages, notifies listeners and
/// hands messages to the configured delivery pipeline.
///
/// Configuration setters take `&self` and apply from the next message (or,
/// in async mode, the next batch the worker starts).
pub struct Logger {
    core: Arc<PipelineCore>,
    pipeline: Box<dyn DeliveryPipeline>,
    listeners: ListenerRegistry,
}

impl Logger {
    /// Synchronous logger with default configuration.
    #[must_use]
    pub fn new() -> Self {
        let core = Arc::new(PipelineCore::new(LoggerConfig::default(), TerminalAppender::new()));
        Self::with_pipeline(Arc::clone(&core), Box::new(SyncPipeline::new(core)))
    }

    /// Asynchronous logger with default configuration.
    pub fn with_async() -> Result<Self> {
        Self::builder().async_mode().build()
    }

    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn with_pipeline(core: Arc<PipelineCore>, pipeline: Box<dyn DeliveryPipeline>) -> Self {
        Self {
            core,
            pipeline,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Whether a message at `level` would reach at least one sink.
    ///
    /// Lets callers skip building expensive message text; `LogLevel::None`
    /// is never enabled.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::None && self.core.config().read().gate.accepts(level)
    }

    /// Emit one message.
    ///
    /// Messages rejected by both level gates are discarded before `text` is
    /// converted or a [`Message`] is built. `LogLevel::None` is not a message
    /// level: it is replaced by an Error-level diagnostic pointing at `site`.
    pub fn log(&self, level: LogLevel, site: CallSite<'_>, text: impl Into<String>) {
        let (accepted, truncate) = {
            let config = self.core.config().read();
            (config.gate.accepts(level), config.truncate_filenames)
        };

        if level == LogLevel::None {
            self.core.metrics().record_misuse();
            let offender = Message::new(level, String::new(), &site, truncate);
            self.dispatch(Message::none_level_diagnostic(&offender));
            return;
        }

        if !accepted {
            self.core.metrics().record_filtered();
            return;
        }

        self.dispatch(Message::new(level, text.into(), &site, truncate));
    }

    fn dispatch(&self, message: Message) {
        if !self.core.config().read().gate.accepts(message.level) {
            self.core.metrics().record_filtered();
            return;
        }

        self.listeners.notify(&message);

        if let Err(e) = self.pipeline.on_new_message(message) {
            let previous = self.core.metrics().record_dropped();
            if should_alert(previous) {
                eprintln!(
                    "[LOGGER WARNING] Message dropped: {} ({} dropped so far)",
                    e,
                    previous + 1
                );
            }
        }
    }

    #[track_caller]
    pub fn debug(&self, text: impl Into<String>) {
        self.log(LogLevel::Debug, CallSite::caller(), text);
    }

    #[track_caller]
    pub fn info(&self, text: impl Into<String>) {
        self.log(LogLevel::Info, CallSite::caller(), text);
    }

    #[track_caller]
    pub fn warning(&self, text: impl Into<String>) {
        self.log(LogLevel::Warning, CallSite::caller(), text);
    }

    #[track_caller]
    pub fn error(&self, text: impl Into<String>) {
        self.log(LogLevel::Error, CallSite::caller(), text);
    }

    /// Scoped builder that posts exactly one message when finished or dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use pipeline_logger::prelude::*;
    /// use std::fmt::Write;
    ///
    /// let logger = Logger::builder()
    ///     .min_file_level(LogLevel::None)
    ///     .min_terminal_level(LogLevel::None)
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut stream = logger.stream(LogLevel::Info).class("Server").function("start");
    /// write!(stream, "listening on port {}", 8080).unwrap();
    /// stream.finish();
    /// ```
    #[track_caller]
    pub fn stream(&self, level: LogLevel) -> LogStream<'_> {
        LogStream::new(self, level, CallSite::caller())
    }

    pub fn set_min_terminal_level(&self, level: LogLevel) {
        self.core.config().write().gate.min_terminal_level = level;
    }

    pub fn set_min_file_level(&self, level: LogLevel) {
        self.core.config().write().gate.min_file_level = level;
    }

    /// Change where `log.txt` is written; the directory is created on first write.
    pub fn set_log_directory(&self, directory: impl Into<PathBuf>) -> Result<()> {
        let directory = directory.into();
        if directory.as_os_str().is_empty() {
            return Err(LoggerError::config("FileSettings", "log directory must not be empty"));
        }
        self.core.config().write().file.directory = directory;
        Ok(())
    }

    /// Rotation threshold in bytes; `0` disables rotation.
    pub fn set_max_file_size(&self, max_file_size: u64) {
        self.core.config().write().file.max_file_size = max_file_size;
    }

    /// Replace the output template; it is compiled once here.
    pub fn set_format(&self, template: impl Into<String>) {
        let format = FormatCache::compile(template);
        self.core.config().write().format = format;
    }

    pub fn set_filename_truncation(&self, truncate: bool) {
        self.core.config().write().truncate_filenames = truncate;
    }

    pub fn min_terminal_level(&self) -> LogLevel {
        self.core.config().read().gate.min_terminal_level
    }

    pub fn min_file_level(&self) -> LogLevel {
        self.core.config().read().gate.min_file_level
    }

    pub fn log_directory(&self) -> PathBuf {
        self.core.config().read().file.directory.clone()
    }

    pub fn max_file_size(&self) -> u64 {
        self.core.config().read().file.max_file_size
    }

    /// Current template string
    pub fn format(&self) -> String {
        self.core.config().read().format.template().to_string()
    }

    pub fn filename_truncation(&self) -> bool {
        self.core.config().read().truncate_filenames
    }

    /// Path of the active log file
    pub fn log_path(&self) -> PathBuf {
        self.core.config().read().file.log_path()
    }

    /// Snapshot of the whole configuration
    pub fn config(&self) -> LoggerConfig {
        self.core.config().read().clone()
    }

    pub fn mode(&self) -> DeliveryMode {
        self.pipeline.mode()
    }

    /// Subscribe a listener; the registry keeps only a weak handle.
    pub fn add_listener(&self, listener: &Arc<dyn LogsListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn LogsListener>) -> bool {
        self.listeners.remove(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        self.core.metrics()
    }

    /// Block until every message logged so far has been written.
    ///
    /// Returns immediately for sync loggers and for an idle async logger.
    /// There is no timeout: a stuck sink blocks the caller.
    pub fn wait_for_log_to_be_written(&self) {
        self.pipeline.wait_for_log_to_be_written();
    }

    /// Stop accepting messages and drain what is queued.
    ///
    /// Messages logged after this call are dropped and counted in
    /// [`LoggerMetrics::dropped_count`]. Calling it again is harmless.
    ///
    /// # Returns
    ///
    /// `true` if the queue drained within `timeout`, `false` otherwise
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pipeline_logger::{Logger, DEFAULT_SHUTDOWN_TIMEOUT};
    /// use std::time::Duration;
    ///
    /// let logger = Logger::with_async().unwrap();
    /// logger.info("Important message");
    ///
    /// if !logger.shutdown(Duration::from_secs(10)) {
    ///     eprintln!("Warning: Logger shutdown timed out");
    /// }
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.pipeline.shutdown(timeout)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.pipeline.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

        let metrics = self.core.metrics();
        let dropped = metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} dropped logs (drop rate: {:.2}%)",
                dropped,
                metrics.drop_rate()
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use pipeline_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .min_terminal_level(LogLevel::Warning)
///     .min_file_level(LogLevel::None)
///     .format("%{ERROR_CLASS}: %{MESSAGE}")
///     .truncate_filenames(true)
///     .async_mode()
///     .build()
///     .unwrap();
/// # logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    terminal: Option<TerminalAppender>,
    async_mode: bool,
    listeners: Vec<Arc<dyn LogsListener>>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: LoggerConfig::default(),
            terminal: None,
            async_mode: false,
            listeners: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_terminal_level(mut self, level: LogLevel) -> Self {
        self.config.gate.min_terminal_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_file_level(mut self, level: LogLevel) -> Self {
        self.config.gate.min_file_level = level;
        self
    }

    /// Set both gates at once
    #[must_use = "builder methods return a new value"]
    pub fn gate(mut self, gate: LevelGate) -> Self {
        self.config.gate = gate;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn log_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.config.file.directory = directory.into();
        self
    }

    /// Rotation threshold in bytes; `0` disables rotation
    #[must_use = "builder methods return a new value"]
    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.config.file.max_file_size = max_file_size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn file_settings(mut self, settings: FileSettings) -> Self {
        self.config.file = settings;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn format(mut self, template: impl Into<String>) -> Self {
        self.config.format = FormatCache::compile(template);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn truncate_filenames(mut self, truncate: bool) -> Self {
        self.config.truncate_filenames = truncate;
        self
    }

    /// Deliver from a background worker instead of the calling thread.
    ///
    /// If not called, the logger will use synchronous mode.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self) -> Self {
        self.async_mode = true;
        self
    }

    /// Replace the terminal sink, e.g. to capture output.
    #[must_use = "builder methods return a new value"]
    pub fn terminal(mut self, terminal: TerminalAppender) -> Self {
        self.terminal = Some(terminal);
        self
    }

    /// Register a listener at construction. Only a weak handle is kept, so
    /// the caller must hold on to its own `Arc`.
    #[must_use = "builder methods return a new value"]
    pub fn listener(mut self, listener: &Arc<dyn LogsListener>) -> Self {
        self.listeners.push(Arc::clone(listener));
        self
    }

    /// Build the Logger
    ///
    /// Fails on invalid configuration or when the async worker cannot be
    /// started.
    pub fn build(self) -> Result<Logger> {
        self.config.validate()?;

        let terminal = self.terminal.unwrap_or_default();
        let core = Arc::new(PipelineCore::new(self.config, terminal));
        let pipeline: Box<dyn DeliveryPipeline> = if self.async_mode {
            Box::new(AsyncPipeline::new(Arc::clone(&core))?)
        } else {
            Box::new(SyncPipeline::new(Arc::clone(&core)))
        };

        let logger = Logger::with_pipeline(core, pipeline);
        for listener in &self.listeners {
            logger.add_listener(listener);
        }
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
