//! Delivery of messages to the terminal and file sinks
//!
//! Both pipelines share [`PipelineCore`]: configuration, the two sinks (each
//! behind its own mutex) and metrics. They differ only in which thread does
//! the work and how long the file handle stays open.

use super::config::{FileSettings, LoggerConfig};
use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::message::Message;
use super::metrics::{should_alert, LoggerMetrics};
use super::renderer::Renderer;
use crate::appenders::{RotatingFileAppender, RotationOutcome, TerminalAppender};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::collections::VecDeque;
use std::time::Duration;

/// Default time `shutdown` waits for pending messages when a logger is dropped
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Which delivery discipline a logger was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Caller thread renders and writes before `log` returns
    Sync,
    /// Caller enqueues; a dedicated worker renders and writes
    Async,
}

/// Capability shared by the synchronous and asynchronous pipelines.
pub trait DeliveryPipeline: Send + Sync {
    /// Hand over a gated, fully built message.
    ///
    /// Fails with [`LoggerError::LoggerStopped`] once shutdown has begun.
    fn on_new_message(&self, message: Message) -> Result<()>;

    /// Block until everything handed over so far has been written.
    fn wait_for_log_to_be_written(&self);

    /// Stop accepting messages and finish pending work within `timeout`.
    ///
    /// Returns `false` if pending work could not be finished in time.
    fn shutdown(&self, timeout: Duration) -> bool;

    fn mode(&self) -> DeliveryMode;
}

/// State shared between a logger, its pipeline and the async worker.
pub struct PipelineCore {
    config: RwLock<LoggerConfig>,
    terminal: Mutex<TerminalAppender>,
    file: Mutex<RotatingFileAppender>,
    metrics: LoggerMetrics,
}

/// File handle state during one batch.
enum FileSlot<'a> {
    Closed,
    Open(MutexGuard<'a, RotatingFileAppender>),
    Failed,
}

impl PipelineCore {
    pub(crate) fn new(config: LoggerConfig, terminal: TerminalAppender) -> Self {
        let file = RotatingFileAppender::new(config.file.clone());
        Self {
            config: RwLock::new(config),
            terminal: Mutex::new(terminal),
            file: Mutex::new(file),
            metrics: LoggerMetrics::new(),
        }
    }

    pub(crate) fn config(&self) -> &RwLock<LoggerConfig> {
        &self.config
    }

    pub(crate) fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Deliver one message on the calling thread.
    ///
    /// The file is opened (rotating first if needed), written and closed
    /// under the file lock; the terminal is written afterwards under its own
    /// lock, so the two critical sections never nest.
    pub(crate) fn deliver(&self, message: Message, renderer: &mut Renderer) {
        let mut pending = Some(message);

        while let Some(message) = pending.take() {
            let config = self.config.read();
            let to_file = config.gate.should_deliver_to_file(message.level);
            let to_terminal = config.gate.should_deliver_to_terminal(message.level);

            if message.level != LogLevel::None && !to_file && !to_terminal {
                self.metrics.record_filtered();
                continue;
            }

            let rendered = renderer.render(&config.format, &message);
            if let Some(diagnostic) = rendered.diagnostic {
                self.metrics.record_misuse();
                pending = Some(diagnostic);
                continue;
            }

            let mut delivered = true;
            if to_file {
                let mut appender = self.file.lock();
                delivered &= self.open_file(&mut appender, &config.file)
                    && self.write_file(&mut appender, rendered.line);
                self.close_file(&mut appender);
            }
            if to_terminal {
                delivered &= self.write_terminal(message.level, rendered.line);
            }
            if delivered {
                self.metrics.record_delivered();
            }
        }
    }

    /// Deliver a drained batch in FIFO order.
    ///
    /// The file is opened lazily on the first file-bound message and stays
    /// open until the batch is exhausted, so rotation is checked once per
    /// batch. A failed open skips the file sink for the rest of the batch.
    pub(crate) fn deliver_batch(&self, mut batch: VecDeque<Message>, renderer: &mut Renderer) {
        let mut file = FileSlot::Closed;

        while let Some(message) = batch.pop_front() {
            let config = self.config.read();
            let to_file = config.gate.should_deliver_to_file(message.level);
            let to_terminal = config.gate.should_deliver_to_terminal(message.level);

            if message.level != LogLevel::None && !to_file && !to_terminal {
                self.metrics.record_filtered();
                continue;
            }

            let rendered = renderer.render(&config.format, &message);
            if let Some(diagnostic) = rendered.diagnostic {
                self.metrics.record_misuse();
                batch.push_front(diagnostic);
                continue;
            }

            let mut delivered = true;
            if to_file {
                if let FileSlot::Closed = file {
                    let mut appender = self.file.lock();
                    file = if self.open_file(&mut appender, &config.file) {
                        FileSlot::Open(appender)
                    } else {
                        FileSlot::Failed
                    };
                }
                delivered &= match &mut file {
                    FileSlot::Open(appender) => self.write_file(appender, rendered.line),
                    _ => false,
                };
            }
            if to_terminal {
                delivered &= self.write_terminal(message.level, rendered.line);
            }
            if delivered {
                self.metrics.record_delivered();
            }
        }

        if let FileSlot::Open(mut appender) = file {
            self.close_file(&mut appender);
        }
    }

    fn open_file(&self, appender: &mut RotatingFileAppender, settings: &FileSettings) -> bool {
        if appender.settings() != settings {
            if let Err(e) = appender.set_settings(settings.clone()) {
                self.report_sink_failure("closing previous log file", &e);
            }
        }

        match appender.open() {
            Ok(RotationOutcome::NotNeeded) => true,
            Ok(RotationOutcome::Rotated(_)) => {
                self.metrics.record_rotation();
                true
            }
            Ok(RotationOutcome::Failed(e)) => {
                // Keep writing into the oversized file
                self.report_sink_failure("rotating log file", &e);
                true
            }
            Err(e) => {
                self.report_sink_failure("opening log file", &e);
                false
            }
        }
    }

    fn write_file(&self, appender: &mut RotatingFileAppender, line: &str) -> bool {
        match appender.write_line(line) {
            Ok(()) => true,
            Err(e) => {
                self.report_sink_failure("writing log file", &e);
                false
            }
        }
    }

    fn close_file(&self, appender: &mut RotatingFileAppender) {
        if let Err(e) = appender.close() {
            self.report_sink_failure("closing log file", &e);
        }
    }

    fn write_terminal(&self, level: LogLevel, line: &str) -> bool {
        let mut terminal = self.terminal.lock();
        match terminal.write_line(level, line) {
            Ok(()) => true,
            Err(e) => {
                self.report_sink_failure("writing to terminal", &e);
                false
            }
        }
    }

    fn report_sink_failure(&self, operation: &str, error: &LoggerError) {
        let previous = self.metrics.record_sink_failure();
        if should_alert(previous) {
            eprintln!(
                "[LOGGER ERROR] {} failed: {} ({} sink failures so far)",
                operation,
                error,
                previous + 1
            );
        }
    }

    /// Flush both sinks and release the file handle.
    pub(crate) fn flush(&self) {
        self.close_file(&mut self.file.lock());
        if let Err(e) = self.terminal.lock().flush() {
            self.report_sink_failure("flushing terminal", &e);
        }
    }
}
