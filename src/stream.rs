//! Scoped message builder
//!
//! A [`LogStream`] collects text through [`fmt::Write`] and posts it as a
//! single log call when it goes out of scope, whichever way the scope is
//! left.

use crate::core::{CallSite, LogLevel, Logger};
use std::fmt;

/// Accumulates one message and logs it exactly once.
///
/// Created by [`Logger::stream`]. Dropping the stream posts the message;
/// [`finish`](Self::finish) does the same explicitly.
pub struct LogStream<'a> {
    logger: &'a Logger,
    level: LogLevel,
    file: &'static str,
    line: u32,
    thread_id: u64,
    class: String,
    function: String,
    buffer: String,
    posted: bool,
}

impl<'a> LogStream<'a> {
    pub(crate) fn new(logger: &'a Logger, level: LogLevel, site: CallSite<'static>) -> Self {
        Self {
            logger,
            level,
            file: site.file,
            line: site.line,
            thread_id: site.thread_id,
            class: site.class.to_string(),
            function: site.function.to_string(),
            buffer: String::new(),
            posted: false,
        }
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    #[must_use]
    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    /// Text collected so far
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Post the message now.
    pub fn finish(mut self) {
        self.post();
    }

    fn post(&mut self) {
        if self.posted {
            return;
        }
        self.posted = true;

        let text = std::mem::take(&mut self.buffer);
        let site = CallSite::new(self.file, self.line, &self.class, &self.function)
            .with_thread_id(self.thread_id);
        self.logger.log(self.level, site, text);
    }
}

impl fmt::Write for LogStream<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

impl Drop for LogStream<'_> {
    fn drop(&mut self) {
        self.post();
    }
}
