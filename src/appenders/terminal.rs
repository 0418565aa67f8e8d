//! Terminal appender implementation

use crate::core::{LogLevel, Result};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::{self, Write};

/// Writes rendered lines to the terminal.
///
/// Levels up to `Info` go to standard output, `Warning` and `Error` to
/// standard error. Both streams can be replaced, e.g. to capture output.
pub struct TerminalAppender {
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
    #[cfg(feature = "console")]
    use_colors: bool,
}

impl TerminalAppender {
    pub fn new() -> Self {
        Self::with_writers(io::stdout(), io::stderr())
    }

    /// Use custom writers in place of stdout and stderr.
    pub fn with_writers(
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
    ) -> Self {
        Self {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            #[cfg(feature = "console")]
            use_colors: false,
        }
    }

    /// Color whole lines by level.
    ///
    /// # Example
    ///
    /// ```
    /// use pipeline_logger::appenders::TerminalAppender;
    ///
    /// let appender = TerminalAppender::new().with_colors(true);
    /// ```
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Write one line (a newline is appended) to the stream for `level`.
    pub fn write_line(&mut self, level: LogLevel, line: &str) -> Result<()> {
        let target = if level.is_severe() {
            &mut self.stderr
        } else {
            &mut self.stdout
        };

        #[cfg(feature = "console")]
        if self.use_colors {
            writeln!(target, "{}", line.color(level.color_code()))?;
            target.flush()?;
            return Ok(());
        }

        target.write_all(line.as_bytes())?;
        target.write_all(b"\n")?;
        target.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        self.stderr.flush()?;
        Ok(())
    }
}

impl Default for TerminalAppender {
    fn default() -> Self {
        Self::new()
    }
}
