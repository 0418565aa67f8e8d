//! Rendering of messages through a compiled template

use super::format::{FormatCache, FormatToken};
use super::log_level::LogLevel;
use super::message::Message;
use chrono::Local;
use std::fmt::Write;

/// strftime pattern of `%{DATETIME}`: `2025-01-08 10:30:45,123` in local time
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Result of one render.
#[derive(Debug)]
pub struct Rendered<'a> {
    /// Output line without trailing newline
    pub line: &'a str,
    /// Replacement message to push through the pipeline when the input was
    /// unrenderable (`LogLevel::None`). `line` is empty in that case.
    pub diagnostic: Option<Message>,
}

/// Template renderer with a reusable output buffer.
///
/// One renderer per writing thread: the sync pipeline keeps one per caller
/// thread, the async worker owns one.
#[derive(Debug, Default)]
pub struct Renderer {
    buffer: String,
}

impl Renderer {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    /// Render `message` with `format`, reusing the internal buffer.
    pub fn render(&mut self, format: &FormatCache, message: &Message) -> Rendered<'_> {
        self.buffer.clear();

        if message.level == LogLevel::None {
            return Rendered {
                line: &self.buffer,
                diagnostic: Some(Message::none_level_diagnostic(message)),
            };
        }

        for token in format.tokens() {
            write_token(&mut self.buffer, token, message);
        }

        Rendered {
            line: &self.buffer,
            diagnostic: None,
        }
    }

    /// Render into a fresh `String`; convenience for listeners and tests.
    pub fn render_to_string(format: &FormatCache, message: &Message) -> (String, Option<Message>) {
        let mut renderer = Renderer::with_capacity(0);
        let rendered = renderer.render(format, message);
        let diagnostic = rendered.diagnostic;
        (renderer.buffer, diagnostic)
    }
}

fn write_token(out: &mut String, token: &FormatToken, message: &Message) {
    // Writing into a String cannot fail
    match token {
        FormatToken::DateTime => {
            let local = message.timestamp.with_timezone(&Local);
            let _ = write!(out, "{}", local.format(DATETIME_FORMAT));
        }
        FormatToken::FileName => out.push_str(&message.file),
        FormatToken::Line => {
            let _ = write!(out, "{}", message.line);
        }
        FormatToken::Thread => {
            let _ = write!(out, "0x{:016x}", message.thread_id);
        }
        FormatToken::Context => out.push_str(&message.context),
        FormatToken::ErrorClass => out.push_str(message.level.to_str()),
        FormatToken::Message => out.push_str(&message.text),
        FormatToken::Literal(text) => out.push_str(text),
    }
}
