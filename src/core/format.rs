//! Compiled output templates
//!
//! A template such as `"%{DATETIME} [%{CONTEXT}] %{MESSAGE}"` is scanned once
//! into a flat token list; rendering then walks the tokens instead of
//! searching the template for every message.

use std::fmt;

/// Template used when none is configured.
pub const DEFAULT_FORMAT: &str =
    "%{DATETIME} %{FILENAME}:%{LINE} [%{CONTEXT}] %{ERROR_CLASS}: %{MESSAGE}";

const MARKER: &str = "%{";

/// One element of a compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatToken {
    DateTime,
    FileName,
    Line,
    Thread,
    Context,
    ErrorClass,
    Message,
    /// Text copied verbatim, including unrecognized `%{...}` spans
    Literal(String),
}

impl FormatToken {
    /// Field token for a full `%{NAME}` span, if `NAME` is recognized.
    fn from_placeholder(span: &str) -> Option<Self> {
        match span {
            "%{DATETIME}" => Some(FormatToken::DateTime),
            "%{FILENAME}" => Some(FormatToken::FileName),
            "%{LINE}" => Some(FormatToken::Line),
            "%{THREAD}" => Some(FormatToken::Thread),
            "%{CONTEXT}" => Some(FormatToken::Context),
            "%{ERROR_CLASS}" => Some(FormatToken::ErrorClass),
            "%{MESSAGE}" => Some(FormatToken::Message),
            _ => None,
        }
    }

    /// Template text this token was compiled from.
    pub fn as_template(&self) -> &str {
        match self {
            FormatToken::DateTime => "%{DATETIME}",
            FormatToken::FileName => "%{FILENAME}",
            FormatToken::Line => "%{LINE}",
            FormatToken::Thread => "%{THREAD}",
            FormatToken::Context => "%{CONTEXT}",
            FormatToken::ErrorClass => "%{ERROR_CLASS}",
            FormatToken::Message => "%{MESSAGE}",
            FormatToken::Literal(text) => text,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, FormatToken::Literal(_))
    }
}

/// Template string together with its compiled token sequence.
///
/// Immutable once built; changing the format means compiling a new cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCache {
    template: String,
    tokens: Vec<FormatToken>,
}

impl FormatCache {
    /// Compile `template` into tokens.
    ///
    /// Unknown field names and an unterminated `%{` are kept as literal text.
    pub fn compile(template: impl Into<String>) -> Self {
        let template = template.into();
        let tokens = tokenize(&template);
        Self { template, tokens }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn tokens(&self) -> &[FormatToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Concatenate the tokens back into template text.
    ///
    /// Always equal to [`FormatCache::template`].
    pub fn reconstruct(&self) -> String {
        let mut out = String::with_capacity(self.template.len());
        for token in &self.tokens {
            out.push_str(token.as_template());
        }
        out
    }
}

impl Default for FormatCache {
    fn default() -> Self {
        Self::compile(DEFAULT_FORMAT)
    }
}

impl fmt::Display for FormatCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn tokenize(template: &str) -> Vec<FormatToken> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;
    // First '}' at or after the last lookup; `Some(None)` once none remain.
    // Markers only move forward, so each byte is scanned for '}' at most once.
    let mut next_close: Option<Option<usize>> = None;

    while let Some(offset) = template[cursor..].find(MARKER) {
        let start = cursor + offset;
        let close = match next_close {
            Some(Some(close)) if close > start => Some(close),
            Some(None) => None,
            _ => {
                let found = template[start..].find('}').map(|close| start + close);
                next_close = Some(found);
                found
            }
        };
        let field = close.and_then(|close| {
            FormatToken::from_placeholder(&template[start..=close]).map(|token| (token, close))
        });

        match field {
            Some((token, close)) => {
                if start > literal_start {
                    tokens.push(FormatToken::Literal(template[literal_start..start].to_string()));
                }
                tokens.push(token);
                cursor = close + 1;
                literal_start = cursor;
            }
            None => {
                // '%' is one byte, so this stays on a char boundary
                cursor = start + 1;
            }
        }
    }

    if literal_start < template.len() {
        tokens.push(FormatToken::Literal(template[literal_start..].to_string()));
    }

    tokens
}
