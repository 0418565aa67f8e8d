//! Message structure and call-site capture

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};

/// Text of the diagnostic emitted in place of a `None`-level message.
pub const NONE_LEVEL_DIAGNOSTIC: &str =
    "you shall not push None-level messages (LogLevel::None is a gate value, not a message level)";

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

// Thread-local cache so each thread draws its display id exactly once
thread_local! {
    static THREAD_ID_CACHE: Cell<u64> = const { Cell::new(0) };
}

/// Stable, process-unique numeric identity of the calling thread.
///
/// Used only for display (`%{THREAD}`); ids are handed out in first-use order
/// starting at 1.
pub fn current_thread_id() -> u64 {
    THREAD_ID_CACHE.with(|cache| {
        let cached = cache.get();
        if cached != 0 {
            return cached;
        }
        let id = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
        cache.set(id);
        id
    })
}

/// Source context of a log call.
///
/// `class` may be empty; the message context then becomes just `function`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite<'a> {
    pub file: &'a str,
    pub line: u32,
    pub thread_id: u64,
    pub class: &'a str,
    pub function: &'a str,
}

impl<'a> CallSite<'a> {
    pub fn new(file: &'a str, line: u32, class: &'a str, function: &'a str) -> Self {
        Self {
            file,
            line,
            thread_id: current_thread_id(),
            class,
            function,
        }
    }

    /// Call site of whoever invoked this function (file and line only).
    #[track_caller]
    pub fn caller() -> CallSite<'static> {
        let location = Location::caller();
        CallSite {
            file: location.file(),
            line: location.line(),
            thread_id: current_thread_id(),
            class: "",
            function: "",
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: &'a str) -> Self {
        self.class = class;
        self
    }

    #[must_use]
    pub fn with_function(mut self, function: &'a str) -> Self {
        self.function = function;
        self
    }

    #[must_use]
    pub fn with_thread_id(mut self, thread_id: u64) -> Self {
        self.thread_id = thread_id;
        self
    }
}

/// One log emission, built once per call.
///
/// Fields are public so listeners can inspect a message and hosts can build
/// one directly. The pipeline itself only reads it: renderers and sinks take
/// `&Message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub text: String,
    pub thread_id: u64,
    pub file: String,
    pub line: u32,
    /// `Class::function`, or `function` alone when no class is known
    pub context: String,
}

impl Message {
    pub fn new(level: LogLevel, text: String, site: &CallSite<'_>, truncate_filename: bool) -> Self {
        let file = if truncate_filename {
            basename(site.file)
        } else {
            site.file
        };

        Self {
            timestamp: Utc::now(),
            level,
            text,
            thread_id: site.thread_id,
            file: file.to_string(),
            line: site.line,
            context: join_context(site.class, site.function),
        }
    }

    /// Error-level replacement for a message that was pushed with `LogLevel::None`.
    ///
    /// Keeps the offender's location so the misuse can be traced.
    pub fn none_level_diagnostic(offender: &Message) -> Self {
        Self {
            timestamp: Utc::now(),
            level: LogLevel::Error,
            text: NONE_LEVEL_DIAGNOSTIC.to_string(),
            thread_id: offender.thread_id,
            file: offender.file.clone(),
            line: offender.line,
            context: offender.context.clone(),
        }
    }
}

fn join_context(class: &str, function: &str) -> String {
    if class.is_empty() {
        return function.to_string();
    }
    let mut context = String::with_capacity(class.len() + 2 + function.len());
    context.push_str(class);
    context.push_str("::");
    context.push_str(function);
    context
}

fn basename(path: &str) -> &str {
    path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_with_class() {
        let site = CallSite::new("src/net/server.rs", 42, "Server", "accept");
        let message = Message::new(LogLevel::Info, "ready".to_string(), &site, false);
        assert_eq!(message.context, "Server::accept");
        assert_eq!(message.file, "src/net/server.rs");
        assert_eq!(message.line, 42);
    }

    #[test]
    fn test_context_without_class() {
        let site = CallSite::new("main.rs", 7, "", "main");
        let message = Message::new(LogLevel::Info, "ready".to_string(), &site, false);
        assert_eq!(message.context, "main");
    }

    #[test]
    fn test_filename_truncation() {
        let site = CallSite::new("src/net/server.rs", 1, "", "f");
        let message = Message::new(LogLevel::Debug, String::new(), &site, true);
        assert_eq!(message.file, "server.rs");

        let site = CallSite::new("C:\\work\\main.rs", 1, "", "f");
        let message = Message::new(LogLevel::Debug, String::new(), &site, true);
        assert_eq!(message.file, "main.rs");

        let site = CallSite::new("plain.rs", 1, "", "f");
        let message = Message::new(LogLevel::Debug, String::new(), &site, true);
        assert_eq!(message.file, "plain.rs");
    }

    #[test]
    fn test_thread_id_is_stable_per_thread() {
        let here = current_thread_id();
        assert_eq!(here, current_thread_id());
        assert_ne!(here, 0);

        let other = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, other);
    }

    #[test]
    fn test_caller_captures_location() {
        let site = CallSite::caller();
        assert!(site.file.ends_with("message.rs"));
        assert!(site.line > 0);
        assert_eq!(site.thread_id, current_thread_id());
    }

    #[test]
    fn test_none_level_diagnostic() {
        let site = CallSite::new("a.rs", 3, "A", "b");
        let offender = Message::new(LogLevel::None, "bad".to_string(), &site, false);
        let diagnostic = Message::none_level_diagnostic(&offender);
        assert_eq!(diagnostic.level, LogLevel::Error);
        assert!(diagnostic.text.contains("None"));
        assert_eq!(diagnostic.context, "A::b");
        assert_eq!(diagnostic.line, 3);
    }
}
