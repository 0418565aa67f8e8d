//! Per-sink minimum level filtering

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};

/// Independent minimum levels for the terminal and file sinks.
///
/// A gate set to `LogLevel::None` accepts nothing. A message level of `None`
/// is never accepted by either gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelGate {
    pub min_terminal_level: LogLevel,
    pub min_file_level: LogLevel,
}

impl Default for LevelGate {
    fn default() -> Self {
        Self {
            min_terminal_level: LogLevel::Info,
            min_file_level: LogLevel::Info,
        }
    }
}

impl LevelGate {
    pub fn new(min_terminal_level: LogLevel, min_file_level: LogLevel) -> Self {
        Self {
            min_terminal_level,
            min_file_level,
        }
    }

    #[inline]
    pub fn should_deliver_to_file(&self, level: LogLevel) -> bool {
        level != LogLevel::None && level >= self.min_file_level
    }

    #[inline]
    pub fn should_deliver_to_terminal(&self, level: LogLevel) -> bool {
        level != LogLevel::None && level >= self.min_terminal_level
    }

    /// Whether any sink wants this level; `false` means skip rendering entirely.
    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        self.should_deliver_to_file(level) || self.should_deliver_to_terminal(level)
    }
}
