//! Sink implementations

pub mod rotating_file;
pub mod terminal;

pub use rotating_file::{RotatingFileAppender, RotationOutcome, MAX_ROTATION_SUFFIX};
pub use terminal::TerminalAppender;
