//! Core logger types and traits

pub mod async_pipeline;
pub mod config;
pub mod delivery;
pub mod error;
pub mod format;
pub mod level_gate;
pub mod listener;
pub mod log_level;
pub mod logger;
pub mod message;
pub mod metrics;
pub mod renderer;
pub mod sync_pipeline;

pub use async_pipeline::AsyncPipeline;
pub use config::{
    FileSettings, LoggerConfig, DEFAULT_LOG_DIRECTORY, DEFAULT_MAX_FILE_SIZE, LOG_FILE_NAME,
};
pub use delivery::{DeliveryMode, DeliveryPipeline, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{LoggerError, Result};
pub use format::{FormatCache, FormatToken, DEFAULT_FORMAT};
pub use level_gate::LevelGate;
pub use listener::{ChannelListener, ListenerRegistry, LogsListener};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use message::{current_thread_id, CallSite, Message, NONE_LEVEL_DIAGNOSTIC};
pub use metrics::LoggerMetrics;
pub use renderer::{Rendered, Renderer, DATETIME_FORMAT};
pub use sync_pipeline::SyncPipeline;
