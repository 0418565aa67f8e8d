//! Synchronous delivery: the caller renders and writes

use super::delivery::{DeliveryMode, DeliveryPipeline, PipelineCore};
use super::error::Result;
use super::message::Message;
use super::renderer::Renderer;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

thread_local! {
    // Render buffer reused by every sync log call made on this thread
    static RENDERER: RefCell<Renderer> = RefCell::new(Renderer::new());
}

/// Pipeline that writes on the calling thread before returning.
///
/// The file sink and the terminal sink are guarded separately, so a thread
/// blocked on a slow disk does not hold up terminal output of another thread.
pub struct SyncPipeline {
    core: Arc<PipelineCore>,
}

impl SyncPipeline {
    pub(crate) fn new(core: Arc<PipelineCore>) -> Self {
        Self { core }
    }
}

impl DeliveryPipeline for SyncPipeline {
    fn on_new_message(&self, message: Message) -> Result<()> {
        RENDERER.with(|cell| match cell.try_borrow_mut() {
            Ok(mut renderer) => self.core.deliver(message, &mut renderer),
            // Re-entered from inside a sink on this thread
            Err(_) => self.core.deliver(message, &mut Renderer::new()),
        });
        Ok(())
    }

    fn wait_for_log_to_be_written(&self) {
        // Everything is written before on_new_message returns
    }

    fn shutdown(&self, _timeout: Duration) -> bool {
        self.core.flush();
        true
    }

    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::TerminalAppender;
    use crate::core::config::{FileSettings, LoggerConfig};
    use crate::core::format::FormatCache;
    use crate::core::level_gate::LevelGate;
    use crate::core::log_level::LogLevel;
    use crate::core::message::CallSite;
    use std::fs;
    use std::thread;
    use tempfile::tempdir;

    fn pipeline_in(dir: &std::path::Path) -> SyncPipeline {
        let config = LoggerConfig {
            gate: LevelGate::new(LogLevel::None, LogLevel::Debug),
            file: FileSettings::new(dir, 0),
            format: FormatCache::compile("%{MESSAGE}"),
            truncate_filenames: true,
        };
        let terminal = TerminalAppender::with_writers(std::io::sink(), std::io::sink());
        SyncPipeline::new(Arc::new(PipelineCore::new(config, terminal)))
    }

    #[test]
    fn test_written_before_return() {
        let dir = tempdir().unwrap();
        let pipeline = pipeline_in(dir.path());
        let site = CallSite::new("src/a.rs", 3, "", "main");

        pipeline.on_new_message(Message::new(LogLevel::Info, "now".into(), &site, true)).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("log.txt")).unwrap(), "now\n");
        assert_eq!(pipeline.mode(), DeliveryMode::Sync);
        assert!(pipeline.shutdown(Duration::from_millis(1)));
    }

    #[test]
    fn test_concurrent_callers_do_not_interleave_lines() {
        let dir = tempdir().unwrap();
        let pipeline = Arc::new(pipeline_in(dir.path()));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let pipeline = Arc::clone(&pipeline);
                thread::spawn(move || {
                    let site = CallSite::new("t.rs", 1, "", "worker");
                    for i in 0..50 {
                        let text = format!("thread-{}-line-{}", t, i);
                        pipeline.on_new_message(Message::new(LogLevel::Info, text, &site, false)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(content.lines().count(), 200);
        assert!(content.lines().all(|l| l.starts_with("thread-") && l.contains("-line-")));
    }
}
