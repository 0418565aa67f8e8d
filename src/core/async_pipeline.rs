//! Asynchronous delivery through a dedicated worker thread
//!
//! Callers only append to an in-memory queue. The worker wakes on new
//! messages, takes the whole queue as one batch and writes it with the file
//! held open for the duration of the batch.

use super::delivery::{DeliveryMode, DeliveryPipeline, PipelineCore, DEFAULT_SHUTDOWN_TIMEOUT};
use super::error::{LoggerError, Result};
use super::message::Message;
use super::metrics::should_alert;
use super::renderer::Renderer;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const WORKER_THREAD_NAME: &str = "pipeline-logger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Running,
    /// No new messages accepted; worker finishes the queue and exits
    Draining,
    /// Drain abandoned; worker exits after its current batch
    Stopped,
}

struct QueueState {
    messages: VecDeque<Message>,
    state: WorkerState,
    /// Worker holds a batch that is not fully written yet
    writing: bool,
}

struct Shared {
    queue: Mutex<QueueState>,
    new_message: Condvar,
    drained: Condvar,
    core: Arc<PipelineCore>,
}

impl Shared {
    fn is_idle(queue: &QueueState) -> bool {
        queue.messages.is_empty() && !queue.writing
    }
}

/// Pipeline that hands messages to a background worker.
///
/// Order is preserved per producer thread. Once shutdown begins, new
/// messages are refused with [`LoggerError::LoggerStopped`].
pub struct AsyncPipeline {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncPipeline {
    pub(crate) fn new(core: Arc<PipelineCore>) -> Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                messages: VecDeque::new(),
                state: WorkerState::Running,
                writing: false,
            }),
            new_message: Condvar::new(),
            drained: Condvar::new(),
            core,
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker_loop(&worker_shared))
            .map_err(|e| {
                LoggerError::io_operation("spawning log worker", "Failed to start worker thread", e)
            })?;

        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Number of messages waiting for the worker.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().messages.len()
    }

    fn join_worker(&self) -> bool {
        let Some(handle) = self.worker.lock().take() else {
            return true;
        };
        if handle.thread().id() == thread::current().id() {
            // Shutdown requested from a sink running on the worker itself
            return true;
        }
        if let Err(e) = handle.join() {
            eprintln!("[LOGGER ERROR] Async worker thread panicked during shutdown: {:?}", e);
            return false;
        }
        true
    }
}

fn worker_loop(shared: &Shared) {
    let mut renderer = Renderer::new();

    loop {
        let batch = {
            let mut queue = shared.queue.lock();
            while queue.messages.is_empty() && queue.state == WorkerState::Running {
                shared.new_message.wait(&mut queue);
            }
            if queue.messages.is_empty() || queue.state == WorkerState::Stopped {
                break;
            }
            queue.writing = true;
            mem::take(&mut queue.messages)
        };

        // A panicking sink must not take the worker down with it
        let result = catch_unwind(AssertUnwindSafe(|| {
            shared.core.deliver_batch(batch, &mut renderer);
        }));
        if result.is_err() {
            let previous = shared.core.metrics().record_sink_failure();
            if should_alert(previous) {
                eprintln!("[LOGGER ERROR] Sink panicked while writing a batch; batch discarded");
            }
        }

        shared.queue.lock().writing = false;
        shared.drained.notify_all();
    }

    shared.drained.notify_all();
}

impl DeliveryPipeline for AsyncPipeline {
    fn on_new_message(&self, message: Message) -> Result<()> {
        let mut queue = self.shared.queue.lock();
        if queue.state != WorkerState::Running {
            return Err(LoggerError::LoggerStopped);
        }
        queue.messages.push_back(message);
        drop(queue);
        self.shared.new_message.notify_one();
        Ok(())
    }

    fn wait_for_log_to_be_written(&self) {
        let mut queue = self.shared.queue.lock();
        while !Shared::is_idle(&queue) && queue.state != WorkerState::Stopped {
            self.shared.drained.wait(&mut queue);
        }
    }

    fn shutdown(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        let drained = {
            let mut queue = self.shared.queue.lock();
            if queue.state == WorkerState::Running {
                queue.state = WorkerState::Draining;
            }
            self.shared.new_message.notify_all();

            loop {
                if Shared::is_idle(&queue) {
                    break true;
                }
                if queue.state == WorkerState::Stopped {
                    break false;
                }
                if self.shared.drained.wait_until(&mut queue, deadline).timed_out()
                    && !Shared::is_idle(&queue)
                {
                    queue.state = WorkerState::Stopped;
                    let lost = queue.messages.len();
                    queue.messages.clear();
                    for _ in 0..lost {
                        self.shared.core.metrics().record_dropped();
                    }
                    self.shared.new_message.notify_all();
                    self.shared.drained.notify_all();
                    eprintln!("{}", drain_timeout_warning(timeout, lost, queue.writing));
                    break false;
                }
            }
        };

        if !drained {
            // Detach: the worker exits on its own once its current batch is done
            self.worker.lock().take();
            return false;
        }

        let joined = self.join_worker();
        self.shared.core.flush();
        joined
    }

    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Async
    }
}

impl Drop for AsyncPipeline {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

fn drain_timeout_warning(timeout: Duration, discarded: usize, in_flight: bool) -> String {
    let mut warning = format!(
        "[LOGGER WARNING] Async worker thread did not finish within {:?} timeout. \
         {} queued logs discarded",
        timeout, discarded
    );
    if in_flight {
        warning.push_str("; in-flight batch continues");
    }
    warning.push('.');
    warning
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
    use std::io::{self, Write};
    use tempfile::tempdir;

    fn core_in(dir: &std::path::Path, terminal: TerminalAppender, gate: LevelGate) -> Arc<PipelineCore> {
        let config = LoggerConfig {
            gate,
            file: FileSettings::new(dir, 0),
            format: FormatCache::compile("%{MESSAGE}"),
            truncate_filenames: false,
        };
        Arc::new(PipelineCore::new(config, terminal))
    }

    fn quiet_terminal() -> TerminalAppender {
        TerminalAppender::with_writers(io::sink(), io::sink())
    }

    fn message(text: String) -> Message {
        Message::new(LogLevel::Info, text, &CallSite::new("t.rs", 1, "", "f"), false)
    }

    struct SlowWriter(Duration);

    impl Write for SlowWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            thread::sleep(self.0);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_fifo_order() {
        let dir = tempdir().unwrap();
        let core = core_in(dir.path(), quiet_terminal(), LevelGate::new(LogLevel::None, LogLevel::Debug));
        let pipeline = AsyncPipeline::new(core).unwrap();

        for i in 0..500 {
            pipeline.on_new_message(message(format!("m{}", i))).unwrap();
        }
        pipeline.wait_for_log_to_be_written();

        let content = fs::read_to_string(dir.path().join("log.txt")).unwrap();
        let expected: Vec<String> = (0..500).map(|i| format!("m{}", i)).collect();
        assert_eq!(content.lines().collect::<Vec<_>>(), expected);
        assert_eq!(pipeline.mode(), DeliveryMode::Async);
    }

    #[test]
    fn test_wait_is_idempotent_when_idle() {
        let dir = tempdir().unwrap();
        let core = core_in(dir.path(), quiet_terminal(), LevelGate::default());
        let pipeline = AsyncPipeline::new(core).unwrap();

        pipeline.wait_for_log_to_be_written();
        pipeline.wait_for_log_to_be_written();
        assert_eq!(pipeline.pending(), 0);
    }

    #[test]
    fn test_shutdown_refuses_new_messages() {
        let dir = tempdir().unwrap();
        let core = core_in(dir.path(), quiet_terminal(), LevelGate::new(LogLevel::None, LogLevel::Debug));
        let pipeline = AsyncPipeline::new(Arc::clone(&core)).unwrap();

        pipeline.on_new_message(message("before".into())).unwrap();
        assert!(pipeline.shutdown(Duration::from_secs(5)));
        assert!(matches!(
            pipeline.on_new_message(message("after".into())),
            Err(LoggerError::LoggerStopped)
        ));

        let content = fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(content, "before\n");
        assert_eq!(core.metrics().delivered_count(), 1);

        // Second shutdown is a no-op
        assert!(pipeline.shutdown(Duration::from_millis(10)));
    }

    #[test]
    fn test_drop_drains_queue() {
        let dir = tempdir().unwrap();
        let core = core_in(dir.path(), quiet_terminal(), LevelGate::new(LogLevel::None, LogLevel::Debug));
        {
            let pipeline = AsyncPipeline::new(core).unwrap();
            for i in 0..100 {
                pipeline.on_new_message(message(format!("d{}", i))).unwrap();
            }
        }

        let content = fs::read_to_string(dir.path().join("log.txt")).unwrap();
        assert_eq!(content.lines().count(), 100);
    }

    #[test]
    fn test_shutdown_times_out_on_slow_sink() {
        let dir = tempdir().unwrap();
        let terminal = TerminalAppender::with_writers(SlowWriter(Duration::from_millis(50)), io::sink());
        let core = core_in(dir.path(), terminal, LevelGate::new(LogLevel::Debug, LogLevel::None));
        let pipeline = AsyncPipeline::new(Arc::clone(&core)).unwrap();

        for i in 0..40 {
            pipeline.on_new_message(message(format!("slow{}", i))).unwrap();
        }

        assert!(!pipeline.shutdown(Duration::from_millis(20)));
        // Waiting after an abandoned drain must not hang
        pipeline.wait_for_log_to_be_written();
        assert!(core.metrics().delivered_count() < 40);
    }

    #[test]
    fn test_drain_timeout_warning_names_in_flight_batch() {
        let timeout = Duration::from_millis(20);

        let warning = drain_timeout_warning(timeout, 0, true);
        assert!(warning.contains("0 queued logs discarded; in-flight batch continues."));
        assert!(!warning.contains("lost"));

        let warning = drain_timeout_warning(timeout, 12, false);
        assert!(warning.ends_with("12 queued logs discarded."));
        assert!(warning.starts_with("[LOGGER WARNING]"));
    }
}
