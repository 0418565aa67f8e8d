//! Fan-out of raw messages to subscribed listeners
//!
//! The registry holds only weak handles. A listener disappears from the
//! registry once its last external `Arc` is dropped or once it reports itself
//! inactive; pruning is lazy and happens on the next notified message.

use super::message::Message;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Receiver of raw (unrendered) messages.
pub trait LogsListener: Send + Sync {
    /// Called on the logging thread for every message that passed a level gate.
    fn new_message(&self, message: &Message);

    /// Explicit liveness flag; an inactive listener is pruned at the next sweep.
    fn is_active(&self) -> bool {
        true
    }
}

/// Ordered set of weakly-held listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Weak<dyn LogsListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `listener`; adding the same listener twice is a no-op.
    pub fn add(&self, listener: &Arc<dyn LogsListener>) {
        let handle = Arc::downgrade(listener);
        let mut listeners = self.listeners.lock();
        if !listeners.iter().any(|l| Weak::ptr_eq(l, &handle)) {
            listeners.push(handle);
        }
    }

    /// Unsubscribe `listener`. Returns whether it was registered.
    pub fn remove(&self, listener: &Arc<dyn LogsListener>) -> bool {
        let handle = Arc::downgrade(listener);
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| !Weak::ptr_eq(l, &handle));
        listeners.len() != before
    }

    /// Number of registered handles, including ones not yet pruned.
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Drop dead handles, then deliver `message` to every live listener.
    ///
    /// Listeners are called outside the registry lock so they may add or
    /// remove listeners themselves.
    pub fn notify(&self, message: &Message) {
        let live: Vec<Arc<dyn LogsListener>> = {
            let mut listeners = self.listeners.lock();
            if listeners.is_empty() {
                return;
            }
            let mut live = Vec::with_capacity(listeners.len());
            listeners.retain(|handle| match handle.upgrade() {
                Some(listener) if listener.is_active() => {
                    live.push(listener);
                    true
                }
                _ => false,
            });
            live
        };

        for listener in live {
            listener.new_message(message);
        }
    }
}

/// Listener that buffers messages in a channel for later polling.
///
/// # Example
///
/// ```
/// use pipeline_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .min_file_level(LogLevel::None)
///     .build()
///     .unwrap();
///
/// let listener = Arc::new(ChannelListener::new());
/// let handle: Arc<dyn LogsListener> = listener.clone();
/// logger.add_listener(&handle);
///
/// logger.info("captured");
/// assert_eq!(listener.pop_message().unwrap().text, "captured");
/// ```
pub struct ChannelListener {
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    active: AtomicBool,
}

impl ChannelListener {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            active: AtomicBool::new(true),
        }
    }

    /// Oldest buffered message, if any.
    pub fn pop_message(&self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }

    pub fn has_messages(&self) -> bool {
        !self.receiver.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Receiving end, for consumers that want to block on new messages.
    pub fn receiver(&self) -> &Receiver<Message> {
        &self.receiver
    }

    /// Stop receiving; the registry prunes this listener on its next sweep.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

impl Default for ChannelListener {
    fn default() -> Self {
        Self::new()
    }
}

impl LogsListener for ChannelListener {
    fn new_message(&self, message: &Message) {
        // Both ends live in self, so the channel cannot be disconnected here
        let _ = self.sender.send(message.clone());
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
