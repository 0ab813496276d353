//! Bridge queue — push-to-pull adapter for the outbound message feed.
//!
//! The input loop pushes discrete [`OutboundMessage`]s at arbitrary times;
//! the outbound transport feed wants to pull them one at a time as a
//! continuous sequence. [`BridgeQueue`] sits between the two: if a consumer
//! is suspended waiting, a push resolves that wait immediately; otherwise
//! the message is buffered in FIFO order.
//!
//! Uses `std::sync::Mutex` (not `tokio::sync::Mutex`) around the
//! buffer/waiter state: the lock is only held for queue transitions, never
//! across an await, and `push`/`stop` must stay callable from synchronous
//! contexts. Suspended consumers are parked on `oneshot` channels resolved
//! in FIFO order.

use std::collections::VecDeque;
use std::sync::Mutex;
use tether_domain::OutboundMessage;
use tokio::sync::oneshot;
use tracing::{debug, info};

struct QueueState {
    buffer: VecDeque<OutboundMessage>,
    waiters: VecDeque<oneshot::Sender<Option<OutboundMessage>>>,
    stopped: bool,
}

/// FIFO queue bridging push-style producers to a single pulling consumer.
///
/// Once [`stop`](Self::stop) has been called and the buffer drained, the
/// sequence is finite: every further [`pull`](Self::pull) returns `None`
/// and the queue cannot be reopened.
pub struct BridgeQueue {
    state: Mutex<QueueState>,
}

impl BridgeQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                buffer: VecDeque::new(),
                waiters: VecDeque::new(),
                stopped: false,
            }),
        }
    }

    /// Enqueue a message. Never blocks.
    ///
    /// If a consumer is currently suspended in [`pull`](Self::pull), the
    /// oldest such waiter is resolved immediately with this message;
    /// otherwise the message is appended to the buffer. After
    /// [`stop`](Self::stop) this is a logged no-op.
    pub fn push(&self, message: OutboundMessage) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.stopped {
            debug!("Bridge: push after stop, dropping message");
            return;
        }

        let mut message = message;
        // Hand to the oldest live waiter; a waiter whose receiver was
        // dropped returns the message so we can try the next one.
        while let Some(waiter) = state.waiters.pop_front() {
            match waiter.send(Some(message)) {
                Ok(()) => return,
                Err(rejected) => match rejected {
                    Some(returned) => message = returned,
                    None => return,
                },
            }
        }

        state.buffer.push_back(message);
    }

    /// Pull the next message, suspending while the queue is empty.
    ///
    /// Returns the oldest buffered message immediately when one is
    /// available, `None` when the queue is stopped and empty (end of
    /// stream), and otherwise suspends until the next [`push`](Self::push)
    /// or [`stop`](Self::stop).
    pub async fn pull(&self) -> Option<OutboundMessage> {
        let receiver = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(message) = state.buffer.pop_front() {
                return Some(message);
            }
            if state.stopped {
                return None;
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };

        // Sender dropped without resolving means the queue was torn down;
        // treat it as end of stream.
        receiver.await.unwrap_or(None)
    }

    /// Stop the queue. Idempotent.
    ///
    /// Every consumer currently suspended in [`pull`](Self::pull) is
    /// resolved with `None` exactly once; later pulls return `None`
    /// synchronously once the buffer is drained.
    pub fn stop(&self) {
        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.stopped {
                return;
            }
            state.stopped = true;
            std::mem::take(&mut state.waiters)
        };

        info!("Bridge: stopped ({} suspended consumer(s) released)", waiters.len());
        for waiter in waiters {
            let _ = waiter.send(None);
        }
    }

    /// True once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .stopped
    }
}

impl Default for BridgeQueue {
    fn default() -> Self {
        Self::new()
    }
}
