//! Turn controller — single-in-flight-turn semantics.
//!
//! A turn is one complete user-message-to-agent-response cycle. Exactly one
//! may be in flight: the busy flag is raised by
//! [`TurnController::begin_turn`] and lowered by the event dispatcher when
//! the terminal turn-result event arrives, or by
//! [`TurnController::force_clear`] when the transport fails mid-turn so the
//! input loop can never deadlock on a dead connection.
//!
//! State lives in a `tokio::sync::watch` channel: mutation happens only
//! through this controller's narrow operations, while any number of tasks
//! can observe the busy flag (the dispatcher's per-turn deadline does).

use std::fmt;
use tokio::sync::watch;

/// Why a turn was cleared without its terminal event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnFault {
    /// The transport failed while the turn was in flight.
    Transport(String),
    /// The per-turn deadline elapsed without a terminal event.
    Timeout,
    /// The user interrupted the turn.
    Cancelled,
}

impl fmt::Display for TurnFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnFault::Transport(message) => write!(f, "transport failed: {message}"),
            TurnFault::Timeout => write!(f, "turn timed out"),
            TurnFault::Cancelled => write!(f, "turn cancelled"),
        }
    }
}

/// Observable turn state. Read-only outside this module — mutation goes
/// through [`TurnController`]'s operations.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    pub busy: bool,
    pub fault: Option<TurnFault>,
}

/// Serializes conversation turns.
pub struct TurnController {
    state: watch::Sender<TurnState>,
}

impl TurnController {
    pub fn new() -> Self {
        let (state, _) = watch::channel(TurnState::default());
        Self { state }
    }

    /// Begin a turn, suspending while another is in flight.
    ///
    /// Policy: a second caller BLOCKS until the queue's single producer can
    /// proceed, rather than being rejected — the input loop wants
    /// backpressure, not retry logic. Returns the fault recorded by
    /// [`force_clear`](Self::force_clear) if one cleared the previous turn,
    /// taken at most once.
    pub async fn begin_turn(&self) -> Option<TurnFault> {
        let mut rx = self.state.subscribe();
        loop {
            let mut taken = None;
            let mut acquired = false;
            self.state.send_if_modified(|state| {
                if state.busy {
                    return false;
                }
                state.busy = true;
                taken = state.fault.take();
                acquired = true;
                true
            });
            if acquired {
                return taken;
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    /// End the current turn. Idempotent.
    pub fn end_turn(&self) {
        self.state.send_if_modified(|state| {
            if state.busy {
                state.busy = false;
                true
            } else {
                false
            }
        });
    }

    /// Clear busy unconditionally and record `fault` for the input loop.
    ///
    /// Called by the event dispatcher (or the outbound pump) when the
    /// transport fails, the deadline fires, or the user cancels mid-turn.
    pub fn force_clear(&self, fault: TurnFault) {
        self.state.send_modify(|state| {
            state.busy = false;
            state.fault = Some(fault);
        });
    }

    /// Suspend until no turn is in flight.
    ///
    /// Delivers the recorded fault, if any, taken at most once.
    pub async fn wait_for_idle(&self) -> Option<TurnFault> {
        let mut rx = self.state.subscribe();
        loop {
            let mut idle = false;
            let mut taken = None;
            self.state.send_if_modified(|state| {
                if state.busy {
                    return false;
                }
                idle = true;
                if state.fault.is_some() {
                    taken = state.fault.take();
                    true
                } else {
                    false
                }
            });
            if idle {
                return taken;
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Whether a turn is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    /// Subscribe to turn-state changes (read-only observation).
    pub fn subscribe(&self) -> watch::Receiver<TurnState> {
        self.state.subscribe()
    }
}

impl Default for TurnController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn busy_for_the_whole_turn_interval() {
        let turn = TurnController::new();
        assert!(!turn.is_busy());
        turn.begin_turn().await;
        assert!(turn.is_busy());
        turn.end_turn();
        assert!(!turn.is_busy());
    }

    #[tokio::test]
    async fn end_turn_is_idempotent() {
        let turn = TurnController::new();
        turn.begin_turn().await;
        turn.end_turn();
        turn.end_turn();
        assert!(!turn.is_busy());
    }

    #[tokio::test]
    async fn second_begin_waits_until_idle() {
        let turn = Arc::new(TurnController::new());
        turn.begin_turn().await;

        let second = {
            let turn = Arc::clone(&turn);
            tokio::spawn(async move { turn.begin_turn().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!second.is_finished());

        turn.end_turn();
        second.await.unwrap();
        assert!(turn.is_busy());
    }

    #[tokio::test]
    async fn force_clear_unblocks_waiter_and_delivers_fault() {
        let turn = Arc::new(TurnController::new());
        turn.begin_turn().await;

        let waiter = {
            let turn = Arc::clone(&turn);
            tokio::spawn(async move { turn.wait_for_idle().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        turn.force_clear(TurnFault::Transport("connection reset".to_string()));

        let fault = waiter.await.unwrap();
        assert_eq!(fault, Some(TurnFault::Transport("connection reset".to_string())));
        assert!(!turn.is_busy());
    }

    #[tokio::test]
    async fn fault_is_taken_at_most_once() {
        let turn = TurnController::new();
        turn.force_clear(TurnFault::Timeout);
        assert_eq!(turn.wait_for_idle().await, Some(TurnFault::Timeout));
        assert_eq!(turn.wait_for_idle().await, None);
    }

    #[tokio::test]
    async fn begin_turn_surfaces_stale_fault() {
        let turn = TurnController::new();
        turn.begin_turn().await;
        turn.force_clear(TurnFault::Cancelled);
        // The next turn starts, carrying the previous turn's fault
        assert_eq!(turn.begin_turn().await, Some(TurnFault::Cancelled));
        assert!(turn.is_busy());
    }
}
