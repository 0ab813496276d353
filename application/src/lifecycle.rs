//! Session lifecycle — wiring, shutdown ordering, and failure accounting.
//!
//! [`SessionEngine`] owns one conversation with the agent service. It wires
//! the bridge queue, turn controller, and event dispatcher to a transport
//! and runs two background tasks:
//!
//! - the **outbound pump**, which drains the bridge and writes to the
//!   transport, attaching the session id once known
//! - the **dispatcher task**, which consumes inbound events
//!
//! # Shutdown ordering
//!
//! [`shutdown`](SessionEngine::shutdown) first stops the bridge (no new
//! outbound messages, suspended producers resolve), then signals transport
//! cancellation bounded by a grace period, then waits for the background
//! tasks with the same bound, aborting any that overstay. Each step is
//! bounded, so shutdown always completes.

use crate::bridge::BridgeQueue;
use crate::dispatcher::EventDispatcher;
use crate::ports::history::HistorySink;
use crate::ports::renderer::Renderer;
use crate::ports::transport::AgentTransport;
use crate::turn::{TurnController, TurnFault};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tether_domain::{OutboundMessage, SessionStats};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Counts consecutive transport faults against a threshold.
///
/// The dispatcher resets the counter on every successful turn, so only an
/// unbroken run of failures trips the threshold. Crossing it never forces
/// termination; it only flips [`exceeded`](Self::exceeded) so the caller
/// can advise ending the session.
pub struct FaultMeter {
    count: AtomicU32,
    threshold: u32,
}

impl FaultMeter {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: AtomicU32::new(0),
            threshold,
        }
    }

    pub fn record(&self) {
        let seen = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("FaultMeter: {} consecutive transport fault(s)", seen);
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    pub fn exceeded(&self) -> bool {
        self.threshold > 0 && self.count.load(Ordering::Relaxed) >= self.threshold
    }
}

/// Tunables for a [`SessionEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Bound on how long a turn may run without a terminal event.
    /// `None` disables the deadline.
    pub turn_deadline: Option<Duration>,
    /// Bound on each step of shutdown and on interrupt delivery.
    pub shutdown_grace: Duration,
    /// Consecutive transport faults after which ending the session is
    /// advised. `0` disables the advice.
    pub transport_error_threshold: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            turn_deadline: None,
            shutdown_grace: Duration::from_secs(2),
            transport_error_threshold: 3,
        }
    }
}

/// One live conversation with the agent service.
pub struct SessionEngine {
    bridge: Arc<BridgeQueue>,
    turn: Arc<TurnController>,
    transport: Arc<dyn AgentTransport>,
    faults: Arc<FaultMeter>,
    session_rx: watch::Receiver<Option<String>>,
    stats_rx: watch::Receiver<SessionStats>,
    shutdown_grace: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionEngine {
    /// Wire the engine to a transport and start its background tasks.
    pub fn start(
        transport: Arc<dyn AgentTransport>,
        renderer: Arc<dyn Renderer>,
        history: Arc<dyn HistorySink>,
        options: EngineOptions,
    ) -> Arc<Self> {
        let bridge = Arc::new(BridgeQueue::new());
        let turn = Arc::new(TurnController::new());
        let faults = Arc::new(FaultMeter::new(options.transport_error_threshold));

        let dispatcher = EventDispatcher::new(
            Arc::clone(&turn),
            renderer,
            history,
            Arc::clone(&faults),
        );
        let session_rx = dispatcher.session_watch();
        let stats_rx = dispatcher.stats_watch();

        let pump = tokio::spawn(outbound_pump(
            Arc::clone(&bridge),
            Arc::clone(&transport),
            Arc::clone(&turn),
            Arc::clone(&faults),
            session_rx.clone(),
        ));
        let reader = tokio::spawn(dispatcher.run(Arc::clone(&transport), options.turn_deadline));

        Arc::new(Self {
            bridge,
            turn,
            transport,
            faults,
            session_rx,
            stats_rx,
            shutdown_grace: options.shutdown_grace,
            tasks: Mutex::new(vec![pump, reader]),
        })
    }

    /// Submit one user message, beginning a turn.
    ///
    /// Waits until the previous turn (if any) has ended, then enqueues the
    /// message on the bridge. Returns a fault left over from a turn that
    /// failed while nobody was waiting, so the caller can report it.
    pub async fn submit(&self, text: impl Into<String>) -> Option<TurnFault> {
        let stale = self.turn.begin_turn().await;
        self.bridge.push(OutboundMessage::text(text));
        stale
    }

    /// Wait for the in-flight turn to end. Returns the fault if it was
    /// aborted rather than completed.
    pub async fn wait_turn(&self) -> Option<TurnFault> {
        self.turn.wait_for_idle().await
    }

    /// Interrupt the in-flight turn (user-initiated).
    ///
    /// Signals cancellation, bounded by the grace period, then force-clears
    /// the turn so the caller regains control even if the agent never
    /// acknowledges.
    pub async fn interrupt(&self) {
        info!("Engine: interrupt requested");
        match tokio::time::timeout(self.shutdown_grace, self.transport.cancel()).await {
            Ok(Ok(())) => debug!("Engine: cancellation delivered"),
            Ok(Err(error)) => warn!("Engine: cancellation failed: {}", error),
            Err(_) => warn!("Engine: cancellation not acknowledged within grace period"),
        }
        self.turn.force_clear(TurnFault::Cancelled);
    }

    /// Shut the session down. Idempotent; every step is bounded.
    pub async fn shutdown(&self) {
        info!("Engine: shutting down");
        self.bridge.stop();

        if tokio::time::timeout(self.shutdown_grace, self.transport.cancel())
            .await
            .is_err()
        {
            warn!("Engine: cancellation not acknowledged within grace period");
        }

        let handles: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => Vec::new(),
        };
        for mut handle in handles {
            if tokio::time::timeout(self.shutdown_grace, &mut handle)
                .await
                .is_err()
            {
                warn!("Engine: background task did not finish in time, aborting");
                handle.abort();
            }
        }
        debug!("Engine: shutdown complete");
    }

    /// Session id assigned by the agent service, once known.
    pub fn session_id(&self) -> Option<String> {
        self.session_rx.borrow().clone()
    }

    /// Cumulative statistics over completed turns.
    pub fn stats(&self) -> SessionStats {
        *self.stats_rx.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.turn.is_busy()
    }

    /// Whether consecutive transport faults crossed the configured
    /// threshold. Advisory only; the session keeps running.
    pub fn shutdown_advised(&self) -> bool {
        self.faults.exceeded()
    }
}

/// Drains the bridge queue into the transport.
///
/// Attaches the session id to messages submitted before it was known. A
/// failed send force-clears the turn so the submitter is not left waiting
/// on a reply that cannot come.
async fn outbound_pump(
    bridge: Arc<BridgeQueue>,
    transport: Arc<dyn AgentTransport>,
    turn: Arc<TurnController>,
    faults: Arc<FaultMeter>,
    session_rx: watch::Receiver<Option<String>>,
) {
    loop {
        let Some(mut message) = bridge.pull().await else {
            break;
        };
        if message.session_id.is_none()
            && let Some(id) = session_rx.borrow().clone()
        {
            message.session_id = Some(id);
        }
        if let Err(error) = transport.send(&message).await {
            warn!("Pump: send failed: {}", error);
            faults.record();
            turn.force_clear(TurnFault::Transport(error.to_string()));
        }
    }
    debug!("Pump: outbound feed ended");
}
