//! Activity detector — classifies the user as active or idle.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use huddle_core::config::presence::PresenceConfig;
use huddle_entity::presence::PresenceState;

use crate::context::ClientContext;
use crate::dispatcher::PresenceDispatcher;

/// A qualifying input event, debounced at the source (at most one signal
/// per ~200 ms reaches the detector).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    /// Pointer movement.
    Pointer,
    /// Key press.
    Key,
    /// Wheel or scroll.
    Wheel,
    /// Touch.
    Touch,
    /// Visibility change.
    Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Idle,
}

/// Watches the input event stream and emits soft presence transitions.
///
/// Runs as a single cooperative task: one idle deadline, one heartbeat
/// throttle, no background threads. Emissions are suppressed entirely
/// while the locally known state is sticky, so no needless traffic is
/// generated for a user who chose an override.
#[derive(Debug)]
pub struct ActivityDetector {
    /// Idle threshold and resend interval.
    config: PresenceConfig,
    /// Shared client state.
    context: Arc<ClientContext>,
    /// Outbound presence events.
    dispatcher: Arc<PresenceDispatcher>,
}

impl ActivityDetector {
    /// Create a detector over the shared context and dispatcher.
    pub fn new(
        config: PresenceConfig,
        context: Arc<ClientContext>,
        dispatcher: Arc<PresenceDispatcher>,
    ) -> Self {
        Self {
            config,
            context,
            dispatcher,
        }
    }

    /// Consume the signal stream until it closes or cancellation fires.
    ///
    /// The user starts out active; the first idle transition happens one
    /// idle threshold after the last qualifying signal.
    pub async fn run(&self, mut signals: mpsc::Receiver<ActivitySignal>, cancel: CancellationToken) {
        let idle_threshold = self.config.idle_threshold();
        let resend_interval = self.config.min_resend_interval();

        let mut phase = Phase::Active;
        let mut deadline = Instant::now() + idle_threshold;
        let mut last_sent = Instant::now();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe_signal = signals.recv() => {
                    let Some(signal) = maybe_signal else { break };
                    trace!(signal = ?signal, "Activity signal");
                    deadline = Instant::now() + idle_threshold;

                    match phase {
                        Phase::Idle => {
                            phase = Phase::Active;
                            self.emit(PresenceState::Online).await;
                            last_sent = Instant::now();
                        }
                        Phase::Active => {
                            // Heartbeat throttle: at most one refreshed
                            // "still online" per resend interval.
                            if last_sent.elapsed() >= resend_interval {
                                self.emit(PresenceState::Online).await;
                                last_sent = Instant::now();
                            }
                        }
                    }
                }
                _ = time::sleep_until(deadline), if phase == Phase::Active => {
                    phase = Phase::Idle;
                    self.emit(PresenceState::Away).await;
                }
            }
        }
        debug!("Activity detector stopped");
    }

    /// Emit a soft transition unless the locally known state is sticky.
    async fn emit(&self, state: PresenceState) {
        let local = self.context.local_state().await;
        if local.is_sticky() {
            trace!(
                suppressed = %state,
                local = %local,
                "Soft emission suppressed by sticky state"
            );
            return;
        }
        self.context.set_local_state(state).await;
        self.dispatcher.dispatch_soft(state).await;
    }
}
