//! Connection manager: owns one physical connection attempt end to end.
//!
//! One attempt walks the phases
//!
//! ```text
//! Idle → Connecting → Connected → Sending → Disconnecting → Closed
//! ```
//!
//! with `TimedOut` and `Failed` as terminal classifications. A single
//! deadline (default 120 s) bounds the whole Connecting→Sending span; when it
//! elapses, the in-flight operation is abandoned and the attempt reports
//! [`Outcome::ConnectTimeout`] instead of completing silently.
//!
//! Invariants:
//! - at most one live link exists at a time process-wide; the
//!   [`ConnectionHandle`] is created only after a successful connect and is
//!   consumed by the release path,
//! - the release sequence (notifications off, listener stopped, disconnect)
//!   runs on *every* exit path, and its failures are logged, never escalated.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use blewifi_core::protocol::messages::{FieldLabel, DEFAULT_CHUNK_SIZE};
use blewifi_core::{CredentialPayload, Outcome};

use crate::application::acks::AckListener;
use crate::application::transfer::{TransferError, TransferSession};
use crate::infrastructure::radio::{ConnectionHandle, DeviceAddress, RadioTransport};

/// Tunables for one connection attempt.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Budget covering connect plus every send of the attempt.
    pub connection_timeout: Duration,
    /// Largest fragment per write.
    pub chunk_size: usize,
    /// Wait between consecutive fragments of one message.
    pub inter_chunk_delay: Duration,
    /// Wait after the final fragment of each message.
    pub settle_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(120),
            chunk_size: DEFAULT_CHUNK_SIZE,
            inter_chunk_delay: Duration::from_millis(100),
            settle_delay: Duration::from_secs(3),
        }
    }
}

/// Progress of one attempt, tracked for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Connecting,
    Connected,
    Sending,
    Disconnecting,
    Closed,
    TimedOut,
    Failed,
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!(from = ?*phase, to = ?next, "connection phase");
    *phase = next;
}

/// Runs one connection attempt at a time against a discovered device.
pub struct ConnectionManager {
    transport: Arc<dyn RadioTransport>,
    config: ConnectionConfig,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn RadioTransport>, config: ConnectionConfig) -> Self {
        Self { transport, config }
    }

    /// Runs one full attempt against `address`: connect under the deadline,
    /// enable notifications, send SSID, PASSWORD, and IP in that order, and
    /// release the link. Never returns before the link is released.
    pub async fn provision_device(
        &self,
        address: &DeviceAddress,
        payload: &CredentialPayload,
    ) -> Outcome {
        let deadline = Instant::now() + self.config.connection_timeout;
        let mut phase = Phase::Idle;

        advance(&mut phase, Phase::Connecting);
        match time::timeout_at(deadline, self.transport.connect(address)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!("connect to {address} failed: {e}");
                advance(&mut phase, Phase::Failed);
                return Outcome::ConnectError;
            }
            Err(_) => {
                warn!(
                    "connect to {address} did not finish within {:?}",
                    self.config.connection_timeout
                );
                advance(&mut phase, Phase::TimedOut);
                // The cancelled connect may have left a half-open link behind.
                self.disconnect_quietly(address).await;
                return Outcome::ConnectTimeout;
            }
        }
        advance(&mut phase, Phase::Connected);
        let handle = ConnectionHandle::new(address.clone());
        info!("connected to {address}");

        // Notifications go on before the first write so even the SSID ack is
        // observable.
        let listener = match self.transport.subscribe(handle.address()).await {
            Ok(notifications) => AckListener::spawn(notifications),
            Err(e) => {
                warn!("enabling notifications on {address} failed: {e}");
                advance(&mut phase, Phase::Failed);
                self.disconnect_quietly(address).await;
                return Outcome::ConnectError;
            }
        };

        advance(&mut phase, Phase::Sending);
        let sent = time::timeout_at(deadline, self.send_all(&handle, payload)).await;

        let outcome = match sent {
            Ok(Ok(())) => Outcome::Success,
            Ok(Err(e)) => {
                warn!("transfer to {address} aborted: {e}");
                advance(&mut phase, Phase::Failed);
                Outcome::TransferError
            }
            Err(_) => {
                warn!("connection budget exhausted mid-transfer to {address}");
                advance(&mut phase, Phase::TimedOut);
                Outcome::ConnectTimeout
            }
        };

        advance(&mut phase, Phase::Disconnecting);
        self.release(handle, listener).await;
        advance(&mut phase, Phase::Closed);

        if outcome.is_success() {
            info!("credentials delivered to {address}");
        }
        outcome
    }

    /// Sends every field in the fixed wire order; the first failure aborts
    /// the remaining fields.
    async fn send_all(
        &self,
        handle: &ConnectionHandle,
        payload: &CredentialPayload,
    ) -> Result<(), TransferError> {
        let session = TransferSession::new(
            self.transport.as_ref(),
            self.config.chunk_size,
            self.config.inter_chunk_delay,
            self.config.settle_delay,
        );
        for label in FieldLabel::ALL {
            session.send(handle, label, payload.field(label)).await?;
        }
        Ok(())
    }

    /// Releases one live link: notifications off, listener stopped, link
    /// closed. Consumes the handle – after this, the link cannot be touched.
    async fn release(&self, handle: ConnectionHandle, listener: AckListener) {
        let address = handle.address().clone();
        if let Err(e) = self.transport.unsubscribe(&address).await {
            debug!("disabling notifications on {address} failed: {e}");
        }
        listener.stop();
        self.disconnect_quietly(&address).await;
    }

    async fn disconnect_quietly(&self, address: &DeviceAddress) {
        if let Err(e) = self.transport.disconnect(address).await {
            warn!("disconnect from {address} failed: {e}; treating the link as released");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
