//! Acknowledgment listener: observes device-originated notifications.
//!
//! Devices answer each credential line with short UART text
//! (`"SSID OK"`, `"WIFI CONNECTED"`, …). The listener runs as a background
//! task for the lifetime of one connection and logs what arrives; it never
//! gates protocol progress – acks are best-effort, and a slow or malformed
//! notification must not stall sending.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use blewifi_core::protocol::codec::decode_ack;

/// Background observer of one connection's notification channel.
pub struct AckListener {
    task: JoinHandle<()>,
}

impl AckListener {
    /// Starts observing. The task ends on its own when the channel closes
    /// (unsubscribe or link drop).
    pub fn spawn(mut notifications: mpsc::Receiver<Vec<u8>>) -> Self {
        let task = tokio::spawn(async move {
            while let Some(payload) = notifications.recv().await {
                match decode_ack(&payload) {
                    Ok(text) => info!("device says: {:?}", text.trim_end()),
                    // Malformed acks are dropped, never escalated.
                    Err(e) => warn!("ignoring undecodable {}-byte notification: {e}", payload.len()),
                }
            }
            debug!("notification channel closed");
        });
        Self { task }
    }

    /// Stops observation; pending notifications are dropped.
    pub fn stop(self) {
        self.task.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
