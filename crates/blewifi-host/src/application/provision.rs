//! Provisioning driver: the unattended top-level loop.
//!
//! Forever: discover a device, run one connection attempt with the constant
//! credential payload, log the outcome, loop. No outcome changes the control
//! flow – success and failure alike lead back to discovery, with no backoff
//! beyond what discovery and the connection attempt already impose. The only
//! state carried across cycles is an iteration counter for diagnostics.
//!
//! The shared `running` flag is the injectable stop condition: tests and the
//! Ctrl-C handler clear it, and the loop winds down at the next checkpoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use blewifi_core::CredentialPayload;

use crate::application::connection::ConnectionManager;
use crate::application::discovery::DiscoveryLoop;

/// The top-level discover/connect/transfer loop.
pub struct ProvisioningDriver {
    discovery: DiscoveryLoop,
    connection: ConnectionManager,
    payload: CredentialPayload,
}

impl ProvisioningDriver {
    pub fn new(
        discovery: DiscoveryLoop,
        connection: ConnectionManager,
        payload: CredentialPayload,
    ) -> Self {
        Self {
            discovery,
            connection,
            payload,
        }
    }

    /// Runs provisioning cycles until `running` clears.
    pub async fn run(&self, running: Arc<AtomicBool>) {
        let mut iteration: u64 = 0;

        while running.load(Ordering::Relaxed) {
            iteration += 1;
            debug!(iteration, "starting provisioning cycle");

            let Some(address) = self.discovery.find_device(&running).await else {
                break;
            };

            let outcome = self.connection.provision_device(&address, &self.payload).await;
            if outcome.is_success() {
                info!(iteration, "cycle finished: {outcome} ({address})");
            } else {
                warn!(iteration, "cycle finished: {outcome} ({address})");
            }
        }

        info!("provisioning driver stopped after {iteration} cycles");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
