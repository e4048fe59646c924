//! Device discovery: bounded scan cycles until a provisionable peer appears.
//!
//! Each cycle scans for a fixed window, then checks every advertised name
//! against the configured prefix. The first match wins and is returned
//! immediately. An empty cycle is expected, not an error – the loop waits
//! out the inter-scan delay and tries again, indefinitely, until the shared
//! stop flag clears. Scan-level transport errors are likewise logged and
//! retried; discovery has no terminal failure state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tracing::{info, warn};

use crate::infrastructure::radio::{AdvertisedDevice, DeviceAddress, RadioTransport};

/// Tunables for the discovery loop.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Advertised-name prefix identifying provisionable devices.
    pub device_prefix: String,
    /// Length of one scan cycle.
    pub scan_window: Duration,
    /// Wait between an empty cycle and the next scan.
    pub scan_interval: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            device_prefix: "LICN".to_string(),
            scan_window: Duration::from_secs(10),
            scan_interval: Duration::from_secs(5),
        }
    }
}

/// Scans until a matching device appears or the process is stopped.
pub struct DiscoveryLoop {
    transport: Arc<dyn RadioTransport>,
    config: DiscoveryConfig,
}

impl DiscoveryLoop {
    pub fn new(transport: Arc<dyn RadioTransport>, config: DiscoveryConfig) -> Self {
        Self { transport, config }
    }

    /// Returns the address of the first device whose advertised name starts
    /// with the configured prefix, or `None` once `running` clears.
    pub async fn find_device(&self, running: &AtomicBool) -> Option<DeviceAddress> {
        info!("scanning for devices named {}*", self.config.device_prefix);

        while running.load(Ordering::Relaxed) {
            match self.transport.scan(self.config.scan_window).await {
                Ok(devices) => {
                    if let Some(device) = first_match(&devices, &self.config.device_prefix) {
                        let name = device.local_name.as_deref().unwrap_or_default();
                        info!("found {name} ({})", device.address);
                        return Some(device.address.clone());
                    }
                    info!(
                        "no {}* devices found; rescanning in {:?}",
                        self.config.device_prefix, self.config.scan_interval
                    );
                }
                Err(e) => {
                    warn!(
                        "scan cycle failed: {e}; retrying in {:?}",
                        self.config.scan_interval
                    );
                }
            }
            time::sleep(self.config.scan_interval).await;
        }
        None
    }
}

/// The first device advertising a name with the wanted prefix. Peers without
/// a name never match.
fn first_match<'a>(devices: &'a [AdvertisedDevice], prefix: &str) -> Option<&'a AdvertisedDevice> {
    devices
        .iter()
        .find(|d| d.local_name.as_deref().is_some_and(|name| name.starts_with(prefix)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
