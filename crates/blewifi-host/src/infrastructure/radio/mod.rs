//! Radio transport port for the provisioning host.
//!
//! The application layer drives the radio exclusively through the
//! [`RadioTransport`] trait: one bounded scan cycle, connect, characteristic
//! writes, notification subscription, disconnect. The production
//! implementation ([`ble::BtleplugRadio`]) talks to the platform Bluetooth
//! stack; tests inject [`mock::MockRadio`] to script every behavior.
//!
//! All transport methods are keyed by [`DeviceAddress`] rather than by a
//! connection object so that a connect attempt cancelled by the overall
//! timeout can still be torn down: the manager issues a best-effort
//! `disconnect(addr)` even when it never received a handle.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

pub mod ble;
pub mod mock;

/// Error type for radio transport operations.
#[derive(Debug, Error)]
pub enum RadioError {
    /// The platform Bluetooth stack could not be initialised.
    #[error("bluetooth stack initialisation failed: {0}")]
    Init(String),
    /// No Bluetooth adapter is present on this host.
    #[error("no bluetooth adapter found")]
    NoAdapter,
    /// A scan cycle could not be started or completed.
    #[error("scan failed: {0}")]
    Scan(String),
    /// The connect call failed at the transport level.
    #[error("failed to connect to {address}: {reason}")]
    Connect { address: DeviceAddress, reason: String },
    /// An operation required a live link to the device but none is open.
    #[error("device {0} is not connected")]
    NotConnected(DeviceAddress),
    /// The peer does not expose the expected characteristic.
    #[error("characteristic {0} not found on device")]
    CharacteristicMissing(Uuid),
    /// A characteristic write was rejected or the link dropped mid-write.
    #[error("write failed: {0}")]
    Write(String),
    /// Enabling or disabling notifications failed.
    #[error("subscription failed: {0}")]
    Subscribe(String),
    /// The disconnect call itself failed; the link is treated as released.
    #[error("disconnect failed: {0}")]
    Disconnect(String),
}

/// Opaque identifier of a discovered radio peer.
///
/// Wraps the platform-specific peripheral id string. Produced by a scan
/// cycle, consumed by one connection attempt; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One peer seen during a scan cycle.
#[derive(Debug, Clone)]
pub struct AdvertisedDevice {
    pub address: DeviceAddress,
    /// The advertised local name, absent for peers that do not include one.
    pub local_name: Option<String>,
    pub rssi: Option<i16>,
}

/// Evidence of one live link, created by the connection manager after a
/// successful connect and consumed when the link is released.
///
/// The handle is a linear token: methods that need the link borrow it, and
/// the release path takes it by value, so using a link after disconnect is a
/// compile error. At most one handle exists at a time process-wide.
#[derive(Debug)]
pub struct ConnectionHandle {
    address: DeviceAddress,
}

impl ConnectionHandle {
    pub(crate) fn new(address: DeviceAddress) -> Self {
        Self { address }
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }
}

/// Trait abstracting the BLE central role.
///
/// The production implementation uses btleplug; tests use
/// [`mock::MockRadio`].
#[async_trait]
pub trait RadioTransport: Send + Sync {
    /// Runs one bounded scan cycle and returns every peer seen in it.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::Scan`] when the cycle could not run; an empty
    /// result is not an error.
    async fn scan(&self, window: Duration) -> Result<Vec<AdvertisedDevice>, RadioError>;

    /// Opens a link to `address` and prepares the UART service for use.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::Connect`] on transport-level failure and
    /// [`RadioError::CharacteristicMissing`] when the peer lacks the UART
    /// characteristics.
    async fn connect(&self, address: &DeviceAddress) -> Result<(), RadioError>;

    /// Writes one fragment to the peer's UART write characteristic.
    async fn write(&self, address: &DeviceAddress, data: &[u8]) -> Result<(), RadioError>;

    /// Enables notifications on the UART notify characteristic and returns a
    /// channel of raw notification payloads. The channel closes when the
    /// subscription ends or the link drops.
    async fn subscribe(
        &self,
        address: &DeviceAddress,
    ) -> Result<mpsc::Receiver<Vec<u8>>, RadioError>;

    /// Disables notifications on the UART notify characteristic.
    async fn unsubscribe(&self, address: &DeviceAddress) -> Result<(), RadioError>;

    /// Closes the link to `address`. Idempotent: disconnecting an address
    /// that is not connected is a no-op, so a timed-out connect attempt can
    /// always be torn down best-effort.
    async fn disconnect(&self, address: &DeviceAddress) -> Result<(), RadioError>;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
