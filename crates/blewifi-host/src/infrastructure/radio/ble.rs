//! btleplug-backed implementation of [`RadioTransport`].
//!
//! Talks to the platform Bluetooth stack (BlueZ / CoreBluetooth / WinRT)
//! through btleplug's cross-platform central API. Scanning runs without a
//! service filter and matches on the application side: many embedded stacks
//! place 128-bit service UUIDs in the scan response rather than the primary
//! advertisement, where platform filters cannot see them.
//!
//! The adapter tracks the single live peripheral internally so that
//! `disconnect` can be issued by address alone, including after a connect
//! attempt that was cancelled by the caller's timeout.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, warn};
use uuid::Uuid;

use blewifi_core::protocol::messages::{UART_RX_CHAR_UUID, UART_SERVICE_UUID, UART_TX_CHAR_UUID};

use super::{AdvertisedDevice, DeviceAddress, RadioError, RadioTransport};

/// Capacity of the notification channel handed to the acknowledgment
/// listener. Acks are short and rare; backpressure here only ever drops
/// observability, never protocol progress.
const NOTIFY_CHANNEL_CAPACITY: usize = 64;

/// Production BLE central transport.
pub struct BtleplugRadio {
    adapter: Adapter,
    /// The single live link; the protocol never holds more than one.
    connected: Mutex<Option<Peripheral>>,
    /// Background task pumping the notification stream into the subscribe channel.
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl BtleplugRadio {
    /// Initialises the platform Bluetooth stack and claims the first adapter.
    ///
    /// # Errors
    ///
    /// Returns [`RadioError::Init`] when the stack cannot be reached and
    /// [`RadioError::NoAdapter`] when the host has no Bluetooth adapter.
    pub async fn new() -> Result<Self, RadioError> {
        let manager = Manager::new()
            .await
            .map_err(|e| RadioError::Init(e.to_string()))?;
        let adapters = manager
            .adapters()
            .await
            .map_err(|e| RadioError::Init(e.to_string()))?;
        let adapter = adapters.into_iter().next().ok_or(RadioError::NoAdapter)?;

        Ok(Self {
            adapter,
            connected: Mutex::new(None),
            pump: Mutex::new(None),
        })
    }

    /// Looks up a previously scanned peripheral by its platform id.
    async fn find_peripheral(&self, address: &DeviceAddress) -> Result<Peripheral, RadioError> {
        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|e| RadioError::Scan(e.to_string()))?;

        peripherals
            .into_iter()
            .find(|p| p.id().to_string() == address.as_str())
            .ok_or_else(|| RadioError::Connect {
                address: address.clone(),
                reason: "peripheral not known to the adapter; it may have stopped advertising"
                    .to_string(),
            })
    }

    /// Returns the live peripheral for `address`.
    async fn current(&self, address: &DeviceAddress) -> Result<Peripheral, RadioError> {
        let guard = self.connected.lock().await;
        match guard.as_ref() {
            Some(p) if p.id().to_string() == address.as_str() => Ok(p.clone()),
            _ => Err(RadioError::NotConnected(address.clone())),
        }
    }

    async fn stop_pump(&self) {
        if let Some(task) = self.pump.lock().await.take() {
            task.abort();
        }
    }
}

/// Finds a GATT characteristic by UUID on a connected peripheral.
fn find_characteristic(peripheral: &Peripheral, uuid: Uuid) -> Option<Characteristic> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == uuid)
}

#[async_trait]
impl RadioTransport for BtleplugRadio {
    async fn scan(&self, window: Duration) -> Result<Vec<AdvertisedDevice>, RadioError> {
        self.adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| RadioError::Scan(e.to_string()))?;
        time::sleep(window).await;

        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|e| RadioError::Scan(e.to_string()))?;

        let mut devices = Vec::new();
        for peripheral in peripherals {
            if let Some(props) = peripheral
                .properties()
                .await
                .map_err(|e| RadioError::Scan(e.to_string()))?
            {
                devices.push(AdvertisedDevice {
                    address: DeviceAddress::new(peripheral.id().to_string()),
                    local_name: props.local_name,
                    rssi: props.rssi,
                });
            }
        }

        self.adapter
            .stop_scan()
            .await
            .map_err(|e| RadioError::Scan(e.to_string()))?;
        Ok(devices)
    }

    async fn connect(&self, address: &DeviceAddress) -> Result<(), RadioError> {
        // A stale link from an aborted attempt must never survive into a new one.
        {
            let mut guard = self.connected.lock().await;
            if let Some(old) = guard.take() {
                debug!("dropping stale link to {} before new connect", old.id());
                let _ = old.disconnect().await;
            }
        }
        self.stop_pump().await;

        let peripheral = self.find_peripheral(address).await?;

        peripheral.connect().await.map_err(|e| RadioError::Connect {
            address: address.clone(),
            reason: e.to_string(),
        })?;

        if let Err(e) = peripheral.discover_services().await {
            let _ = peripheral.disconnect().await;
            return Err(RadioError::Connect {
                address: address.clone(),
                reason: format!("service discovery failed: {e}"),
            });
        }

        // The link is only usable if the peer exposes the UART service pair.
        if !peripheral.services().iter().any(|s| s.uuid == UART_SERVICE_UUID) {
            let _ = peripheral.disconnect().await;
            return Err(RadioError::Connect {
                address: address.clone(),
                reason: "peer does not expose the UART provisioning service".to_string(),
            });
        }
        for uuid in [UART_RX_CHAR_UUID, UART_TX_CHAR_UUID] {
            if find_characteristic(&peripheral, uuid).is_none() {
                let _ = peripheral.disconnect().await;
                return Err(RadioError::CharacteristicMissing(uuid));
            }
        }

        *self.connected.lock().await = Some(peripheral);
        Ok(())
    }

    async fn write(&self, address: &DeviceAddress, data: &[u8]) -> Result<(), RadioError> {
        let peripheral = self.current(address).await?;
        let rx_char = find_characteristic(&peripheral, UART_RX_CHAR_UUID)
            .ok_or(RadioError::CharacteristicMissing(UART_RX_CHAR_UUID))?;

        peripheral
            .write(&rx_char, data, WriteType::WithoutResponse)
            .await
            .map_err(|e| RadioError::Write(e.to_string()))
    }

    async fn subscribe(
        &self,
        address: &DeviceAddress,
    ) -> Result<mpsc::Receiver<Vec<u8>>, RadioError> {
        let peripheral = self.current(address).await?;
        let tx_char = find_characteristic(&peripheral, UART_TX_CHAR_UUID)
            .ok_or(RadioError::CharacteristicMissing(UART_TX_CHAR_UUID))?;

        peripheral
            .subscribe(&tx_char)
            .await
            .map_err(|e| RadioError::Subscribe(e.to_string()))?;

        // The notifications() stream is multiplexed across all subscribed
        // characteristics; forward only the UART TX payloads.
        let mut stream = peripheral
            .notifications()
            .await
            .map_err(|e| RadioError::Subscribe(e.to_string()))?;

        let (tx, rx) = mpsc::channel(NOTIFY_CHANNEL_CAPACITY);
        let pump = tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid != UART_TX_CHAR_UUID {
                    continue;
                }
                if tx.send(notification.value).await.is_err() {
                    // Listener gone; stop forwarding.
                    break;
                }
            }
            debug!("notification pump finished");
        });

        let mut guard = self.pump.lock().await;
        if let Some(old) = guard.replace(pump) {
            old.abort();
        }
        Ok(rx)
    }

    async fn unsubscribe(&self, address: &DeviceAddress) -> Result<(), RadioError> {
        let peripheral = self.current(address).await?;
        let tx_char = find_characteristic(&peripheral, UART_TX_CHAR_UUID)
            .ok_or(RadioError::CharacteristicMissing(UART_TX_CHAR_UUID))?;

        let result = peripheral
            .unsubscribe(&tx_char)
            .await
            .map_err(|e| RadioError::Subscribe(e.to_string()));
        self.stop_pump().await;
        result
    }

    async fn disconnect(&self, address: &DeviceAddress) -> Result<(), RadioError> {
        self.stop_pump().await;

        let peripheral = {
            let mut guard = self.connected.lock().await;
            let is_current = guard
                .as_ref()
                .is_some_and(|p| p.id().to_string() == address.as_str());
            if is_current {
                guard.take()
            } else {
                None
            }
        };

        match peripheral {
            Some(p) => p
                .disconnect()
                .await
                .map_err(|e| RadioError::Disconnect(e.to_string())),
            None => {
                // Nothing tracked for this address. A cancelled connect may
                // still have left the OS with a half-open link; sweep it.
                if let Ok(p) = self.find_peripheral(address).await {
                    if p.is_connected().await.unwrap_or(false) {
                        warn!("sweeping half-open link to {address}");
                        let _ = p.disconnect().await;
                    }
                }
                Ok(())
            }
        }
    }
}
