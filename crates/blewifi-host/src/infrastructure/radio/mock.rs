//! Mock radio transport for unit and integration testing.
//!
//! Allows tests to script scan results, connect behavior, and per-write
//! outcomes without any Bluetooth hardware, and records every call the
//! application layer makes so ordering and exactly-once properties can be
//! asserted.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{AdvertisedDevice, DeviceAddress, RadioError, RadioTransport};

/// How a scripted `connect` call behaves.
#[derive(Debug, Clone)]
pub enum ConnectBehavior {
    /// Connect succeeds immediately.
    Succeed,
    /// Connect fails with the given transport reason.
    Fail(String),
    /// Connect never completes (exercises the overall timeout).
    Hang,
}

/// One recorded lifecycle call, in the order it was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    Connect,
    Subscribe,
    Unsubscribe,
    Disconnect,
}

/// A scriptable, recording implementation of [`RadioTransport`].
pub struct MockRadio {
    /// Scan results handed out cycle by cycle; an exhausted script scans empty.
    scan_script: Mutex<VecDeque<Vec<AdvertisedDevice>>>,
    connect_behavior: Mutex<ConnectBehavior>,
    /// Write outcomes handed out call by call; an exhausted script succeeds.
    write_script: Mutex<VecDeque<Result<(), String>>>,
    events: Mutex<Vec<MockEvent>>,
    writes: Mutex<Vec<(Vec<u8>, Instant)>>,
    scan_count: Mutex<u32>,
    notify_tx: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    subscribe_failure: Mutex<Option<String>>,
}

impl MockRadio {
    pub fn new() -> Self {
        Self {
            scan_script: Mutex::new(VecDeque::new()),
            connect_behavior: Mutex::new(ConnectBehavior::Succeed),
            write_script: Mutex::new(VecDeque::new()),
            events: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            scan_count: Mutex::new(0),
            notify_tx: Mutex::new(None),
            subscribe_failure: Mutex::new(None),
        }
    }

    /// Convenience: a device advertising `name` at address `id`.
    pub fn advertised(id: &str, name: &str) -> AdvertisedDevice {
        AdvertisedDevice {
            address: DeviceAddress::new(id),
            local_name: Some(name.to_string()),
            rssi: Some(-60),
        }
    }

    /// Queues the result of the next scan cycle. Call repeatedly to script
    /// consecutive cycles.
    pub fn push_scan_cycle(&self, devices: Vec<AdvertisedDevice>) {
        self.scan_script.lock().expect("lock poisoned").push_back(devices);
    }

    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        *self.connect_behavior.lock().expect("lock poisoned") = behavior;
    }

    /// Queues the outcome of the next write call.
    pub fn push_write_result(&self, result: Result<(), String>) {
        self.write_script.lock().expect("lock poisoned").push_back(result);
    }

    /// Makes every subsequent subscribe call fail with `reason`
    /// (`None` restores success).
    pub fn set_subscribe_failure(&self, reason: Option<String>) {
        *self.subscribe_failure.lock().expect("lock poisoned") = reason;
    }

    /// Injects a device notification, as if the peer had answered.
    ///
    /// Returns `false` when no subscription is active.
    pub async fn notify(&self, payload: Vec<u8>) -> bool {
        let tx = self.notify_tx.lock().expect("lock poisoned").clone();
        match tx {
            Some(tx) => tx.send(payload).await.is_ok(),
            None => false,
        }
    }

    /// The payload bytes of every write, in call order.
    pub fn written_payloads(&self) -> Vec<Vec<u8>> {
        self.writes
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|(bytes, _)| bytes.clone())
            .collect()
    }

    /// The instant of every write, in call order.
    pub fn write_instants(&self) -> Vec<Instant> {
        self.writes
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }

    /// Every lifecycle call (connect/subscribe/unsubscribe/disconnect) in order.
    pub fn events(&self) -> Vec<MockEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    pub fn event_count(&self, event: MockEvent) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }

    pub fn scan_count(&self) -> u32 {
        *self.scan_count.lock().expect("lock poisoned")
    }

    fn record(&self, event: MockEvent) {
        self.events.lock().expect("lock poisoned").push(event);
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RadioTransport for MockRadio {
    async fn scan(&self, _window: Duration) -> Result<Vec<AdvertisedDevice>, RadioError> {
        *self.scan_count.lock().expect("lock poisoned") += 1;
        let next = self.scan_script.lock().expect("lock poisoned").pop_front();
        Ok(next.unwrap_or_default())
    }

    async fn connect(&self, address: &DeviceAddress) -> Result<(), RadioError> {
        self.record(MockEvent::Connect);
        let behavior = self.connect_behavior.lock().expect("lock poisoned").clone();
        match behavior {
            ConnectBehavior::Succeed => Ok(()),
            ConnectBehavior::Fail(reason) => Err(RadioError::Connect {
                address: address.clone(),
                reason,
            }),
            ConnectBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
        }
    }

    async fn write(&self, _address: &DeviceAddress, data: &[u8]) -> Result<(), RadioError> {
        let scripted = self.write_script.lock().expect("lock poisoned").pop_front();
        match scripted.unwrap_or(Ok(())) {
            Ok(()) => {
                self.writes
                    .lock()
                    .expect("lock poisoned")
                    .push((data.to_vec(), Instant::now()));
                Ok(())
            }
            Err(reason) => Err(RadioError::Write(reason)),
        }
    }

    async fn subscribe(
        &self,
        _address: &DeviceAddress,
    ) -> Result<mpsc::Receiver<Vec<u8>>, RadioError> {
        if let Some(reason) = self.subscribe_failure.lock().expect("lock poisoned").clone() {
            return Err(RadioError::Subscribe(reason));
        }
        self.record(MockEvent::Subscribe);
        let (tx, rx) = mpsc::channel(64);
        *self.notify_tx.lock().expect("lock poisoned") = Some(tx);
        Ok(rx)
    }

    async fn unsubscribe(&self, _address: &DeviceAddress) -> Result<(), RadioError> {
        self.record(MockEvent::Unsubscribe);
        *self.notify_tx.lock().expect("lock poisoned") = None;
        Ok(())
    }

    async fn disconnect(&self, _address: &DeviceAddress) -> Result<(), RadioError> {
        self.record(MockEvent::Disconnect);
        *self.notify_tx.lock().expect("lock poisoned") = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_mock_radio_scan_script_plays_in_order_then_runs_dry() {
        // Arrange
        let radio = MockRadio::new();
        radio.push_scan_cycle(vec![]);
        radio.push_scan_cycle(vec![MockRadio::advertised("dev-1", "LICN-0042")]);

        // Act / Assert
        assert!(radio.scan(Duration::from_secs(1)).await.unwrap().is_empty());
        let second = radio.scan(Duration::from_secs(1)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].local_name.as_deref(), Some("LICN-0042"));
        // Exhausted script keeps scanning empty rather than erroring.
        assert!(radio.scan(Duration::from_secs(1)).await.unwrap().is_empty());
        assert_eq!(radio.scan_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_radio_records_writes_and_scripted_failures() {
        // Arrange
        let radio = MockRadio::new();
        let addr = DeviceAddress::new("dev-1");
        radio.push_write_result(Ok(()));
        radio.push_write_result(Err("link dropped".to_string()));

        // Act
        assert_ok!(radio.write(&addr, b"first").await);
        let failed = radio.write(&addr, b"second").await;

        // Assert – the failed write is not recorded as delivered
        assert!(matches!(failed, Err(RadioError::Write(_))));
        assert_eq!(radio.written_payloads(), vec![b"first".to_vec()]);
    }

    #[tokio::test]
    async fn test_mock_radio_notify_requires_subscription() {
        let radio = MockRadio::new();
        let addr = DeviceAddress::new("dev-1");

        assert!(!radio.notify(b"early".to_vec()).await);

        let mut rx = radio.subscribe(&addr).await.unwrap();
        assert!(radio.notify(b"WIFI OK\n".to_vec()).await);
        assert_eq!(rx.recv().await.unwrap(), b"WIFI OK\n".to_vec());

        radio.unsubscribe(&addr).await.unwrap();
        assert!(!radio.notify(b"late".to_vec()).await);
        // Sender dropped on unsubscribe, so the channel drains then closes.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_mock_radio_event_log_preserves_call_order() {
        let radio = MockRadio::new();
        let addr = DeviceAddress::new("dev-1");

        radio.connect(&addr).await.unwrap();
        let _rx = radio.subscribe(&addr).await.unwrap();
        radio.unsubscribe(&addr).await.unwrap();
        radio.disconnect(&addr).await.unwrap();

        assert_eq!(
            radio.events(),
            vec![
                MockEvent::Connect,
                MockEvent::Subscribe,
                MockEvent::Unsubscribe,
                MockEvent::Disconnect,
            ]
        );
        assert_eq!(radio.event_count(MockEvent::Disconnect), 1);
    }
}
