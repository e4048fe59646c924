//! Integration tests for the provisioning lifecycle.
//!
//! # Purpose
//!
//! These tests exercise the connection manager and the driver through their
//! *public* API, the same way `main.rs` uses them, with a scripted
//! [`MockRadio`] standing in for the Bluetooth stack. They verify:
//!
//! - The happy path: a discovered device receives `SSID:`, `PASSWORD:`, and
//!   `IP:` lines in order, each as link-sized fragments, and the link is
//!   released afterwards.
//! - Pacing: a long password is carved into 20-byte fragments spaced by the
//!   inter-chunk delay, with the settle delay after every message.
//! - The timeout path: a connect that never completes ends the attempt with
//!   `ConnectTimeout`, no write is ever issued, and discovery resumes.
//! - The abort path: a failed SSID write prevents the PASSWORD and IP sends
//!   while unsubscribe/disconnect still run exactly once.
//!
//! # Virtual time
//!
//! All tests run under `start_paused = true`: Tokio's clock auto-advances
//! whenever every task is idle, so the 120-second connection budget and the
//! multi-second settle delays elapse instantly while remaining exact – the
//! recorded write instants can be compared for equality, not approximately.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use blewifi_core::{CredentialPayload, Outcome};
use blewifi_host::application::connection::{ConnectionConfig, ConnectionManager};
use blewifi_host::application::discovery::{DiscoveryConfig, DiscoveryLoop};
use blewifi_host::application::provision::ProvisioningDriver;
use blewifi_host::infrastructure::radio::mock::{ConnectBehavior, MockEvent, MockRadio};
use blewifi_host::infrastructure::radio::DeviceAddress;

const PACING: Duration = Duration::from_millis(100);
const SETTLE: Duration = Duration::from_secs(3);

fn test_config() -> ConnectionConfig {
    ConnectionConfig {
        connection_timeout: Duration::from_secs(120),
        chunk_size: 20,
        inter_chunk_delay: PACING,
        settle_delay: SETTLE,
    }
}

fn home_payload() -> CredentialPayload {
    CredentialPayload::new("Home", "abc12345", "192.168.1.5")
}

// ── Scenario: short fields, one fragment each ─────────────────────────────────

/// Each field of a short payload fits one fragment; the peer sees exactly
/// three writes, in wire order, and the link is torn down afterwards.
#[tokio::test(start_paused = true)]
async fn test_short_payload_is_delivered_as_three_messages_in_order() {
    // Arrange
    let radio = Arc::new(MockRadio::new());
    let manager = ConnectionManager::new(radio.clone(), test_config());

    // Act
    let outcome = manager
        .provision_device(&DeviceAddress::new("dev-1"), &home_payload())
        .await;

    // Assert
    assert_eq!(outcome, Outcome::Success);
    assert_eq!(
        radio.written_payloads(),
        vec![
            b"SSID:Home\n".to_vec(),
            b"PASSWORD:abc12345\n".to_vec(),
            b"IP:192.168.1.5\n".to_vec(),
        ]
    );
    assert_eq!(
        radio.events(),
        vec![
            MockEvent::Connect,
            MockEvent::Subscribe,
            MockEvent::Unsubscribe,
            MockEvent::Disconnect,
        ]
    );
}

// ── Scenario: long password, paced fragments ──────────────────────────────────

/// A 40-character password makes a 49-byte message: fragments of 20/20/9
/// bytes spaced by the pacing delay, with the settle delay separating the
/// messages around it.
#[tokio::test(start_paused = true)]
async fn test_long_password_is_fragmented_and_paced() {
    // Arrange
    let radio = Arc::new(MockRadio::new());
    let manager = ConnectionManager::new(radio.clone(), test_config());
    let payload = CredentialPayload::new("Home", "p".repeat(40), "192.168.1.5");

    // Act
    let outcome = manager
        .provision_device(&DeviceAddress::new("dev-1"), &payload)
        .await;

    // Assert – fragment sizes: SSID, then 20/20/9 for PASSWORD, then IP
    assert_eq!(outcome, Outcome::Success);
    let sizes: Vec<usize> = radio.written_payloads().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![10, 20, 20, 9, 15]);

    // The reassembled password message is byte-exact.
    let payloads = radio.written_payloads();
    assert_eq!(
        payloads[1..4].concat(),
        format!("PASSWORD:{}\n", "p".repeat(40)).into_bytes()
    );

    // Timing: settle after each message, pacing between password fragments.
    let at = radio.write_instants();
    assert_eq!(at[1] - at[0], SETTLE);
    assert_eq!(at[2] - at[1], PACING);
    assert_eq!(at[3] - at[2], PACING);
    assert_eq!(at[4] - at[3], SETTLE);
}

// ── Scenario: connect never completes ─────────────────────────────────────────

/// A connect that hangs past the budget yields `ConnectTimeout`, no write is
/// ever attempted, and the half-open link is swept.
#[tokio::test(start_paused = true)]
async fn test_hanging_connect_times_out_without_writes() {
    // Arrange
    let radio = Arc::new(MockRadio::new());
    radio.set_connect_behavior(ConnectBehavior::Hang);
    let manager = ConnectionManager::new(radio.clone(), test_config());

    // Act
    let outcome = manager
        .provision_device(&DeviceAddress::new("dev-1"), &home_payload())
        .await;

    // Assert
    assert_eq!(outcome, Outcome::ConnectTimeout);
    assert!(radio.written_payloads().is_empty());
    assert_eq!(radio.event_count(MockEvent::Subscribe), 0);
    assert_eq!(radio.event_count(MockEvent::Disconnect), 1);
}

/// After a timed-out attempt the driver goes straight back to scanning.
#[tokio::test(start_paused = true)]
async fn test_driver_rescans_after_a_connect_timeout() {
    // Arrange – the same hanging device shows up cycle after cycle
    let radio = Arc::new(MockRadio::new());
    radio.set_connect_behavior(ConnectBehavior::Hang);
    radio.push_scan_cycle(vec![MockRadio::advertised("dev-1", "LICN-0042")]);
    radio.push_scan_cycle(vec![MockRadio::advertised("dev-1", "LICN-0042")]);

    let driver = ProvisioningDriver::new(
        DiscoveryLoop::new(radio.clone(), DiscoveryConfig::default()),
        ConnectionManager::new(radio.clone(), test_config()),
        home_payload(),
    );
    let running = Arc::new(AtomicBool::new(true));

    // Act – enough virtual time for two full timed-out cycles
    let _ = tokio::time::timeout(Duration::from_secs(300), driver.run(running)).await;

    // Assert – discovery ran again after the first timeout, still no writes
    assert!(radio.scan_count() >= 2, "driver must return to discovery");
    assert!(radio.event_count(MockEvent::Connect) >= 2);
    assert!(radio.written_payloads().is_empty());
}

// ── Scenario: first write fails ───────────────────────────────────────────────

/// A failed SSID write aborts the attempt: PASSWORD and IP are never sent,
/// and the release sequence still runs exactly once.
#[tokio::test(start_paused = true)]
async fn test_failed_ssid_write_skips_remaining_fields_and_releases_once() {
    // Arrange
    let radio = Arc::new(MockRadio::new());
    radio.push_write_result(Err("characteristic rejected the write".to_string()));
    let manager = ConnectionManager::new(radio.clone(), test_config());

    // Act
    let outcome = manager
        .provision_device(&DeviceAddress::new("dev-1"), &home_payload())
        .await;

    // Assert
    assert_eq!(outcome, Outcome::TransferError);
    assert!(
        radio.written_payloads().is_empty(),
        "no fragment may be delivered after the SSID write fails"
    );
    assert_eq!(radio.event_count(MockEvent::Unsubscribe), 1);
    assert_eq!(radio.event_count(MockEvent::Disconnect), 1);
}

// ── Scenario: device found on a later cycle ───────────────────────────────────

/// Discovery skips foreign names and empty cycles until the wanted device
/// advertises, then the whole payload goes out.
#[tokio::test(start_paused = true)]
async fn test_device_found_on_a_later_cycle_is_provisioned() {
    // Arrange – cycle 1: strangers only; cycle 2: the device appears
    let radio = Arc::new(MockRadio::new());
    radio.push_scan_cycle(vec![MockRadio::advertised("dev-9", "Speaker-99")]);
    radio.push_scan_cycle(vec![
        MockRadio::advertised("dev-9", "Speaker-99"),
        MockRadio::advertised("dev-1", "LICN-0042"),
    ]);

    let discovery = DiscoveryLoop::new(radio.clone(), DiscoveryConfig::default());
    let manager = ConnectionManager::new(radio.clone(), test_config());
    let running = AtomicBool::new(true);

    // Act
    let address = discovery
        .find_device(&running)
        .await
        .expect("device appears on the second cycle");
    let outcome = manager.provision_device(&address, &home_payload()).await;

    // Assert
    assert_eq!(address, DeviceAddress::new("dev-1"));
    assert_eq!(radio.scan_count(), 2);
    assert_eq!(outcome, Outcome::Success);
    assert_eq!(radio.written_payloads().len(), 3);
}
