//! blewifi provisioning host entry point.
//!
//! Wires together the configuration, the credential source, the BLE radio
//! adapter, and the provisioning driver, then runs the unattended loop on
//! the Tokio async runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config() + validate()   -- startup preconditions, fatal on error
//!  └─ load_wifi_credentials()      -- fatal on error, never retried
//!  └─ BtleplugRadio::new()         -- platform Bluetooth stack
//!  └─ ProvisioningDriver::run()    -- discover → connect → transfer, forever
//! ```
//!
//! The process is meant to run unattended (systemd unit or boot script) and
//! provisions every matching device it ever sees; only Ctrl-C / SIGTERM or a
//! missing precondition ends it.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blewifi_core::CredentialPayload;
use blewifi_host::application::connection::ConnectionManager;
use blewifi_host::application::discovery::DiscoveryLoop;
use blewifi_host::application::provision::ProvisioningDriver;
use blewifi_host::infrastructure::credentials::load_wifi_credentials;
use blewifi_host::infrastructure::netinfo::local_ipv4;
use blewifi_host::infrastructure::radio::ble::BtleplugRadio;
use blewifi_host::infrastructure::radio::RadioTransport;
use blewifi_host::infrastructure::storage::config::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Startup preconditions: configuration and credentials. Both are fatal –
    // there is nothing to retry against without them.
    let config = load_config().context("failed to load configuration")?;
    config.validate().context("configuration is unusable")?;

    // Initialise structured logging.  The configured level is the default;
    // `RUST_LOG` overrides it.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.host.log_level.clone())),
        )
        .init();

    info!("blewifi provisioning host starting");

    let (ssid, password) = load_wifi_credentials(&config.credentials.wpa_supplicant_path)
        .context("wifi credentials are required to start")?;
    let ip = local_ipv4();
    let payload = CredentialPayload::new(ssid, password, ip);
    info!(
        "provisioning network {:?}, host address {}",
        payload.ssid(),
        payload.ip()
    );

    let transport: Arc<dyn RadioTransport> = Arc::new(
        BtleplugRadio::new()
            .await
            .context("bluetooth adapter is required to start")?,
    );

    // Shutdown flag shared with the driver and discovery loops.
    let running = Arc::new(AtomicBool::new(true));

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("shutdown signal received; finishing the current cycle");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    let driver = ProvisioningDriver::new(
        DiscoveryLoop::new(Arc::clone(&transport), config.discovery_config()),
        ConnectionManager::new(Arc::clone(&transport), config.connection_config()),
        payload,
    );

    info!(
        "ready; provisioning devices named {}* until stopped",
        config.device.name_prefix
    );
    driver.run(running).await;

    info!("blewifi provisioning host stopped");
    Ok(())
}
