//! Infrastructure layer for the provisioning host.
//!
//! Contains OS-facing adapters: the BLE radio transport, file-system config
//! storage, the wpa_supplicant credential source, and the local-address probe.
//!
//! **Dependency rule**: the `application` layer sees this one only through
//! the [`radio::RadioTransport`] port and its data types. Adapter
//! implementations (`radio::ble`), config storage, and the credential source
//! are wired up exclusively in `main.rs`.

pub mod credentials;
pub mod netinfo;
pub mod radio;
pub mod storage;
