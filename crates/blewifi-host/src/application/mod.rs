//! Application layer use cases for the provisioning host.
//!
//! Use cases in this layer orchestrate core types to fulfil the provisioning
//! goal, depend on the radio only through the
//! [`crate::infrastructure::radio::RadioTransport`] port, and contain no
//! direct OS, file-system, or Bluetooth-stack calls.
//!
//! # Sub-modules
//!
//! - **`discovery`**  – Repeated bounded scan cycles locating a device whose
//!   advertised name carries the provisioning prefix.
//!
//! - **`connection`** – One connection attempt: connect under an overall
//!   deadline, enable notifications, run the three field transfers in order,
//!   and release the link on every exit path. The most critical use case –
//!   it owns the only live link the process ever holds.
//!
//! - **`transfer`**   – Sends one labeled credential field as a chunked,
//!   paced message.
//!
//! - **`acks`**       – Background listener logging device acknowledgments;
//!   purely observational, never gates progress.
//!
//! - **`provision`**  – The unattended top-level loop: discover, provision,
//!   log the outcome, repeat.

pub mod acks;
pub mod connection;
pub mod discovery;
pub mod provision;
pub mod transfer;
