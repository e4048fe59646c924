//! # blewifi-core
//!
//! Shared library for the blewifi provisioning system containing the wire
//! protocol (message framing, chunking, acknowledgment decoding) and the
//! credential domain types.
//!
//! This crate is used by the provisioning host application and by its
//! integration tests. It has zero dependencies on OS APIs, radio stacks, or
//! async runtimes.
//!
//! # Protocol overview
//!
//! A headless device advertises a name with a known prefix and exposes a
//! UART-style GATT service: one write characteristic the host pushes bytes
//! into, and one notify characteristic the device answers on. The host sends
//! the WiFi credentials as three labeled text lines:
//!
//! ```text
//! SSID:HomeNetwork\n
//! PASSWORD:hunter2abc\n
//! IP:192.168.1.5\n
//! ```
//!
//! Each line is UTF-8 encoded and split into fragments of at most
//! [`protocol::messages::DEFAULT_CHUNK_SIZE`] bytes, written in order with no
//! fragment header. The peer reassembles by buffering until it sees the
//! terminating newline.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `blewifi_core::CredentialPayload` instead of the full module path.
pub use domain::credentials::CredentialPayload;
pub use domain::outcome::Outcome;
pub use protocol::codec::{chunk, decode_ack, ProtocolError};
pub use protocol::messages::{encode_field, FieldLabel};
