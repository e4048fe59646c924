//! Wire message format for credential transfer.
//!
//! Every credential field travels as one ASCII text line:
//!
//! ```text
//! LABEL:VALUE\n
//! ```
//!
//! `LABEL` is one of `SSID`, `PASSWORD`, `IP`; `VALUE` is the raw field with
//! no escaping. The line is UTF-8 encoded and fragmented by
//! [`crate::protocol::codec::chunk`] before transmission. The peer
//! reassembles by buffering until the terminating `\n`.

use std::fmt;

use uuid::Uuid;

// ── Protocol constants ────────────────────────────────────────────────────────

/// UART service exposed by provisionable devices (Nordic UART Service).
pub const UART_SERVICE_UUID: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);

/// Write characteristic: the host pushes credential bytes into this one.
pub const UART_RX_CHAR_UUID: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);

/// Notify characteristic: the device answers acknowledgment text on this one.
pub const UART_TX_CHAR_UUID: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/// Largest fragment written in one transport operation, in bytes.
///
/// Matches the minimum BLE ATT payload (23-byte MTU minus the 3-byte ATT
/// header), so chunked writes go through regardless of MTU negotiation.
pub const DEFAULT_CHUNK_SIZE: usize = 20;

// ── Field labels ──────────────────────────────────────────────────────────────

/// Label of one credential field, in the order it is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLabel {
    Ssid,
    Password,
    Ip,
}

impl FieldLabel {
    /// All labels in the fixed transmission order: SSID, PASSWORD, IP.
    pub const ALL: [FieldLabel; 3] = [FieldLabel::Ssid, FieldLabel::Password, FieldLabel::Ip];

    /// The wire spelling of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldLabel::Ssid => "SSID",
            FieldLabel::Password => "PASSWORD",
            FieldLabel::Ip => "IP",
        }
    }
}

impl fmt::Display for FieldLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encodes one labeled field as its wire line `LABEL:VALUE\n`, UTF-8.
///
/// The value is embedded verbatim – empty strings and multi-byte characters
/// are legal, and no escaping is applied.
pub fn encode_field(label: FieldLabel, value: &str) -> Vec<u8> {
    let mut line = Vec::with_capacity(label.as_str().len() + 1 + value.len() + 1);
    line.extend_from_slice(label.as_str().as_bytes());
    line.push(b':');
    line.extend_from_slice(value.as_bytes());
    line.push(b'\n');
    line
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_spell_their_wire_names() {
        assert_eq!(FieldLabel::Ssid.as_str(), "SSID");
        assert_eq!(FieldLabel::Password.as_str(), "PASSWORD");
        assert_eq!(FieldLabel::Ip.as_str(), "IP");
    }

    #[test]
    fn test_transmission_order_is_ssid_password_ip() {
        assert_eq!(
            FieldLabel::ALL,
            [FieldLabel::Ssid, FieldLabel::Password, FieldLabel::Ip]
        );
    }

    #[test]
    fn test_encode_field_produces_label_colon_value_newline() {
        assert_eq!(encode_field(FieldLabel::Ssid, "Home"), b"SSID:Home\n");
        assert_eq!(
            encode_field(FieldLabel::Password, "abc12345"),
            b"PASSWORD:abc12345\n"
        );
        assert_eq!(encode_field(FieldLabel::Ip, "192.168.1.5"), b"IP:192.168.1.5\n");
    }

    #[test]
    fn test_encode_field_known_message_lengths() {
        // The lengths the peer firmware is sized against.
        assert_eq!(encode_field(FieldLabel::Ssid, "Home").len(), 10);
        assert_eq!(encode_field(FieldLabel::Password, "abc12345").len(), 18);
    }

    #[test]
    fn test_encode_field_accepts_empty_value() {
        assert_eq!(encode_field(FieldLabel::Ssid, ""), b"SSID:\n");
    }

    #[test]
    fn test_encode_field_passes_unicode_through_unescaped() {
        // Arrange
        let value = "Caf\u{e9}-G\u{e4}ste";

        // Act
        let line = encode_field(FieldLabel::Ssid, value);

        // Assert – the value bytes appear verbatim between ':' and '\n'
        let expected = format!("SSID:{value}\n");
        assert_eq!(line, expected.as_bytes());
    }

    #[test]
    fn test_uart_uuids_are_the_nordic_uart_service() {
        assert_eq!(
            UART_SERVICE_UUID.to_string(),
            "6e400001-b5a3-f393-e0a9-e50e24dcca9e"
        );
        assert_eq!(
            UART_RX_CHAR_UUID.to_string(),
            "6e400002-b5a3-f393-e0a9-e50e24dcca9e"
        );
        assert_eq!(
            UART_TX_CHAR_UUID.to_string(),
            "6e400003-b5a3-f393-e0a9-e50e24dcca9e"
        );
    }
}
