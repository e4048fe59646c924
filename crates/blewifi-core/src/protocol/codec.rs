//! Chunking codec and acknowledgment decoding.
//!
//! The transport can move at most a fixed number of bytes per write, so an
//! encoded message is carved into contiguous fragments in original byte
//! order with no fragment header. Reassembly on the peer side is implicit:
//! it buffers until it sees the `\n` terminator of the message line.

use thiserror::Error;

/// Errors that can occur while decoding device-originated data.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// A notification payload was not valid UTF-8.
    #[error("notification is not valid UTF-8 (invalid byte at offset {offset})")]
    InvalidUtf8 { offset: usize },
}

/// Splits `bytes` into link-safe fragments of at most `max_len` bytes.
///
/// Fragments are contiguous, non-overlapping, and preserve byte order; only
/// the final fragment may be shorter than `max_len`. Concatenating the
/// fragments reproduces `bytes` exactly.
///
/// `max_len >= 1` is a precondition. It is enforced once at startup by
/// configuration validation; a zero value here panics.
pub fn chunk(bytes: &[u8], max_len: usize) -> impl Iterator<Item = &[u8]> {
    assert!(max_len >= 1, "chunk size must be at least 1");
    bytes.chunks(max_len)
}

/// Decodes a device notification payload as UTF-8 text.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidUtf8`] when the payload is not valid
/// UTF-8. Callers log and swallow this – a malformed acknowledgment never
/// fails the surrounding connection.
pub fn decode_ack(payload: &[u8]) -> Result<String, ProtocolError> {
    String::from_utf8(payload.to_vec()).map_err(|e| ProtocolError::InvalidUtf8 {
        offset: e.utf8_error().valid_up_to(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
