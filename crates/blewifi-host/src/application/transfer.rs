//! Transfer session: sends one labeled credential field over a live link.
//!
//! The field is framed as `LABEL:VALUE\n`, carved into link-safe fragments,
//! and written in order. Consecutive fragments are spaced by a pacing delay
//! so slow peers can drain their UART buffer; after the final fragment a
//! longer settle delay gives the peer time to process the line and
//! optionally acknowledge. A failed write aborts the remaining fragments of
//! the message immediately – there is no partial-message retry at this
//! layer.

use std::time::Duration;

use thiserror::Error;
use tokio::time;
use tracing::debug;

use blewifi_core::protocol::codec::chunk;
use blewifi_core::protocol::messages::{encode_field, FieldLabel};

use crate::infrastructure::radio::{ConnectionHandle, RadioError, RadioTransport};

/// Error type for a failed field transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A fragment write failed; the rest of the message was not sent.
    #[error("write of {label} fragment {fragment}/{total} failed: {source}")]
    WriteFailed {
        label: FieldLabel,
        fragment: usize,
        total: usize,
        #[source]
        source: RadioError,
    },
}

/// Sends labeled fields over one live link with fixed pacing.
pub struct TransferSession<'a> {
    transport: &'a dyn RadioTransport,
    chunk_size: usize,
    inter_chunk_delay: Duration,
    settle_delay: Duration,
}

impl<'a> TransferSession<'a> {
    pub fn new(
        transport: &'a dyn RadioTransport,
        chunk_size: usize,
        inter_chunk_delay: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            transport,
            chunk_size,
            inter_chunk_delay,
            settle_delay,
        }
    }

    /// Frames, chunks, and writes one field, then waits out the settle delay.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::WriteFailed`] as soon as any fragment write
    /// fails; later fragments of the message are not attempted.
    pub async fn send(
        &self,
        handle: &ConnectionHandle,
        label: FieldLabel,
        value: &str,
    ) -> Result<(), TransferError> {
        let message = encode_field(label, value);
        let fragments: Vec<&[u8]> = chunk(&message, self.chunk_size).collect();
        let total = fragments.len();
        debug!(%label, bytes = message.len(), fragments = total, "sending field");

        for (index, fragment) in fragments.into_iter().enumerate() {
            if index > 0 {
                time::sleep(self.inter_chunk_delay).await;
            }
            self.transport
                .write(handle.address(), fragment)
                .await
                .map_err(|source| TransferError::WriteFailed {
                    label,
                    fragment: index + 1,
                    total,
                    source,
                })?;
        }

        time::sleep(self.settle_delay).await;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
