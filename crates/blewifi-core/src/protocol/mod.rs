//! Protocol module containing the field message format and the chunking codec.

pub mod codec;
pub mod messages;

pub use codec::{chunk, decode_ack, ProtocolError};
pub use messages::*;
