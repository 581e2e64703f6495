//! Framing for the API mode of serial radio modules.
//!
//! Every frame on the wire looks like this, with everything after START
//! optionally byte-stuffed:
//!
//! ```text
//! START (0x7E) | LENGTH (u16 BE) | DATA[0..LENGTH] | CHECKSUM
//! ```
//!
//! `DATA` is a command or response record laid out by a [`Registry`] of field
//! schemas. [`ApiConnection`] ties the pieces to a byte source and sink:
//!
//! ```rust,ignore
//! let mut conn = ApiConnection::new(tx, rx, &IEEE802154);
//! conn.send("tx", &[("dest_addr", &[0x00, 0x02]), ("data", b"hello")])?;
//! if let Some(record) = conn.wait_read_frame(Some(DEFAULT_TIMEOUT))? {
//!     println!("{} {:?}", record.id, record.bytes("status"));
//! }
//! ```

mod command;
mod connection;
mod error;
pub mod escape;
mod frame;
mod ieee802154;
mod response;
mod schema;
mod serial;

pub trait Encode {
    type Error;

    /// Write the encoded bytes into `buffer`, returning how many were used
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

pub use command::Fields;
pub use connection::{ApiConnection, ConnectionConfig, ConnectionResult, DEFAULT_TIMEOUT};
pub use error::{ConnectionError, DecodeError, EncodeError, SchemaError};
pub use frame::{CHECKSUM_SIZE, Frame, FrameError, FrameScanner, HEADER_SIZE, MAX_PAYLOAD_SIZE, checksum, verify};
pub use ieee802154::IEEE802154;
pub use response::{DecodedRecord, FieldValue};
pub use schema::{CommandSpec, FieldLength, FieldSpec, Registry, ResponseSpec, Transform};
pub use serial::{ErrorShim, NbWriter};
