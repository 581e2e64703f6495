use std::thread;
use std::time::{Duration, Instant};

use embedded_hal_nb::serial::{self, Read};
use log::debug;

use crate::command::Fields;
use crate::error::ConnectionError;
use crate::frame::{Frame, FrameScanner};
use crate::response::DecodedRecord;
use crate::schema::Registry;

/// How long [`ApiConnection::wait_read_frame`] callers usually wait
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Byte-stuff outgoing frames and unstuff incoming ones
    pub escaped: bool,
    /// Sleep between polls while the byte source has nothing to offer
    pub poll_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            escaped: false,
            poll_interval: Duration::from_millis(10),
        }
    }
}

pub type ConnectionResult<T, Tx, Rx> = Result<
    T,
    ConnectionError<<Rx as serial::ErrorType>::Error, <Tx as embedded_io::ErrorType>::Error>,
>;

/// Sends commands and receives responses over a serial link to a radio
/// module, using the command and response tables of `registry`.
#[derive(Debug)]
pub struct ApiConnection<Tx, Rx> {
    tx: Tx,
    rx: Rx,
    registry: &'static Registry,
    config: ConnectionConfig,
}

impl<Tx, Rx> ApiConnection<Tx, Rx>
where
    Tx: embedded_io::Write,
    Rx: Read,
{
    pub fn new(tx: Tx, rx: Rx, registry: &'static Registry) -> ApiConnection<Tx, Rx> {
        ApiConnection::with_config(tx, rx, registry, ConnectionConfig::default())
    }

    pub fn with_config(
        tx: Tx,
        rx: Rx,
        registry: &'static Registry,
        config: ConnectionConfig,
    ) -> ApiConnection<Tx, Rx> {
        debug_assert!(
            registry.validate().is_ok(),
            "inconsistent schema tables: {:?}",
            registry.validate()
        );
        ApiConnection {
            tx,
            rx,
            registry,
            config,
        }
    }

    pub fn split(self) -> (Tx, Rx) {
        (self.tx, self.rx)
    }

    /// Frame `payload` and hand it to the byte sink.
    pub fn write_frame(&mut self, payload: &[u8]) -> ConnectionResult<(), Tx, Rx> {
        let bytes = Frame::with_payload(payload, self.config.escaped).build()?;
        self.tx.write_all(&bytes).map_err(ConnectionError::Write)?;
        self.tx.flush().map_err(ConnectionError::Write)?;
        debug!("wrote frame of {} bytes ({} on the wire)", payload.len(), bytes.len());
        Ok(())
    }

    /// Encode command `name` with `fields` and send it.
    pub fn send(&mut self, name: &str, fields: &Fields<'_>) -> ConnectionResult<(), Tx, Rx> {
        let payload = self.registry.build_command(name, fields)?;
        self.write_frame(&payload)
    }

    /// Read bytes until a complete, valid, non-empty frame arrives.
    ///
    /// Returns `Ok(None)` once `timeout` has elapsed without one; with no
    /// timeout this waits indefinitely. Noise, corrupt frames and empty frames
    /// are skipped.
    pub fn read_frame(&mut self, timeout: Option<Duration>) -> ConnectionResult<Option<Frame>, Tx, Rx> {
        // A deadline past what Instant can represent is no deadline at all
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut scanner = FrameScanner::new(self.config.escaped);
        loop {
            if deadline.is_some_and(|d| Instant::now() > d) {
                if scanner.in_frame() {
                    debug!("timed out part way through a frame");
                }
                return Ok(None);
            }
            let byte = match self.rx.read() {
                Ok(b) => b,
                Err(nb::Error::WouldBlock) => {
                    thread::sleep(self.config.poll_interval);
                    continue;
                }
                Err(nb::Error::Other(e)) => return Err(ConnectionError::Read(e)),
            };
            if let Some(frame) = scanner.push(byte) {
                return Ok(Some(frame));
            }
        }
    }

    /// Wait for the next frame and decode it into a record.
    pub fn wait_read_frame(
        &mut self,
        timeout: Option<Duration>,
    ) -> ConnectionResult<Option<DecodedRecord>, Tx, Rx> {
        match self.read_frame(timeout)? {
            Some(frame) => Ok(Some(self.registry.parse_response(frame.payload())?)),
            None => Ok(None),
        }
    }
}
