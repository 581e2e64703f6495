use std::collections::VecDeque;
use std::convert::Infallible;
use std::time::{Duration, Instant};

use embedded_hal_nb::serial::{ErrorKind, ErrorType, Read};
use radio_serial_protocol::{
    ApiConnection, ConnectionConfig, ConnectionError, DecodeError, EncodeError, FieldSpec,
    FieldValue, Frame, IEEE802154, Registry, ResponseSpec,
};

#[derive(Debug, Default)]
struct TxBuffer(Vec<u8>);

impl embedded_io::ErrorType for TxBuffer {
    type Error = Infallible;
}

impl embedded_io::Write for TxBuffer {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Hands out queued bytes, reporting WouldBlock every `stall` reads
#[derive(Debug, Default)]
struct ReadBuffer {
    data: VecDeque<u8>,
    stall: usize,
    reads: usize,
}

impl ReadBuffer {
    fn from_iter(data: impl IntoIterator<Item = u8>) -> ReadBuffer {
        ReadBuffer {
            data: data.into_iter().collect(),
            ..ReadBuffer::default()
        }
    }

    fn stalling(mut self, stall: usize) -> ReadBuffer {
        self.stall = stall;
        self
    }
}

impl ErrorType for ReadBuffer {
    type Error = Infallible;
}

impl Read for ReadBuffer {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.reads += 1;
        if self.stall > 0 && self.reads % self.stall == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.data.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

struct FaultyRx;

impl ErrorType for FaultyRx {
    type Error = ErrorKind;
}

impl Read for FaultyRx {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        Err(nb::Error::Other(ErrorKind::Overrun))
    }
}

fn wire(payload: &[u8], escaped: bool) -> Vec<u8> {
    Frame::with_payload(payload, escaped).build().unwrap()
}

fn config(escaped: bool) -> ConnectionConfig {
    ConnectionConfig {
        escaped,
        poll_interval: Duration::from_millis(1),
    }
}

const TIMEOUT: Option<Duration> = Some(Duration::from_secs(1));

#[test]
fn noise_then_status_frame() {
    let mut bytes = vec![0x01, 0x02, 0x03, 0x04, 0x05];
    bytes.extend(wire(&[0x8A, 0x00], false));
    let rx = ReadBuffer::from_iter(bytes);
    let mut conn = ApiConnection::new(TxBuffer::default(), rx, &IEEE802154);

    let record = conn.wait_read_frame(TIMEOUT).unwrap().unwrap();
    assert_eq!(record.id, "status");
    assert_eq!(record.len(), 1);
    assert_eq!(record.get("status"), Some(&FieldValue::Bytes(vec![0x00])));

    // Nothing else is waiting
    let none = conn.wait_read_frame(Some(Duration::from_millis(20))).unwrap();
    assert!(none.is_none());
}

#[test]
fn idle_source_times_out() {
    let rx = ReadBuffer::default();
    let mut conn = ApiConnection::with_config(TxBuffer::default(), rx, &IEEE802154, config(false));
    let start = Instant::now();
    let frame = conn.read_frame(Some(Duration::from_millis(50))).unwrap();
    assert!(frame.is_none());
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn unrepresentable_timeout_waits_without_deadline() {
    let rx = ReadBuffer::from_iter(wire(&[0x8A, 0x00], false));
    let mut conn = ApiConnection::new(TxBuffer::default(), rx, &IEEE802154);
    let record = conn.wait_read_frame(Some(Duration::MAX)).unwrap().unwrap();
    assert_eq!(record.id, "status");
    assert_eq!(record.bytes("status"), Some(&[0x00][..]));
}

#[cfg(debug_assertions)]
static MISORDERED: Registry = Registry {
    commands: &[],
    responses: &[ResponseSpec {
        id: 0x90,
        name: "misordered",
        fields: &[FieldSpec::to_end("data"), FieldSpec::fixed("status", 1)],
        transforms: &[],
    }],
};

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "inconsistent schema tables")]
fn misordered_schema_is_rejected_at_construction() {
    let _ = ApiConnection::new(TxBuffer::default(), ReadBuffer::default(), &MISORDERED);
}

#[test]
fn send_writes_framed_command() {
    let mut conn = ApiConnection::new(TxBuffer::default(), ReadBuffer::default(), &IEEE802154);
    conn.send("tx", &[("dest_addr", &[0x12, 0x34]), ("data", b"hello")])
        .unwrap();
    let (tx, _) = conn.split();

    let mut payload = vec![0x01, 0x00, 0x12, 0x34, 0x00];
    payload.extend_from_slice(b"hello");
    assert_eq!(tx.0, wire(&payload, false));
}

#[test]
fn escaped_round_trip_through_loopback() {
    // A payload full of bytes that need stuffing
    let payload = IEEE802154
        .build_command("tx", &[("dest_addr", &[0x7E, 0x7D]), ("data", &[0x11, 0x13, 0x7E])])
        .unwrap();
    let mut sender =
        ApiConnection::with_config(TxBuffer::default(), ReadBuffer::default(), &IEEE802154, config(true));
    sender.write_frame(&payload).unwrap();
    let (tx, _) = sender.split();
    assert_eq!(tx.0.iter().filter(|b| **b == 0x7E).count(), 1);

    let rx = ReadBuffer::from_iter(tx.0).stalling(3);
    let mut receiver = ApiConnection::with_config(TxBuffer::default(), rx, &IEEE802154, config(true));
    let frame = receiver.read_frame(TIMEOUT).unwrap().unwrap();
    assert_eq!(frame.payload(), payload.as_slice());
}

#[test]
fn corrupt_and_empty_frames_are_skipped() {
    let mut bytes = wire(&[], false);
    let mut bad = wire(&[0x89, 0x01, 0x00], false);
    let last = bad.len() - 1;
    bad[last] = bad[last].wrapping_add(1);
    bytes.extend(bad);
    bytes.extend([0xAA, 0xBB]);
    bytes.extend(wire(&[0x89, 0x01, 0x00], false));

    let rx = ReadBuffer::from_iter(bytes);
    let mut conn = ApiConnection::with_config(TxBuffer::default(), rx, &IEEE802154, config(false));
    let record = conn.wait_read_frame(TIMEOUT).unwrap().unwrap();
    assert_eq!(record.id, "tx_status");
    assert_eq!(record.bytes("frame_id"), Some(&[0x01][..]));
    assert_eq!(record.bytes("status"), Some(&[0x00][..]));
}

#[test]
fn echoed_command_is_reported() {
    let payload = IEEE802154
        .build_command("tx", &[("dest_addr", &[0x00, 0x01])])
        .unwrap();
    let rx = ReadBuffer::from_iter(wire(&payload, false));
    let mut conn = ApiConnection::new(TxBuffer::default(), rx, &IEEE802154);
    match conn.wait_read_frame(TIMEOUT) {
        Err(ConnectionError::Decode(DecodeError::CommandFrame { id, command })) => {
            assert_eq!(id, 0x01);
            assert_eq!(command, "tx");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn short_response_is_a_decode_error() {
    let rx = ReadBuffer::from_iter(wire(&[0x89, 0x01], false));
    let mut conn = ApiConnection::new(TxBuffer::default(), rx, &IEEE802154);
    assert!(matches!(
        conn.wait_read_frame(TIMEOUT),
        Err(ConnectionError::Decode(DecodeError::FrameTooShort {
            expected: 3,
            actual: 2
        }))
    ));
}

#[test]
fn encode_errors_abort_send() {
    let mut conn = ApiConnection::new(TxBuffer::default(), ReadBuffer::default(), &IEEE802154);
    assert!(matches!(
        conn.send("tx", &[("data", b"no address")]),
        Err(ConnectionError::Encode(EncodeError::MissingField { field: "dest_addr", .. }))
    ));
    let (tx, _) = conn.split();
    assert!(tx.0.is_empty());
}

#[test]
fn read_errors_propagate() {
    let mut conn = ApiConnection::new(TxBuffer::default(), FaultyRx, &IEEE802154);
    assert!(matches!(
        conn.read_frame(None),
        Err(ConnectionError::Read(ErrorKind::Overrun))
    ));
}
