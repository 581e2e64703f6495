use log::{debug, trace};
use thiserror::Error;

use crate::Encode;
use crate::escape::{self, START, Unescaper};

/// Delimiter plus the two length bytes
pub const HEADER_SIZE: usize = 3;
pub const CHECKSUM_SIZE: usize = 1;
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Error type for building and parsing Frames
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid checksum: computed 0x{computed:02X}, found 0x{found:02X}")]
    ChecksumInvalid { computed: u8, found: u8 },
    #[error("frame incomplete: {remaining} more bytes required")]
    Incomplete { remaining: usize },
    #[error("payload of {length} bytes does not fit a 16-bit length header")]
    PayloadTooLarge { length: usize },
    #[error("encode buffer too small: expected {expected} bytes, found {found}")]
    EncodeBufferTooSmall { expected: usize, found: usize },
}

/// One's complement of the byte sum of `payload`
pub fn checksum(payload: &[u8]) -> u8 {
    0xFF - sum(payload)
}

pub fn verify(payload: &[u8], checksum: u8) -> bool {
    sum(payload).wrapping_add(checksum) == 0xFF
}

fn sum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A single API frame, either built from a payload for sending or filled
/// byte by byte from the wire.
///
/// While receiving, `raw` holds everything seen so far after unescaping:
///
/// ```text
/// START | LEN_HI | LEN_LO | DATA[0..LEN] | CHECKSUM
/// ```
#[derive(Debug, Clone, Default)]
pub struct Frame {
    payload: Vec<u8>,
    raw: Vec<u8>,
    escaped: bool,
    unescaper: Unescaper,
}

impl Frame {
    /// Empty frame ready to be filled from the wire
    pub fn new(escaped: bool) -> Frame {
        Frame {
            escaped,
            ..Frame::default()
        }
    }

    /// Frame wrapping `payload` for transmission
    pub fn with_payload(payload: &[u8], escaped: bool) -> Frame {
        Frame {
            payload: payload.to_vec(),
            escaped,
            ..Frame::default()
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn checksum(&self) -> u8 {
        checksum(&self.payload)
    }

    /// Length header, payload and checksum, before any stuffing
    fn body(&self) -> Result<Vec<u8>, FrameError> {
        let length = u16::try_from(self.payload.len()).map_err(|_| FrameError::PayloadTooLarge {
            length: self.payload.len(),
        })?;
        let mut body = Vec::with_capacity(self.payload.len() + HEADER_SIZE);
        body.extend_from_slice(&length.to_be_bytes());
        body.extend_from_slice(&self.payload);
        body.push(self.checksum());
        Ok(body)
    }

    /// Wire bytes for this frame: START followed by the (optionally escaped)
    /// length, payload and checksum.
    pub fn build(&self) -> Result<Vec<u8>, FrameError> {
        let body = self.body()?;
        let mut out = Vec::with_capacity(1 + escape::escaped_len(&body));
        out.push(START);
        if self.escaped {
            escape::escape_into(&body, &mut out);
        } else {
            out.extend_from_slice(&body);
        }
        Ok(out)
    }

    /// Number of wire bytes [`Frame::build`] produces
    pub fn encoded_len(&self) -> Result<usize, FrameError> {
        let body = self.body()?;
        Ok(1 + if self.escaped {
            escape::escaped_len(&body)
        } else {
            body.len()
        })
    }

    /// Feed one wire byte, unescaping it first when the frame is escaped.
    pub fn fill(&mut self, byte: u8) {
        let byte = if self.escaped {
            match self.unescaper.feed(byte) {
                Some(b) => b,
                None => return,
            }
        } else {
            byte
        };
        self.raw.push(byte);
    }

    fn declared_len(&self) -> Option<usize> {
        if self.raw.len() < HEADER_SIZE {
            return None;
        }
        Some(u16::from_be_bytes([self.raw[1], self.raw[2]]) as usize)
    }

    /// How many more bytes are needed before [`Frame::parse`] is worth
    /// attempting. Zero or below means the frame is complete.
    pub fn remaining_bytes(&self) -> isize {
        let needed = match self.declared_len() {
            Some(len) => HEADER_SIZE + len + CHECKSUM_SIZE,
            None => HEADER_SIZE,
        };
        needed as isize - self.raw.len() as isize
    }

    /// Extract the payload from the accumulated bytes and verify its checksum.
    pub fn parse(&mut self) -> Result<(), FrameError> {
        let remaining = self.remaining_bytes();
        let len = match self.declared_len() {
            Some(len) if remaining <= 0 => len,
            _ => {
                return Err(FrameError::Incomplete {
                    remaining: remaining.max(1) as usize,
                });
            }
        };
        let payload = &self.raw[HEADER_SIZE..HEADER_SIZE + len];
        let found = self.raw[HEADER_SIZE + len];
        if !verify(payload, found) {
            return Err(FrameError::ChecksumInvalid {
                computed: checksum(payload),
                found,
            });
        }
        self.payload = payload.to_vec();
        Ok(())
    }
}

impl Encode for Frame {
    type Error = FrameError;

    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        let bytes = self.build()?;
        if buffer.len() < bytes.len() {
            return Err(FrameError::EncodeBufferTooSmall {
                expected: bytes.len(),
                found: buffer.len(),
            });
        }
        buffer[0..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}

/// Finds frames in an unbounded byte stream.
///
/// Bytes before a START delimiter are dropped. Frames with a bad checksum or
/// an empty payload are discarded and scanning resumes at the next START.
#[derive(Debug, Default)]
pub struct FrameScanner {
    escaped: bool,
    frame: Option<Frame>,
}

impl FrameScanner {
    pub fn new(escaped: bool) -> FrameScanner {
        FrameScanner {
            escaped,
            frame: None,
        }
    }

    /// True while a frame has been started but not completed
    pub fn in_frame(&self) -> bool {
        self.frame.is_some()
    }

    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        match self.frame.as_mut() {
            Some(frame) => frame.fill(byte),
            None if byte == START => {
                let mut frame = Frame::new(self.escaped);
                frame.fill(byte);
                self.frame = Some(frame);
            }
            None => {
                trace!("dropping noise byte 0x{:02X}", byte);
                return None;
            }
        }

        if self.frame.as_ref()?.remaining_bytes() > 0 {
            return None;
        }
        let mut frame = self.frame.take()?;
        match frame.parse() {
            Ok(()) if frame.payload().is_empty() => {
                debug!("discarding empty frame, resynchronizing");
                None
            }
            Ok(()) => Some(frame),
            Err(e) => {
                debug!("discarding frame ({}), resynchronizing", e);
                None
            }
        }
    }

    /// Feed every byte of `data`, collecting the frames that complete
    pub fn push_all(&mut self, data: &[u8]) -> Vec<Frame> {
        data.iter().filter_map(|b| self.push(*b)).collect()
    }
}
