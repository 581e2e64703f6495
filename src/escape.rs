/// Frame delimiter. Never escaped, only ever seen at the start of a frame.
pub const START: u8 = 0x7E;
pub const ESCAPE: u8 = 0x7D;
pub const XON: u8 = 0x11;
pub const XOFF: u8 = 0x13;

/// Bytes that must be stuffed when they occur inside a frame
pub const RESERVED: [u8; 4] = [START, ESCAPE, XON, XOFF];

const ESCAPE_MASK: u8 = 0x20;

pub fn needs_escape(byte: u8) -> bool {
    RESERVED.contains(&byte)
}

/// Byte-stuff `data`. Every reserved byte becomes `ESCAPE, byte ^ 0x20`.
pub fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(escaped_len(data));
    escape_into(data, &mut out);
    out
}

pub fn escape_into(data: &[u8], out: &mut Vec<u8>) {
    for &b in data {
        if needs_escape(b) {
            out.push(ESCAPE);
            out.push(b ^ ESCAPE_MASK);
        } else {
            out.push(b);
        }
    }
}

/// Length `data` will occupy after stuffing
pub fn escaped_len(data: &[u8]) -> usize {
    data.len() + data.iter().filter(|b| needs_escape(**b)).count()
}

/// Incremental inverse of [`escape`], fed one wire byte at a time.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unescaper {
    escape_next: bool,
}

impl Unescaper {
    pub fn new() -> Unescaper {
        Unescaper { escape_next: false }
    }

    /// Returns the decoded byte, or `None` when `byte` was an escape marker
    /// that only changes how the following byte is read.
    pub fn feed(&mut self, byte: u8) -> Option<u8> {
        if self.escape_next {
            self.escape_next = false;
            return Some(byte ^ ESCAPE_MASK);
        }
        if byte == ESCAPE {
            self.escape_next = true;
            return None;
        }
        Some(byte)
    }
}

/// Undo [`escape`] over a whole buffer.
pub fn unescape(data: &[u8]) -> Vec<u8> {
    let mut u = Unescaper::new();
    data.iter().filter_map(|b| u.feed(*b)).collect()
}
