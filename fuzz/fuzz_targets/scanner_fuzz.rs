//! Feed arbitrary bytes through the frame scanner and the response decoder.
//! Neither may panic, and every frame the scanner yields must carry a valid
//! checksum even when corruption produced a false START.
//! Build with: cargo fuzz run scanner_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
use radio_serial_protocol::{FrameScanner, IEEE802154, verify};

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let Some((&mode, stream)) = data.split_first() else {
        return;
    };
    let mut scanner = FrameScanner::new(mode & 1 == 1);
    for frame in scanner.push_all(stream) {
        let raw = frame.raw();
        assert!(verify(frame.payload(), raw[raw.len() - 1]));
        assert!(!frame.payload().is_empty());
        let _ = IEEE802154.parse_response(frame.payload());
    }
    let _ = IEEE802154.parse_response(stream);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run scanner_fuzz");
}
