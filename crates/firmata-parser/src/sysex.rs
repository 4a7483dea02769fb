//! Extended (sysex) message decoding.
//!
//! A completed sysex message sits in the data buffer with its tag at
//! offset 0. `REPORT_FIRMWARE` and `STRING_DATA` are handled here; every
//! other tag is forwarded verbatim to the raw sysex handler.

use std::ffi::CStr;

use tracing::{debug, warn};

use crate::buffer::DataBuffer;
use crate::command::{sysex_name, REPORT_FIRMWARE, STRING_DATA};
use crate::registry::CallbackRegistry;

/// Decode a completed sysex message of `bytes_read` bytes (tag included)
/// and dispatch it.
pub(crate) fn process(
    buffer: &mut DataBuffer<'_>,
    registry: &mut CallbackRegistry<'_>,
    bytes_read: usize,
) {
    if bytes_read == 0 {
        debug!("empty sysex message ignored");
        return;
    }

    let stored = bytes_read.min(buffer.capacity());
    if stored == 0 {
        warn!(bytes_read, "sysex message dropped, no data buffer bound");
        return;
    }
    if stored < bytes_read {
        warn!(
            bytes_read,
            stored, "sysex message truncated by data buffer overflow"
        );
    }

    let tag = buffer.as_slice()[0];
    debug!(tag, name = sysex_name(tag), len = bytes_read - 1, "sysex message");

    match tag {
        REPORT_FIRMWARE => {
            registry.dispatch_simple(REPORT_FIRMWARE);
        }
        STRING_DATA => {
            let data = buffer.as_mut_slice();
            let decoded = decode_text_in_place(data, stored);
            // decoded < stored <= capacity, so the terminator always fits.
            if let Some(text) = terminate(data, decoded) {
                registry.dispatch_text(text);
            }
        }
        _ => {
            registry.dispatch_sysex(tag, &buffer.as_slice()[1..stored]);
        }
    }
}

/// Decode `STRING_DATA` text in place.
///
/// `data[..stored]` holds the tag followed by 7-bit (low, high) pairs.
/// Each pair becomes one byte `low + (high << 7)` written from offset 0.
/// A trailing unpaired byte is ignored. Returns the number of decoded
/// bytes.
pub fn decode_text_in_place(data: &mut [u8], stored: usize) -> usize {
    let stored = stored.min(data.len());
    let chars = stored.saturating_sub(1) / 2;

    // Output index j never passes the input pair at 2j + 1.
    for j in 0..chars {
        let low = u16::from(data[1 + 2 * j]);
        let high = u16::from(data[2 + 2 * j]);
        data[j] = (low + (high << 7)) as u8;
    }

    chars
}

/// Ensure the `len` decoded bytes are NUL terminated and view them as a
/// C string. Returns `None` when there is no room for the terminator.
fn terminate(data: &mut [u8], len: usize) -> Option<&CStr> {
    let needs_terminator = len == 0 || data[len - 1] != 0;
    if needs_terminator {
        if len >= data.len() {
            return None;
        }
        data[len] = 0;
    }
    CStr::from_bytes_until_nul(data).ok()
}
