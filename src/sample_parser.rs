//! Line validation for the device's text protocol.
//!
//! The device prints one `"<digits>,<digits>"` line per sample. Anything else
//! (partial reads, boot banners, line noise) is dropped without fuss.

use crate::types::Sample;

const DELIMITER: char = ',';

/// Parse one line into a sample. Returns `None` for any line that is not
/// exactly two comma-separated runs of ASCII digits. Surrounding whitespace
/// (including the `\r` of a CRLF terminator) is ignored; whitespace inside
/// a field is not.
pub fn parse_line(line: &str) -> Option<Sample> {
    let mut fields = line.trim().split(DELIMITER);
    let ch0 = parse_field(fields.next()?)?;
    let ch1 = parse_field(fields.next()?)?;
    if fields.next().is_some() {
        return None;
    }
    Some(Sample::new(ch0, ch1))
}

fn parse_field(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Only overflow can fail here.
    field.parse().ok()
}

/// Decode raw bytes from the transport, dropping invalid UTF-8 sequences
/// instead of replacing them.
pub fn decode_line(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
