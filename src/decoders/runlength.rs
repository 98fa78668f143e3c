//! RunLengthDecode filter.

use crate::error::{Error, Result};

/// Decode run-length encoded data (ISO 32000-1:2008, Section 7.4.5).
///
/// A length byte 0-127 copies the next `length + 1` bytes literally;
/// 129-255 repeats the next byte `257 - length` times; 128 is EOD.
pub fn run_length_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < data.len() {
        let length = data[i];
        i += 1;
        match length {
            128 => break,
            0..=127 => {
                let count = length as usize + 1;
                let chunk = data
                    .get(i..i + count)
                    .ok_or_else(|| Error::Decode("RunLengthDecode: truncated literal".to_string()))?;
                out.extend_from_slice(chunk);
                i += count;
            },
            129..=255 => {
                let &byte = data
                    .get(i)
                    .ok_or_else(|| Error::Decode("RunLengthDecode: truncated run".to_string()))?;
                out.extend(std::iter::repeat(byte).take(257 - length as usize));
                i += 1;
            },
        }
    }
    Ok(out)
}
