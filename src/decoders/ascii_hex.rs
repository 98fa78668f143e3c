//! ASCIIHexDecode filter.

use crate::error::{Error, Result};
use crate::lexer::is_whitespace;

/// Decode hex pairs up to the `>` end-of-data marker.
///
/// Whitespace is ignored; an odd trailing digit is padded with zero
/// (ISO 32000-1:2008, Section 7.4.2).
pub fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &b in data {
        if b == b'>' {
            break;
        }
        if is_whitespace(b) {
            continue;
        }
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            other => {
                return Err(Error::Decode(format!(
                    "ASCIIHexDecode: invalid character 0x{:02X}",
                    other
                )))
            },
        };
        match high.take() {
            Some(h) => out.push((h << 4) | digit),
            None => high = Some(digit),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    Ok(out)
}
