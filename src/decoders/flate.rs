//! FlateDecode (zlib/deflate) decoding.

use crate::error::{Error, Result};
use std::io::Read;

/// Inflate a FlateDecode payload.
///
/// Tries zlib framing first, then falls back to raw deflate; some
/// generators omit the zlib header. Trailing garbage after the compressed
/// data is tolerated.
pub fn flate_decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut zlib = flate2::read::ZlibDecoder::new(data);
    match zlib.read_to_end(&mut out) {
        Ok(_) => return Ok(out),
        Err(e) => {
            log::debug!("zlib inflate failed ({}), trying raw deflate", e);
        },
    }

    out.clear();
    let mut raw = flate2::read::DeflateDecoder::new(data);
    raw.read_to_end(&mut out)
        .map_err(|e| Error::Decode(format!("FlateDecode: {}", e)))?;
    Ok(out)
}
