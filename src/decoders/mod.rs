//! Stream filter decoders.
//!
//! Only the filters that actually occur in form-bearing documents are
//! implemented: FlateDecode (with PNG/TIFF predictors), ASCIIHexDecode and
//! RunLengthDecode. Anything else surfaces as
//! [`Error::UnsupportedFilter`](crate::error::Error::UnsupportedFilter).

mod ascii_hex;
mod flate;
mod predictor;
mod runlength;

pub use ascii_hex::ascii_hex_decode;
pub use flate::flate_decode;
pub use predictor::{apply_predictor, PredictorParams};
pub use runlength::run_length_decode;

use crate::error::{Error, Result};
use crate::object::{Dict, Object};

/// Decode a stream payload by applying its `/Filter` chain in order.
///
/// `/DecodeParms` predictor parameters are honored for FlateDecode.
pub fn decode_stream(dict: &Dict, data: &[u8]) -> Result<Vec<u8>> {
    let filters = filter_names(dict.get("Filter"));
    if filters.is_empty() {
        return Ok(data.to_vec());
    }

    let parms = decode_parms(dict.get("DecodeParms"));
    let mut current = data.to_vec();
    for (i, filter) in filters.iter().enumerate() {
        let parm = parms.get(i).copied().flatten();
        current = apply_filter(filter, &current, parm)?;
    }
    Ok(current)
}

fn apply_filter(name: &str, data: &[u8], parm: Option<PredictorParams>) -> Result<Vec<u8>> {
    match name {
        "FlateDecode" | "Fl" => {
            let inflated = flate_decode(data)?;
            match parm {
                Some(p) if p.predictor > 1 => apply_predictor(&inflated, p),
                _ => Ok(inflated),
            }
        },
        "ASCIIHexDecode" | "AHx" => ascii_hex_decode(data),
        "RunLengthDecode" | "RL" => run_length_decode(data),
        other => Err(Error::UnsupportedFilter(other.to_string())),
    }
}

/// The `/Filter` entry is a single name or an array of names.
fn filter_names(filter: Option<&Object>) -> Vec<String> {
    match filter {
        Some(Object::Name(n)) => vec![n.clone()],
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| o.as_name().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// `/DecodeParms` is a dictionary, an array of dictionary-or-null, or absent.
fn decode_parms(parms: Option<&Object>) -> Vec<Option<PredictorParams>> {
    match parms {
        Some(Object::Dictionary(d)) => vec![PredictorParams::from_dict(d)],
        Some(Object::Array(items)) => items
            .iter()
            .map(|o| o.as_dict().and_then(PredictorParams::from_dict))
            .collect(),
        _ => Vec::new(),
    }
}
