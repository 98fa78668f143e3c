//! Predictor post-processing for FlateDecode / LZWDecode streams.
//!
//! Cross-reference streams are almost always written with PNG Up
//! prediction, so this is required for any PDF 1.5+ file.

use crate::error::{Error, Result};
use crate::object::{Dict, Object};

/// Predictor parameters from a `/DecodeParms` dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: u8,
    /// Samples per row
    pub columns: usize,
    /// Color components per sample
    pub colors: usize,
    /// Bits per component
    pub bits_per_component: usize,
}

impl PredictorParams {
    /// Read parameters from a decode-parms dictionary, if any are present.
    pub fn from_dict(dict: &Dict) -> Option<Self> {
        let get = |key: &str, default: i64| {
            dict.get(key).and_then(Object::as_integer).unwrap_or(default)
        };
        Some(Self {
            predictor: get("Predictor", 1).clamp(1, 15) as u8,
            columns: get("Columns", 1).max(1) as usize,
            colors: get("Colors", 1).max(1) as usize,
            bits_per_component: get("BitsPerComponent", 8).max(1) as usize,
        })
    }

    fn bytes_per_pixel(&self) -> usize {
        ((self.colors * self.bits_per_component) + 7) / 8
    }

    fn bytes_per_row(&self) -> usize {
        ((self.columns * self.colors * self.bits_per_component) + 7) / 8
    }
}

/// Undo the predictor transform on decoded stream data.
pub fn apply_predictor(data: &[u8], params: PredictorParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => tiff_predictor(data, params),
        10..=15 => png_predictor(data, params),
        other => Err(Error::Decode(format!("unknown predictor {}", other))),
    }
}

/// TIFF predictor 2: each byte is a delta from the previous pixel.
fn tiff_predictor(data: &[u8], params: PredictorParams) -> Result<Vec<u8>> {
    if params.bits_per_component != 8 {
        return Err(Error::Decode("TIFF predictor requires 8 bits per component".to_string()));
    }
    let row_len = params.bytes_per_row();
    let bpp = params.bytes_per_pixel();
    let mut out = data.to_vec();
    for row in out.chunks_mut(row_len) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    Ok(out)
}

/// PNG predictors: each row starts with a filter-type byte.
fn png_predictor(data: &[u8], params: PredictorParams) -> Result<Vec<u8>> {
    let row_len = params.bytes_per_row();
    let bpp = params.bytes_per_pixel();
    let stride = row_len + 1;
    if row_len == 0 {
        return Err(Error::Decode("predictor row length is zero".to_string()));
    }

    let mut out = Vec::with_capacity(data.len() / stride * row_len);
    let mut previous = vec![0u8; row_len];

    for chunk in data.chunks(stride) {
        if chunk.len() < 2 {
            break;
        }
        let filter = chunk[0];
        let mut row = chunk[1..].to_vec();
        row.resize(row_len, 0);

        match filter {
            0 => {},
            1 => {
                // Sub
                for i in bpp..row_len {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            },
            2 => {
                // Up
                for i in 0..row_len {
                    row[i] = row[i].wrapping_add(previous[i]);
                }
            },
            3 => {
                // Average
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let up = previous[i] as u16;
                    row[i] = row[i].wrapping_add(((left + up) / 2) as u8);
                }
            },
            4 => {
                // Paeth
                for i in 0..row_len {
                    let left = if i >= bpp { row[i - bpp] as i16 } else { 0 };
                    let up = previous[i] as i16;
                    let up_left = if i >= bpp { previous[i - bpp] as i16 } else { 0 };
                    row[i] = row[i].wrapping_add(paeth(left, up, up_left));
                }
            },
            other => {
                return Err(Error::Decode(format!("unknown PNG filter type {}", other)));
            },
        }

        out.extend_from_slice(&row);
        previous = row;
    }

    Ok(out)
}

fn paeth(a: i16, b: i16, c: i16) -> u8 {
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}
